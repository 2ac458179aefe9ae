use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Top-level configuration for the Summit engine.
///
/// Loaded from `~/.summit/config.toml` by default. Each section corresponds
/// to one subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummitConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub folder: FolderConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl SummitConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SummitConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file does not
    /// exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Folder selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderConfig {
    /// Name suggested in the folder-selection prompt. Convention only; no
    /// structural enforcement.
    pub suggested_name: String,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            suggested_name: "Documents/SummitCrew".to_string(),
        }
    }
}

/// Speech recognition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Recognizer locale, e.g. "ko-KR". Fixed for the session.
    pub locale: String,
    /// Command phrases matched against each finalized transcript.
    #[serde(default)]
    pub phrases: CommandPhrases,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: "ko-KR".to_string(),
            phrases: CommandPhrases::default(),
        }
    }
}

/// Designated command phrases.
///
/// All matching is substring and case-sensitive, except `stop_alt` which is
/// matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandPhrases {
    pub capture: String,
    pub enter_edit: String,
    pub exit_edit: String,
    pub stop: String,
    pub stop_alt: String,
}

impl Default for CommandPhrases {
    fn default() -> Self {
        Self {
            capture: "사진".to_string(),
            enter_edit: "글쓰기 시작".to_string(),
            exit_edit: "글쓰기 끝".to_string(),
            stop: "종료".to_string(),
            stop_alt: "stop".to_string(),
        }
    }
}

/// Photo capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Upper bound on the geolocation fix wait, in seconds. A missing fix
    /// is tolerated, never an error.
    pub geolocation_timeout_secs: u64,
    /// Extension for captured frames.
    pub image_extension: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            geolocation_timeout_secs: 5,
            image_extension: "jpg".to_string(),
        }
    }
}
