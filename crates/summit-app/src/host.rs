//! Host capability providers for the command-line binary.
//!
//! The browser platform the engine was designed around is emulated here:
//! the folder picker resolves a path argument, the recognizer treats each
//! stdin line as a finalized utterance, the camera serves a JPEG from disk,
//! and geolocation returns a fixed position when one was given.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use uuid::Uuid;

use summit_assets::{AssetProvider, DisplayHandle};
use summit_capture::{CameraService, GeolocationService};
use summit_core::{CapabilityProbe, Coordinates, Result, SummitError};
use summit_store::{FolderHandle, FolderPicker};

/// Capability presence for this host, detected once at startup.
#[derive(Debug, Clone, Copy)]
pub struct HostCapabilities {
    pub folder_ok: bool,
    pub camera_ok: bool,
}

impl HostCapabilities {
    pub fn detect(folder: &Path, camera_image: Option<&Path>) -> Self {
        Self {
            folder_ok: folder.is_dir(),
            camera_ok: camera_image.map(Path::is_file).unwrap_or(false),
        }
    }
}

impl CapabilityProbe for HostCapabilities {
    fn directory_access(&self) -> bool {
        self.folder_ok
    }

    fn speech_recognition(&self) -> bool {
        // Stdin stands in for the recognizer and is always present.
        true
    }

    fn camera(&self) -> bool {
        self.camera_ok
    }

    fn geolocation(&self) -> bool {
        // The provider is present; a missing fix is tolerated at capture
        // time, the same way the platform API distinguishes presence from
        // a successful fix.
        true
    }
}

/// Picker that grants a path given on the command line.
pub struct FsFolderPicker {
    path: PathBuf,
}

impl FsFolderPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FolderPicker for FsFolderPicker {
    async fn pick(&self) -> Result<FolderHandle> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| SummitError::AccessDenied(format!("{}: {}", self.path.display(), e)))?;
        if !metadata.is_dir() {
            return Err(SummitError::AccessDenied(format!(
                "{} is not a directory",
                self.path.display()
            )));
        }
        Ok(FolderHandle::new(self.path.clone()))
    }
}

/// Recognizer over stdin: each line is one finalized utterance.
///
/// Segments never end on their own; the dispatcher's pause/halt behavior
/// is driven entirely by mode changes.
pub struct StdinRecognizer {
    locale: String,
    lines: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
}

impl StdinRecognizer {
    pub fn new(locale: impl Into<String>) -> Self {
        Self::from_lines(locale, BufReader::new(tokio::io::stdin()).lines())
    }

    /// Reuse a line reader that already served earlier prompts, so buffered
    /// input is not lost between the chooser and the recognizer.
    pub fn from_lines(locale: impl Into<String>, lines: Lines<BufReader<Stdin>>) -> Self {
        Self {
            locale: locale.into(),
            lines: tokio::sync::Mutex::new(lines),
        }
    }
}

#[async_trait]
impl summit_voice::SpeechRecognizer for StdinRecognizer {
    async fn start_segment(&self) -> Result<()> {
        Ok(())
    }

    async fn next_utterance(&self) -> Result<Option<String>> {
        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(Some(line)) => Ok(Some(line)),
            Ok(None) => {
                // Stdin closed: park instead of ending segments in a loop.
                drop(lines);
                std::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
            Err(e) => Err(SummitError::Recognition(e.to_string())),
        }
    }

    async fn stop(&self) {}

    fn locale(&self) -> &str {
        &self.locale
    }
}

/// Camera that serves a fixed JPEG from disk.
pub struct FileCameraService {
    image_path: PathBuf,
    streaming: AtomicBool,
}

impl FileCameraService {
    pub fn new(image_path: impl Into<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
            streaming: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl CameraService for FileCameraService {
    async fn open_stream(&self) -> Result<()> {
        if !self.image_path.is_file() {
            return Err(SummitError::AccessDenied(format!(
                "camera source missing: {}",
                self.image_path.display()
            )));
        }
        self.streaming.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn grab_jpeg(&self) -> Result<Vec<u8>> {
        if !self.is_streaming() {
            return Err(SummitError::Capture("no open video stream".to_string()));
        }
        tokio::fs::read(&self.image_path)
            .await
            .map_err(|e| SummitError::Capture(e.to_string()))
    }

    async fn release_stream(&self) {
        self.streaming.store(false, Ordering::Relaxed);
    }

    fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::Relaxed)
    }
}

/// Geolocation with an optional fixed position from the command line.
pub struct FixedGeolocation {
    position: Option<Coordinates>,
}

impl FixedGeolocation {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl GeolocationService for FixedGeolocation {
    async fn current_position(&self) -> Option<Coordinates> {
        self.position
    }
}

/// Asset provider that materializes `file://` URLs in a cache directory
/// and deletes the file on release.
pub struct CacheDirProvider {
    dir: PathBuf,
    files: Mutex<HashMap<Uuid, PathBuf>>,
}

impl CacheDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            files: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl AssetProvider for CacheDirProvider {
    async fn acquire(&self, rel_path: &str, bytes: &[u8]) -> Result<DisplayHandle> {
        let token = Uuid::new_v4();
        let file_name = rel_path.rsplit('/').next().unwrap_or(rel_path);
        let path = self.dir.join(format!("{}-{}", token, file_name));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| SummitError::Write(format!("{}: {}", path.display(), e)))?;

        let url = format!("file://{}", path.display());
        self.files
            .lock()
            .expect("cache mutex poisoned")
            .insert(token, path);
        Ok(DisplayHandle {
            path: rel_path.to_string(),
            url,
            token,
        })
    }

    async fn release(&self, handle: &DisplayHandle) {
        let path = self
            .files
            .lock()
            .expect("cache mutex poisoned")
            .remove(&handle.token);
        if let Some(path) = path {
            let _ = tokio::fs::remove_file(&path).await;
        }
    }
}
