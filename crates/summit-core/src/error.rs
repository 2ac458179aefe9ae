use thiserror::Error;

/// Top-level error type for the Summit engine.
///
/// Platform-operation failures are caught at the call site and converted to a
/// short status string for the user; none of these should ever crash a
/// session. Only a failed capability probe is fatal, and that is handled
/// before any of these variants can occur.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SummitError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Folder, camera, or microphone permission refused. User-recoverable;
    /// never retried automatically.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Transient speech recognizer failure. The recognition loop self-heals.
    #[error("Speech recognition error: {0}")]
    Recognition(String),

    /// Camera or encode failure during photo capture.
    #[error("Photo capture error: {0}")]
    Capture(String),

    /// Persistence failure. The document remains in memory; no automatic retry.
    #[error("Write failed: {0}")]
    Write(String),

    /// Creation refused because an entry with that name already exists.
    #[error("A file named '{name}' already exists")]
    NameConflict { name: String },

    /// Document store misuse, e.g. an operation before a folder was selected.
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid session mode transition.
    #[error("Session error: {0}")]
    Session(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for SummitError {
    fn from(err: toml::de::Error) -> Self {
        SummitError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SummitError {
    fn from(err: toml::ser::Error) -> Self {
        SummitError::Config(err.to_string())
    }
}

/// A specialized `Result` type for Summit operations.
pub type Result<T> = std::result::Result<T, SummitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SummitError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = SummitError::AccessDenied("folder picker dismissed".to_string());
        assert_eq!(err.to_string(), "Access denied: folder picker dismissed");

        let err = SummitError::Recognition("no-speech".to_string());
        assert_eq!(err.to_string(), "Speech recognition error: no-speech");

        let err = SummitError::Capture("no video frame".to_string());
        assert_eq!(err.to_string(), "Photo capture error: no video frame");

        let err = SummitError::Write("disk full".to_string());
        assert_eq!(err.to_string(), "Write failed: disk full");
    }

    #[test]
    fn test_name_conflict_includes_name() {
        let err = SummitError::NameConflict {
            name: "diary.md".to_string(),
        };
        assert_eq!(err.to_string(), "A file named 'diary.md' already exists");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SummitError = io_err.into();
        assert!(matches!(err, SummitError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let parse_err = toml::from_str::<toml::Value>("not [ valid").unwrap_err();
        let err: SummitError = parse_err.into();
        assert!(matches!(err, SummitError::Config(_)));
    }

    #[test]
    fn test_errors_implement_debug() {
        let err = SummitError::Session("listening -> unselected".to_string());
        let dbg = format!("{:?}", err);
        assert!(dbg.contains("Session"));
    }
}
