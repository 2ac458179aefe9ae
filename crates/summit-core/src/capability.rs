//! Startup capability probe.
//!
//! The engine needs four platform capabilities: directory access, speech
//! recognition, a camera, and geolocation. The probe runs once at startup
//! with no side effects; if any capability is missing the application shows
//! a single unsupported-environment message and no further core logic runs.

use std::fmt;

/// One required platform capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DirectoryAccess,
    SpeechRecognition,
    Camera,
    Geolocation,
}

impl Capability {
    /// All required capabilities, in probe order.
    pub const ALL: [Capability; 4] = [
        Capability::DirectoryAccess,
        Capability::SpeechRecognition,
        Capability::Camera,
        Capability::Geolocation,
    ];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::DirectoryAccess => "directory access",
            Capability::SpeechRecognition => "speech recognition",
            Capability::Camera => "camera",
            Capability::Geolocation => "geolocation",
        };
        write!(f, "{}", name)
    }
}

/// Capability descriptor with one boolean probe per capability.
///
/// Host environments implement this over whatever presence checks they
/// have; tests use [`StaticCapabilities`].
pub trait CapabilityProbe: Send + Sync {
    fn directory_access(&self) -> bool;
    fn speech_recognition(&self) -> bool;
    fn camera(&self) -> bool;
    fn geolocation(&self) -> bool;

    fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::DirectoryAccess => self.directory_access(),
            Capability::SpeechRecognition => self.speech_recognition(),
            Capability::Camera => self.camera(),
            Capability::Geolocation => self.geolocation(),
        }
    }

    /// True only when every required capability is present.
    fn all_available(&self) -> bool {
        Capability::ALL.iter().all(|c| self.has(*c))
    }

    /// The capabilities that are absent, in probe order.
    fn missing(&self) -> Vec<Capability> {
        Capability::ALL
            .iter()
            .copied()
            .filter(|c| !self.has(*c))
            .collect()
    }
}

/// Fixed capability set, for tests and for hosts that know their support
/// up front.
#[derive(Debug, Clone, Copy)]
pub struct StaticCapabilities {
    pub directory_access: bool,
    pub speech_recognition: bool,
    pub camera: bool,
    pub geolocation: bool,
}

impl StaticCapabilities {
    /// Every capability present.
    pub fn full() -> Self {
        Self {
            directory_access: true,
            speech_recognition: true,
            camera: true,
            geolocation: true,
        }
    }
}

impl CapabilityProbe for StaticCapabilities {
    fn directory_access(&self) -> bool {
        self.directory_access
    }

    fn speech_recognition(&self) -> bool {
        self.speech_recognition
    }

    fn camera(&self) -> bool {
        self.camera
    }

    fn geolocation(&self) -> bool {
        self.geolocation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_capabilities_available() {
        let probe = StaticCapabilities::full();
        assert!(probe.all_available());
        assert!(probe.missing().is_empty());
    }

    #[test]
    fn test_single_missing_capability_fails_probe() {
        for absent in Capability::ALL {
            let mut probe = StaticCapabilities::full();
            match absent {
                Capability::DirectoryAccess => probe.directory_access = false,
                Capability::SpeechRecognition => probe.speech_recognition = false,
                Capability::Camera => probe.camera = false,
                Capability::Geolocation => probe.geolocation = false,
            }
            assert!(!probe.all_available(), "{} should gate the probe", absent);
            assert_eq!(probe.missing(), vec![absent]);
        }
    }

    #[test]
    fn test_missing_preserves_probe_order() {
        let probe = StaticCapabilities {
            directory_access: false,
            speech_recognition: true,
            camera: false,
            geolocation: false,
        };
        assert_eq!(
            probe.missing(),
            vec![
                Capability::DirectoryAccess,
                Capability::Camera,
                Capability::Geolocation
            ]
        );
    }

    #[test]
    fn test_capability_display() {
        assert_eq!(Capability::DirectoryAccess.to_string(), "directory access");
        assert_eq!(
            Capability::SpeechRecognition.to_string(),
            "speech recognition"
        );
        assert_eq!(Capability::Camera.to_string(), "camera");
        assert_eq!(Capability::Geolocation.to_string(), "geolocation");
    }
}
