//! Camera and geolocation capability traits.
//!
//! Both are opaque asynchronous providers: the camera yields a single
//! encoded frame from an open stream, geolocation yields a best-effort fix.
//! Mocks simulate stream state and scripted failures without hardware.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use summit_core::{Coordinates, Result, SummitError};

/// Service producing a single still frame from a video stream.
///
/// Callers must pair every successful `open_stream` with exactly one
/// `release_stream`, on success and failure paths alike.
#[async_trait]
pub trait CameraService: Send + Sync {
    /// Open the video stream. Permission refusal is
    /// [`SummitError::AccessDenied`].
    async fn open_stream(&self) -> Result<()>;

    /// Grab one frame from the open stream, encoded as JPEG bytes.
    async fn grab_jpeg(&self) -> Result<Vec<u8>>;

    /// Release the stream and its underlying device.
    async fn release_stream(&self);

    fn is_streaming(&self) -> bool;
}

/// Best-effort device position. Absence is tolerated, never an error.
#[async_trait]
pub trait GeolocationService: Send + Sync {
    async fn current_position(&self) -> Option<Coordinates>;
}

/// Mock camera for tests. Tracks stream state atomically and counts
/// opens/releases so tests can assert the release contract.
#[derive(Debug, Default)]
pub struct MockCameraService {
    frame: Option<Vec<u8>>,
    deny: bool,
    streaming: AtomicBool,
    opens: AtomicUsize,
    releases: AtomicUsize,
}

impl MockCameraService {
    /// Camera that yields `frame` on every grab.
    pub fn with_frame(frame: Vec<u8>) -> Self {
        Self {
            frame: Some(frame),
            ..Self::default()
        }
    }

    /// Camera whose stream opens but every grab fails (encode failure).
    pub fn failing_grab() -> Self {
        Self::default()
    }

    /// Camera whose permission is refused.
    pub fn denying() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CameraService for MockCameraService {
    async fn open_stream(&self) -> Result<()> {
        if self.deny {
            return Err(SummitError::AccessDenied(
                "camera permission refused".to_string(),
            ));
        }
        if self.streaming.swap(true, Ordering::Relaxed) {
            return Err(SummitError::Capture(
                "video stream is already open".to_string(),
            ));
        }
        self.opens.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn grab_jpeg(&self) -> Result<Vec<u8>> {
        if !self.is_streaming() {
            return Err(SummitError::Capture("no open video stream".to_string()));
        }
        match &self.frame {
            Some(frame) => Ok(frame.clone()),
            None => Err(SummitError::Capture("frame encode failed".to_string())),
        }
    }

    async fn release_stream(&self) {
        if self.streaming.swap(false, Ordering::Relaxed) {
            self.releases.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::Relaxed)
    }
}

/// Mock geolocation with an optional artificial delay before answering.
#[derive(Debug, Default)]
pub struct MockGeolocationService {
    position: Option<Coordinates>,
    delay: Option<Duration>,
}

impl MockGeolocationService {
    pub fn fixed(position: Coordinates) -> Self {
        Self {
            position: Some(position),
            delay: None,
        }
    }

    /// No fix available.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl GeolocationService for MockGeolocationService {
    async fn current_position(&self) -> Option<Coordinates> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_camera_stream_lifecycle() {
        let camera = MockCameraService::with_frame(vec![0xff, 0xd8]);
        assert!(!camera.is_streaming());

        camera.open_stream().await.unwrap();
        assert!(camera.is_streaming());
        assert_eq!(camera.grab_jpeg().await.unwrap(), vec![0xff, 0xd8]);

        camera.release_stream().await;
        assert!(!camera.is_streaming());
        assert_eq!(camera.opens(), 1);
        assert_eq!(camera.releases(), 1);
    }

    #[tokio::test]
    async fn test_mock_camera_double_open_fails() {
        let camera = MockCameraService::with_frame(vec![1]);
        camera.open_stream().await.unwrap();
        let err = camera.open_stream().await.unwrap_err();
        assert!(matches!(err, SummitError::Capture(_)));
    }

    #[tokio::test]
    async fn test_mock_camera_grab_without_stream_fails() {
        let camera = MockCameraService::with_frame(vec![1]);
        let err = camera.grab_jpeg().await.unwrap_err();
        assert!(matches!(err, SummitError::Capture(_)));
    }

    #[tokio::test]
    async fn test_mock_camera_denying() {
        let camera = MockCameraService::denying();
        let err = camera.open_stream().await.unwrap_err();
        assert!(matches!(err, SummitError::AccessDenied(_)));
        assert!(!camera.is_streaming());
    }

    #[tokio::test]
    async fn test_mock_geolocation() {
        let geo = MockGeolocationService::fixed(Coordinates::new(37.5, 127.0));
        assert_eq!(geo.current_position().await, Some(Coordinates::new(37.5, 127.0)));

        let none = MockGeolocationService::unavailable();
        assert_eq!(none.current_position().await, None);
    }
}
