//! The photo capture service.
//!
//! Two entry points share one effect contract: acquire image bytes, tag
//! them with a timestamp-derived name and best-effort coordinates, store
//! them through the document store, and return the relative reference.
//! The video stream is released on every exit path.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::{debug, info, warn};

use summit_core::config::CaptureConfig;
use summit_core::{AssetReference, Coordinates, Result};
use summit_store::DocumentStore;

use crate::camera::{CameraService, GeolocationService};
use crate::naming::{capture_file_name, upload_file_name};

pub struct PhotoCaptureService {
    camera: Arc<dyn CameraService>,
    geolocation: Arc<dyn GeolocationService>,
    geolocation_timeout: Duration,
    image_extension: String,
}

impl PhotoCaptureService {
    pub fn new(
        camera: Arc<dyn CameraService>,
        geolocation: Arc<dyn GeolocationService>,
        config: &CaptureConfig,
    ) -> Self {
        Self {
            camera,
            geolocation,
            geolocation_timeout: Duration::from_secs(config.geolocation_timeout_secs),
            image_extension: config.image_extension.clone(),
        }
    }

    /// Grab a single frame from the camera and store it as an asset.
    ///
    /// The geolocation fix is bounded by the configured timeout so a
    /// missing fix cannot stall the capture; absence degrades the name to
    /// `unknown` coordinates.
    pub async fn capture_from_camera(&self, store: &DocumentStore) -> Result<AssetReference> {
        self.camera.open_stream().await?;
        let result = self.grab_and_store(store).await;
        self.camera.release_stream().await;

        match &result {
            Ok(asset) => info!(path = %asset.path(), "Photo captured"),
            Err(e) => warn!(error = %e, "Photo capture failed"),
        }
        result
    }

    async fn grab_and_store(&self, store: &DocumentStore) -> Result<AssetReference> {
        let bytes = self.camera.grab_jpeg().await?;
        let coords = self.bounded_position().await;

        let name = capture_file_name(&Local::now(), coords.as_ref(), &self.image_extension);
        let rel_path = store.write_asset(&name, &bytes).await?;
        Ok(AssetReference::new(rel_path))
    }

    async fn bounded_position(&self) -> Option<Coordinates> {
        match tokio::time::timeout(self.geolocation_timeout, self.geolocation.current_position())
            .await
        {
            Ok(position) => position,
            Err(_) => {
                debug!(
                    timeout_secs = self.geolocation_timeout.as_secs_f64(),
                    "Geolocation fix timed out"
                );
                None
            }
        }
    }

    /// Store a user-provided blob as an asset under its original name,
    /// timestamp-prefixed.
    pub async fn capture_from_upload(
        &self,
        store: &DocumentStore,
        bytes: &[u8],
        original_name: &str,
    ) -> Result<AssetReference> {
        let name = upload_file_name(&Local::now(), original_name);
        let rel_path = store.write_asset(&name, bytes).await?;
        info!(path = %rel_path, bytes = bytes.len(), "Photo uploaded");
        Ok(AssetReference::new(rel_path))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{MockCameraService, MockGeolocationService};
    use summit_core::SummitError;
    use summit_store::MockFolderPicker;

    async fn store_in(dir: &std::path::Path) -> DocumentStore {
        let mut store = DocumentStore::new();
        store
            .select_folder(&MockFolderPicker::granting(dir))
            .await
            .unwrap();
        store
    }

    fn service(
        camera: Arc<MockCameraService>,
        geolocation: MockGeolocationService,
    ) -> PhotoCaptureService {
        PhotoCaptureService::new(
            camera,
            Arc::new(geolocation),
            &CaptureConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_capture_without_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let camera = Arc::new(MockCameraService::with_frame(vec![0xff, 0xd8, 0xff]));
        let svc = service(Arc::clone(&camera), MockGeolocationService::unavailable());

        let asset = svc.capture_from_camera(&store).await.unwrap();
        assert!(asset.path().starts_with("img/"));
        assert!(asset.path().ends_with("-unknown-unknown.jpg"));

        let written = store.read_asset(asset.path()).await.unwrap();
        assert_eq!(written, vec![0xff, 0xd8, 0xff]);
        assert_eq!(camera.releases(), 1);
        assert!(!camera.is_streaming());
    }

    #[tokio::test]
    async fn test_capture_with_coordinates_in_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let camera = Arc::new(MockCameraService::with_frame(vec![1]));
        let svc = service(
            Arc::clone(&camera),
            MockGeolocationService::fixed(Coordinates::new(37.5665, 126.978)),
        );

        let asset = svc.capture_from_camera(&store).await.unwrap();
        assert!(asset.path().ends_with("-37.566500-126.978000.jpg"));
    }

    #[tokio::test]
    async fn test_slow_geolocation_does_not_stall_capture() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let camera = Arc::new(MockCameraService::with_frame(vec![1]));
        let geolocation = MockGeolocationService::fixed(Coordinates::new(1.0, 2.0))
            .with_delay(Duration::from_secs(60));

        let mut svc = service(Arc::clone(&camera), geolocation);
        svc.geolocation_timeout = Duration::from_millis(20);

        let asset = svc.capture_from_camera(&store).await.unwrap();
        assert!(asset.path().ends_with("-unknown-unknown.jpg"));
        assert_eq!(camera.releases(), 1);
    }

    #[tokio::test]
    async fn test_grab_failure_releases_stream() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let camera = Arc::new(MockCameraService::failing_grab());
        let svc = service(Arc::clone(&camera), MockGeolocationService::unavailable());

        let err = svc.capture_from_camera(&store).await.unwrap_err();
        assert!(matches!(err, SummitError::Capture(_)));
        assert_eq!(camera.opens(), 1);
        assert_eq!(camera.releases(), 1);
        assert!(!camera.is_streaming());

        // Nothing was written.
        assert!(!dir.path().join("img").exists());
    }

    #[tokio::test]
    async fn test_camera_denied_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let camera = Arc::new(MockCameraService::denying());
        let svc = service(Arc::clone(&camera), MockGeolocationService::unavailable());

        let err = svc.capture_from_camera(&store).await.unwrap_err();
        assert!(matches!(err, SummitError::AccessDenied(_)));
        assert_eq!(camera.opens(), 0);
    }

    #[tokio::test]
    async fn test_upload_keeps_original_name_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let camera = Arc::new(MockCameraService::with_frame(vec![1]));
        let svc = service(camera, MockGeolocationService::unavailable());

        let asset = svc
            .capture_from_upload(&store, &[9, 9], "holiday.png")
            .await
            .unwrap();
        assert!(asset.path().starts_with("img/"));
        assert!(asset.path().ends_with("-holiday.png"));
        assert_eq!(store.read_asset(asset.path()).await.unwrap(), vec![9, 9]);
    }
}
