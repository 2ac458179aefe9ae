//! Summit capture crate - still-photo acquisition.
//!
//! Camera and geolocation are opaque capability providers behind traits,
//! with mocks for hardware-free tests. The capture service grabs a single
//! frame, tags it with a timestamp and best-effort coordinates, stores it
//! through the document store, and always releases the stream.

pub mod camera;
pub mod naming;
pub mod service;

pub use camera::{CameraService, GeolocationService, MockCameraService, MockGeolocationService};
pub use naming::{capture_file_name, upload_file_name};
pub use service::PhotoCaptureService;
