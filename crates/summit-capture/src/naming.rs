//! Asset file naming for captures and uploads.

use chrono::{DateTime, Local};

use summit_core::Coordinates;

/// Compact local timestamp used as the file name prefix.
fn stamp(ts: &DateTime<Local>) -> String {
    ts.format("%Y%m%d%H%M%S").to_string()
}

/// Name for a camera capture: `YYYYMMDDHHMMSS-<lat>-<lng>.<ext>`, with
/// `unknown` in place of missing coordinates.
pub fn capture_file_name(
    ts: &DateTime<Local>,
    coords: Option<&Coordinates>,
    extension: &str,
) -> String {
    match coords {
        Some(c) => format!("{}-{:.6}-{:.6}.{}", stamp(ts), c.lat, c.lng, extension),
        None => format!("{}-unknown-unknown.{}", stamp(ts), extension),
    }
}

/// Name for an uploaded blob: `YYYYMMDDHHMMSS-<original_name>`.
pub fn upload_file_name(ts: &DateTime<Local>, original_name: &str) -> String {
    format!("{}-{}", stamp(ts), original_name)
}
