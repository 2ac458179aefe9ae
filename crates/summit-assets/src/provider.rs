//! Display-handle provider capability.
//!
//! A display handle is the transient, revocable resource a host uses to show
//! a binary asset (the original platform used object URLs). Handles must be
//! released back to their provider before the map owning them is replaced,
//! so rapid successive rebuilds cannot leak.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use summit_core::Result;

/// Transient handle a host can display, e.g. an object or file URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayHandle {
    /// The asset reference path this handle resolves, e.g. `img/x.jpg`.
    pub path: String,
    /// Locally-addressable URL for display.
    pub url: String,
    /// Identity of the underlying resource, for release bookkeeping.
    pub token: Uuid,
}

/// Materializes and revokes display handles for asset bytes.
#[async_trait]
pub trait AssetProvider: Send + Sync {
    async fn acquire(&self, rel_path: &str, bytes: &[u8]) -> Result<DisplayHandle>;

    /// Release the resource behind `handle`. Releasing an already-released
    /// handle is a provider-visible bug, not undefined behavior.
    async fn release(&self, handle: &DisplayHandle);
}

/// In-memory provider for tests.
///
/// Tracks live tokens so tests can assert the release-before-replace
/// contract, and counts every acquire/release.
#[derive(Debug, Default)]
pub struct MockAssetProvider {
    live: Mutex<Vec<Uuid>>,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl MockAssetProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles acquired over the provider's lifetime.
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::Relaxed)
    }

    /// Handles released over the provider's lifetime.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::Relaxed)
    }

    /// Handles currently held by callers.
    pub fn live(&self) -> usize {
        self.live.lock().expect("live mutex poisoned").len()
    }
}

#[async_trait]
impl AssetProvider for MockAssetProvider {
    async fn acquire(&self, rel_path: &str, _bytes: &[u8]) -> Result<DisplayHandle> {
        let token = Uuid::new_v4();
        self.live.lock().expect("live mutex poisoned").push(token);
        self.acquired.fetch_add(1, Ordering::Relaxed);
        Ok(DisplayHandle {
            path: rel_path.to_string(),
            url: format!("mock://{}", token),
            token,
        })
    }

    async fn release(&self, handle: &DisplayHandle) {
        let mut live = self.live.lock().expect("live mutex poisoned");
        if let Some(idx) = live.iter().position(|t| *t == handle.token) {
            live.remove(idx);
        }
        self.released.fetch_add(1, Ordering::Relaxed);
    }
}
