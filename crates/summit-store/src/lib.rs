//! Summit store crate - folder selection capability and the document store.
//!
//! The store is the sole path to persistence: document reads, atomic saves,
//! and asset blob I/O all go through [`DocumentStore`]. No operation retries
//! automatically; failures surface to the caller as status text.

pub mod picker;
pub mod store;

pub use picker::{FolderHandle, FolderPicker, MockFolderPicker};
pub use store::{DocumentStore, ASSET_DIR};
