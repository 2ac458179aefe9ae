//! Summit assets crate - embedded asset resolution for rendered documents.
//!
//! Documents embed photos as `![](img/<file>)` references. This crate scans
//! text for those references, materializes display handles through an
//! [`AssetProvider`], and rewrites rendered HTML so resolved references show
//! while unresolved ones fall back to the raw tag.

pub mod provider;
pub mod resolver;

pub use provider::{AssetProvider, DisplayHandle, MockAssetProvider};
pub use resolver::{AssetResolver, RenderFn};
