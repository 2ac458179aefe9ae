//! Summit core crate - shared data model, error type, configuration, and
//! the startup capability probe.
//!
//! Everything here is plain data and pure logic; platform capabilities live
//! behind traits in the subsystem crates.

pub mod capability;
pub mod config;
pub mod error;
pub mod types;

pub use capability::{Capability, CapabilityProbe, StaticCapabilities};
pub use config::{CommandPhrases, SummitConfig};
pub use error::{Result, SummitError};
pub use types::*;
