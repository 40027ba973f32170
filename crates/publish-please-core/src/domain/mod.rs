//! Domain models for publish-please.
//!
//! - `InvocationContext`: how npm launched the current process
//! - `ResolvedConfig`: merged publish configuration
//! - `Manifest`: the project's `package.json`

pub mod config;
pub mod context;
pub mod error;
pub mod manifest;

pub use config::{ResolvedConfig, ValidationOptions, ValidationSetting, CONFIG_FILE};
pub use context::{detect, EnvSnapshot, Flag, InvocationContext, Subcommand};
pub use error::{PublishError, Result};
pub use manifest::{Manifest, MANIFEST_FILE};
