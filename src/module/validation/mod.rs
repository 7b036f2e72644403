//! Mod validation framework
//!
//! Provides manifest structure and dependency declaration validation.

pub mod manifest_validator;

pub use manifest_validator::{ManifestValidator, ValidationResult};
