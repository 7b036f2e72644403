//! Utility modules shared by the loader and its tools

pub mod error;
pub mod logging;

pub use error::log_error;
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
pub use logging::{init_logging, init_logging_from_config};
