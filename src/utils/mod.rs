//! Shared utilities
//!
//! Logging setup, environment variable expansion for user-entered paths,
//! and executable icon extraction.

pub mod env;
pub mod icon_extractor;
pub mod logging;

pub use env::expand_env_vars;
pub use icon_extractor::extract_file_icon;
pub use logging::init_logging;
