//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod analyze;
pub mod diff;
pub mod export;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use analyze::{execute_analyze, validate_args};
pub use diff::execute_diff;
pub use export::execute_export;
pub use models::{AnalyzeArgs, DiffArgs, ExportArgs};
pub use utils::{display_schema, display_version, load_analytics_config, validate_bundle_file};
