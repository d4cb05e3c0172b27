//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, the interactive shell
//! and the app runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod presenter;
pub mod shell;

// Re-export commonly used types
pub use app::{run_delete, run_list, run_shell, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction};
pub use presenter::Presenter;
