//! Command implementations for the dircopy CLI.
//!
//! Each command is implemented in its own module with a struct that
//! derives clap's `Args` trait for argument parsing.

pub mod completions;
pub mod diff;
pub mod list;
pub mod sync;
pub mod validate;

pub use completions::CompletionsCommand;
pub use diff::DiffCommand;
pub use list::ListCommand;
pub use sync::SyncCommand;
pub use validate::ValidateCommand;
