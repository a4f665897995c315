//! Launch layer: path derivation, command assembly, process delegation.

pub mod command;
pub mod paths;
pub mod runner;

pub use command::{DelegateCommand, PYTHON_WARNINGS_VAR};
pub use paths::RunPaths;
pub use runner::Launcher;
