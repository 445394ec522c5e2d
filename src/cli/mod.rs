//! Command-line surface: argument definitions (`args`) and the dispatch
//! logic that wires them to the engine and the file-backed ports
//! (`commands`). Split the way the teacher keeps parsing and dispatch in
//! separate files under its own `cli/` module.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};
