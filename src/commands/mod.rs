//! Command parsing and execution
//!
//! Handles the shell's command system (commands optionally starting with `/`)

pub mod handlers;
pub mod parser;

pub use parser::{Command, parse_command};
