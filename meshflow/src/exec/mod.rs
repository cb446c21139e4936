//! External command execution.
//!
//! This module provides:
//! - [`Invocation`], the pure description of one tool call
//! - [`CommandRunner`], the capability that executes it
//! - [`ProcessRunner`], which launches real subprocesses
//! - [`check_toolchain`], which reports tools that cannot be found

mod command;
mod health;
mod process;

pub use command::{CommandRunner, Invocation};
pub use health::{check_toolchain, MissingTool};
pub use process::ProcessRunner;
