//! Test doubles for driving the pipeline without external tools.
//!
//! This module provides:
//! - A command runner that records invocations and scripts failures
//! - A filesystem that records removals and copies
//! - A resource provider that serves a fixed file
//! - A workspace fixture laying out input and output directories

mod fixtures;
mod mocks;

pub use fixtures::TestWorkspace;
pub use mocks::{RecordingCommandRunner, RecordingFileSystem, StaticResourceProvider};
