//! # Meshflow
//!
//! Turns a directory of photographs into a textured 3D mesh by driving an
//! external structure-from-motion toolchain and an external multi-view-stereo
//! toolchain as subprocesses.
//!
//! The crate owns the orchestration only:
//!
//! - **Stage descriptors**: each external invocation is data (tool, argument
//!   builder, produced artifacts) and can be planned without running it
//! - **Sequencers**: the fixed SfM and MVS stage lists, run strictly in order
//! - **Capabilities**: subprocess, filesystem and download access behind
//!   traits so the engine can be driven by test doubles
//! - **Scoped resources**: run-owned temporary directories are released on
//!   every exit path
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use meshflow::prelude::*;
//!
//! let config = PipelineConfig::builder()
//!     .input_dir("./photos")
//!     .output_dir("./out")
//!     .max_threads(4)
//!     .build()?;
//!
//! let runner = PipelineRunner::new(config, Capabilities::local());
//! let report = runner.run(&CancellationToken::new()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod exec;
pub mod observability;
pub mod pipeline;
pub mod resources;
pub mod stages;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{PipelineConfig, PipelineConfigBuilder, ToolLocations, ToolParameters};
    pub use crate::core::{ArtifactSet, MeshFormat, Phase, RunState, StageOutcome, Toolchain};
    pub use crate::errors::{
        ConfigurationError, DownloadError, ExternalToolError, IoError, PipelineError, ToolFailure,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::exec::{check_toolchain, CommandRunner, Invocation, ProcessRunner};
    pub use crate::pipeline::{
        ArtifactHandoff, PipelineRun, PipelineRunner, RunOutcome, RunReport, StageRecord,
        StageSequencer,
    };
    pub use crate::resources::{
        CameraDatabase, Capabilities, DirectoryManager, FileSystem, LocalFileSystem, Provenance,
        ResourceProvider, TempResource,
    };
    pub use crate::stages::{RunLayout, StageDescriptor, StageInputs};
}
