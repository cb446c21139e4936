//! Core domain model types for meshflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Run state machine and stage outcome enums
//! - The inter-stage file-naming protocol
//! - The accumulated artifact set of a run

mod artifact;
mod status;

pub use artifact::{names, ArtifactEntry, ArtifactSet, MeshFormat};
pub use status::{Phase, RunState, StageOutcome, Toolchain};
