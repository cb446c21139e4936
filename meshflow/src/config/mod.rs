//! Pipeline configuration.
//!
//! [`PipelineConfig`] is validated once by [`PipelineConfigBuilder::build`]
//! and immutable afterwards. Tool tunables live in [`ToolParameters`], which
//! can be loaded from a partial JSON file on top of the built-in defaults.

mod pipeline;
mod tools;

pub use pipeline::{PipelineConfig, PipelineConfigBuilder};
pub(crate) use pipeline::require_utf8;
pub use tools::{ToolLocations, ToolParameters, DEFAULT_CAMERA_DATABASE_URL};
