//! Stage descriptors.
//!
//! A stage is data: the tool it runs, a pure function building its argument
//! list from the configuration and the run's directory layout, and the
//! artifacts it is expected to write. The fixed SfM and MVS stage lists live
//! in [`sfm_stages`] and [`mvs_stages`].

mod descriptor;
mod mvs;
mod sfm;

pub use descriptor::{ArgBuilder, ArtifactResolver, RunLayout, StageDescriptor, StageInputs};
pub use mvs::mvs_stages;
pub use sfm::sfm_stages;

use std::path::Path;

/// Renders a path as a tool argument.
///
/// Configured paths are checked as UTF-8 when the configuration is built and
/// every derived path appends ASCII names, so the conversion is lossless.
pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
