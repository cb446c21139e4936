//! Filesystem, temporary-directory and download capabilities.
//!
//! The orchestration engine never touches the filesystem or network
//! directly: it goes through the [`FileSystem`] and [`ResourceProvider`]
//! traits bundled in [`Capabilities`], so tests can substitute doubles.

mod camera;
mod capabilities;
mod directories;
mod download;
mod filesystem;

pub use camera::{CameraDatabase, Provenance};
pub use capabilities::Capabilities;
pub use directories::{DirectoryManager, ReleaseSummary, TempResource, TempResourceSet, TEMP_PREFIX};
#[cfg(feature = "download")]
pub use download::HttpResourceProvider;
pub use download::{ResourceProvider, UnavailableResourceProvider};
pub(crate) use download::file_name_from_url;
#[cfg(test)]
pub(crate) use download::MockResourceProvider;
pub use filesystem::{FileSystem, LocalFileSystem};
