//! Publishing of the final artifacts into the output directory.

use crate::core::{names, MeshFormat};
use crate::errors::IoError;
use crate::events::{kinds, EventSink};
use crate::resources::FileSystem;
use crate::stages::RunLayout;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Copies the textured mesh, and optionally the sparse reconstruction, into
/// the output directory under fixed names.
///
/// Publishing is all-or-nothing: every file is first copied to a hidden
/// staging name next to its destination and only renamed into place once
/// all copies succeeded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactHandoff {
    format: MeshFormat,
    publish_sparse: bool,
}

impl ArtifactHandoff {
    /// Creates a handoff publishing only the textured mesh as OBJ.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the format the textured mesh was exported in.
    #[must_use]
    pub fn with_format(mut self, format: MeshFormat) -> Self {
        self.format = format;
        self
    }

    /// Also publishes `colorized.ply` and `sfm_data.bin`.
    #[must_use]
    pub fn with_publish_sparse(mut self, enabled: bool) -> Self {
        self.publish_sparse = enabled;
        self
    }

    /// The `(source, destination)` pairs this handoff copies, in order.
    #[must_use]
    pub fn transfers(&self, layout: &RunLayout) -> Vec<(PathBuf, PathBuf)> {
        let sources = self.format.files(names::TEXTURED_MESH_STEM);
        let destinations = self.format.files(names::FINAL_STEM);
        let mut transfers: Vec<_> = sources
            .iter()
            .zip(&destinations)
            .map(|(src, dst)| (layout.build(src), layout.output(dst)))
            .collect();
        if self.publish_sparse {
            for name in [names::COLORIZED_PLY, names::SFM_DATA_BIN] {
                transfers.push((layout.reconstruction(name), layout.output(name)));
            }
        }
        transfers
    }

    /// Publishes every transfer, overwriting existing files.
    ///
    /// # Errors
    ///
    /// Returns an [`IoError`] if a source is missing or a copy or rename
    /// fails. When a source is missing or a copy fails, no destination has
    /// been touched.
    pub fn publish(
        &self,
        layout: &RunLayout,
        fs: &dyn FileSystem,
        sink: &dyn EventSink,
    ) -> Result<Vec<PathBuf>, IoError> {
        let transfers = self.transfers(layout);

        if let Some((src, _)) = transfers.iter().find(|(src, _)| !fs.exists(src)) {
            return Err(IoError::new(
                "publish",
                src,
                std::io::Error::new(std::io::ErrorKind::NotFound, "artifact was not produced"),
            ));
        }

        let mut staged = Vec::with_capacity(transfers.len());
        for (src, dst) in &transfers {
            let staging = staging_path(dst);
            match fs.copy_file(src, &staging) {
                Ok(bytes) => staged.push((staging, bytes)),
                Err(err) => {
                    // The failed copy may have left a partial file behind.
                    discard(fs, staged.iter().map(|(p, _)| p.as_path()).chain([staging.as_path()]));
                    return Err(err);
                }
            }
        }

        let mut published = Vec::with_capacity(transfers.len());
        let mut pending = transfers.into_iter().zip(staged);
        while let Some(((src, dst), (staging, bytes))) = pending.next() {
            if let Err(err) = fs.rename(&staging, &dst) {
                let leftover: Vec<PathBuf> = pending.map(|(_, (path, _))| path).collect();
                discard(
                    fs,
                    std::iter::once(staging.as_path()).chain(leftover.iter().map(PathBuf::as_path)),
                );
                return Err(err);
            }
            info!(src = %src.display(), dst = %dst.display(), bytes, "Published artifact");
            sink.try_emit(
                kinds::ARTIFACT_PUBLISHED,
                Some(json!({
                    "source": src.display().to_string(),
                    "destination": dst.display().to_string(),
                    "bytes": bytes,
                })),
            );
            published.push(dst);
        }

        Ok(published)
    }
}

/// Hidden sibling of `dst` that a file is copied to before it is renamed.
fn staging_path(dst: &Path) -> PathBuf {
    let name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dst.with_file_name(format!(".{name}.partial"))
}

fn discard<'a>(fs: &dyn FileSystem, paths: impl IntoIterator<Item = &'a Path>) {
    for path in paths {
        if fs.exists(path) {
            if let Err(err) = fs.remove_file(path) {
                warn!(path = %path.display(), error = %err, "Failed to remove staged artifact");
            }
        }
    }
}
