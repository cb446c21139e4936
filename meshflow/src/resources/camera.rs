//! Camera-sensor database and its provenance.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a run's camera database came from.
///
/// Only a database the run downloaded itself may be deleted at run end; a
/// caller-supplied file is never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Supplied by the caller.
    UserSupplied,
    /// Fetched by the run into a run-owned temporary directory.
    Downloaded,
}

/// The camera-sensor database passed to image listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDatabase {
    path: PathBuf,
    provenance: Provenance,
}

impl CameraDatabase {
    /// A database supplied by the caller.
    #[must_use]
    pub fn user_supplied(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            provenance: Provenance::UserSupplied,
        }
    }

    /// A database downloaded by the run.
    #[must_use]
    pub fn downloaded(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            provenance: Provenance::Downloaded,
        }
    }

    /// The database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the database came from.
    #[must_use]
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_provenance() {
        let supplied = CameraDatabase::user_supplied("/data/sensors.txt");
        assert_eq!(supplied.provenance(), Provenance::UserSupplied);
        assert_eq!(supplied.path(), Path::new("/data/sensors.txt"));
        assert_eq!(
            CameraDatabase::downloaded("/tmp/x/sensors.txt").provenance(),
            Provenance::Downloaded
        );
    }

    #[test]
    fn test_serialize_provenance() {
        let db = CameraDatabase::user_supplied("/data/sensors.txt");
        let json = serde_json::to_value(&db).unwrap();
        assert_eq!(json["provenance"], "user_supplied");
    }
}
