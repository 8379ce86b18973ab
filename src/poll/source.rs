use std::path::{Path, PathBuf};

use crate::foundation::error::{MixviewError, MixviewResult};
use crate::snapshot::model::Snapshot;

/// Produces one fresh [`Snapshot`] per poll tick.
pub trait SnapshotSource {
    /// Fetch and parse the current engine state.
    fn fetch(&mut self) -> MixviewResult<Snapshot>;
}

impl<F> SnapshotSource for F
where
    F: FnMut() -> MixviewResult<Snapshot>,
{
    fn fetch(&mut self) -> MixviewResult<Snapshot> {
        self()
    }
}

/// Re-reads a JSON snapshot file every tick. Stands in for the live endpoint when replaying.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Source reading `path` on every fetch.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for FileSource {
    fn fetch(&mut self) -> MixviewResult<Snapshot> {
        Snapshot::from_path(&self.path).map_err(|e| match e {
            MixviewError::Other(inner) => {
                MixviewError::source(format!("{}: {inner:#}", self.path.display()))
            }
            other => other,
        })
    }
}
