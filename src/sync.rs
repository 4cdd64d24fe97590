/// The shared sync directory
///
/// Layout relative to the root:
/// - `datasets/<dataset>/` source images
/// - `projects/<project>/` one directory per project
/// - `instructions/` pending work requests for the worker

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::files;

pub const DATASETS_DIR: &str = "datasets";
pub const PROJECTS_DIR: &str = "projects";
pub const INSTRUCTIONS_DIR: &str = "instructions";

/// Handle on the sync root.
///
/// Only the root is stored. Every other path is derived on demand, so
/// re-pointing the root with `set_root` never leaves stale paths behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncDir {
    root: PathBuf,
}

impl SyncDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Point at a different sync root
    pub fn set_root(&mut self, root: impl Into<PathBuf>) {
        self.root = root.into();
        tracing::info!("sync directory changed to {}", self.root.display());
    }

    pub fn datasets_dir(&self) -> PathBuf {
        self.root.join(DATASETS_DIR)
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.root.join(PROJECTS_DIR)
    }

    pub fn instructions_dir(&self) -> PathBuf {
        self.root.join(INSTRUCTIONS_DIR)
    }

    pub fn dataset_dir(&self, dataset: &str) -> PathBuf {
        self.datasets_dir().join(dataset)
    }

    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.projects_dir().join(project)
    }

    /// Create the root and its top-level directories if they are missing
    pub fn ensure(&self) -> io::Result<()> {
        for dir in [self.datasets_dir(), self.projects_dir(), self.instructions_dir()] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Check whether the root and all top-level directories exist
    pub fn is_initialized(&self) -> bool {
        self.datasets_dir().is_dir() && self.projects_dir().is_dir() && self.instructions_dir().is_dir()
    }

    /// Names of all datasets. A missing `datasets/` yields an empty list.
    pub fn list_datasets(&self) -> Vec<String> {
        files::ls_dirs(&self.datasets_dir()).unwrap_or_default()
    }

    /// Names of all projects. A missing `projects/` yields an empty list.
    pub fn list_projects(&self) -> Vec<String> {
        files::ls_dirs(&self.projects_dir()).unwrap_or_default()
    }

    /// Express `path` relative to the root, if it lives under it
    pub fn relative(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(&self.root).ok().map(Path::to_path_buf)
    }
}
