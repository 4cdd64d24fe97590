/// Project descriptor (`<name>.seg_proj`)
///
/// The descriptor is the single record describing a project: which dataset
/// it draws from, where its starting model came from, and the order in
/// which images are presented. It is stored as pretty-printed JSON and
/// always replaced atomically.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::{ProjectLoadError, ProjectSaveError};
use crate::files;

/// Extension of project descriptor files
pub const PROJECT_EXTENSION: &str = "seg_proj";

/// `original_model_file` value for projects trained from scratch
pub const RANDOM_WEIGHTS: &str = "random weights";

/// Everything needed to reopen a project
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    /// Project name, unique within `projects/`
    pub name: String,
    /// Name of the directory under `datasets/` holding the images
    pub dataset: String,
    /// Model the project started from, or `RANDOM_WEIGHTS`
    #[serde(default)]
    pub original_model_file: String,
    /// Project directory relative to the sync root (e.g. `projects/roots_a`)
    #[serde(default)]
    pub location: String,
    /// Navigation order. Never contains duplicates.
    pub file_names: Vec<String>,
    /// Optional directory of full-size originals shown for context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_image_dir: Option<String>,
}

impl ProjectDescriptor {
    /// Convert to the JSON stored on disk
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from the JSON stored on disk
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read a descriptor.
    ///
    /// Fails if the file is missing, is not valid JSON, lacks `name`,
    /// `dataset` or `file_names`, or lists an image twice.
    pub fn load(path: &Path) -> Result<Self, ProjectLoadError> {
        let json = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ProjectLoadError::NotFound(path.to_path_buf())
            } else {
                ProjectLoadError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let descriptor = Self::from_json(&json).map_err(|source| ProjectLoadError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(name) = descriptor.first_duplicate() {
            return Err(ProjectLoadError::DuplicateFileName {
                path: path.to_path_buf(),
                name: name.to_string(),
            });
        }

        Ok(descriptor)
    }

    /// Write the descriptor, replacing any previous version atomically
    pub fn save(&self, path: &Path) -> Result<(), ProjectSaveError> {
        if let Some(name) = self.first_duplicate() {
            return Err(ProjectSaveError::DuplicateFileName(name.to_string()));
        }

        let json = self.to_json().map_err(ProjectSaveError::Serialize)?;
        files::atomic_write(path, json.as_bytes()).map_err(|source| ProjectSaveError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// First file name that appears more than once, if any
    pub fn first_duplicate(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.file_names
            .iter()
            .find(|name| !seen.insert(name.as_str()))
            .map(String::as_str)
    }

    /// Names in `file_names` with no matching file in `dataset_dir`.
    ///
    /// This is a warning, not an error: the project stays usable and the
    /// missing images are simply unavailable.
    pub fn missing_files(&self, dataset_dir: &Path) -> Vec<String> {
        self.file_names
            .iter()
            .filter(|name| !dataset_dir.join(name).is_file())
            .cloned()
            .collect()
    }

    /// Append names not already present, keeping existing order.
    /// Returns how many were added.
    pub fn append_file_names<I>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut known: HashSet<String> = self.file_names.iter().cloned().collect();
        let before = self.file_names.len();
        for name in names {
            if known.insert(name.clone()) {
                self.file_names.push(name);
            }
        }
        self.file_names.len() - before
    }

    pub fn is_random_weights(&self) -> bool {
        self.original_model_file == RANDOM_WEIGHTS
    }
}
