/// Adding newly arrived dataset images to an existing project

use std::collections::HashSet;
use std::io;
use std::path::Path;

use super::project::ProjectDescriptor;
use crate::error::ExtendError;
use crate::files;

/// Images in `dataset_dir` not yet listed in `file_names`, sorted by name
pub fn find_new_dataset_files(dataset_dir: &Path, file_names: &[String]) -> io::Result<Vec<String>> {
    let known: HashSet<&str> = file_names.iter().map(String::as_str).collect();
    Ok(files::ls_images(dataset_dir)?
        .into_iter()
        .filter(|name| !known.contains(name.as_str()))
        .collect())
}

/// Append new dataset images to the project and save it.
///
/// Existing entries keep their order; new ones go at the end. The
/// descriptor on disk is only rewritten when something was added.
/// Returns the updated descriptor and the names that were added.
pub fn extend_project(
    proj_file: &Path,
    dataset_dir: &Path,
) -> Result<(ProjectDescriptor, Vec<String>), ExtendError> {
    let mut descriptor = ProjectDescriptor::load(proj_file)?;

    let new_files = find_new_dataset_files(dataset_dir, &descriptor.file_names).map_err(
        |source| ExtendError::ListDataset {
            path: dataset_dir.to_path_buf(),
            source,
        },
    )?;

    if !new_files.is_empty() {
        descriptor.append_file_names(new_files.iter().cloned());
        descriptor.save(proj_file)?;
        tracing::info!(
            project = %descriptor.name,
            added = new_files.len(),
            "project extended"
        );
    }

    Ok((descriptor, new_files))
}
