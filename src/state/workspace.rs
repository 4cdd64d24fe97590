/// Creating and opening projects inside a sync directory

use std::fs;
use std::path::{Path, PathBuf};

use super::layout::ProjectLayout;
use super::project::{ProjectDescriptor, RANDOM_WEIGHTS};
use crate::error::{ProjectCreateError, ProjectLoadError, ProjectSaveError};
use crate::files;
use crate::sync::{SyncDir, PROJECTS_DIR};

/// Parameters for a new project
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    /// Directory name under `datasets/`
    pub dataset: String,
    /// Checkpoint to start from. `None` trains from random weights.
    pub original_model_file: Option<PathBuf>,
    /// Image order. `None` takes every image in the dataset, sorted by name.
    pub file_names: Option<Vec<String>>,
}

/// A project ready for use by the presentation layer
#[derive(Debug, Clone)]
pub struct OpenProject {
    pub layout: ProjectLayout,
    pub descriptor: ProjectDescriptor,
    pub dataset_dir: PathBuf,
    /// Listed images that are absent from the dataset
    pub missing_files: Vec<String>,
}

/// Check a project name is usable as a single directory name
pub fn is_valid_project_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Check a dataset name refers to a directory directly under `datasets/`
fn is_single_dir_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// Create a project directory, its subdirectories and its descriptor.
///
/// A starting model, if given, is copied into `models/` as the first
/// checkpoint so the worker can fine-tune from it. Input is validated
/// before anything is written, and a partly built project directory is
/// removed again if a later step fails.
pub fn create_project(
    sync: &SyncDir,
    new: NewProject,
) -> Result<OpenProject, ProjectCreateError> {
    if !is_valid_project_name(&new.name) {
        return Err(ProjectCreateError::InvalidName(new.name));
    }
    if !is_single_dir_name(&new.dataset) {
        return Err(ProjectCreateError::InvalidDataset(new.dataset));
    }

    let layout = ProjectLayout::for_project(sync, &new.name);
    if layout.dir().exists() {
        return Err(ProjectCreateError::AlreadyExists(new.name));
    }

    let dataset_dir = sync.dataset_dir(&new.dataset);
    if !dataset_dir.is_dir() {
        return Err(ProjectCreateError::DatasetMissing(dataset_dir));
    }

    let file_names = match new.file_names {
        Some(names) => names,
        None => files::ls_images(&dataset_dir).map_err(|source| ProjectCreateError::Io {
            path: dataset_dir.clone(),
            source,
        })?,
    };

    let descriptor = ProjectDescriptor {
        name: new.name.clone(),
        dataset: new.dataset,
        original_model_file: match &new.original_model_file {
            Some(model) => model.to_string_lossy().to_string(),
            None => RANDOM_WEIGHTS.to_string(),
        },
        location: format!("{}/{}", PROJECTS_DIR, new.name),
        file_names,
        original_image_dir: None,
    };
    if let Some(name) = descriptor.first_duplicate() {
        return Err(ProjectSaveError::DuplicateFileName(name.to_string()).into());
    }

    sync.ensure().map_err(|source| ProjectCreateError::Io {
        path: sync.root().to_path_buf(),
        source,
    })?;

    if let Err(err) = populate_project(&layout, &descriptor, new.original_model_file.as_deref()) {
        if let Err(cleanup) = fs::remove_dir_all(layout.dir()) {
            tracing::warn!(
                "failed to remove partial project {}: {}",
                layout.dir().display(),
                cleanup
            );
        }
        return Err(err);
    }

    tracing::info!(
        project = %descriptor.name,
        images = descriptor.file_names.len(),
        "project created"
    );

    let missing_files = descriptor.missing_files(&dataset_dir);
    Ok(OpenProject {
        layout,
        descriptor,
        dataset_dir,
        missing_files,
    })
}

/// Load a project from its `.seg_proj` file.
///
/// Images listed in the descriptor but absent from the dataset are
/// reported in `missing_files` and logged; they do not fail the load.
pub fn open_project(sync: &SyncDir, proj_file: &Path) -> Result<OpenProject, ProjectLoadError> {
    let descriptor = ProjectDescriptor::load(proj_file)?;
    let layout = ProjectLayout::from_proj_file(proj_file)
        .ok_or_else(|| ProjectLoadError::NotFound(proj_file.to_path_buf()))?;
    let dataset_dir = sync.dataset_dir(&descriptor.dataset);

    let missing_files = descriptor.missing_files(&dataset_dir);
    if !missing_files.is_empty() {
        tracing::warn!(
            project = %descriptor.name,
            missing = missing_files.len(),
            "project lists images missing from dataset {}",
            dataset_dir.display()
        );
    }

    Ok(OpenProject {
        layout,
        descriptor,
        dataset_dir,
        missing_files,
    })
}

fn populate_project(
    layout: &ProjectLayout,
    descriptor: &ProjectDescriptor,
    starting_model: Option<&Path>,
) -> Result<(), ProjectCreateError> {
    layout.create_dirs().map_err(|source| ProjectCreateError::Io {
        path: layout.dir().to_path_buf(),
        source,
    })?;
    if let Some(model) = starting_model {
        copy_starting_model(model, layout)?;
    }
    descriptor.save(&layout.proj_file())?;
    Ok(())
}

fn copy_starting_model(model: &Path, layout: &ProjectLayout) -> Result<(), ProjectCreateError> {
    let target = layout
        .models_dir()
        .join(format!("000001_{}.pkl", chrono::Utc::now().timestamp()));
    fs::copy(model, &target).map_err(|source| ProjectCreateError::Io {
        path: model.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sync_with_dataset(images: &[&str]) -> (TempDir, SyncDir) {
        let temp = TempDir::new().unwrap();
        let sync = SyncDir::new(temp.path().join("sync"));
        sync.ensure().unwrap();
        let dataset = sync.dataset_dir("field");
        fs::create_dir_all(&dataset).unwrap();
        for name in images {
            fs::write(dataset.join(name), b"").unwrap();
        }
        (temp, sync)
    }

    #[test]
    fn test_create_from_dataset_listing() {
        let (_temp, sync) = sync_with_dataset(&["b.png", "a.jpg", "notes.txt"]);
        let project = create_project(
            &sync,
            NewProject {
                name: "roots_a".into(),
                dataset: "field".into(),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(project.descriptor.file_names, vec!["a.jpg", "b.png"]);
        assert_eq!(project.descriptor.location, "projects/roots_a");
        assert!(project.descriptor.is_random_weights());
        assert!(project.missing_files.is_empty());
        assert!(project.layout.messages_dir().is_dir());

        let reopened = open_project(&sync, &project.layout.proj_file()).unwrap();
        assert_eq!(reopened.descriptor, project.descriptor);
        assert_eq!(sync.list_projects(), vec!["roots_a"]);
    }

    #[test]
    fn test_create_copies_starting_model() {
        let (temp, sync) = sync_with_dataset(&["a.png"]);
        let model = temp.path().join("pretrained.pkl");
        fs::write(&model, b"weights").unwrap();

        let project = create_project(
            &sync,
            NewProject {
                name: "tuned".into(),
                dataset: "field".into(),
                original_model_file: Some(model.clone()),
                file_names: None,
            },
        )
        .unwrap();

        assert_eq!(project.descriptor.original_model_file, model.to_string_lossy());
        let latest = project.layout.latest_model().unwrap();
        assert_eq!(fs::read(latest).unwrap(), b"weights");
    }

    #[test]
    fn test_create_errors() {
        let (_temp, sync) = sync_with_dataset(&["a.png"]);
        let new = |name: &str, dataset: &str| NewProject {
            name: name.into(),
            dataset: dataset.into(),
            ..Default::default()
        };

        assert!(matches!(
            create_project(&sync, new("bad/name", "field")),
            Err(ProjectCreateError::InvalidName(_))
        ));
        assert!(matches!(
            create_project(&sync, new("p", "nowhere")),
            Err(ProjectCreateError::DatasetMissing(_))
        ));

        create_project(&sync, new("p", "field")).unwrap();
        assert!(matches!(
            create_project(&sync, new("p", "field")),
            Err(ProjectCreateError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_create_with_duplicate_names_fails() {
        let (_temp, sync) = sync_with_dataset(&["a.png", "b.png"]);
        let result = create_project(
            &sync,
            NewProject {
                name: "p".into(),
                dataset: "field".into(),
                file_names: Some(vec!["a.png".into(), "a.png".into()]),
                ..Default::default()
            },
        );
        assert!(matches!(
            result,
            Err(ProjectCreateError::Save(ProjectSaveError::DuplicateFileName(ref name))) if name == "a.png"
        ));
        assert!(!sync.project_dir("p").exists());

        let project = create_project(
            &sync,
            NewProject {
                name: "p".into(),
                dataset: "field".into(),
                file_names: Some(vec!["a.png".into(), "b.png".into()]),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(project.layout.proj_file().is_file());
    }

    #[test]
    fn test_failed_model_copy_leaves_nothing_behind() {
        let (temp, sync) = sync_with_dataset(&["a.png"]);
        let new = |model: PathBuf| NewProject {
            name: "tuned".into(),
            dataset: "field".into(),
            original_model_file: Some(model),
            file_names: None,
        };

        let result = create_project(&sync, new(temp.path().join("absent.pkl")));
        assert!(matches!(result, Err(ProjectCreateError::Io { .. })));
        assert!(!sync.project_dir("tuned").exists());

        let model = temp.path().join("pretrained.pkl");
        fs::write(&model, b"weights").unwrap();
        create_project(&sync, new(model)).unwrap();
    }

    #[test]
    fn test_dataset_must_be_a_single_name() {
        let (_temp, sync) = sync_with_dataset(&["a.png"]);
        fs::write(sync.root().join("stray.png"), b"").unwrap();

        for dataset in ["..", "", "field/..", "../sync/datasets/field"] {
            let result = create_project(
                &sync,
                NewProject {
                    name: "p".into(),
                    dataset: dataset.into(),
                    ..Default::default()
                },
            );
            assert!(matches!(result, Err(ProjectCreateError::InvalidDataset(_))), "{dataset:?}");
        }
        assert!(!sync.project_dir("p").exists());

        fs::create_dir_all(sync.dataset_dir("field 2023.v2")).unwrap();
        create_project(
            &sync,
            NewProject {
                name: "p".into(),
                dataset: "field 2023.v2".into(),
                ..Default::default()
            },
        )
        .unwrap();
    }

    #[test]
    fn test_open_reports_missing_images() {
        let (_temp, sync) = sync_with_dataset(&["a.png"]);
        let project = create_project(
            &sync,
            NewProject {
                name: "p".into(),
                dataset: "field".into(),
                file_names: Some(vec!["a.png".into(), "lost.png".into()]),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(project.missing_files, vec!["lost.png"]);

        let reopened = open_project(&sync, &project.layout.proj_file()).unwrap();
        assert_eq!(reopened.missing_files, vec!["lost.png"]);
    }

    #[test]
    fn test_open_missing_descriptor() {
        let (_temp, sync) = sync_with_dataset(&[]);
        let err = open_project(&sync, &sync.project_dir("ghost").join("ghost.seg_proj")).unwrap_err();
        assert!(matches!(err, ProjectLoadError::NotFound(_)));
    }
}
