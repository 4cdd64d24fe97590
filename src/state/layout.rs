/// Project directory layout
///
/// ```text
/// projects/<name>/
///     <name>.seg_proj
///     annotations/train/   annotations/val/
///     segmentations/       models/
///     messages/            logs/
///     results/
/// ```
///
/// The client creates every directory up front. Annotations are written by
/// the client; segmentations, models, messages and logs by the worker.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::project::PROJECT_EXTENSION;
use crate::files;
use crate::sync::SyncDir;

/// Which annotation set an image belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationSplit {
    Train,
    Val,
}

impl AnnotationSplit {
    pub fn dir_name(&self) -> &'static str {
        match self {
            AnnotationSplit::Train => "train",
            AnnotationSplit::Val => "val",
        }
    }
}

/// Paths inside one project directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    dir: PathBuf,
}

impl ProjectLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn for_project(sync: &SyncDir, name: &str) -> Self {
        Self::new(sync.project_dir(name))
    }

    /// Layout of the directory containing a `.seg_proj` file
    pub fn from_proj_file(proj_file: &Path) -> Option<Self> {
        proj_file.parent().map(Self::new)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Project name, taken from the directory name
    pub fn name(&self) -> String {
        self.dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn proj_file(&self) -> PathBuf {
        self.dir.join(format!("{}.{}", self.name(), PROJECT_EXTENSION))
    }

    pub fn annotations_dir(&self) -> PathBuf {
        self.dir.join("annotations")
    }

    pub fn annotation_dir(&self, split: AnnotationSplit) -> PathBuf {
        self.annotations_dir().join(split.dir_name())
    }

    pub fn train_annot_dir(&self) -> PathBuf {
        self.annotation_dir(AnnotationSplit::Train)
    }

    pub fn val_annot_dir(&self) -> PathBuf {
        self.annotation_dir(AnnotationSplit::Val)
    }

    pub fn segmentations_dir(&self) -> PathBuf {
        self.dir.join("segmentations")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.dir.join("models")
    }

    pub fn messages_dir(&self) -> PathBuf {
        self.dir.join("messages")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.dir.join("logs")
    }

    pub fn results_dir(&self) -> PathBuf {
        self.dir.join("results")
    }

    /// Create the project directory and all of its subdirectories
    pub fn create_dirs(&self) -> io::Result<()> {
        for dir in [
            self.train_annot_dir(),
            self.val_annot_dir(),
            self.segmentations_dir(),
            self.models_dir(),
            self.messages_dir(),
            self.logs_dir(),
            self.results_dir(),
        ] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Where the worker writes the segmentation of `file_name`
    pub fn segmentation_path(&self, file_name: &str) -> PathBuf {
        self.segmentations_dir()
            .join(format!("{}.png", files::file_stem(file_name)))
    }

    /// Where the client stores the annotation of `file_name`
    pub fn annotation_path(&self, split: AnnotationSplit, file_name: &str) -> PathBuf {
        self.annotation_dir(split)
            .join(format!("{}.png", files::file_stem(file_name)))
    }

    /// The split holding an annotation for `file_name`, if any
    pub fn annotation_split(&self, file_name: &str) -> Option<AnnotationSplit> {
        [AnnotationSplit::Train, AnnotationSplit::Val]
            .into_iter()
            .find(|split| self.annotation_path(*split, file_name).is_file())
    }

    pub fn is_annotated(&self, file_name: &str) -> bool {
        self.annotation_split(file_name).is_some()
    }

    pub fn has_segmentation(&self, file_name: &str) -> bool {
        self.segmentation_path(file_name).is_file()
    }

    /// Model checkpoints, oldest first. Checkpoint names start with a
    /// zero-padded epoch number, so name order is training order.
    pub fn model_files(&self) -> Vec<PathBuf> {
        let models_dir = self.models_dir();
        files::ls_matching(&models_dir, files::is_model_file)
            .unwrap_or_default()
            .into_iter()
            .map(|name| models_dir.join(name))
            .collect()
    }

    /// Newest checkpoint, if training has produced one
    pub fn latest_model(&self) -> Option<PathBuf> {
        self.model_files().pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let layout = ProjectLayout::new("/sync/projects/roots_a");
        assert_eq!(layout.name(), "roots_a");
        assert_eq!(
            layout.proj_file(),
            PathBuf::from("/sync/projects/roots_a/roots_a.seg_proj")
        );
        assert_eq!(
            layout.train_annot_dir(),
            PathBuf::from("/sync/projects/roots_a/annotations/train")
        );
        assert_eq!(
            layout.segmentation_path("img_01.jpg"),
            PathBuf::from("/sync/projects/roots_a/segmentations/img_01.png")
        );
        assert_eq!(
            ProjectLayout::from_proj_file(&layout.proj_file()),
            Some(layout.clone())
        );
    }

    #[test]
    fn test_create_dirs_and_annotation_lookup() {
        let temp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path().join("p"));
        layout.create_dirs().unwrap();

        for dir in [layout.val_annot_dir(), layout.logs_dir(), layout.results_dir()] {
            assert!(dir.is_dir());
        }

        assert!(!layout.is_annotated("a.jpg"));
        fs::write(layout.annotation_path(AnnotationSplit::Val, "a.jpg"), b"").unwrap();
        assert_eq!(layout.annotation_split("a.jpg"), Some(AnnotationSplit::Val));
        assert!(layout.is_annotated("a.jpg"));
    }

    #[test]
    fn test_latest_model() {
        let temp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path().join("p"));
        assert_eq!(layout.latest_model(), None);

        layout.create_dirs().unwrap();
        for name in ["000002_20.pkl", "000010_30.pkl", "000001_10.pkl", "notes.txt"] {
            fs::write(layout.models_dir().join(name), b"").unwrap();
        }
        assert_eq!(layout.model_files().len(), 3);
        assert_eq!(layout.latest_model(), Some(layout.models_dir().join("000010_30.pkl")));
    }
}
