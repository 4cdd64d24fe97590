/// Default output directory for segmenting with selected models
///
/// A model at `/sync/projects/roots_a/models/000004_1685012907.pkl` suggests
/// `/sync/projects/roots_a/results/segmentations_model_4`. Several models
/// contribute several ids: `segmentations_model_4_5`. Models outside the
/// `projects/<project>/models/` structure get no suggestion, and the user
/// picks the directory themselves.

use std::path::{Path, PathBuf};

use crate::files;
use crate::sync::PROJECTS_DIR;

const MODELS_DIR: &str = "models";
const RESULTS_DIR: &str = "results";

/// A model file that sits in a project's `models/` directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectModelPath {
    pub project_dir: PathBuf,
    pub model_id: String,
}

impl ProjectModelPath {
    /// Match `<...>/projects/<project>/models/<file>`.
    ///
    /// The rule is purely structural: the parent must be named `models`
    /// and the project directory must sit directly in one named `projects`.
    pub fn parse(model_path: &Path) -> Option<Self> {
        let file_name = model_path.file_name()?.to_string_lossy().to_string();

        let models_dir = model_path.parent()?;
        if models_dir.file_name()? != MODELS_DIR {
            return None;
        }

        let project_dir = models_dir.parent()?;
        project_dir.file_name()?;

        let projects_dir = project_dir.parent()?;
        if projects_dir.file_name()? != PROJECTS_DIR {
            return None;
        }

        Some(Self {
            project_dir: project_dir.to_path_buf(),
            model_id: model_id(&file_name),
        })
    }
}

/// Short id for a model file.
///
/// Checkpoints named `<number>_<timestamp>.<ext>` are identified by the
/// number without leading zeros. Anything else was named by the user and
/// is kept as is, minus the extension.
pub fn model_id(file_name: &str) -> String {
    let stem = files::file_stem(file_name);
    if let Some((number, timestamp)) = stem.split_once('_') {
        if is_digits(number) && is_digits(timestamp) {
            let trimmed = number.trim_start_matches('0');
            return if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() };
        }
    }
    stem
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Suggested segmentation output directory for the selected models.
///
/// Every model must live in the `models/` directory of the same project;
/// otherwise, or when nothing is selected, there is no suggestion.
pub fn suggest_segmentation_dir<P: AsRef<Path>>(model_paths: &[P]) -> Option<PathBuf> {
    let mut parsed = Vec::with_capacity(model_paths.len());
    for path in model_paths {
        parsed.push(ProjectModelPath::parse(path.as_ref())?);
    }

    let project_dir = &parsed.first()?.project_dir;
    if parsed.iter().any(|m| &m.project_dir != project_dir) {
        return None;
    }

    let ids: Vec<&str> = parsed.iter().map(|m| m.model_id.as_str()).collect();
    Some(
        project_dir
            .join(RESULTS_DIR)
            .join(format!("segmentations_model_{}", ids.join("_"))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_model() {
        let suggested =
            suggest_segmentation_dir(&["/root/projects/project_a/models/000004_1685012907.pkl"]);
        assert_eq!(
            suggested,
            Some(PathBuf::from("/root/projects/project_a/results/segmentations_model_4"))
        );
    }

    #[test]
    fn test_multiple_models_in_selection_order() {
        let suggested = suggest_segmentation_dir(&[
            "/root/projects/project_a/models/000005_1685012907.pkl",
            "/root/projects/project_a/models/000004_1685012907.pkl",
            "/root/projects/project_a/models/000005_1685019999.pkl",
        ]);
        assert_eq!(
            suggested,
            Some(PathBuf::from("/root/projects/project_a/results/segmentations_model_5_4_5"))
        );
    }

    #[test]
    fn test_user_named_models_kept_verbatim() {
        let suggested = suggest_segmentation_dir(&[
            "/root/projects/project_a/models/000004_1685012907.pkl",
            "/root/projects/project_a/models/best_run.pkl",
        ]);
        assert_eq!(
            suggested,
            Some(PathBuf::from("/root/projects/project_a/results/segmentations_model_4_best_run"))
        );
    }

    #[test]
    fn test_no_suggestion_outside_structure() {
        assert_eq!(suggest_segmentation_dir(&["/tmp/000004_1685012907.pkl"]), None);
        assert_eq!(
            suggest_segmentation_dir(&["/root/elsewhere/project_a/models/000004_1.pkl"]),
            None
        );
        assert_eq!(
            suggest_segmentation_dir(&["/root/projects/project_a/checkpoints/000004_1.pkl"]),
            None
        );
        assert_eq!(suggest_segmentation_dir::<&str>(&[]), None);
    }

    #[test]
    fn test_models_from_different_projects() {
        assert_eq!(
            suggest_segmentation_dir(&[
                "/root/projects/project_a/models/000004_1.pkl",
                "/root/projects/project_b/models/000004_1.pkl",
            ]),
            None
        );
        assert_eq!(
            suggest_segmentation_dir(&[
                "/root/projects/project_a/models/000004_1.pkl",
                "/tmp/000004_1.pkl",
            ]),
            None
        );
    }

    #[test]
    fn test_model_id() {
        assert_eq!(model_id("000004_1685012907.pkl"), "4");
        assert_eq!(model_id("000000_1685012907.pkl"), "0");
        assert_eq!(model_id("000120_1685012907.pkl"), "120");
        assert_eq!(model_id("my_model.pkl"), "my_model");
        assert_eq!(model_id("000004_final.pkl"), "000004_final");
        assert_eq!(model_id("run2.pkl"), "run2");
    }

    #[test]
    fn test_parse_rule() {
        let parsed = ProjectModelPath::parse(Path::new("/s/projects/p/models/7_1.pkl")).unwrap();
        assert_eq!(parsed.project_dir, PathBuf::from("/s/projects/p"));
        assert_eq!(parsed.model_id, "7");
        assert!(ProjectModelPath::parse(Path::new("projects/models/7_1.pkl")).is_none());
    }
}
