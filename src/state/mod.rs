//! Project state management module
//!
//! This module handles everything a project owns on disk, including:
//! - The `.seg_proj` descriptor (project.rs)
//! - The project directory layout (layout.rs)
//! - Creating and opening projects (workspace.rs)
//! - Image navigation order (navigation.rs)
//! - Extending a project with new dataset images (extend.rs)
//! - Messages left by the worker (messages.rs)
//! - Suggested segmentation output directories (suggest.rs)

pub mod extend;
pub mod layout;
pub mod messages;
pub mod navigation;
pub mod project;
pub mod suggest;
pub mod workspace;

pub use extend::{extend_project, find_new_dataset_files};
pub use layout::{AnnotationSplit, ProjectLayout};
pub use messages::take_messages;
pub use navigation::Navigation;
pub use project::{ProjectDescriptor, PROJECT_EXTENSION, RANDOM_WEIGHTS};
pub use suggest::{model_id, suggest_segmentation_dir, ProjectModelPath};
pub use workspace::{create_project, is_valid_project_name, open_project, NewProject, OpenProject};
