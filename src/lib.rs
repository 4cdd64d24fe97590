//! Client core for interactive root segmentation
//!
//! The client and the training/inference worker never talk directly. They
//! share a sync directory: the client drops instruction files into
//! `instructions/`, the worker writes models, segmentations and messages
//! into project directories, and the client polls those directories to
//! follow progress.
//!
//! - `sync`: the sync root and its top-level layout
//! - `protocol`: writing and reading instruction files
//! - `watch`: background pollers reporting worker progress
//! - `state`: project descriptors, layout, navigation and helpers
//! - `config`, `logging`, `error`: settings, log setup, error types

pub mod config;
pub mod error;
pub mod files;
pub mod logging;
pub mod protocol;
pub mod state;
pub mod sync;
pub mod watch;

pub use config::Settings;
pub use error::{
    ConfigError, ExtendError, ProjectCreateError, ProjectLoadError, ProjectSaveError,
    ProtocolError, TransientIoError,
};
pub use protocol::{send_instruction, Instruction, SegmentRequest, SegmentationFormat};
pub use state::{ProjectDescriptor, ProjectLayout};
pub use sync::SyncDir;
pub use watch::{spawn_watch, WatchConfig, WatchEvent, WatchHandle};
