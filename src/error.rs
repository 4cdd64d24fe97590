/// Error types for the sync core
///
/// Protocol and descriptor errors are returned to the caller so the
/// presentation layer can show them. Polling errors never leave a poller;
/// see `TransientIoError`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// An instruction could not be written to (or read back from) the mailbox.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid instruction name {0:?}")]
    InvalidName(String),

    #[error("instruction directory {path} could not be created: {source}")]
    InstructionDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("instruction content could not be serialized: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("instruction content must be a mapping, got {0}")]
    ContentNotMapping(&'static str),

    #[error("failed to write instruction {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read instruction {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output directory {path} could not be created: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode instruction {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A project descriptor could not be loaded.
#[derive(Debug, Error)]
pub enum ProjectLoadError {
    #[error("project file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read project file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("project file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("project file {path} lists {name:?} more than once")]
    DuplicateFileName { path: PathBuf, name: String },
}

/// A project descriptor could not be saved.
#[derive(Debug, Error)]
pub enum ProjectSaveError {
    #[error("project descriptor could not be serialized: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write project file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("refusing to save: {0:?} appears more than once in file_names")]
    DuplicateFileName(String),
}

/// A new project could not be created.
#[derive(Debug, Error)]
pub enum ProjectCreateError {
    #[error("invalid project name {0:?}")]
    InvalidName(String),

    #[error("invalid dataset name {0:?}")]
    InvalidDataset(String),

    #[error("a project named {0:?} already exists")]
    AlreadyExists(String),

    #[error("dataset directory {0} does not exist")]
    DatasetMissing(PathBuf),

    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Save(#[from] ProjectSaveError),
}

/// A directory listing failed while polling.
///
/// Pollers log these and retry on the next tick.
#[derive(Debug, Error)]
#[error("failed to list {path}: {source}")]
pub struct TransientIoError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Settings could not be read or written.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("settings file {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write settings {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A project could not be extended with new dataset images.
#[derive(Debug, Error)]
pub enum ExtendError {
    #[error(transparent)]
    Load(#[from] ProjectLoadError),

    #[error("failed to list dataset {path}: {source}")]
    ListDataset {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Save(#[from] ProjectSaveError),
}
