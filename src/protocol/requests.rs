/// Typed requests built on top of `send_instruction`

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::instruction::{send_instruction, SEGMENT, START_TRAINING, STOP_TRAINING};
use crate::error::ProtocolError;
use crate::files;
use crate::state::ProjectLayout;
use crate::sync::SyncDir;
use crate::watch::{spawn_watch, WatchConfig, WatchHandle};

/// Encoding the worker should use for segmentation output
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SegmentationFormat {
    /// Native per-pixel label encoding
    #[default]
    Default,
    /// Single-channel images readable by RhizoVision Explorer
    RhizoVision,
}

impl SegmentationFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentationFormat::Default => "default",
            SegmentationFormat::RhizoVision => "rhizovision",
        }
    }
}

/// Segment a set of images with one or more models
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SegmentRequest {
    pub model_paths: Vec<PathBuf>,
    pub dataset_dir: PathBuf,
    pub seg_dir: PathBuf,
    pub file_names: Vec<String>,
    pub format: SegmentationFormat,
}

impl SegmentRequest {
    /// Segment every image in `input_dir`, in name order
    pub fn from_input_dir(
        model_paths: Vec<PathBuf>,
        input_dir: &Path,
        seg_dir: PathBuf,
        format: SegmentationFormat,
    ) -> io::Result<Self> {
        let file_names = files::ls_images(input_dir)?;
        Ok(Self {
            model_paths,
            dataset_dir: input_dir.to_path_buf(),
            seg_dir,
            file_names,
            format,
        })
    }

    /// Segment project images into the project's own `segmentations/`
    /// using its newest checkpoint. Returns `None` while the project has
    /// no trained model yet.
    pub fn for_project(
        layout: &ProjectLayout,
        dataset_dir: &Path,
        file_names: Vec<String>,
    ) -> Option<Self> {
        let model = layout.latest_model()?;
        Some(Self {
            model_paths: vec![model],
            dataset_dir: dataset_dir.to_path_buf(),
            seg_dir: layout.segmentations_dir(),
            file_names,
            format: SegmentationFormat::Default,
        })
    }

    pub fn send(&self, sync: &SyncDir) -> Result<PathBuf, ProtocolError> {
        send_instruction(SEGMENT, self, &sync.instructions_dir(), sync.root())
    }

    /// Poller config tracking this request's output
    pub fn watch_config(&self, interval: Duration) -> WatchConfig {
        WatchConfig::segmentation(self.seg_dir.clone(), self.file_names.len()).with_interval(interval)
    }

    /// Send the request and start watching `seg_dir` for its results.
    /// `seg_dir` is created first so a queued request reports zero
    /// progress rather than failed listings. Must be called from within a
    /// tokio runtime.
    pub fn submit(&self, sync: &SyncDir, interval: Duration) -> Result<WatchHandle, ProtocolError> {
        fs::create_dir_all(&self.seg_dir).map_err(|source| ProtocolError::OutputDir {
            path: self.seg_dir.clone(),
            source,
        })?;
        self.send(sync)?;
        Ok(spawn_watch(self.watch_config(interval)))
    }
}

/// Start (or restart) training for a project
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrainingRequest {
    pub model_dir: PathBuf,
    pub dataset_dir: PathBuf,
    pub train_annot_dir: PathBuf,
    pub val_annot_dir: PathBuf,
    pub seg_dir: PathBuf,
    pub log_dir: PathBuf,
    pub message_dir: PathBuf,
}

impl TrainingRequest {
    pub fn new(layout: &ProjectLayout, dataset_dir: &Path) -> Self {
        Self {
            model_dir: layout.models_dir(),
            dataset_dir: dataset_dir.to_path_buf(),
            train_annot_dir: layout.train_annot_dir(),
            val_annot_dir: layout.val_annot_dir(),
            seg_dir: layout.segmentations_dir(),
            log_dir: layout.logs_dir(),
            message_dir: layout.messages_dir(),
        }
    }

    pub fn send(&self, sync: &SyncDir) -> Result<PathBuf, ProtocolError> {
        send_instruction(START_TRAINING, self, &sync.instructions_dir(), sync.root())
    }

    /// Poller config that completes once `epochs` more checkpoints exist
    pub fn watch_epochs(&self, epochs: usize, interval: Duration) -> WatchConfig {
        let existing = files::ls_matching(&self.model_dir, files::is_model_file)
            .map(|m| m.len())
            .unwrap_or(0);
        // Nothing to wait for when no epochs were asked for
        let total = if epochs == 0 { 0 } else { existing + epochs };
        WatchConfig::models(self.model_dir.clone(), total).with_interval(interval)
    }
}

/// Stop training for a project
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StopTrainingRequest {
    pub dataset_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl StopTrainingRequest {
    pub fn new(layout: &ProjectLayout, dataset_dir: &Path) -> Self {
        Self {
            dataset_dir: dataset_dir.to_path_buf(),
            log_dir: layout.logs_dir(),
        }
    }

    pub fn send(&self, sync: &SyncDir) -> Result<PathBuf, ProtocolError> {
        send_instruction(STOP_TRAINING, self, &sync.instructions_dir(), sync.root())
    }
}
