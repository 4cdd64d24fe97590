/// Instruction files: the client-to-worker half of the mailbox
///
/// Each request becomes one JSON file in `instructions/`:
///
/// ```json
/// { "name": "segment", "content": { ... }, "sync_relative": ["seg_dir"] }
/// ```
///
/// Paths under the sync root are stored relative to it, so a worker that
/// mounts the sync directory somewhere else can still resolve them. The
/// `sync_relative` list names the top-level content keys that were rewritten.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ProtocolError;
use crate::files;

/// Known instruction kinds
pub const SEGMENT: &str = "segment";
pub const START_TRAINING: &str = "start_training";
pub const STOP_TRAINING: &str = "stop_training";

const INSTRUCTION_EXTENSION: &str = "json";

/// Per-process sequence number appended to every file name
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A decoded work request
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub name: String,
    pub content: Map<String, Value>,
}

impl Instruction {
    /// Deserialize one content field
    pub fn field<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.content
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// On-disk record
#[derive(Serialize, Deserialize)]
struct InstructionFile {
    name: String,
    content: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sync_relative: Vec<String>,
}

/// Write an instruction for the worker to pick up.
///
/// Creates `instruction_dir` if needed and returns the path of the new file.
/// Nothing waits for the worker; the request persists until it is consumed.
pub fn send_instruction<T: Serialize + ?Sized>(
    name: &str,
    content: &T,
    instruction_dir: &Path,
    sync_dir: &Path,
) -> Result<PathBuf, ProtocolError> {
    validate_name(name)?;

    let mut content = match serde_json::to_value(content).map_err(ProtocolError::Serialize)? {
        Value::Object(map) => map,
        other => return Err(ProtocolError::ContentNotMapping(value_kind(&other))),
    };

    let mut sync_relative = Vec::new();
    for (key, value) in content.iter_mut() {
        if relativize(value, sync_dir) {
            sync_relative.push(key.clone());
        }
    }

    let record = InstructionFile {
        name: name.to_string(),
        content,
        sync_relative,
    };
    let bytes = serde_json::to_vec_pretty(&record).map_err(ProtocolError::Serialize)?;

    fs::create_dir_all(instruction_dir).map_err(|source| ProtocolError::InstructionDir {
        path: instruction_dir.to_path_buf(),
        source,
    })?;

    let path = unique_path(name, instruction_dir);
    files::atomic_write(&path, &bytes).map_err(|source| ProtocolError::Write {
        path: path.clone(),
        source,
    })?;

    tracing::info!(instruction = name, path = %path.display(), "instruction written");
    Ok(path)
}

/// Decode an instruction file, resolving relative paths against `sync_dir`
pub fn read_instruction(path: &Path, sync_dir: &Path) -> Result<Instruction, ProtocolError> {
    let bytes = fs::read(path).map_err(|source| ProtocolError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let record: InstructionFile =
        serde_json::from_slice(&bytes).map_err(|source| ProtocolError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    let mut content = record.content;
    for key in &record.sync_relative {
        if let Some(value) = content.get_mut(key) {
            absolutize(value, sync_dir);
        }
    }

    Ok(Instruction {
        name: record.name,
        content,
    })
}

/// Pending instruction files, oldest first.
///
/// Files are ordered by the timestamp and sequence number embedded in their
/// names; anything that does not follow the naming scheme sorts last.
pub fn list_pending(instruction_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut names = files::ls_matching(instruction_dir, |n| {
        files::has_extension(n, INSTRUCTION_EXTENSION)
    })?;
    names.sort_by_key(|n| (stamp_of(n).unwrap_or((u64::MAX, u64::MAX)), n.clone()));
    Ok(names.into_iter().map(|n| instruction_dir.join(n)).collect())
}

fn validate_name(name: &str) -> Result<(), ProtocolError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ProtocolError::InvalidName(name.to_string()))
    }
}

/// `<name>_<unix-millis>_<pid>_<seq>.json`, unique per process and host
fn unique_path(name: &str, instruction_dir: &Path) -> PathBuf {
    let millis = chrono::Utc::now().timestamp_millis();
    let pid = std::process::id();
    loop {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let path = instruction_dir.join(format!(
            "{name}_{millis}_{pid}_{seq:06}.{INSTRUCTION_EXTENSION}"
        ));
        // Another process with a recycled pid could have used this name
        if !path.exists() {
            return path;
        }
    }
}

/// (millis, seq) parsed back out of a file name
fn stamp_of(file_name: &str) -> Option<(u64, u64)> {
    let stem = files::file_stem(file_name);
    let mut parts = stem.rsplitn(4, '_');
    let seq = parts.next()?.parse().ok()?;
    let _pid: u32 = parts.next()?.parse().ok()?;
    let millis = parts.next()?.parse().ok()?;
    parts.next()?;
    Some((millis, seq))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

/// Rewrite `path` relative to `sync_dir` when that round-trips exactly
fn relative_form(path: &str, sync_dir: &Path) -> Option<String> {
    let original = Path::new(path);
    if !original.is_absolute() {
        return None;
    }
    let rel = original.strip_prefix(sync_dir).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    let rel = rel.to_string_lossy().to_string();
    (sync_dir.join(&rel).to_string_lossy() == path).then_some(rel)
}

/// Rewrite a string, or an array made only of strings, in place.
/// Returns whether anything changed.
fn relativize(value: &mut Value, sync_dir: &Path) -> bool {
    if !sync_dir.is_absolute() {
        return false;
    }
    match value {
        Value::String(s) => match relative_form(s, sync_dir) {
            Some(rel) => {
                *s = rel;
                true
            }
            None => false,
        },
        Value::Array(items) if !items.is_empty() => {
            let rewritten: Option<Vec<String>> = items
                .iter()
                .map(|item| item.as_str().and_then(|s| relative_form(s, sync_dir)))
                .collect();
            match rewritten {
                Some(rewritten) => {
                    *items = rewritten.into_iter().map(Value::String).collect();
                    true
                }
                None => false,
            }
        }
        _ => false,
    }
}

fn absolutize(value: &mut Value, sync_dir: &Path) {
    match value {
        Value::String(s) => *s = sync_dir.join(&*s).to_string_lossy().to_string(),
        Value::Array(items) => {
            for item in items.iter_mut() {
                if let Value::String(s) = item {
                    *s = sync_dir.join(&*s).to_string_lossy().to_string();
                }
            }
        }
        _ => {}
    }
}
