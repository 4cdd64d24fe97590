/// Directory and file helpers shared by every layer
///
/// Listings only ever look one level deep and skip hidden entries, since
/// both sides of the sync protocol use dot-prefixed names for files that
/// are still being written.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use walkdir::WalkDir;

/// Extensions treated as images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "jp2"];

/// Compressed numpy arrays, an alternative segmentation output
pub const NPZ_EXTENSION: &str = "npz";

/// Model checkpoints written by the worker
pub const MODEL_EXTENSION: &str = "pkl";

/// Lower-cased extension of a file name, if it has one
pub fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Check a file name against an extension, ignoring case
pub fn has_extension(name: &str, ext: &str) -> bool {
    extension(name).is_some_and(|e| e == ext.to_lowercase())
}

/// Check if a file name looks like an image
pub fn is_image(name: &str) -> bool {
    extension(name).is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

/// Check if a file name is a finished segmentation written by the worker
pub fn is_segmentation_output(name: &str) -> bool {
    is_image(name) || has_extension(name, NPZ_EXTENSION)
}

/// Check if a file name is a model checkpoint
pub fn is_model_file(name: &str) -> bool {
    has_extension(name, MODEL_EXTENSION)
}

/// File name without its final extension
pub fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string())
}

/// List the visible files directly inside `dir`, sorted by name.
///
/// Hidden files (leading `.`) and subdirectories are skipped. An error is
/// returned only when `dir` itself cannot be read; unreadable entries are
/// dropped.
pub fn ls(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in WalkDir::new(dir).min_depth(0).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            // The root itself failed: nothing to list
            Err(err) if err.depth() == 0 => return Err(io::Error::from(err)),
            Err(_) => continue,
        };

        if entry.depth() == 0 || !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }

    names.sort();
    Ok(names)
}

/// List the visible files in `dir` accepted by `keep`
pub fn ls_matching(dir: &Path, keep: impl Fn(&str) -> bool) -> io::Result<Vec<String>> {
    Ok(ls(dir)?.into_iter().filter(|name| keep(name)).collect())
}

/// List the images in `dir`
pub fn ls_images(dir: &Path) -> io::Result<Vec<String>> {
    ls_matching(dir, is_image)
}

/// List the visible subdirectories of `dir`, sorted by name
pub fn ls_dirs(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with('.') && entry.path().is_dir() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Write `bytes` to `path` so that readers never observe a partial file.
///
/// The data goes to a hidden sibling first and is then renamed over the
/// destination. Both live in the same directory, so the rename stays on one
/// filesystem.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    let result = File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&tmp, path));

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
