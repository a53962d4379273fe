//! File system helpers for build stages

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::{glob, Pattern};

/// Deletes a directory tree; a missing directory counts as success
pub fn clean_dir(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
    }
}

/// Writes a file, creating parent directories
pub fn write_file(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Reads a UTF-8 text file
pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Copies a file, creating parent directories
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::copy(from, to)
        .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
    Ok(())
}

/// Lists files under `dir` matching `pattern`, sorted
///
/// Only `pattern` is glob syntax; `dir` is matched literally.
pub fn find_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full_pattern = Path::new(&Pattern::escape(&dir.to_string_lossy())).join(pattern);
    let pattern_str = full_pattern.to_string_lossy();

    let paths = glob(&pattern_str)
        .with_context(|| format!("Invalid glob pattern '{}'", pattern))?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.with_context(|| format!("Failed to read entries for '{}'", pattern))?;
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Copies every file under `from` into `to`, keeping relative paths
pub fn copy_tree(from: &Path, to: &Path) -> Result<Vec<PathBuf>> {
    let mut copied = Vec::new();
    for file in find_files(from, "**/*")? {
        let rel = file.strip_prefix(from).unwrap_or(&file);
        let dest = to.join(rel);
        copy_file(&file, &dest)?;
        copied.push(dest);
    }
    Ok(copied)
}

/// Path of the minified sibling: `a/b.js` becomes `a/b.min.js`
pub fn minified_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}.min.{}", stem, ext.to_string_lossy()),
        None => format!("{}.min", stem),
    };
    path.with_file_name(name)
}

/// True for `*.min.js` style names
pub fn is_minified(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.ends_with(".min"))
        .unwrap_or(false)
}
