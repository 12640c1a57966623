//! Recursive file enumeration with an extension allow-list.
//!
//! Both the input tree and the template tree go through [`enumerate`]. The
//! walk does not follow symlinks, and entries that cannot be read are logged
//! and skipped: a single unreadable subdirectory should not sink a batch of
//! thousands of textures. Only a missing or non-directory root is an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum EnumerateError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Order in which enumerated files are returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileOrder {
    /// Directory traversal order, as the filesystem reports it.
    Walk,
    /// Lexicographic by full path.
    Name,
    /// Oldest first by creation time (modification time where the platform
    /// has no birth time), ties broken by path.
    #[default]
    Created,
}

/// Does `path` carry one of the (lowercase, dotless) `extensions`?
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed)))
}

fn created_at(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.created().or_else(|_| m.modified()))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// List files under `root` whose extension is in `extensions`.
///
/// `exclude` prunes one directory from the walk; the batch passes the output
/// directory here so a nested output tree is never read back as input.
pub fn enumerate(
    root: &Path,
    extensions: &[String],
    order: FileOrder,
    exclude: Option<&Path>,
) -> Result<Vec<PathBuf>, EnumerateError> {
    if !root.is_dir() {
        return Err(EnumerateError::NotADirectory(root.to_path_buf()));
    }

    let walker = WalkDir::new(root).follow_links(false).into_iter();
    let mut files: Vec<PathBuf> = walker
        // The root is never pruned, only directories below it.
        .filter_entry(|entry| {
            entry.depth() == 0 || exclude.is_none_or(|ex| entry.path() != ex)
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_extension(path, extensions))
        .collect();

    match order {
        FileOrder::Walk => {}
        FileOrder::Name => files.sort(),
        FileOrder::Created => {
            let mut keyed: Vec<(SystemTime, PathBuf)> =
                files.into_iter().map(|p| (created_at(&p), p)).collect();
            keyed.sort();
            files = keyed.into_iter().map(|(_, p)| p).collect();
        }
    }

    tracing::debug!("enumerated {} files under {}", files.len(), root.display());
    Ok(files)
}
