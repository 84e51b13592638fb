//! Filename resolution for image sequences
//!
//! **Why**: A sequence is just an ordered list of paths. They come from one of
//! three sources:
//!
//! 1. Numbered: `prefix` + frame number (optionally zero padded) + `.ext`
//! 2. printf-style pattern: `shots/a.%04d.exr`
//! 3. Folder listing, optionally filtered by extension and capped
//!
//! **Used by**: `ImageSequence` (synchronous loads), `BackgroundLoader`
//! (threaded folder loads)
//!
//! # Ordering
//!
//! Folder listings are always sorted by path before use. `FsLister` globs in
//! alphabetical order, which also makes the `max_frames` cap deterministic:
//! the scan stops after the first N files in lexical order.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use log::{error, info};
use regex::{NoExpand, Regex};

use crate::entities::{FileLister, SequenceError};

/// Where the frame paths of a sequence come from
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// `prefix` + number + `.` + `ext`, for `start..=end`
    Numbered {
        prefix: String,
        ext: String,
        start: i64,
        end: i64,
        digits: usize,
    },
    /// printf-style pattern with one `%d` / `%0Nd` placeholder
    Pattern { pattern: String, start: i64, end: i64 },
    /// Every matching file in a folder
    Folder {
        folder: PathBuf,
        extension: Option<String>,
        max_frames: Option<usize>,
    },
}

impl Source {
    /// Resolve to the ordered list of frame paths.
    ///
    /// Errors are logged here, so callers only need to propagate them.
    pub fn resolve(&self, lister: &dyn FileLister) -> Result<Vec<PathBuf>, SequenceError> {
        let result = match self {
            Source::Numbered { prefix, ext, start, end, digits } => {
                numbered(prefix, ext, *start, *end, *digits)
            }
            Source::Pattern { pattern, start, end } => printf(pattern, *start, *end),
            Source::Folder { folder, extension, max_frames } => {
                folder_listing(lister, folder, extension.as_deref(), *max_frames)
            }
        };

        match &result {
            Ok(paths) => info!("Resolved {} frame paths from {}", paths.len(), self),
            Err(e) => error!("Failed to resolve {}: {}", self, e),
        }
        result
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Numbered { prefix, ext, start, end, .. } => {
                write!(f, "{}[{}-{}].{}", prefix, start, end, ext)
            }
            Source::Pattern { pattern, start, end } => write!(f, "{} [{}-{}]", pattern, start, end),
            Source::Folder { folder, .. } => write!(f, "{}", folder.display()),
        }
    }
}

/// Expand `prefix` + number + `.ext` for every number in `start..=end`.
///
/// `digits == 0` leaves numbers unpadded, otherwise they are zero padded to
/// `digits` (like `%0Nd`).
pub fn numbered(
    prefix: &str,
    ext: &str,
    start: i64,
    end: i64,
    digits: usize,
) -> Result<Vec<PathBuf>, SequenceError> {
    check_range(start, end)?;

    Ok((start..=end)
        .map(|i| PathBuf::from(format!("{}{}.{}", prefix, pad(i, digits), ext)))
        .collect())
}

/// Expand a printf-style pattern (`frame.%04d.png`, `frame.%d.png`) for
/// every number in `start..=end`.
pub fn printf(pattern: &str, start: i64, end: i64) -> Result<Vec<PathBuf>, SequenceError> {
    let re = Regex::new(r"%(0)?(\d+)?d").map_err(|e| SequenceError::Pattern {
        pattern: pattern.to_string(),
        reason: format!("Regex error: {}", e),
    })?;

    let caps = re.captures(pattern).ok_or_else(|| SequenceError::Pattern {
        pattern: pattern.to_string(),
        reason: "missing %d placeholder".to_string(),
    })?;
    if re.find_iter(pattern).count() > 1 {
        return Err(SequenceError::Pattern {
            pattern: pattern.to_string(),
            reason: "more than one %d placeholder".to_string(),
        });
    }

    let zero_pad = caps.get(1).is_some();
    let width = match caps.get(2) {
        Some(m) => m.as_str().parse::<usize>().map_err(|e| SequenceError::Pattern {
            pattern: pattern.to_string(),
            reason: format!("bad width '{}': {}", m.as_str(), e),
        })?,
        None => 0,
    };

    check_range(start, end)?;

    Ok((start..=end)
        .map(|i| {
            let number = if zero_pad {
                pad(i, width)
            } else {
                format!("{:>width$}", i, width = width)
            };
            PathBuf::from(re.replace(pattern, NoExpand(&number)).into_owned())
        })
        .collect())
}

/// List a folder through `lister`, sorted by path.
pub fn folder_listing(
    lister: &dyn FileLister,
    folder: &Path,
    extension: Option<&str>,
    max_frames: Option<usize>,
) -> Result<Vec<PathBuf>, SequenceError> {
    if !lister.exists(folder) {
        return Err(SequenceError::FolderNotFound(folder.to_path_buf()));
    }

    let mut files = lister.list(folder, extension, max_frames)?;
    if files.is_empty() {
        return Err(SequenceError::NoImagesFound(folder.to_path_buf()));
    }

    // Listers may not guarantee lexical order; playback order must be stable
    files.sort();
    if let Some(max) = max_frames {
        files.truncate(max);
    }

    Ok(files)
}

fn check_range(start: i64, end: i64) -> Result<(), SequenceError> {
    if end < start {
        return Err(SequenceError::EmptyRange { start, end });
    }
    Ok(())
}

/// Zero pad like `%0Nd` (sign first, then zeros)
fn pad(value: i64, digits: usize) -> String {
    if digits == 0 {
        value.to_string()
    } else {
        format!("{:0width$}", value, width = digits)
    }
}

/// Filesystem lister built on `glob`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl FileLister for FsLister {
    fn exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list(
        &self,
        folder: &Path,
        extension: Option<&str>,
        max_frames: Option<usize>,
    ) -> Result<Vec<PathBuf>, SequenceError> {
        let file_glob = match extension.map(|e| e.trim_start_matches('.')) {
            Some(ext) if !ext.is_empty() => format!("*.{}", Pattern::escape(ext)),
            _ => "*".to_string(),
        };
        let escaped = Pattern::escape(&folder.to_string_lossy());
        let pattern = Path::new(&escaped).join(file_glob);
        let pattern = pattern.to_string_lossy();

        let options = MatchOptions {
            case_sensitive: false,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };

        let paths = glob::glob_with(&pattern, options).map_err(|e| SequenceError::Pattern {
            pattern: pattern.to_string(),
            reason: format!("Glob error: {}", e),
        })?;

        // glob yields alphabetically, so take() stops the scan at the cap
        Ok(paths
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .take(max_frames.unwrap_or(usize::MAX))
            .collect())
    }
}
