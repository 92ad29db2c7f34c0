//! Copy options, strategies and top-level error types.

use std::path::PathBuf;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region Strategies

/// How symbolic links found in the source tree are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumCopySymlinkStrategy {
    /// Follow the link and copy the target bytes/entries.
    #[default]
    Dereference,
    /// Recreate the link at the destination.
    CopySymlinks,
    /// Ignore symlink entries.
    SkipSymlinks,
}

/// What to do when the destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumCopyFileConflictStrategy {
    /// Keep the destination file.
    Skip,
    /// Replace the destination file.
    #[default]
    Overwrite,
    /// Record an error and leave the destination untouched.
    Error,
}

/// What to do when the destination directory already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumCopyDirectoryConflictStrategy {
    /// Do not descend into the existing directory.
    Skip,
    /// Reuse the directory and copy children into it.
    #[default]
    Merge,
    /// Record an error for the directory.
    Error,
}

/// Interpretation of include/exclude patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumCopyPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    #[default]
    Glob,
    /// Regular expression.
    Regex,
    /// Substring match.
    Literal,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region OptionsAndErrors

/// Input options for [`crate::copy_tree`].
#[derive(Debug, Clone)]
pub struct SpecCopyOptions {
    /// When set, only files whose basename matches one of these are copied.
    pub patterns_include_files: Vec<String>,
    /// Files whose basename matches one of these are not copied.
    pub patterns_exclude_files: Vec<String>,
    /// Directories whose basename matches one of these are not entered.
    pub patterns_exclude_dirs: Vec<String>,
    pub rule_pattern: EnumCopyPatternMode,
    pub rule_conflict_file: EnumCopyFileConflictStrategy,
    pub rule_conflict_dir: EnumCopyDirectoryConflictStrategy,
    pub rule_symlink: EnumCopySymlinkStrategy,
    /// Upper bound for the file-copy thread pool. `None` picks `min(cpus, 8)`.
    pub num_workers_max: Option<usize>,
    /// Walk and plan, but do not touch the destination.
    pub if_dry_run: bool,
}

impl Default for SpecCopyOptions {
    fn default() -> Self {
        Self {
            patterns_include_files: Vec::new(),
            patterns_exclude_files: Vec::new(),
            patterns_exclude_dirs: Vec::new(),
            rule_pattern: EnumCopyPatternMode::default(),
            rule_conflict_file: EnumCopyFileConflictStrategy::default(),
            rule_conflict_dir: EnumCopyDirectoryConflictStrategy::default(),
            rule_symlink: EnumCopySymlinkStrategy::default(),
            num_workers_max: None,
            if_dry_run: false,
        }
    }
}

/// One copy failure item with path + error text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SpecCopyError {
    pub path: PathBuf,
    pub exception: String,
}

/// Setup and validation failures that abort a copy run before any entry is
/// processed.
#[derive(Debug, Error)]
pub enum CopyTreeError {
    #[error("invalid include/exclude pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),

    #[error(
        "source and destination directories overlap: {} <-> {}",
        .path_dir_src.display(),
        .path_dir_dst.display()
    )]
    SourceDestinationOverlap {
        path_dir_src: PathBuf,
        path_dir_dst: PathBuf,
    },

    #[error("failed to initialize destination {}: {source}", .path.display())]
    DestinationInitFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
