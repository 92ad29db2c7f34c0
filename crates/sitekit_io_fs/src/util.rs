use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::report::ReportCopyBuilder;
use crate::spec::{
    CopyTreeError, EnumCopyDirectoryConflictStrategy, EnumCopyFileConflictStrategy,
    EnumCopyPatternMode,
};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypeCopyPatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

impl TypeCopyPatternSeq {
    /// `None` for an empty pattern list.
    pub(crate) fn compile(
        l_patterns: &[String],
        enum_rule_pattern: EnumCopyPatternMode,
    ) -> Result<Option<Self>, CopyTreeError> {
        if l_patterns.is_empty() {
            return Ok(None);
        }
        let to_invalid = |c_pattern: &str, message: String| CopyTreeError::InvalidPattern {
            pattern: c_pattern.to_string(),
            message,
        };

        let pattern_seq = match enum_rule_pattern {
            EnumCopyPatternMode::Literal => Self::Literal(l_patterns.to_vec()),
            EnumCopyPatternMode::Glob => Self::Glob(
                l_patterns
                    .iter()
                    .map(|p| {
                        Glob::new(p)
                            .map(|g| g.compile_matcher())
                            .map_err(|e| to_invalid(p, e.to_string()))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            EnumCopyPatternMode::Regex => Self::Regex(
                l_patterns
                    .iter()
                    .map(|p| Regex::new(p).map_err(|e| to_invalid(p, e.to_string())))
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(Some(pattern_seq))
    }

    pub(crate) fn is_match(&self, c_name: &str) -> bool {
        match self {
            Self::Literal(v) => v.iter().any(|p| c_name.contains(p.as_str())),
            Self::Glob(v) => v.iter().any(|m| m.is_match(c_name)),
            Self::Regex(v) => v.iter().any(|r| r.is_match(c_name)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SpecCopyPatterns {
    pub(crate) include_files: Option<TypeCopyPatternSeq>,
    pub(crate) exclude_files: Option<TypeCopyPatternSeq>,
    pub(crate) exclude_dirs: Option<TypeCopyPatternSeq>,
}

impl SpecCopyPatterns {
    pub(crate) fn from_raw(
        patterns_include_files: &[String],
        patterns_exclude_files: &[String],
        patterns_exclude_dirs: &[String],
        enum_rule_pattern: EnumCopyPatternMode,
    ) -> Result<Self, CopyTreeError> {
        Ok(Self {
            include_files: TypeCopyPatternSeq::compile(patterns_include_files, enum_rule_pattern)?,
            exclude_files: TypeCopyPatternSeq::compile(patterns_exclude_files, enum_rule_pattern)?,
            exclude_dirs: TypeCopyPatternSeq::compile(patterns_exclude_dirs, enum_rule_pattern)?,
        })
    }

    pub(crate) fn should_include_file(&self, c_name: &str) -> bool {
        let b_included = self
            .include_files
            .as_ref()
            .is_none_or(|m| m.is_match(c_name));
        let b_excluded = self
            .exclude_files
            .as_ref()
            .is_some_and(|m| m.is_match(c_name));
        b_included && !b_excluded
    }

    pub(crate) fn should_include_dir(&self, c_name: &str) -> bool {
        !self
            .exclude_dirs
            .as_ref()
            .is_some_and(|m| m.is_match(c_name))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathSafety

fn absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| absolutize_path(path))
}

/// Whether either directory contains the other once resolved.
pub(crate) fn is_overlap(path_dir_src: &Path, path_dir_dst: &Path) -> bool {
    let path_dir_src = normalize_path(path_dir_src);
    let path_dir_dst = normalize_path(path_dir_dst);
    path_dir_dst.starts_with(&path_dir_src) || path_dir_src.starts_with(&path_dir_dst)
}

/// Reject destination paths that would leave `path_dir_root` through a
/// symlinked component, or that are themselves an existing symlink.
pub(crate) fn validate_destination_path_safety(
    path_dst: &Path,
    path_dir_root: &Path,
) -> Result<(), String> {
    let path_dir_root_abs = absolutize_path(path_dir_root);
    let path_dst_abs = absolutize_path(path_dst);

    let path_rel = path_dst_abs.strip_prefix(&path_dir_root_abs).map_err(|_| {
        format!(
            "unsafe destination escapes root: {} (root={})",
            path_dst.display(),
            path_dir_root.display()
        )
    })?;

    let mut path_cursor = path_dir_root_abs.clone();
    for part in path_rel.components() {
        path_cursor.push(part.as_os_str());
        match fs::symlink_metadata(&path_cursor) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(format!(
                    "unsafe destination traverses symlink: {}",
                    path_cursor.display()
                ));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(format!("failed to inspect {} ({e})", path_cursor.display()));
            }
        }
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Conflicts

/// Returns `true` when the directory must not be entered.
pub(crate) fn should_skip_dir_conflict(
    path_dir_dst: &Path,
    enum_rule_conflict_dir: EnumCopyDirectoryConflictStrategy,
    builder_cp_report: &mut ReportCopyBuilder,
) -> bool {
    if !path_dir_dst.exists() {
        return false;
    }
    if !path_dir_dst.is_dir() {
        builder_cp_report.add_error(
            path_dir_dst.to_path_buf(),
            format!(
                "destination is a file, expected directory: {}",
                path_dir_dst.display()
            ),
        );
        return true;
    }
    match enum_rule_conflict_dir {
        EnumCopyDirectoryConflictStrategy::Merge => false,
        EnumCopyDirectoryConflictStrategy::Skip => {
            builder_cp_report.add_skipped();
            true
        }
        EnumCopyDirectoryConflictStrategy::Error => {
            builder_cp_report.add_error(
                path_dir_dst.to_path_buf(),
                format!("destination exists: {}", path_dir_dst.display()),
            );
            true
        }
    }
}

/// Returns `true` when the file must not be written.
pub(crate) fn should_skip_file_conflict(
    path_file_dst: &Path,
    enum_rule_conflict_file: EnumCopyFileConflictStrategy,
    builder_cp_report: &mut ReportCopyBuilder,
) -> bool {
    if !path_file_dst.exists() {
        return false;
    }
    if path_file_dst.is_dir() {
        builder_cp_report.add_error(
            path_file_dst.to_path_buf(),
            format!("destination is a directory: {}", path_file_dst.display()),
        );
        return true;
    }
    match enum_rule_conflict_file {
        EnumCopyFileConflictStrategy::Overwrite => false,
        EnumCopyFileConflictStrategy::Skip => {
            builder_cp_report.add_skipped();
            true
        }
        EnumCopyFileConflictStrategy::Error => {
            builder_cp_report.add_error(
                path_file_dst.to_path_buf(),
                format!("destination exists: {}", path_file_dst.display()),
            );
            true
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileOps

pub(crate) fn create_symbolic_link(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    let path_target = fs::read_link(path_src)?;
    make_symlink(&path_target, path_src, path_dst)
}

#[cfg(unix)]
fn make_symlink(path_target: &Path, _path_src: &Path, path_dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(path_target, path_dst)
}

#[cfg(windows)]
fn make_symlink(path_target: &Path, path_src: &Path, path_dst: &Path) -> io::Result<()> {
    use std::os::windows::fs::{symlink_dir, symlink_file};
    if path_src.is_dir() {
        symlink_dir(path_target, path_dst)
    } else {
        symlink_file(path_target, path_dst)
    }
}

#[cfg(not(any(unix, windows)))]
fn make_symlink(_path_target: &Path, _path_src: &Path, _path_dst: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are unsupported on this platform",
    ))
}

/// Copy one file's bytes, then carry over permissions, access/modification
/// times and (on Linux) extended attributes.
///
/// Missing parent directories of `path_file_dst` are created first.
pub fn copy_file_with_metadata(path_file_src: &Path, path_file_dst: &Path) -> io::Result<()> {
    if let Some(path_dir_parent) = path_file_dst.parent()
        && !path_dir_parent.as_os_str().is_empty()
    {
        fs::create_dir_all(path_dir_parent)?;
    }
    fs::copy(path_file_src, path_file_dst)?;

    let meta_file_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, meta_file_src.permissions())?;
    filetime::set_file_times(
        path_file_dst,
        filetime::FileTime::from_last_access_time(&meta_file_src),
        filetime::FileTime::from_last_modification_time(&meta_file_src),
    )?;

    #[cfg(target_os = "linux")]
    {
        copy_xattrs_linux(path_file_src, path_file_dst);
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let Ok(l_names) = xattr::list(path_file_src) else {
        return;
    };
    for name in l_names {
        if let Ok(Some(value)) = xattr::get(path_file_src, &name) {
            let _ = xattr::set(path_file_dst, &name, &value);
        }
    }
}

pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);
    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
