//! Tree traversal and copy orchestration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::report::{ReportCopy, ReportCopyBuilder};
use crate::spec::{CopyTreeError, EnumCopySymlinkStrategy, SpecCopyOptions};
use crate::util::{
    SpecCopyPatterns, calculate_worker_limit, copy_file_with_metadata, create_symbolic_link,
    is_overlap, should_skip_dir_conflict, should_skip_file_conflict,
    validate_destination_path_safety,
};

/// `(dev, ino)` of a directory.
type TypeDirIdentity = (u64, u64);

#[derive(Debug)]
struct SpecCopyTaskFile {
    path_file_src: PathBuf,
    path_file_dst: PathBuf,
}

#[derive(Debug)]
struct SpecCopyContext {
    path_dir_src: PathBuf,
    path_dir_dst: PathBuf,
    spec_cp_options: SpecCopyOptions,
    spec_cp_pats: SpecCopyPatterns,
    n_workers_max: usize,
    builder_cp_report: ReportCopyBuilder,
    /// Directories on the current descent path, root first.
    l_dirs_ancestor: Vec<TypeDirIdentity>,
    l_tasks_file_copy: Vec<SpecCopyTaskFile>,
}

/// Copy the directory tree under `dir_source` into `dir_destination`,
/// keeping relative paths.
///
/// The walk is depth-first and sorted by entry name. Directories are created
/// while walking; file copies are planned and then executed in one batch,
/// on a rayon pool when more than one worker is allowed.
///
/// Per-entry problems are recorded in the returned [`ReportCopy`]. An `Err`
/// is returned only when the run cannot start at all.
pub fn copy_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_cp_options: SpecCopyOptions,
) -> Result<ReportCopy, CopyTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = dir_source.as_ref().to_path_buf();
    let path_dir_dst = dir_destination.as_ref().to_path_buf();

    let spec_cp_pats = SpecCopyPatterns::from_raw(
        &spec_cp_options.patterns_include_files,
        &spec_cp_options.patterns_exclude_files,
        &spec_cp_options.patterns_exclude_dirs,
        spec_cp_options.rule_pattern,
    )?;

    if !path_dir_src.is_dir() {
        return Err(CopyTreeError::SourceNotDirectory(path_dir_src));
    }
    if is_overlap(&path_dir_src, &path_dir_dst) {
        return Err(CopyTreeError::SourceDestinationOverlap {
            path_dir_src,
            path_dir_dst,
        });
    }
    prepare_destination_root(&path_dir_dst, spec_cp_options.if_dry_run)?;

    let mut spec_cp_ctx = SpecCopyContext {
        path_dir_src: path_dir_src.clone(),
        path_dir_dst,
        n_workers_max: calculate_worker_limit(spec_cp_options.num_workers_max),
        spec_cp_options,
        spec_cp_pats,
        builder_cp_report: ReportCopyBuilder::default(),
        l_dirs_ancestor: Vec::new(),
        l_tasks_file_copy: Vec::new(),
    };

    walk_directory(&path_dir_src, &mut spec_cp_ctx);
    flush_file_copy_tasks(&mut spec_cp_ctx);
    Ok(spec_cp_ctx.builder_cp_report.build())
}

fn prepare_destination_root(path_dir_dst: &Path, if_dry_run: bool) -> Result<(), CopyTreeError> {
    let to_init_error = |source: io::Error| CopyTreeError::DestinationInitFailed {
        path: path_dir_dst.to_path_buf(),
        source,
    };

    if !if_dry_run {
        fs::create_dir_all(path_dir_dst).map_err(to_init_error)?;
    }
    match fs::symlink_metadata(path_dir_dst) {
        Ok(meta) if meta.file_type().is_symlink() => Err(to_init_error(io::Error::other(
            "destination root must not be a symbolic link",
        ))),
        Ok(meta) if !meta.is_dir() => Err(to_init_error(io::Error::other(
            "destination root exists and is not a directory",
        ))),
        Ok(_) => Ok(()),
        Err(e) if if_dry_run && e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(to_init_error(e)),
    }
}

fn derive_destination_path(path_src: &Path, spec_cp_ctx: &SpecCopyContext) -> PathBuf {
    match path_src.strip_prefix(&spec_cp_ctx.path_dir_src) {
        Ok(path_rel) => spec_cp_ctx.path_dir_dst.join(path_rel),
        Err(_) => spec_cp_ctx
            .path_dir_dst
            .join(path_src.file_name().unwrap_or(path_src.as_os_str())),
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region LoopDetection

#[cfg(unix)]
fn derive_dir_identity(path_dir: &Path) -> Option<TypeDirIdentity> {
    use std::os::unix::fs::MetadataExt;
    fs::metadata(path_dir)
        .ok()
        .map(|meta| (meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn derive_dir_identity(_path_dir: &Path) -> Option<TypeDirIdentity> {
    None
}

/// A dereferenced directory loops when it is one of its own ancestors on
/// the current descent path. A second link to an already copied sibling is
/// not a loop.
fn is_symlink_loop(path_dir_src: &Path, spec_cp_ctx: &SpecCopyContext) -> bool {
    if spec_cp_ctx.spec_cp_options.rule_symlink != EnumCopySymlinkStrategy::Dereference {
        return false;
    }
    derive_dir_identity(path_dir_src)
        .is_some_and(|tuple_dir_id| spec_cp_ctx.l_dirs_ancestor.contains(&tuple_dir_id))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Walk

fn walk_directory(path_dir_src: &Path, spec_cp_ctx: &mut SpecCopyContext) {
    let tuple_dir_id = match spec_cp_ctx.spec_cp_options.rule_symlink {
        EnumCopySymlinkStrategy::Dereference => derive_dir_identity(path_dir_src),
        _ => None,
    };
    if let Some(tuple_dir_id) = tuple_dir_id {
        spec_cp_ctx.l_dirs_ancestor.push(tuple_dir_id);
    }

    walk_directory_entries(path_dir_src, spec_cp_ctx);

    if tuple_dir_id.is_some() {
        spec_cp_ctx.l_dirs_ancestor.pop();
    }
}

fn walk_directory_entries(path_dir_src: &Path, spec_cp_ctx: &mut SpecCopyContext) {
    let iter_entries = match fs::read_dir(path_dir_src) {
        Ok(iter) => iter,
        Err(e) => {
            spec_cp_ctx.builder_cp_report.add_warning(format!(
                "failed to read directory {} ({e})",
                path_dir_src.display()
            ));
            return;
        }
    };

    let mut l_entries = Vec::new();
    for entry_res in iter_entries {
        match entry_res {
            Ok(entry) => l_entries.push(entry),
            Err(e) => spec_cp_ctx.builder_cp_report.add_warning(format!(
                "failed to read directory entry under {} ({e})",
                path_dir_src.display()
            )),
        }
    }
    l_entries.sort_by_key(|e| e.file_name());

    for entry in l_entries {
        let path_entry = entry.path();
        let c_name = entry.file_name().to_string_lossy().into_owned();
        let cfg_file_type = match entry.file_type() {
            Ok(v) => v,
            Err(e) => {
                spec_cp_ctx
                    .builder_cp_report
                    .add_warning(format!("failed to inspect {} ({e})", path_entry.display()));
                continue;
            }
        };

        if cfg_file_type.is_symlink() {
            handle_symlink_entry(path_entry, &c_name, spec_cp_ctx);
        } else if cfg_file_type.is_dir() {
            handle_dir_entry(path_entry, &c_name, spec_cp_ctx);
        } else if cfg_file_type.is_file() {
            handle_file_entry(path_entry, &c_name, spec_cp_ctx);
        } else {
            spec_cp_ctx
                .builder_cp_report
                .add_warning(format!("special file skipped: {}", path_entry.display()));
        }
    }
}

fn handle_symlink_entry(path_src: PathBuf, c_name: &str, spec_cp_ctx: &mut SpecCopyContext) {
    match spec_cp_ctx.spec_cp_options.rule_symlink {
        EnumCopySymlinkStrategy::SkipSymlinks => {
            spec_cp_ctx.builder_cp_report.add_scanned();
            spec_cp_ctx.builder_cp_report.add_skipped();
        }
        EnumCopySymlinkStrategy::CopySymlinks => {
            spec_cp_ctx.builder_cp_report.add_scanned();
            let b_included = if path_src.is_dir() {
                spec_cp_ctx.spec_cp_pats.should_include_dir(c_name)
            } else {
                spec_cp_ctx.spec_cp_pats.should_include_file(c_name)
            };
            if !b_included {
                return;
            }
            spec_cp_ctx.builder_cp_report.add_matched();

            let path_dst = derive_destination_path(&path_src, spec_cp_ctx);
            if let Err(message) =
                validate_destination_path_safety(&path_dst, &spec_cp_ctx.path_dir_dst)
            {
                spec_cp_ctx.builder_cp_report.add_error(path_dst, message);
                return;
            }
            if should_skip_file_conflict(
                &path_dst,
                spec_cp_ctx.spec_cp_options.rule_conflict_file,
                &mut spec_cp_ctx.builder_cp_report,
            ) {
                return;
            }
            if spec_cp_ctx.spec_cp_options.if_dry_run {
                spec_cp_ctx.builder_cp_report.add_skipped();
                return;
            }
            if path_dst.symlink_metadata().is_ok()
                && let Err(e) = fs::remove_file(&path_dst)
            {
                spec_cp_ctx
                    .builder_cp_report
                    .add_error(path_dst, e.to_string());
                return;
            }
            match create_symbolic_link(&path_src, &path_dst) {
                Ok(()) => spec_cp_ctx.builder_cp_report.add_copied(),
                Err(e) => spec_cp_ctx
                    .builder_cp_report
                    .add_error(path_dst, e.to_string()),
            }
        }
        EnumCopySymlinkStrategy::Dereference => match fs::metadata(&path_src) {
            Ok(meta) if meta.is_dir() => handle_dir_entry(path_src, c_name, spec_cp_ctx),
            Ok(meta) if meta.is_file() => handle_file_entry(path_src, c_name, spec_cp_ctx),
            Ok(_) => {
                spec_cp_ctx.builder_cp_report.add_scanned();
                spec_cp_ctx.builder_cp_report.add_warning(format!(
                    "special file target skipped: {}",
                    path_src.display()
                ));
                spec_cp_ctx.builder_cp_report.add_skipped();
            }
            Err(_) => {
                spec_cp_ctx.builder_cp_report.add_scanned();
                let message = format!("broken symlink: {}", path_src.display());
                spec_cp_ctx.builder_cp_report.add_error(path_src, message);
            }
        },
    }
}

fn handle_dir_entry(path_dir_src_sub: PathBuf, c_name: &str, spec_cp_ctx: &mut SpecCopyContext) {
    spec_cp_ctx.builder_cp_report.add_scanned();
    if !spec_cp_ctx.spec_cp_pats.should_include_dir(c_name) {
        return;
    }
    spec_cp_ctx.builder_cp_report.add_matched();

    if is_symlink_loop(&path_dir_src_sub, spec_cp_ctx) {
        spec_cp_ctx.builder_cp_report.add_warning(format!(
            "symlink loop detected: {}",
            path_dir_src_sub.display()
        ));
        spec_cp_ctx.builder_cp_report.add_skipped();
        return;
    }

    let path_dir_dst_sub = derive_destination_path(&path_dir_src_sub, spec_cp_ctx);
    if let Err(message) =
        validate_destination_path_safety(&path_dir_dst_sub, &spec_cp_ctx.path_dir_dst)
    {
        spec_cp_ctx
            .builder_cp_report
            .add_error(path_dir_dst_sub, message);
        return;
    }
    let b_existed = path_dir_dst_sub.is_dir();
    if should_skip_dir_conflict(
        &path_dir_dst_sub,
        spec_cp_ctx.spec_cp_options.rule_conflict_dir,
        &mut spec_cp_ctx.builder_cp_report,
    ) {
        return;
    }

    if spec_cp_ctx.spec_cp_options.if_dry_run {
        spec_cp_ctx.builder_cp_report.add_skipped();
    } else if !b_existed {
        if let Err(e) = fs::create_dir_all(&path_dir_dst_sub) {
            spec_cp_ctx
                .builder_cp_report
                .add_error(path_dir_dst_sub, e.to_string());
            return;
        }
        spec_cp_ctx.builder_cp_report.add_copied();
    }

    walk_directory(&path_dir_src_sub, spec_cp_ctx);
}

fn handle_file_entry(path_file_src: PathBuf, c_name: &str, spec_cp_ctx: &mut SpecCopyContext) {
    spec_cp_ctx.builder_cp_report.add_scanned();
    if !spec_cp_ctx.spec_cp_pats.should_include_file(c_name) {
        return;
    }
    spec_cp_ctx.builder_cp_report.add_matched();

    let path_file_dst = derive_destination_path(&path_file_src, spec_cp_ctx);
    if let Err(message) =
        validate_destination_path_safety(&path_file_dst, &spec_cp_ctx.path_dir_dst)
    {
        spec_cp_ctx.builder_cp_report.add_error(path_file_dst, message);
        return;
    }
    if should_skip_file_conflict(
        &path_file_dst,
        spec_cp_ctx.spec_cp_options.rule_conflict_file,
        &mut spec_cp_ctx.builder_cp_report,
    ) {
        return;
    }
    if spec_cp_ctx.spec_cp_options.if_dry_run {
        spec_cp_ctx.builder_cp_report.add_skipped();
        return;
    }
    spec_cp_ctx.l_tasks_file_copy.push(SpecCopyTaskFile {
        path_file_src,
        path_file_dst,
    });
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Flush

fn run_file_copy_task(
    spec_task: SpecCopyTaskFile,
    path_dir_dst_root: &Path,
) -> (PathBuf, Result<(), String>) {
    let res_copy = validate_destination_path_safety(&spec_task.path_file_dst, path_dir_dst_root)
        .and_then(|_| {
            copy_file_with_metadata(&spec_task.path_file_src, &spec_task.path_file_dst)
                .map_err(|e| e.to_string())
        });
    (spec_task.path_file_dst, res_copy)
}

fn flush_file_copy_tasks(spec_cp_ctx: &mut SpecCopyContext) {
    let l_tasks_file_copy = std::mem::take(&mut spec_cp_ctx.l_tasks_file_copy);
    if l_tasks_file_copy.is_empty() {
        return;
    }
    let path_dir_dst_root = spec_cp_ctx.path_dir_dst.clone();
    let n_workers_max = spec_cp_ctx.n_workers_max;

    let l_results = if n_workers_max <= 1 {
        l_tasks_file_copy
            .into_iter()
            .map(|t| run_file_copy_task(t, &path_dir_dst_root))
            .collect::<Vec<_>>()
    } else {
        match ThreadPoolBuilder::new().num_threads(n_workers_max).build() {
            Ok(thread_pool) => thread_pool.install(|| {
                l_tasks_file_copy
                    .into_par_iter()
                    .map(|t| run_file_copy_task(t, &path_dir_dst_root))
                    .collect::<Vec<_>>()
            }),
            Err(e) => {
                spec_cp_ctx.builder_cp_report.add_warning(format!(
                    "failed to start copy pool (workers={n_workers_max}): {e}; copying serially"
                ));
                l_tasks_file_copy
                    .into_iter()
                    .map(|t| run_file_copy_task(t, &path_dir_dst_root))
                    .collect::<Vec<_>>()
            }
        }
    };

    for (path_file_dst, res_copy) in l_results {
        match res_copy {
            Ok(()) => spec_cp_ctx.builder_cp_report.add_copied(),
            Err(message) => spec_cp_ctx
                .builder_cp_report
                .add_error(path_file_dst, message),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
