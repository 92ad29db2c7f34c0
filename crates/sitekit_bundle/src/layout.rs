//! Output tree paths and their preparation.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::conf::{C_COLLECTED_DIR, C_DEPLOY_CONFIG_FILE, C_PUBLIC_DIR, C_STATIC_DIR};
use crate::spec::{BundleError, SpecBundleConfig};

/// Resolved paths of one bundle build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLayout {
    pub path_dir_root: PathBuf,
    pub path_dir_dist: PathBuf,
    pub path_dir_public: PathBuf,
    pub path_dir_static: PathBuf,
}

impl BundleLayout {
    pub fn new(root: &Path, spec_config: &SpecBundleConfig) -> Self {
        let path_dir_dist = root.join(&spec_config.dist_dir);
        let path_dir_public = path_dir_dist.join(C_PUBLIC_DIR);
        let path_dir_static = path_dir_public.join(C_STATIC_DIR);
        Self {
            path_dir_root: root.to_path_buf(),
            path_dir_dist,
            path_dir_public,
            path_dir_static,
        }
    }

    pub fn collected_dir(&self) -> PathBuf {
        self.path_dir_public.join(C_COLLECTED_DIR)
    }

    pub fn deploy_config_path(&self) -> PathBuf {
        self.path_dir_dist.join(C_DEPLOY_CONFIG_FILE)
    }

    /// Remove a previous output tree, then create `dist/public/static`.
    ///
    /// Nothing is touched in dry-run mode.
    pub fn prepare(&self, if_dry_run: bool) -> Result<(), BundleError> {
        if if_dry_run {
            debug!(dist = %self.path_dir_dist.display(), "dry run: output tree left as is");
            return Ok(());
        }

        match fs::symlink_metadata(&self.path_dir_dist) {
            Ok(meta) if meta.is_dir() => {
                debug!(dist = %self.path_dir_dist.display(), "removing previous output");
                fs::remove_dir_all(&self.path_dir_dist).map_err(|source| {
                    BundleError::Layout {
                        path: self.path_dir_dist.clone(),
                        source,
                    }
                })?;
            }
            Ok(_) => {
                fs::remove_file(&self.path_dir_dist).map_err(|source| BundleError::Layout {
                    path: self.path_dir_dist.clone(),
                    source,
                })?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(BundleError::Layout {
                    path: self.path_dir_dist.clone(),
                    source,
                });
            }
        }

        for path_dir in [
            &self.path_dir_dist,
            &self.path_dir_public,
            &self.path_dir_static,
        ] {
            fs::create_dir_all(path_dir).map_err(|source| BundleError::Layout {
                path: path_dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_replaces_previous_output() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let layout = BundleLayout::new(tmp.path(), &SpecBundleConfig::default());
        fs::create_dir_all(layout.path_dir_public.join("old")).expect("mkdir");
        fs::write(layout.path_dir_public.join("old/stale.html"), "stale").expect("write");

        layout.prepare(false).expect("prepare");

        assert!(layout.path_dir_static.is_dir());
        assert!(!layout.path_dir_public.join("old").exists());
        assert_eq!(layout.path_dir_static, tmp.path().join("dist/public/static"));
        assert_eq!(layout.deploy_config_path(), tmp.path().join("dist/vercel.json"));
    }

    #[test]
    fn prepare_dry_run_creates_nothing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let layout = BundleLayout::new(tmp.path(), &SpecBundleConfig::default());
        layout.prepare(true).expect("prepare");
        assert!(!layout.path_dir_dist.exists());
    }

    #[cfg(unix)]
    #[test]
    fn prepare_unlinks_symlinked_dist_without_following_it() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let elsewhere = tmp.path().join("elsewhere");
        fs::create_dir_all(&elsewhere).expect("mkdir");
        fs::write(elsewhere.join("keep.txt"), "keep").expect("write");
        std::os::unix::fs::symlink(&elsewhere, tmp.path().join("dist")).expect("symlink");

        let layout = BundleLayout::new(tmp.path(), &SpecBundleConfig::default());
        layout.prepare(false).expect("prepare");

        assert!(elsewhere.join("keep.txt").exists());
        assert!(!layout.path_dir_dist.is_symlink());
        assert!(layout.path_dir_static.is_dir());
    }
}
