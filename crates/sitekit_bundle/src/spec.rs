//! Bundle configuration models and top-level error types.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sitekit_io_fs::CopyTreeError;

use crate::conf::{
    C_BACKEND_ENTRYPOINT, C_BACKEND_RUNTIME, C_COLLECTED_DIR, C_DIST_DIR, C_FALLBACK_SCRIPT,
    C_FALLBACK_STYLESHEET, C_PROJECT_CONFIG_FILE, C_PUBLIC_DIR, C_PUBLIC_PLACEHOLDER,
    C_RENDER_PROGRAM, C_SITE_TAGLINE, C_SITE_TITLE, C_STATIC_DIR, TUP_ASSET_EXCLUDES,
    TUP_BACKEND_SOURCES, TUP_EXPECTED_PAGES, TUP_RENDER_ARGS, to_strings,
};

////////////////////////////////////////////////////////////////////////////////
// #region Config

/// Project-level bundle configuration, usually read from `sitekit.toml`.
///
/// Every field has a default, so an empty file (or no file) describes the
/// stock layout: `static/` and `staticfiles/` copied under `dist/public/`,
/// pages rendered by `python manage.py render_static`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecBundleConfig {
    /// Output directory relative to the project root.
    pub dist_dir: String,
    /// Pages that must exist under `<dist>/public` once the build finishes.
    pub expected_pages: Vec<String>,
    pub assets: SpecBundleAssets,
    pub render: SpecBundleRender,
    pub fallback: SpecBundleFallback,
    pub backend: SpecBundleBackend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecBundleAssets {
    /// Hand-written assets, copied to `<dist>/public/static`.
    pub static_dir: String,
    /// Framework-collected assets, copied to `<dist>/public/staticfiles`.
    pub collected_dir: String,
    /// Glob patterns (basenames) left out of both trees.
    #[serde(rename = "exclude")]
    pub patterns_exclude: Vec<String>,
    /// Copy worker cap; unset lets the copy engine decide.
    #[serde(rename = "workers")]
    pub num_workers_max: Option<usize>,
}

/// External command that renders templates into `<dist>/public`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecBundleRender {
    #[serde(rename = "enabled")]
    pub if_enabled: bool,
    pub program: String,
    /// `{public}` is replaced with `<dist>/public`.
    pub args: Vec<String>,
}

/// Content of the placeholder `index.html` written when rendering fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecBundleFallback {
    pub title: String,
    pub tagline: String,
    pub stylesheet: String,
    pub script: String,
}

/// Python backend shipped next to the static tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecBundleBackend {
    #[serde(rename = "enabled")]
    pub if_enabled: bool,
    /// Files or directories relative to the project root.
    pub sources: Vec<String>,
    /// Serverless function entry file, relative to the bundle root.
    pub entrypoint: String,
    /// Platform builder for the entry file.
    pub runtime: String,
}

impl Default for SpecBundleConfig {
    fn default() -> Self {
        Self {
            dist_dir: C_DIST_DIR.to_string(),
            expected_pages: to_strings(&TUP_EXPECTED_PAGES),
            assets: SpecBundleAssets::default(),
            render: SpecBundleRender::default(),
            fallback: SpecBundleFallback::default(),
            backend: SpecBundleBackend::default(),
        }
    }
}

impl Default for SpecBundleAssets {
    fn default() -> Self {
        Self {
            static_dir: C_STATIC_DIR.to_string(),
            collected_dir: C_COLLECTED_DIR.to_string(),
            patterns_exclude: to_strings(&TUP_ASSET_EXCLUDES),
            num_workers_max: None,
        }
    }
}

impl Default for SpecBundleRender {
    fn default() -> Self {
        Self {
            if_enabled: true,
            program: C_RENDER_PROGRAM.to_string(),
            args: to_strings(&TUP_RENDER_ARGS),
        }
    }
}

impl Default for SpecBundleFallback {
    fn default() -> Self {
        Self {
            title: C_SITE_TITLE.to_string(),
            tagline: C_SITE_TAGLINE.to_string(),
            stylesheet: C_FALLBACK_STYLESHEET.to_string(),
            script: C_FALLBACK_SCRIPT.to_string(),
        }
    }
}

impl Default for SpecBundleBackend {
    fn default() -> Self {
        Self {
            if_enabled: false,
            sources: to_strings(&TUP_BACKEND_SOURCES),
            entrypoint: C_BACKEND_ENTRYPOINT.to_string(),
            runtime: C_BACKEND_RUNTIME.to_string(),
        }
    }
}

impl SpecBundleConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(txt: &str) -> Result<Self, BundleError> {
        toml::from_str(txt).map_err(|e| BundleError::Config(e.to_string()))
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, BundleError> {
        let txt = fs::read_to_string(path).map_err(|e| {
            BundleError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&txt).map_err(|e| BundleError::Config(format!("{}: {e}", path.display())))
    }

    /// Load `sitekit.toml` from `root` when present, defaults otherwise.
    pub fn discover(root: &Path) -> Result<Self, BundleError> {
        let path_file_config = root.join(C_PROJECT_CONFIG_FILE);
        if path_file_config.is_file() {
            Self::load(&path_file_config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), BundleError> {
        check_relative("dist_dir", &self.dist_dir)?;
        check_relative("assets.static_dir", &self.assets.static_dir)?;
        check_relative("assets.collected_dir", &self.assets.collected_dir)?;
        if self.render.if_enabled && self.render.program.trim().is_empty() {
            return Err(BundleError::Config(
                "render.program must not be empty when rendering is enabled".to_string(),
            ));
        }
        if self.backend.if_enabled {
            for source in &self.backend.sources {
                check_relative("backend.sources", source)?;
            }
            check_relative("backend.entrypoint", &self.backend.entrypoint)?;
        }
        Ok(())
    }

    /// `<dist>/public`, as written in render arguments.
    pub fn public_dir_arg(&self) -> String {
        format!("{}/{C_PUBLIC_DIR}", self.dist_dir.trim_end_matches('/'))
    }

    /// Render arguments with `{public}` substituted.
    pub fn render_args(&self) -> Vec<String> {
        let c_public = self.public_dir_arg();
        self.render
            .args
            .iter()
            .map(|a| a.replace(C_PUBLIC_PLACEHOLDER, &c_public))
            .collect()
    }

    /// The render command line as a user would type it.
    pub fn render_command_line(&self) -> String {
        std::iter::once(self.render.program.clone())
            .chain(self.render_args())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn check_relative(field: &str, value: &str) -> Result<(), BundleError> {
    if value.trim().is_empty() {
        return Err(BundleError::Config(format!("{field} must not be empty")));
    }
    let path = Path::new(value);
    let b_escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    let b_names_entry = path.components().any(|c| matches!(c, Component::Normal(_)));
    if b_escapes || !b_names_entry {
        return Err(BundleError::Config(format!(
            "{field} must be a relative path inside the project: {value}"
        )));
    }
    Ok(())
}

/// Run-time switches that are not part of the project file.
#[derive(Debug, Clone, Default)]
pub struct SpecBuildOptions {
    /// Plan every step without touching the filesystem or running commands.
    pub if_dry_run: bool,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Failures that abort a bundle build.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to prepare {}: {source}", .path.display())]
    Layout {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("copy step `{step}` could not start: {source}")]
    Copy {
        step: &'static str,
        #[source]
        source: CopyTreeError,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize deployment config: {0}")]
    Serialize(#[from] serde_json::Error),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
