//! `sitekit_bundle`:
//! assembles a static deployment bundle (assets, rendered pages, optional
//! Python backend) plus its `vercel.json`.
//!
//! - `conf`     : constants and default presets
//! - `spec`     : configuration models, options and errors
//! - `layout`   : output tree paths
//! - `builder`  : the build pipeline
//! - `fallback` : placeholder landing page
//! - `deploy`   : deployment configuration model
//! - `report`   : build report model

pub mod builder;
pub mod conf;
pub mod deploy;
pub mod fallback;
pub mod layout;
pub mod report;
pub mod spec;

pub use builder::build_bundle;
pub use deploy::{
    SpecDeployBuild, SpecDeployRoute, SpecDeploymentConfig, derive_deployment_config,
};
pub use fallback::render_fallback_index;
pub use layout::BundleLayout;
pub use report::{EnumBundleStepStatus, ReportBundle, ReportBundleStep};
pub use spec::{
    BundleError, SpecBuildOptions, SpecBundleAssets, SpecBundleBackend, SpecBundleConfig,
    SpecBundleFallback, SpecBundleRender,
};
