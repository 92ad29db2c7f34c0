//! Deployment configuration (`vercel.json`) model.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::conf::{
    C_COLLECTED_DIR, C_PUBLIC_DIR, C_STATIC_DIR, C_STATIC_RUNTIME, N_DEPLOY_CONFIG_VERSION,
};
use crate::spec::{BundleError, SpecBundleConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDeploymentConfig {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub builds: Vec<SpecDeployBuild>,
    #[serde(default)]
    pub routes: Vec<SpecDeployRoute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_directory: Option<String>,
}

/// One serverless build: a source file and the builder that handles it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecDeployBuild {
    pub src: String,
    #[serde(rename = "use")]
    pub builder: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecDeployRoute {
    pub src: String,
    pub dest: String,
}

impl SpecDeployRoute {
    fn new(src: &str, dest: &str) -> Self {
        Self {
            src: src.to_string(),
            dest: dest.to_string(),
        }
    }
}

/// Derive the deployment configuration for a bundle.
///
/// `vercel.json` sits in `<dist>`, so every path below is relative to it.
/// Asset routes always come first so that static files bypass the backend.
/// With a backend the public tree is published by its own static build and
/// everything else goes to the entrypoint; without one, the public tree is
/// served directly and extension-less paths map to `.html` pages.
pub fn derive_deployment_config(spec_config: &SpecBundleConfig) -> SpecDeploymentConfig {
    if spec_config.backend.if_enabled {
        let c_entrypoint = spec_config
            .backend
            .entrypoint
            .trim_start_matches("./")
            .trim_start_matches('/');
        let l_routes = vec![
            SpecDeployRoute::new(
                &format!("/{C_STATIC_DIR}/(.*)"),
                &format!("/{C_PUBLIC_DIR}/{C_STATIC_DIR}/$1"),
            ),
            SpecDeployRoute::new(
                &format!("/{C_COLLECTED_DIR}/(.*)"),
                &format!("/{C_PUBLIC_DIR}/{C_COLLECTED_DIR}/$1"),
            ),
            SpecDeployRoute::new("/(.*)", &format!("/{c_entrypoint}")),
        ];
        return SpecDeploymentConfig {
            version: N_DEPLOY_CONFIG_VERSION,
            builds: vec![
                SpecDeployBuild {
                    src: c_entrypoint.to_string(),
                    builder: spec_config.backend.runtime.clone(),
                },
                SpecDeployBuild {
                    src: format!("{C_PUBLIC_DIR}/**"),
                    builder: C_STATIC_RUNTIME.to_string(),
                },
            ],
            routes: l_routes,
            output_directory: None,
        };
    }

    let l_routes = vec![
        SpecDeployRoute::new(
            &format!("/{C_STATIC_DIR}/(.*)"),
            &format!("/{C_STATIC_DIR}/$1"),
        ),
        SpecDeployRoute::new(
            &format!("/{C_COLLECTED_DIR}/(.*)"),
            &format!("/{C_COLLECTED_DIR}/$1"),
        ),
        SpecDeployRoute::new("/", "/index.html"),
        SpecDeployRoute::new("/([^.]+)", "/$1.html"),
    ];
    SpecDeploymentConfig {
        version: N_DEPLOY_CONFIG_VERSION,
        builds: Vec::new(),
        routes: l_routes,
        output_directory: Some(format!(
            "{}/{C_PUBLIC_DIR}",
            spec_config.dist_dir.trim_end_matches('/')
        )),
    }
}

impl SpecDeploymentConfig {
    pub fn to_json_pretty(&self) -> Result<String, BundleError> {
        let mut txt = serde_json::to_string_pretty(self)?;
        txt.push('\n');
        Ok(txt)
    }

    pub fn from_json(txt: &str) -> Result<Self, BundleError> {
        Ok(serde_json::from_str(txt)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), BundleError> {
        let txt = self.to_json_pretty()?;
        fs::write(path, txt).map_err(|source| BundleError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_backend() -> SpecBundleConfig {
        let mut spec_config = SpecBundleConfig::default();
        spec_config.backend.if_enabled = true;
        spec_config
    }

    #[test]
    fn static_bundle_serves_public_tree() {
        let spec_deploy = derive_deployment_config(&SpecBundleConfig::default());
        assert!(spec_deploy.builds.is_empty());
        assert_eq!(spec_deploy.output_directory.as_deref(), Some("dist/public"));
        assert_eq!(
            spec_deploy.routes[0],
            SpecDeployRoute::new("/static/(.*)", "/static/$1")
        );
        assert_eq!(
            spec_deploy.routes.last(),
            Some(&SpecDeployRoute::new("/([^.]+)", "/$1.html"))
        );

        let txt = spec_deploy.to_json_pretty().expect("json");
        assert!(txt.contains(r#""outputDirectory": "dist/public""#));
        assert!(!txt.contains("builds"));
        assert!(txt.ends_with("}\n"));
    }

    #[test]
    fn backend_bundle_publishes_public_tree_and_routes_to_entrypoint() {
        let spec_deploy = derive_deployment_config(&with_backend());

        assert_eq!(spec_deploy.version, 2);
        assert_eq!(
            spec_deploy.builds,
            vec![
                SpecDeployBuild {
                    src: "api/index.py".to_string(),
                    builder: "@vercel/python".to_string(),
                },
                SpecDeployBuild {
                    src: "public/**".to_string(),
                    builder: "@vercel/static".to_string(),
                },
            ]
        );
        assert_eq!(
            spec_deploy.routes,
            vec![
                SpecDeployRoute::new("/static/(.*)", "/public/static/$1"),
                SpecDeployRoute::new("/staticfiles/(.*)", "/public/staticfiles/$1"),
                SpecDeployRoute::new("/(.*)", "/api/index.py"),
            ]
        );
        assert!(spec_deploy.output_directory.is_none());

        let value: serde_json::Value =
            serde_json::from_str(&spec_deploy.to_json_pretty().expect("json")).expect("parse");
        assert_eq!(value["builds"][0]["use"], "@vercel/python");
        assert_eq!(value["builds"][1]["use"], "@vercel/static");
    }

    #[test]
    fn entrypoint_prefixes_are_normalized() {
        let mut spec_config = with_backend();
        spec_config.backend.entrypoint = "./api/index.py".to_string();
        let spec_deploy = derive_deployment_config(&spec_config);
        assert_eq!(spec_deploy.builds[0].src, "api/index.py");
        assert_eq!(
            spec_deploy.routes.last().map(|r| r.dest.as_str()),
            Some("/api/index.py")
        );
    }

    #[test]
    fn json_output_reads_back_to_the_same_config() {
        for spec_deploy in [
            derive_deployment_config(&SpecBundleConfig::default()),
            derive_deployment_config(&with_backend()),
        ] {
            let txt = spec_deploy.to_json_pretty().expect("json");
            assert_eq!(
                SpecDeploymentConfig::from_json(&txt).expect("parse"),
                spec_deploy
            );
        }
    }

    #[test]
    fn write_to_creates_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("vercel.json");
        let spec_deploy = derive_deployment_config(&SpecBundleConfig::default());
        spec_deploy.write_to(&path).expect("write");

        let txt = fs::read_to_string(&path).expect("read");
        assert_eq!(
            SpecDeploymentConfig::from_json(&txt).expect("parse"),
            spec_deploy
        );
    }
}
