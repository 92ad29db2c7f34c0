//! Bundle constants and default presets.

/// Output directory, relative to the project root.
pub const C_DIST_DIR: &str = "dist";
/// Publicly served subtree of the output directory.
pub const C_PUBLIC_DIR: &str = "public";
/// Asset subtree under `public/`.
pub const C_STATIC_DIR: &str = "static";
/// Framework-collected assets (e.g. Django `collectstatic`).
pub const C_COLLECTED_DIR: &str = "staticfiles";
/// Serverless backend sources.
pub const C_BACKEND_DIR: &str = "api";
/// Deployment configuration file written into the output directory.
pub const C_DEPLOY_CONFIG_FILE: &str = "vercel.json";
/// Project configuration file looked up in the project root.
pub const C_PROJECT_CONFIG_FILE: &str = "sitekit.toml";

pub const N_DEPLOY_CONFIG_VERSION: u32 = 2;

pub const TUP_EXPECTED_PAGES: [&str; 7] = [
    "index.html",
    "about.html",
    "programs.html",
    "news.html",
    "student_life.html",
    "gallery.html",
    "contact.html",
];

/// Placeholder in render arguments replaced by `<dist>/public`.
pub const C_PUBLIC_PLACEHOLDER: &str = "{public}";
pub const C_RENDER_PROGRAM: &str = "python";
pub const TUP_RENDER_ARGS: [&str; 4] = ["manage.py", "render_static", "--output", "{public}"];

pub const C_SITE_TITLE: &str = "Akonsec School Website";
pub const C_SITE_TAGLINE: &str = "Powered by Django & Vercel";
pub const C_FALLBACK_STYLESHEET: &str = "/static/css/style.css";
pub const C_FALLBACK_SCRIPT: &str = "/static/js/programs.js";

pub const C_BACKEND_ENTRYPOINT: &str = "api/index.py";
pub const C_BACKEND_RUNTIME: &str = "@vercel/python";
/// Platform builder that uploads the public tree as-is.
pub const C_STATIC_RUNTIME: &str = "@vercel/static";
/// Everything the entrypoint imports at cold start: the function itself,
/// the Django project and app packages, `manage.py` and the pinned
/// requirements.
pub const TUP_BACKEND_SOURCES: [&str; 5] = [
    "api",
    "manage.py",
    "requirements.txt",
    "school",
    "school_website",
];

/// Files never worth shipping from asset trees.
pub const TUP_ASSET_EXCLUDES: [&str; 3] = [".DS_Store", "Thumbs.db", "*.pyc"];

pub(crate) fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
