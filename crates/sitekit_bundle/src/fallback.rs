//! Placeholder landing page for bundles whose templates were not rendered.

use crate::spec::SpecBundleFallback;

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Build the fallback `index.html` document.
pub fn render_fallback_index(spec: &SpecBundleFallback) -> String {
    let title = escape_html(&spec.title);
    let tagline = escape_html(&spec.tagline);
    let stylesheet = escape_html(&spec.stylesheet);
    let script = escape_html(&spec.script);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="{stylesheet}">
</head>
<body>
    <h1>{title}</h1>
    <p>{tagline}</p>
    <script src="{script}"></script>
</body>
</html>
"#
    )
}
