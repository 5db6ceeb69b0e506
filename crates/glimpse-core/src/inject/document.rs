//! Plain HTML documents that need no bundle.
//!
//! An inline preview has no origin to resolve relative URLs against, so the
//! page's local stylesheets and scripts are inlined from the file set.
//! Remote and missing references are left untouched.

use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::LazyLock;

use super::styles::style_tag;
use crate::files::{FileSet, normalize_path};

static LINK_TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?is)<link\b([^>]*)>").ok());

static SCRIPT_TAG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b([^>]*)>\s*</script>").ok());

static ATTRIBUTE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?i)\b([a-z-]+)\s*=\s*["']([^"']*)["']"#).ok());

/// What [`inline_local_assets`] replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlinedAssets {
    pub stylesheets: Vec<String>,
    pub scripts: Vec<String>,
}

fn attribute(attrs: &str, name: &str) -> Option<String> {
    ATTRIBUTE.as_ref()?.captures_iter(attrs).find_map(|caps| {
        caps[1]
            .eq_ignore_ascii_case(name)
            .then(|| caps[2].to_string())
    })
}

fn is_remote(reference: &str) -> bool {
    reference.contains("://") || reference.starts_with("//") || reference.starts_with("data:")
}

/// Resolve `reference` against the directory of `document`.
fn resolve(document: &str, reference: &str) -> String {
    let reference = reference.split(['?', '#']).next().unwrap_or_default();
    if reference.starts_with('/') {
        return normalize_path(reference);
    }
    let dir = document.rsplit_once('/').map(|(dir, _)| dir).unwrap_or_default();
    normalize_path(&format!("{dir}/{reference}"))
}

fn script_text(source: &str) -> String {
    source.replace("</script", "<\\/script").replace("</SCRIPT", "<\\/SCRIPT")
}

/// Replace local `<link rel="stylesheet">` and `<script src>` tags in the
/// document at `document` with the contents of the files they point at.
pub fn inline_local_assets(html: &str, document: &str, files: &FileSet) -> (String, InlinedAssets) {
    let mut inlined = InlinedAssets::default();
    let mut out = html.to_string();

    if let Some(re) = LINK_TAG.as_ref() {
        out = re
            .replace_all(&out, |caps: &Captures<'_>| {
                let original = caps[0].to_string();
                let is_stylesheet = attribute(&caps[1], "rel")
                    .is_some_and(|rel| rel.eq_ignore_ascii_case("stylesheet"));
                let Some(href) = attribute(&caps[1], "href").filter(|h| is_stylesheet && !is_remote(h)) else {
                    return original;
                };
                let path = resolve(document, &href);
                match files.content(&path) {
                    Some(css) => {
                        inlined.stylesheets.push(path);
                        style_tag("page", css)
                    }
                    None => original,
                }
            })
            .into_owned();
    }

    if let Some(re) = SCRIPT_TAG.as_ref() {
        out = re
            .replace_all(&out, |caps: &Captures<'_>| {
                let original = caps[0].to_string();
                let Some(src) = attribute(&caps[1], "src").filter(|s| !is_remote(s)) else {
                    return original;
                };
                let path = resolve(document, &src);
                let Some(source) = files.content(&path) else {
                    return original;
                };
                inlined.scripts.push(path);
                let module = attribute(&caps[1], "type").is_some_and(|t| t.eq_ignore_ascii_case("module"));
                let kind = if module { " type=\"module\"" } else { "" };
                format!("<script{kind}>{}</script>", script_text(source))
            })
            .into_owned();
    }

    (out, inlined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_stylesheet_and_script_inlined() {
        let files = FileSet::from_map([
            ("/site/style.css", "h1 { color: teal; }"),
            ("/site/js/app.js", "console.log('</script>')"),
        ]);
        let html = r#"<head><link rel="stylesheet" href="style.css"></head>
<body><script src="./js/app.js"></script></body>"#;

        let (out, inlined) = inline_local_assets(html, "/site/index.html", &files);
        assert!(out.contains("h1 { color: teal; }"));
        assert!(!out.contains("href=\"style.css\""));
        assert!(out.contains(r"console.log('<\/script>')"));
        assert_eq!(inlined.stylesheets, vec!["/site/style.css"]);
        assert_eq!(inlined.scripts, vec!["/site/js/app.js"]);
    }

    #[test]
    fn test_remote_and_missing_references_kept() {
        let files = FileSet::new();
        let html = r#"<link rel="stylesheet" href="https://cdn.example/x.css"><link rel="icon" href="/favicon.ico"><script src="/missing.js"></script>"#;

        let (out, inlined) = inline_local_assets(html, "/index.html", &files);
        assert_eq!(out, html);
        assert_eq!(inlined, InlinedAssets::default());
    }
}
