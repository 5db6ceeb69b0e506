//! Link classification and anchor rewriting.

use glimpse_config::RouterStrategy;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Where an `href` points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HrefKind {
    /// A path inside the app, handled by the router.
    Internal,
    /// Another origin (`https://…`, `//cdn…`).
    External,
    /// Same-page fragment, or empty.
    Anchor,
    /// `mailto:`, `tel:`, `javascript:` and other non-navigational schemes.
    Special,
}

static SCHEME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:").ok());

static HREF_ATTR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"\bhref\s*=\s*\{?\s*["'`]([^"'`]*)["'`]"#).ok());

static ANCHOR: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a(\s[^>]*?)?\shref=(["'])([^"']*)["']([^>]*)>(.*?)</a>"#).ok()
});

static LINK_IMPORT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"import\s*\{[^}]*\bLink\b[^}]*\}\s*from\s*["']react-router-dom["']"#).ok()
});

pub fn classify_href(href: &str) -> HrefKind {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return HrefKind::Anchor;
    }
    if href.starts_with("//") {
        return HrefKind::External;
    }
    let has_scheme = SCHEME.as_ref().is_some_and(|re| re.is_match(href));
    if has_scheme {
        let lower = href.to_ascii_lowercase();
        if lower.starts_with("http:") || lower.starts_with("https:") {
            return HrefKind::External;
        }
        return HrefKind::Special;
    }
    HrefKind::Internal
}

/// Count `href` attributes in a source text that point inside the app.
pub fn count_internal_links(source: &str) -> usize {
    let Some(re) = HREF_ATTR.as_ref() else {
        return 0;
    };
    re.captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .filter(|m| classify_href(m.as_str()) == HrefKind::Internal)
        .count()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorRewrite {
    pub code: String,
    pub rewritten: usize,
}

/// Rewrite internal `<a href>` tags for the chosen router.
///
/// Declarative routers get `<Link to>` elements (and a `Link` import when
/// one is missing); the hash router keeps `<a>` and prefixes the href with
/// `#`. External, anchor and special links are untouched.
pub fn rewrite_internal_anchors(source: &str, strategy: RouterStrategy) -> AnchorRewrite {
    let Some(re) = ANCHOR.as_ref() else {
        return AnchorRewrite {
            code: source.to_string(),
            rewritten: 0,
        };
    };

    let mut rewritten = 0;
    let code = re
        .replace_all(source, |caps: &Captures<'_>| {
            let href = &caps[3];
            if classify_href(href) != HrefKind::Internal {
                return caps[0].to_string();
            }
            rewritten += 1;
            let before = caps.get(1).map_or("", |m| m.as_str());
            let quote = &caps[2];
            let after = &caps[4];
            let body = &caps[5];
            match strategy {
                RouterStrategy::Declarative => {
                    format!("<Link{before} to={quote}{href}{quote}{after}>{body}</Link>")
                }
                RouterStrategy::Hash => {
                    format!("<a{before} href={quote}#{href}{quote}{after}>{body}</a>")
                }
            }
        })
        .into_owned();

    let needs_import = rewritten > 0
        && strategy == RouterStrategy::Declarative
        && !LINK_IMPORT.as_ref().is_some_and(|re| re.is_match(&code));
    let code = if needs_import {
        format!("import {{ Link }} from \"react-router-dom\";\n{code}")
    } else {
        code
    };

    AnchorRewrite { code, rewritten }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_href() {
        assert_eq!(classify_href("/about"), HrefKind::Internal);
        assert_eq!(classify_href("about/team"), HrefKind::Internal);
        assert_eq!(classify_href("https://example.com"), HrefKind::External);
        assert_eq!(classify_href("//cdn.example.com/x.js"), HrefKind::External);
        assert_eq!(classify_href("#pricing"), HrefKind::Anchor);
        assert_eq!(classify_href(""), HrefKind::Anchor);
        assert_eq!(classify_href("mailto:hi@example.com"), HrefKind::Special);
        assert_eq!(classify_href("tel:+123"), HrefKind::Special);
        assert_eq!(classify_href("javascript:void(0)"), HrefKind::Special);
    }

    #[test]
    fn test_count_internal_links() {
        let source = r##"<a href="/a">a</a><a href='#top'>t</a><a href={"/b"}>b</a><a href="http://x">x</a>"##;
        assert_eq!(count_internal_links(source), 2);
    }

    #[test]
    fn test_rewrite_declarative() {
        let source = r#"export default () => <nav><a className="x" href="/about">About</a> <a href="https://x.dev">X</a></nav>;"#;
        let out = rewrite_internal_anchors(source, RouterStrategy::Declarative);
        assert_eq!(out.rewritten, 1);
        assert!(out.code.starts_with("import { Link } from \"react-router-dom\";\n"));
        assert!(out.code.contains(r#"<Link className="x" to="/about">About</Link>"#));
        assert!(out.code.contains(r#"<a href="https://x.dev">X</a>"#));
    }

    #[test]
    fn test_rewrite_keeps_existing_import() {
        let source = "import { Link } from 'react-router-dom';\nconst a = <a href=\"/x\">x</a>;";
        let out = rewrite_internal_anchors(source, RouterStrategy::Declarative);
        assert_eq!(out.code.matches("import { Link }").count(), 1);
    }

    #[test]
    fn test_rewrite_hash() {
        let out = rewrite_internal_anchors(r#"<a href="/docs">Docs</a>"#, RouterStrategy::Hash);
        assert_eq!(out.code, r##"<a href="#/docs">Docs</a>"##);
    }

    #[test]
    fn test_nothing_to_rewrite() {
        let source = r#"<a href="mailto:x@y.z">mail</a>"#;
        let out = rewrite_internal_anchors(source, RouterStrategy::Declarative);
        assert_eq!(out.rewritten, 0);
        assert_eq!(out.code, source);
    }
}
