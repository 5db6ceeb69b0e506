//! Bundle injection into the preview document.
//!
//! [`BundleInjector::inject`] takes compiled code and CSS and produces the
//! final HTML:
//!
//! 1. original entry-script and stylesheet tags are replaced with marker
//!    comments
//! 2. base stylesheet and compiled CSS go into `<head>`
//! 3. the CDN utility-CSS runtime is added when any [`CdnReason`] applies
//! 4. a custom theme on a non single-file-component framework gets its body
//!    background unmasked
//! 5. the base64 bundle loader goes to the placeholder comment, or before
//!    `</body>`
//! 6. the keyboard forwarder (and HMR listener, when enabled) are appended
//!
//! [`BundleInjector::inject_document`] handles plain HTML projects: there is
//! no bundle, so the page's own local assets are inlined instead.

mod document;
mod scripts;
mod styles;
mod template;

pub use document::{InlinedAssets, inline_local_assets};
pub use scripts::{bundle_loader, hmr_listener, keyboard_forwarder};
pub use styles::{BASE_CSS, THEME_OVERRIDE_CSS, escape_style_text};
pub use template::{
    CONTAINER_IDS, PRERENDER_WRAPPER_ID, PrerenderPlacement, Prerendered, default_template,
    insert_before_body_end, insert_into_head, merge_prerendered,
};

use glimpse_config::InjectConfig;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use crate::files::FileSet;
use crate::framework::Framework;

/// Why the utility-CSS runtime was injected. Reported in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CdnReason {
    CssFailed,
    CssMissing,
    CssTooShort,
    SingleFileComponent,
    CustomTheme,
}

impl CdnReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CdnReason::CssFailed => "css-failed",
            CdnReason::CssMissing => "css-missing",
            CdnReason::CssTooShort => "css-too-short",
            CdnReason::SingleFileComponent => "single-file-component",
            CdnReason::CustomTheme => "custom-theme",
        }
    }
}

impl fmt::Display for CdnReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every reason that applies. Empty CSS is `CssMissing` only.
pub fn cdn_reasons(
    css: &str,
    framework: Framework,
    custom_theme: bool,
    css_failed: bool,
    min_css_length: usize,
) -> Vec<CdnReason> {
    let mut reasons = Vec::new();
    if css_failed {
        reasons.push(CdnReason::CssFailed);
    }
    let css = css.trim();
    if css.is_empty() {
        reasons.push(CdnReason::CssMissing);
    } else if css.len() < min_css_length {
        reasons.push(CdnReason::CssTooShort);
    }
    if framework.is_single_file_component() {
        reasons.push(CdnReason::SingleFileComponent);
    }
    if custom_theme {
        reasons.push(CdnReason::CustomTheme);
    }
    reasons
}

/// Tags from the original template that would load sources directly.
static STRIP_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        (
            "module-entry-script",
            r#"(?is)<script\b[^>]*\btype\s*=\s*["']module["'][^>]*\bsrc\s*=\s*["'](?:\.{0,2}/)?[\w\-./@]+["'][^>]*>\s*</script>"#,
        ),
        (
            "entry-script",
            r#"(?is)<script\b[^>]*\bsrc\s*=\s*["'](?:\.{0,2}/)?(?:[\w\-.@]+/)*(?:main|index|app)\.(?:tsx|jsx|ts|js|mjs)["'][^>]*>\s*</script>"#,
        ),
        (
            "stylesheet-link",
            r#"(?is)<link\b[^>]*\brel\s*=\s*["']stylesheet["'][^>]*\bhref\s*=\s*["'](?:\.{0,2}/)?[\w\-./@]+\.css["'][^>]*>"#,
        ),
        (
            "stylesheet-link-href-first",
            r#"(?is)<link\b[^>]*\bhref\s*=\s*["'](?:\.{0,2}/)?[\w\-./@]+\.css["'][^>]*\brel\s*=\s*["']stylesheet["'][^>]*>"#,
        ),
    ]
    .into_iter()
    .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (name, re)))
    .collect()
});

static BODY_STYLE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<body\b[^>]*?)\s+style\s*=\s*(["'])([^"']*)["']([^>]*>)"#).ok()
});

/// Inputs for one injection.
#[derive(Debug, Clone, Default)]
pub struct InjectOptions<'a> {
    pub code: &'a str,
    pub css: &'a str,
    pub framework: Framework,
    pub custom_theme: bool,
    pub css_failed: bool,
    pub prerendered: Option<&'a Prerendered>,
}

/// One strip pattern's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StripResult {
    pub pattern: &'static str,
    pub removed: usize,
}

/// What an injection did, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectReport {
    pub cdn_reasons: Vec<CdnReason>,
    pub stripped: Vec<StripResult>,
    pub loader_at_placeholder: bool,
    pub theme_override: bool,
    pub prerendered: Option<PrerenderPlacement>,
    /// Set only for plain HTML documents.
    pub inlined: Option<InlinedAssets>,
}

impl InjectReport {
    pub fn cdn_injected(&self) -> bool {
        !self.cdn_reasons.is_empty()
    }

    /// Patterns that matched nothing in the template.
    pub fn unmatched_patterns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stripped
            .iter()
            .filter(|s| s.removed == 0)
            .map(|s| s.pattern)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectOutput {
    pub html: String,
    pub report: InjectReport,
}

#[derive(Debug, Clone)]
pub struct BundleInjector {
    config: InjectConfig,
    namespace: String,
    hmr: bool,
}

impl BundleInjector {
    pub fn new(config: InjectConfig) -> Self {
        Self {
            config,
            namespace: "glimpse".to_string(),
            hmr: false,
        }
    }

    /// Add the HMR listener for `namespace`. Also renames the keyboard and
    /// error message types.
    pub fn with_hmr(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self.hmr = true;
        self
    }

    pub fn config(&self) -> &InjectConfig {
        &self.config
    }

    pub fn inject(&self, template: &str, options: &InjectOptions<'_>) -> InjectOutput {
        let mut report = InjectReport::default();

        let mut html = match options.prerendered {
            Some(prerendered) => {
                let (merged, placement) = merge_prerendered(template, prerendered);
                report.prerendered = placement;
                merged
            }
            None => template.to_string(),
        };

        html = self.strip_original_tags(&html, &mut report);

        html = insert_into_head(&html, &styles::style_tag("base", BASE_CSS));
        if !options.css.trim().is_empty() {
            html = insert_into_head(&html, &styles::style_tag("bundle", options.css));
        }

        report.cdn_reasons = cdn_reasons(
            options.css,
            options.framework,
            options.custom_theme,
            options.css_failed,
            self.config.min_css_length,
        );
        for reason in &report.cdn_reasons {
            tracing::info!(%reason, "injecting CDN utility-CSS runtime");
        }
        if report.cdn_injected() {
            let tag = format!(
                "<script src=\"{}\" data-glimpse=\"cdn\"></script>",
                self.config.cdn_runtime_url
            );
            html = insert_into_head(&html, &tag);
        }

        if options.custom_theme && !options.framework.is_single_file_component() {
            html = strip_body_colors(&html);
            html = insert_into_head(&html, &styles::style_tag("theme", THEME_OVERRIDE_CSS));
            report.theme_override = true;
        }

        let loader = bundle_loader(options.code, &self.namespace);
        if html.contains(&self.config.placeholder) {
            html = html.replacen(&self.config.placeholder, &loader, 1);
            report.loader_at_placeholder = true;
        } else {
            html = insert_before_body_end(&html, &loader);
        }

        html = self.append_runtime(html);
        InjectOutput { html, report }
    }

    /// Prepare a plain HTML document found at `path` in `files`.
    ///
    /// Nothing is stripped and no loader is added; the document keeps its
    /// own styling, so neither the base stylesheet nor the CDN runtime
    /// applies.
    pub fn inject_document(&self, html: &str, path: &str, files: &FileSet) -> InjectOutput {
        let (html, inlined) = inline_local_assets(html, path, files);
        tracing::debug!(
            document = path,
            stylesheets = inlined.stylesheets.len(),
            scripts = inlined.scripts.len(),
            "inlined local assets"
        );
        InjectOutput {
            html: self.append_runtime(html),
            report: InjectReport {
                inlined: Some(inlined),
                ..InjectReport::default()
            },
        }
    }

    fn append_runtime(&self, html: String) -> String {
        let mut html = insert_before_body_end(&html, &keyboard_forwarder(&self.namespace));
        if self.hmr {
            html = insert_before_body_end(&html, &hmr_listener(&self.namespace));
        }
        html
    }

    fn strip_original_tags(&self, html: &str, report: &mut InjectReport) -> String {
        let mut out = html.to_string();
        for (name, re) in STRIP_PATTERNS.iter().map(|(name, re)| (*name, re)) {
            let removed = re.find_iter(&out).count();
            if removed == 0 {
                tracing::debug!(pattern = name, "strip pattern matched nothing");
            } else {
                let marker = format!("<!-- glimpse: removed {name} -->");
                out = re.replace_all(&out, marker.as_str()).into_owned();
            }
            report.stripped.push(StripResult {
                pattern: name,
                removed,
            });
        }
        out
    }
}

/// Drop `background*` and `color` declarations from an inline body style.
fn strip_body_colors(html: &str) -> String {
    let Some(re) = BODY_STYLE.as_ref() else {
        return html.to_string();
    };
    re.replacen(html, 1, |caps: &regex::Captures<'_>| {
        let kept: Vec<&str> = caps[3]
            .split(';')
            .map(str::trim)
            .filter(|decl| !decl.is_empty())
            .filter(|decl| {
                let property = decl
                    .split(':')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_lowercase();
                !(property.starts_with("background") || property == "color")
            })
            .collect();
        if kept.is_empty() {
            format!("{}{}", &caps[1], &caps[4])
        } else {
            format!("{} style={q}{}{q}{}", &caps[1], kept.join("; "), &caps[4], q = &caps[2])
        }
    })
    .into_owned()
}
