//! Router detection and generation.
//!
//! A project that already imports a router library is left alone. A project
//! without one gets a generated router when its file layout or its links
//! show more than one page.

mod generate;
mod infer;
mod links;

pub use generate::{GeneratedRouter, ROUTER_PATH, generate_router};
pub use infer::{infer_routes, page_files, sort_routes};
pub use links::{AnchorRewrite, HrefKind, classify_href, count_internal_links, rewrite_internal_anchors};

use glimpse_config::RouterConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::files::{FileSet, extension};

/// A route in the generated router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub path: String,
    /// Module that renders the route.
    pub component: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub index: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteDefinition>,
}

impl RouteDefinition {
    pub fn new(path: impl Into<String>, component: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            index: path == "/",
            path,
            component: component.into(),
            children: Vec::new(),
        }
    }

    pub fn has_params(&self) -> bool {
        self.path.split('/').any(|segment| segment.starts_with(':') || segment == "*")
    }
}

/// Router libraries recognised in import specifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouterLibrary {
    TanstackRouter,
    ReactRouterDom,
    ReactRouter,
    Wouter,
    VueRouter,
    NextNavigation,
}

/// Ordered by specificity: matching is by prefix, and `react-router-dom`
/// also starts with `react-router`.
const ROUTER_SIGNATURES: &[(&str, RouterLibrary)] = &[
    ("@tanstack/react-router", RouterLibrary::TanstackRouter),
    ("react-router-dom", RouterLibrary::ReactRouterDom),
    ("react-router", RouterLibrary::ReactRouter),
    ("wouter", RouterLibrary::Wouter),
    ("vue-router", RouterLibrary::VueRouter),
    ("next/navigation", RouterLibrary::NextNavigation),
    ("next/router", RouterLibrary::NextNavigation),
    ("next/link", RouterLibrary::NextNavigation),
];

static IMPORT_SPECIFIER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?:\bfrom\s*|\bimport\s*\(?\s*|\brequire\s*\(\s*)["']([^"'\n]+)["']"#).ok()
});

impl RouterLibrary {
    pub fn package(&self) -> &'static str {
        match self {
            RouterLibrary::TanstackRouter => "@tanstack/react-router",
            RouterLibrary::ReactRouterDom => "react-router-dom",
            RouterLibrary::ReactRouter => "react-router",
            RouterLibrary::Wouter => "wouter",
            RouterLibrary::VueRouter => "vue-router",
            RouterLibrary::NextNavigation => "next/navigation",
        }
    }

    pub fn from_specifier(specifier: &str) -> Option<RouterLibrary> {
        ROUTER_SIGNATURES
            .iter()
            .find(|(name, _)| specifier.starts_with(name))
            .map(|(_, library)| *library)
    }
}

/// Import specifiers found in a source text, in order of appearance.
pub fn import_specifiers(source: &str) -> impl Iterator<Item = &str> {
    IMPORT_SPECIFIER
        .iter()
        .flat_map(move |re| re.captures_iter(source))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

fn is_component_source(path: &str) -> bool {
    crate::files::is_script(path)
        || matches!(extension(path), Some("vue" | "svelte" | "astro" | "mdx"))
}

/// The first router library imported anywhere in the project.
pub fn detect_router(files: &FileSet) -> Option<RouterLibrary> {
    files
        .sources()
        .filter(|file| is_component_source(&file.path))
        .flat_map(|file| import_specifiers(&file.content))
        .find_map(RouterLibrary::from_specifier)
}

/// Everything the session needs to decide on routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterAnalysis {
    pub existing: Option<RouterLibrary>,
    pub routes: Vec<RouteDefinition>,
    pub page_files: usize,
    pub internal_links: usize,
    pub needs_router: bool,
}

/// Detect routing needs.
///
/// A router is needed when none is imported and either more than one
/// conventional page file exists or internal links exceed the threshold.
pub fn analyze_routing(files: &FileSet, config: &RouterConfig) -> RouterAnalysis {
    let existing = detect_router(files);
    let pages = page_files(files);
    let routes = infer_routes(files);
    let internal_links = files
        .sources()
        .filter(|file| is_component_source(&file.path) || extension(&file.path) == Some("html"))
        .map(|file| count_internal_links(&file.content))
        .sum();

    let needs_router =
        existing.is_none() && (pages.len() > 1 || internal_links > config.link_threshold);
    tracing::debug!(
        existing = ?existing,
        pages = pages.len(),
        internal_links,
        needs_router,
        "routing analysed"
    );

    RouterAnalysis {
        existing,
        routes,
        page_files: pages.len(),
        internal_links,
        needs_router,
    }
}
