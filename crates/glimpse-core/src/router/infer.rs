//! Route inference from file layout.
//!
//! Two conventions are understood: app directories (`app/**/page.tsx`) and
//! flat page directories (`pages/**/*.tsx`). Bracketed segments become
//! parameters (`[id]` → `:id`, `[...slug]` → `*`).

use super::RouteDefinition;
use crate::files::{FileSet, extension, file_stem, is_script};

fn convert_segment(segment: &str) -> String {
    let inner = segment
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .map(|s| s.trim_start_matches('[').trim_end_matches(']'));
    match inner {
        Some(name) if name.starts_with("...") => "*".to_string(),
        Some(name) => format!(":{name}"),
        None => segment.to_string(),
    }
}

fn join_route(parts: &[String]) -> String {
    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// `/app/blog/[id]/page.tsx` → `/blog/:id`.
fn app_route(path: &str) -> Option<String> {
    if !is_script(path) || file_stem(path) != "page" {
        return None;
    }
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let app = segments.iter().position(|s| *s == "app")?;
    let dirs = &segments[app + 1..segments.len() - 1];

    let mut parts = Vec::new();
    for dir in dirs {
        if dir.starts_with('_') || dir.starts_with('@') || *dir == "api" {
            return None;
        }
        if dir.starts_with('(') && dir.ends_with(')') {
            continue;
        }
        parts.push(convert_segment(dir));
    }
    Some(join_route(&parts))
}

/// `/pages/blog/[id].tsx` → `/blog/:id`; `index` maps to its directory.
fn pages_route(path: &str) -> Option<String> {
    if !(is_script(path) || extension(path) == Some("mdx")) {
        return None;
    }
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let pages = segments.iter().position(|s| *s == "pages")?;
    let rest = &segments[pages + 1..];
    if rest.first().is_some_and(|first| *first == "api" && rest.len() > 1) {
        return None;
    }
    if rest.iter().any(|segment| segment.starts_with('_')) {
        return None;
    }

    let (file, dirs) = rest.split_last()?;
    let mut parts: Vec<String> = dirs.iter().map(|dir| convert_segment(dir)).collect();
    let stem = file_stem(file);
    if stem != "index" {
        parts.push(convert_segment(stem));
    }
    Some(join_route(&parts))
}

/// Conventional page files (both conventions), in path order.
pub fn page_files(files: &FileSet) -> Vec<&str> {
    files
        .paths()
        .filter(|path| app_route(path).is_some() || pages_route(path).is_some())
        .collect()
}

/// Routes inferred from the layout, deduplicated by path and sorted.
pub fn infer_routes(files: &FileSet) -> Vec<RouteDefinition> {
    let app = files
        .paths()
        .filter_map(|path| app_route(path).map(|route| (route, path)));
    let pages = files
        .paths()
        .filter_map(|path| pages_route(path).map(|route| (route, path)));

    let mut routes: Vec<RouteDefinition> = Vec::new();
    for (route, component) in app.chain(pages) {
        if routes.iter().any(|existing| existing.path == route) {
            tracing::trace!(route = %route, component, "duplicate route skipped");
            continue;
        }
        routes.push(RouteDefinition::new(route, component));
    }
    sort_routes(&mut routes);
    routes
}

/// Index first, then lexicographic, with parameterised routes last.
pub fn sort_routes(routes: &mut [RouteDefinition]) {
    routes.sort_by(|a, b| {
        (!a.index, a.has_params(), &a.path).cmp(&(!b.index, b.has_params(), &b.path))
    });
}
