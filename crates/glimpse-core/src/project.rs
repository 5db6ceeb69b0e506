//! Project root and entry detection.
//!
//! Files arrive as a flat, unstructured set. Detection finds an optional
//! root prefix (for projects nested one folder deep), the framework and the
//! canonical entry file. Finding nothing is a normal outcome for a project
//! that is still being written.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::files::{FileSet, extension, is_script};
use crate::framework::Framework;

/// Directory names that mark a project root when they sit directly under
/// one top-level folder.
const CONVENTIONAL_DIRS: &[&str] = &[
    "src",
    "pages",
    "app",
    "components",
    "public",
    "lib",
    "styles",
];

/// Directories that hold helpers rather than application entry points.
const NON_ENTRY_DIRS: &[&str] = &[
    "utils",
    "util",
    "lib",
    "data",
    "hooks",
    "types",
    "constants",
    "api",
];

const MARKUP_PAGE_EXTENSIONS: &[&str] = &["astro", "vue", "svelte", "mdx"];

/// Summary of a detected project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLayout {
    pub prefix: Option<String>,
    pub framework: Framework,
    pub entry: Option<String>,
    pub html_template: Option<String>,
}

impl ProjectLayout {
    /// Prefix-relative path, e.g. `/web/src/main.tsx` → `/src/main.tsx`.
    pub fn relative<'a>(&self, path: &'a str) -> &'a str {
        match &self.prefix {
            Some(prefix) => path.strip_prefix(prefix.as_str()).unwrap_or(path),
            None => path,
        }
    }
}

/// Run prefix, framework, entry and template detection in one pass.
pub fn detect_project(files: &FileSet) -> ProjectLayout {
    let prefix = detect_prefix(files);
    let framework = Framework::detect(files, prefix.as_deref());
    let entry = detect_entry(files, framework, prefix.as_deref());
    let html_template = find_html_template(files, prefix.as_deref());
    tracing::debug!(
        prefix = prefix.as_deref().unwrap_or("-"),
        %framework,
        entry = entry.as_deref().unwrap_or("-"),
        "project detected"
    );
    ProjectLayout {
        prefix,
        framework,
        entry,
        html_template,
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.trim_start_matches('/').split('/').collect()
}

/// Detect a single-folder project root such as `/my-app`.
///
/// A candidate `/<top>` needs a conventional directory directly beneath it
/// and must hold at least half of all files. Otherwise the folder shared by
/// every path is used, unless that folder is itself conventional.
pub fn detect_prefix(files: &FileSet) -> Option<String> {
    let total = files.len();
    if total == 0 {
        return None;
    }

    let mut candidates: Vec<&str> = Vec::new();
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for path in files.paths() {
        let parts = segments(path);
        if parts.len() >= 2 {
            *counts.entry(parts[0]).or_default() += 1;
        }
        if parts.len() >= 3
            && !CONVENTIONAL_DIRS.contains(&parts[0])
            && CONVENTIONAL_DIRS.contains(&parts[1])
            && !candidates.contains(&parts[0])
        {
            candidates.push(parts[0]);
        }
    }

    // Most files wins; paths iterate sorted so ties go to the first name.
    let best = candidates
        .iter()
        .map(|top| (*top, counts.get(top).copied().unwrap_or(0)))
        .fold(None::<(&str, usize)>, |best, (top, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((top, count)),
        });
    if let Some((top, count)) = best {
        if count * 2 >= total {
            return Some(format!("/{top}"));
        }
        tracing::debug!(top, count, total, "prefix candidate holds too few files");
    }

    let mut shared: Option<&str> = None;
    for path in files.paths() {
        let parts = segments(path);
        if parts.len() < 2 {
            return None;
        }
        match shared {
            None => shared = Some(parts[0]),
            Some(top) if top == parts[0] => {}
            Some(_) => return None,
        }
    }
    shared
        .filter(|top| !CONVENTIONAL_DIRS.contains(top))
        .map(|top| format!("/{top}"))
}

/// Conventional entry paths per framework, most canonical first.
pub fn entry_candidates(framework: Framework) -> &'static [&'static str] {
    match framework {
        Framework::Next => &[
            "app/layout.tsx",
            "app/layout.jsx",
            "app/layout.js",
            "app/page.tsx",
            "app/page.jsx",
            "app/page.js",
            "src/app/layout.tsx",
            "src/app/layout.jsx",
            "src/app/page.tsx",
            "src/app/page.jsx",
            "pages/_app.tsx",
            "pages/_app.jsx",
            "pages/index.tsx",
            "pages/index.jsx",
            "pages/index.js",
            "src/pages/_app.tsx",
            "src/pages/index.tsx",
            "src/pages/index.jsx",
        ],
        Framework::Vue => &[
            "src/main.ts",
            "src/main.js",
            "main.ts",
            "main.js",
            "src/App.vue",
            "App.vue",
        ],
        Framework::Svelte => &[
            "src/main.ts",
            "src/main.js",
            "main.ts",
            "main.js",
            "src/App.svelte",
            "App.svelte",
            "src/routes/+page.svelte",
        ],
        Framework::Astro => &[
            "src/pages/index.astro",
            "pages/index.astro",
            "src/pages/index.md",
        ],
        Framework::Vanilla => &[
            "src/main.ts",
            "src/main.js",
            "src/index.ts",
            "src/index.js",
            "main.ts",
            "main.js",
            "index.ts",
            "index.js",
            "script.js",
            "app.js",
        ],
        Framework::React | Framework::Preact | Framework::Solid | Framework::Unknown => &[
            "src/main.tsx",
            "src/main.jsx",
            "src/main.ts",
            "src/main.js",
            "src/index.tsx",
            "src/index.jsx",
            "src/index.ts",
            "src/index.js",
            "main.tsx",
            "main.jsx",
            "index.tsx",
            "index.jsx",
            "src/App.tsx",
            "src/App.jsx",
            "App.tsx",
            "App.jsx",
        ],
    }
}

/// Locate the entry file, or `None` when the project has no usable entry yet.
pub fn detect_entry(files: &FileSet, framework: Framework, prefix: Option<&str>) -> Option<String> {
    let candidates = entry_candidates(framework);

    let roots: Vec<String> = match prefix {
        Some(prefix) => vec![prefix.trim_end_matches('/').to_string(), String::new()],
        None => vec![String::new()],
    };
    for root in &roots {
        for candidate in candidates {
            let path = format!("{root}/{candidate}");
            if files.contains(&path) {
                return Some(path);
            }
        }
    }

    fallback_entry(files)
}

fn in_dir(path: &str, dir: &str) -> bool {
    segments(path)
        .split_last()
        .is_some_and(|(_, dirs)| dirs.contains(&dir))
}

fn in_non_entry_dir(path: &str) -> bool {
    NON_ENTRY_DIRS.iter().any(|dir| in_dir(path, dir))
}

fn fallback_entry(files: &FileSet) -> Option<String> {
    let scripts = || files.paths().filter(|p| is_script(p));

    if let Some(path) = scripts().find(|p| in_dir(p, "src") && !in_non_entry_dir(p)) {
        return Some(path.to_string());
    }
    if let Some(path) = scripts().find(|p| in_dir(p, "app") && !in_dir(p, "api")) {
        return Some(path.to_string());
    }
    if let Some(path) = scripts().find(|p| in_dir(p, "pages") && !in_dir(p, "api")) {
        return Some(path.to_string());
    }
    if let Some(path) = files
        .paths()
        .find(|p| extension(p).is_some_and(|ext| MARKUP_PAGE_EXTENSIONS.contains(&ext)))
    {
        return Some(path.to_string());
    }
    if !Framework::has_framework_files(files) {
        let html = files
            .paths()
            .find(|p| crate::files::file_name(p) == "index.html")
            .or_else(|| files.paths().find(|p| extension(p) == Some("html")));
        if let Some(path) = html {
            return Some(path.to_string());
        }
    }
    None
}

/// The HTML document to inject into, if the project ships one.
pub fn find_html_template(files: &FileSet, prefix: Option<&str>) -> Option<String> {
    let mut candidates = Vec::new();
    if let Some(prefix) = prefix {
        candidates.push(format!("{prefix}/index.html"));
        candidates.push(format!("{prefix}/public/index.html"));
    }
    candidates.push("/index.html".to_string());
    candidates.push("/public/index.html".to_string());
    candidates.into_iter().find(|path| files.contains(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(paths: &[&str]) -> FileSet {
        FileSet::from_map(paths.iter().map(|p| (*p, "")))
    }

    #[test]
    fn test_prefix_detected_for_nested_project() {
        let set = files(&[
            "/my-app/src/main.tsx",
            "/my-app/src/App.tsx",
            "/my-app/package.json",
            "/README.md",
        ]);
        assert_eq!(detect_prefix(&set), Some("/my-app".to_string()));
    }

    #[test]
    fn test_prefix_rejected_below_half() {
        let set = files(&[
            "/web/src/main.tsx",
            "/a.txt",
            "/b.txt",
            "/c.txt",
        ]);
        assert_eq!(detect_prefix(&set), None);
    }

    #[test]
    fn test_shared_top_level_folder_fallback() {
        let set = files(&["/site/index.html", "/site/style.css"]);
        assert_eq!(detect_prefix(&set), Some("/site".to_string()));
    }

    #[test]
    fn test_conventional_folder_is_not_a_prefix() {
        let set = files(&["/src/main.tsx", "/src/App.tsx"]);
        assert_eq!(detect_prefix(&set), None);
    }

    #[test]
    fn test_vite_style_entry() {
        let set = files(&["/src/main.tsx", "/src/App.tsx"]);
        let layout = detect_project(&set);
        assert_eq!(layout.prefix, None);
        assert_eq!(layout.entry.as_deref(), Some("/src/main.tsx"));
    }

    #[test]
    fn test_next_layout_before_page() {
        let set = files(&["/app/page.tsx", "/app/layout.tsx"]);
        assert_eq!(
            detect_entry(&set, Framework::Next, None).as_deref(),
            Some("/app/layout.tsx")
        );
    }

    #[test]
    fn test_prefixed_candidates_first() {
        let set = files(&["/web/src/main.tsx", "/web/src/App.tsx", "/web/package.json"]);
        let layout = detect_project(&set);
        assert_eq!(layout.prefix.as_deref(), Some("/web"));
        assert_eq!(layout.entry.as_deref(), Some("/web/src/main.tsx"));
        assert_eq!(layout.relative("/web/src/main.tsx"), "/src/main.tsx");
    }

    #[test]
    fn test_fallback_skips_utility_dirs() {
        let set = files(&["/src/utils/format.ts", "/src/widgets/Board.tsx"]);
        assert_eq!(
            detect_entry(&set, Framework::React, None).as_deref(),
            Some("/src/widgets/Board.tsx")
        );
    }

    #[test]
    fn test_fallback_skips_api_routes() {
        let set = files(&["/app/api/route.ts", "/app/dashboard/view.tsx"]);
        assert_eq!(
            detect_entry(&set, Framework::Unknown, None).as_deref(),
            Some("/app/dashboard/view.tsx")
        );
    }

    #[test]
    fn test_html_only_when_no_framework_files() {
        let set = files(&["/index.html", "/style.css"]);
        assert_eq!(
            detect_entry(&set, Framework::Vanilla, None).as_deref(),
            Some("/index.html")
        );

        let set = files(&["/index.html", "/widgets/Card.tsx"]);
        assert_eq!(detect_entry(&set, Framework::React, None), None);
    }

    #[test]
    fn test_nothing_found_is_none() {
        assert_eq!(detect_entry(&files(&["/README.md"]), Framework::Unknown, None), None);
        assert_eq!(detect_project(&FileSet::new()).entry, None);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let set = files(&["/pages/about.tsx", "/pages/index.tsx", "/components/Nav.tsx"]);
        let first = detect_project(&set);
        for _ in 0..10 {
            assert_eq!(detect_project(&set), first);
        }
    }

    #[test]
    fn test_html_template_lookup() {
        let set = files(&["/web/index.html", "/web/src/main.ts", "/web/src/app.ts"]);
        assert_eq!(
            find_html_template(&set, Some("/web")).as_deref(),
            Some("/web/index.html")
        );
    }
}
