//! Framework variants and detection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::files::{FileSet, extension};

/// The closed set of application styles the pipeline knows how to mount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    React,
    Next,
    Preact,
    Solid,
    Vue,
    Svelte,
    Astro,
    Vanilla,
    #[default]
    Unknown,
}

/// Manifest dependency → framework, most specific first.
const DEPENDENCY_SIGNATURES: &[(&str, Framework)] = &[
    ("next", Framework::Next),
    ("astro", Framework::Astro),
    ("@sveltejs/kit", Framework::Svelte),
    ("svelte", Framework::Svelte),
    ("nuxt", Framework::Vue),
    ("vue", Framework::Vue),
    ("solid-js", Framework::Solid),
    ("preact", Framework::Preact),
    ("react", Framework::React),
    ("react-dom", Framework::React),
];

impl Framework {
    pub const ALL: [Framework; 9] = [
        Framework::React,
        Framework::Next,
        Framework::Preact,
        Framework::Solid,
        Framework::Vue,
        Framework::Svelte,
        Framework::Astro,
        Framework::Vanilla,
        Framework::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::React => "react",
            Framework::Next => "next",
            Framework::Preact => "preact",
            Framework::Solid => "solid",
            Framework::Vue => "vue",
            Framework::Svelte => "svelte",
            Framework::Astro => "astro",
            Framework::Vanilla => "vanilla",
            Framework::Unknown => "unknown",
        }
    }

    /// Vue and Svelte compile styles out of component files, so the
    /// compiled CSS cannot be trusted to be complete.
    pub fn is_single_file_component(&self) -> bool {
        matches!(self, Framework::Vue | Framework::Svelte)
    }

    pub fn uses_jsx(&self) -> bool {
        matches!(
            self,
            Framework::React | Framework::Next | Framework::Preact | Framework::Solid
        )
    }

    /// Mount container id. Vue and Svelte templates conventionally use `#app`.
    pub fn container_id(&self) -> &'static str {
        match self {
            Framework::Vue | Framework::Svelte => "app",
            _ => "root",
        }
    }

    /// Detect from `package.json` dependencies, then from file extensions.
    pub fn detect(files: &FileSet, prefix: Option<&str>) -> Framework {
        if let Some(framework) = files
            .manifest(prefix)
            .as_ref()
            .and_then(Self::from_manifest)
        {
            tracing::debug!(%framework, "framework detected from manifest");
            return framework;
        }
        let framework = Self::from_extensions(files);
        tracing::debug!(%framework, "framework detected from file extensions");
        framework
    }

    pub fn from_manifest(manifest: &serde_json::Value) -> Option<Framework> {
        let has = |name: &str| {
            ["dependencies", "devDependencies", "peerDependencies"]
                .iter()
                .any(|section| manifest.get(section).and_then(|deps| deps.get(name)).is_some())
        };
        DEPENDENCY_SIGNATURES
            .iter()
            .find(|(name, _)| has(name))
            .map(|(_, framework)| *framework)
    }

    pub fn from_extensions(files: &FileSet) -> Framework {
        let mut has_jsx = false;
        let mut has_script = false;
        let mut has_html = false;
        let mut has_app_router = false;

        for path in files.paths() {
            match extension(path) {
                Some("astro") => return Framework::Astro,
                Some("svelte") => return Framework::Svelte,
                Some("vue") => return Framework::Vue,
                Some("tsx" | "jsx") => {
                    has_jsx = true;
                    if is_app_router_file(path) {
                        has_app_router = true;
                    }
                }
                Some("ts" | "js" | "mjs") => has_script = true,
                Some("html") => has_html = true,
                _ => {}
            }
        }

        if has_app_router {
            Framework::Next
        } else if has_jsx {
            Framework::React
        } else if has_script || has_html {
            Framework::Vanilla
        } else {
            Framework::Unknown
        }
    }

    /// Whether any file in the set implies a component framework.
    pub fn has_framework_files(files: &FileSet) -> bool {
        files.paths().any(|path| {
            matches!(
                extension(path),
                Some("tsx" | "jsx" | "vue" | "svelte" | "astro")
            )
        })
    }
}

fn is_app_router_file(path: &str) -> bool {
    let in_app = path.starts_with("/app/") || path.contains("/app/");
    let stem = crate::files::file_stem(path);
    in_app && (stem == "page" || stem == "layout")
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "react" => Ok(Framework::React),
            "next" | "nextjs" | "next.js" => Ok(Framework::Next),
            "preact" => Ok(Framework::Preact),
            "solid" | "solid-js" => Ok(Framework::Solid),
            "vue" => Ok(Framework::Vue),
            "svelte" | "sveltekit" => Ok(Framework::Svelte),
            "astro" => Ok(Framework::Astro),
            "vanilla" | "html" => Ok(Framework::Vanilla),
            "unknown" => Ok(Framework::Unknown),
            other => Err(format!("unknown framework '{other}'")),
        }
    }
}
