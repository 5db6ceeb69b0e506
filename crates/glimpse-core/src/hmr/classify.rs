//! File change classification.

use serde::{Deserialize, Serialize};

use crate::files::{extension, file_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Style,
    Script,
    Asset,
    Config,
    Unknown,
}

const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less", "styl", "pcss"];

/// Scripts, and component files that need a full remount.
const SCRIPT_EXTENSIONS: &[&str] = &[
    "tsx", "jsx", "ts", "js", "mjs", "cjs", "mts", "cts", "vue", "svelte", "astro", "mdx", "json",
];

const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico", "bmp", "woff", "woff2", "ttf",
    "otf", "eot", "mp3", "mp4", "webm", "wav", "ogg", "pdf",
];

const CONFIG_FILES: &[&str] = &[
    "package.json",
    "jsconfig.json",
    ".babelrc",
    ".env",
    "glimpse.toml",
];

fn is_config_file(name: &str) -> bool {
    CONFIG_FILES.contains(&name)
        || (name.starts_with("tsconfig") && name.ends_with(".json"))
        || name.contains(".config.")
        || name.starts_with(".env.")
}

/// Classify a changed path. Config wins over the extension, so
/// `vite.config.ts` is config, not script.
pub fn classify(path: &str) -> ChangeType {
    let name = file_name(path);
    if is_config_file(name) {
        return ChangeType::Config;
    }
    let Some(ext) = extension(path).map(str::to_ascii_lowercase) else {
        return ChangeType::Unknown;
    };
    let ext = ext.as_str();
    if STYLE_EXTENSIONS.contains(&ext) {
        ChangeType::Style
    } else if SCRIPT_EXTENSIONS.contains(&ext) {
        ChangeType::Script
    } else if ASSET_EXTENSIONS.contains(&ext) {
        ChangeType::Asset
    } else {
        ChangeType::Unknown
    }
}
