//! HTML templates and pre-rendered content merging.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::framework::Framework;

/// Conventional empty mount containers, checked in this order.
pub const CONTAINER_IDS: &[&str] = &["root", "app", "__next", "svelte"];

/// Wrapper id used when no empty container is found.
pub const PRERENDER_WRAPPER_ID: &str = "glimpse-prerender";

static BODY_OPEN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?i)<body\b[^>]*>").ok());

/// Externally rendered markup to merge into the template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerendered {
    #[serde(default)]
    pub head: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Where pre-rendered body markup ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum PrerenderPlacement {
    Container(String),
    Wrapper,
}

/// A minimal document for projects without an `index.html`.
pub fn default_template(framework: Framework, placeholder: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Preview</title>
</head>
<body>
  <div id="{container}"></div>
  {placeholder}
</body>
</html>
"#,
        container = framework.container_id(),
    )
}

/// Insert before `</head>`, else before `<body>`, else at the start.
pub fn insert_into_head(html: &str, snippet: &str) -> String {
    let lower = html.to_ascii_lowercase();
    if let Some(idx) = lower.find("</head>") {
        let (head, tail) = html.split_at(idx);
        return format!("{head}{snippet}\n{tail}");
    }
    if let Some(idx) = lower.find("<body") {
        let (head, tail) = html.split_at(idx);
        return format!("{head}{snippet}\n{tail}");
    }
    format!("{snippet}\n{html}")
}

/// Insert before the last `</body>`, else append.
pub fn insert_before_body_end(html: &str, snippet: &str) -> String {
    let lower = html.to_ascii_lowercase();
    if let Some(idx) = lower.rfind("</body>") {
        let (head, tail) = html.split_at(idx);
        return format!("{head}{snippet}\n{tail}");
    }
    format!("{html}\n{snippet}")
}

fn empty_container(id: &str) -> Option<Regex> {
    Regex::new(&format!(
        r#"(?i)(<div\b[^>]*\bid\s*=\s*["']{}["'][^>]*>)\s*(</div>)"#,
        regex::escape(id)
    ))
    .ok()
}

/// Merge pre-rendered head and body markup into `html`.
pub fn merge_prerendered(html: &str, prerendered: &Prerendered) -> (String, Option<PrerenderPlacement>) {
    let mut out = html.to_string();
    if let Some(head) = prerendered.head.as_deref().filter(|h| !h.trim().is_empty()) {
        out = insert_into_head(&out, head);
    }

    let Some(body) = prerendered.body.as_deref().filter(|b| !b.trim().is_empty()) else {
        return (out, None);
    };

    for id in CONTAINER_IDS {
        let Some(re) = empty_container(id) else {
            continue;
        };
        if let Some(caps) = re.captures(&out) {
            let (Some(whole), Some(open), Some(close)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            let merged = format!(
                "{}{}{body}{}{}",
                &out[..whole.start()],
                open.as_str(),
                close.as_str(),
                &out[whole.end()..]
            );
            tracing::debug!(container = id, "pre-rendered markup merged into container");
            return (merged, Some(PrerenderPlacement::Container((*id).to_string())));
        }
    }

    let wrapper = format!("<div id=\"{PRERENDER_WRAPPER_ID}\">{body}</div>");
    let merged = match BODY_OPEN.as_ref().and_then(|re| re.find(&out)) {
        Some(m) => format!("{}\n{wrapper}{}", &out[..m.end()], &out[m.end()..]),
        None => format!("{wrapper}\n{out}"),
    };
    tracing::debug!("no empty container, pre-rendered markup wrapped");
    (merged, Some(PrerenderPlacement::Wrapper))
}
