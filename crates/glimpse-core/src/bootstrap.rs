//! Synthesized entry scripts that mount a detected application.
//!
//! Each [`Framework`] has one [`BootstrapGenerator`]. When the entry module
//! already mounts itself the generated script only imports it for its side
//! effects, so the app is never mounted twice.

use crate::files::{FileSet, file_stem};
use crate::framework::Framework;

/// Virtual path of the synthesized entry inside the compile input.
pub const BOOTSTRAP_PATH: &str = "/__glimpse__/bootstrap.js";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    pub path: String,
    pub code: String,
    pub self_mounting: bool,
}

/// Inputs available to a generator.
#[derive(Debug, Clone, Copy)]
pub struct BootstrapContext<'a> {
    pub entry: &'a str,
    pub files: &'a FileSet,
    pub container_id: &'a str,
}

pub trait BootstrapGenerator: Send + Sync {
    fn framework(&self) -> Framework;

    /// Source patterns that indicate the module mounts itself.
    fn mount_patterns(&self) -> &'static [&'static str];

    /// Mount code for an entry that does not mount itself.
    fn mount(&self, ctx: &BootstrapContext<'_>) -> String;

    fn is_self_mounting(&self, source: &str) -> bool {
        self.mount_patterns()
            .iter()
            .any(|pattern| source.contains(pattern))
    }

    fn generate(&self, ctx: &BootstrapContext<'_>) -> Bootstrap {
        let source = ctx.files.content(ctx.entry).unwrap_or_default();
        let self_mounting = self.is_self_mounting(source);
        let code = if self_mounting {
            tracing::debug!(entry = ctx.entry, "entry mounts itself, importing for side effects");
            side_effect_import(ctx.entry)
        } else {
            self.mount(ctx)
        };
        Bootstrap {
            path: BOOTSTRAP_PATH.to_string(),
            code,
            self_mounting,
        }
    }
}

fn side_effect_import(entry: &str) -> String {
    format!("import {};\n", js_string(entry))
}

fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Look up the container, creating it when the template lacks one.
fn container_js(id: &str) -> String {
    format!(
        "const container = document.getElementById({id}) ?? (() => {{\n  \
         const el = document.createElement(\"div\");\n  \
         el.id = {id};\n  \
         document.body.appendChild(el);\n  \
         return el;\n\
         }})();\n",
        id = js_string(id)
    )
}

struct ReactGenerator;
struct NextGenerator;
struct PreactGenerator;
struct SolidGenerator;
struct VueGenerator;
struct SvelteGenerator;
struct StaticGenerator(Framework);
struct DefaultGenerator;

const REACT_MOUNTS: &[&str] = &["createRoot(", "hydrateRoot(", "ReactDOM.render("];

impl BootstrapGenerator for ReactGenerator {
    fn framework(&self) -> Framework {
        Framework::React
    }

    fn mount_patterns(&self) -> &'static [&'static str] {
        REACT_MOUNTS
    }

    fn mount(&self, ctx: &BootstrapContext<'_>) -> String {
        format!(
            "import {{ createElement }} from \"react\";\n\
             import {{ createRoot }} from \"react-dom/client\";\n\
             import App from {entry};\n\n\
             {container}\
             createRoot(container).render(createElement(App));\n",
            entry = js_string(ctx.entry),
            container = container_js(ctx.container_id),
        )
    }
}

impl NextGenerator {
    /// The page rendered inside an app-router layout, if there is one.
    fn page_for_layout(ctx: &BootstrapContext<'_>) -> Option<String> {
        if file_stem(ctx.entry) != "layout" {
            return None;
        }
        let dir = ctx.entry.rsplit_once('/').map(|(dir, _)| dir)?;
        ["tsx", "jsx", "js"]
            .iter()
            .map(|ext| format!("{dir}/page.{ext}"))
            .find(|path| ctx.files.contains(path))
    }
}

impl BootstrapGenerator for NextGenerator {
    fn framework(&self) -> Framework {
        Framework::Next
    }

    fn mount_patterns(&self) -> &'static [&'static str] {
        REACT_MOUNTS
    }

    fn mount(&self, ctx: &BootstrapContext<'_>) -> String {
        let container = container_js(ctx.container_id);
        match Self::page_for_layout(ctx) {
            Some(page) => format!(
                "import {{ createElement }} from \"react\";\n\
                 import {{ createRoot }} from \"react-dom/client\";\n\
                 import Layout from {layout};\n\
                 import Page from {page};\n\n\
                 {container}\
                 createRoot(container).render(createElement(Layout, null, createElement(Page)));\n",
                layout = js_string(ctx.entry),
                page = js_string(&page),
            ),
            None => ReactGenerator.mount(ctx),
        }
    }
}

impl BootstrapGenerator for PreactGenerator {
    fn framework(&self) -> Framework {
        Framework::Preact
    }

    fn mount_patterns(&self) -> &'static [&'static str] {
        &["render(<", "render(h(", "hydrate(<", "hydrate(h("]
    }

    fn mount(&self, ctx: &BootstrapContext<'_>) -> String {
        format!(
            "import {{ h, render }} from \"preact\";\n\
             import App from {entry};\n\n\
             {container}\
             render(h(App, null), container);\n",
            entry = js_string(ctx.entry),
            container = container_js(ctx.container_id),
        )
    }
}

impl BootstrapGenerator for SolidGenerator {
    fn framework(&self) -> Framework {
        Framework::Solid
    }

    fn mount_patterns(&self) -> &'static [&'static str] {
        &["render(() =>", "render(()=>", "hydrate(() =>"]
    }

    fn mount(&self, ctx: &BootstrapContext<'_>) -> String {
        format!(
            "import {{ render, createComponent }} from \"solid-js/web\";\n\
             import App from {entry};\n\n\
             {container}\
             render(() => createComponent(App, {{}}), container);\n",
            entry = js_string(ctx.entry),
            container = container_js(ctx.container_id),
        )
    }
}

impl BootstrapGenerator for VueGenerator {
    fn framework(&self) -> Framework {
        Framework::Vue
    }

    fn mount_patterns(&self) -> &'static [&'static str] {
        &[".mount(", "createSSRApp("]
    }

    fn mount(&self, ctx: &BootstrapContext<'_>) -> String {
        format!(
            "import {{ createApp }} from \"vue\";\n\
             import App from {entry};\n\n\
             {container}\
             createApp(App).mount(container);\n",
            entry = js_string(ctx.entry),
            container = container_js(ctx.container_id),
        )
    }
}

impl BootstrapGenerator for SvelteGenerator {
    fn framework(&self) -> Framework {
        Framework::Svelte
    }

    fn mount_patterns(&self) -> &'static [&'static str] {
        &["mount(App", "new App(", "hydrate(App"]
    }

    fn mount(&self, ctx: &BootstrapContext<'_>) -> String {
        format!(
            "import {{ mount }} from \"svelte\";\n\
             import App from {entry};\n\n\
             {container}\
             mount(App, {{ target: container }});\n",
            entry = js_string(ctx.entry),
            container = container_js(ctx.container_id),
        )
    }
}

/// Static-site pages and plain scripts run on import.
impl BootstrapGenerator for StaticGenerator {
    fn framework(&self) -> Framework {
        self.0
    }

    fn mount_patterns(&self) -> &'static [&'static str] {
        &[]
    }

    fn is_self_mounting(&self, _source: &str) -> bool {
        true
    }

    fn mount(&self, ctx: &BootstrapContext<'_>) -> String {
        side_effect_import(ctx.entry)
    }
}

/// Undetected frameworks: call a default-exported function with the
/// container, otherwise rely on the module's side effects.
impl BootstrapGenerator for DefaultGenerator {
    fn framework(&self) -> Framework {
        Framework::Unknown
    }

    fn mount_patterns(&self) -> &'static [&'static str] {
        &["document.getElementById(", "document.querySelector(", "document.body"]
    }

    fn mount(&self, ctx: &BootstrapContext<'_>) -> String {
        format!(
            "import * as entry from {entry};\n\n\
             {container}\
             if (typeof entry.default === \"function\") {{\n  \
             entry.default(container);\n\
             }}\n",
            entry = js_string(ctx.entry),
            container = container_js(ctx.container_id),
        )
    }
}

/// The single dispatch point from framework tag to generator.
pub fn generator_for(framework: Framework) -> &'static dyn BootstrapGenerator {
    match framework {
        Framework::React => &ReactGenerator,
        Framework::Next => &NextGenerator,
        Framework::Preact => &PreactGenerator,
        Framework::Solid => &SolidGenerator,
        Framework::Vue => &VueGenerator,
        Framework::Svelte => &SvelteGenerator,
        Framework::Astro => &StaticGenerator(Framework::Astro),
        Framework::Vanilla => &StaticGenerator(Framework::Vanilla),
        Framework::Unknown => &DefaultGenerator,
    }
}

/// Generate the bootstrap entry for `entry`.
pub fn generate_bootstrap(framework: Framework, entry: &str, files: &FileSet) -> Bootstrap {
    let ctx = BootstrapContext {
        entry,
        files,
        container_id: framework.container_id(),
    };
    generator_for(framework).generate(&ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_react_mounts_app_component() {
        let files = FileSet::from_map([("/src/App.tsx", "export default function App() {}")]);
        let bootstrap = generate_bootstrap(Framework::React, "/src/App.tsx", &files);

        assert!(!bootstrap.self_mounting);
        assert_eq!(bootstrap.path, BOOTSTRAP_PATH);
        assert!(bootstrap.code.contains("import App from \"/src/App.tsx\";"));
        assert!(bootstrap.code.contains("document.getElementById(\"root\")"));
        assert!(bootstrap.code.contains("createRoot(container).render(createElement(App));"));
    }

    #[test]
    fn test_self_mounting_entry_is_imported_for_side_effects() {
        let files = FileSet::from_map([(
            "/src/main.tsx",
            "ReactDOM.createRoot(document.getElementById('root')!).render(<App />)",
        )]);
        let bootstrap = generate_bootstrap(Framework::React, "/src/main.tsx", &files);

        assert!(bootstrap.self_mounting);
        assert_eq!(bootstrap.code, "import \"/src/main.tsx\";\n");
    }

    #[test]
    fn test_next_layout_wraps_page() {
        let files = FileSet::from_map([
            ("/app/layout.tsx", "export default function L({children}) {}"),
            ("/app/page.tsx", "export default function P() {}"),
        ]);
        let code = generate_bootstrap(Framework::Next, "/app/layout.tsx", &files).code;
        assert!(code.contains("import Layout from \"/app/layout.tsx\";"));
        assert!(code.contains("import Page from \"/app/page.tsx\";"));
        assert!(code.contains("createElement(Layout, null, createElement(Page))"));
    }

    #[test]
    fn test_vue_uses_app_container() {
        let files = FileSet::from_map([("/src/App.vue", "<template><div/></template>")]);
        let code = generate_bootstrap(Framework::Vue, "/src/App.vue", &files).code;
        assert!(code.contains("document.getElementById(\"app\")"));
        assert!(code.contains("createApp(App).mount(container);"));
    }

    #[test]
    fn test_vue_main_with_mount_is_self_mounting() {
        let files = FileSet::from_map([("/src/main.ts", "createApp(App).mount('#app')")]);
        assert!(generate_bootstrap(Framework::Vue, "/src/main.ts", &files).self_mounting);
    }

    #[test]
    fn test_static_and_default_generators() {
        let files = FileSet::from_map([("/index.js", "console.log(1)")]);
        let code = generate_bootstrap(Framework::Vanilla, "/index.js", &files).code;
        assert_eq!(code, "import \"/index.js\";\n");

        let code = generate_bootstrap(Framework::Unknown, "/index.js", &files).code;
        assert!(code.contains("entry.default(container)"));
    }

    #[test]
    fn test_every_framework_has_a_generator() {
        for framework in Framework::ALL {
            assert_eq!(generator_for(framework).framework(), framework);
        }
    }

    #[test]
    fn test_entry_path_is_escaped() {
        let files = FileSet::from_map([("/src/we\"ird.tsx", "")]);
        let code = generate_bootstrap(Framework::React, "/src/we\"ird.tsx", &files).code;
        assert!(code.contains(r#"import App from "/src/we\"ird.tsx";"#));
    }
}
