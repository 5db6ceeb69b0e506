//! Router module generation.

use glimpse_config::RouterStrategy;

use super::RouteDefinition;

/// Virtual path of the generated router module.
pub const ROUTER_PATH: &str = "/__glimpse__/router.js";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedRouter {
    pub path: String,
    pub code: String,
    pub strategy: RouterStrategy,
}

fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn imports(routes: &[RouteDefinition], layout: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(layout) = layout {
        out.push_str(&format!("import Layout from {};\n", js_string(layout)));
    }
    for (i, route) in routes.iter().enumerate() {
        out.push_str(&format!("import Route{i} from {};\n", js_string(&route.component)));
    }
    out
}

fn wrap_layout(inner: &str, layout: Option<&str>) -> String {
    match layout {
        Some(_) => format!("createElement(Layout, null, {inner})"),
        None => inner.to_string(),
    }
}

/// Emit a router module whose default export renders the matched route.
///
/// `layout`, when given, wraps every route (app-router layouts).
pub fn generate_router(
    routes: &[RouteDefinition],
    strategy: RouterStrategy,
    layout: Option<&str>,
) -> GeneratedRouter {
    let code = match strategy {
        RouterStrategy::Declarative => declarative(routes, layout),
        RouterStrategy::Hash => hash(routes, layout),
    };
    tracing::debug!(routes = routes.len(), ?strategy, "router generated");
    GeneratedRouter {
        path: ROUTER_PATH.to_string(),
        code,
        strategy,
    }
}

fn declarative(routes: &[RouteDefinition], layout: Option<&str>) -> String {
    let entries: Vec<String> = routes
        .iter()
        .enumerate()
        .map(|(i, route)| {
            if route.index {
                format!("      createElement(Route, {{ index: true, element: createElement(Route{i}) }})")
            } else {
                format!(
                    "      createElement(Route, {{ path: {}, element: createElement(Route{i}) }})",
                    js_string(&route.path)
                )
            }
        })
        .collect();
    let routes_tree = format!(
        "createElement(\n      Routes,\n      null,\n{}\n    )",
        entries.join(",\n")
    );

    format!(
        "import {{ createElement }} from \"react\";\n\
         import {{ BrowserRouter, Routes, Route }} from \"react-router-dom\";\n\
         {imports}\n\
         export default function GlimpseRouter() {{\n  \
         return createElement(\n    \
         BrowserRouter,\n    \
         null,\n    \
         {tree}\n  \
         );\n\
         }}\n",
        imports = imports(routes, layout),
        tree = wrap_layout(&routes_tree, layout),
    )
}

fn hash(routes: &[RouteDefinition], layout: Option<&str>) -> String {
    let table: Vec<String> = routes
        .iter()
        .enumerate()
        .map(|(i, route)| format!("  {{ path: {}, component: Route{i} }}", js_string(&route.path)))
        .collect();

    format!(
        "import {{ createElement, useEffect, useState }} from \"react\";\n\
         {imports}\n\
         const routes = [\n{table}\n];\n\n\
         function currentPath() {{\n  \
         return window.location.hash.slice(1) || \"/\";\n\
         }}\n\n\
         function match(pattern, path) {{\n  \
         const want = pattern.split(\"/\").filter(Boolean);\n  \
         const have = path.split(\"?\")[0].split(\"/\").filter(Boolean);\n  \
         const params = {{}};\n  \
         for (let i = 0; i < want.length; i++) {{\n    \
         if (want[i] === \"*\") return params;\n    \
         if (want[i].startsWith(\":\")) {{\n      \
         if (have[i] === undefined) return null;\n      \
         params[want[i].slice(1)] = decodeURIComponent(have[i]);\n    \
         }} else if (want[i] !== have[i]) {{\n      \
         return null;\n    \
         }}\n  \
         }}\n  \
         return want.length === have.length ? params : null;\n\
         }}\n\n\
         export default function GlimpseRouter() {{\n  \
         const [path, setPath] = useState(currentPath);\n  \
         useEffect(() => {{\n    \
         const onChange = () => setPath(currentPath());\n    \
         window.addEventListener(\"hashchange\", onChange);\n    \
         return () => window.removeEventListener(\"hashchange\", onChange);\n  \
         }}, []);\n  \
         for (const route of routes) {{\n    \
         const params = match(route.path, path);\n    \
         if (params) return {matched};\n  \
         }}\n  \
         return null;\n\
         }}\n",
        imports = imports(routes, layout),
        table = table.join(",\n"),
        matched = wrap_layout("createElement(route.component, { params })", layout),
    )
}
