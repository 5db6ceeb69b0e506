//! Stylesheets injected into every preview.

/// Resets plus the default colour variables, with a dark-mode block.
pub const BASE_CSS: &str = r#"*,*::before,*::after{box-sizing:border-box}
html{-webkit-text-size-adjust:100%;line-height:1.5;tab-size:4}
body{margin:0;min-height:100vh;font-family:var(--glimpse-font);background:var(--glimpse-background);color:var(--glimpse-foreground)}
img,svg,video,canvas{display:block;max-width:100%}
button,input,select,textarea{font:inherit;color:inherit}
:root{--glimpse-font:ui-sans-serif,system-ui,-apple-system,"Segoe UI",Roboto,sans-serif;--glimpse-background:#ffffff;--glimpse-foreground:#0f172a;--glimpse-muted:#64748b;--glimpse-border:#e2e8f0;--glimpse-accent:#2563eb}
@media (prefers-color-scheme:dark){:root{--glimpse-background:#0b1120;--glimpse-foreground:#e2e8f0;--glimpse-muted:#94a3b8;--glimpse-border:#1e293b;--glimpse-accent:#60a5fa}}"#;

/// Neutralizes the default background so a custom theme shows through.
pub const THEME_OVERRIDE_CSS: &str = r#":root{--glimpse-background:transparent;--glimpse-foreground:inherit}
@media (prefers-color-scheme:dark){:root{--glimpse-background:transparent;--glimpse-foreground:inherit}}
body{background:unset;color:unset}"#;

/// Keep CSS from terminating its own `<style>` element.
pub fn escape_style_text(css: &str) -> String {
    css.replace("</style", "<\\/style").replace("</STYLE", "<\\/STYLE")
}

pub fn style_tag(role: &str, css: &str) -> String {
    format!(
        "<style data-glimpse=\"{role}\">{}</style>",
        escape_style_text(css)
    )
}
