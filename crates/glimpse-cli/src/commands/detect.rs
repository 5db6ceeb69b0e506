//! `glimpse detect`: report how a project would be previewed.

use glimpse_config::ConfigDiscovery;
use glimpse_core::{ProjectLayout, RouterAnalysis, analyze_routing, detect_project};
use serde::Serialize;

use crate::cli::DetectArgs;
use crate::error::Result;
use crate::loader::load_dir;
use crate::ui;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectReport {
    pub files: usize,
    pub layout: ProjectLayout,
    pub routing: RouterAnalysis,
}

/// Load the directory and run detection without printing.
pub fn detect(args: &DetectArgs) -> Result<DetectReport> {
    let config = ConfigDiscovery::new(&args.dir).load()?;
    let files = load_dir(&args.dir)?;
    let layout = detect_project(&files);
    let routing = analyze_routing(&files, &config.router);
    Ok(DetectReport {
        files: files.len(),
        layout,
        routing,
    })
}

pub async fn execute(args: DetectArgs) -> Result<()> {
    let report = detect(&args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let layout = &report.layout;
    ui::field("files", report.files);
    ui::field("prefix", layout.prefix.as_deref().unwrap_or("(none)"));
    ui::field("framework", layout.framework);
    ui::field("template", layout.html_template.as_deref().unwrap_or("(generated)"));

    match &layout.entry {
        Some(entry) => ui::field("entry", entry),
        None => {
            ui::field("entry", "(none)");
            ui::warning("No entry point found; the project may be incomplete");
        }
    }

    let routing = &report.routing;
    if let Some(existing) = &routing.existing {
        ui::field("router", existing.package());
    } else if routing.needs_router {
        ui::field("router", "generated");
    } else {
        ui::field("router", "(not needed)");
    }
    for route in &routing.routes {
        println!("    {:<20} {}", route.path, route.component);
    }
    Ok(())
}
