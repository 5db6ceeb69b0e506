//! `glimpse inject`: merge a compiled bundle into an HTML template.

use glimpse_config::ConfigDiscovery;
use glimpse_core::{BundleInjector, InjectOptions, InjectOutput};
use std::path::Path;

use crate::cli::InjectArgs;
use crate::error::{Result, ResultExt};
use crate::ui;

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_path(path)
}

/// Run the injection without writing anything.
pub fn inject(args: &InjectArgs) -> Result<InjectOutput> {
    let config = ConfigDiscovery::new(args.config_dir()).load()?;

    let template = read(&args.template)?;
    let code = read(&args.code)?;
    let css = match &args.css {
        Some(path) => read(path)?,
        None => String::new(),
    };

    let injector = BundleInjector::new(config.inject.clone()).with_hmr(config.hmr.namespace.clone());
    Ok(injector.inject(
        &template,
        &InjectOptions {
            code: &code,
            css: &css,
            framework: args.framework.into(),
            custom_theme: args.custom_theme,
            css_failed: args.css_failed,
            prerendered: None,
        },
    ))
}

pub async fn execute(args: InjectArgs) -> Result<()> {
    let output = inject(&args)?;
    let report = &output.report;

    for reason in &report.cdn_reasons {
        ui::info(&format!("utility-CSS runtime injected: {reason}"));
    }
    let unmatched: Vec<_> = report.unmatched_patterns().collect();
    if !unmatched.is_empty() {
        tracing::debug!(?unmatched, "strip patterns without a match");
    }

    match &args.out {
        Some(out) => {
            std::fs::write(out, &output.html).with_path(out)?;
            ui::success(&format!(
                "Wrote {} ({})",
                out.display(),
                ui::format_size(output.html.len() as u64)
            ));
        }
        None => print!("{}", output.html),
    }
    Ok(())
}
