//! Command-line interface definition.
//!
//! - `glimpse detect` - report project layout, framework, entry and routes
//! - `glimpse inject` - inject a compiled bundle into an HTML template
//! - `glimpse serve` - host the isolated-delivery endpoints

use clap::{Args, Parser, Subcommand, ValueEnum};
use glimpse_core::Framework;
use std::path::{Path, PathBuf};

/// Glimpse - instant previews for in-memory projects
#[derive(Parser, Debug)]
#[command(
    name = "glimpse",
    version,
    about = "Instant previews for in-memory projects",
    long_about = "Glimpse detects how a project should be mounted, injects compiled bundles\n\
                  into its HTML and serves previews from an isolated origin."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect project root, framework, entry point and routes
    Detect(DetectArgs),

    /// Inject a compiled bundle into an HTML template
    ///
    /// Strips the template's original entry script and stylesheet links,
    /// adds base styles, the compiled CSS and the bundle loader.
    Inject(InjectArgs),

    /// Serve previews for isolated delivery
    ///
    /// Accepts `PUT /__glimpse__/files?build=<id>` and serves the stored
    /// files from `/__glimpse__/preview/` with the marker header.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Project directory
    #[arg(default_value = ".", value_name = "DIR")]
    pub dir: PathBuf,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InjectArgs {
    /// HTML template to inject into
    #[arg(value_name = "TEMPLATE")]
    pub template: PathBuf,

    /// Compiled JavaScript bundle
    #[arg(long, value_name = "FILE")]
    pub code: PathBuf,

    /// Compiled CSS
    #[arg(long, value_name = "FILE")]
    pub css: Option<PathBuf>,

    /// Framework the bundle was built for
    #[arg(long, value_enum, default_value = "unknown")]
    pub framework: FrameworkArg,

    /// The project defines its own color theme
    #[arg(long)]
    pub custom_theme: bool,

    /// CSS compilation failed; rely on the utility-CSS runtime
    #[arg(long)]
    pub css_failed: bool,

    /// Write the document here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on (0 picks a free port)
    #[arg(short, long, default_value_t = 7878)]
    pub port: u16,

    /// Directory to read glimpse.toml from
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub config_dir: PathBuf,
}

impl InjectArgs {
    /// Configuration lives next to the template.
    pub fn config_dir(&self) -> &Path {
        self.template
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
    }
}

impl Command {
    /// Directory whose `glimpse.toml` this command reads.
    pub fn config_dir(&self) -> &Path {
        match self {
            Command::Detect(args) => &args.dir,
            Command::Inject(args) => args.config_dir(),
            Command::Serve(args) => &args.config_dir,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameworkArg {
    React,
    Next,
    Preact,
    Solid,
    Vue,
    Svelte,
    Astro,
    Vanilla,
    Unknown,
}

impl From<FrameworkArg> for Framework {
    fn from(arg: FrameworkArg) -> Self {
        match arg {
            FrameworkArg::React => Framework::React,
            FrameworkArg::Next => Framework::Next,
            FrameworkArg::Preact => Framework::Preact,
            FrameworkArg::Solid => Framework::Solid,
            FrameworkArg::Vue => Framework::Vue,
            FrameworkArg::Svelte => Framework::Svelte,
            FrameworkArg::Astro => Framework::Astro,
            FrameworkArg::Vanilla => Framework::Vanilla,
            FrameworkArg::Unknown => Framework::Unknown,
        }
    }
}
