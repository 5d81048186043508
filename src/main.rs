use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use marketplace_xref::config::{DEFAULT_PLUGINS_ROOT, DEFAULT_REGISTRY_PATH};
use marketplace_xref::{Emit, Reporter, Status, XrefConfig};

#[derive(Parser)]
#[command(
    name = "marketplace-xref",
    version,
    about = "Cross-reference validator for plugin marketplaces"
)]
struct Cli {
    /// Workspace directory containing the registry and plugins root
    #[arg(short = 'C', long = "dir", default_value = ".")]
    dir: PathBuf,

    /// Registry path, relative to the workspace directory
    #[arg(long, default_value = DEFAULT_REGISTRY_PATH)]
    registry: PathBuf,

    /// Plugins root, relative to the workspace directory
    #[arg(long, default_value = DEFAULT_PLUGINS_ROOT)]
    plugins_root: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Show project information
    #[arg(long)]
    about: bool,
}

/// Output format for validation results.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum Format {
    /// Streamed INFO/WARNING/ERROR lines and a summary (default)
    #[default]
    Text,
    /// A single JSON report on stdout
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if cli.about {
        print_about();
        return;
    }

    let config = XrefConfig::default()
        .with_base_dir(cli.dir)
        .with_registry_path(cli.registry)
        .with_plugins_root(cli.plugins_root);

    let status = match cli.format {
        Format::Text => run_text(&config),
        Format::Json => run_json(&config),
    };
    std::process::exit(status.exit_code());
}

fn run_text(config: &XrefConfig) -> Status {
    println!("=== Cross-Reference Validation ===\n");
    let mut reporter = Reporter::new(Emit::Console);
    let status = marketplace_xref::run(config, &mut reporter);
    println!("\n{}", reporter.summary());
    status
}

fn run_json(config: &XrefConfig) -> Status {
    let mut reporter = Reporter::silent();
    let status = marketplace_xref::run(config, &mut reporter);

    let report = serde_json::json!({
        "registry": config.registry_path.display().to_string(),
        "errors": reporter.error_count(),
        "warnings": reporter.warning_count(),
        "diagnostics": reporter.diagnostics(),
    });
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("ERROR: cannot render report: {e}");
            return Status::Failure;
        }
    }
    status
}

fn print_about() {
    println!(
        "marketplace-xref: Plugin Marketplace Cross-Reference Validator\n\
         ├─ version:    {}\n\
         └─ licence:    {} https://www.apache.org/licenses/LICENSE-2.0",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_LICENSE"),
    );
}
