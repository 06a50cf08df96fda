//! # Command Line Interface
//!
//! Offline tooling around the injection plugin. `render` runs one listener
//! build from a YAML description and prints the filters that ended up on it.

pub mod output;
pub mod render;

use crate::config::{ObservabilityConfig, PluginConfig};
use crate::domain::EncodingCapability;
use crate::observability::{init_logging, log_config_info};
use crate::xds::filters::injection::NetworkPolicyPlugin;
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use output::{print_output, OutputFormat};
use render::{render, validate_request, RenderRequest};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "netpolicy-injector")]
#[command(about = "Network-policy filter injection for Envoy sidecar listeners")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one listener build and print the injected filters
    Render(RenderArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Listener build request (YAML)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Plugin configuration (YAML); environment variables are used otherwise
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Force a payload encoding (typed, struct)
    #[arg(short, long)]
    pub encoding: Option<EncodingCapability>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

pub fn run_cli() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let cli = Cli::parse();
    initialise_logging(cli.verbose, cli.json_logs)?;

    match cli.command {
        Commands::Render(args) => run_render(&args),
    }
}

fn initialise_logging(verbose: bool, json_logs: bool) -> anyhow::Result<()> {
    let mut config = ObservabilityConfig::from_env();
    if verbose {
        config.log_level = "debug".to_string();
    }
    config.json_logging |= json_logs;

    init_logging(&config).context("Failed to initialise logging")
}

fn run_render(args: &RenderArgs) -> anyhow::Result<()> {
    let config = load_plugin_config(args.config.as_deref(), args.encoding)?;
    log_config_info(&config);

    let plugin = NetworkPolicyPlugin::new(config).context("Invalid plugin configuration")?;
    let request = load_request(&args.input)?;

    let report = render(&plugin, &request)
        .with_context(|| format!("Failed to render listener '{}'", request.listener))?;
    info!(
        listener = %report.listener,
        hook = %report.hook,
        chains_injected = report.chains_injected,
        "Rendered listener"
    );

    print_output(&report, args.output)
}

/// Resolve the plugin configuration from a file or the environment, then
/// apply the encoding override.
pub fn load_plugin_config(
    path: Option<&Path>,
    encoding: Option<EncodingCapability>,
) -> anyhow::Result<PluginConfig> {
    let mut config = match path {
        Some(path) => {
            let yaml = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            PluginConfig::from_yaml_str(&yaml)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        }
        None => PluginConfig::from_env().context("Invalid configuration in environment")?,
    };

    if encoding.is_some() {
        config.encoding_override = encoding;
    }

    Ok(config)
}

/// Read and check a render request
pub fn load_request(path: &Path) -> anyhow::Result<RenderRequest> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    let request = RenderRequest::from_yaml_str(&yaml)
        .with_context(|| format!("Invalid request file {}", path.display()))?;
    validate_request(&request)?;
    Ok(request)
}
