//! Binary entrypoint for dojo-bootstrap.
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use dojo_bootstrap::{
    logging::{self, LogSettings},
    BootstrapConfig, HttpConnector, Orchestrator, DEFAULT_BOOTSTRAP_FILE, DEFAULT_ENV_FILE,
};
use dojo_core::context::try_from_yaml_file;

/// Bootstrap a DefectDojo server from a declarative YAML configuration.
///
/// Auth settings (DD_HOST, DD_USER, DD_API_VERSION, DD_VERIFY_SSL, DD_DEBUG)
/// come from the env file; DD_ADMIN_PASSWORD only from the environment.
#[derive(Parser, Debug)]
#[command(name = "dojo-bootstrap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Env file with the DD_* auth variables
    #[arg(long, env = "DD_ENV_FILE", default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Declarative bootstrap document
    #[arg(long, env = "DD_BOOTSTRAP_FILE", default_value = DEFAULT_BOOTSTRAP_FILE)]
    bootstrap_file: PathBuf,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging, including error details
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Authenticate and run every declared step (default)
    Run,

    /// Authenticate, test the client and count existing products and users
    Check,

    /// Parse the bootstrap document and list declared steps, offline
    Validate,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&LogSettings::resolve(cli.debug, cli.quiet))?;

    let config = BootstrapConfig::new(&cli.env_file, &cli.bootstrap_file);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Version => {
            println!("dojo-bootstrap v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Validate => validate(&config),
        Commands::Check => check(&config).await,
        Commands::Run => run(&config).await,
    }
}

async fn run(config: &BootstrapConfig) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(HttpConnector::from_env());
    let report = orchestrator.run(config).await.context("bootstrap aborted")?;

    for step in &report.steps.executed {
        println!(
            "{}: {} item(s), {} created, {} skipped, {} failed",
            step.step,
            step.total(),
            step.created,
            step.skipped,
            step.failed
        );
    }
    for name in &report.steps.failed {
        println!("{name}: failed, see logs");
    }
    for name in &report.steps.ignored {
        println!("{name}: no handler, ignored");
    }
    Ok(())
}

async fn check(config: &BootstrapConfig) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(HttpConnector::from_env());
    let api = orchestrator
        .connect(config)
        .await
        .context("client check failed")?;

    let products = api.list_products().await.context("listing products")?;
    let users = api.list_users().await.context("listing users")?;
    info!(products = products.len(), users = users.len(), "Server reachable");

    println!("products: {}", products.len());
    println!("users: {}", users.len());
    Ok(())
}

fn validate(config: &BootstrapConfig) -> anyhow::Result<()> {
    let document = try_from_yaml_file(&config.bootstrap_file)
        .with_context(|| format!("loading {}", config.bootstrap_file.display()))?;
    let plan = dojo_steps::default_runner().plan(&document)?;

    println!("{}: {} step(s) declared", config.bootstrap_file.display(), plan.len());
    for step in plan {
        let status = if step.handled { "ok" } else { "ignored (no handler)" };
        println!("  {}: {}", step.name, status);
    }
    Ok(())
}
