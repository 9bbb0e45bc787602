use anyhow::Context;
use clap::Parser;
use sentinel_bridge::{Bridge, BridgeConfig, Dispatcher};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sentinel-bridge",
    version,
    about = "Framed scan bridge: URLs to a classifier, files to a sandbox"
)]
struct Cli {
    #[arg(short, long, value_name = "FILE", help = "TOML configuration file")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Sandbox executable (overrides config)")]
    sandbox: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Scan history file (overrides config)")]
    history: Option<PathBuf>,

    #[arg(
        long,
        default_value_t = false,
        help = "Answer undecodable payloads with an ERROR response instead of exiting"
    )]
    recover_bad_frames: bool,

    #[arg(long, default_value_t = false, help = "Validate configuration and exit")]
    check_config: bool,

    // Browsers launch native hosts with the caller origin and, on Windows,
    // a parent window handle.
    #[arg(hide = true)]
    origin: Option<String>,

    #[arg(long, hide = true)]
    parent_window: Option<String>,
}

fn load_config(cli: &Cli) -> anyhow::Result<BridgeConfig> {
    let mut config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    }
    .apply_env();

    if let Some(sandbox) = &cli.sandbox {
        config.sandbox.executable = sandbox.clone();
    }
    if let Some(history) = &cli.history {
        config.history.path = Some(history.clone());
    }

    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli).context("invalid configuration")?;
    if cli.check_config {
        tracing::info!("configuration is valid");
        return Ok(());
    }

    tracing::info!(
        origin = ?cli.origin,
        sandbox = %config.sandbox.executable.display(),
        classifier = %config.classifier.endpoint,
        authenticated = config.classifier.api_token.is_some(),
        "bridge starting"
    );

    let dispatcher = Dispatcher::from_config(&config).context("failed to build dispatcher")?;
    let stats = Bridge::new(tokio::io::stdin(), tokio::io::stdout(), dispatcher)
        .with_max_frame_size(config.max_frame_size)
        .recover_payload_errors(cli.recover_bad_frames)
        .run()
        .await?;

    tracing::info!(
        requests = stats.requests,
        analyzed = stats.analyzed,
        errors = stats.errors,
        "bridge stopped"
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    // stdout carries the framed channel; logs go to stderr only.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!(error = %format!("{e:#}"), "bridge terminated");
        std::process::exit(1);
    }
}
