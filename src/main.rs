mod aggregate;
mod app;
mod cli;
mod config;
mod error;
mod fetch;
mod k8s;
mod model;
mod rows;
mod ui;

use anyhow::{Context, Result};
use app::Dashboard;
use clap::Parser;
use cli::CliArgs;
use config::Settings;
use fetch::ResourceFetcher;
use k8s::KubeGateway;
use ratatui::backend::CrosstermBackend;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;
use ui::TableRenderer;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, args.log_file.as_deref())?;

    let settings = Arc::new(Settings::load(&args)?);
    if let Some(source) = &settings.source {
        info!(config = %source.display(), "loaded dashboard config");
    }

    let kubeconfig = config::kubeconfig_path(&args)?;
    info!(kubeconfig = %kubeconfig.display(), "using kubeconfig");
    let gateway = Arc::new(
        KubeGateway::connect(&kubeconfig, args.context.clone(), settings.scope.clone()).await?,
    );
    info!(
        context = gateway.context(),
        cluster = gateway.cluster(),
        "cluster selected"
    );

    let node_prefix = app::startup_prefix(gateway.as_ref())
        .await
        .context("failed to list nodes at startup")?;
    let fetchers = ResourceFetcher::all(gateway, Arc::clone(&settings), &node_prefix);
    let renderer = TableRenderer::new(CrosstermBackend::new(io::stdout()))
        .context("failed to open terminal")?;

    let mut dashboard = Dashboard::new(fetchers, renderer, settings);
    let outcome = tokio::select! {
        result = dashboard.run() => result.context("dashboard stopped"),
        signal = tokio::signal::ctrl_c() => signal
            .context("failed to listen for interrupt")
            .map(|()| info!("interrupted")),
    };

    dashboard
        .restore_terminal()
        .context("failed to restore terminal")?;
    outcome
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    // The table owns the terminal, so logs go to a file or nowhere.
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = builder.with_writer(io::sink).try_init();
        }
    }

    Ok(())
}
