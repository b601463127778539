use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "kubetop",
    version,
    about = "Live terminal table of cluster nodes, services, deployments and pods."
)]
pub struct CliArgs {
    /// Only show resources in this namespace
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Path to the kubeconfig file (defaults to $KUBECONFIG, then ~/.kube/config)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// kubeconfig context to use instead of the current one
    #[arg(long)]
    pub context: Option<String>,

    /// Refresh interval in milliseconds
    #[arg(long)]
    pub refresh_ms: Option<u64>,

    /// What to do when listing a resource fails
    #[arg(long, value_enum)]
    pub on_fetch_error: Option<FetchErrorPolicy>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Write logs to this file; logs are discarded otherwise
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchErrorPolicy {
    /// Exit with an error
    #[default]
    Exit,
    /// Keep showing the last good snapshot, marked as stale
    Stale,
}
