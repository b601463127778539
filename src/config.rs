use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::{CliArgs, FetchErrorPolicy};
use crate::model::{NamespaceScope, Palette};

const DEFAULT_REFRESH_MS: u64 = 500;
const MIN_REFRESH_MS: u64 = 100;
const DEFAULT_SYSTEM_NAMESPACE: &str = "kube-system";

/// Everything the dashboard needs to know, fixed at startup.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    pub scope: NamespaceScope,
    pub system_namespace: String,
    pub palette: Palette,
    pub refresh: Duration,
    pub on_fetch_error: FetchErrorPolicy,
    pub source: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scope: NamespaceScope::All,
            system_namespace: DEFAULT_SYSTEM_NAMESPACE.to_string(),
            palette: Palette::default(),
            refresh: Duration::from_millis(DEFAULT_REFRESH_MS),
            on_fetch_error: FetchErrorPolicy::Exit,
            source: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct KubetopConfigFile {
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default, alias = "refresh")]
    refresh_ms: Option<u64>,
    #[serde(default)]
    system_namespace: Option<String>,
    #[serde(default)]
    on_fetch_error: Option<FetchErrorPolicy>,
}

impl Settings {
    /// Reads the optional config file and layers the command line over it.
    pub fn load(args: &CliArgs) -> Result<Self> {
        let Some(path) = discover_config_path() else {
            return Ok(Self::merge(args, KubetopConfigFile::default(), None));
        };

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let parsed = parse_config(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(Self::merge(args, parsed, Some(path)))
    }

    fn merge(args: &CliArgs, file: KubetopConfigFile, source: Option<PathBuf>) -> Self {
        let namespace = args
            .namespace
            .clone()
            .or(file.namespace)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let refresh_ms = args
            .refresh_ms
            .or(file.refresh_ms)
            .unwrap_or(DEFAULT_REFRESH_MS)
            .max(MIN_REFRESH_MS);
        let system_namespace = file
            .system_namespace
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_NAMESPACE.to_string());

        Self {
            scope: NamespaceScope::from_filter(namespace.as_deref()),
            system_namespace,
            palette: Palette::default(),
            refresh: Duration::from_millis(refresh_ms),
            on_fetch_error: args
                .on_fetch_error
                .or(file.on_fetch_error)
                .unwrap_or_default(),
            source,
        }
    }
}

fn parse_config(raw: &str) -> Result<KubetopConfigFile> {
    if raw.trim().is_empty() {
        return Ok(KubetopConfigFile::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("KUBETOP_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [PathBuf::from("kubetop.yaml"), PathBuf::from("kubetop.yml")];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    let home = std::env::var("HOME").ok()?;
    let candidate = PathBuf::from(home).join(".config/kubetop/config.yaml");
    candidate.exists().then_some(candidate)
}

/// `--kubeconfig`, then `$KUBECONFIG`, then `~/.kube/config`.
pub fn kubeconfig_path(args: &CliArgs) -> Result<PathBuf> {
    resolve_kubeconfig_path(
        args.kubeconfig.as_deref(),
        std::env::var("KUBECONFIG").ok().as_deref(),
        std::env::var("HOME").ok().as_deref(),
    )
}

fn resolve_kubeconfig_path(
    explicit: Option<&Path>,
    env_value: Option<&str>,
    home: Option<&str>,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = env_value.map(str::trim).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let home = home
        .filter(|value| !value.trim().is_empty())
        .context("cannot locate kubeconfig: HOME is not set and KUBECONFIG is empty")?;
    Ok(PathBuf::from(home).join(".kube").join("config"))
}
