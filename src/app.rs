use chrono::{DateTime, Local};
use ratatui::backend::Backend;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::aggregate::{collect_snapshot, sort_snapshot};
use crate::cli::FetchErrorPolicy;
use crate::config::Settings;
use crate::error::{DashboardError, Result};
use crate::fetch::Fetcher;
use crate::k8s::ResourceSource;
use crate::model::{ResourceKind, Snapshot};
use crate::rows::common_prefix;
use crate::ui::TableRenderer;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CycleOutcome {
    Fresh { rows: usize },
    Stale,
}

struct LastGood {
    rows: Snapshot,
    refreshed_at: DateTime<Local>,
}

/// Runs fetch, aggregate, sort and render on a fixed interval.
pub struct Dashboard<B: Backend> {
    fetchers: Vec<Arc<dyn Fetcher>>,
    renderer: TableRenderer<B>,
    settings: Arc<Settings>,
    last_good: Option<LastGood>,
}

impl<B: Backend> Dashboard<B> {
    pub fn new(
        fetchers: Vec<Arc<dyn Fetcher>>,
        renderer: TableRenderer<B>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            fetchers,
            renderer,
            settings,
            last_good: None,
        }
    }

    /// Only returns when a cycle fails and the error policy says to stop.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            fetchers = self.fetchers.len(),
            refresh_ms = self.settings.refresh.as_millis() as u64,
            "starting refresh loop"
        );
        loop {
            match self.run_cycle().await? {
                CycleOutcome::Fresh { rows } => debug!(rows, "cycle rendered"),
                CycleOutcome::Stale => debug!("cycle rendered stale snapshot"),
            }
            tokio::time::sleep(self.settings.refresh).await;
        }
    }

    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        match self.snapshot().await {
            Ok(rows) => {
                self.renderer.render(&rows, None)?;
                let count = rows.len();
                self.last_good = Some(LastGood {
                    rows,
                    refreshed_at: Local::now(),
                });
                Ok(CycleOutcome::Fresh { rows: count })
            }
            Err(error) => self.handle_cycle_error(error),
        }
    }

    pub fn restore_terminal(&mut self) -> Result<()> {
        self.renderer.show_cursor()
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let mut rows = collect_snapshot(&self.fetchers).await?;
        sort_snapshot(&mut rows);
        Ok(rows)
    }

    /// The single place that decides whether a failed cycle ends the process.
    fn handle_cycle_error(&mut self, error: DashboardError) -> Result<CycleOutcome> {
        if self.settings.on_fetch_error == FetchErrorPolicy::Exit || !error.is_fetch() {
            return Err(error);
        }

        warn!(%error, "refresh failed, keeping previous snapshot");
        let (rows, notice) = match &self.last_good {
            Some(last) => (
                last.rows.as_slice(),
                format!(
                    "stale since {}: {error}",
                    last.refreshed_at.format("%H:%M:%S")
                ),
            ),
            None => (&[][..], format!("no data yet: {error}")),
        };
        self.renderer.render(rows, Some(&notice))?;
        Ok(CycleOutcome::Stale)
    }
}

/// Lists nodes once and derives the prefix used to shorten pod node names.
pub async fn startup_prefix(source: &dyn ResourceSource) -> Result<String> {
    let nodes = source
        .nodes()
        .await
        .map_err(|source| DashboardError::Fetch {
            kind: ResourceKind::Node,
            source,
        })?;
    let names = nodes
        .iter()
        .filter_map(|node| node.metadata.name.clone())
        .collect::<Vec<_>>();
    let prefix = common_prefix(&names);
    info!(nodes = names.len(), prefix = %prefix, "computed node name prefix");
    Ok(prefix)
}
