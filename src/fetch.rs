use async_trait::async_trait;
use k8s_openapi::jiff::Timestamp;
use std::sync::Arc;
use tracing::debug;

use crate::config::Settings;
use crate::error::{DashboardError, Result};
use crate::k8s::ResourceSource;
use crate::model::{ResourceKind, Row};
use crate::rows::{self, RowContext};

/// One independent producer of display rows.
#[async_trait]
pub trait Fetcher: Send + Sync {
    fn kind(&self) -> ResourceKind;

    async fn fetch(&self) -> Result<Vec<Row>>;
}

/// Lists one resource kind from a [`ResourceSource`] and derives its rows.
pub struct ResourceFetcher {
    kind: ResourceKind,
    source: Arc<dyn ResourceSource>,
    settings: Arc<Settings>,
    node_prefix: Arc<str>,
}

impl ResourceFetcher {
    pub fn new(
        kind: ResourceKind,
        source: Arc<dyn ResourceSource>,
        settings: Arc<Settings>,
        node_prefix: Arc<str>,
    ) -> Self {
        Self {
            kind,
            source,
            settings,
            node_prefix,
        }
    }

    /// One fetcher per resource kind, all sharing the same source and settings.
    pub fn all(
        source: Arc<dyn ResourceSource>,
        settings: Arc<Settings>,
        node_prefix: &str,
    ) -> Vec<Arc<dyn Fetcher>> {
        let node_prefix: Arc<str> = Arc::from(node_prefix);
        ResourceKind::ALL
            .into_iter()
            .map(|kind| {
                Arc::new(Self::new(
                    kind,
                    Arc::clone(&source),
                    Arc::clone(&settings),
                    Arc::clone(&node_prefix),
                )) as Arc<dyn Fetcher>
            })
            .collect()
    }
}

#[async_trait]
impl Fetcher for ResourceFetcher {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn fetch(&self) -> Result<Vec<Row>> {
        let kind = self.kind;
        let fetch_error = |source| DashboardError::Fetch { kind, source };
        let ctx = RowContext {
            scope: &self.settings.scope,
            system_namespace: &self.settings.system_namespace,
            palette: &self.settings.palette,
            node_prefix: &self.node_prefix,
            now: Timestamp::now(),
        };

        let rows = match kind {
            ResourceKind::Node => {
                rows::node_rows(&self.source.nodes().await.map_err(fetch_error)?, &ctx)
            }
            ResourceKind::Service => {
                rows::service_rows(&self.source.services().await.map_err(fetch_error)?, &ctx)
            }
            ResourceKind::Deployment => rows::deployment_rows(
                &self.source.deployments().await.map_err(fetch_error)?,
                &ctx,
            ),
            ResourceKind::Pod => {
                rows::pod_rows(&self.source.pods().await.map_err(fetch_error)?, &ctx)
            }
        };

        debug!(%kind, rows = rows.len(), "fetched");
        Ok(rows)
    }
}
