//! Fan-in of concurrently fetched rows into one snapshot, and its ordering.
//!
//! The collector task owns the snapshot while it is being built. The caller
//! waits on two things in order: every fetcher task finishing, then the
//! collector draining the closed channel and handing the snapshot back.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::debug;

use crate::error::Result;
use crate::fetch::Fetcher;
use crate::model::{Row, Snapshot};

pub async fn collect_snapshot(fetchers: &[Arc<dyn Fetcher>]) -> Result<Snapshot> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<Row>>();

    let collector = tokio::spawn(async move {
        let mut snapshot = Snapshot::new();
        while let Some(rows) = rx.recv().await {
            snapshot.extend(rows);
        }
        snapshot
    });

    let mut producers = JoinSet::new();
    for fetcher in fetchers {
        let fetcher = Arc::clone(fetcher);
        let tx = tx.clone();
        producers.spawn(async move {
            let rows = fetcher.fetch().await?;
            debug!(kind = %fetcher.kind(), rows = rows.len(), "sending rows");
            // The receiver only goes away if the collector panicked; that surfaces below.
            let _ = tx.send(rows);
            Ok::<_, crate::error::DashboardError>(())
        });
    }
    drop(tx);

    // Dropping the set on an early return aborts the remaining producers.
    while let Some(joined) = producers.join_next().await {
        joined??;
    }

    let snapshot = collector.await?;
    debug!(rows = snapshot.len(), "snapshot collected");
    Ok(snapshot)
}

/// Orders rows by their rendered fields, compared left to right.
pub fn sort_snapshot(snapshot: &mut Snapshot) {
    snapshot.sort();
}
