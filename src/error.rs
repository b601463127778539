use thiserror::Error;

use crate::model::ResourceKind;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("failed to list {kind}: {source}")]
    Fetch {
        kind: ResourceKind,
        #[source]
        source: BoxError,
    },

    #[error("row {index} has {actual} fields, header has {expected}")]
    RowShape {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("terminal error: {0}")]
    Terminal(String),

    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl DashboardError {
    /// Failures the stale-snapshot policy may ride out.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
