use thiserror::Error;

/// Run-level failures that abort the scan with a nonzero exit.
///
/// Per-candidate enrichment errors never reach this type; they are logged
/// and dropped at the worker boundary.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("configuration: {0}")]
    Config(String),

    /// A discovery feed failed entirely. No partial-source tolerance at
    /// this layer.
    #[error("discovery feed fetch failed: {0:#}")]
    Discovery(anyhow::Error),

    /// The cooldown state could not be written back. Alerts were already
    /// emitted by the time this surfaces; the risk is duplicate alerts on
    /// the next run.
    #[error("cooldown state persist failed: {0:#}")]
    Persist(anyhow::Error),
}
