use std::sync::Arc;

use tracing::{info, instrument};

use super::report;
use crate::api::{AnalyticsSummary, ConsoleBackend};
use crate::error::BoardError;
use crate::notify::Notifier;

/// Platform analytics page (admin console). Read-only; nothing is held locally.
#[derive(Clone)]
pub struct AnalyticsBoard {
    backend: Arc<dyn ConsoleBackend>,
    notifier: Notifier,
}

impl AnalyticsBoard {
    pub fn new(backend: Arc<dyn ConsoleBackend>, notifier: Notifier) -> Self {
        Self { backend, notifier }
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<AnalyticsSummary, BoardError> {
        let summary = self
            .backend
            .analytics_summary()
            .await
            .map_err(|e| report(&self.notifier, "load analytics", e))?;
        info!(
            total_orders = summary.total_orders,
            pending_vendors = summary.pending_vendors,
            "Analytics loaded"
        );
        Ok(summary)
    }
}
