use crate::store::MarketStore;
use cm_core::error::{AppError, Result};
use cm_core::models::{generate_id, Report};
use cm_core::traits::{Clock, Collection};
use std::sync::Arc;

pub struct ReportService {
    store: Arc<MarketStore>,
    clock: Arc<dyn Clock>,
}

impl ReportService {
    pub fn new(store: Arc<MarketStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Appends a report. The listing id is stored as given.
    pub async fn submit(&self, listing_id: &str, reason: &str, details: Option<String>) -> Result<Report> {
        if reason.trim().is_empty() {
            return Err(AppError::validation("reason", "Please provide a reason"));
        }
        let report = Report {
            id: generate_id(),
            listing_id: listing_id.to_string(),
            reason: reason.trim().to_string(),
            details: details.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            created_at: self.clock.now(),
        };

        let mut reports: Vec<Report> = self.store.load(Collection::Reports).await?;
        reports.push(report.clone());
        self.store.put(Collection::Reports, &reports).await?;
        tracing::info!(id = %report.id, listing_id, reason = %report.reason, "report submitted");
        Ok(report)
    }

    pub async fn list(&self) -> Vec<Report> {
        self.store.get(Collection::Reports).await
    }

    pub async fn count(&self) -> usize {
        self.list().await.len()
    }

    pub async fn for_listing(&self, listing_id: &str) -> Vec<Report> {
        self.list()
            .await
            .into_iter()
            .filter(|r| r.listing_id == listing_id)
            .collect()
    }
}
