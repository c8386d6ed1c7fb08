use futures::future::try_join_all;
use serde_json::Value;

use crate::errors::{AppError, ResultExt};
use crate::models::NewLead;
use crate::store::LeadStore;
use crate::validation::validate_create;

/// Counts from one bulk import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub received: usize,
    /// Rows skipped for failing validation.
    pub invalid: usize,
    /// Rows that produced a new lead.
    pub created: usize,
    /// Valid rows whose email was already present.
    pub existing: usize,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        format!("Successfully imported {} new leads.", self.created)
    }
}

/// Validates raw rows and inserts the new ones.
///
/// Invalid rows are logged and skipped. Valid rows are upserted by email
/// concurrently; any store failure fails the whole batch.
pub async fn import_rows(store: &dyn LeadStore, rows: &[Value]) -> Result<ImportSummary, AppError> {
    let mut summary = ImportSummary {
        received: rows.len(),
        ..Default::default()
    };

    let mut valid: Vec<NewLead> = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        match validate_create(row) {
            Ok(lead) => valid.push(lead),
            Err(errors) => {
                summary.invalid += 1;
                tracing::warn!("Skipping invalid import row {}: {}", idx + 1, errors);
            }
        }
    }

    let outcomes = try_join_all(valid.iter().map(|lead| store.upsert_by_email(lead)))
        .await
        .context("Bulk import aborted")?;

    summary.created = outcomes.iter().filter(|o| o.was_created()).count();
    summary.existing = outcomes.len() - summary.created;

    tracing::info!(
        "Import finished: {} rows, {} created, {} existing, {} invalid",
        summary.received,
        summary.created,
        summary.existing,
        summary.invalid
    );

    Ok(summary)
}
