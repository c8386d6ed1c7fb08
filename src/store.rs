//! Persistence gateway for the `leads` relation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Lead, LeadPatch, NewLead, UpsertOutcome};
use crate::query_builder::{LeadFilter, SortOrder};

/// Generic CRUD access to leads, keyed by id and by unique email.
///
/// Implementations report a missing id as [`AppError::NotFound`] and an email
/// collision as [`AppError::Conflict`]; anything else is a store failure.
/// Every mutation refreshes `updated_at`.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn count(&self, filter: &LeadFilter) -> Result<i64, AppError>;

    /// `limit = None` returns every match from `offset` on.
    async fn find_many(
        &self,
        filter: &LeadFilter,
        order: SortOrder,
        offset: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Lead>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Lead>, AppError>;

    async fn create(&self, lead: &NewLead) -> Result<Lead, AppError>;

    async fn update(&self, id: Uuid, patch: &LeadPatch) -> Result<Lead, AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    /// Inserts `lead` unless its email already exists; an existing record is
    /// never modified.
    async fn upsert_by_email(&self, lead: &NewLead) -> Result<UpsertOutcome, AppError>;

    /// Distinct cities across all leads, sorted.
    async fn distinct_cities(&self) -> Result<Vec<String>, AppError>;
}

pub(crate) fn lead_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Lead with id {} not found", id))
}

pub(crate) fn email_conflict(email: &str) -> AppError {
    AppError::Conflict(format!("A lead with email {} already exists", email))
}
