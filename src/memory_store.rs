use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Lead, LeadPatch, NewLead, UpsertOutcome};
use crate::query_builder::{LeadFilter, SortOrder};
use crate::store::{email_conflict, lead_not_found, LeadStore};

/// Process-local lead storage.
///
/// Used for `LEADS_STORE=memory` and by the endpoint tests. Applies the same
/// uniqueness and not-found rules as [`crate::db_storage::PgLeadStore`].
#[derive(Default)]
pub struct InMemoryLeadStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    leads: HashMap<Uuid, Lead>,
    /// Newest `updated_at` ever written; never moves backwards.
    latest: Option<DateTime<Utc>>,
}

impl MemoryState {
    /// Next write timestamp, strictly after every earlier one.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.latest {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        self.latest = Some(next);
        next
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.leads
            .values()
            .any(|l| Some(l.id) != except && l.email == email)
    }

    fn insert(&mut self, lead: &NewLead) -> Lead {
        let now = self.tick();
        let created = Lead {
            id: Uuid::new_v4(),
            name: lead.name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            city: lead.city.clone(),
            property_type: lead.property_type,
            status: lead.status,
            timeline: lead.timeline,
            notes: lead.notes.clone(),
            tags: lead.tags.clone(),
            created_at: now,
            updated_at: now,
        };
        self.leads.insert(created.id, created.clone());
        created
    }
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_leads(leads: &mut [Lead], order: SortOrder) {
    match order {
        SortOrder::UpdatedAtDesc => leads.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.cmp(&a.id))
        }),
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn count(&self, filter: &LeadFilter) -> Result<i64, AppError> {
        let state = self.state.read().await;
        Ok(state.leads.values().filter(|l| filter.matches(l)).count() as i64)
    }

    async fn find_many(
        &self,
        filter: &LeadFilter,
        order: SortOrder,
        offset: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Lead>, AppError> {
        let state = self.state.read().await;
        let mut matching: Vec<Lead> = state
            .leads
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        sort_leads(&mut matching, order);

        let skip = offset.max(0) as usize;
        let take = limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(matching.into_iter().skip(skip).take(take).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        Ok(self.state.read().await.leads.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Lead>, AppError> {
        let state = self.state.read().await;
        Ok(state.leads.values().find(|l| l.email == email).cloned())
    }

    async fn create(&self, lead: &NewLead) -> Result<Lead, AppError> {
        let mut state = self.state.write().await;
        if state.email_taken(&lead.email, None) {
            return Err(email_conflict(&lead.email));
        }
        Ok(state.insert(lead))
    }

    async fn update(&self, id: Uuid, patch: &LeadPatch) -> Result<Lead, AppError> {
        let mut state = self.state.write().await;

        // A missing row wins over an email collision
        if !state.leads.contains_key(&id) {
            return Err(lead_not_found(id));
        }
        if let Some(email) = &patch.email {
            if state.email_taken(email, Some(id)) {
                return Err(email_conflict(email));
            }
        }

        let now = state.tick();
        let lead = state
            .leads
            .get_mut(&id)
            .ok_or_else(|| lead_not_found(id))?;
        patch.apply_to(lead);
        lead.updated_at = now;
        Ok(lead.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.state
            .write()
            .await
            .leads
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| lead_not_found(id))
    }

    async fn upsert_by_email(&self, lead: &NewLead) -> Result<UpsertOutcome, AppError> {
        // Check and insert under one write lock so concurrent upserts of the
        // same email create at most one lead.
        let mut state = self.state.write().await;
        if state.email_taken(&lead.email, None) {
            return Ok(UpsertOutcome::Existing);
        }
        Ok(UpsertOutcome::Created(state.insert(lead)))
    }

    async fn distinct_cities(&self) -> Result<Vec<String>, AppError> {
        let state = self.state.read().await;
        let cities: BTreeSet<String> = state.leads.values().map(|l| l.city.clone()).collect();
        Ok(cities.into_iter().collect())
    }
}
