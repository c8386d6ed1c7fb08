//! Seeds the database with a handful of sample leads.
//!
//! Idempotent: leads whose email already exists are left as they are.

use serde_json::{json, Value};

use rust_leads_api::config::Config;
use rust_leads_api::db::Database;
use rust_leads_api::db_storage::PgLeadStore;
use rust_leads_api::models::UpsertOutcome;
use rust_leads_api::store::LeadStore;
use rust_leads_api::validation::validate_create;

fn sample_leads() -> Vec<Value> {
    vec![
        json!({
            "name": "Alice Johnson",
            "email": "alice.j@example.com",
            "phone": "5550100101",
            "city": "San Francisco",
            "propertyType": "Condo",
            "status": "New",
            "timeline": "OneThreeMonths",
            "notes": "Interested in a 2-bedroom condo downtown.",
            "tags": ["downtown", "2-bedroom"]
        }),
        json!({
            "name": "Bob Williams",
            "email": "bob.w@example.com",
            "phone": "5550100102",
            "city": "Oakland",
            "propertyType": "SingleFamily",
            "status": "Contacted",
            "timeline": "ThreeSixMonths",
            "notes": "Looking for a family home with a backyard.",
            "tags": ["family-home", "backyard"]
        }),
        json!({
            "name": "Charlie Brown",
            "email": "charlie.b@example.com",
            "phone": "5550100103",
            "city": "San Jose",
            "propertyType": "Townhouse",
            "status": "Showing",
            "timeline": "ASAP",
            "notes": "First-time homebuyer, needs guidance.",
            "tags": ["first-time-buyer"]
        }),
        json!({
            "name": "Diana Prince",
            "email": "diana.p@example.com",
            "phone": "5550100104",
            "city": "San Francisco",
            "propertyType": "MultiFamily",
            "status": "UnderContract",
            "timeline": "SixPlusMonths",
            "notes": "Real estate investor looking for a duplex.",
            "tags": ["investor", "duplex"]
        }),
        json!({
            "name": "Ethan Hunt",
            "email": "ethan.h@example.com",
            "phone": "5550100105",
            "city": "Berkeley",
            "propertyType": "Land",
            "status": "Closed",
            "timeline": "ASAP",
            "notes": "Wants to build a custom home.",
            "tags": ["custom-build", "land-purchase"]
        }),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set to seed leads"))?;

    let db = Database::new(database_url, config.db_max_connections).await?;
    let store = PgLeadStore::new(db.pool);

    tracing::info!("Start seeding ...");
    for raw in sample_leads() {
        let lead = validate_create(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid sample lead {}: {}", raw["email"], e))?;

        match store.upsert_by_email(&lead).await? {
            UpsertOutcome::Created(created) => {
                tracing::info!("Created lead with id: {}", created.id)
            }
            UpsertOutcome::Existing => tracing::info!("Lead {} already present", lead.email),
        }
    }
    tracing::info!("Seeding finished.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_leads_pass_create_validation() {
        let samples = sample_leads();
        assert_eq!(samples.len(), 5);
        for raw in &samples {
            assert!(raw.get("id").is_none());
            let lead = validate_create(raw).unwrap();
            assert_eq!(lead.phone.as_deref().map(str::len), Some(10));
        }
    }
}
