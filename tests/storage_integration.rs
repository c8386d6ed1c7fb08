use std::env;
use uuid::Uuid;

use rust_leads_api::data::db::Database;
use rust_leads_api::data::db_storage::PgLeadStore;
use rust_leads_api::models::{LeadPatch, LeadStatus, LeadTimeline, NewLead, PropertyType};
use rust_leads_api::query_builder::{LeadFilter, SortOrder};
use rust_leads_api::store::LeadStore;

async fn connect() -> anyhow::Result<PgLeadStore> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url, 5).await?;
    Ok(PgLeadStore::new(db.pool))
}

fn sample(email: &str) -> NewLead {
    NewLead {
        name: "Storage Smoke".to_string(),
        email: email.to_string(),
        phone: Some("5550100199".to_string()),
        city: "Testville".to_string(),
        property_type: PropertyType::Townhouse,
        status: LeadStatus::New,
        timeline: LeadTimeline::ThreeSixMonths,
        notes: None,
        tags: vec!["smoke".to_string(), "test".to_string()],
    }
}

/// Integration smoke test for the PostgreSQL lead store.
/// Marked ignored to avoid running against production by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn lead_lifecycle_smoke_test() -> anyhow::Result<()> {
    let store = connect().await?;

    // Unique email so repeated runs do not collide
    let email = format!("smoke-{}@example.com", Uuid::new_v4().simple());
    let created = store.create(&sample(&email)).await?;
    assert_eq!(created.tags, vec!["smoke", "test"]);

    let duplicate = store.create(&sample(&email)).await.unwrap_err();
    assert!(duplicate.is_conflict());

    let updated = store
        .update(created.id, &LeadPatch::status(LeadStatus::Showing))
        .await?;
    assert_eq!(updated.status, LeadStatus::Showing);
    assert_eq!(updated.phone, created.phone);
    assert!(updated.updated_at > created.updated_at);

    let filter = LeadFilter {
        query: Some(email.to_uppercase()),
        status: Some(LeadStatus::Showing),
        ..Default::default()
    };
    assert_eq!(store.count(&filter).await?, 1);
    let found = store
        .find_many(&filter, SortOrder::UpdatedAtDesc, 0, Some(10))
        .await?;
    assert_eq!(found[0].id, created.id);

    assert!(!store.upsert_by_email(&sample(&email)).await?.was_created());
    assert!(store.distinct_cities().await?.contains(&"Testville".to_string()));

    store.delete(created.id).await?;
    assert!(store.find_by_id(created.id).await?.is_none());
    assert!(store.delete(created.id).await.unwrap_err().is_not_found());

    Ok(())
}
