//! Imports leads from a CSV file through the bulk import pipeline.
//!
//! Usage: `import_leads_csv <file.csv>`

use std::env;

use rust_leads_api::config::Config;
use rust_leads_api::csv_transfer::parse_csv;
use rust_leads_api::db::Database;
use rust_leads_api::db_storage::PgLeadStore;
use rust_leads_api::import::import_rows;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Usage: import_leads_csv <file.csv>"))?;

    let config = Config::from_env()?;
    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set to import leads"))?;

    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e))?;
    let rows = parse_csv(&text)?;
    tracing::info!("Read {} rows from {}", rows.len(), path);

    let db = Database::new(database_url, config.db_max_connections).await?;
    let store = PgLeadStore::new(db.pool);

    let summary = import_rows(&store, &rows).await?;

    println!("{}", summary.message());
    if summary.invalid > 0 {
        println!("Skipped {} invalid rows (see log for details).", summary.invalid);
    }

    Ok(())
}
