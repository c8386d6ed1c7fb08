use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::{AppError, ResultExt};
use crate::models::{Lead, LeadPatch, NewLead, UpsertOutcome};
use crate::query_builder::{LeadFilter, LeadFilterSql, QueryParam, SortOrder};
use crate::store::{lead_not_found, LeadStore};

const LEAD_COLUMNS: &str = "id, name, email, phone, city, property_type, status, timeline, \
                            notes, tags, created_at, updated_at";

/// PostgreSQL storage for leads.
pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Binds rendered filter parameters in placeholder order.
fn bind_filter<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    params: &[QueryParam],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for param in params {
        query = match param {
            QueryParam::Text(value) => query.bind(value.clone()),
            QueryParam::Status(value) => query.bind(*value),
            QueryParam::PropertyType(value) => query.bind(*value),
            QueryParam::Timeline(value) => query.bind(*value),
        };
    }
    query
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn count(&self, filter: &LeadFilter) -> Result<i64, AppError> {
        let (where_sql, params) = LeadFilterSql::new(filter, 0).build();
        let sql = format!("SELECT COUNT(*) FROM leads WHERE {}", where_sql);

        let (total,): (i64,) = bind_filter(sqlx::query_as(&sql), &params)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count leads")?;

        Ok(total)
    }

    async fn find_many(
        &self,
        filter: &LeadFilter,
        order: SortOrder,
        offset: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Lead>, AppError> {
        let (where_sql, params) = LeadFilterSql::new(filter, 0).build();
        let next = params.len();
        let mut sql = format!(
            "SELECT {} FROM leads WHERE {} ORDER BY {}",
            LEAD_COLUMNS,
            where_sql,
            order.sql()
        );
        if limit.is_some() {
            sql.push_str(&format!(" LIMIT ${} OFFSET ${}", next + 1, next + 2));
        } else {
            sql.push_str(&format!(" OFFSET ${}", next + 1));
        }

        let mut query = bind_filter(sqlx::query_as::<_, Lead>(&sql), &params);
        if let Some(limit) = limit {
            query = query.bind(limit);
        }
        let leads = query
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list leads")?;

        Ok(leads)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        let sql = format!("SELECT {} FROM leads WHERE id = $1", LEAD_COLUMNS);
        sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to load lead {}", id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Lead>, AppError> {
        let sql = format!("SELECT {} FROM leads WHERE email = $1", LEAD_COLUMNS);
        sqlx::query_as::<_, Lead>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to look up lead by email {}", email))
    }

    async fn create(&self, lead: &NewLead) -> Result<Lead, AppError> {
        let sql = format!(
            r#"
            INSERT INTO leads (name, email, phone, city, property_type, status, timeline, notes, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            LEAD_COLUMNS
        );

        // Unique violations on email surface as AppError::Conflict
        let created = sqlx::query_as::<_, Lead>(&sql)
            .bind(&lead.name)
            .bind(&lead.email)
            .bind(&lead.phone)
            .bind(&lead.city)
            .bind(lead.property_type)
            .bind(lead.status)
            .bind(lead.timeline)
            .bind(&lead.notes)
            .bind(&lead.tags)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to insert lead {}", lead.email))?;

        tracing::debug!("Inserted lead {} ({})", created.id, created.email);
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: &LeadPatch) -> Result<Lead, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE leads SET ");
        let mut set = builder.separated(", ");

        if let Some(name) = &patch.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(email) = &patch.email {
            set.push("email = ").push_bind_unseparated(email.clone());
        }
        if let Some(phone) = &patch.phone {
            set.push("phone = ").push_bind_unseparated(phone.clone());
        }
        if let Some(city) = &patch.city {
            set.push("city = ").push_bind_unseparated(city.clone());
        }
        if let Some(property_type) = patch.property_type {
            set.push("property_type = ")
                .push_bind_unseparated(property_type);
        }
        if let Some(status) = patch.status {
            set.push("status = ").push_bind_unseparated(status);
        }
        if let Some(timeline) = patch.timeline {
            set.push("timeline = ").push_bind_unseparated(timeline);
        }
        if let Some(notes) = &patch.notes {
            set.push("notes = ").push_bind_unseparated(notes.clone());
        }
        if let Some(tags) = &patch.tags {
            set.push("tags = ").push_bind_unseparated(tags.clone());
        }
        // Strictly advance even when two writes land in the same transaction time
        set.push("updated_at = GREATEST(now(), updated_at + interval '1 microsecond')");

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(LEAD_COLUMNS);

        builder
            .build_query_as::<Lead>()
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to update lead {}", id))?
            .ok_or_else(|| lead_not_found(id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete lead {}", id))?;

        if result.rows_affected() == 0 {
            return Err(lead_not_found(id));
        }
        Ok(())
    }

    async fn upsert_by_email(&self, lead: &NewLead) -> Result<UpsertOutcome, AppError> {
        // Single conditional insert: RETURNING yields a row only when this
        // statement inserted it.
        let sql = format!(
            r#"
            INSERT INTO leads (name, email, phone, city, property_type, status, timeline, notes, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (email) DO NOTHING
            RETURNING {}
            "#,
            LEAD_COLUMNS
        );

        let inserted = sqlx::query_as::<_, Lead>(&sql)
            .bind(&lead.name)
            .bind(&lead.email)
            .bind(&lead.phone)
            .bind(&lead.city)
            .bind(lead.property_type)
            .bind(lead.status)
            .bind(lead.timeline)
            .bind(&lead.notes)
            .bind(&lead.tags)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to upsert lead {}", lead.email))?;

        Ok(match inserted {
            Some(created) => UpsertOutcome::Created(created),
            None => UpsertOutcome::Existing,
        })
    }

    async fn distinct_cities(&self) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>("SELECT DISTINCT city FROM leads ORDER BY city")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list cities")
    }
}
