use crate::config::Config;
use crate::csv_transfer;
use crate::errors::{AppError, ResultExt};
use crate::import::import_rows;
use crate::models::*;
use crate::query_builder::{build_filter, build_query, ListLeadsParams, SortOrder};
use crate::store::LeadStore;
use crate::validation::{validate_create, validate_update, FieldErrorKind, ValidationErrors};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lead persistence (PostgreSQL or in-memory).
    pub store: Arc<dyn LeadStore>,
    /// Application configuration.
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn LeadStore>, config: Config) -> Self {
        Self { store, config }
    }
}

/// Malformed ids cannot name a stored lead, so they read as not found.
fn parse_lead_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound("Lead not found.".to_string()))
}

/// Health check endpoint.
///
/// Returns the service status and version.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
#[utoipa::path(get, path = "/health", tag = "System",
    responses((status = 200, description = "Service is up")))]
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-leads-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/v1/leads
///
/// Lists one page of leads matching the filters, most recently updated first.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `params` - Search text, dropdown filters and page number.
///
/// # Returns
///
/// * `Result<Json<LeadListResponse>, AppError>` - The page plus the total match count.
#[utoipa::path(get, path = "/api/v1/leads", tag = "Leads",
    params(ListLeadsParams),
    responses(
        (status = 200, description = "One page of matching leads", body = LeadListResponse),
        (status = 400, description = "Unknown filter value")
    ))]
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListLeadsParams>,
) -> Result<Json<LeadListResponse>, AppError> {
    tracing::info!("GET /leads - params: {:?}", params);

    let query = build_query(&params)?;

    let total = state
        .store
        .count(&query.filter)
        .await
        .context("Failed to fetch leads")?;
    let leads = state
        .store
        .find_many(
            &query.filter,
            query.order,
            query.window.offset(),
            Some(query.window.limit()),
        )
        .await
        .context("Failed to fetch leads")?;

    Ok(Json(LeadListResponse {
        leads,
        total,
        page: query.window.page,
        per_page: query.window.per_page,
    }))
}

/// GET /api/v1/leads/:id
#[utoipa::path(get, path = "/api/v1/leads/{id}", tag = "Leads",
    params(("id" = String, Path, description = "Lead id")),
    responses(
        (status = 200, description = "The lead", body = Lead),
        (status = 404, description = "Lead not found")
    ))]
pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Lead>, AppError> {
    tracing::info!("GET /leads/{}", id);

    let id = parse_lead_id(&id)?;
    let lead = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found.".to_string()))?;

    Ok(Json(lead))
}

/// POST /api/v1/leads
///
/// Creates a lead after validating every field.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `payload` - Raw JSON lead; system fields are ignored.
///
/// # Returns
///
/// * `Result<(StatusCode, Json<Lead>), AppError>` - 201 with the stored lead, 400 with
///   per-field errors, or 409 when the email is taken.
#[utoipa::path(post, path = "/api/v1/leads", tag = "Leads",
    request_body = NewLead,
    responses(
        (status = 201, description = "Lead created", body = Lead),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Email already in use")
    ))]
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Lead>), AppError> {
    tracing::info!("POST /leads");

    let new_lead = validate_create(&payload)?;
    let lead = state.store.create(&new_lead).await?;

    tracing::info!("Created lead {} ({})", lead.id, lead.email);
    Ok((StatusCode::CREATED, Json(lead)))
}

/// PATCH /api/v1/leads/:id
///
/// Applies a partial update; fields absent from the body keep their values.
#[utoipa::path(patch, path = "/api/v1/leads/{id}", tag = "Leads",
    params(("id" = String, Path, description = "Lead id")),
    request_body = NewLead,
    responses(
        (status = 200, description = "Updated lead", body = Lead),
        (status = 400, description = "Invalid fields"),
        (status = 404, description = "Lead not found"),
        (status = 409, description = "Email already in use")
    ))]
pub async fn update_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Lead>, AppError> {
    tracing::info!("PATCH /leads/{}", id);

    let id = parse_lead_id(&id)?;
    let patch = validate_update(&payload)?;
    let lead = state.store.update(id, &patch).await?;

    Ok(Json(lead))
}

/// DELETE /api/v1/leads/:id
#[utoipa::path(delete, path = "/api/v1/leads/{id}", tag = "Leads",
    params(("id" = String, Path, description = "Lead id")),
    responses(
        (status = 200, description = "Lead deleted", body = ActionResponse),
        (status = 404, description = "Lead not found")
    ))]
pub async fn delete_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    tracing::info!("DELETE /leads/{}", id);

    let id = parse_lead_id(&id)?;
    state.store.delete(id).await?;

    Ok(Json(ActionResponse {
        success: true,
        message: Some("Lead deleted successfully.".to_string()),
    }))
}

/// POST /api/v1/leads/status
///
/// Moves a lead to another pipeline stage. Any status may follow any other.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `payload` - `{id, status}`; both are required.
///
/// # Returns
///
/// * `Result<Json<ActionResponse>, AppError>` - `{success: true}`, 400 for a missing
///   or unknown status, or 404 for an unknown lead.
#[utoipa::path(post, path = "/api/v1/leads/status", tag = "Leads",
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Status changed", body = ActionResponse),
        (status = 400, description = "Missing id or status"),
        (status = 404, description = "Lead not found")
    ))]
pub async fn update_lead_status(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    tracing::info!("POST /leads/status - {:?}", payload);

    let (Some(raw_id), Some(raw_status)) = (
        payload.id.filter(|v| !v.trim().is_empty()),
        payload.status.filter(|v| !v.trim().is_empty()),
    ) else {
        return Err(AppError::BadRequest("Missing id or status".to_string()));
    };

    let status: LeadStatus = raw_status.parse().map_err(|_| {
        ValidationErrors::single("status", FieldErrorKind::InvalidEnum(LeadStatus::VALUES))
    })?;
    let id = parse_lead_id(&raw_id)?;

    state.store.update(id, &LeadPatch::status(status)).await?;
    tracing::info!("Lead {} moved to {}", id, status);

    Ok(Json(ActionResponse {
        success: true,
        message: None,
    }))
}

/// POST /api/v1/leads/import
///
/// Bulk-imports a JSON array of raw lead objects. Invalid rows are skipped,
/// existing emails are left untouched, and `count` reports new leads only.
#[utoipa::path(post, path = "/api/v1/leads/import", tag = "Leads",
    request_body = Vec<NewLead>,
    responses(
        (status = 200, description = "Import finished", body = ImportResponse),
        (status = 400, description = "Body is not an array"),
        (status = 500, description = "Import failed")
    ))]
pub async fn import_leads(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<ImportResponse>, AppError> {
    let Value::Array(rows) = payload else {
        return Err(AppError::BadRequest(
            "Request body must be a JSON array of leads".to_string(),
        ));
    };
    tracing::info!("POST /leads/import - {} rows", rows.len());

    let summary = import_rows(state.store.as_ref(), &rows).await?;

    Ok(Json(ImportResponse {
        success: true,
        message: summary.message(),
        count: summary.created,
    }))
}

/// POST /api/v1/leads/import/csv
///
/// Same as the JSON import, reading rows from a CSV document with a header row.
#[utoipa::path(post, path = "/api/v1/leads/import/csv", tag = "Leads",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Import finished", body = ImportResponse),
        (status = 400, description = "Unparsable CSV"),
        (status = 500, description = "Import failed")
    ))]
pub async fn import_leads_csv(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<ImportResponse>, AppError> {
    tracing::info!("POST /leads/import/csv - {} bytes", body.len());

    let rows = csv_transfer::parse_csv(&body)?;
    let summary = import_rows(state.store.as_ref(), &rows).await?;

    Ok(Json(ImportResponse {
        success: true,
        message: summary.message(),
        count: summary.created,
    }))
}

/// GET /api/v1/leads/export
///
/// Downloads every lead matching the filters (not just one page) as CSV.
#[utoipa::path(get, path = "/api/v1/leads/export", tag = "Leads",
    params(ListLeadsParams),
    responses(
        (status = 200, description = "CSV attachment", body = String, content_type = "text/csv"),
        (status = 400, description = "Unknown filter value")
    ))]
pub async fn export_leads_csv(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListLeadsParams>,
) -> Result<Response, AppError> {
    tracing::info!("GET /leads/export - params: {:?}", params);

    let filter = build_filter(&params)?;
    let leads = state
        .store
        .find_many(&filter, SortOrder::UpdatedAtDesc, 0, None)
        .await
        .context("Failed to export leads")?;
    let body = csv_transfer::export_leads(&leads)?;

    tracing::info!("Exported {} leads", leads.len());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"{}\"",
                    csv_transfer::export_filename()
                ),
            ),
        ],
        body,
    )
        .into_response())
}

/// GET /api/v1/leads/cities
///
/// Distinct cities for the city filter dropdown, sorted.
#[utoipa::path(get, path = "/api/v1/leads/cities", tag = "Leads",
    responses((status = 200, description = "Sorted distinct cities", body = Vec<String>)))]
pub async fn lead_cities(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    let cities = state
        .store
        .distinct_cities()
        .await
        .context("Failed to fetch cities")?;
    Ok(Json(cities))
}

/// GET /api/v1/leads/options
#[utoipa::path(get, path = "/api/v1/leads/options", tag = "Leads",
    responses((status = 200, description = "Enum values with display labels", body = LeadOptions)))]
pub async fn lead_options() -> Json<LeadOptions> {
    Json(LeadOptions::build())
}
