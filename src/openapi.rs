use axum::{http::StatusCode, response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::handlers;
use crate::models::{
    ActionResponse, EnumOption, ImportResponse, Lead, LeadListResponse, LeadOptions, LeadStatus,
    LeadTimeline, NewLead, PropertyType, StatusUpdateRequest,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leads API",
        description = "Lead tracking for real-estate agents: CRUD, filtering, CSV import and export"
    ),
    paths(
        handlers::health,
        handlers::list_leads,
        handlers::get_lead,
        handlers::create_lead,
        handlers::update_lead,
        handlers::delete_lead,
        handlers::update_lead_status,
        handlers::import_leads,
        handlers::import_leads_csv,
        handlers::export_leads_csv,
        handlers::lead_cities,
        handlers::lead_options,
    ),
    components(schemas(
        Lead,
        NewLead,
        PropertyType,
        LeadStatus,
        LeadTimeline,
        LeadListResponse,
        ActionResponse,
        StatusUpdateRequest,
        ImportResponse,
        EnumOption,
        LeadOptions,
    )),
    tags(
        (name = "Leads", description = "Lead management"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document.
pub async fn serve_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Serves the Swagger UI HTML page.
///
/// The page loads Swagger UI from a CDN and points it at
/// `/api-docs/openapi.json`.
pub async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Leads API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}
