//! Translates lead listing parameters into a filter predicate and a
//! pagination window.
//!
//! The predicate can be rendered as a parameterised SQL WHERE fragment for
//! the Postgres store, or evaluated directly against a [`Lead`] by the
//! in-memory store, so both backends agree on what a filter means.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::models::{Lead, LeadStatus, LeadTimeline, PropertyType, LEADS_PER_PAGE};
use crate::validation::{FieldErrorKind, ValidationErrors};

/// Filter value meaning "no filter" for the dropdown-backed parameters.
pub const ALL: &str = "all";

/// Raw query parameters accepted by the lead listing and export endpoints.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListLeadsParams {
    /// Case-insensitive substring matched against name or email.
    pub query: Option<String>,
    /// Exact city, or `all`.
    pub city: Option<String>,
    /// Exact status, or `all`.
    pub status: Option<String>,
    /// Exact property type, or `all`.
    pub property_type: Option<String>,
    /// Exact timeline, or `all`.
    pub timeline: Option<String>,
    /// 1-based page number. Defaults to 1.
    pub page: Option<String>,
}

/// Field-match conditions combined with AND. `query` is the only OR
/// (name OR email).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFilter {
    pub query: Option<String>,
    pub city: Option<String>,
    pub status: Option<LeadStatus>,
    pub property_type: Option<PropertyType>,
    pub timeline: Option<LeadTimeline>,
}

impl LeadFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Evaluates the predicate against a single lead.
    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(query) = &self.query {
            let needle = query.to_lowercase();
            if !lead.name.to_lowercase().contains(&needle)
                && !lead.email.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if &lead.city != city {
                return false;
            }
        }
        if let Some(status) = self.status {
            if lead.status != status {
                return false;
            }
        }
        if let Some(property_type) = self.property_type {
            if lead.property_type != property_type {
                return false;
            }
        }
        if let Some(timeline) = self.timeline {
            if lead.timeline != timeline {
                return false;
            }
        }
        true
    }
}

/// The only supported ordering: most recently touched first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    UpdatedAtDesc,
}

impl SortOrder {
    /// ORDER BY clause body. `id` breaks ties so pages are stable.
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::UpdatedAtDesc => "updated_at DESC, id DESC",
        }
    }
}

/// Offset/limit window for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub per_page: i64,
}

impl PageWindow {
    pub fn new(page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: LEADS_PER_PAGE,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(1)
    }
}

/// A predicate plus the page of it to fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadQuery {
    pub filter: LeadFilter,
    pub order: SortOrder,
    pub window: PageWindow,
}

/// Drops absent, blank, and `all` values.
fn selected(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ALL)
}

fn parse_choice<T: std::str::FromStr>(
    value: &Option<String>,
    field: &'static str,
    values: &'static [&'static str],
    errors: &mut ValidationErrors,
) -> Option<T> {
    let raw = selected(value)?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add(field, FieldErrorKind::InvalidEnum(values));
            None
        }
    }
}

/// Unparsable or non-positive pages fall back to the first page.
fn parse_page(value: &Option<String>) -> i64 {
    value
        .as_deref()
        .and_then(|p| p.trim().parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

/// Builds the predicate alone (used by export, which is not paged).
pub fn build_filter(params: &ListLeadsParams) -> Result<LeadFilter, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let query = params
        .query
        .as_deref()
        .filter(|q| !q.is_empty())
        .map(str::to_string);
    let city = selected(&params.city).map(str::to_string);
    let status = parse_choice(&params.status, "status", LeadStatus::VALUES, &mut errors);
    let property_type = parse_choice(
        &params.property_type,
        "propertyType",
        PropertyType::VALUES,
        &mut errors,
    );
    let timeline = parse_choice(
        &params.timeline,
        "timeline",
        LeadTimeline::VALUES,
        &mut errors,
    );

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(LeadFilter {
        query,
        city,
        status,
        property_type,
        timeline,
    })
}

/// Builds the predicate and pagination window for a listing request.
pub fn build_query(params: &ListLeadsParams) -> Result<LeadQuery, ValidationErrors> {
    Ok(LeadQuery {
        filter: build_filter(params)?,
        order: SortOrder::UpdatedAtDesc,
        window: PageWindow::new(parse_page(&params.page)),
    })
}

// ============ SQL rendering ============

/// Type-safe parameter binding for the rendered WHERE fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    Status(LeadStatus),
    PropertyType(PropertyType),
    Timeline(LeadTimeline),
}

/// Escapes LIKE metacharacters so user text matches literally.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Generates the SQL WHERE fragment for a [`LeadFilter`].
///
/// ```rust,ignore
/// let filter = LeadFilter { status: Some(LeadStatus::Closed), ..Default::default() };
/// let (sql, params) = LeadFilterSql::new(&filter, 0).build();
/// // sql: "status = $1"
/// // params: [QueryParam::Status(LeadStatus::Closed)]
/// ```
pub struct LeadFilterSql<'a> {
    filter: &'a LeadFilter,
    param_offset: usize,
}

impl<'a> LeadFilterSql<'a> {
    /// `param_offset` is the number of parameters already bound before the
    /// fragment.
    pub fn new(filter: &'a LeadFilter, param_offset: usize) -> Self {
        Self {
            filter,
            param_offset,
        }
    }

    /// Returns the fragment (`"TRUE"` when the filter is empty) and its
    /// parameters in placeholder order.
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let mut param_idx = self.param_offset;

        if let Some(query) = &self.filter.query {
            param_idx += 1;
            clauses.push(format!(
                "(name ILIKE ${idx} ESCAPE '\\' OR email ILIKE ${idx} ESCAPE '\\')",
                idx = param_idx
            ));
            params.push(QueryParam::Text(format!("%{}%", escape_like(query))));
        }

        if let Some(city) = &self.filter.city {
            param_idx += 1;
            clauses.push(format!("city = ${}", param_idx));
            params.push(QueryParam::Text(city.clone()));
        }

        if let Some(status) = self.filter.status {
            param_idx += 1;
            clauses.push(format!("status = ${}", param_idx));
            params.push(QueryParam::Status(status));
        }

        if let Some(property_type) = self.filter.property_type {
            param_idx += 1;
            clauses.push(format!("property_type = ${}", param_idx));
            params.push(QueryParam::PropertyType(property_type));
        }

        if let Some(timeline) = self.filter.timeline {
            param_idx += 1;
            clauses.push(format!("timeline = ${}", param_idx));
            params.push(QueryParam::Timeline(timeline));
        }

        let sql = if clauses.is_empty() {
            "TRUE".to_string()
        } else {
            clauses.join(" AND ")
        };

        (sql, params)
    }
}
