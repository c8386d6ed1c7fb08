use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Page size used by the lead listing and its pagination window.
pub const LEADS_PER_PAGE: i64 = 10;

/// Error returned when a string does not name a variant of one of the lead enums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

// Stored values are the literal variant names, both in Postgres enum types
// and on the wire. Display text lives in the per-enum `label()`.
macro_rules! lead_enum {
    ($(#[$meta:meta])* $name:ident, $type_name:tt, [$($variant:ident),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
        )]
        #[sqlx(type_name = $type_name)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            /// Wire values of every variant, in declaration order.
            pub const VALUES: &'static [&'static str] = &[$(stringify!($variant)),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok($name::$variant),)+
                    _ => Err(UnknownVariant(s.to_string())),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

lead_enum!(
    /// Kind of property the buyer is looking for.
    PropertyType,
    "property_type",
    [SingleFamily, Condo, Townhouse, MultiFamily, Land]
);

lead_enum!(
    /// Position of a lead in the sales pipeline. Any status may move to any other.
    LeadStatus,
    "lead_status",
    [New, Contacted, Showing, UnderContract, Closed, Lost]
);

lead_enum!(
    /// How soon the buyer intends to purchase.
    #[allow(clippy::upper_case_acronyms)]
    LeadTimeline,
    "lead_timeline",
    [ASAP, OneThreeMonths, ThreeSixMonths, SixPlusMonths]
);

impl PropertyType {
    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::SingleFamily => "Single Family",
            PropertyType::Condo => "Condo",
            PropertyType::Townhouse => "Townhouse",
            PropertyType::MultiFamily => "Multi Family",
            PropertyType::Land => "Land",
        }
    }
}

impl LeadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LeadStatus::UnderContract => "Under Contract",
            other => other.as_str(),
        }
    }
}

impl LeadTimeline {
    pub fn label(&self) -> &'static str {
        match self {
            LeadTimeline::ASAP => "ASAP",
            LeadTimeline::OneThreeMonths => "1-3 Months",
            LeadTimeline::ThreeSixMonths => "3-6 Months",
            LeadTimeline::SixPlusMonths => "6+ Months",
        }
    }
}

// ============ Database Models ============

/// A prospective property buyer tracked through the sales pipeline.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// Store-assigned identifier, immutable after creation.
    pub id: Uuid,
    pub name: String,
    /// Unique across all leads.
    pub email: String,
    /// Exactly 10 digits when present.
    pub phone: Option<String>,
    pub city: String,
    pub property_type: PropertyType,
    pub status: LeadStatus,
    pub timeline: LeadTimeline,
    pub notes: Option<String>,
    /// Display order is insertion order.
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Refreshed by the store on every mutation.
    pub updated_at: DateTime<Utc>,
}

// ============ Write Payloads ============

/// Validated payload for creating a lead (system fields omitted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: String,
    pub property_type: PropertyType,
    pub status: LeadStatus,
    pub timeline: LeadTimeline,
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Validated partial update. `None` leaves a field untouched; for the
/// optional columns `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub city: Option<String>,
    pub property_type: Option<PropertyType>,
    pub status: Option<LeadStatus>,
    pub timeline: Option<LeadTimeline>,
    pub notes: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl LeadPatch {
    /// Patch that only moves the lead to a new pipeline status.
    pub fn status(status: LeadStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the present fields onto `lead`. Timestamps are left to the store.
    pub fn apply_to(&self, lead: &mut Lead) {
        if let Some(name) = &self.name {
            lead.name = name.clone();
        }
        if let Some(email) = &self.email {
            lead.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            lead.phone = phone.clone();
        }
        if let Some(city) = &self.city {
            lead.city = city.clone();
        }
        if let Some(property_type) = self.property_type {
            lead.property_type = property_type;
        }
        if let Some(status) = self.status {
            lead.status = status;
        }
        if let Some(timeline) = self.timeline {
            lead.timeline = timeline;
        }
        if let Some(notes) = &self.notes {
            lead.notes = notes.clone();
        }
        if let Some(tags) = &self.tags {
            lead.tags = tags.clone();
        }
    }
}

/// Result of an insert-if-absent keyed by email.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    /// No lead had the email; this one was inserted.
    Created(Lead),
    /// A lead with the email already existed and was left untouched.
    Existing,
}

impl UpsertOutcome {
    pub fn was_created(&self) -> bool {
        matches!(self, UpsertOutcome::Created(_))
    }
}

// ============ API Request/Response Models ============

/// Paged lead listing returned by `GET /api/v1/leads`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadListResponse {
    pub leads: Vec<Lead>,
    /// Number of leads matching the filters across all pages.
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Generic success envelope used by delete and status updates.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `POST /api/v1/leads/status`. Both fields are checked by the handler.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    pub id: Option<String>,
    pub status: Option<String>,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    /// Number of newly created leads.
    pub count: usize,
}

/// A selectable enum value paired with its display label.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EnumOption {
    pub value: String,
    pub label: String,
}

impl EnumOption {
    fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Values and labels for the lead filter and form dropdowns.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadOptions {
    pub property_types: Vec<EnumOption>,
    pub statuses: Vec<EnumOption>,
    pub timelines: Vec<EnumOption>,
}

impl LeadOptions {
    pub fn build() -> Self {
        Self {
            property_types: PropertyType::ALL
                .iter()
                .map(|v| EnumOption::new(v.as_str(), v.label()))
                .collect(),
            statuses: LeadStatus::ALL
                .iter()
                .map(|v| EnumOption::new(v.as_str(), v.label()))
                .collect(),
            timelines: LeadTimeline::ALL
                .iter()
                .map(|v| EnumOption::new(v.as_str(), v.label()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lead() -> Lead {
        Lead {
            id: Uuid::new_v4(),
            name: "Alice Johnson".to_string(),
            email: "alice.j@example.com".to_string(),
            phone: Some("5550100101".to_string()),
            city: "San Francisco".to_string(),
            property_type: PropertyType::Condo,
            status: LeadStatus::New,
            timeline: LeadTimeline::OneThreeMonths,
            notes: Some("Interested in a 2-bedroom condo downtown.".to_string()),
            tags: vec!["downtown".to_string(), "2-bedroom".to_string()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_enum_round_trip_through_str() {
        for status in LeadStatus::ALL {
            assert_eq!(status.as_str().parse::<LeadStatus>(), Ok(*status));
        }
        assert!("Under Contract".parse::<LeadStatus>().is_err());
        assert!("condo".parse::<PropertyType>().is_err());
    }

    #[test]
    fn test_labels_are_separate_from_values() {
        assert_eq!(LeadTimeline::OneThreeMonths.label(), "1-3 Months");
        assert_eq!(LeadTimeline::SixPlusMonths.label(), "6+ Months");
        assert_eq!(PropertyType::SingleFamily.label(), "Single Family");
        assert_eq!(LeadStatus::UnderContract.label(), "Under Contract");
        assert_eq!(LeadStatus::Closed.label(), "Closed");
        assert_eq!(LeadTimeline::OneThreeMonths.as_str(), "OneThreeMonths");
    }

    #[test]
    fn test_lead_serializes_camel_case() {
        let lead = sample_lead();
        let json = serde_json::to_value(&lead).unwrap();
        assert_eq!(json["propertyType"], "Condo");
        assert_eq!(json["timeline"], "OneThreeMonths");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("property_type").is_none());
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut lead = sample_lead();
        let before = lead.clone();
        let patch = LeadPatch {
            city: Some("Oakland".to_string()),
            phone: Some(None),
            ..Default::default()
        };

        patch.apply_to(&mut lead);

        assert_eq!(lead.city, "Oakland");
        assert_eq!(lead.phone, None);
        assert_eq!(lead.name, before.name);
        assert_eq!(lead.tags, before.tags);
        assert_eq!(lead.notes, before.notes);
    }

    #[test]
    fn test_status_patch() {
        let patch = LeadPatch::status(LeadStatus::Closed);
        assert!(!patch.is_empty());
        assert_eq!(patch.status, Some(LeadStatus::Closed));
        assert!(LeadPatch::default().is_empty());
    }

    #[test]
    fn test_options_cover_every_variant() {
        let options = LeadOptions::build();
        assert_eq!(options.property_types.len(), PropertyType::ALL.len());
        assert_eq!(options.statuses.len(), 6);
        assert_eq!(options.timelines[0].value, "ASAP");
    }
}
