//! Field-level validation for lead payloads.
//!
//! Every rule runs independently and all failures are collected into a
//! [`ValidationErrors`] map keyed by field name, so a client can render every
//! problem with a submitted form at once.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::models::{LeadPatch, LeadStatus, LeadTimeline, NewLead, PropertyType};

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_CITY_LEN: usize = 2;
pub const PHONE_DIGITS: usize = 10;
/// Separator used when tags travel as a single string (CSV cells, import rows).
pub const TAG_SEPARATOR: char = ';';

/// Key used for errors that concern the payload as a whole.
pub const FORM_FIELD: &str = "_form";

/// Why a single field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    Required,
    /// Present but of the wrong JSON type; carries the expected type.
    InvalidType(&'static str),
    NameTooShort,
    InvalidEmail,
    InvalidPhone,
    CityTooShort,
    /// Not a member of the field's enum; carries the allowed values.
    InvalidEnum(&'static [&'static str]),
}

impl FieldErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            FieldErrorKind::Required => "Required",
            FieldErrorKind::InvalidType(_) => "InvalidType",
            FieldErrorKind::NameTooShort => "NameTooShort",
            FieldErrorKind::InvalidEmail => "InvalidEmail",
            FieldErrorKind::InvalidPhone => "InvalidPhone",
            FieldErrorKind::CityTooShort => "CityTooShort",
            FieldErrorKind::InvalidEnum(_) => "InvalidEnum",
        }
    }

    pub fn message(&self) -> String {
        match self {
            FieldErrorKind::Required => "Required".to_string(),
            FieldErrorKind::InvalidType(expected) => format!("Expected {}.", expected),
            FieldErrorKind::NameTooShort => "Name must be at least 2 characters.".to_string(),
            FieldErrorKind::InvalidEmail => "Invalid email address.".to_string(),
            FieldErrorKind::InvalidPhone => "Phone number must be exactly 10 digits.".to_string(),
            FieldErrorKind::CityTooShort => "City must be at least 2 characters.".to_string(),
            FieldErrorKind::InvalidEnum(values) => format!(
                "Invalid enum value. Expected one of: {}.",
                values.join(", ")
            ),
        }
    }
}

/// Field name → every rule that field failed.
///
/// Serializes as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, Vec<FieldErrorKind>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, kind: FieldErrorKind) -> Self {
        let mut errors = Self::new();
        errors.add(field, kind);
        errors
    }

    pub fn add(&mut self, field: &'static str, kind: FieldErrorKind) {
        self.fields.entry(field).or_default().push(kind);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields with at least one error.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, field: &str) -> &[FieldErrorKind] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `field` failed with an error of the same kind as `kind`.
    pub fn has(&self, field: &str, kind: FieldErrorKind) -> bool {
        self.field(field).iter().any(|k| k.code() == kind.code())
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, kinds) in &self.fields {
            for kind in kinds {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                write!(f, "{}: {}", field, kind.message())?;
            }
        }
        Ok(())
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, kinds) in &self.fields {
            let messages: Vec<String> = kinds.iter().map(FieldErrorKind::message).collect();
            map.serialize_entry(field, &messages)?;
        }
        map.end()
    }
}

// ============ Single-value rules ============

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"(?i)^[a-z0-9_'+\-.]*[a-z0-9_+\-]@([a-z0-9][a-z0-9\-]*\.)+[a-z]{2,}$")
            .expect("email regex is valid")
    })
}

/// Checks standard email syntax: no leading dot, no consecutive dots, and a
/// dotted domain ending in an alphabetic TLD of at least two letters.
pub fn is_valid_email(email: &str) -> bool {
    !email.starts_with('.') && !email.contains("..") && email_regex().is_match(email)
}

/// Exactly ten ASCII digits, no formatting characters.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == PHONE_DIGITS && phone.bytes().all(|b| b.is_ascii_digit())
}

/// Splits a `;`-joined tag string, trimming each tag and dropping empties.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(TAG_SEPARATOR)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ============ Object reader ============

/// Reads fields out of a JSON object, recording failures as it goes.
struct FieldReader<'a> {
    obj: &'a Map<String, Value>,
    errors: ValidationErrors,
}

impl<'a> FieldReader<'a> {
    fn new(input: &'a Value) -> Result<Self, ValidationErrors> {
        match input.as_object() {
            Some(obj) => Ok(Self {
                obj,
                errors: ValidationErrors::new(),
            }),
            None => Err(ValidationErrors::single(
                FORM_FIELD,
                FieldErrorKind::InvalidType("object"),
            )),
        }
    }

    /// Raw string value. Absent or null yields `None`, recording `Required`
    /// when `required` is set.
    fn text(&mut self, field: &'static str, required: bool) -> Option<&'a str> {
        match self.obj.get(field) {
            None | Some(Value::Null) => {
                if required {
                    self.errors.add(field, FieldErrorKind::Required);
                }
                None
            }
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => {
                self.errors.add(field, FieldErrorKind::InvalidType("string"));
                None
            }
        }
    }

    fn min_len(
        &mut self,
        field: &'static str,
        min: usize,
        kind: FieldErrorKind,
        required: bool,
    ) -> Option<String> {
        let value = self.text(field, required)?;
        if value.chars().count() < min {
            self.errors.add(field, kind);
            return None;
        }
        Some(value.to_string())
    }

    fn name(&mut self, required: bool) -> Option<String> {
        self.min_len("name", MIN_NAME_LEN, FieldErrorKind::NameTooShort, required)
    }

    fn city(&mut self, required: bool) -> Option<String> {
        self.min_len("city", MIN_CITY_LEN, FieldErrorKind::CityTooShort, required)
    }

    fn email(&mut self, required: bool) -> Option<String> {
        let value = self.text("email", required)?;
        if !is_valid_email(value) {
            self.errors.add("email", FieldErrorKind::InvalidEmail);
            return None;
        }
        Some(value.to_string())
    }

    /// `Ok(None)` means the phone is absent (missing, null, or empty string).
    fn phone(&mut self) -> Result<Option<String>, ()> {
        let Some(value) = self.text("phone", false) else {
            return if self.errors.field("phone").is_empty() {
                Ok(None)
            } else {
                Err(())
            };
        };
        if value.is_empty() {
            return Ok(None);
        }
        if !is_valid_phone(value) {
            self.errors.add("phone", FieldErrorKind::InvalidPhone);
            return Err(());
        }
        Ok(Some(value.to_string()))
    }

    /// Empty notes normalize to absent.
    fn notes(&mut self) -> Option<String> {
        self.text("notes", false)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }

    fn one_of<T: FromStr>(
        &mut self,
        field: &'static str,
        values: &'static [&'static str],
        required: bool,
    ) -> Option<T> {
        let value = self.text(field, required)?;
        match value.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.errors.add(field, FieldErrorKind::InvalidEnum(values));
                None
            }
        }
    }

    fn property_type(&mut self, required: bool) -> Option<PropertyType> {
        self.one_of("propertyType", PropertyType::VALUES, required)
    }

    fn status(&mut self, required: bool) -> Option<LeadStatus> {
        self.one_of("status", LeadStatus::VALUES, required)
    }

    fn timeline(&mut self, required: bool) -> Option<LeadTimeline> {
        self.one_of("timeline", LeadTimeline::VALUES, required)
    }

    /// Arrays keep their order; a single string is split on `;`.
    fn tags(&mut self) -> Vec<String> {
        match self.obj.get("tags") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(s)) => split_tags(s),
            Some(Value::Array(items)) => {
                let mut tags = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(tag) => tags.push(tag.to_string()),
                        None => {
                            self.errors
                                .add("tags", FieldErrorKind::InvalidType("array of strings"));
                            return Vec::new();
                        }
                    }
                }
                tags
            }
            Some(_) => {
                self.errors
                    .add("tags", FieldErrorKind::InvalidType("array of strings"));
                Vec::new()
            }
        }
    }

    fn uuid(&mut self, field: &'static str) -> Option<Uuid> {
        let value = self.text(field, false)?;
        match Uuid::parse_str(value) {
            Ok(id) => Some(id),
            Err(_) => {
                self.errors.add(field, FieldErrorKind::InvalidType("UUID"));
                None
            }
        }
    }

    fn timestamp(&mut self, field: &'static str) -> Option<DateTime<Utc>> {
        let value = self.text(field, false)?;
        match DateTime::parse_from_rfc3339(value) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(_) => {
                self.errors
                    .add(field, FieldErrorKind::InvalidType("RFC 3339 timestamp"));
                None
            }
        }
    }
}

// ============ Schema variants ============

/// Validates a create payload. System fields (`id`, `createdAt`,
/// `updatedAt`) and unknown keys are ignored.
pub fn validate_create(input: &Value) -> Result<NewLead, ValidationErrors> {
    let mut reader = FieldReader::new(input)?;

    let name = reader.name(true);
    let email = reader.email(true);
    let phone = reader.phone();
    let city = reader.city(true);
    let property_type = reader.property_type(true);
    let status = reader.status(true);
    let timeline = reader.timeline(true);
    let notes = reader.notes();
    let tags = reader.tags();

    if !reader.errors.is_empty() {
        return Err(reader.errors);
    }

    match (name, email, phone, city, property_type, status, timeline) {
        (
            Some(name),
            Some(email),
            Ok(phone),
            Some(city),
            Some(property_type),
            Some(status),
            Some(timeline),
        ) => Ok(NewLead {
            name,
            email,
            phone,
            city,
            property_type,
            status,
            timeline,
            notes,
            tags,
        }),
        _ => Err(reader.errors),
    }
}

/// Validates a partial update. Absent fields stay `None`; present fields use
/// the create rules. Null or empty `phone`/`notes` clear the stored value.
pub fn validate_update(input: &Value) -> Result<LeadPatch, ValidationErrors> {
    let mut reader = FieldReader::new(input)?;
    let mut patch = LeadPatch::default();

    // Null is not a valid value for a required column on update.
    for field in [
        "name",
        "email",
        "city",
        "propertyType",
        "status",
        "timeline",
    ] {
        if matches!(reader.obj.get(field), Some(Value::Null)) {
            reader.errors.add(field, FieldErrorKind::InvalidType("string"));
        }
    }

    patch.name = reader.name(false);
    patch.email = reader.email(false);
    if reader.obj.contains_key("phone") {
        if let Ok(phone) = reader.phone() {
            patch.phone = Some(phone);
        }
    }
    patch.city = reader.city(false);
    patch.property_type = reader.property_type(false);
    patch.status = reader.status(false);
    patch.timeline = reader.timeline(false);
    if reader.obj.contains_key("notes") {
        let notes = reader.notes();
        if reader.errors.field("notes").is_empty() {
            patch.notes = Some(notes);
        }
    }
    if reader.obj.contains_key("tags") {
        patch.tags = Some(reader.tags());
    }

    if reader.errors.is_empty() {
        Ok(patch)
    } else {
        Err(reader.errors)
    }
}

/// A full lead record as read back from an export or fixture: the create
/// fields plus the optional system-assigned fields.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadRecord {
    pub id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub lead: NewLead,
}

/// Validates a full lead record, including optional `id` and timestamps.
pub fn validate_record(input: &Value) -> Result<LeadRecord, ValidationErrors> {
    let mut reader = FieldReader::new(input)?;
    let id = reader.uuid("id");
    let created_at = reader.timestamp("createdAt");
    let updated_at = reader.timestamp("updatedAt");
    let system_errors = reader.errors;

    let lead = validate_create(input);
    match lead {
        Ok(lead) if system_errors.is_empty() => Ok(LeadRecord {
            id,
            created_at,
            updated_at,
            lead,
        }),
        Ok(_) => Err(system_errors),
        Err(mut errors) => {
            for field in system_errors.fields() {
                for kind in system_errors.field(field) {
                    errors.add(field, *kind);
                }
            }
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "name": "Alice Johnson",
            "email": "alice.j@example.com",
            "phone": "5551234567",
            "city": "San Francisco",
            "propertyType": "Condo",
            "status": "New",
            "timeline": "OneThreeMonths",
            "notes": "Interested in a 2-bedroom condo downtown.",
            "tags": ["downtown", "2-bedroom"]
        })
    }

    #[test]
    fn test_valid_payload_passes() {
        let lead = validate_create(&valid_payload()).unwrap();
        assert_eq!(lead.name, "Alice Johnson");
        assert_eq!(lead.phone.as_deref(), Some("5551234567"));
        assert_eq!(lead.property_type, PropertyType::Condo);
        assert_eq!(lead.tags, vec!["downtown", "2-bedroom"]);
    }

    #[test]
    fn test_collects_every_failure() {
        let payload = json!({
            "name": "A",
            "email": "not-an-email",
            "phone": "555-123-4567",
            "city": "X",
            "propertyType": "Castle",
            "status": "Won",
            "timeline": "Soon"
        });
        let errors = validate_create(&payload).unwrap_err();

        assert!(errors.has("name", FieldErrorKind::NameTooShort));
        assert!(errors.has("email", FieldErrorKind::InvalidEmail));
        assert!(errors.has("phone", FieldErrorKind::InvalidPhone));
        assert!(errors.has("city", FieldErrorKind::CityTooShort));
        assert!(errors.has("propertyType", FieldErrorKind::InvalidEnum(&[])));
        assert!(errors.has("status", FieldErrorKind::InvalidEnum(&[])));
        assert!(errors.has("timeline", FieldErrorKind::InvalidEnum(&[])));
        assert_eq!(errors.len(), 7);
    }

    #[test]
    fn test_missing_fields_are_required() {
        let errors = validate_create(&json!({})).unwrap_err();
        for field in ["name", "email", "city", "propertyType", "status", "timeline"] {
            assert!(errors.has(field, FieldErrorKind::Required), "{}", field);
        }
        assert!(errors.field("phone").is_empty());
        assert!(errors.field("tags").is_empty());
    }

    #[test]
    fn test_phone_rules() {
        let mut payload = valid_payload();
        payload["phone"] = json!("");
        assert_eq!(validate_create(&payload).unwrap().phone, None);

        payload["phone"] = json!(null);
        assert_eq!(validate_create(&payload).unwrap().phone, None);

        payload["phone"] = json!("12345");
        let errors = validate_create(&payload).unwrap_err();
        assert!(errors.has("phone", FieldErrorKind::InvalidPhone));
    }

    #[test]
    fn test_tags_string_is_split() {
        let mut payload = valid_payload();
        payload["tags"] = json!(" investor ; duplex;; ");
        let lead = validate_create(&payload).unwrap();
        assert_eq!(lead.tags, vec!["investor", "duplex"]);
    }

    #[test]
    fn test_tags_with_non_strings_rejected() {
        let mut payload = valid_payload();
        payload["tags"] = json!(["ok", 3]);
        let errors = validate_create(&payload).unwrap_err();
        assert!(errors.has("tags", FieldErrorKind::InvalidType("")));
    }

    #[test]
    fn test_empty_notes_normalize_to_none() {
        let mut payload = valid_payload();
        payload["notes"] = json!("");
        assert_eq!(validate_create(&payload).unwrap().notes, None);
    }

    #[test]
    fn test_non_object_rejected() {
        let errors = validate_create(&json!(["name"])).unwrap_err();
        assert!(errors.has(FORM_FIELD, FieldErrorKind::InvalidType("object")));
    }

    #[test]
    fn test_update_keeps_absent_fields_none() {
        let patch = validate_update(&json!({ "city": "Oakland" })).unwrap();
        assert_eq!(patch.city.as_deref(), Some("Oakland"));
        assert_eq!(patch.name, None);
        assert_eq!(patch.phone, None);
        assert_eq!(patch.tags, None);
    }

    #[test]
    fn test_update_clears_optional_fields() {
        let patch = validate_update(&json!({ "phone": "", "notes": null })).unwrap();
        assert_eq!(patch.phone, Some(None));
        assert_eq!(patch.notes, Some(None));
    }

    #[test]
    fn test_update_rejects_null_required_field() {
        let errors = validate_update(&json!({ "name": null })).unwrap_err();
        assert!(errors.has("name", FieldErrorKind::InvalidType("")));
    }

    #[test]
    fn test_update_applies_create_rules() {
        let errors = validate_update(&json!({ "email": "bad", "status": "Closed" })).unwrap_err();
        assert!(errors.has("email", FieldErrorKind::InvalidEmail));
        assert!(errors.field("status").is_empty());
    }

    #[test]
    fn test_record_accepts_system_fields() {
        let mut payload = valid_payload();
        let id = Uuid::new_v4();
        payload["id"] = json!(id.to_string());
        payload["createdAt"] = json!("2024-05-01T12:00:00Z");
        let record = validate_record(&payload).unwrap();
        assert_eq!(record.id, Some(id));
        assert!(record.created_at.is_some());
        assert_eq!(record.updated_at, None);
        assert_eq!(record.lead.email, "alice.j@example.com");
    }

    #[test]
    fn test_record_rejects_bad_system_fields() {
        let mut payload = valid_payload();
        payload["id"] = json!("not-a-uuid");
        payload["name"] = json!("A");
        let errors = validate_record(&payload).unwrap_err();
        assert!(errors.has("id", FieldErrorKind::InvalidType("")));
        assert!(errors.has("name", FieldErrorKind::NameTooShort));
    }

    #[test]
    fn test_errors_serialize_as_messages() {
        let errors = ValidationErrors::single("phone", FieldErrorKind::InvalidPhone);
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, json!({ "phone": ["Phone number must be exactly 10 digits."] }));
    }
}
