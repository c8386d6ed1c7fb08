//! CSV export and import parsing for leads.
//!
//! Export writes every value double-quoted with a fixed header; import reads
//! any RFC 4180 style document (quoted fields, embedded commas and newlines,
//! optional BOM, ragged rows) into raw JSON rows for the import pipeline.

use csv::{QuoteStyle, ReaderBuilder, Terminator, Trim, WriterBuilder};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::Lead;
use crate::validation::TAG_SEPARATOR;

/// Export column order. Header names double as the JSON field names read back
/// on import.
pub const CSV_HEADERS: [&str; 9] = [
    "name",
    "email",
    "phone",
    "city",
    "propertyType",
    "status",
    "timeline",
    "notes",
    "tags",
];

fn lead_record(lead: &Lead) -> [String; 9] {
    let separator = TAG_SEPARATOR.to_string();
    let tags = lead.tags.join(separator.as_str());
    [
        lead.name.clone(),
        lead.email.clone(),
        lead.phone.clone().unwrap_or_default(),
        lead.city.clone(),
        lead.property_type.to_string(),
        lead.status.to_string(),
        lead.timeline.to_string(),
        lead.notes.clone().unwrap_or_default(),
        tags,
    ]
}

/// Renders leads as CSV text: one header row, then one row per lead.
pub fn export_leads(leads: &[Lead]) -> Result<String, AppError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let write_err = |e: csv::Error| AppError::InternalError(format!("CSV write failed: {}", e));

    writer.write_record(CSV_HEADERS).map_err(write_err)?;
    for lead in leads {
        writer.write_record(lead_record(lead)).map_err(write_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::InternalError(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::InternalError(format!("CSV output is not UTF-8: {}", e)))
}

/// Filename for an export taken now.
pub fn export_filename() -> String {
    format!(
        "leads-export-{}.csv",
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    )
}

/// Parses CSV text into one JSON object per non-blank row.
///
/// Known headers map onto lead fields; other columns are dropped. Empty and
/// missing cells are left out of the row so the validator sees them as absent.
pub fn parse_csv(text: &str) -> Result<Vec<Value>, AppError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::BadRequest(format!("Invalid CSV header: {}", e)))?
        .clone();

    // Column index → field name, for recognized columns only
    let columns: Vec<(usize, &'static str)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, header)| {
            CSV_HEADERS
                .iter()
                .find(|known| **known == header)
                .map(|known| (idx, *known))
        })
        .collect();

    if columns.is_empty() {
        return Err(AppError::BadRequest(
            "CSV header has no recognized lead columns".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| AppError::BadRequest(format!("Invalid CSV row {}: {}", line + 1, e)))?;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut row = Map::new();
        for (idx, field) in &columns {
            let Some(cell) = record.get(*idx) else {
                continue;
            };
            if cell.trim().is_empty() {
                continue;
            }
            // Notes are free text and keep their whitespace
            let value = if *field == "notes" { cell } else { cell.trim() };
            row.insert(field.to_string(), Value::String(value.to_string()));
        }
        rows.push(Value::Object(row));
    }

    tracing::debug!("Parsed {} CSV rows", rows.len());
    Ok(rows)
}
