//! Process summaries, the process list and date display.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use serde_json::{Value, json};

use crate::records::validate_process_id;
use crate::records::RecordInputError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub documents: Vec<Value>,
    pub deadlines: Vec<Value>,
    pub hearings: Vec<Value>,
}

impl ProcessSummary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.deadlines.is_empty() && self.hearings.is_empty()
    }
}

/// Accepts `{summary: {...}}` or the bare object. Hearings may arrive as an
/// array or wrapped in `{items: [...]}`. Anything unrecognized is empty.
#[must_use]
pub fn parse_process_summary(data: &Value) -> ProcessSummary {
    let summary = data.get("summary").filter(|summary| summary.is_object()).unwrap_or(data);
    let list = |key: &str| {
        summary
            .get(key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };
    let hearings = match summary.get("hearings") {
        Some(Value::Array(hearings)) => hearings.clone(),
        Some(wrapped @ Value::Object(_)) => wrapped
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    ProcessSummary {
        documents: list("documents"),
        deadlines: list("deadlines"),
        hearings,
    }
}

pub fn summary_path(process_id: &str) -> Result<String, RecordInputError> {
    validate_process_id(process_id).map(|id| format!("/api/process/{id}/summary"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessEntry {
    pub process_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub documents: usize,
    pub deadlines: usize,
    pub hearings: usize,
}

impl ProcessEntry {
    fn new(process_id: &str) -> Self {
        Self {
            process_id: process_id.to_string(),
            name: format!("Processo {process_id}"),
            ..Self::default()
        }
    }

    fn touch(&mut self, created_at: Option<&str>) {
        let Some(created_at) = created_at else {
            return;
        };
        if self.created_at.as_deref().is_none_or(|current| created_at > current) {
            self.created_at = Some(created_at.to_string());
        }
    }
}

/// Entries from a `/api/processes` payload (array or `{items}`). Items
/// without an identifier are skipped.
#[must_use]
pub fn processes_from_listing(data: &Value) -> Vec<ProcessEntry> {
    let items = match data {
        Value::Array(items) => items.as_slice(),
        other => other
            .get("items")
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice),
    };
    let mut entries = items
        .iter()
        .filter_map(|item| {
            let id = ["process_id", "number", "id"]
                .iter()
                .find_map(|key| text_field(item, key))?;
            let mut entry = ProcessEntry::new(&id);
            if let Some(title) = text_field(item, "title") {
                entry.name = title;
            }
            entry.status = text_field(item, "status");
            entry.created_at = text_field(item, "created_at");
            Some(entry)
        })
        .collect::<Vec<_>>();
    sort_entries(&mut entries);
    entries
}

/// Distinct process ids referenced by documents, deadlines and hearings.
#[must_use]
pub fn aggregate_processes(
    documents: &Value,
    deadlines: &Value,
    hearings: &Value,
) -> Vec<ProcessEntry> {
    let mut by_id = BTreeMap::<String, ProcessEntry>::new();
    let sources: [(&Value, fn(&mut ProcessEntry)); 3] = [
        (documents, |entry| entry.documents += 1),
        (deadlines, |entry| entry.deadlines += 1),
        (hearings, |entry| entry.hearings += 1),
    ];
    for (payload, count) in sources {
        for record in records_of(payload) {
            let Some(process_id) = text_field(record, "process_id") else {
                continue;
            };
            let entry = by_id
                .entry(process_id.clone())
                .or_insert_with(|| ProcessEntry::new(&process_id));
            count(entry);
            entry.touch(record.get("created_at").and_then(Value::as_str));
        }
    }
    let mut entries = by_id.into_values().collect::<Vec<_>>();
    sort_entries(&mut entries);
    entries
}

#[must_use]
pub fn processes_to_json(entries: &[ProcessEntry]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|entry| {
                serde_json::to_value(entry)
                    .unwrap_or_else(|_| json!({"process_id": entry.process_id}))
            })
            .collect(),
    )
}

fn records_of(payload: &Value) -> &[Value] {
    match payload {
        Value::Array(records) => records,
        other => other
            .get("items")
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice),
    }
}

/// Newest first; entries without `created_at` go last, ties by id.
fn sort_entries(entries: &mut [ProcessEntry]) {
    entries.sort_by(|left, right| match (&left.created_at, &right.created_at) {
        (Some(a), Some(b)) => b.cmp(a).then_with(|| left.process_id.cmp(&right.process_id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => left.process_id.cmp(&right.process_id),
    });
}

fn text_field(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// `dd/mm/yyyy HH:MM`, or `dd/mm/yyyy` for date-only values, midnight, or
/// when `include_time` is false. Blank input shows `N/A`; anything
/// unparseable is returned unchanged.
#[must_use]
pub fn format_display_date(raw: &str, include_time: bool) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "N/A".to_string();
    }
    let Some(parsed) = parse_timestamp(trimmed) else {
        return raw.to_string();
    };
    if !include_time || (parsed.hour() == 0 && parsed.minute() == 0) {
        parsed.format("%d/%m/%Y").to_string()
    } else {
        parsed.format("%d/%m/%Y %H:%M").to_string()
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_local());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(naive);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_accepts_wrapped_and_bare_shapes() {
        let wrapped = json!({"summary": {
            "documents": [{"id": 1}],
            "deadlines": [],
            "hearings": {"items": [{"id": 2}, {"id": 3}]}
        }});
        let summary = parse_process_summary(&wrapped);
        assert_eq!(summary.documents.len(), 1);
        assert_eq!(summary.hearings.len(), 2);

        let bare = json!({"documents": "n/a", "hearings": [{"id": 4}]});
        let summary = parse_process_summary(&bare);
        assert!(summary.documents.is_empty());
        assert_eq!(summary.hearings.len(), 1);
        assert!(parse_process_summary(&json!(null)).is_empty());
    }

    #[test]
    fn summary_path_validates_process_id() {
        assert_eq!(summary_path(" P-1 ").as_deref(), Ok("/api/process/P-1/summary"));
        assert!(summary_path("").is_err());
    }

    #[test]
    fn aggregation_collects_distinct_ids_newest_first() {
        let documents = json!([
            {"process_id": "P-1", "created_at": "2026-01-01T10:00:00"},
            {"process_id": "P-2", "created_at": "2026-02-01T10:00:00"},
            {"title": "sem processo"}
        ]);
        let deadlines = json!([{"process_id": "P-1", "created_at": "2026-03-01T10:00:00"}]);
        let hearings = json!({"items": [{"process_id": "P-3"}, {"process_id": "P-1"}]});

        let entries = aggregate_processes(&documents, &deadlines, &hearings);
        let ids = entries.iter().map(|entry| entry.process_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["P-1", "P-2", "P-3"]);
        assert_eq!(entries[0].documents, 1);
        assert_eq!(entries[0].deadlines, 1);
        assert_eq!(entries[0].hearings, 1);
        assert_eq!(entries[0].created_at.as_deref(), Some("2026-03-01T10:00:00"));
        assert_eq!(entries[2].name, "Processo P-3");
    }

    #[test]
    fn aggregation_ignores_error_payloads() {
        let entries = aggregate_processes(&json!({"error": "down"}), &json!("oops"), &Value::Null);
        assert!(entries.is_empty());
    }

    #[test]
    fn listing_entries_use_known_identifier_keys() {
        let entries = processes_from_listing(&json!({"items": [
            {"number": "PROC-2", "title": "Ação de cobrança", "status": "open"},
            {"id": 9},
            {"title": "sem id"}
        ]}));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].process_id, "9");
        assert_eq!(entries[1].name, "Ação de cobrança");
        assert_eq!(entries[1].status.as_deref(), Some("open"));
    }

    #[test]
    fn display_dates() {
        assert_eq!(format_display_date("2026-03-05T14:07:00", true), "05/03/2026 14:07");
        assert_eq!(format_display_date("2026-03-05T14:07:00", false), "05/03/2026");
        assert_eq!(format_display_date("2026-03-05T00:00:00Z", true), "05/03/2026");
        assert_eq!(format_display_date("2026-03-05", true), "05/03/2026");
        assert_eq!(format_display_date("2026-03-05T09:30:00-03:00", true), "05/03/2026 09:30");
        assert_eq!(format_display_date("amanhã", true), "amanhã");
        assert_eq!(format_display_date("  ", true), "N/A");
    }
}
