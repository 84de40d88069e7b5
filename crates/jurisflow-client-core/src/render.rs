//! Generic rendering of arbitrary JSON responses.
//!
//! Data of unknown shape is either offered as a table (rows of objects, an
//! `items` envelope, or a single object as field/value pairs) or left to the
//! JSON dump. Nothing here mutates the input or fails on odd shapes.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::response::ApiResponse;

pub const INLINE_TRUNCATE_AT: usize = 50;
pub const MODAL_TRUNCATE_AT: usize = 100;
pub const NULL_MARKER: &str = "null";
pub const SUCCESS_GLYPH: &str = "✓";
pub const FAILURE_GLYPH: &str = "✗";
pub const ELLIPSIS: &str = "...";
pub const FIELD_COLUMN_LABEL: &str = "Campo";
pub const VALUE_COLUMN_LABEL: &str = "Valor";

const ITEMS_KEY: &str = "items";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Strings longer than this many characters are truncated.
    pub truncate_at: usize,
}

impl RenderOptions {
    #[must_use]
    pub const fn inline() -> Self {
        Self {
            truncate_at: INLINE_TRUNCATE_AT,
        }
    }

    #[must_use]
    pub const fn modal() -> Self {
        Self {
            truncate_at: MODAL_TRUNCATE_AT,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::inline()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnClass {
    Identifier,
    Date,
    Status,
    Content,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub label: String,
    pub class: ColumnClass,
}

impl Column {
    fn for_key(key: &str) -> Self {
        Self {
            key: key.to_string(),
            label: column_label(key),
            class: column_class(key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Explicit `null` or a key the row does not carry.
    Null,
    Flag(bool),
    Json(String),
    Date(String),
    Truncated { shown: String, full: String },
    Text(String),
}

impl Cell {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Null => NULL_MARKER,
            Self::Flag(true) => SUCCESS_GLYPH,
            Self::Flag(false) => FAILURE_GLYPH,
            Self::Json(text) | Self::Date(text) | Self::Text(text) => text,
            Self::Truncated { shown, .. } => shown,
        }
    }

    /// Full value for truncated cells.
    #[must_use]
    pub fn tooltip(&self) -> Option<&str> {
        match self {
            Self::Truncated { full, .. } => Some(full),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableModel {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl TableModel {
    #[must_use]
    pub fn column_keys(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.key.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableView {
    Rows(TableModel),
    Fields(TableModel),
    /// `{"items": []}`: a table was possible but there is nothing to show.
    Empty,
}

#[must_use]
pub fn can_tabulate(data: &Value) -> bool {
    match data {
        Value::Array(rows) => !rows.is_empty() && rows.iter().all(Value::is_object),
        Value::Object(_) => true,
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => false,
    }
}

/// Table rendering of `data`, or `None` when only the JSON view applies.
#[must_use]
pub fn render_view(data: &Value, options: &RenderOptions) -> Option<TableView> {
    if !can_tabulate(data) {
        return None;
    }
    match data {
        Value::Array(rows) => Some(TableView::Rows(render_table(rows, options))),
        Value::Object(object) => match object.get(ITEMS_KEY) {
            Some(Value::Array(items)) if items.is_empty() => Some(TableView::Empty),
            Some(Value::Array(items)) => Some(TableView::Rows(render_table(items, options))),
            _ => Some(TableView::Fields(render_fields(object, options))),
        },
        _ => None,
    }
}

#[must_use]
pub fn render_table(rows: &[Value], options: &RenderOptions) -> TableModel {
    let columns = collect_columns(rows);
    let rows = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| format_cell(&column.key, row.get(column.key.as_str()), options))
                .collect()
        })
        .collect();
    TableModel { columns, rows }
}

#[must_use]
pub fn render_fields(object: &Map<String, Value>, options: &RenderOptions) -> TableModel {
    let columns = vec![
        Column {
            key: "field".to_string(),
            label: FIELD_COLUMN_LABEL.to_string(),
            class: ColumnClass::Identifier,
        },
        Column {
            key: "value".to_string(),
            label: VALUE_COLUMN_LABEL.to_string(),
            class: ColumnClass::Default,
        },
    ];
    let rows = object
        .iter()
        .map(|(key, value)| {
            vec![
                Cell::Text(column_label(key)),
                format_cell(key, Some(value), options),
            ]
        })
        .collect();
    TableModel { columns, rows }
}

fn collect_columns(rows: &[Value]) -> Vec<Column> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for row in rows {
        let Value::Object(object) = row else {
            continue;
        };
        for key in object.keys() {
            if seen.insert(key.as_str()) {
                columns.push(Column::for_key(key));
            }
        }
    }
    columns
}

#[must_use]
pub fn format_cell(key: &str, value: Option<&Value>, options: &RenderOptions) -> Cell {
    let text = match value {
        None | Some(Value::Null) => return Cell::Null,
        Some(Value::Bool(flag)) => return Cell::Flag(*flag),
        Some(nested @ (Value::Array(_) | Value::Object(_))) => {
            return Cell::Json(compact_json(nested));
        }
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::String(text)) => text.clone(),
    };

    if is_date_key(key) && has_iso_date_prefix(&text) {
        return Cell::Date(text);
    }

    if text.chars().count() > options.truncate_at {
        let keep = options.truncate_at.saturating_sub(ELLIPSIS.len());
        let mut shown = text.chars().take(keep).collect::<String>();
        shown.push_str(ELLIPSIS);
        return Cell::Truncated { shown, full: text };
    }

    Cell::Text(text)
}

#[must_use]
pub fn column_class(key: &str) -> ColumnClass {
    let lower = key.to_lowercase();
    if lower.contains("id") {
        ColumnClass::Identifier
    } else if is_date_key(&lower) {
        ColumnClass::Date
    } else if lower.contains("status") {
        ColumnClass::Status
    } else if lower.contains("content") || lower.contains("description") {
        ColumnClass::Content
    } else {
        ColumnClass::Default
    }
}

/// `process_id` becomes `Process Id`.
#[must_use]
pub fn column_label(key: &str) -> String {
    let mut label = String::with_capacity(key.len());
    let mut at_word_start = true;
    for ch in key.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphanumeric() {
            if at_word_start {
                label.extend(ch.to_uppercase());
            } else {
                label.push(ch);
            }
            at_word_start = false;
        } else {
            label.push(ch);
            at_word_start = true;
        }
    }
    label
}

fn is_date_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    lower.contains("date") || lower.contains("created") || lower.contains("updated")
}

fn has_iso_date_prefix(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() < 10 {
        return false;
    }
    bytes
        .iter()
        .take(10)
        .enumerate()
        .all(|(index, byte)| match index {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

#[must_use]
pub fn compact_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

#[must_use]
pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// JSON view of a response: friendly message, trace line, then the payload.
#[must_use]
pub fn render_json(response: &ApiResponse) -> String {
    let trace = response.trace_line();
    let body = pretty_json(&response.data);
    match response.friendly_message.as_deref() {
        Some(message) => format!("{message}\n\n{trace}\n\n{body}"),
        None => format!("{trace}\n\n{body}"),
    }
}
