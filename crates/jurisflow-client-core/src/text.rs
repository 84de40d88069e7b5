//! Plain-text layout of rendered tables for terminals.

use crate::listing::{EmptyState, Listing, ListingBody, RowAction};
use crate::permissions::ControlState;
use crate::render::{TableModel, TableView};
use crate::view::{DisplayBody, ResponseDisplay};

pub const ACTIONS_COLUMN_LABEL: &str = "Ações";
const COLUMN_GAP: &str = "  ";

#[must_use]
pub fn layout_table(model: &TableModel) -> String {
    let header = model
        .columns
        .iter()
        .map(|column| column.label.clone())
        .collect::<Vec<_>>();
    let rows = model
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.text().to_string()).collect())
        .collect::<Vec<Vec<String>>>();
    layout_grid(&header, &rows)
}

#[must_use]
pub fn layout_view(view: &TableView) -> String {
    match view {
        TableView::Rows(model) | TableView::Fields(model) => layout_table(model),
        TableView::Empty => "Nenhum item encontrado".to_string(),
    }
}

#[must_use]
pub fn layout_empty_state(empty: &EmptyState) -> String {
    format!("{}\n{}", empty.heading, empty.detail)
}

#[must_use]
pub fn layout_listing(listing: &Listing) -> String {
    let body = match &listing.body {
        ListingBody::Empty(empty) => layout_empty_state(empty),
        ListingBody::Rows {
            table,
            actions: None,
        } => layout_table(table),
        ListingBody::Rows {
            table,
            actions: Some(actions),
        } => layout_rows_with_actions(table, actions),
        ListingBody::Fields(table) => layout_table(table),
        ListingBody::Raw(text) => text.clone(),
    };
    format!("{}\n\n{body}", listing.title)
}

#[must_use]
pub fn layout_display(display: &ResponseDisplay) -> String {
    let body = match &display.body {
        DisplayBody::Json(text) => text.clone(),
        DisplayBody::Table(view) => layout_view(view),
    };
    match display.toggle_to {
        Some(next) => format!(
            "{body}\n\n[view: {} | toggle → {}]",
            display.mode.as_str(),
            next.as_str()
        ),
        None => body,
    }
}

#[must_use]
pub fn layout_controls(states: &[ControlState]) -> String {
    let header = ["Controle", "Permissão", "Visível"].map(str::to_string);
    let rows = states
        .iter()
        .map(|state| {
            vec![
                state.control_id.clone(),
                state.required_permission.clone(),
                if state.visible { "✓" } else { "✗" }.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    layout_grid(&header, &rows)
}

fn layout_rows_with_actions(table: &TableModel, actions: &[Option<RowAction>]) -> String {
    let mut header = table
        .columns
        .iter()
        .map(|column| column.label.clone())
        .collect::<Vec<_>>();
    header.push(ACTIONS_COLUMN_LABEL.to_string());

    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let mut cells = row
                .iter()
                .map(|cell| cell.text().to_string())
                .collect::<Vec<_>>();
            let action = actions
                .get(index)
                .and_then(Option::as_ref)
                .map(|action| format!("excluir {}", action.item_id))
                .unwrap_or_default();
            cells.push(action);
            cells
        })
        .collect::<Vec<_>>();
    layout_grid(&header, &rows)
}

fn layout_grid(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = header.iter().map(|label| display_width(label)).collect::<Vec<_>>();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(display_width(cell));
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(layout_line(header, &widths));
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP),
    );
    for row in rows {
        lines.push(layout_line(row, &widths));
    }
    lines.join("\n")
}

fn layout_line(cells: &[String], widths: &[usize]) -> String {
    let padded = widths
        .iter()
        .enumerate()
        .map(|(index, width)| {
            let cell = cells.get(index).map_or("", String::as_str);
            let fill = width.saturating_sub(display_width(cell));
            format!("{cell}{}", " ".repeat(fill))
        })
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    padded.trim_end().to_string()
}

fn display_width(text: &str) -> usize {
    text.chars().count()
}
