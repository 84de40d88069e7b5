use serde::{Deserialize, Serialize};

use crate::render::{RenderOptions, TableView, can_tabulate, render_json, render_view};
use crate::response::ApiResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Json,
    Table,
}

impl ViewMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Table => "table",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "table" | "tabela" => Some(Self::Table),
            _ => None,
        }
    }
}

#[must_use]
pub fn toggle_view(current: ViewMode) -> ViewMode {
    match current {
        ViewMode::Json => ViewMode::Table,
        ViewMode::Table => ViewMode::Json,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayBody {
    Json(String),
    Table(TableView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDisplay {
    pub mode: ViewMode,
    /// Mode the toggle control would switch to; `None` hides the toggle.
    pub toggle_to: Option<ViewMode>,
    pub body: DisplayBody,
}

/// Holder for the single "last response" slot and the current view mode.
///
/// Each recorded response replaces the previous one. The view mode sticks
/// across responses, but is forced back to JSON whenever the current
/// response cannot be tabulated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_response: Option<ApiResponse>,
    #[serde(default)]
    mode: ViewMode,
}

impl ViewState {
    pub fn record(&mut self, response: ApiResponse) -> &ApiResponse {
        self.last_response.insert(response)
    }

    #[must_use]
    pub fn last_response(&self) -> Option<&ApiResponse> {
        self.last_response.as_ref()
    }

    pub fn clear(&mut self) {
        self.last_response = None;
        self.mode = ViewMode::Json;
    }

    #[must_use]
    pub fn can_toggle(&self) -> bool {
        self.last_response
            .as_ref()
            .is_some_and(|response| can_tabulate(&response.data))
    }

    /// Effective mode for the current response.
    #[must_use]
    pub fn mode(&self) -> ViewMode {
        if self.can_toggle() {
            self.mode
        } else {
            ViewMode::Json
        }
    }

    pub fn toggle(&mut self) -> ViewMode {
        self.set_mode(toggle_view(self.mode()))
    }

    pub fn set_mode(&mut self, mode: ViewMode) -> ViewMode {
        self.mode = if self.can_toggle() { mode } else { ViewMode::Json };
        self.mode
    }

    pub fn display(&mut self, options: &RenderOptions) -> Option<ResponseDisplay> {
        let can_toggle = self.can_toggle();
        if !can_toggle {
            self.mode = ViewMode::Json;
        }
        let response = self.last_response.as_ref()?;

        let table = match self.mode {
            ViewMode::Table => render_view(&response.data, options),
            ViewMode::Json => None,
        };
        let (mode, body) = match table {
            Some(view) => (ViewMode::Table, DisplayBody::Table(view)),
            None => (ViewMode::Json, DisplayBody::Json(render_json(response))),
        };

        Some(ResponseDisplay {
            mode,
            toggle_to: can_toggle.then(|| toggle_view(mode)),
            body,
        })
    }
}
