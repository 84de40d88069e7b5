//! Resource listings: row tables with an explicit empty state and
//! permission-gated delete actions.

use serde_json::{Map, Value};

use crate::permissions::{self, Action, PermissionSet};
use crate::render::{self, RenderOptions, TableModel};

const ITEM_ID_KEYS: [&str; 5] = ["id", "_id", "document_id", "deadline_id", "hearing_id"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Documents,
    Deadlines,
    Hearings,
    Processes,
}

impl Resource {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Documents => "/api/documents",
            Self::Deadlines => "/api/deadlines",
            Self::Hearings => "/api/hearings",
            Self::Processes => "/api/processes",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Documents => "Documentos",
            Self::Deadlines => "Prazos",
            Self::Hearings => "Audiências",
            Self::Processes => "Processos",
        }
    }

    /// Singular noun used in confirmations.
    #[must_use]
    pub fn noun(self) -> &'static str {
        match self {
            Self::Documents => "documento",
            Self::Deadlines => "prazo",
            Self::Hearings => "audiência",
            Self::Processes => "processo",
        }
    }

    #[must_use]
    pub fn is_deletable(self) -> bool {
        self.delete_action().is_some()
    }

    #[must_use]
    pub fn list_action(self) -> Action {
        match self {
            Self::Documents => Action::ListDocuments,
            Self::Deadlines => Action::ListDeadlines,
            Self::Hearings => Action::ListHearings,
            Self::Processes => Action::ListProcesses,
        }
    }

    #[must_use]
    pub fn delete_action(self) -> Option<Action> {
        match self {
            Self::Documents => Some(Action::DeleteDocument),
            Self::Deadlines => Some(Action::DeleteDeadline),
            Self::Hearings => Some(Action::DeleteHearing),
            Self::Processes => None,
        }
    }

    #[must_use]
    pub fn item_path(self, id: &str) -> String {
        format!("{}/{}", self.path(), id.trim())
    }

    /// Listing filtered to one day. Only deadlines and hearings support it.
    #[must_use]
    pub fn dated_path(self, date: chrono::NaiveDate) -> Option<String> {
        let day = date.format("%Y-%m-%d");
        match self {
            Self::Deadlines => Some(format!("{}?due_date={day}", self.path())),
            Self::Hearings => Some(format!("{}?date={day}", self.path())),
            Self::Documents | Self::Processes => None,
        }
    }

    #[must_use]
    pub fn item_id(self, item: &Value) -> Option<String> {
        ITEM_ID_KEYS.iter().find_map(|key| match item.get(*key)? {
            Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        })
    }

    #[must_use]
    pub fn item_description(self, item: &Value) -> String {
        let keys: &[&str] = match self {
            Self::Documents => &["title", "name"],
            Self::Deadlines | Self::Hearings => &["description"],
            Self::Processes => &["title", "process_id"],
        };
        keys.iter()
            .find_map(|key| item.get(*key).and_then(Value::as_str))
            .filter(|text| !text.trim().is_empty())
            .map_or_else(|| self.noun().to_string(), str::to_string)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub heading: String,
    pub detail: String,
}

impl EmptyState {
    #[must_use]
    pub fn for_resource(resource: Resource) -> Self {
        Self {
            heading: "Nenhum item encontrado".to_string(),
            detail: format!(
                "Não há {} cadastrados no sistema.",
                resource.title().to_lowercase()
            ),
        }
    }
}

/// Delete action attached to one listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowAction {
    pub item_id: String,
    pub path: String,
    pub description: String,
}

impl RowAction {
    #[must_use]
    pub fn confirmation(&self, resource: Resource) -> String {
        format!(
            "Deseja excluir este {}? {} será excluído permanentemente. \
             Esta ação não pode ser desfeita.",
            resource.noun(),
            self.description
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingBody {
    Empty(EmptyState),
    Rows {
        table: TableModel,
        /// One slot per row when the viewer may delete; rows without an id
        /// get `None`. Absent entirely when deletion is not offered.
        actions: Option<Vec<Option<RowAction>>>,
    },
    Fields(TableModel),
    /// Scalar payloads have no table form.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub resource: Resource,
    pub title: &'static str,
    pub body: ListingBody,
}

#[must_use]
pub fn render_listing(
    resource: Resource,
    data: &Value,
    options: &RenderOptions,
    permissions: &PermissionSet,
) -> Listing {
    let body = match data {
        Value::Null => ListingBody::Empty(EmptyState::for_resource(resource)),
        Value::Array(items) => rows_body(resource, items, options, permissions),
        Value::Object(object) => match object.get("items") {
            Some(Value::Array(items)) => rows_body(resource, items, options, permissions),
            _ => fields_body(object, options),
        },
        scalar => ListingBody::Raw(render::pretty_json(scalar)),
    };
    Listing {
        resource,
        title: resource.title(),
        body,
    }
}

fn rows_body(
    resource: Resource,
    items: &[Value],
    options: &RenderOptions,
    permissions: &PermissionSet,
) -> ListingBody {
    if items.is_empty() {
        return ListingBody::Empty(EmptyState::for_resource(resource));
    }
    let table = render::render_table(items, options);
    let actions = (resource.is_deletable() && permissions.contains(permissions::DELETE)).then(|| {
        items
            .iter()
            .map(|item| {
                resource.item_id(item).map(|item_id| RowAction {
                    path: resource.item_path(&item_id),
                    description: resource.item_description(item),
                    item_id,
                })
            })
            .collect()
    });
    ListingBody::Rows { table, actions }
}

fn fields_body(object: &Map<String, Value>, options: &RenderOptions) -> ListingBody {
    ListingBody::Fields(render::render_fields(object, options))
}
