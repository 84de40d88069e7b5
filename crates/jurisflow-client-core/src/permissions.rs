//! Permission-driven visibility of user-facing controls.
//!
//! The gate never owns a control. It answers "visible or not" per
//! descriptor and the front end applies the answer. Missing or malformed
//! permission data always collapses to the empty set.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const READ: &str = "read";
pub const WRITE: &str = "write";
pub const DELETE: &str = "delete";
pub const ORCHESTRATE: &str = "orchestrate";
pub const ADMIN: &str = "admin";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Reads a `permissions` claim. Anything other than an array of strings
    /// contributes nothing.
    #[must_use]
    pub fn from_claims(value: Option<&Value>) -> Self {
        let Some(Value::Array(entries)) = value else {
            return Self::empty();
        };
        entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|permission| !permission.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[must_use]
    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn has_any(&self, required: &[&str]) -> bool {
        required.iter().any(|permission| self.contains(permission))
    }

    #[must_use]
    pub fn has_all(&self, required: &[&str]) -> bool {
        !required.is_empty() && required.iter().all(|permission| self.contains(permission))
    }

    #[must_use]
    pub fn role(&self) -> UserRole {
        if self.contains(ADMIN) {
            UserRole::Admin
        } else if self.contains(ORCHESTRATE) {
            UserRole::Orchestrator
        } else if self.contains(WRITE) {
            UserRole::Editor
        } else if self.contains(READ) {
            UserRole::Viewer
        } else {
            UserRole::Guest
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Orchestrator,
    Editor,
    Viewer,
    Guest,
}

impl UserRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Orchestrator => "orchestrator",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
            Self::Guest => "guest",
        }
    }
}

/// User-facing actions that are shown or hidden by permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ListDocuments,
    CreateDocument,
    DeleteDocument,
    ListDeadlines,
    CreateDeadline,
    DeleteDeadline,
    ListHearings,
    CreateHearing,
    DeleteHearing,
    ListProcesses,
    ProcessSummary,
    OrchestrateCase,
}

impl Action {
    pub const ALL: [Self; 12] = [
        Self::ListDocuments,
        Self::CreateDocument,
        Self::DeleteDocument,
        Self::ListDeadlines,
        Self::CreateDeadline,
        Self::DeleteDeadline,
        Self::ListHearings,
        Self::CreateHearing,
        Self::DeleteHearing,
        Self::ListProcesses,
        Self::ProcessSummary,
        Self::OrchestrateCase,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListDocuments => "documents.list",
            Self::CreateDocument => "documents.create",
            Self::DeleteDocument => "documents.delete",
            Self::ListDeadlines => "deadlines.list",
            Self::CreateDeadline => "deadlines.create",
            Self::DeleteDeadline => "deadlines.delete",
            Self::ListHearings => "hearings.list",
            Self::CreateHearing => "hearings.create",
            Self::DeleteHearing => "hearings.delete",
            Self::ListProcesses => "processes.list",
            Self::ProcessSummary => "processes.summary",
            Self::OrchestrateCase => "orchestrate.file_case",
        }
    }

    #[must_use]
    pub fn required_permission(self) -> &'static str {
        match self {
            Self::ListDocuments
            | Self::ListDeadlines
            | Self::ListHearings
            | Self::ListProcesses
            | Self::ProcessSummary => READ,
            Self::CreateDocument | Self::CreateDeadline | Self::CreateHearing => WRITE,
            Self::DeleteDocument | Self::DeleteDeadline | Self::DeleteHearing => DELETE,
            Self::OrchestrateCase => ORCHESTRATE,
        }
    }

    #[must_use]
    pub fn descriptor(self) -> ControlDescriptor {
        ControlDescriptor::new(self.as_str(), self.required_permission())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDescriptor {
    pub control_id: String,
    pub required_permission: String,
}

impl ControlDescriptor {
    #[must_use]
    pub fn new(control_id: impl Into<String>, required_permission: impl Into<String>) -> Self {
        Self {
            control_id: control_id.into(),
            required_permission: required_permission.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    pub control_id: String,
    pub required_permission: String,
    pub visible: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("control `{control_id}` does not declare a required permission")]
    MissingPermission { control_id: String },
    #[error("control `{control_id}` is registered more than once")]
    DuplicateControl { control_id: String },
}

/// One visibility flag per control, in input order.
#[must_use]
pub fn compute_visibility(
    permissions: &PermissionSet,
    controls: &[ControlDescriptor],
) -> Vec<bool> {
    controls
        .iter()
        .map(|control| permissions.contains(&control.required_permission))
        .collect()
}

pub fn validate_controls(controls: &[ControlDescriptor]) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::new();
    for control in controls {
        if control.required_permission.trim().is_empty() {
            return Err(ConfigurationError::MissingPermission {
                control_id: control.control_id.clone(),
            });
        }
        if !seen.insert(control.control_id.as_str()) {
            return Err(ConfigurationError::DuplicateControl {
                control_id: control.control_id.clone(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGate {
    controls: Vec<ControlDescriptor>,
}

impl PermissionGate {
    pub fn new(controls: Vec<ControlDescriptor>) -> Result<Self, ConfigurationError> {
        validate_controls(&controls)?;
        Ok(Self { controls })
    }

    /// Gate over every [`Action`] of the product.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            controls: Action::ALL.iter().map(|action| action.descriptor()).collect(),
        }
    }

    #[must_use]
    pub fn controls(&self) -> &[ControlDescriptor] {
        &self.controls
    }

    #[must_use]
    pub fn evaluate(&self, permissions: &PermissionSet) -> Vec<ControlState> {
        let visibility = compute_visibility(permissions, &self.controls);
        tracing::debug!(
            controls = self.controls.len(),
            visible = visibility.iter().filter(|visible| **visible).count(),
            role = permissions.role().as_str(),
            "evaluated permission gate"
        );
        self.controls
            .iter()
            .zip(visibility)
            .map(|(control, visible)| ControlState {
                control_id: control.control_id.clone(),
                required_permission: control.required_permission.clone(),
                visible,
                enabled: visible,
            })
            .collect()
    }

    #[must_use]
    pub fn allows(&self, action: Action, permissions: &PermissionSet) -> bool {
        self.controls
            .iter()
            .find(|control| control.control_id == action.as_str())
            .is_some_and(|control| permissions.contains(&control.required_permission))
    }
}
