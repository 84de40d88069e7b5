//! Front-end agnostic core of the JurisFlow client.
//!
//! Rendering ([`render`], [`view`], [`listing`], [`text`]) and permission
//! gating ([`permissions`]) are pure. [`session::ClientSession`] ties them to
//! an [`response::ApiTransport`] and a [`session::SessionStore`].

pub mod auth;
pub mod listing;
pub mod messages;
pub mod permissions;
pub mod process;
pub mod records;
pub mod registration;
pub mod render;
pub mod response;
pub mod session;
pub mod text;
pub mod view;

pub use permissions::{
    Action, ConfigurationError, ControlDescriptor, ControlState, PermissionGate, PermissionSet,
    compute_visibility,
};
pub use render::{RenderOptions, TableModel, TableView, can_tabulate, render_json, render_table};
pub use response::{ApiError, ApiResponse, ApiTransport, HttpMethod, NetworkError};
pub use session::{ClientSession, SessionError, SessionStore, StoredSession};
pub use view::{ViewMode, ViewState, toggle_view};
