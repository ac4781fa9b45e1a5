//! Role permission documents.
//!
//! A [`PermissionDocument`] is the full grant structure attached to a role. It
//! has three independently toggleable groups (CRM modules, mission-control
//! pipeline stages and admin-panel configs). A sub-grant only takes effect
//! while its group is enabled, so a document may remember a grant as `true`
//! under a disabled group.
//!
//! Documents are immutable values: every edit goes through a pure transform
//! that returns a new document. Parsing never fails; anything that cannot be
//! understood resolves to [`PermissionDocument::default`], which grants
//! nothing.
//!
//! # Example
//!
//! ```
//! use roster::permission::{Flag, Group, PermissionDocument, gate};
//!
//! let doc = PermissionDocument::default()
//!     .with_group_enabled(Group::AdminPanel, true)
//!     .with_sub_grant(Group::AdminPanel, "user-mgmt", Flag::Enabled, true);
//!
//! assert!(gate::can_access(&doc, "user-mgmt"));
//! assert!(!gate::can_access(&doc, "role-config"));
//! ```

pub mod catalog;
pub mod gate;
pub mod merge;
pub mod normalize;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use merge::{PartialDocument, PartialGrant, PartialGroup, merge};
pub use normalize::normalize;

/// Full grant structure attached to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDocument {
    pub crm: CrmGroup,
    pub mission_control: MissionControlGroup,
    pub admin_panel: AdminPanelGroup,
}

/// CRM access: per-module view and edit grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CrmGroup {
    pub enabled: bool,
    pub modules: Vec<ModuleGrant>,
}

/// A CRM module grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ModuleGrant {
    pub id: String,
    pub name: String,
    pub view: bool,
    pub edit: bool,
}

/// Mission-control access: one toggle per pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MissionControlGroup {
    pub enabled: bool,
    pub stages: Vec<ToggleGrant>,
}

/// Admin-panel access: one toggle per config screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AdminPanelGroup {
    pub enabled: bool,
    pub configs: Vec<ToggleGrant>,
}

/// A single on/off sub-grant (pipeline stage or admin config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToggleGrant {
    pub id: String,
    pub name: String,
    pub enabled: bool,
}

/// Top-level capability group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Crm,
    MissionControl,
    AdminPanel,
}

impl Group {
    pub const ALL: [Group; 3] = [Group::Crm, Group::MissionControl, Group::AdminPanel];

    /// JSON key of the group.
    pub fn key(self) -> &'static str {
        match self {
            Group::Crm => "crm",
            Group::MissionControl => "missionControl",
            Group::AdminPanel => "adminPanel",
        }
    }

    /// Display label used in notifications.
    pub fn label(self) -> &'static str {
        match self {
            Group::Crm => "CRM",
            Group::MissionControl => "Mission Control",
            Group::AdminPanel => "Admin Panel",
        }
    }
}

/// Field of a sub-grant. CRM modules carry `View` and `Edit`; stages and
/// configs carry `Enabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    View,
    Edit,
    Enabled,
}

impl ToggleGrant {
    fn from_catalog(entries: &[(&str, &str)]) -> Vec<ToggleGrant> {
        entries
            .iter()
            .map(|(id, name)| ToggleGrant {
                id: (*id).to_string(),
                name: (*name).to_string(),
                enabled: false,
            })
            .collect()
    }
}

impl Default for PermissionDocument {
    /// All groups disabled, every catalog sub-grant present and `false`.
    fn default() -> Self {
        Self {
            crm: CrmGroup {
                enabled: false,
                modules: catalog::CRM_MODULES
                    .iter()
                    .map(|(id, name)| ModuleGrant {
                        id: (*id).to_string(),
                        name: (*name).to_string(),
                        view: false,
                        edit: false,
                    })
                    .collect(),
            },
            mission_control: MissionControlGroup {
                enabled: false,
                stages: ToggleGrant::from_catalog(catalog::PIPELINE_STAGES),
            },
            admin_panel: AdminPanelGroup {
                enabled: false,
                configs: ToggleGrant::from_catalog(catalog::ADMIN_CONFIGS),
            },
        }
    }
}

impl PermissionDocument {
    /// Whether a group is switched on.
    pub fn group_enabled(&self, group: Group) -> bool {
        match group {
            Group::Crm => self.crm.enabled,
            Group::MissionControl => self.mission_control.enabled,
            Group::AdminPanel => self.admin_panel.enabled,
        }
    }

    /// Stored value of a sub-grant flag, ignoring the group switch.
    ///
    /// Total: unknown ids and flags that do not belong to the group read as
    /// `false`.
    pub fn flag(&self, group: Group, id: &str, flag: Flag) -> bool {
        match (group, flag) {
            (Group::Crm, Flag::View) => self.module(id).is_some_and(|m| m.view),
            (Group::Crm, Flag::Edit) => self.module(id).is_some_and(|m| m.edit),
            (Group::MissionControl, Flag::Enabled) => toggle(&self.mission_control.stages, id),
            (Group::AdminPanel, Flag::Enabled) => toggle(&self.admin_panel.configs, id),
            _ => false,
        }
    }

    fn module(&self, id: &str) -> Option<&ModuleGrant> {
        self.crm.modules.iter().find(|m| m.id == id)
    }

    /// Copy of the document with a group switched on or off.
    pub fn with_group_enabled(&self, group: Group, enabled: bool) -> Self {
        let mut next = self.clone();
        match group {
            Group::Crm => next.crm.enabled = enabled,
            Group::MissionControl => next.mission_control.enabled = enabled,
            Group::AdminPanel => next.admin_panel.enabled = enabled,
        }
        next
    }

    /// Copy of the document with one sub-grant flag set.
    ///
    /// An unknown id, or a flag the group does not carry, returns an
    /// unchanged copy.
    pub fn with_sub_grant(&self, group: Group, id: &str, flag: Flag, value: bool) -> Self {
        let mut next = self.clone();
        match (group, flag) {
            (Group::Crm, Flag::View | Flag::Edit) => {
                if let Some(module) = next.crm.modules.iter_mut().find(|m| m.id == id) {
                    if flag == Flag::View {
                        module.view = value;
                    } else {
                        module.edit = value;
                    }
                }
            }
            (Group::MissionControl, Flag::Enabled) => {
                set_toggle(&mut next.mission_control.stages, id, value);
            }
            (Group::AdminPanel, Flag::Enabled) => {
                set_toggle(&mut next.admin_panel.configs, id, value);
            }
            _ => {}
        }
        next
    }

    /// Groups that are switched on, in catalog order.
    pub fn enabled_groups(&self) -> Vec<Group> {
        Group::ALL
            .into_iter()
            .filter(|g| self.group_enabled(*g))
            .collect()
    }

    /// JSON value of the document.
    pub fn serialize(&self) -> Value {
        // A struct of strings and bools always converts.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// JSON text stored in the role's `permissions` column.
    pub fn to_json_text(&self) -> String {
        self.serialize().to_string()
    }

    /// Resolve any stored or submitted value into a complete document.
    ///
    /// Legacy shapes are normalized, partial documents are merged onto the
    /// default, and anything unparseable falls back to the default.
    pub fn deserialize(raw: &Value) -> Self {
        match normalize(raw) {
            Ok(partial) => merge(&Self::default(), &partial),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable permission document, using default");
                Self::default()
            }
        }
    }

    /// Resolve the text of a `permissions` column. `None` and blank text
    /// resolve to the default.
    pub fn from_json_text(raw: Option<&str>) -> Self {
        let Some(text) = raw.filter(|t| !t.trim().is_empty()) else {
            return Self::default();
        };
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::deserialize(&value),
            Err(e) => {
                tracing::warn!(error = %e, "malformed permission JSON, using default");
                Self::default()
            }
        }
    }
}

fn toggle(grants: &[ToggleGrant], id: &str) -> bool {
    grants.iter().any(|g| g.id == id && g.enabled)
}

fn set_toggle(grants: &mut [ToggleGrant], id: &str, value: bool) {
    if let Some(grant) = grants.iter_mut().find(|g| g.id == id) {
        grant.enabled = value;
    }
}
