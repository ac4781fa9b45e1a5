//! Overlaying partial permission documents onto a complete base.

use serde::Deserialize;

use super::{PermissionDocument, ToggleGrant};

/// A possibly incomplete permission document, as found in storage or in a
/// request body after normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialDocument {
    pub crm: Option<PartialGroup>,
    pub mission_control: Option<PartialGroup>,
    pub admin_panel: Option<PartialGroup>,
}

/// A group whose switch and sub-grant list may each be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialGroup {
    pub enabled: Option<bool>,
    pub grants: Option<Vec<PartialGrant>>,
}

/// A sub-grant with only the flags that were present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PartialGrant {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub view: Option<bool>,
    #[serde(default)]
    pub edit: Option<bool>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl From<&PermissionDocument> for PartialDocument {
    fn from(doc: &PermissionDocument) -> Self {
        let toggles = |grants: &[ToggleGrant]| {
            grants
                .iter()
                .map(|g| PartialGrant {
                    id: Some(g.id.clone()),
                    enabled: Some(g.enabled),
                    ..Default::default()
                })
                .collect()
        };
        Self {
            crm: Some(PartialGroup {
                enabled: Some(doc.crm.enabled),
                grants: Some(
                    doc.crm
                        .modules
                        .iter()
                        .map(|m| PartialGrant {
                            id: Some(m.id.clone()),
                            view: Some(m.view),
                            edit: Some(m.edit),
                            enabled: None,
                        })
                        .collect(),
                ),
            }),
            mission_control: Some(PartialGroup {
                enabled: Some(doc.mission_control.enabled),
                grants: Some(toggles(&doc.mission_control.stages)),
            }),
            admin_panel: Some(PartialGroup {
                enabled: Some(doc.admin_panel.enabled),
                grants: Some(toggles(&doc.admin_panel.configs)),
            }),
        }
    }
}

impl From<PermissionDocument> for PartialDocument {
    fn from(doc: PermissionDocument) -> Self {
        Self::from(&doc)
    }
}

/// Merge `partial` onto `base`.
///
/// Groups missing from `partial` keep the base value. For a present group,
/// `enabled` overrides the base when given, and each base sub-grant takes the
/// flags of the first partial grant with the same id. The base's sub-grant
/// list (ids, names, order) is always preserved; partial grants with unknown
/// ids are dropped.
pub fn merge(base: &PermissionDocument, partial: &PartialDocument) -> PermissionDocument {
    let mut out = base.clone();

    if let Some(group) = &partial.crm {
        out.crm.enabled = group.enabled.unwrap_or(base.crm.enabled);
        if let Some(grants) = &group.grants {
            for module in &mut out.crm.modules {
                if let Some(p) = find(grants, &module.id) {
                    module.view = p.view.unwrap_or(module.view);
                    module.edit = p.edit.unwrap_or(module.edit);
                }
            }
        }
    }

    if let Some(group) = &partial.mission_control {
        out.mission_control.enabled = group.enabled.unwrap_or(base.mission_control.enabled);
        overlay_toggles(&mut out.mission_control.stages, group.grants.as_deref());
    }

    if let Some(group) = &partial.admin_panel {
        out.admin_panel.enabled = group.enabled.unwrap_or(base.admin_panel.enabled);
        overlay_toggles(&mut out.admin_panel.configs, group.grants.as_deref());
    }

    out
}

fn overlay_toggles(target: &mut [ToggleGrant], grants: Option<&[PartialGrant]>) {
    let Some(grants) = grants else { return };
    for grant in target {
        if let Some(p) = find(grants, &grant.id) {
            grant.enabled = p.enabled.unwrap_or(grant.enabled);
        }
    }
}

fn find<'a>(grants: &'a [PartialGrant], id: &str) -> Option<&'a PartialGrant> {
    grants.iter().find(|g| g.id.as_deref() == Some(id))
}
