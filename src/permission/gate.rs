//! Access decisions over resolved permission documents.
//!
//! Route capabilities are the admin-panel config ids. A disabled admin panel
//! denies every capability, even ones remembered as enabled, and a config
//! that was never set is denied as well.

use std::collections::BTreeMap;

use super::{PermissionDocument, catalog};

/// Whether the document grants the admin-panel capability `capability_id`.
pub fn can_access(doc: &PermissionDocument, capability_id: &str) -> bool {
    doc.admin_panel.enabled
        && doc
            .admin_panel
            .configs
            .iter()
            .any(|c| c.id == capability_id && c.enabled)
}

/// Whether the account may sign in to the admin panel at all.
pub fn is_admin_panel_user(doc: &PermissionDocument) -> bool {
    doc.admin_panel.enabled
}

/// Decision for every catalog capability.
pub fn capabilities(doc: &PermissionDocument) -> BTreeMap<String, bool> {
    catalog::ADMIN_CONFIGS
        .iter()
        .map(|(id, _)| ((*id).to_string(), can_access(doc, id)))
        .collect()
}
