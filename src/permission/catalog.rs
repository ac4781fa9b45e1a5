//! Canonical catalog of grantable modules, pipeline stages and admin configs.
//!
//! The catalog is configuration data, not user data. Stored documents are
//! always projected onto it, so adding an entry here makes it appear (disabled)
//! in every role on the next read. Ids must never be renumbered or reused.

/// Bumped whenever an entry is added, renamed or retired.
pub const CATALOG_VERSION: u32 = 1;

/// CRM modules as `(id, display name)`.
pub const CRM_MODULES: &[(&str, &str)] = &[
    ("customers", "Customers"),
    ("operations", "O & M"),
    ("tickets", "Tickets"),
];

/// Mission-control pipeline stages, in pipeline order.
pub const PIPELINE_STAGES: &[(&str, &str)] = &[
    ("00-chc", "CHC Marketing"),
    ("01-sales", "S Sales"),
    ("01-dd-agree", "DD Agreement"),
    ("02-dd-nt", "DD NT Doc"),
    ("02-mpeb", "MPEB NT"),
    ("02-dd-sub", "DD Subsidy & Loan"),
    ("payment", "Payment Collection"),
    ("03-design", "Design & Eng"),
    ("04-delivery", "Delivery & Install"),
    ("05-mpeb-li", "MPEB LI/Meter"),
    ("06-post", "Post-Insp"),
];

/// Admin-panel configs. Their ids double as route capability ids.
pub const ADMIN_CONFIGS: &[(&str, &str)] = &[
    (USER_MANAGEMENT, "Employee Management"),
    (ROLE_CONFIGURATION, "Role Configuration"),
];

/// Capability gating the employee screens.
pub const USER_MANAGEMENT: &str = "user-mgmt";

/// Capability gating the role template screens.
pub const ROLE_CONFIGURATION: &str = "role-config";
