//! Module trait for pluggable API modules.
//!
//! Each resource of the API is a module that registers its procedures with
//! the router. See [`crate::api::modules`] for the full set.
//!
//! # Example
//!
//! ```ignore
//! use roster::{Module, Router};
//!
//! pub struct DepartmentsModule;
//!
//! impl Module for DepartmentsModule {
//!     fn name(&self) -> &'static str {
//!         "departments"
//!     }
//!
//!     fn routes(&self, router: &mut Router) {
//!         router.procedure::<ListDepartments>();
//!     }
//! }
//! ```

use crate::router::Router;

/// A pluggable API module.
pub trait Module: Send + Sync {
    /// Module name for identification and logging.
    fn name(&self) -> &'static str;

    /// Register routes with the router.
    fn routes(&self, router: &mut Router);
}
