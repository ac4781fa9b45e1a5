//! Roster - employee and role administration API.
//!
//! Employees inherit a [`PermissionDocument`](permission::PermissionDocument)
//! from their role. The document has three toggleable groups (CRM modules,
//! mission-control stages and admin-panel configs) and is resolved from
//! whatever shape the store holds, so legacy and malformed rows still read as
//! a complete document that denies by default.
//!
//! - **Permission**: document model, normalization, catalog merge and gate
//! - **Schema**: ordered, precondition-checked reconciliation of the store
//! - **Store**: SQL access per entity over libsql
//! - **Api**: REST modules registered as procedures with OpenAPI metadata
//! - **Server**: Hyper-based HTTP server with CORS and request ids
//! - **Config**: Layered configuration (file → env → CLI)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use roster::{ConfigLoader, DbHandle, config::Overrides, mail::LogMailer};
//!
//! #[tokio::main]
//! async fn main() -> roster::Result<()> {
//!     let config = Arc::new(ConfigLoader::default().load(None, &Overrides::default())?);
//!     let db = DbHandle::open(&config.database.url).await?;
//!     let mailer = Arc::new(LogMailer::new(config.mail.sender.clone()));
//!
//!     let server = roster::server::start(
//!         config,
//!         Some(db.clone()),
//!         mailer,
//!         roster::api::router().into_handle(),
//!     )
//!     .await?;
//!     db.reconcile().await;
//!     tokio::signal::ctrl_c().await?;
//!     server.shutdown().await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod mail;
pub mod model;
pub mod module;
pub mod openapi;
pub mod operation;
pub mod permission;
pub mod procedure;
pub mod response;
pub mod router;
pub mod schema;
pub mod server;
pub mod store;

// Re-export main types at crate root
pub use config::{Config, ConfigLoader, Posture};
pub use db::Handle as DbHandle;
pub use error::{Error, Result};
pub use module::Module;
pub use openapi::Info;
pub use permission::PermissionDocument;
pub use procedure::{Empty, Meta, Procedure};
pub use router::{Context, Router};
