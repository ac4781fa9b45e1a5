//! Database connection handle.
//!
//! Supports:
//! - Local SQLite file: `path/to/db.sqlite` or `file:path` or `sqlite://path`
//! - In-memory: `:memory:`
//!
//! The [`Handle`] is passed explicitly to every request. It is created "not
//! ready" and only hands out connections after schema reconciliation has
//! finished, so requests arriving during startup fail fast with
//! [`Error::NotReady`](crate::Error::NotReady) instead of touching a
//! half-migrated store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use libsql::{Builder, Connection, Database};

use crate::schema;

pub use libsql::Connection as DbConnection;

/// Open the database.
///
/// # URL formats
/// - Local file: `mydata.db`, `file:path/to/db.sqlite`, `sqlite://path`
/// - In-memory: `:memory:`
pub async fn connect(url: &str) -> crate::Result<Database> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("file:"))
        .unwrap_or(url);
    if path.is_empty() {
        return Err(crate::Error::Config("Database URL is empty".into()));
    }
    Ok(Builder::new_local(path).build().await?)
}

/// Shared store handle with a readiness gate.
///
/// All requests share one connection. An in-memory database only lives as
/// long as its connection, and single statements are all the API issues.
#[derive(Clone)]
pub struct Handle {
    _db: Arc<Database>,
    conn: Connection,
    ready: Arc<AtomicBool>,
}

impl Handle {
    /// Open the database at `url`. The handle starts out not ready.
    pub async fn open(url: &str) -> crate::Result<Self> {
        let db = connect(url).await?;
        let conn = db.connect()?;
        Ok(Self {
            _db: Arc::new(db),
            conn,
            ready: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Open, reconcile the schema and mark ready in one step.
    pub async fn open_ready(url: &str) -> crate::Result<Self> {
        let handle = Self::open(url).await?;
        handle.reconcile().await;
        Ok(handle)
    }

    /// Run schema reconciliation, then start serving connections.
    pub async fn reconcile(&self) -> schema::Report {
        let report = schema::reconcile(&self.conn).await;
        self.mark_ready();
        report
    }

    /// Connection for a request. Fails with `NotReady` during startup.
    pub fn connection(&self) -> crate::Result<&Connection> {
        if self.is_ready() {
            Ok(&self.conn)
        } else {
            Err(crate::Error::NotReady)
        }
    }

    /// Whether reconciliation has completed.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Allow requests through.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Connection that bypasses the readiness gate, for setup and tests.
    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }
}
