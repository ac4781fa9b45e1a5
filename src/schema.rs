//! Startup schema reconciliation.
//!
//! Brings any earlier layout of the store to the current one: employees
//! reference roles and departments by id, permissions live as one JSON
//! document on the role, and the department lookup table is singular.
//!
//! Reconciliation is an ordered list of [`Step`]s. Each step names the
//! conditions under which it still has work to do; when they do not hold the
//! step reports [`Outcome::AlreadyApplied`] without touching the store. A
//! failing step is logged and reported, and the remaining steps still run.
//! Running reconciliation twice is a no-op the second time.

use libsql::Connection;
use libsql::params::IntoParams;
use tracing::{debug, info, warn};

/// Departments inserted into an empty store.
pub const SEED_DEPARTMENTS: &[&str] = &[
    "Operations",
    "Sales",
    "Engineering",
    "HR",
    "Finance",
    "Marketing",
];

/// A condition that must hold for a step to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    TableExists(&'static str),
    TableMissing(&'static str),
    ColumnExists(&'static str, &'static str),
    ColumnMissing(&'static str, &'static str),
    TableEmpty(&'static str),
}

/// One structural change.
#[derive(Debug, Clone)]
pub struct Step {
    pub name: &'static str,
    /// All must hold for the step to run.
    pub when: Vec<Check>,
    pub sql: String,
}

/// Result of a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    AlreadyApplied,
    Failed(String),
}

/// Outcome of every step, in order.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub outcomes: Vec<(&'static str, Outcome)>,
}

impl Report {
    /// Outcome of the named step.
    pub fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, o)| o)
    }

    /// Names of the steps that changed the store.
    pub fn applied(&self) -> Vec<&'static str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == Outcome::Applied)
            .map(|(n, _)| *n)
            .collect()
    }

    /// Steps that failed, with the reason.
    pub fn failed(&self) -> Vec<(&'static str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(n, o)| match o {
                Outcome::Failed(reason) => Some((*n, reason.as_str())),
                _ => None,
            })
            .collect()
    }
}

fn step(name: &'static str, when: Vec<Check>, sql: impl Into<String>) -> Step {
    Step {
        name,
        when,
        sql: sql.into(),
    }
}

fn drop_column(name: &'static str, table: &'static str, column: &'static str) -> Step {
    step(
        name,
        vec![Check::ColumnExists(table, column)],
        format!("ALTER TABLE {table} DROP COLUMN {column}"),
    )
}

/// The reconciliation plan, in execution order.
pub fn steps() -> Vec<Step> {
    use Check::*;

    let seed = SEED_DEPARTMENTS
        .iter()
        .map(|d| format!("('{d}')"))
        .collect::<Vec<_>>()
        .join(", ");

    vec![
        step(
            "create_employees",
            vec![TableMissing("employees")],
            "CREATE TABLE employees (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fullName TEXT NOT NULL,
                employeeId TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                mobile TEXT,
                departmentId INTEGER,
                roleId INTEGER,
                status TEXT NOT NULL DEFAULT 'Active',
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        ),
        step(
            "add_employee_department_id",
            vec![ColumnMissing("employees", "departmentId")],
            "ALTER TABLE employees ADD COLUMN departmentId INTEGER",
        ),
        step(
            "add_employee_mobile",
            vec![ColumnMissing("employees", "mobile")],
            "ALTER TABLE employees ADD COLUMN mobile TEXT",
        ),
        step(
            "add_employee_role_id",
            vec![ColumnMissing("employees", "roleId")],
            "ALTER TABLE employees ADD COLUMN roleId INTEGER",
        ),
        step(
            "rename_departments_table",
            vec![TableExists("departments"), TableMissing("department")],
            "ALTER TABLE departments RENAME TO department",
        ),
        step(
            "create_department",
            vec![TableMissing("department")],
            "CREATE TABLE department (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            )",
        ),
        step(
            "seed_departments",
            vec![TableExists("department"), TableEmpty("department")],
            format!("INSERT INTO department (name) VALUES {seed}"),
        ),
        step(
            "create_roles",
            vec![TableMissing("roles")],
            "CREATE TABLE roles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                departmentId INTEGER REFERENCES department(id),
                permissions TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        ),
        step(
            "backfill_employee_department_id",
            vec![
                ColumnExists("employees", "department"),
                TableExists("department"),
            ],
            "UPDATE employees
             SET departmentId = (SELECT d.id FROM department d WHERE d.name = employees.department)
             WHERE departmentId IS NULL AND department IS NOT NULL",
        ),
        drop_column("drop_employee_department", "employees", "department"),
        step(
            "backfill_employee_role_id",
            vec![ColumnExists("employees", "role"), TableExists("roles")],
            "UPDATE employees
             SET roleId = (SELECT r.id FROM roles r WHERE r.name = employees.role ORDER BY r.id LIMIT 1)
             WHERE roleId IS NULL AND role IS NOT NULL",
        ),
        drop_column("drop_employee_role", "employees", "role"),
        drop_column("drop_employee_crm_access", "employees", "crmAccess"),
        drop_column("drop_employee_mission_control", "employees", "missionControl"),
        drop_column("drop_employee_admin_panel", "employees", "adminPanel"),
    ]
}

/// Run every step against the store.
pub async fn reconcile(conn: &Connection) -> Report {
    let mut report = Report::default();

    for step in steps() {
        let outcome = run_step(conn, &step).await;
        match &outcome {
            Outcome::Applied => info!(step = step.name, "schema step applied"),
            Outcome::AlreadyApplied => debug!(step = step.name, "schema step already applied"),
            Outcome::Failed(reason) => warn!(step = step.name, %reason, "schema step failed"),
        }
        report.outcomes.push((step.name, outcome));
    }

    info!(
        applied = report.applied().len(),
        failed = report.failed().len(),
        "schema reconciliation finished"
    );
    report
}

async fn run_step(conn: &Connection, step: &Step) -> Outcome {
    for check in &step.when {
        match check.holds(conn).await {
            Ok(true) => {}
            Ok(false) => return Outcome::AlreadyApplied,
            Err(e) => return Outcome::Failed(format!("checking {check:?}: {e}")),
        }
    }

    match conn.execute(&step.sql, ()).await {
        Ok(_) => Outcome::Applied,
        Err(e) if reports_existing(&e) => Outcome::AlreadyApplied,
        Err(e) => Outcome::Failed(e.to_string()),
    }
}

/// The store refused because the change is already in place.
fn reports_existing(e: &libsql::Error) -> bool {
    let msg = e.to_string().to_ascii_lowercase();
    msg.contains("already exists") || msg.contains("duplicate column")
}

impl Check {
    async fn holds(&self, conn: &Connection) -> libsql::Result<bool> {
        match self {
            Check::TableExists(table) => table_exists(conn, table).await,
            Check::TableMissing(table) => Ok(!table_exists(conn, table).await?),
            Check::ColumnExists(table, column) => column_exists(conn, table, column).await,
            Check::ColumnMissing(table, column) => Ok(!column_exists(conn, table, column).await?),
            Check::TableEmpty(table) => {
                Ok(count(conn, &format!("SELECT COUNT(*) FROM {table}"), ()).await? == 0)
            }
        }
    }
}

async fn table_exists(conn: &Connection, table: &str) -> libsql::Result<bool> {
    let n = count(
        conn,
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
        libsql::params![table],
    )
    .await?;
    Ok(n > 0)
}

async fn column_exists(conn: &Connection, table: &str, column: &str) -> libsql::Result<bool> {
    let n = count(
        conn,
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2 COLLATE NOCASE",
        libsql::params![table, column],
    )
    .await?;
    Ok(n > 0)
}

async fn count(conn: &Connection, sql: &str, params: impl IntoParams) -> libsql::Result<i64> {
    let mut rows = conn.query(sql, params).await?;
    match rows.next().await? {
        Some(row) => row.get::<i64>(0),
        None => Ok(0),
    }
}
