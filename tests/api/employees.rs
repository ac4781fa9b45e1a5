//! Employee records, inherited permissions and welcome notifications.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::{FailingMailer, Options, RecordingMailer, admin_permissions, start, start_with};

#[tokio::test]
async fn create_returns_generated_employee_id() {
    let app = start().await;
    let role = app.role("Manager", admin_permissions()).await;

    let reply = app
        .post(
            "/api/employees",
            &json!({
                "fullName": "Asha Rao",
                "email": "asha@example.com",
                "mobile": "555-0100",
                "departmentId": 1,
                "roleId": role,
            }),
        )
        .await;
    assert_eq!(reply.status, 201, "{}", reply.body);
    let created = reply.json();
    assert_eq!(created["message"], "Employee created successfully");
    assert_eq!(created["employeeId"], "EMP-1001");

    let id = created["id"].as_i64().unwrap();
    let employee = app.get(&format!("/api/employees/{id}")).await.json();
    app.stop().await;

    assert_eq!(employee["fullName"], "Asha Rao");
    assert_eq!(employee["mobile"], "555-0100");
    assert_eq!(employee["roleName"], "Manager");
    // The role's department wins over the one submitted for the employee.
    assert_eq!(employee["departmentId"], 2);
    assert_eq!(employee["departmentName"], "Sales");
    assert_eq!(employee["status"], "Active");
    assert_eq!(employee["permissions"]["adminPanel"]["enabled"], true);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = start().await;
    let role = app.role("Manager", admin_permissions()).await;
    app.employee("asha@example.com", role).await;

    let reply = app
        .post(
            "/api/employees",
            &json!({
                "fullName": "Someone Else",
                "email": "asha@example.com",
                "departmentId": 1,
                "roleId": role,
            }),
        )
        .await;
    app.stop().await;

    assert_eq!(reply.status, 409);
    assert_eq!(reply.json()["error"], "Email already exists");
}

#[tokio::test]
async fn missing_fields_are_reported_by_name() {
    let app = start().await;
    let role = app.role("Manager", admin_permissions()).await;

    let cases = [
        (json!({ "email": "a@example.com", "departmentId": 1, "roleId": role }), "fullName"),
        (json!({ "fullName": "A", "departmentId": 1, "roleId": role }), "email"),
        (json!({ "fullName": "A", "email": "a@example.com", "roleId": role }), "departmentId"),
        (json!({ "fullName": "A", "email": "a@example.com", "departmentId": 1 }), "roleId"),
        (
            json!({ "fullName": "A", "email": "a@example.com", "departmentId": 1, "roleId": 999 }),
            "roleId",
        ),
    ];
    let mut replies = Vec::new();
    for (body, field) in cases {
        replies.push((app.post("/api/employees", &body).await, field));
    }
    let listed = app.get("/api/employees").await.json();
    app.stop().await;

    for (reply, field) in replies {
        assert_eq!(reply.status, 400, "{field}: {}", reply.body);
        assert_eq!(reply.json()["field"], field);
    }
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

/// A role row holding unparseable JSON still yields a readable employee.
#[tokio::test]
async fn malformed_stored_permissions_read_as_default() {
    let app = start().await;
    let role = app.role("Manager", admin_permissions()).await;
    let id = app.employee("asha@example.com", role).await;
    app.db
        .raw_connection()
        .execute(
            "UPDATE roles SET permissions = '{\"adminPanel\": {\"enabled\": tru' WHERE id = ?1",
            libsql::params![role],
        )
        .await
        .unwrap();

    let reply = app.get(&format!("/api/employees/{id}")).await;
    let list = app.get("/api/employees").await;
    app.stop().await;

    assert_eq!(reply.status, 200);
    let doc = &reply.json()["permissions"];
    assert_eq!(doc["adminPanel"]["enabled"], false);
    assert_eq!(doc["adminPanel"]["configs"].as_array().unwrap().len(), 2);
    assert_eq!(list.status, 200);
}

#[tokio::test]
async fn welcome_notification_is_sent() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = start_with(Options {
        mailer: mailer.clone(),
        ..Default::default()
    })
    .await;
    let role = app.role("Manager", admin_permissions()).await;
    app.employee("asha@example.com", role).await;

    let mut sent = Vec::new();
    for _ in 0..50 {
        sent = mailer.sent.lock().unwrap().clone();
        if !sent.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    app.stop().await;

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "asha@example.com");
    assert!(sent[0].body.contains("Manager"));
    assert!(sent[0].body.contains("Admin Panel"));
}

#[tokio::test]
async fn failing_mailer_does_not_fail_creation() {
    let app = start_with(Options {
        mailer: Arc::new(FailingMailer),
        ..Default::default()
    })
    .await;
    let role = app.role("Manager", admin_permissions()).await;

    let reply = app
        .post(
            "/api/employees",
            &json!({
                "fullName": "Asha Rao",
                "email": "asha@example.com",
                "departmentId": 1,
                "roleId": role,
            }),
        )
        .await;
    app.stop().await;

    assert_eq!(reply.status, 201);
}

#[tokio::test]
async fn update_keeps_status_when_omitted() {
    let app = start().await;
    let role = app.role("Manager", admin_permissions()).await;
    let id = app.employee("asha@example.com", role).await;
    let path = format!("/api/employees/{id}");

    let deactivate = app
        .put(
            &path,
            &json!({
                "fullName": "Asha Rao",
                "email": "asha@example.com",
                "roleId": role,
                "status": "Inactive",
            }),
        )
        .await;
    let rename = app
        .put(
            &path,
            &json!({ "fullName": "Asha R.", "email": "asha@example.com", "roleId": role }),
        )
        .await;
    let employee = app.get(&path).await.json();
    let unknown = app
        .put(
            "/api/employees/999",
            &json!({ "fullName": "X", "email": "x@example.com", "roleId": role }),
        )
        .await;
    app.stop().await;

    assert_eq!(deactivate.status, 200);
    assert_eq!(rename.json()["message"], "Employee updated successfully");
    assert_eq!(employee["fullName"], "Asha R.");
    assert_eq!(employee["status"], "Inactive");
    assert_eq!(unknown.status, 404);
    assert_eq!(unknown.json()["error"], "Employee not found");
}

#[tokio::test]
async fn update_to_taken_email_is_a_conflict() {
    let app = start().await;
    let role = app.role("Manager", admin_permissions()).await;
    app.employee("asha@example.com", role).await;
    let ravi = app.employee("ravi@example.com", role).await;

    let reply = app
        .put(
            &format!("/api/employees/{ravi}"),
            &json!({ "fullName": "Ravi", "email": "asha@example.com", "roleId": role }),
        )
        .await;
    app.stop().await;

    assert_eq!(reply.status, 409);
}

#[tokio::test]
async fn store_not_ready_answers_503() {
    let app = start_with(Options {
        ready: false,
        ..Default::default()
    })
    .await;

    let reply = app.get("/api/employees").await;
    let health = app.get("/health").await;
    app.db.reconcile().await;
    let after = app.get("/api/employees").await;
    app.stop().await;

    assert_eq!(reply.status, 503);
    assert_eq!(reply.json()["error"], "Database not ready");
    assert!(reply.header("Retry-After").is_some());
    assert_eq!(health.status, 200);
    assert_eq!(after.status, 200);
}

#[tokio::test]
async fn departments_are_listed_by_name() {
    let app = start().await;
    let reply = app.get("/api/departments").await;
    app.stop().await;

    let names: Vec<String> = reply
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        ["Engineering", "Finance", "HR", "Marketing", "Operations", "Sales"]
    );
}
