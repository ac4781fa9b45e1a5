//! Role templates and their permission documents.

use serde_json::{Value, json};

use super::start;

fn config<'a>(doc: &'a Value, id: &str) -> &'a Value {
    doc["adminPanel"]["configs"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == id)
        .unwrap_or_else(|| panic!("config {id} missing from {doc}"))
}

/// A partial admin-panel grant comes back as a complete catalog document.
#[tokio::test]
async fn manager_role_is_completed_from_the_catalog() {
    let app = start().await;
    let id = app
        .role(
            "Manager",
            json!({
                "adminPanel": {
                    "enabled": true,
                    "configs": [{ "id": "user-mgmt", "enabled": true }]
                }
            }),
        )
        .await;

    let reply = app.get(&format!("/api/roles/{id}")).await;
    app.stop().await;

    assert_eq!(reply.status, 200);
    let role = reply.json();
    assert_eq!(role["name"], "Manager");
    assert_eq!(role["departmentId"], 2);
    assert_eq!(role["departmentName"], "Sales");
    assert_eq!(role["employeeCount"], 0);

    let doc = &role["permissions"];
    assert_eq!(doc["adminPanel"]["enabled"], true);
    assert_eq!(doc["adminPanel"]["configs"].as_array().unwrap().len(), 2);
    assert_eq!(config(doc, "user-mgmt")["enabled"], true);
    assert_eq!(config(doc, "role-config")["enabled"], false);
    assert_eq!(config(doc, "role-config")["name"], "Role Configuration");
    assert_eq!(doc["crm"]["modules"].as_array().unwrap().len(), 3);
    assert_eq!(doc["missionControl"]["stages"].as_array().unwrap().len(), 11);
}

#[tokio::test]
async fn legacy_flag_map_is_stored_canonically() {
    let app = start().await;
    let id = app
        .role(
            "Legacy",
            json!({ "crm": true, "missionControl": false, "admin": true }),
        )
        .await;

    let doc = app.get(&format!("/api/roles/{id}")).await.json()["permissions"].clone();

    let stored: String = {
        let mut rows = app
            .db
            .raw_connection()
            .query("SELECT permissions FROM roles WHERE id = ?1", libsql::params![id])
            .await
            .unwrap();
        rows.next().await.unwrap().unwrap().get(0).unwrap()
    };
    app.stop().await;

    assert_eq!(doc["crm"]["enabled"], true);
    assert_eq!(doc["missionControl"]["enabled"], false);
    assert_eq!(doc["adminPanel"]["enabled"], true);
    assert!(
        doc["crm"]["modules"]
            .as_array()
            .unwrap()
            .iter()
            .all(|m| m["view"] == false && m["edit"] == false)
    );

    let stored: Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored, doc);
}

#[tokio::test]
async fn role_without_permissions_denies_everything() {
    let app = start().await;
    let reply = app
        .post("/api/roles", &json!({ "name": "Viewer", "departmentId": "3" }))
        .await;
    assert_eq!(reply.status, 201);
    assert_eq!(reply.json()["message"], "Role template created successfully");
    let id = reply.json()["roleId"].as_i64().unwrap();

    let doc = app.get(&format!("/api/roles/{id}")).await.json()["permissions"].clone();
    app.stop().await;

    assert_eq!(doc["crm"]["enabled"], false);
    assert_eq!(doc["missionControl"]["enabled"], false);
    assert_eq!(doc["adminPanel"]["enabled"], false);
}

#[tokio::test]
async fn update_replaces_the_whole_document() {
    let app = start().await;
    let id = app.role("Manager", super::admin_permissions()).await;

    let reply = app
        .put(
            &format!("/api/roles/{id}"),
            &json!({
                "name": "Sales Lead",
                "departmentId": 2,
                "permissions": { "crm": { "enabled": true, "modules": [{ "id": "customers", "view": true }] } }
            }),
        )
        .await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.json()["message"], "Role updated successfully");

    let role = app.get(&format!("/api/roles/{id}")).await.json();
    app.stop().await;

    assert_eq!(role["name"], "Sales Lead");
    // Replacement, not a patch: the admin grant is gone.
    assert_eq!(role["permissions"]["adminPanel"]["enabled"], false);
    assert_eq!(role["permissions"]["crm"]["modules"][0]["view"], true);
}

#[tokio::test]
async fn role_validation_names_the_field() {
    let app = start().await;

    let missing_name = app.post("/api/roles", &json!({ "departmentId": 1 })).await;
    let missing_department = app.post("/api/roles", &json!({ "name": "X" })).await;
    let unknown_department = app
        .post("/api/roles", &json!({ "name": "X", "departmentId": 999 }))
        .await;
    let unknown_role = app
        .put("/api/roles/999", &json!({ "name": "X", "departmentId": 1 }))
        .await;
    let bad_id = app.get("/api/roles/abc").await;
    app.stop().await;

    assert_eq!(missing_name.status, 400);
    assert_eq!(missing_name.json()["field"], "name");
    assert_eq!(missing_department.status, 400);
    assert_eq!(missing_department.json()["field"], "departmentId");
    assert_eq!(unknown_department.status, 400);
    assert_eq!(unknown_department.json()["field"], "departmentId");
    assert_eq!(unknown_role.status, 404);
    assert_eq!(unknown_role.json()["error"], "Role not found");
    assert_eq!(bad_id.status, 400);
}

#[tokio::test]
async fn list_counts_employees_per_role() {
    let app = start().await;
    let manager = app.role("Manager", super::admin_permissions()).await;
    let _empty = app.role("Intern", json!(null)).await;
    app.employee("a@example.com", manager).await;
    app.employee("b@example.com", manager).await;

    let roles = app.get("/api/roles").await.json();
    app.stop().await;

    let roles = roles.as_array().unwrap();
    assert_eq!(roles.len(), 2);
    // Newest first.
    assert_eq!(roles[0]["name"], "Intern");
    assert_eq!(roles[0]["employeeCount"], 0);
    assert_eq!(roles[1]["employeeCount"], 2);
}
