//! Admin-panel sign-in and session checks.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use roster::config::Auth;
use serde_json::json;

use super::{SECRET, TestApp, admin_permissions, send, start};

async fn login(app: &TestApp, email: &str) -> super::Reply {
    app.post("/api/login", &json!({ "email": email })).await
}

async fn session(app: &TestApp, token: &str) -> super::Reply {
    let bearer = format!("Bearer {token}");
    send(app.addr(), "GET", "/api/session", None, &[("Authorization", bearer.as_str())]).await
}

#[tokio::test]
async fn login_returns_user_and_token() {
    let app = start().await;
    let role = app.role("Manager", admin_permissions()).await;
    app.employee("asha@example.com", role).await;

    let reply = login(&app, "asha@example.com").await;
    assert_eq!(reply.status, 200, "{}", reply.body);
    let body = reply.json();
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["email"], "asha@example.com");
    assert_eq!(body["user"]["permissions"]["adminPanel"]["enabled"], true);

    let token = body["token"].as_str().unwrap().to_string();
    let current = session(&app, &token).await;
    app.stop().await;

    assert_eq!(current.status, 200, "{}", current.body);
    let current = current.json();
    assert_eq!(current["user"]["email"], "asha@example.com");
    assert_eq!(current["capabilities"]["user-mgmt"], true);
    assert_eq!(current["capabilities"]["role-config"], false);
    assert_eq!(current["catalogVersion"], roster::permission::catalog::CATALOG_VERSION);
}

/// An employee whose role lacks the admin panel is refused, never a 500.
#[tokio::test]
async fn role_without_admin_panel_is_forbidden() {
    let app = start().await;
    let role = app
        .role("Field Tech", json!({ "crm": { "enabled": true } }))
        .await;
    app.employee("tech@example.com", role).await;

    let reply = login(&app, "tech@example.com").await;
    app.stop().await;

    assert_eq!(reply.status, 403);
    assert_eq!(
        reply.json()["error"],
        "Access denied: Admin Panel permission required"
    );
}

#[tokio::test]
async fn inactive_account_is_forbidden() {
    let app = start().await;
    let role = app.role("Manager", admin_permissions()).await;
    let id = app.employee("asha@example.com", role).await;
    app.put(
        &format!("/api/employees/{id}"),
        &json!({
            "fullName": "Asha Rao",
            "email": "asha@example.com",
            "roleId": role,
            "status": "Inactive",
        }),
    )
    .await;

    let reply = login(&app, "asha@example.com").await;
    app.stop().await;

    assert_eq!(reply.status, 403);
    assert_eq!(reply.json()["error"], "Access denied: Account is inactive");
}

#[tokio::test]
async fn login_input_errors() {
    let app = start().await;
    let missing = app.post("/api/login", &json!({})).await;
    let unknown = login(&app, "nobody@example.com").await;
    app.stop().await;

    assert_eq!(missing.status, 400);
    assert_eq!(missing.json()["error"], "Email is required");
    assert_eq!(missing.json()["field"], "email");
    assert_eq!(unknown.status, 404);
    assert_eq!(unknown.json()["error"], "Employee not found");
}

/// Access is re-checked against the current role, not the token.
#[tokio::test]
async fn session_follows_role_changes() {
    let app = start().await;
    let role = app.role("Manager", admin_permissions()).await;
    app.employee("asha@example.com", role).await;
    let token = login(&app, "asha@example.com").await.json()["token"]
        .as_str()
        .unwrap()
        .to_string();

    app.put(
        &format!("/api/roles/{role}"),
        &json!({ "name": "Manager", "departmentId": 2, "permissions": {} }),
    )
    .await;
    let reply = session(&app, &token).await;
    app.stop().await;

    assert_eq!(reply.status, 403);
}

#[tokio::test]
async fn session_requires_a_valid_token() {
    let app = start().await;
    let role = app.role("Manager", admin_permissions()).await;
    let id = app.employee("asha@example.com", role).await;

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(
        json!({ "sub": id.to_string(), "exp": 4_102_444_800i64, "iat": 0 })
            .to_string()
            .as_bytes(),
    );
    let forged = format!("{header}.{claims}.");

    let wrong_key = roster::auth::create_token(
        &Auth {
            jwt_secret: "another-secret-that-is-32-bytes!!".into(),
            token_expiry_hours: 1,
        },
        id,
    )
    .unwrap();
    let unknown_employee = roster::auth::create_token(
        &Auth {
            jwt_secret: SECRET.into(),
            token_expiry_hours: 1,
        },
        id + 100,
    )
    .unwrap();

    let anonymous = app.get("/api/session").await;
    let none_alg = session(&app, &forged).await;
    let garbage = session(&app, "not-a-token").await;
    let wrong_key = session(&app, &wrong_key).await;
    let unknown_employee = session(&app, &unknown_employee).await;
    app.stop().await;

    assert_eq!(anonymous.status, 401);
    assert_eq!(none_alg.status, 401);
    assert_eq!(garbage.status, 401);
    assert_eq!(wrong_key.status, 401);
    assert_eq!(unknown_employee.status, 401);
}
