mod employees;
mod roles;
mod session;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use roster::config::{Auth, Config, Database, Server as ServerConfig};
use roster::mail::{LogMailer, Mailer, Notification};
use roster::router::BoxFuture;
use roster::DbHandle;
use roster::server::Server;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub const SECRET: &str = "test-secret-that-is-at-least-32b!";

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub server: Server,
    pub db: DbHandle,
}

impl TestApp {
    pub fn addr(&self) -> SocketAddr {
        self.server.addr()
    }

    pub async fn get(&self, path: &str) -> Reply {
        send(self.addr(), "GET", path, None, &[]).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Reply {
        send(self.addr(), "POST", path, Some(body), &[]).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Reply {
        send(self.addr(), "PUT", path, Some(body), &[]).await
    }

    pub async fn stop(self) {
        self.server.shutdown().await.unwrap();
    }

    /// Create a role and return its id.
    pub async fn role(&self, name: &str, permissions: Value) -> i64 {
        let reply = self
            .post(
                "/api/roles",
                &json!({ "name": name, "departmentId": 2, "permissions": permissions }),
            )
            .await;
        assert_eq!(reply.status, 201, "{}", reply.body);
        reply.json()["roleId"].as_i64().unwrap()
    }

    /// Create an employee and return its row id.
    pub async fn employee(&self, email: &str, role_id: i64) -> i64 {
        let reply = self
            .post(
                "/api/employees",
                &json!({
                    "fullName": "Asha Rao",
                    "email": email,
                    "departmentId": 1,
                    "roleId": role_id,
                }),
            )
            .await;
        assert_eq!(reply.status, 201, "{}", reply.body);
        reply.json()["id"].as_i64().unwrap()
    }
}

/// Permissions that let an employee into the admin panel with user management.
pub fn admin_permissions() -> Value {
    json!({
        "adminPanel": {
            "enabled": true,
            "configs": [{ "id": "user-mgmt", "enabled": true }]
        }
    })
}

pub fn test_config(server_cfg: ServerConfig) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..server_cfg
        },
        database: Database {
            url: ":memory:".to_string(),
        },
        auth: Auth {
            jwt_secret: SECRET.to_string(),
            token_expiry_hours: 1,
        },
        ..Default::default()
    }
}

pub struct Options {
    pub server: ServerConfig,
    pub ready: bool,
    pub mailer: Arc<dyn Mailer>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            ready: true,
            mailer: Arc::new(LogMailer::new("admin@localhost")),
        }
    }
}

pub async fn start() -> TestApp {
    start_with(Options::default()).await
}

pub async fn start_with(options: Options) -> TestApp {
    let config = Arc::new(test_config(options.server));
    let db = if options.ready {
        DbHandle::open_ready(":memory:").await.unwrap()
    } else {
        DbHandle::open(":memory:").await.unwrap()
    };
    let server = roster::server::start(
        config,
        Some(db.clone()),
        options.mailer,
        roster::api::router().into_handle(),
    )
    .await
    .expect("failed to start test server");
    TestApp { server, db }
}

/// Parsed HTTP/1.1 response.
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({e}): {}", self.body))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn parse(raw: &[u8]) -> Reply {
    let text = String::from_utf8_lossy(raw);
    let (head, body) = text
        .split_once("\r\n\r\n")
        .unwrap_or_else(|| panic!("malformed response:\n{text}"));
    let mut lines = head.lines();
    let status = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("no status line:\n{text}"));
    let headers = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    Reply {
        status,
        headers,
        body: body.to_string(),
    }
}

/// Send a JSON request with `Connection: close` and read the full response.
pub async fn send(
    addr: SocketAddr,
    method: &str,
    path: &str,
    body: Option<&Value>,
    extra_headers: &[(&str, &str)],
) -> Reply {
    let body = body.map(Value::to_string).unwrap_or_default();
    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
    if !body.is_empty() {
        request.push_str("Content-Type: application/json\r\n");
    }
    for (name, value) in extra_headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    request.push_str(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));
    parse(&raw_request(addr, request.as_bytes()).await)
}

pub async fn raw_request(addr: SocketAddr, payload: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.expect("failed to connect");
    stream.write_all(payload).await.expect("failed to write");

    let mut buf = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf)).await;
    buf
}

pub fn parse_raw(raw: &[u8]) -> Reply {
    parse(raw)
}

// ---------------------------------------------------------------------------
// Mailers
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Notification>>,
}

impl Mailer for RecordingMailer {
    fn send(&self, notification: Notification) -> BoxFuture<'static, roster::Result<()>> {
        self.sent.lock().unwrap().push(notification);
        Box::pin(async { Ok(()) })
    }
}

pub struct FailingMailer;

impl Mailer for FailingMailer {
    fn send(&self, _notification: Notification) -> BoxFuture<'static, roster::Result<()>> {
        Box::pin(async { Err(roster::Error::Unavailable("smtp relay down".into())) })
    }
}
