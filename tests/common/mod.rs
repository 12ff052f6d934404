//! In-process mock FastSchema server for integration tests.
//!
//! Serves the subset of the REST API the client talks to (`/api/schema`,
//! `/api/content/:schema`, `/api/auth/*`, `/api/file/upload`) plus the
//! realtime endpoint `/api/realtime/content`. State lives in memory and is
//! dropped with the server.
//!
//! A few reserved schema names change how the realtime endpoint behaves:
//!
//! - `__reject`: the handshake is refused with 401
//! - `__kick`: the server closes with code 4001 and reason `kicked`
//! - `__bye`: the server closes normally (1000, no reason)
//! - `__drop`: the server drops the TCP connection without a close frame

#![allow(dead_code)]

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Multipart, Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use fastschema_link::{
    ChangeEvent, ClientTimeouts, EventCallback, FastSchemaClient, FastSchemaClientBuilder,
    Result as FsResult,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

pub const ADMIN_LOGIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "123";
pub const TOKEN_EXP: i64 = 4_102_444_800;
pub const TOKEN_EXPIRES: &str = "2100-01-01T00:00:00Z";

/// How long tests wait for an event before failing.
pub const EVENT_WAIT: Duration = Duration::from_secs(5);

enum Outbound {
    Text(String),
    Close(u16, String),
    Drop,
}

struct Subscriber {
    id: u64,
    schema: String,
    event: String,
    record_id: Option<u64>,
    select: Option<Vec<String>>,
    filter: Option<Map<String, Value>>,
    tx: UnboundedSender<Outbound>,
}

impl Subscriber {
    fn wants(&self, schema: &str, event: &str, record: &Value) -> bool {
        if self.schema != schema || (self.event != "*" && self.event != event) {
            return false;
        }
        if let Some(id) = self.record_id {
            if record.get("id").and_then(Value::as_u64) != Some(id) {
                return false;
            }
        }
        match &self.filter {
            Some(filter) => matches_filter(filter, record),
            None => true,
        }
    }

    fn project(&self, record: &Value) -> Value {
        let (Some(select), Some(object)) = (&self.select, record.as_object()) else {
            return record.clone();
        };
        let projected: Map<String, Value> = object
            .iter()
            .filter(|(k, _)| k.as_str() == "id" || select.iter().any(|s| s == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(projected)
    }
}

fn matches_filter(filter: &Map<String, Value>, record: &Value) -> bool {
    filter.iter().all(|(field, condition)| {
        let actual = record.get(field).unwrap_or(&Value::Null);
        match condition.get("$eq") {
            Some(expected) => actual == expected,
            None if condition.is_object() => true,
            None => actual == condition,
        }
    })
}

/// One realtime handshake as seen by the server.
#[derive(Debug, Clone)]
pub struct RealtimeRequest {
    pub params: HashMap<String, String>,
    pub token: Option<String>,
}

/// Request headers captured by `GET /api/_headers`.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SeenHeaders {
    pub authorization: Option<String>,
    pub x_auth_token: Option<String>,
    pub cookie: Option<String>,
}

#[derive(Default)]
pub struct MockState {
    schemas: Mutex<Vec<Value>>,
    contents: Mutex<HashMap<String, Vec<Value>>>,
    next_record_id: AtomicU64,
    next_subscriber_id: AtomicU64,
    subscribers: Mutex<Vec<Subscriber>>,
    realtime_requests: Mutex<Vec<RealtimeRequest>>,
    client_close_codes: Mutex<Vec<u16>>,
    issued_token: Mutex<Option<String>>,
}

impl MockState {
    fn seeded() -> Self {
        let state = MockState {
            next_record_id: AtomicU64::new(1),
            next_subscriber_id: AtomicU64::new(1),
            ..Default::default()
        };
        *state.schemas.lock().unwrap() = vec![
            json!({
                "name": "tag",
                "namespace": "tags",
                "label_field": "name",
                "fields": [
                    { "name": "name", "label": "Name", "type": "string", "sortable": true },
                    { "name": "description", "label": "Description", "type": "text", "optional": true }
                ]
            }),
            json!({
                "name": "file",
                "namespace": "files",
                "label_field": "name",
                "is_system_schema": true,
                "fields": [
                    { "name": "name", "label": "Name", "type": "string" },
                    { "name": "path", "label": "Path", "type": "string" }
                ]
            }),
        ];
        state
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    pub fn realtime_requests(&self) -> Vec<RealtimeRequest> {
        self.realtime_requests.lock().unwrap().clone()
    }

    pub fn client_close_codes(&self) -> Vec<u16> {
        self.client_close_codes.lock().unwrap().clone()
    }

    pub fn schema_names(&self) -> Vec<String> {
        self.schemas
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| s["name"].as_str().map(str::to_string))
            .collect()
    }

    fn has_schema(&self, name: &str) -> bool {
        self.schema_names().iter().any(|n| n == name)
    }

    fn broadcast(&self, schema: &str, event: &str, record: &Value) {
        let subscribers = self.subscribers.lock().unwrap();
        for subscriber in subscribers.iter().filter(|s| s.wants(schema, event, record)) {
            let projected = subscriber.project(record);
            // Item subscriptions and create events carry one record, the rest a list.
            let data = if event == "create" || subscriber.record_id.is_some() {
                projected
            } else {
                Value::Array(vec![projected])
            };
            let frame = json!({ "event": event, "data": data });
            let _ = subscriber.tx.send(Outbound::Text(frame.to_string()));
        }
    }

    /// Push a raw text frame to every subscriber of `schema`.
    pub fn push_raw(&self, schema: &str, text: &str) {
        let subscribers = self.subscribers.lock().unwrap();
        for subscriber in subscribers.iter().filter(|s| s.schema == schema) {
            let _ = subscriber.tx.send(Outbound::Text(text.to_string()));
        }
    }

    fn remove_subscriber(&self, id: u64) {
        self.subscribers.lock().unwrap().retain(|s| s.id != id);
    }
}

pub struct MockServer {
    pub base_url: String,
    pub state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl MockServer {
    pub async fn start() -> MockServer {
        let _ = env_logger::builder().is_test(true).try_init();

        let state = Arc::new(MockState::seeded());
        let app = router(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        MockServer {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    pub fn builder(&self) -> FastSchemaClientBuilder {
        FastSchemaClient::builder()
            .base_url(self.base_url.clone())
            .timeouts(ClientTimeouts::fast())
    }

    pub fn client(&self) -> FastSchemaClient {
        self.builder().build().expect("build client")
    }

    /// Client already logged in as the admin user.
    pub async fn admin_client(&self) -> FastSchemaClient {
        let client = self.client();
        client
            .auth()
            .login("local", &fastschema_link::LoginData::new(ADMIN_LOGIN, ADMIN_PASSWORD))
            .await
            .expect("admin login");
        client
    }

    /// Wait until the server has `expected` live realtime connections.
    pub async fn wait_for_subscribers(&self, expected: usize) {
        let state = self.state.clone();
        tokio::time::timeout(EVENT_WAIT, async move {
            while state.subscriber_count() != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "expected {} subscriber(s), server has {}",
                expected,
                self.state.subscriber_count()
            )
        });
    }
}

/// Callback that forwards every delivery into a channel.
pub fn channel_callback<T: Send + 'static>(
) -> (EventCallback<T>, UnboundedReceiver<FsResult<ChangeEvent<T>>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback = EventCallback::new(move |event| {
        let _ = tx.send(event);
    });
    (callback, rx)
}

/// Next delivery, or panic after [`EVENT_WAIT`].
pub async fn next_event<T>(
    rx: &mut UnboundedReceiver<FsResult<ChangeEvent<T>>>,
) -> FsResult<ChangeEvent<T>> {
    tokio::time::timeout(EVENT_WAIT, rx.recv())
        .await
        .expect("timed out waiting for a realtime event")
        .expect("callback channel closed")
}

/// `true` when nothing arrives within `wait`.
pub async fn stays_quiet<T>(
    rx: &mut UnboundedReceiver<FsResult<ChangeEvent<T>>>,
    wait: Duration,
) -> bool {
    tokio::time::timeout(wait, rx.recv()).await.is_err()
}

pub fn issue_token() -> String {
    let header = json!({ "alg": "HS256", "typ": "JWT" });
    let payload = json!({
        "exp": TOKEN_EXP,
        "user": admin_user(),
    });
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(payload.to_string()),
        URL_SAFE_NO_PAD.encode("mock-signature")
    )
}

fn admin_user() -> Value {
    json!({
        "id": 1,
        "username": "admin",
        "email": "admin@example.com",
        "provider": "local",
        "active": true,
        "role_ids": [1],
        "roles": [{ "id": 1, "name": "Admin", "root": true }]
    })
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/_headers", get(echo_headers))
        .route("/api/auth/:provider/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/schema", get(list_schemas).post(create_schema))
        .route(
            "/api/schema/:name",
            get(get_schema).put(update_schema).delete(delete_schema),
        )
        .route("/api/content/:schema", get(list_content).post(create_content))
        .route(
            "/api/content/:schema/:id",
            get(get_content).put(update_content).delete(delete_content),
        )
        .route("/api/file/upload", post(upload))
        .route("/api/realtime/content", get(realtime))
        .with_state(state)
}

fn ok(data: Value) -> Response {
    (StatusCode::OK, Json(json!({ "data": data }))).into_response()
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

async fn echo_headers(headers: HeaderMap) -> Response {
    ok(json!({
        "authorization": header_string(&headers, "authorization"),
        "x_auth_token": header_string(&headers, "x-auth-token"),
        "cookie": header_string(&headers, "cookie"),
    }))
}

async fn login(
    State(state): State<Arc<MockState>>,
    Path(provider): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if provider != "local" {
        return fail(StatusCode::NOT_FOUND, "provider not found");
    }
    if body["login"] != ADMIN_LOGIN || body["password"] != ADMIN_PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "message": "Invalid login or password", "code": "401" } })),
        )
            .into_response();
    }

    let token = issue_token();
    *state.issued_token.lock().unwrap() = Some(token.clone());
    ok(json!({ "token": token, "expires": TOKEN_EXPIRES }))
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    let issued = state.issued_token.lock().unwrap().clone();
    let presented = header_string(&headers, "authorization")
        .and_then(|v| v.strip_prefix("Bearer ").map(str::to_string));
    match (issued, presented) {
        (Some(issued), Some(presented)) if issued == presented => ok(admin_user()),
        _ => fail(StatusCode::UNAUTHORIZED, "Unauthorized"),
    }
}

async fn list_schemas(State(state): State<Arc<MockState>>) -> Response {
    ok(Value::Array(state.schemas.lock().unwrap().clone()))
}

async fn get_schema(State(state): State<Arc<MockState>>, Path(name): Path<String>) -> Response {
    let schemas = state.schemas.lock().unwrap();
    match schemas.iter().find(|s| s["name"] == name.as_str()) {
        Some(schema) => ok(schema.clone()),
        None => fail(StatusCode::NOT_FOUND, "schema not found"),
    }
}

async fn create_schema(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let Some(name) = body["name"].as_str().filter(|n| !n.is_empty()) else {
        return fail(StatusCode::BAD_REQUEST, "schema name is required");
    };
    if state.has_schema(name) {
        return fail(StatusCode::BAD_REQUEST, &format!("schema {} already exists", name));
    }
    state.schemas.lock().unwrap().push(body.clone());
    ok(body)
}

async fn update_schema(
    State(state): State<Arc<MockState>>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut schema = body["schema"].clone();
    let renames = body["rename_fields"].as_object().cloned().unwrap_or_default();
    if let Some(fields) = schema["fields"].as_array_mut() {
        for field in fields.iter_mut() {
            for (from, to) in &renames {
                if field["name"] == from.as_str() {
                    field["name"] = to.clone();
                }
            }
        }
    }

    let mut schemas = state.schemas.lock().unwrap();
    match schemas.iter_mut().find(|s| s["name"] == name.as_str()) {
        Some(existing) => {
            *existing = schema.clone();
            ok(schema)
        },
        None => fail(StatusCode::NOT_FOUND, "schema not found"),
    }
}

async fn delete_schema(State(state): State<Arc<MockState>>, Path(name): Path<String>) -> Response {
    let mut schemas = state.schemas.lock().unwrap();
    let before = schemas.len();
    schemas.retain(|s| s["name"] != name.as_str());
    if schemas.len() == before {
        return fail(StatusCode::NOT_FOUND, "schema not found");
    }
    state.contents.lock().unwrap().remove(&name);
    ok(json!("Schema deleted"))
}

async fn list_content(
    State(state): State<Arc<MockState>>,
    Path(schema): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !state.has_schema(&schema) {
        return fail(StatusCode::NOT_FOUND, &format!("model {} not found", schema));
    }

    let filter = match params.get("filter") {
        Some(raw) => match serde_json::from_str::<Map<String, Value>>(raw) {
            Ok(filter) => Some(filter),
            Err(_) => return fail(StatusCode::BAD_REQUEST, "invalid filter"),
        },
        None => None,
    };
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(10).max(1);
    let page: usize = params.get("page").and_then(|v| v.parse().ok()).unwrap_or(1).max(1);

    let contents = state.contents.lock().unwrap();
    let matching: Vec<Value> = contents
        .get(&schema)
        .map(|records| {
            records
                .iter()
                .filter(|r| filter.as_ref().map_or(true, |f| matches_filter(f, r)))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    let total = matching.len();
    let last_page = total.div_ceil(limit).max(1);
    let items: Vec<Value> = matching.into_iter().skip((page - 1) * limit).take(limit).collect();
    ok(json!({
        "total": total,
        "per_page": limit,
        "current_page": page,
        "last_page": last_page,
        "items": items,
    }))
}

async fn create_content(
    State(state): State<Arc<MockState>>,
    Path(schema): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !state.has_schema(&schema) {
        return fail(StatusCode::NOT_FOUND, &format!("model {} not found", schema));
    }
    let Value::Object(mut record) = body else {
        return fail(StatusCode::BAD_REQUEST, "invalid content");
    };
    let id = state.next_record_id.fetch_add(1, Ordering::SeqCst);
    record.insert("id".to_string(), json!(id));
    record.insert("created_at".to_string(), json!("2024-01-01T00:00:00Z"));
    let record = Value::Object(record);

    state
        .contents
        .lock()
        .unwrap()
        .entry(schema.clone())
        .or_default()
        .push(record.clone());
    state.broadcast(&schema, "create", &record);
    ok(record)
}

async fn get_content(
    State(state): State<Arc<MockState>>,
    Path((schema, id)): Path<(String, u64)>,
) -> Response {
    let contents = state.contents.lock().unwrap();
    let record = contents
        .get(&schema)
        .and_then(|records| records.iter().find(|r| r["id"] == id));
    match record {
        Some(record) => ok(record.clone()),
        None => fail(StatusCode::NOT_FOUND, "Content not found"),
    }
}

async fn update_content(
    State(state): State<Arc<MockState>>,
    Path((schema, id)): Path<(String, u64)>,
    Json(body): Json<Value>,
) -> Response {
    let updated = {
        let mut contents = state.contents.lock().unwrap();
        let record = contents
            .get_mut(&schema)
            .and_then(|records| records.iter_mut().find(|r| r["id"] == id));
        let Some(record) = record else {
            return fail(StatusCode::NOT_FOUND, "Content not found");
        };
        if let (Some(target), Some(changes)) = (record.as_object_mut(), body.as_object()) {
            for (k, v) in changes {
                target.insert(k.clone(), v.clone());
            }
            target.insert("updated_at".to_string(), json!("2024-01-02T00:00:00Z"));
        }
        record.clone()
    };
    state.broadcast(&schema, "update", &updated);
    ok(updated)
}

async fn delete_content(
    State(state): State<Arc<MockState>>,
    Path((schema, id)): Path<(String, u64)>,
) -> Response {
    let removed = {
        let mut contents = state.contents.lock().unwrap();
        let Some(records) = contents.get_mut(&schema) else {
            return fail(StatusCode::NOT_FOUND, "Content not found");
        };
        let Some(index) = records.iter().position(|r| r["id"] == id) else {
            return fail(StatusCode::NOT_FOUND, "Content not found");
        };
        records.remove(index)
    };
    state.broadcast(&schema, "delete", &removed);
    ok(json!(id))
}

async fn upload(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> Response {
    let mut success = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("unnamed").to_string();
        let media_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let Ok(bytes) = field.bytes().await else {
            return fail(StatusCode::BAD_REQUEST, "invalid upload");
        };
        let id = state.next_record_id.fetch_add(1, Ordering::SeqCst);
        success.push(json!({
            "id": id,
            "name": name,
            "size": bytes.len(),
            "type": media_type,
            "disk": "public",
            "path": format!("files/{}", name),
            "url": format!("/files/{}", name),
        }));
    }
    ok(json!({ "success": success, "error": [] }))
}

async fn realtime(
    ws: WebSocketUpgrade,
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let token = headers
        .get(header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').nth(1))
        .map(|t| t.trim().to_string());
    state.realtime_requests.lock().unwrap().push(RealtimeRequest {
        params: params.clone(),
        token,
    });

    let schema = params.get("schema").cloned().unwrap_or_default();
    if schema == "__reject" {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let (tx, rx) = mpsc::unbounded_channel();
    match schema.as_str() {
        "__kick" => {
            let _ = tx.send(Outbound::Close(4001, "kicked".to_string()));
        },
        "__bye" => {
            let _ = tx.send(Outbound::Close(1000, String::new()));
        },
        "__drop" => {
            let _ = tx.send(Outbound::Drop);
        },
        _ => {},
    }

    // Registered before the upgrade completes so a write issued right after
    // `subscribe` returns is never missed.
    let id = state.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
    state.subscribers.lock().unwrap().push(Subscriber {
        id,
        schema,
        event: params.get("event").cloned().unwrap_or_else(|| "*".to_string()),
        record_id: params.get("id").and_then(|v| v.parse().ok()),
        select: params
            .get("select")
            .map(|s| s.split(',').map(|f| f.trim().to_string()).collect()),
        filter: params.get("filter").and_then(|f| serde_json::from_str(f).ok()),
        tx,
    });

    ws.protocols(["Authorization"])
        .on_upgrade(move |socket| serve_socket(socket, rx, state, id))
}

async fn serve_socket(
    mut socket: WebSocket,
    mut rx: UnboundedReceiver<Outbound>,
    state: Arc<MockState>,
    id: u64,
) {
    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(Outbound::Text(text)) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                },
                Some(Outbound::Close(code, reason)) => {
                    let frame = CloseFrame { code, reason: reason.into() };
                    let _ = socket.send(Message::Close(Some(frame))).await;
                    while let Some(Ok(message)) = socket.recv().await {
                        if matches!(message, Message::Close(_)) {
                            break;
                        }
                    }
                    break;
                },
                Some(Outbound::Drop) | None => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(frame))) => {
                    let code = frame.map(|f| f.code).unwrap_or(1005);
                    state.client_close_codes.lock().unwrap().push(code);
                    break;
                },
                Some(Ok(_)) => {},
                _ => break,
            },
        }
    }
    state.remove_subscriber(id);
}
