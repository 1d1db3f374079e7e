// tests/test_helpers.rs
// Local stand-ins for the webhook, chat-completions, REST and sheet upstreams

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use querygenius::config::{AppConfig, FileConfig, StoreKind};
use querygenius::pipeline::QueryPipeline;
use querygenius::store::{MemoryStore, QueryStore, SqliteStore};
use querygenius::web::{AppState, create_router};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const REST_KEY: &str = "test-key";

/// How a mocked reasoning call answers
#[derive(Clone, Debug)]
pub enum Reply {
    Json(String),
    Text(String),
    Status(u16),
}

impl Reply {
    pub fn json(value: Value) -> Self {
        Reply::Json(value.to_string())
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(body) => ([(CONTENT_TYPE, "application/json")], body).into_response(),
            Reply::Text(body) => ([(CONTENT_TYPE, "text/plain")], body).into_response(),
            Reply::Status(code) => StatusCode::from_u16(code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                .into_response(),
        }
    }
}

pub struct Upstream {
    pub classification: Mutex<Reply>,
    pub generation: Mutex<Reply>,
    pub narrative: Mutex<Reply>,
    /// Message content returned by the chat-completions endpoint for descriptor prompts
    pub chat_descriptor: Mutex<String>,
    /// Message content returned for narrative prompts
    pub chat_narrative: Mutex<String>,
    pub csv: Mutex<String>,
    pub webhook_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    /// `table?query` of every REST fetch
    pub rest_requests: Mutex<Vec<String>>,
    /// When set, every REST fetch answers with this status
    pub rest_status: Mutex<Option<u16>>,
}

impl Default for Upstream {
    fn default() -> Self {
        Self {
            classification: Mutex::new(Reply::json(json!({"isSpecialSource": false}))),
            generation: Mutex::new(Reply::json(json!({
                "query": "SELECT p.name, SUM(oi.quantity) AS units_sold FROM order_items oi \
                          JOIN products p ON p.id = oi.product_id GROUP BY p.id ORDER BY units_sold DESC"
            }))),
            narrative: Mutex::new(Reply::json(json!({
                "response": "Top sellers last quarter:\n\n1. **iPhone 15 Pro** - 3 units\n2. **Atomic Habits** - 2 units"
            }))),
            chat_descriptor: Mutex::new(
                json!({"table": "transactions", "select": "*,customers(*)", "order": "final_amount.desc", "limit": 100})
                    .to_string(),
            ),
            chat_narrative: Mutex::new(json!({"response": "Alice Johnson is the top spender."}).to_string()),
            csv: Mutex::new("\"Date\",\"Close\"\n\"2024-01-02\",\"468.50\"\n\"2024-01-03\",\"470.10\"\n".to_string()),
            webhook_calls: AtomicUsize::new(0),
            chat_calls: AtomicUsize::new(0),
            rest_requests: Mutex::new(Vec::new()),
            rest_status: Mutex::new(None),
        }
    }
}

impl Upstream {
    pub fn set(slot: &Mutex<Reply>, reply: Reply) {
        *slot.lock().unwrap() = reply;
    }

    pub fn webhook_calls(&self) -> usize {
        self.webhook_calls.load(Ordering::SeqCst)
    }
}

async fn webhook(State(up): State<Arc<Upstream>>, Json(body): Json<Value>) -> Reply {
    up.webhook_calls.fetch_add(1, Ordering::SeqCst);
    assert_eq!(body["source"], "querygenius");
    assert!(body["timestamp"].is_string());

    let prompt = body["prompt"].as_str().unwrap_or_default();
    let slot = if prompt.contains("isSpecialSource") {
        &up.classification
    } else if prompt.contains("into SQL queries") {
        &up.generation
    } else {
        &up.narrative
    };
    slot.lock().unwrap().clone()
}

async fn chat(State(up): State<Arc<Upstream>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    up.chat_calls.fetch_add(1, Ordering::SeqCst);
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer sk-test") {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let prompt = body["messages"]
        .as_array()
        .and_then(|m| m.last())
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();
    let content = if prompt.contains("REST API queries") {
        up.chat_descriptor.lock().unwrap().clone()
    } else {
        up.chat_narrative.lock().unwrap().clone()
    };
    Json(json!({"choices": [{"message": {"role": "assistant", "content": content}}]})).into_response()
}

async fn rest(
    State(up): State<Arc<Upstream>>,
    Path(table): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(REST_KEY) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    up.rest_requests
        .lock()
        .unwrap()
        .push(format!("{}?{}", table, query.unwrap_or_default()));
    if let Some(code) = *up.rest_status.lock().unwrap() {
        return Reply::Status(code).into_response();
    }

    let rows = match table.as_str() {
        "transactions" => json!([
            {"id": 1, "customer_id": 1, "final_amount": 2495.0, "customers": {"name": "Alice Johnson"}},
            {"id": 2, "customer_id": 2, "final_amount": 34.99, "customers": {"name": "Bob Smith"}}
        ]),
        "customers" => json!([{"id": 1, "name": "Alice Johnson", "email": "alice@example.com", "gender": "F"}]),
        "products" => json!([{"id": 1, "product_name": "YETI Rambler", "aisle": "Sports", "unit_price": 34.99}]),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    Json(rows).into_response()
}

async fn sheet(State(up): State<Arc<Upstream>>, Path(id): Path<String>) -> Response {
    if id != "sheet-1" {
        return StatusCode::NOT_FOUND.into_response();
    }
    ([(CONTENT_TYPE, "text/csv")], up.csv.lock().unwrap().clone()).into_response()
}

/// Serve the upstream mocks on an ephemeral port; returns the base URL
pub async fn spawn_upstream(up: Arc<Upstream>) -> String {
    let router = Router::new()
        .route("/hook", post(webhook))
        .route("/v1/chat/completions", post(chat))
        .route("/rest/{table}", get(rest))
        .route("/sheets/{id}/gviz/tq", get(sheet))
        .with_state(up);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{}", addr)
}

/// Seed a small e-commerce database in a temp file
pub async fn seed_analytics_db(dir: &TempDir) -> String {
    let url = format!("sqlite:{}", dir.path().join("analytics.db").display());
    let pool = querygenius::db::create_pool(&url, false).await.unwrap();
    sqlx::raw_sql(
        "CREATE TABLE products (id INTEGER PRIMARY KEY, name TEXT NOT NULL, price REAL NOT NULL);
         CREATE TABLE order_items (id INTEGER PRIMARY KEY, order_id INTEGER, product_id INTEGER, quantity INTEGER, unit_price REAL);
         INSERT INTO products VALUES (1, 'iPhone 15 Pro', 999.99), (2, 'Atomic Habits', 18.99), (3, 'YETI Rambler', 34.99);
         INSERT INTO order_items VALUES (1, 1, 1, 2, 999.99), (2, 2, 2, 2, 18.99), (3, 3, 1, 1, 999.99), (4, 3, 3, 1, 34.99);",
    )
    .execute(&pool)
    .await
    .unwrap();
    pool.close().await;
    url
}

/// A running app wired to the mocked upstreams
pub struct TestApp {
    pub router: Router,
    pub upstream: Arc<Upstream>,
    pub store: Arc<dyn QueryStore>,
    _dir: TempDir,
}

pub async fn create_test_app(upstream: Upstream) -> TestApp {
    create_test_app_with(upstream, &[]).await
}

/// Build the app from an env-style lookup; `extra` entries override the
/// defaults and an empty value unsets one
pub async fn create_test_app_with(upstream: Upstream, extra: &[(&str, &str)]) -> TestApp {
    let upstream = Arc::new(upstream);
    let base = spawn_upstream(upstream.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let analytics = seed_analytics_db(&dir).await;

    let mut vars: Vec<(String, String)> = vec![
        ("QG_STORE".into(), "memory".into()),
        ("QG_ANALYTICS_DATABASE_URL".into(), analytics),
        ("QG_WEBHOOK_URL".into(), format!("{}/hook", base)),
        ("OPENAI_API_KEY".into(), "sk-test".into()),
        ("OPENAI_BASE_URL".into(), format!("{}/v1", base)),
        ("QG_REST_BASE_URL".into(), format!("{}/rest", base)),
        ("QG_REST_API_KEY".into(), REST_KEY.into()),
        ("QG_SHEET_BASE_URL".into(), format!("{}/sheets", base)),
        ("QG_SPECIAL_SHEET_ID".into(), "sheet-1".into()),
        ("QG_STAGE_TIMEOUT_SECS".into(), "10".into()),
    ];
    for (key, value) in extra {
        vars.retain(|(k, _)| k != key);
        vars.push((key.to_string(), value.to_string()));
    }
    let lookup = move |key: &str| {
        vars.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .filter(|v| !v.is_empty())
    };

    let config = AppConfig::from_sources(FileConfig::default(), lookup);
    let store: Arc<dyn QueryStore> = match config.store.kind {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::Sqlite => Arc::new(SqliteStore::connect(&config.store.database_url).await.unwrap()),
    };
    let pipeline = QueryPipeline::from_config(&config, store.clone()).await.unwrap();

    TestApp {
        router: create_router(AppState::new(pipeline)),
        upstream,
        store,
        _dir: dir,
    }
}
