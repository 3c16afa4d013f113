//! Test utilities for subscout-core
//!
//! Mock Powens and svgl HTTP servers, in-process stand-ins for the detector's
//! collaborators, and a compact transaction builder.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::oneshot;

use crate::bank::TransactionSource;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::logo::LogoLookup;
use crate::models::{CreateOutcome, DetectedSubscription, Transaction, TransactionsResponse};
use crate::store::SubscriptionStore;

/// Build a transaction; `value` is a decimal literal such as "-9.99"
pub fn tx(id: i64, date: &str, wording: &str, value: &str) -> Transaction {
    Transaction {
        id,
        account_id: 1,
        date: date.to_string(),
        original_wording: format!("CB {}", wording),
        simplified_wording: wording.to_string(),
        kind: Some("card".to_string()),
        value: value.parse::<Decimal>().unwrap(),
        formatted_value: value.to_string(),
    }
}

/// Two Spotify charges a month apart and a one-off train ticket
pub fn sample_transactions() -> Vec<Transaction> {
    vec![
        tx(1, "2024-01-05", "SPOTIFY PARIS", "-9.99"),
        tx(2, "2024-02-04", "SPOTIFY PARIS", "-9.99"),
        tx(3, "2024-01-20", "SNCF", "-45.00"),
    ]
}

async fn serve(app: Router) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .unwrap();
    });

    (addr, shutdown_tx)
}

struct PowensState {
    transactions: Vec<Transaction>,
    last_limit: Mutex<Option<u32>>,
}

/// Mock Powens aggregator serving one user's transactions
pub struct MockPowensServer {
    addr: SocketAddr,
    state: Arc<PowensState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockPowensServer {
    pub const USER_ID: i64 = 4242;
    pub const TOKEN: &'static str = "test-token";

    /// Start with [`sample_transactions`]
    pub async fn start() -> Self {
        Self::start_with(sample_transactions()).await
    }

    pub async fn start_with(transactions: Vec<Transaction>) -> Self {
        let state = Arc::new(PowensState {
            transactions,
            last_limit: Mutex::new(None),
        });
        let app = Router::new()
            .route("/users/:id/transactions", get(handle_transactions))
            .with_state(state.clone());

        let (addr, shutdown_tx) = serve(app).await;
        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// `limit` query parameter of the last accepted request
    pub fn last_limit(&self) -> Option<u32> {
        *self.state.last_limit.lock().unwrap()
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockPowensServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_transactions(
    State(state): State<Arc<PowensState>>,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let expected = format!("Bearer {}", MockPowensServer::TOKEN);
    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "invalid access token").into_response();
    }
    if id != MockPowensServer::USER_ID {
        return (StatusCode::NOT_FOUND, "unknown user").into_response();
    }

    *state.last_limit.lock().unwrap() = params.get("limit").and_then(|l| l.parse().ok());

    Json(TransactionsResponse {
        transactions: state.transactions.clone(),
    })
    .into_response()
}

/// Mock svgl logo search API
///
/// Knows "netflix", "spotify", "googledrive" and "notion" (themed route);
/// every other search returns an empty list.
pub struct MockLogoServer {
    addr: SocketAddr,
    searches: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockLogoServer {
    pub async fn start() -> Self {
        let searches = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/", get(handle_logo_search))
            .with_state(searches.clone());

        let (addr, shutdown_tx) = serve(app).await;
        Self {
            addr,
            searches,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Every search term received, in order
    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockLogoServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_logo_search(
    State(searches): State<Arc<Mutex<Vec<String>>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let term = params.get("search").cloned().unwrap_or_default();
    searches.lock().unwrap().push(term.clone());

    let body = match term.as_str() {
        "netflix" => json!([{"id": 1, "title": "Netflix", "route": "https://svgl.app/library/netflix.svg"}]),
        "spotify" => json!([{"id": 2, "title": "Spotify", "route": "https://svgl.app/library/spotify.svg"}]),
        "googledrive" => json!([{"id": 3, "title": "Google Drive", "route": "https://svgl.app/library/drive.svg"}]),
        "notion" => json!([{
            "id": 4,
            "title": "Notion",
            "route": {
                "light": "https://svgl.app/library/notion_light.svg",
                "dark": "https://svgl.app/library/notion_dark.svg"
            }
        }]),
        _ => json!([]),
    };
    Json(body)
}

/// In-memory transaction source
#[derive(Default)]
pub struct MockTransactionSource {
    batches: HashMap<String, Vec<Transaction>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
}

impl MockTransactionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: &str, transactions: Vec<Transaction>) -> Self {
        self.batches.insert(user_id.to_string(), transactions);
        self
    }

    /// Fetches for this user fail like an unavailable aggregator
    pub fn with_failure(mut self, user_id: &str) -> Self {
        self.failing.insert(user_id.to_string());
        self
    }

    /// Fetches for this user take `delay` before answering
    pub fn with_delay(mut self, user_id: &str, delay: Duration) -> Self {
        self.delays.insert(user_id.to_string(), delay);
        self
    }
}

#[async_trait]
impl TransactionSource for MockTransactionSource {
    async fn fetch_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        if let Some(delay) = self.delays.get(user_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(user_id) {
            return Err(Error::Aggregator {
                status: 503,
                message: "aggregator unavailable".to_string(),
            });
        }
        self.batches
            .get(user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("No transactions for {}", user_id)))
    }
}

/// Logo lookup answering `https://logos.test/<name>.svg` for any provider
pub struct StaticLogo;

#[async_trait]
impl LogoLookup for StaticLogo {
    async fn lookup(&self, provider_name: &str) -> Result<String> {
        Ok(format!(
            "https://logos.test/{}.svg",
            provider_name.to_lowercase().replace(' ', "-")
        ))
    }
}

/// Logo lookup that always errors
pub struct FailingLogo;

#[async_trait]
impl LogoLookup for FailingLogo {
    async fn lookup(&self, _provider_name: &str) -> Result<String> {
        Err(Error::InvalidData("logo service unavailable".to_string()))
    }
}

/// Logo lookup that answers only after `0`
pub struct SlowLogo(pub Duration);

#[async_trait]
impl LogoLookup for SlowLogo {
    async fn lookup(&self, provider_name: &str) -> Result<String> {
        tokio::time::sleep(self.0).await;
        StaticLogo.lookup(provider_name).await
    }
}

/// Database-backed store that fails on demand for chosen providers
pub struct FlakyStore {
    pub inner: Database,
    pub fail_create_for: HashSet<String>,
    pub fail_exists_for: HashSet<String>,
}

impl FlakyStore {
    pub fn new(inner: Database) -> Self {
        Self {
            inner,
            fail_create_for: HashSet::new(),
            fail_exists_for: HashSet::new(),
        }
    }

    pub fn failing_create(mut self, provider_name: &str) -> Self {
        self.fail_create_for.insert(provider_name.to_string());
        self
    }

    pub fn failing_exists(mut self, provider_name: &str) -> Self {
        self.fail_exists_for.insert(provider_name.to_string());
        self
    }
}

impl SubscriptionStore for FlakyStore {
    fn subscription_exists(
        &self,
        user_id: &str,
        provider_name: &str,
        price: Decimal,
        start_date: NaiveDate,
    ) -> Result<bool> {
        if self.fail_exists_for.contains(provider_name) {
            return Err(Error::InvalidData("simulated lookup failure".to_string()));
        }
        self.inner
            .subscription_exists(user_id, provider_name, price, start_date)
    }

    fn create_subscription(&self, candidate: &DetectedSubscription) -> Result<CreateOutcome> {
        if self.fail_create_for.contains(&candidate.provider_name) {
            return Err(Error::InvalidData("simulated insert failure".to_string()));
        }
        self.inner.create_subscription(candidate)
    }
}
