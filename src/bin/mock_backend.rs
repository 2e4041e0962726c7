//! In-memory double of the backend API, for developing the panel without the
//! real service. Serves the stats and API-key endpoints and keeps itself busy
//! with a synthetic traffic generator.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, Timelike, Utc};
use clap::Parser;
use keypanel::{ApiKey, CallRecord, StatsSnapshot};
use nanoid::nanoid;
use rand::{Rng, seq::SliceRandom};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::RwLock;

const MAX_RECORDS: usize = 100;

const PATHS: &[&str] = &[
    "/api/users",
    "/api/users/profile",
    "/api/orders",
    "/api/orders/recent",
    "/api/search",
    "/api/search/suggest",
    "/api/billing/invoices",
    "/api/billing/plans",
    "/api/inventory",
    "/api/inventory/low-stock",
    "/api/reports/daily",
    "/api/reports/weekly/detailed/export",
];

const METHODS: &[&str] = &["GET", "GET", "GET", "POST", "PUT", "DELETE"];

const IPS: &[&str] = &[
    "203.0.113.7",
    "203.0.113.24",
    "198.51.100.3",
    "198.51.100.77",
    "192.0.2.15",
];

const STATUSES: &[u16] = &[200, 200, 200, 200, 400, 404, 500];

#[derive(Parser, Debug)]
#[command(name = "mock_backend", about = "In-memory backend double with synthetic traffic")]
struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,
    /// Milliseconds between synthetic calls.
    #[arg(long, default_value_t = 700)]
    tick_ms: u64,
}

#[derive(Default)]
struct MockState {
    keys: Vec<ApiKey>,
    next_id: i64,
    stats: StatsSnapshot,
    last_call_at: Option<DateTime<Utc>>,
}

impl MockState {
    fn seeded() -> Self {
        let mut state = Self::default();
        state.add_key("local-dev".to_owned(), 100, false);
        state.add_key("ci-pipeline".to_owned(), 0, true);
        state
    }

    fn add_key(&mut self, name: String, max_usage: i64, is_permanent: bool) -> ApiKey {
        self.next_id += 1;
        let key = ApiKey {
            id: self.next_id,
            name,
            key: format!("sk-{}", nanoid!(24)),
            max_usage,
            current_usage: 0,
            is_permanent,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.keys.push(key.clone());
        key
    }

    /// Mirrors the real service's recording rules: per-day and per-hour
    /// counters reset when the date or hour rolls over, and the record list
    /// keeps the newest 100 entries at the front. Rollovers are detected
    /// against the previous call's timestamp, so each one resets exactly once.
    fn record_call(&mut self, record: CallRecord) {
        let now = record.timestamp;
        if let Some(last) = self.last_call_at {
            if last.date_naive() != now.date_naive() {
                self.stats.daily_calls = 0;
                self.stats.hourly_calls = 0;
                self.stats.last_reset_time = Some(now);
            } else if last.hour() != now.hour() {
                self.stats.hourly_calls = 0;
            }
        } else {
            self.stats.last_reset_time = Some(now);
        }
        self.last_call_at = Some(now);

        self.stats.total_calls += 1;
        self.stats.daily_calls += 1;
        self.stats.hourly_calls += 1;
        *self
            .stats
            .method_calls
            .entry(record.method.clone())
            .or_default() += 1;
        *self
            .stats
            .path_calls
            .entry(record.path.clone())
            .or_default() += 1;
        *self.stats.ip_calls.entry(record.ip.clone()).or_default() += 1;

        self.stats.last_call_details.insert(0, record);
        self.stats.last_call_details.truncate(MAX_RECORDS);
    }
}

type SharedState = Arc<RwLock<MockState>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let state: SharedState = Arc::new(RwLock::new(MockState::seeded()));

    spawn_traffic(Arc::clone(&state), cli.tick_ms);

    let router = Router::new()
        .route("/api/stats", get(get_stats))
        .route("/auth/api_key", get(list_keys).post(create_key))
        .route("/auth/api_key/:id", axum::routing::delete(delete_key))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    println!("mock backend listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}

fn spawn_traffic(state: SharedState, tick_ms: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_millis(tick_ms));
        loop {
            ticker.tick().await;
            let (record, bump_key) = synth_call();
            let mut state = state.write().await;
            state.record_call(record);
            if bump_key {
                if let Some(key) = state.keys.iter_mut().find(|key| !key.is_permanent) {
                    key.current_usage += 1;
                    key.updated_at = Some(Utc::now());
                }
            }
        }
    });
}

/// One synthetic call, weighted towards GET and 200.
fn synth_call() -> (CallRecord, bool) {
    let mut rng = rand::thread_rng();
    let record = CallRecord {
        timestamp: Utc::now(),
        path: PATHS.choose(&mut rng).copied().unwrap_or("/api/users").to_owned(),
        method: METHODS.choose(&mut rng).copied().unwrap_or("GET").to_owned(),
        ip: IPS.choose(&mut rng).copied().unwrap_or("192.0.2.1").to_owned(),
        status_code: STATUSES.choose(&mut rng).copied().unwrap_or(200),
    };
    (record, rng.gen_range(0..3) == 0)
}

async fn get_stats(State(state): State<SharedState>) -> Json<StatsSnapshot> {
    Json(state.read().await.stats.clone())
}

async fn list_keys(State(state): State<SharedState>) -> Json<Value> {
    let state = state.read().await;
    Json(json!({ "api_keys": state.keys }))
}

#[derive(Debug, Deserialize)]
struct CreateKeyBody {
    name: String,
    #[serde(default)]
    max_usage: i64,
    #[serde(default)]
    is_permanent: bool,
}

async fn create_key(
    State(state): State<SharedState>,
    Json(body): Json<CreateKeyBody>,
) -> (StatusCode, Json<Value>) {
    if body.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "name is required" })),
        );
    }
    let mut state = state.write().await;
    let key = state.add_key(body.name.trim().to_owned(), body.max_usage, body.is_permanent);
    (StatusCode::CREATED, Json(json!({ "api_key": key })))
}

async fn delete_key(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.write().await;
    let before = state.keys.len();
    state.keys.retain(|key| key.id != id);
    if state.keys.len() < before {
        (StatusCode::OK, Json(json!({ "message": "API key deleted" })))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "API key not found" })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_at(timestamp: &str) -> CallRecord {
        CallRecord {
            timestamp: timestamp.parse().unwrap(),
            path: "/api/users".into(),
            method: "GET".into(),
            ip: "192.0.2.1".into(),
            status_code: 200,
        }
    }

    #[test]
    fn hourly_counter_survives_the_rest_of_the_hour() {
        let mut state = MockState::seeded();
        state.record_call(call_at("2026-08-23T10:50:00Z"));
        state.record_call(call_at("2026-08-23T11:05:00Z"));
        state.record_call(call_at("2026-08-23T11:10:00Z"));

        // only the 10:50 -> 11:05 transition resets the counter
        assert_eq!(state.stats.hourly_calls, 2);
        assert_eq!(state.stats.daily_calls, 3);
        assert_eq!(state.stats.total_calls, 3);
    }

    #[test]
    fn day_rollover_resets_daily_and_hourly_counters() {
        let mut state = MockState::seeded();
        state.record_call(call_at("2026-08-22T23:59:00Z"));
        state.record_call(call_at("2026-08-23T00:01:00Z"));

        assert_eq!(state.stats.total_calls, 2);
        assert_eq!(state.stats.daily_calls, 1);
        assert_eq!(state.stats.hourly_calls, 1);
        assert_eq!(
            state.stats.last_reset_time,
            Some("2026-08-23T00:01:00Z".parse::<DateTime<Utc>>().unwrap())
        );
    }
}
