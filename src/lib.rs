use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// 面板后端默认地址。
pub const DEFAULT_BACKEND: &str = "http://127.0.0.1:8080";

/// 统计数据轮询间隔，与原面板一致，固定 5 秒，不可配置。
pub const POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Chart keeps at most this many named paths; the rest collapse into one bucket.
pub const CHART_TOP_N: usize = 10;

/// Label of the long-tail bucket appended by [`top_n_with_other`].
pub const OTHER_LABEL: &str = "other";

// ---- Data model ----

/// 后端返回的 API key 记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: i64,
    pub name: String,
    pub key: String,
    pub max_usage: i64,
    pub current_usage: i64,
    pub is_permanent: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// 一次完整的统计快照，每个轮询周期整体替换，从不做增量合并。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(default)]
    pub total_calls: u64,
    #[serde(default)]
    pub daily_calls: u64,
    #[serde(default)]
    pub hourly_calls: u64,
    #[serde(default)]
    pub method_calls: BTreeMap<String, u64>,
    #[serde(default)]
    pub path_calls: BTreeMap<String, u64>,
    #[serde(default)]
    pub ip_calls: BTreeMap<String, u64>,
    #[serde(default)]
    pub last_reset_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_call_details: Vec<CallRecord>,
}

/// 单条调用记录，只读展示。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub timestamp: DateTime<Utc>,
    pub path: String,
    pub method: String,
    pub ip: String,
    pub status_code: u16,
}

/// One bar of the path chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPoint {
    pub label: String,
    pub count: u64,
}

pub type ChartSeries = Vec<ChartPoint>;

// ---- Errors ----

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("invalid backend endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned status {0}")]
    UnexpectedStatus(StatusCode),
    #[error("unexpected payload shape: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("{message}")]
    Backend { message: String },
}

// ---- HTTP client wrapper ----

#[derive(Debug, Deserialize)]
struct KeyListEnvelope {
    api_keys: Vec<ApiKey>,
}

#[derive(Debug, Deserialize)]
struct CreateKeyEnvelope {
    api_key: Option<ApiKey>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteKeyEnvelope {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateKeyRequest<'a> {
    name: &'a str,
    max_usage: i64,
    is_permanent: bool,
}

/// 面板侧的后端 HTTP 客户端，封装统计与 API key 的全部调用。
#[derive(Clone, Debug)]
pub struct BackendClient {
    client: Client,
    base: Url,
}

impl BackendClient {
    pub fn new(endpoint: &str) -> Result<Self, PanelError> {
        let base = Url::parse(endpoint).map_err(|source| PanelError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            source,
        })?;
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    /// Endpoint paths are appended to the configured base, so a backend
    /// behind a path prefix (`http://host/proxy`) keeps that prefix.
    fn url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let prefix = self.base.path().trim_end_matches('/');
        url.set_path(&format!("{prefix}{path}"));
        url
    }

    /// 拉取一次完整的统计快照。
    pub async fn fetch_stats(&self) -> Result<StatsSnapshot, PanelError> {
        let response = self.client.get(self.url("/api/stats")).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PanelError::UnexpectedStatus(status));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn list_keys(&self) -> Result<Vec<ApiKey>, PanelError> {
        let response = self.client.get(self.url("/auth/api_key")).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(backend_failure(status, &body));
        }
        let envelope: KeyListEnvelope = serde_json::from_str(&body)?;
        Ok(envelope.api_keys)
    }

    pub async fn create_key(
        &self,
        name: &str,
        max_usage: i64,
        is_permanent: bool,
    ) -> Result<ApiKey, PanelError> {
        let response = self
            .client
            .post(self.url("/auth/api_key"))
            .json(&CreateKeyRequest {
                name,
                max_usage,
                is_permanent,
            })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(backend_failure(status, &body));
        }
        let envelope: CreateKeyEnvelope = serde_json::from_str(&body)?;
        match envelope.api_key {
            Some(key) => Ok(key),
            None => Err(PanelError::Backend {
                message: envelope.error.unwrap_or_else(|| "unknown error".to_owned()),
            }),
        }
    }

    pub async fn delete_key(&self, id: i64) -> Result<String, PanelError> {
        let response = self
            .client
            .delete(self.url(&format!("/auth/api_key/{id}")))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(backend_failure(status, &body));
        }
        let envelope: DeleteKeyEnvelope = serde_json::from_str(&body)?;
        match envelope.message {
            Some(message) => Ok(message),
            None => Err(PanelError::Backend {
                message: envelope.error.unwrap_or_else(|| "unknown error".to_owned()),
            }),
        }
    }
}

/// Prefer the backend-provided `{error}` message over the bare status code.
fn backend_failure(status: StatusCode, body: &str) -> PanelError {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: String,
    }

    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => PanelError::Backend {
            message: envelope.error,
        },
        Err(_) => PanelError::UnexpectedStatus(status),
    }
}

// ---- Aggregation ----

/// `round(100 * part / total)`；total 为 0 时返回 0，避免除零。
pub fn pct(part: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

/// Sort counts descending, keep the first `n`, and collapse the remainder
/// into a trailing `"other"` point. Ties keep encounter order (the snapshot
/// maps iterate in label order, which is the documented tie-break).
pub fn top_n_with_other(counts: &BTreeMap<String, u64>, n: usize) -> ChartSeries {
    let mut points: ChartSeries = counts
        .iter()
        .map(|(label, count)| ChartPoint {
            label: label.clone(),
            count: *count,
        })
        .collect();

    points.sort_by(|a, b| b.count.cmp(&a.count));

    if points.len() > n {
        let rest: u64 = points[n..].iter().map(|point| point.count).sum();
        points.truncate(n);
        points.push(ChartPoint {
            label: OTHER_LABEL.to_owned(),
            count: rest,
        });
    }

    points
}

// ---- Chart ----

/// Fixed presentation settings, decided once when the chart is created and
/// never changed by data updates.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub gradient_from: &'static str,
    pub gradient_to: &'static str,
    pub border_color: &'static str,
    pub border_width: u32,
    pub bar_ratio: f32,
    pub label_max: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            gradient_from: "rgba(102, 126, 234, 0.8)",
            gradient_to: "rgba(102, 126, 234, 0.2)",
            border_color: "rgba(102, 126, 234, 1)",
            border_width: 2,
            bar_ratio: 0.6,
            label_max: 15,
        }
    }
}

/// 路径统计柱状图，配置固定，数据随每次刷新整体替换。
#[derive(Debug, Clone)]
pub struct Chart {
    config: ChartConfig,
    series: ChartSeries,
}

impl Chart {
    fn new(series: ChartSeries) -> Self {
        Self {
            config: ChartConfig::default(),
            series,
        }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn series(&self) -> &[ChartPoint] {
        &self.series
    }

    /// Axis labels longer than the configured limit are clipped with an ellipsis.
    pub fn clipped_label(&self, label: &str) -> String {
        if label.chars().count() > self.config.label_max {
            let mut clipped: String = label.chars().take(self.config.label_max).collect();
            clipped.push_str("...");
            clipped
        } else {
            label.to_owned()
        }
    }
}

/// Owns the single chart instance; replaces the module-level global of the
/// original frontend.
#[derive(Debug, Default)]
pub struct Dashboard {
    chart: Option<Chart>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the existing chart's data in place, or create the chart on
    /// first use. Configuration survives updates untouched.
    pub fn create_or_update(&mut self, series: ChartSeries) -> &Chart {
        let chart = self.chart.get_or_insert_with(|| Chart::new(Vec::new()));
        chart.series = series;
        chart
    }

    pub fn chart(&self) -> Option<&Chart> {
        self.chart.as_ref()
    }
}

// ---- Sort controller ----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIndicator {
    Unsorted,
    Ascending,
    Descending,
}

/// A row as rendered into the table: plain cell text, no typed values left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub cells: Vec<String>,
}

impl RenderedRow {
    /// Numeric value of a cell, parsed the way the original frontend did
    /// (leading integer prefix). Cells that fail to parse count as 0.
    pub fn numeric_cell(&self, column: usize) -> i64 {
        self.cells
            .get(column)
            .and_then(|text| leading_int(text))
            .unwrap_or(0)
    }
}

fn leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let negative = trimmed.starts_with('-');
    let digits: String = trimmed
        .chars()
        .skip(usize::from(negative))
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    let value: i64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// 表格排序控制器：每列在 未排序 → 降序 → 升序 → 降序 之间循环，
/// 任意时刻只有一列处于激活状态。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortController {
    active: Option<(usize, SortOrder)>,
}

impl SortController {
    /// Rebuild the controller from state observed in the rendered page
    /// (query string), the single source of truth between requests.
    pub fn from_observed(column: Option<usize>, order: Option<SortOrder>) -> Self {
        Self {
            active: match (column, order) {
                (Some(column), Some(order)) => Some((column, order)),
                _ => None,
            },
        }
    }

    /// Click transition: activating a column clears every other column's
    /// indicator before applying its own.
    pub fn click(&mut self, column: usize) {
        let next = match self.active {
            Some((active, SortOrder::Descending)) if active == column => SortOrder::Ascending,
            Some((active, SortOrder::Ascending)) if active == column => SortOrder::Descending,
            _ => SortOrder::Descending,
        };
        self.active = Some((column, next));
    }

    pub fn indicator(&self, column: usize) -> SortIndicator {
        match self.active {
            Some((active, SortOrder::Ascending)) if active == column => SortIndicator::Ascending,
            Some((active, SortOrder::Descending)) if active == column => SortIndicator::Descending,
            _ => SortIndicator::Unsorted,
        }
    }

    pub fn active(&self) -> Option<(usize, SortOrder)> {
        self.active
    }

    /// Reorder already-rendered rows in place. Stable, so equal values keep
    /// their encounter order. No data is re-fetched.
    pub fn apply(&self, rows: &mut [RenderedRow]) {
        let Some((column, order)) = self.active else {
            return;
        };
        match order {
            SortOrder::Ascending => {
                rows.sort_by(|a, b| a.numeric_cell(column).cmp(&b.numeric_cell(column)));
            }
            SortOrder::Descending => {
                rows.sort_by(|a, b| b.numeric_cell(column).cmp(&a.numeric_cell(column)));
            }
        }
    }
}

// ---- Poll loop ----

#[derive(Debug, Default)]
struct CellState {
    snapshot: Option<StatsSnapshot>,
    generation: u64,
}

/// 最近一次发布的统计快照。带请求代数，乱序到达的旧响应会被丢弃，
/// 页面上展示的永远是最近一次发起的成功响应。
#[derive(Debug, Default)]
pub struct SnapshotCell {
    state: RwLock<CellState>,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a snapshot fetched under `generation`. Returns false when a
    /// newer generation has already been applied and the value is dropped.
    pub async fn publish(&self, generation: u64, snapshot: StatsSnapshot) -> bool {
        let mut state = self.state.write().await;
        if generation <= state.generation {
            return false;
        }
        state.generation = generation;
        state.snapshot = Some(snapshot);
        true
    }

    pub async fn latest(&self) -> Option<StatsSnapshot> {
        self.state.read().await.snapshot.clone()
    }
}

/// 固定间隔刷新统计数据的轮询任务。失败只记录日志并跳过本轮，
/// 页面继续展示上一份快照。
pub struct StatsPoller {
    client: BackendClient,
    cell: Arc<SnapshotCell>,
    issued: AtomicU64,
}

impl StatsPoller {
    pub fn new(client: BackendClient, cell: Arc<SnapshotCell>) -> Self {
        Self {
            client,
            cell,
            issued: AtomicU64::new(0),
        }
    }

    /// Runs for the lifetime of the process. The first tick fires
    /// immediately so the dashboard has data as soon as the backend answers.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        loop {
            ticker.tick().await;
            // A slow fetch must not delay the next tick; the generation
            // guard in the cell keeps late arrivals from clobbering newer data.
            tokio::spawn(refresh(
                self.client.clone(),
                Arc::clone(&self.cell),
                self.next_generation(),
            ));
        }
    }

    /// One fetch-and-publish round. A failed fetch is logged and skipped,
    /// leaving the previously published snapshot in place.
    pub async fn tick_once(&self) {
        refresh(
            self.client.clone(),
            Arc::clone(&self.cell),
            self.next_generation(),
        )
        .await;
    }

    fn next_generation(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }
}

async fn refresh(client: BackendClient, cell: Arc<SnapshotCell>, generation: u64) {
    match client.fetch_stats().await {
        Ok(snapshot) => {
            if !cell.publish(generation, snapshot).await {
                eprintln!("stats refresh {generation} arrived late, discarded");
            }
        }
        Err(err) => {
            eprintln!("stats refresh failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs
            .iter()
            .map(|(label, count)| (label.to_string(), *count))
            .collect()
    }

    #[test]
    fn pct_guards_divide_by_zero() {
        assert_eq!(pct(0, 0), 0);
        assert_eq!(pct(5, 0), 0);
        assert_eq!(pct(50, 200), 25);
        assert_eq!(pct(1, 3), 33);
        assert_eq!(pct(2, 3), 67);
    }

    #[test]
    fn top_n_keeps_small_inputs_intact() {
        let counts = counts(&[("/a", 5), ("/b", 3), ("/c", 2)]);
        let series = top_n_with_other(&counts, CHART_TOP_N);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].label, "/a");
        assert_eq!(series[2].label, "/c");
    }

    #[test]
    fn top_n_buckets_the_long_tail() {
        let pairs: Vec<(String, u64)> = (0..12u64).map(|i| (format!("/path/{i:02}"), 12 - i)).collect();
        let counts: BTreeMap<String, u64> = pairs.into_iter().collect();
        let series = top_n_with_other(&counts, CHART_TOP_N);

        assert_eq!(series.len(), CHART_TOP_N + 1);
        let last = series.last().unwrap();
        assert_eq!(last.label, OTHER_LABEL);
        // the two smallest counts (1 and 2) fall into the bucket
        assert_eq!(last.count, 3);

        let input_total: u64 = counts.values().sum();
        let output_total: u64 = series.iter().map(|point| point.count).sum();
        assert_eq!(input_total, output_total);
    }

    #[test]
    fn top_n_ties_keep_encounter_order() {
        let counts = counts(&[("/b", 4), ("/a", 4), ("/c", 9)]);
        let series = top_n_with_other(&counts, CHART_TOP_N);
        assert_eq!(series[0].label, "/c");
        // BTreeMap iterates in label order, stable sort preserves it
        assert_eq!(series[1].label, "/a");
        assert_eq!(series[2].label, "/b");
    }

    #[test]
    fn dashboard_creates_then_updates_in_place() {
        let mut dashboard = Dashboard::new();
        assert!(dashboard.chart().is_none());

        let first = dashboard
            .create_or_update(vec![ChartPoint {
                label: "/a".into(),
                count: 1,
            }])
            .config()
            .clone();

        let chart = dashboard.create_or_update(vec![
            ChartPoint {
                label: "/b".into(),
                count: 7,
            },
            ChartPoint {
                label: "/c".into(),
                count: 3,
            },
        ]);
        assert_eq!(chart.series().len(), 2);
        assert_eq!(chart.config(), &first);
    }

    #[test]
    fn chart_labels_clip_at_fifteen_chars() {
        let mut dashboard = Dashboard::new();
        let chart = dashboard.create_or_update(Vec::new());
        assert_eq!(chart.clipped_label("/short"), "/short");
        assert_eq!(
            chart.clipped_label("/a/very/long/api/path"),
            "/a/very/long/ap..."
        );
    }

    fn rows(values: &[&str]) -> Vec<RenderedRow> {
        values
            .iter()
            .map(|value| RenderedRow {
                cells: vec!["/path".to_owned(), value.to_string()],
            })
            .collect()
    }

    #[test]
    fn sort_cycle_is_desc_then_asc_then_desc() {
        let mut controller = SortController::default();
        assert_eq!(controller.indicator(1), SortIndicator::Unsorted);

        controller.click(1);
        assert_eq!(controller.active(), Some((1, SortOrder::Descending)));
        assert_eq!(controller.indicator(1), SortIndicator::Descending);

        controller.click(1);
        assert_eq!(controller.active(), Some((1, SortOrder::Ascending)));

        controller.click(1);
        assert_eq!(controller.active(), Some((1, SortOrder::Descending)));
    }

    #[test]
    fn clicking_a_header_clears_the_other_columns() {
        let mut controller = SortController::default();
        controller.click(1);
        controller.click(2);
        assert_eq!(controller.indicator(1), SortIndicator::Unsorted);
        assert_eq!(controller.indicator(2), SortIndicator::Descending);
    }

    #[test]
    fn sort_reorders_rows_by_numeric_cell_text() {
        let mut table = rows(&["3", "10", "7"]);
        let mut controller = SortController::default();

        controller.click(1);
        controller.apply(&mut table);
        assert_eq!(table[0].cells[1], "10");
        assert_eq!(table[2].cells[1], "3");

        controller.click(1);
        controller.apply(&mut table);
        assert_eq!(table[0].cells[1], "3");
        assert_eq!(table[2].cells[1], "10");
    }

    #[test]
    fn unparseable_cells_sort_as_zero() {
        let mut table = rows(&["3", "n/a", "7"]);
        let controller = SortController::from_observed(Some(1), Some(SortOrder::Ascending));
        controller.apply(&mut table);
        assert_eq!(table[0].cells[1], "n/a");
        assert_eq!(table[2].cells[1], "7");
    }

    #[test]
    fn numeric_cell_parses_leading_integer() {
        let row = RenderedRow {
            cells: vec!["42 calls".into(), "-7".into(), "".into()],
        };
        assert_eq!(row.numeric_cell(0), 42);
        assert_eq!(row.numeric_cell(1), -7);
        assert_eq!(row.numeric_cell(2), 0);
        assert_eq!(row.numeric_cell(9), 0);
    }

    #[test]
    fn request_urls_keep_backend_path_prefix() {
        let bare = BackendClient::new("http://127.0.0.1:9").unwrap();
        assert_eq!(bare.url("/api/stats").as_str(), "http://127.0.0.1:9/api/stats");

        let prefixed = BackendClient::new("http://127.0.0.1:9/proxy").unwrap();
        assert_eq!(
            prefixed.url("/api/stats").as_str(),
            "http://127.0.0.1:9/proxy/api/stats"
        );

        let trailing = BackendClient::new("http://127.0.0.1:9/proxy/").unwrap();
        assert_eq!(
            trailing.url("/auth/api_key/5").as_str(),
            "http://127.0.0.1:9/proxy/auth/api_key/5"
        );
    }

    #[tokio::test]
    async fn failed_fetch_keeps_the_published_snapshot() {
        let cell = Arc::new(SnapshotCell::new());
        let seeded = StatsSnapshot {
            total_calls: 7,
            ..StatsSnapshot::default()
        };
        assert!(cell.publish(1, seeded).await);

        // nothing listens here; the fetch fails with a refused connection
        let client = BackendClient::new("http://127.0.0.1:1").unwrap();
        let poller = StatsPoller::new(client, Arc::clone(&cell));
        poller.tick_once().await;

        assert_eq!(cell.latest().await.unwrap().total_calls, 7);
    }

    #[tokio::test]
    async fn snapshot_cell_discards_stale_generations() {
        let cell = SnapshotCell::new();
        let newer = StatsSnapshot {
            total_calls: 20,
            ..StatsSnapshot::default()
        };
        let older = StatsSnapshot {
            total_calls: 10,
            ..StatsSnapshot::default()
        };

        assert!(cell.publish(2, newer).await);
        assert!(!cell.publish(1, older).await);

        let latest = cell.latest().await.unwrap();
        assert_eq!(latest.total_calls, 20);
    }

    #[test]
    fn snapshot_parses_backend_payload() {
        let raw = r#"{
            "total_calls": 10,
            "daily_calls": 4,
            "hourly_calls": 1,
            "method_calls": {"GET": 8, "POST": 2},
            "path_calls": {"/a": 5, "/b": 3, "/c": 2},
            "ip_calls": {"127.0.0.1": 10},
            "last_reset_time": "2026-08-23T00:00:00Z",
            "last_call_details": [
                {
                    "timestamp": "2026-08-23T10:00:00Z",
                    "path": "/a",
                    "method": "GET",
                    "ip": "127.0.0.1",
                    "status_code": 200
                }
            ]
        }"#;

        let snapshot: StatsSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.total_calls, 10);
        assert_eq!(snapshot.method_calls.len(), 2);
        assert_eq!(snapshot.path_calls["/a"], 5);
        assert_eq!(snapshot.last_call_details[0].status_code, 200);
    }

    #[test]
    fn snapshot_tolerates_minimal_payload() {
        let snapshot: StatsSnapshot =
            serde_json::from_str(r#"{"total_calls": 1, "daily_calls": 1}"#).unwrap();
        assert_eq!(snapshot.total_calls, 1);
        assert!(snapshot.path_calls.is_empty());
        assert!(snapshot.last_call_details.is_empty());
    }
}
