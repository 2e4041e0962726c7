use std::{net::SocketAddr, sync::Arc};

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use keypanel::{
    ApiKey, BackendClient, CHART_TOP_N, CallRecord, Chart, Dashboard, PanelError, RenderedRow,
    SnapshotCell, SortController, SortIndicator, SortOrder, StatsPoller, StatsSnapshot, pct,
    top_n_with_other,
};
use serde::Deserialize;
use tokio::sync::RwLock;

/// Column index of the sortable call-count cell in the path table.
const COUNT_COLUMN: usize = 1;

struct AppState {
    client: BackendClient,
    stats: Arc<SnapshotCell>,
    dashboard: RwLock<Dashboard>,
}

pub async fn serve(
    addr: SocketAddr,
    client: BackendClient,
) -> Result<(), Box<dyn std::error::Error>> {
    let stats = Arc::new(SnapshotCell::new());
    let poller = StatsPoller::new(client.clone(), Arc::clone(&stats));
    tokio::spawn(poller.run());

    let state = Arc::new(AppState {
        client,
        stats,
        dashboard: RwLock::new(Dashboard::new()),
    });

    let router = Router::new()
        .route("/", get(dashboard_page))
        .route("/health", get(health_check))
        .route("/keys", get(keys_page).post(create_key))
        .route("/keys/:id/delete", get(confirm_delete_page).post(delete_key))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;
    println!("keypanel listening on http://{bound_addr}");

    axum::serve(listener, router).await?;
    Ok(())
}

async fn health_check() -> &'static str {
    "ok"
}

// ---- Dashboard ----

#[derive(Debug, Deserialize)]
struct DashboardQuery {
    sort: Option<String>,
    dir: Option<String>,
}

fn sort_from_query(query: &DashboardQuery) -> SortController {
    let column = match query.sort.as_deref() {
        Some("count") => Some(COUNT_COLUMN),
        _ => None,
    };
    let order = match query.dir.as_deref() {
        Some("asc") => Some(SortOrder::Ascending),
        Some("desc") => Some(SortOrder::Descending),
        _ => None,
    };
    SortController::from_observed(column, order)
}

async fn dashboard_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Html<String> {
    let sort = sort_from_query(&query);
    let body = match state.stats.latest().await {
        Some(snapshot) => {
            let series = top_n_with_other(&snapshot.path_calls, CHART_TOP_N);
            let mut dashboard = state.dashboard.write().await;
            let chart = dashboard.create_or_update(series);
            render_dashboard(&snapshot, chart, &sort)
        }
        None => placeholder("Waiting for the first statistics snapshot..."),
    };
    Html(page_shell("Call statistics", &body, true))
}

/// Sections render in a fixed document order; each carries a stable id so
/// nothing is located by position.
fn render_dashboard(snapshot: &StatsSnapshot, chart: &Chart, sort: &SortController) -> String {
    let methods: Vec<(String, u64)> = snapshot
        .method_calls
        .iter()
        .map(|(method, count)| (method.clone(), *count))
        .collect();
    let top_ips: Vec<(String, u64)> = top_n_with_other(&snapshot.ip_calls, CHART_TOP_N)
        .into_iter()
        .map(|point| (point.label, point.count))
        .collect();

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        render_stat_cards(snapshot),
        section(
            "section-methods",
            "Calls by HTTP method",
            &render_bar_list(&methods, snapshot.total_calls),
        ),
        section(
            "section-paths",
            "Calls by API path",
            &render_path_table(snapshot, sort),
        ),
        section(
            "section-chart",
            "Top paths",
            &render_chart_svg(chart),
        ),
        section(
            "section-ips",
            "Top client IPs",
            &render_bar_list(&top_ips, snapshot.total_calls),
        ),
        section(
            "section-records",
            "Recent calls",
            &render_call_records(&snapshot.last_call_details),
        ),
    )
}

fn section(id: &str, title: &str, inner: &str) -> String {
    format!(
        "<section class=\"detail-section\" id=\"{id}\">\n<h2>{title}</h2>\n{inner}\n</section>"
    )
}

fn placeholder(message: &str) -> String {
    format!(
        "<div class=\"placeholder\">{}</div>",
        html_escape::encode_text(message)
    )
}

fn render_stat_cards(snapshot: &StatsSnapshot) -> String {
    let cards = [
        ("Total calls", snapshot.total_calls),
        ("Calls today", snapshot.daily_calls),
        ("HTTP methods", snapshot.method_calls.len() as u64),
        ("API paths", snapshot.path_calls.len() as u64),
    ];
    let inner: String = cards
        .iter()
        .map(|(label, value)| {
            format!(
                "<div class=\"stat-card\"><div class=\"stat-number\">{value}</div>\
                 <div class=\"stat-label\">{label}</div></div>"
            )
        })
        .collect();
    format!("<div class=\"stats-container\" id=\"section-cards\">{inner}</div>")
}

/// Labeled horizontal bars; used for the method and client-IP breakdowns.
fn render_bar_list(entries: &[(String, u64)], total: u64) -> String {
    if entries.is_empty() {
        return placeholder("No calls recorded yet.");
    }
    entries
        .iter()
        .map(|(label, count)| {
            let percentage = pct(*count, total);
            format!(
                "<div class=\"method-bar-container\">\
                 <div class=\"method-info\"><span class=\"method-name\">{}</span>\
                 <span class=\"method-count\">{count}</span></div>\
                 <div class=\"method-bar\"><div class=\"method-bar-fill\" style=\"width: {percentage}%\"></div></div>\
                 </div>",
                html_escape::encode_text(label)
            )
        })
        .collect()
}

fn sort_arrow(indicator: SortIndicator) -> &'static str {
    match indicator {
        SortIndicator::Unsorted => "&#8597;",
        SortIndicator::Ascending => "&#9650;",
        SortIndicator::Descending => "&#9660;",
    }
}

fn indicator_class(indicator: SortIndicator) -> &'static str {
    match indicator {
        SortIndicator::Unsorted => "",
        SortIndicator::Ascending => "asc",
        SortIndicator::Descending => "desc",
    }
}

fn render_path_table(snapshot: &StatsSnapshot, sort: &SortController) -> String {
    if snapshot.path_calls.is_empty() {
        return placeholder("No path statistics yet.");
    }

    let mut rows: Vec<RenderedRow> = snapshot
        .path_calls
        .iter()
        .map(|(path, count)| RenderedRow {
            cells: vec![
                path.clone(),
                count.to_string(),
                format!("{}%", pct(*count, snapshot.total_calls)),
            ],
        })
        .collect();
    sort.apply(&mut rows);

    // what clicking the header does next, encoded into its link
    let mut clicked = sort.clone();
    clicked.click(COUNT_COLUMN);
    let next_dir = match clicked.active() {
        Some((_, SortOrder::Ascending)) => "asc",
        _ => "desc",
    };
    let indicator = sort.indicator(COUNT_COLUMN);

    let body: String = rows
        .iter()
        .map(|row| {
            let width = row.numeric_cell(2);
            format!(
                "<tr><td>{}</td><td class=\"count-column\">{}</td><td>{}</td>\
                 <td><div class=\"progress\"><div class=\"progress-bar\" style=\"width: {width}%\"></div></div></td></tr>",
                html_escape::encode_text(&row.cells[0]),
                row.cells[1],
                row.cells[2],
            )
        })
        .collect();

    format!(
        "<table id=\"path-stats-table\"><thead><tr>\
         <th>Path</th>\
         <th class=\"sortable {}\"><a href=\"/?sort=count&amp;dir={next_dir}\">Calls {}</a></th>\
         <th>Share</th><th>Usage</th>\
         </tr></thead><tbody>{body}</tbody></table>",
        indicator_class(indicator),
        sort_arrow(indicator),
    )
}

fn render_chart_svg(chart: &Chart) -> String {
    let series = chart.series();
    if series.is_empty() {
        return placeholder("No data to chart yet.");
    }

    let config = chart.config();
    let max = series.iter().map(|point| point.count).max().unwrap_or(1).max(1);
    let slot = 60.0_f32;
    let bar_width = slot * config.bar_ratio;
    let plot_height = 220.0_f32;
    let label_area = 70.0_f32;
    let width = 40.0 + slot * series.len() as f32;
    let height = plot_height + label_area + 10.0;

    let mut svg = format!(
        "<svg id=\"path-stats-chart\" viewBox=\"0 0 {width:.0} {height:.0}\" \
         width=\"{width:.0}\" height=\"{height:.0}\" role=\"img\">\
         <defs><linearGradient id=\"chart-gradient\" x1=\"0\" y1=\"0\" x2=\"0\" y2=\"1\">\
         <stop offset=\"0%\" stop-color=\"{}\"/><stop offset=\"100%\" stop-color=\"{}\"/>\
         </linearGradient></defs>",
        config.gradient_from, config.gradient_to
    );

    for (i, point) in series.iter().enumerate() {
        let bar_height = (point.count as f32 / max as f32) * plot_height;
        let x = 40.0 + slot * i as f32 + (slot - bar_width) / 2.0;
        let y = 10.0 + plot_height - bar_height;
        let label_x = x + bar_width / 2.0;
        let label_y = plot_height + 28.0;
        let label = html_escape::encode_text(&chart.clipped_label(&point.label)).into_owned();
        let full = html_escape::encode_text(&point.label).into_owned();

        svg.push_str(&format!(
            "<g><title>{full}: {count}</title>\
             <rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{bar_width:.1}\" height=\"{bar_height:.1}\" \
             rx=\"5\" fill=\"url(#chart-gradient)\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>\
             <text class=\"chart-count\" x=\"{label_x:.1}\" y=\"{count_y:.1}\" text-anchor=\"middle\">{count}</text>\
             <text class=\"chart-label\" x=\"{label_x:.1}\" y=\"{label_y:.1}\" \
             transform=\"rotate(45 {label_x:.1} {label_y:.1})\">{label}</text></g>",
            count = point.count,
            stroke = config.border_color,
            stroke_width = config.border_width,
            count_y = y - 6.0,
        ));
    }

    svg.push_str("</svg>");
    svg
}

/// CSS class for a call record's status badge.
fn status_class(status_code: u16) -> &'static str {
    match status_code {
        200 => "ok",
        400 => "bad-request",
        404 => "not-found",
        _ => "error",
    }
}

fn render_call_records(records: &[CallRecord]) -> String {
    if records.is_empty() {
        return placeholder("No calls recorded yet.");
    }

    let body: String = records
        .iter()
        .map(|record| {
            format!(
                "<tr><td>{}</td><td>{}</td><td><span class=\"badge\">{}</span></td><td>{}</td>\
                 <td><span class=\"status-badge {}\">{}</span></td></tr>",
                record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                html_escape::encode_text(&record.path),
                html_escape::encode_text(&record.method),
                html_escape::encode_text(&record.ip),
                status_class(record.status_code),
                record.status_code,
            )
        })
        .collect();

    format!(
        "<table id=\"call-records-table\"><thead><tr>\
         <th>Time</th><th>Path</th><th>Method</th><th>IP</th><th>Status</th>\
         </tr></thead><tbody>{body}</tbody></table>"
    )
}

// ---- API key panel ----

/// Usage bar fill for a key card. Permanent keys always read 0; a
/// non-permanent key with no quota reads full as soon as it has been used.
fn usage_width(key: &ApiKey) -> u32 {
    if key.is_permanent {
        return 0;
    }
    if key.max_usage <= 0 {
        return if key.current_usage > 0 { 100 } else { 0 };
    }
    let ratio = key.current_usage as f64 / key.max_usage as f64;
    (ratio * 100.0).min(100.0).round() as u32
}

fn badge_text(key: &ApiKey) -> String {
    if key.is_permanent {
        "permanent".to_owned()
    } else {
        format!("limited to {} uses", key.max_usage)
    }
}

fn render_key_list(keys: &[ApiKey]) -> String {
    if keys.is_empty() {
        return placeholder("No API keys yet. Create one below.");
    }

    keys.iter()
        .map(|key| {
            let name = html_escape::encode_text(&key.name);
            let delete_href = format!(
                "/keys/{}/delete?name={}",
                key.id,
                urlencoding::encode(&key.name)
            );
            format!(
                "<div class=\"api-key-item\">\
                 <div class=\"key-head\"><h3>{name}</h3>\
                 <span class=\"badge {}\">{}</span></div>\
                 <div class=\"api-key-value\"><code>{}</code></div>\
                 <div class=\"usage-line\"><span>Usage</span><span>{}/{}</span></div>\
                 <div class=\"usage-bar\"><div class=\"usage-fill\" style=\"width: {}%\"></div></div>\
                 <div class=\"key-meta\">Created {}</div>\
                 <a class=\"btn btn-danger\" href=\"{}\">Delete</a>\
                 </div>",
                if key.is_permanent { "badge-permanent" } else { "badge-limited" },
                badge_text(key),
                html_escape::encode_text(&key.key),
                key.current_usage,
                key.max_usage,
                usage_width(key),
                key.created_at.format("%Y-%m-%d %H:%M:%S"),
                html_escape::encode_double_quoted_attribute(&delete_href),
            )
        })
        .collect()
}

fn render_key_form() -> String {
    "<form class=\"key-form\" method=\"post\" action=\"/keys\">\
     <h2>Create API key</h2>\
     <label>Name <input type=\"text\" name=\"name\" required></label>\
     <label>Max usage <input type=\"number\" name=\"max_usage\" value=\"100\" min=\"0\"></label>\
     <label class=\"checkbox\"><input type=\"checkbox\" name=\"is_permanent\"> Permanent</label>\
     <button type=\"submit\" class=\"btn\">Create</button>\
     </form>"
        .to_owned()
}

fn render_notice(notice: &str) -> String {
    format!(
        "<div class=\"notice\">{}</div>",
        html_escape::encode_text(notice)
    )
}

fn render_inline_error(message: &str) -> String {
    format!(
        "<div class=\"alert\">{}</div>",
        html_escape::encode_text(message)
    )
}

fn render_alert_page(title: &str, message: &str, back: &str) -> String {
    format!(
        "<section class=\"detail-section\"><h2>{}</h2><div class=\"alert\">{}</div>\
         <a class=\"btn\" href=\"{back}\">Back</a></section>",
        html_escape::encode_text(title),
        html_escape::encode_text(message),
    )
}

fn render_confirm_delete(id: i64, name: &str) -> String {
    format!(
        "<section class=\"detail-section\" id=\"section-confirm\">\
         <h2>Delete API key</h2>\
         <p>Delete API key \"{}\"? This action cannot be undone.</p>\
         <form method=\"post\" action=\"/keys/{id}/delete\">\
         <button type=\"submit\" class=\"btn btn-danger\">Delete</button>\
         <a class=\"btn\" href=\"/keys\">Cancel</a>\
         </form></section>",
        html_escape::encode_text(name),
    )
}

#[derive(Debug, Deserialize)]
struct KeysQuery {
    notice: Option<String>,
}

async fn keys_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeysQuery>,
) -> Html<String> {
    let list = match state.client.list_keys().await {
        Ok(keys) => render_key_list(&keys),
        Err(err) => {
            eprintln!("list keys error: {err}");
            render_inline_error("Failed to load API keys, please refresh and retry.")
        }
    };

    let notice = query
        .notice
        .as_deref()
        .map(render_notice)
        .unwrap_or_default();

    let body = format!(
        "{notice}<section class=\"detail-section\" id=\"section-keys\">\
         <h2>API keys</h2><div id=\"api-keys-container\">{list}</div></section>\
         <section class=\"detail-section\" id=\"section-create\">{}</section>",
        render_key_form()
    );
    Html(page_shell("API keys", &body, false))
}

#[derive(Debug, Deserialize)]
struct CreateKeyForm {
    name: String,
    max_usage: Option<i64>,
    is_permanent: Option<String>,
}

async fn create_key(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CreateKeyForm>,
) -> Response {
    let is_permanent = matches!(form.is_permanent.as_deref(), Some("on") | Some("true"));
    match state
        .client
        .create_key(form.name.trim(), form.max_usage.unwrap_or(0), is_permanent)
        .await
    {
        Ok(_) => redirect_with_notice("API key created"),
        Err(err) => {
            eprintln!("create key error: {err}");
            let message = user_message(&err, "Failed to create API key, please retry.");
            Html(page_shell(
                "Create failed",
                &render_alert_page("Create failed", &message, "/keys"),
                false,
            ))
            .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    name: Option<String>,
}

/// First step of deletion: a confirmation view naming the key. Cancelling
/// navigates back without any backend call.
async fn confirm_delete_page(
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> Html<String> {
    let name = query.name.unwrap_or_else(|| format!("#{id}"));
    Html(page_shell(
        "Delete API key",
        &render_confirm_delete(id, &name),
        false,
    ))
}

async fn delete_key(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    match state.client.delete_key(id).await {
        Ok(_) => redirect_with_notice("API key deleted"),
        Err(err) => {
            eprintln!("delete key error: {err}");
            let message = user_message(&err, "Failed to delete API key, please retry.");
            Html(page_shell(
                "Delete failed",
                &render_alert_page("Delete failed", &message, "/keys"),
                false,
            ))
            .into_response()
        }
    }
}

fn redirect_with_notice(notice: &str) -> Response {
    Redirect::to(&format!("/keys?notice={}", urlencoding::encode(notice))).into_response()
}

/// Backend-provided messages are shown verbatim; everything else falls back
/// to a generic cue.
fn user_message(err: &PanelError, fallback: &str) -> String {
    match err {
        PanelError::Backend { message } => message.clone(),
        _ => fallback.to_owned(),
    }
}

// ---- Page shell ----

const PANEL_STYLES: &str = r#"
  :root { color-scheme: light; }
  body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    max-width: 1200px;
    margin: 0 auto;
    padding: 20px;
    background-color: #f5f6fb;
    color: #1f2937;
  }
  h1 { text-align: center; margin-bottom: 12px; }
  nav { text-align: center; margin-bottom: 28px; }
  nav a { color: #4f46e5; margin: 0 10px; text-decoration: none; font-weight: 600; }
  .stats-container {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
    gap: 20px;
    margin-bottom: 32px;
  }
  .stat-card {
    background: #fff;
    padding: 20px;
    border-radius: 8px;
    box-shadow: 0 2px 4px rgba(0,0,0,0.08);
    text-align: center;
  }
  .stat-number { font-size: 2.4rem; font-weight: 700; color: #667eea; }
  .stat-label { color: #666; margin-top: 4px; }
  .detail-section {
    background: #fff;
    padding: 20px;
    border-radius: 8px;
    box-shadow: 0 2px 4px rgba(0,0,0,0.08);
    margin-bottom: 28px;
  }
  .detail-section h2 { margin-top: 0; font-size: 1.3rem; }
  table { width: 100%; border-collapse: collapse; }
  th, td { padding: 10px 12px; text-align: left; border-bottom: 1px solid #e5e7eb; }
  th { background: #f3f4f6; }
  th.sortable a { color: inherit; text-decoration: none; }
  th.sortable.asc a, th.sortable.desc a { color: #4f46e5; }
  .method-bar-container { margin-bottom: 12px; }
  .method-info { display: flex; justify-content: space-between; margin-bottom: 4px; }
  .method-name { font-weight: 600; }
  .method-bar, .progress, .usage-bar {
    height: 10px;
    background: #e5e7eb;
    border-radius: 999px;
    overflow: hidden;
  }
  .method-bar-fill, .progress-bar, .usage-fill {
    height: 100%;
    background: linear-gradient(90deg, #667eea, #8b5cf6);
    border-radius: 999px;
  }
  .badge {
    display: inline-block;
    padding: 2px 10px;
    border-radius: 999px;
    background: #eef2ff;
    color: #4338ca;
    font-size: 0.8rem;
  }
  .badge-permanent { background: #dcfce7; color: #166534; }
  .badge-limited { background: #fef9c3; color: #854d0e; }
  .status-badge { padding: 2px 8px; border-radius: 6px; font-size: 0.8rem; color: #fff; }
  .status-badge.ok { background: #22c55e; }
  .status-badge.bad-request { background: #f59e0b; }
  .status-badge.not-found { background: #64748b; }
  .status-badge.error { background: #ef4444; }
  .chart-label { font-size: 11px; fill: #6b7280; }
  .chart-count { font-size: 11px; fill: #374151; }
  .api-key-item {
    border: 1px solid #e5e7eb;
    border-radius: 8px;
    padding: 16px;
    margin-bottom: 16px;
  }
  .key-head { display: flex; justify-content: space-between; align-items: center; }
  .api-key-value code {
    display: block;
    background: #f3f4f6;
    padding: 8px;
    border-radius: 6px;
    margin: 8px 0;
    overflow-wrap: anywhere;
  }
  .usage-line { display: flex; justify-content: space-between; font-size: 0.9rem; }
  .key-meta { color: #6b7280; font-size: 0.85rem; margin: 8px 0; }
  .key-form label { display: block; margin-bottom: 12px; }
  .key-form input[type=text], .key-form input[type=number] {
    display: block;
    width: 280px;
    padding: 6px 8px;
    margin-top: 4px;
    border: 1px solid #d1d5db;
    border-radius: 6px;
  }
  .btn {
    display: inline-block;
    padding: 8px 16px;
    border: none;
    border-radius: 6px;
    background: #667eea;
    color: #fff;
    font-weight: 600;
    text-decoration: none;
    cursor: pointer;
  }
  .btn-danger { background: #ef4444; }
  .notice {
    background: #dcfce7;
    color: #166534;
    padding: 10px 16px;
    border-radius: 8px;
    margin-bottom: 20px;
  }
  .alert {
    background: #fee2e2;
    color: #991b1b;
    padding: 10px 16px;
    border-radius: 8px;
    margin-bottom: 12px;
  }
  .placeholder {
    background: #eff6ff;
    color: #1d4ed8;
    padding: 12px 16px;
    border-radius: 8px;
  }
"#;

/// 页面骨架。统计页带 5 秒自动刷新，与后端轮询节奏一致。
fn page_shell(title: &str, body: &str, auto_refresh: bool) -> String {
    let refresh = if auto_refresh {
        "<meta http-equiv=\"refresh\" content=\"5\">"
    } else {
        ""
    };
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         {refresh}<title>{}</title>\n<style>{PANEL_STYLES}</style>\n</head>\n<body>\n\
         <h1>{}</h1>\n<nav><a href=\"/\">Dashboard</a><a href=\"/keys\">API keys</a></nav>\n\
         {body}\n</body>\n</html>",
        html_escape::encode_text(title),
        html_escape::encode_text(title),
    )
}
