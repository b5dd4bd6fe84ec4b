//! Request metrics and the `/metrics` exposition endpoint.
//!
//! Counters are keyed by route name rather than raw path, so the series count
//! stays bounded by the route table. Rendering follows the Prometheus text
//! exposition format (version 0.0.4).

use crate::api::routes::RouteName;
use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Content type of the exposition endpoint.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SeriesKey {
    group: String,
    route: String,
    method: String,
    status: u16,
}

#[derive(Debug, Default, Clone, Copy)]
struct Series {
    count: u64,
    latency: Duration,
}

/// In-process request counters shared by every route of an assembled router.
#[derive(Debug)]
pub struct Metrics {
    started: Instant,
    series: Mutex<BTreeMap<SeriesKey, Series>>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            series: Mutex::new(BTreeMap::new()),
        }
    }

    /// Record one handled request.
    pub fn record(&self, route: &RouteName, method: &Method, status: StatusCode, latency: Duration) {
        let key = SeriesKey {
            group: route.group.as_deref().unwrap_or_default().to_string(),
            route: route.name.to_string(),
            method: method.to_string(),
            status: status.as_u16(),
        };
        let mut series = self.series.lock();
        let entry = series.entry(key).or_default();
        entry.count += 1;
        entry.latency += latency;
    }

    /// Total requests recorded across all routes.
    pub fn request_count(&self) -> u64 {
        self.series.lock().values().map(|s| s.count).sum()
    }

    /// Requests recorded for one route, across methods and statuses.
    pub fn route_count(&self, group: Option<&str>, route: &str) -> u64 {
        let group = group.unwrap_or_default();
        self.series
            .lock()
            .iter()
            .filter(|(k, _)| k.group == group && k.route == route)
            .map(|(_, s)| s.count)
            .sum()
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Render every series in the text exposition format.
    pub fn render(&self) -> String {
        let snapshot: Vec<(SeriesKey, Series)> = self
            .series
            .lock()
            .iter()
            .map(|(k, s)| (k.clone(), *s))
            .collect();

        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = render_into(&mut out, &snapshot, self.uptime());
        out
    }
}

fn render_into(
    out: &mut String,
    snapshot: &[(SeriesKey, Series)],
    uptime: Duration,
) -> std::fmt::Result {
    writeln!(out, "# HELP routebook_http_requests_total Total HTTP requests handled, by route and status.")?;
    writeln!(out, "# TYPE routebook_http_requests_total counter")?;
    for (key, series) in snapshot {
        writeln!(out, "routebook_http_requests_total{{{}}} {}", labels(key), series.count)?;
    }

    writeln!(out, "# HELP routebook_http_request_duration_seconds Time spent handling HTTP requests.")?;
    writeln!(out, "# TYPE routebook_http_request_duration_seconds summary")?;
    for (key, series) in snapshot {
        let labels = labels(key);
        writeln!(
            out,
            "routebook_http_request_duration_seconds_sum{{{labels}}} {}",
            series.latency.as_secs_f64()
        )?;
        writeln!(
            out,
            "routebook_http_request_duration_seconds_count{{{labels}}} {}",
            series.count
        )?;
    }

    writeln!(out, "# HELP routebook_uptime_seconds Seconds since the router was assembled.")?;
    writeln!(out, "# TYPE routebook_uptime_seconds gauge")?;
    writeln!(out, "routebook_uptime_seconds {}", uptime.as_secs_f64())
}

fn labels(key: &SeriesKey) -> String {
    format!(
        "group=\"{}\",route=\"{}\",method=\"{}\",status=\"{}\"",
        escape(&key.group),
        escape(&key.route),
        escape(&key.method),
        key.status
    )
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Middleware recording every response that carries a [`RouteName`].
pub async fn track(State(metrics): State<Arc<Metrics>>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let start = Instant::now();
    let response = next.run(req).await;
    if let Some(route) = response.extensions().get::<RouteName>() {
        metrics.record(route, &method, response.status(), start.elapsed());
    }
    response
}

/// Exposition endpoint response.
pub(crate) fn respond(metrics: &Metrics) -> Response {
    (
        [(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE))],
        metrics.render(),
    )
        .into_response()
}
