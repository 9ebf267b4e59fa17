//! Prometheus request metrics.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{MatchedPath, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

use crate::error::ApiError;

const NAMESPACE: &str = "racers";
const LABELS: [&str; 3] = ["method", "route", "status"];

/// Request counter and latency histogram, labelled by method, matched route
/// and response status, held in a registry owned by this value.
#[derive(Clone)]
pub struct HttpMetrics {
    registry: Registry,
    requests: IntCounterVec,
    latency: HistogramVec,
}

impl HttpMetrics {
    /// Creates the collectors and registers them.
    ///
    /// # Errors
    ///
    /// Returns `prometheus::Error` if a collector is rejected by the registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests answered.")
                .namespace(NAMESPACE),
            &LABELS,
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "Time taken to answer an HTTP request.",
            )
            .namespace(NAMESPACE),
            &LABELS,
        )?;
        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(latency.clone()))?;
        Ok(Self {
            registry,
            requests,
            latency,
        })
    }

    /// Records one answered request.
    pub fn observe(&self, method: &str, route: &str, status: u16, seconds: f64) {
        let status = status.to_string();
        let labels = [method, route, status.as_str()];
        self.requests.with_label_values(&labels).inc();
        self.latency.with_label_values(&labels).observe(seconds);
    }

    /// Renders every registered metric in the text exposition format.
    ///
    /// # Errors
    ///
    /// Returns `prometheus::Error` if encoding fails.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}

/// Middleware recording every request that matched a route.
pub async fn track(
    State(metrics): State<Arc<HttpMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_owned(), |path| path.as_str().to_owned());

    let response = next.run(request).await;

    metrics.observe(
        &method,
        &route,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

/// GET /metrics
async fn scrape(State(metrics): State<Arc<HttpMetrics>>) -> Result<Response, ApiError> {
    let body = metrics.render().map_err(|err| {
        error!(error = %err, "rendering metrics failed");
        ApiError::internal()
    })?;
    Ok(([(CONTENT_TYPE, TextEncoder::new().format_type().to_owned())], body).into_response())
}

/// Returns the scrape endpoint router.
pub fn router(metrics: Arc<HttpMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(scrape))
        .with_state(metrics)
}
