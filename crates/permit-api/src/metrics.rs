//! Prometheus metrics.

use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use axum::Extension;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Process-local metrics registry and the counters the API maintains.
#[derive(Clone)]
pub struct ApiMetrics {
    registry: Arc<Registry>,
    pub http_requests_total: IntCounterVec,
    pub prechecks_total: IntCounter,
    pub jobs_enqueued_total: IntCounterVec,
}

impl ApiMetrics {
    /// Create and register the metric families. Registration of
    /// statically-named metrics on a fresh registry cannot collide.
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new(
                "permit_api_http_requests_total",
                "HTTP requests handled, by method and status code",
            ),
            &["method", "status"],
        )
        .expect("valid metric opts");
        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("fresh registry");

        let prechecks_total = IntCounter::new(
            "permit_api_prechecks_total",
            "Pre-checks run to completion",
        )
        .expect("valid metric opts");
        registry
            .register(Box::new(prechecks_total.clone()))
            .expect("fresh registry");

        let jobs_enqueued_total = IntCounterVec::new(
            Opts::new(
                "permit_api_jobs_enqueued_total",
                "Background jobs enqueued, by kind",
            ),
            &["kind"],
        )
        .expect("valid metric opts");
        registry
            .register(Box::new(jobs_enqueued_total.clone()))
            .expect("fresh registry");

        Self {
            registry: Arc::new(registry),
            http_requests_total,
            prechecks_total,
            jobs_enqueued_total,
        }
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(err) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::error!(%err, "failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Count every handled request by method and response status.
pub async fn metrics_middleware(
    Extension(metrics): Extension<ApiMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let response = next.run(request).await;
    metrics
        .http_requests_total
        .with_label_values(&[method.as_str(), response.status().as_str()])
        .inc();
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_render_in_exposition_format() {
        let metrics = ApiMetrics::new();
        metrics
            .http_requests_total
            .with_label_values(&["GET", "200"])
            .inc();
        metrics.prechecks_total.inc();
        metrics
            .jobs_enqueued_total
            .with_label_values(&["submit_permit"])
            .inc();

        let rendered = metrics.render();
        assert!(rendered.contains("permit_api_http_requests_total"));
        assert!(rendered.contains("permit_api_prechecks_total 1"));
        assert!(rendered.contains("submit_permit"));
    }

    #[test]
    fn registries_are_independent() {
        let a = ApiMetrics::new();
        let b = ApiMetrics::new();
        a.prechecks_total.inc();
        assert!(b.render().contains("permit_api_prechecks_total 0"));
    }
}
