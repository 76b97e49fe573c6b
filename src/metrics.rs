//! Fetch metrics collection and Prometheus text exposition
//!
//! Tracks latency percentiles and success rates of offer fetches, and renders
//! them together with the best price gauge in the Prometheus text format.

use crate::{
    constants::{BEST_PRICE_METRIC, FETCH_METRIC_PREFIX},
    types::BestPrice,
};
use std::collections::VecDeque;
use std::fmt::Write;
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for metrics calculation
const MAX_SAMPLES: usize = 100;

/// Content type of the Prometheus text format
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Fetch metrics for a provider
#[derive(Debug, Clone)]
pub struct ProviderMetrics {
    /// Name of the provider
    pub provider_name: String,
    /// 50th percentile latency in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Total number of requests tracked
    pub total_requests: u64,
    /// Number of failed requests
    pub failed_requests: u64,
}

impl ProviderMetrics {
    /// Creates metrics with no data
    pub fn empty(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_requests: 0,
            failed_requests: 0,
        }
    }
}

/// Internal sample for latency tracking
#[derive(Debug, Clone)]
struct LatencySample {
    duration_ms: f64,
    success: bool,
}

#[derive(Debug, Default)]
struct Counters {
    samples: VecDeque<LatencySample>,
    total_requests: u64,
    failed_requests: u64,
}

/// Collects and computes fetch metrics
pub struct MetricsCollector {
    provider_name: String,
    counters: RwLock<Counters>,
}

impl MetricsCollector {
    /// Creates a new metrics collector for a provider
    pub fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            counters: RwLock::new(Counters {
                samples: VecDeque::with_capacity(MAX_SAMPLES),
                ..Counters::default()
            }),
        }
    }

    /// Records a fetch with its duration and success status
    pub async fn record_request(&self, duration: Duration, success: bool) {
        let mut counters = self.counters.write().await;

        counters.total_requests += 1;
        if !success {
            counters.failed_requests += 1;
        }

        if counters.samples.len() >= MAX_SAMPLES {
            counters.samples.pop_front();
        }
        counters.samples.push_back(LatencySample {
            duration_ms: duration.as_secs_f64() * 1000.0,
            success,
        });
    }

    /// Computes current metrics from collected samples
    pub async fn get_metrics(&self) -> ProviderMetrics {
        let counters = self.counters.read().await;

        if counters.samples.is_empty() {
            return ProviderMetrics::empty(&self.provider_name);
        }

        // Only successful fetches count towards latency
        let mut latencies: Vec<f64> = counters
            .samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.duration_ms)
            .collect();

        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let total = counters.total_requests;
        let failed = counters.failed_requests;
        let success_rate = if total > 0 {
            (total - failed) as f64 / total as f64
        } else {
            1.0
        };

        ProviderMetrics {
            provider_name: self.provider_name.clone(),
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate,
            total_requests: total,
            failed_requests: failed,
        }
    }
}

/// Nearest-rank percentile of sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let rank = (p / 100.0 * sorted_values.len() as f64).ceil() as usize;
    sorted_values[rank.saturating_sub(1).min(sorted_values.len() - 1)]
}

/// Escapes a label value for the text format
fn escape_label(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Renders the best price gauge and fetch metrics in the Prometheus text format
pub fn render_prometheus(prices: &[BestPrice], fetch: &ProviderMetrics) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(
        out,
        "# HELP {BEST_PRICE_METRIC} Best price for a product on allkeyshop.com"
    );
    let _ = writeln!(out, "# TYPE {BEST_PRICE_METRIC} gauge");
    for price in prices {
        let _ = writeln!(
            out,
            "{BEST_PRICE_METRIC}{{product_name=\"{}\",currency=\"{}\"}} {}",
            escape_label(&price.product_name),
            escape_label(&price.currency),
            price.price
        );
    }

    let provider = escape_label(&fetch.provider_name);

    let _ = writeln!(
        out,
        "# HELP {FETCH_METRIC_PREFIX}_requests_total Offer fetches attempted"
    );
    let _ = writeln!(out, "# TYPE {FETCH_METRIC_PREFIX}_requests_total counter");
    let _ = writeln!(
        out,
        "{FETCH_METRIC_PREFIX}_requests_total{{provider=\"{provider}\"}} {}",
        fetch.total_requests
    );

    let _ = writeln!(
        out,
        "# HELP {FETCH_METRIC_PREFIX}_failures_total Offer fetches that failed"
    );
    let _ = writeln!(out, "# TYPE {FETCH_METRIC_PREFIX}_failures_total counter");
    let _ = writeln!(
        out,
        "{FETCH_METRIC_PREFIX}_failures_total{{provider=\"{provider}\"}} {}",
        fetch.failed_requests
    );

    let _ = writeln!(
        out,
        "# HELP {FETCH_METRIC_PREFIX}_latency_ms Latency of successful offer fetches"
    );
    let _ = writeln!(out, "# TYPE {FETCH_METRIC_PREFIX}_latency_ms summary");
    for (quantile, value) in [("0.5", fetch.latency_p50_ms), ("0.99", fetch.latency_p99_ms)] {
        let _ = writeln!(
            out,
            "{FETCH_METRIC_PREFIX}_latency_ms{{provider=\"{provider}\",quantile=\"{quantile}\"}} {value}"
        );
    }

    out
}
