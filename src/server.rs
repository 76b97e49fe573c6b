//! Scrape endpoint
//!
//! Serves the best price gauge for Prometheus and a JSON health report.

use crate::{
    metrics::{render_prometheus, PROMETHEUS_CONTENT_TYPE},
    tracker::PriceTracker,
    types::{ComponentHealth, HealthStatus},
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;

/// GET /metrics - Prometheus text exposition
async fn metrics_handler(State(tracker): State<Arc<PriceTracker>>) -> impl IntoResponse {
    let prices = tracker.store().snapshot().await;
    let fetch = tracker.get_provider_metrics().await;

    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        render_prometheus(&prices, &fetch),
    )
}

/// GET /health - 200 unless no product has a fresh price
async fn health_handler(
    State(tracker): State<Arc<PriceTracker>>,
) -> (StatusCode, Json<ComponentHealth>) {
    let health = tracker.health_check().await;
    let status = match health.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(health))
}

/// Builds the router of the scrape endpoint
pub fn router(tracker: Arc<PriceTracker>) -> Router {
    Router::new()
        .route("/", get(metrics_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(tracker)
}

/// Binds the scrape endpoint and serves it until the process exits
pub async fn serve(tracker: Arc<PriceTracker>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, "Serving metrics");
    axum::serve(listener, router(tracker)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockProvider;
    use crate::tracker::TrackerOptions;
    use crate::types::{MarketParams, ProductEntry, ProductId};
    use serde_json::json;

    async fn spawn_server(tracker: Arc<PriceTracker>) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(tracker)).await.unwrap();
        });
        addr
    }

    fn tracker_with_price() -> Arc<PriceTracker> {
        let provider = Arc::new(MockProvider::new());
        provider.set_offers(
            7,
            vec![json!({ "stock": "InStock", "platform": "A", "price": { "eur": { "price": 19.5 } } })],
        );
        let entries = vec![ProductEntry {
            id: ProductId(7),
            name: "Hades".to_string(),
            market: MarketParams::new("eur"),
            store_filter: None,
        }];
        Arc::new(PriceTracker::new(entries, provider, TrackerOptions::default()))
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let tracker = tracker_with_price();
        tracker.tick().await;
        let addr = spawn_server(tracker).await;

        let response = reqwest::get(format!("http://{addr}/metrics")).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()[reqwest::header::CONTENT_TYPE],
            PROMETHEUS_CONTENT_TYPE
        );

        let body = response.text().await.unwrap();
        assert!(body.contains("allkeyshop_best_price{product_name=\"Hades\",currency=\"eur\"} 19.5"));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let tracker = tracker_with_price();
        let addr = spawn_server(tracker.clone()).await;

        let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
        assert_eq!(response.status(), 503);

        tracker.tick().await;
        let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "Healthy");
    }
}
