//! HTTP API server for order fulfillment.
//!
//! Exposes order placement, reads, status changes and shipping updates over
//! REST, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use domain::OrderService;
use metrics_exporter_prometheus::PrometheusHandle;
use notify::{Mailer, NotificationDispatcher};
use order_store::{OrderStore, RetryPolicy};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health::<S>))
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route(
            "/orders/shipping-info",
            post(routes::orders::shipping_info::<S>),
        )
        .route(
            "/orders/{id}",
            get(routes::orders::get::<S>).delete(routes::orders::delete::<S>),
        )
        .route(
            "/orders/{id}/status",
            put(routes::orders::update_status::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds the application state around an order store and a mailer.
///
/// The store is wrapped in the connection-retry layer by the order service;
/// callers pass the raw store.
pub fn create_state<S: OrderStore + 'static>(
    store: S,
    mailer: Arc<dyn Mailer>,
    config: &Config,
) -> Arc<AppState<S>> {
    let order_service = OrderService::new(store, NotificationDispatcher::new(mailer))
        .with_policy(config.transition_policy())
        .with_retry_policy(RetryPolicy::with_base_delay(config.retry_base_delay()));

    Arc::new(AppState { order_service })
}
