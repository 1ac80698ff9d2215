use std::time::Duration;

use axum::{Router, middleware};
use http::{HeaderValue, Method};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::core::{Config, ServerState};

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();

    tracing::info!(target: "http_access", "{} {} {}", method, uri, status);

    response
}

/// Build the CORS layer from `CLIENT_URL`
fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    match HeaderValue::from_str(config.client_url.trim()) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any),
        Err(e) => {
            tracing::warn!(
                client_url = %config.client_url,
                error = %e,
                "Invalid CLIENT_URL, falling back to permissive CORS"
            );
            CorsLayer::permissive()
        }
    }
}

/// Build the Axum router (without state)
pub fn routes() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(crate::api::health::router())
        .merge(crate::api::questions::router())
        .merge(crate::api::reconcile::router())
        .merge(crate::api::clients::router())
        .merge(crate::api::live::router())
}

/// Build the full application with state and middleware
pub fn build_app(state: ServerState) -> Router {
    let cors = cors_layer(&state.config);
    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    let max_connections = state.config.max_connections.max(1);

    routes()
        .with_state(state)
        // Tower HTTP 中间件
        .layer(TimeoutLayer::new(timeout))
        .layer(ConcurrencyLimitLayer::new(max_connections))
        .layer(cors)
        // HTTP 请求日志中间件
        .layer(middleware::from_fn(log_request))
}
