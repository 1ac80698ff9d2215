//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | / | GET | 运行状态、存储状态、当前序列号 |
//!
//! ```json
//! {
//!   "status": "ok",
//!   "timestamp": "2026-01-01T00:00:00+00:00",
//!   "uptimeSeconds": 42,
//!   "storage": "connected",
//!   "currentSeq": 3,
//!   "liveSessions": 2
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use shared::HealthResponse;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/", get(health))
}

/// GET / - 健康检查
pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let storage_ok = state.engine.storage_healthy();

    Json(HealthResponse {
        status: if storage_ok { "ok" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_seconds: state.uptime_seconds(),
        storage: if storage_ok { "connected" } else { "error" }.to_string(),
        current_seq: state.engine.current_seq(),
        live_sessions: state.engine.live_sessions(),
    })
}
