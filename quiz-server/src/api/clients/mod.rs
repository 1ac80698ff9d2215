//! Client API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /clients/{clientId}/ack | GET | 客户端确认记录 |

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use shared::ClientAck;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new().route("/clients/{client_id}/ack", get(get_ack))
}

/// GET /clients/{clientId}/ack - 查询确认记录
pub async fn get_ack(
    State(state): State<ServerState>,
    Path(client_id): Path<String>,
) -> AppResult<Json<ClientAck>> {
    // 与 /ws、/reconcile 一致: 去除首尾空白
    let client_id = client_id.trim();
    if client_id.is_empty() {
        return Err(AppError::validation("clientId is required"));
    }

    let record = state
        .engine
        .client_ack(client_id)?
        .ok_or_else(|| AppError::not_found(format!("No acknowledgements for client {}", client_id)))?;
    Ok(Json(record))
}
