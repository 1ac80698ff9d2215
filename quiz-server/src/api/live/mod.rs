//! Live WebSocket 模块
//!
//! GET /ws?clientId=<id>
//!
//! 协议:
//! - Server → Client: `ready` (会话已注册，首帧), `question` (新题目，按 seq 递增), `error`
//! - Client → Server: `ack` `{ "seq": n }`
//!
//! 推送只包含 `ready` 之后创建的题目；历史题目通过 `/reconcile` 获取。
//! 客户端必须在收到 `ready` 后再对账，否则两者之间创建的题目会丢失。

mod handler;

pub use handler::process_client_message;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/ws", get(handler::handle_live_ws))
}
