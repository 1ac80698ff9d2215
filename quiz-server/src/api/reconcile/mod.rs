//! Reconcile API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /reconcile?clientId=&lastSeq= | GET | 返回客户端尚未确认的题目 |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/reconcile", get(handler::reconcile))
}
