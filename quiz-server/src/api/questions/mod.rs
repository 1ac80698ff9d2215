//! Question API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /questions | GET | 全部题目 (按 seq 升序) |
//! | /questions | POST | 创建题目并实时推送 |
//! | /questions/{seq} | GET | 单个题目 |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/questions", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{seq}", get(handler::get_by_seq))
}
