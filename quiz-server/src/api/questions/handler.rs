//! Question API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::{CreateQuestionRequest, Question, QuestionList};

use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /questions - 获取全部题目
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<QuestionList>> {
    let questions = state.engine.list_questions()?;
    Ok(Json(QuestionList { questions }))
}

/// GET /questions/{seq} - 获取单个题目
pub async fn get_by_seq(
    State(state): State<ServerState>,
    Path(seq): Path<u64>,
) -> AppResult<Json<Question>> {
    let question = state.engine.get_question(seq)?;
    Ok(Json(question))
}

/// POST /questions - 创建题目
///
/// 分配序列号、持久化，然后推送给所有在线会话
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateQuestionRequest>,
) -> AppResult<(StatusCode, Json<Question>)> {
    let question = state.engine.create_question(payload.into_content())?;
    Ok((StatusCode::CREATED, Json(question)))
}
