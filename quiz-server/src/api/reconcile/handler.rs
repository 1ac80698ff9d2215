//! Reconcile API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use shared::{ReconcileQuery, ReconcileResponse};

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// Parse `lastSeq`; absent or empty means 0
fn parse_last_seq(raw: Option<&str>) -> AppResult<i64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(0),
        Some(value) => value
            .parse::<i64>()
            .map_err(|_| AppError::validation("lastSeq must be a non-negative integer")),
    }
}

/// GET /reconcile - 断线重连对账
pub async fn reconcile(
    State(state): State<ServerState>,
    Query(query): Query<ReconcileQuery>,
) -> AppResult<Json<ReconcileResponse>> {
    let client_id = query
        .client_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::validation("clientId is required"))?;
    let last_seq = parse_last_seq(query.last_seq.as_deref())?;

    let questions = state.engine.reconcile(client_id, last_seq)?;
    let current_seq = state.engine.current_seq();

    Ok(Json(ReconcileResponse {
        questions,
        current_seq,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_last_seq() {
        assert_eq!(parse_last_seq(None).unwrap(), 0);
        assert_eq!(parse_last_seq(Some("")).unwrap(), 0);
        assert_eq!(parse_last_seq(Some(" 7 ")).unwrap(), 7);
        // Negative values parse here and are rejected by the resolver
        assert_eq!(parse_last_seq(Some("-1")).unwrap(), -1);
        assert!(parse_last_seq(Some("invalid")).is_err());
        assert!(parse_last_seq(Some("1.5")).is_err());
    }
}
