//! Conversation-scoped endpoints

use axum::Json;
use axum::extract::{Path, State};

use super::ApiState;
use crate::api::types::ApiError;
use crate::data::duckdb::{DuckdbService, model_repository};
use crate::data::types::trace::ModelInvocationData;

/// Model-invocation rollup for one conversation.
pub async fn get_model_invocations(
    State(state): State<ApiState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ModelInvocationData>, ApiError> {
    let db = state.db.clone();
    let data = DuckdbService::run_query(move || {
        let conn = db.conn();
        model_repository::get_model_invocations(&conn, &conversation_id)
    })
    .await
    .map_err(ApiError::from_duckdb)?
    .map_err(ApiError::from_duckdb)?;

    Ok(Json(data))
}
