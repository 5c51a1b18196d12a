use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, StatsResponse};
use crate::domain::Identity;
use crate::services::UserHistory;

/// GET /api/history
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<UserHistory>>, ApiError> {
    let history = state.search_service().get_history(&identity).await?;
    Ok(Json(ApiResponse::success(history)))
}

/// GET /api/history/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<StatsResponse>>, ApiError> {
    let user_id = identity
        .user_id()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
    let stats = state.search_service().get_stats(user_id).await?;
    Ok(Json(ApiResponse::success(StatsResponse { stats })))
}
