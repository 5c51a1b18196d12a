use axum::{
    Extension, Json,
    extract::{Query, State},
};
use std::sync::Arc;

use super::validation::{validate_autocomplete_query, validate_city_name};
use super::{
    ApiError, ApiResponse, AppState, AutocompleteQuery, AutocompleteResponse, WeatherRequest,
};
use crate::domain::{City, Identity};
use crate::services::WeatherReport;

/// POST /api/weather
///
/// Resolves the city, records the search and returns the forecast together
/// with the caller's recent cities.
pub async fn get_weather(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<WeatherRequest>,
) -> Result<Json<ApiResponse<WeatherReport>>, ApiError> {
    let city = validate_city_name(&payload.city)?;
    let report = state.search_service().weather(&identity, city).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// GET /api/cities/autocomplete?query=
pub async fn autocomplete(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AutocompleteQuery>,
) -> Result<Json<ApiResponse<AutocompleteResponse>>, ApiError> {
    let query = validate_autocomplete_query(&params.query)?;
    let cities = state.search_service().autocomplete(query).await?;
    Ok(Json(ApiResponse::success(AutocompleteResponse { cities })))
}

/// GET /api/cities/recent
pub async fn recent_cities(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<City>>>, ApiError> {
    let cities = state.search_service().recent(&identity).await?;
    Ok(Json(ApiResponse::success(cities)))
}
