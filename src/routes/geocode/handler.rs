use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState,
    geo::GeocodeError,
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

#[derive(Debug, Deserialize)]
pub struct ReverseGeocodeRequest {
    pub lat: f64,
    pub lng: f64,
}

/// 坐标转地名，命中缓存时不请求上游
#[axum::debug_handler]
pub async fn reverse_geocode(
    State(state): State<AppState>,
    Json(req): Json<ReverseGeocodeRequest>,
) -> impl IntoResponse {
    match state.geocoder.resolve(req.lat, req.lng).await {
        Ok(place) => (StatusCode::OK, success_to_api_response(place)),
        Err(GeocodeError::InvalidInput(msg)) => (
            StatusCode::OK,
            error_to_api_response(error_codes::VALIDATION_ERROR, format!("坐标无效: {}", msg)),
        ),
        Err(GeocodeError::Provider(msg)) => {
            tracing::error!("反向地理编码上游失败: {}", msg);
            (
                StatusCode::BAD_GATEWAY,
                error_to_api_response(
                    error_codes::PROVIDER_ERROR,
                    "地理编码服务暂不可用".to_string(),
                ),
            )
        }
    }
}
