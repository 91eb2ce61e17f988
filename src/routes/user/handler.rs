use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    utils::{Claims, error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{
    DEFAULT_DISPLAY_NAME, Profile, ProfileResponse, UpdateProfileRequest, UpdateProfileResponse,
};

/// 显示名最大长度，超出部分直接截断
const DISPLAY_NAME_MAX_CHARS: usize = 50;

#[axum::debug_handler]
pub async fn get_profile(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let fallback_name = claims
        .full_name()
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

    match Profile::find_by_id(&state.pool, &claims.sub).await {
        Ok(profile) => (
            StatusCode::OK,
            success_to_api_response(ProfileResponse {
                display_name: profile.and_then(|p| p.display_name),
                fallback_name,
            }),
        ),
        Err(e) => {
            tracing::error!("读取用户资料失败: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "读取用户资料失败".to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn update_profile(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    let safe_name: String = req
        .display_name
        .unwrap_or_default()
        .trim()
        .chars()
        .take(DISPLAY_NAME_MAX_CHARS)
        .collect();

    if safe_name.is_empty() {
        return (
            StatusCode::OK,
            error_to_api_response(error_codes::VALIDATION_ERROR, "显示名不能为空".to_string()),
        );
    }

    // 资料表的 name 列非空，优先用令牌元数据里的全名
    let full_name = claims.full_name().unwrap_or_else(|| safe_name.clone());

    match Profile::upsert(&state.pool, &claims.sub, &full_name, &safe_name).await {
        Ok(_) => (
            StatusCode::OK,
            success_to_api_response(UpdateProfileResponse {
                display_name: safe_name,
            }),
        ),
        Err(e) => {
            tracing::error!("保存用户资料失败: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "保存用户资料失败".to_string()),
            )
        }
    }
}
