use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::{
    AppState,
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[axum::debug_handler]
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        success_to_api_response(HealthResponse {
            status: "ok".to_string(),
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct DbTestResponse {
    pub status: String,
    pub message: String,
}

/// 数据库连通性检查
#[axum::debug_handler]
pub async fn db_test(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            success_to_api_response(DbTestResponse {
                status: "connected".to_string(),
                message: "Database connection successful".to_string(),
            }),
        ),
        Err(e) => {
            tracing::error!("数据库连通性检查失败: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "数据库连接失败".to_string()),
            )
        }
    }
}
