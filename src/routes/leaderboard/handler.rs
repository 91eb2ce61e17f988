use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    AppState,
    routes::user::Profile,
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{CountryVisitRow, UserVisitRow, country_leaderboard, user_leaderboard};

/// 用户排行榜：全量打卡按用户聚合，带上当前显示名
#[axum::debug_handler]
pub async fn user_ranking(State(state): State<AppState>) -> impl IntoResponse {
    let rows = match UserVisitRow::fetch_all(&state.pool).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("读取打卡记录失败: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "获取排行榜失败".to_string()),
            );
        }
    };

    let mut user_ids: Vec<String> = rows.iter().filter_map(|r| r.user_id.clone()).collect();
    user_ids.sort();
    user_ids.dedup();

    let names = match Profile::display_names(&state.pool, &user_ids).await {
        Ok(names) => names,
        Err(e) => {
            tracing::error!("读取显示名失败: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "获取排行榜失败".to_string()),
            );
        }
    };

    (
        StatusCode::OK,
        success_to_api_response(user_leaderboard(&rows, &names)),
    )
}

/// 国家排行榜
#[axum::debug_handler]
pub async fn country_ranking(State(state): State<AppState>) -> impl IntoResponse {
    match CountryVisitRow::fetch_all(&state.pool).await {
        Ok(rows) => (
            StatusCode::OK,
            success_to_api_response(country_leaderboard(&rows)),
        ),
        Err(e) => {
            tracing::error!("读取打卡记录失败: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "获取国家排行榜失败".to_string(),
                ),
            )
        }
    }
}
