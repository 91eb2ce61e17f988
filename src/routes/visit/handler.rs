use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    routes::user::{DEFAULT_DISPLAY_NAME, Profile},
    utils::{Claims, error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{CreateVisitRequest, PublicVisit, Visit};

#[axum::debug_handler]
pub async fn list_visits(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match Visit::find_by_user(&state.pool, &claims.sub).await {
        Ok(visits) => (StatusCode::OK, success_to_api_response(visits)),
        Err(e) => {
            tracing::error!("读取打卡列表失败: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "读取打卡列表失败".to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn create_visit(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(req): Json<CreateVisitRequest>,
) -> impl IntoResponse {
    if !req.lat.is_finite()
        || !req.lng.is_finite()
        || req.lat.abs() > 90.0
        || req.lng.abs() > 180.0
    {
        return (
            StatusCode::OK,
            error_to_api_response(error_codes::VALIDATION_ERROR, "经纬度无效".to_string()),
        );
    }

    if req.place_name.trim().is_empty() {
        return (
            StatusCode::OK,
            error_to_api_response(error_codes::VALIDATION_ERROR, "地点名称不能为空".to_string()),
        );
    }

    // 附近已有打卡则拒绝
    match Visit::has_nearby(&state.pool, &claims.sub, req.lat, req.lng).await {
        Ok(true) => {
            return (
                StatusCode::OK,
                error_to_api_response(error_codes::DUPLICATE_VISIT, "附近已有你的打卡".to_string()),
            );
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!("查询附近打卡失败: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "创建打卡失败".to_string()),
            );
        }
    }

    match Visit::create(&state.pool, &claims.sub, req).await {
        Ok(visit) => (StatusCode::OK, success_to_api_response(visit)),
        Err(e) => {
            if e.to_string().contains("unique constraint") {
                (
                    StatusCode::OK,
                    error_to_api_response(
                        error_codes::DUPLICATE_VISIT,
                        "该位置已有打卡".to_string(),
                    ),
                )
            } else {
                tracing::error!("创建打卡失败: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response(error_codes::INTERNAL_ERROR, "创建打卡失败".to_string()),
                )
            }
        }
    }
}

/// 公共地图：最近的打卡带上访客显示名
#[axum::debug_handler]
pub async fn public_visits(State(state): State<AppState>) -> impl IntoResponse {
    let visits = match Visit::recent_public(&state.pool).await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("读取公共打卡失败: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "读取公共打卡失败".to_string()),
            );
        }
    };

    let mut user_ids: Vec<String> = visits.iter().filter_map(|v| v.user_id.clone()).collect();
    user_ids.sort();
    user_ids.dedup();

    // 查名失败只降级为缺省名，不影响接口
    let names = Profile::display_names(&state.pool, &user_ids)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("读取显示名失败: {:?}", e);
            Default::default()
        });

    let feed: Vec<PublicVisit> = visits
        .into_iter()
        .map(|visit| {
            let display_name = visit
                .user_id
                .as_ref()
                .and_then(|id| names.get(id).cloned())
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());
            PublicVisit {
                visit,
                display_name,
            }
        })
        .collect();

    (StatusCode::OK, success_to_api_response(feed))
}

#[axum::debug_handler]
pub async fn delete_visit(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    // 照片文件归存储服务回收，这里只删记录
    match Visit::delete_owned(&state.pool, id, &claims.sub).await {
        Ok(Some(visit)) => (StatusCode::OK, success_to_api_response(visit)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "打卡不存在".to_string()),
        ),
        Err(e) => {
            tracing::error!("删除打卡失败: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "删除打卡失败".to_string()),
            )
        }
    }
}
