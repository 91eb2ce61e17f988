use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// 公共地图最多返回的打卡数
const PUBLIC_FEED_LIMIT: i64 = 500;

/// 判定重复打卡的坐标范围（度），约1公里
const NEARBY_EPSILON: f64 = 0.01;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Visit {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub place_name: String,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateVisitRequest {
    pub lat: f64,
    pub lng: f64,
    pub place_name: String,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub photo_url: Option<String>,
}

/// 公共地图条目：打卡记录加上访客显示名
#[derive(Debug, Serialize)]
pub struct PublicVisit {
    #[serde(flatten)]
    pub visit: Visit,
    pub display_name: String,
}

impl Visit {
    pub async fn find_by_user(pool: &PgPool, user_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Visit>(
            r#"
            SELECT id, user_id, lat, lng, place_name, country, country_code, photo_url, created_at
            FROM visits
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// 同一用户在给定坐标附近是否已有打卡
    pub async fn has_nearby(
        pool: &PgPool,
        user_id: &str,
        lat: f64,
        lng: f64,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM visits
                WHERE user_id = $1
                  AND lat BETWEEN $2 AND $3
                  AND lng BETWEEN $4 AND $5
            )
            "#,
        )
        .bind(user_id)
        .bind(lat - NEARBY_EPSILON)
        .bind(lat + NEARBY_EPSILON)
        .bind(lng - NEARBY_EPSILON)
        .bind(lng + NEARBY_EPSILON)
        .fetch_one(pool)
        .await
    }

    pub async fn create(
        pool: &PgPool,
        user_id: &str,
        req: CreateVisitRequest,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Visit>(
            r#"
            INSERT INTO visits (user_id, lat, lng, place_name, country, country_code, photo_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, lat, lng, place_name, country, country_code, photo_url, created_at
            "#,
        )
        .bind(user_id)
        .bind(req.lat)
        .bind(req.lng)
        .bind(&req.place_name)
        .bind(&req.country)
        .bind(&req.country_code)
        .bind(&req.photo_url)
        .fetch_one(pool)
        .await
    }

    /// 公共地图用的最近打卡
    pub async fn recent_public(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Visit>(
            r#"
            SELECT id, user_id, lat, lng, place_name, country, country_code, photo_url, created_at
            FROM visits
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(PUBLIC_FEED_LIMIT)
        .fetch_all(pool)
        .await
    }

    /// 删除用户自己的打卡，返回被删掉的记录；不存在或不属于该用户时返回 None
    pub async fn delete_owned(
        pool: &PgPool,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Visit>(
            r#"
            DELETE FROM visits
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, lat, lng, place_name, country, country_code, photo_url, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}
