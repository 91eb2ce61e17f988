use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// 显示名兜底值，排行榜和公共地图共用
pub const DEFAULT_DISPLAY_NAME: &str = "Traveler";

/// 用户资料，主键是身份服务的用户ID
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub display_name: Option<String>,
    pub fallback_name: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub display_name: String,
}

impl Profile {
    pub async fn find_by_id(pool: &PgPool, user_id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, name, display_name
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// 按 id 冲突覆盖写入
    pub async fn upsert(
        pool: &PgPool,
        user_id: &str,
        name: &str,
        display_name: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, name, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (id)
            DO UPDATE SET name = EXCLUDED.name, display_name = EXCLUDED.display_name
            RETURNING id, name, display_name
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(display_name)
        .fetch_one(pool)
        .await
    }

    /// 批量取显示名，键为用户ID。没设置显示名的用户不出现在结果里
    pub async fn display_names(
        pool: &PgPool,
        user_ids: &[String],
    ) -> Result<HashMap<String, String>, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (String, Option<String>)>(
            r#"
            SELECT id, display_name
            FROM profiles
            WHERE id = ANY($1)
            "#,
        )
        .bind(user_ids)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, name)| name.map(|n| (id, n)))
            .collect())
    }
}
