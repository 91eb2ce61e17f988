use axum::Json;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// 身份服务签发的令牌声明。本服务只校验，不签发
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 用户ID
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Option<serde_json::Value>,
    pub exp: i64, // 过期时间
}

impl Claims {
    /// 令牌元数据里的全名，注册时由身份服务写入
    pub fn full_name(&self) -> Option<String> {
        self.user_metadata
            .as_ref()
            .and_then(|m| m.get("full_name"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    // audience 归第三方身份服务管，这里不校验
    validation.validate_aud = false;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    pub resp_data: Option<T>,
}

// 所有 handler 统一返回 Json<ApiResponse<T>>
pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: 0,
        msg: "success".into(),
        resp_data: Some(data),
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        resp_data: None,
    })
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const DUPLICATE_VISIT: i32 = 1001;
    pub const AUTH_FAILED: i32 = 1002;
    pub const NOT_FOUND: i32 = 1004;
    pub const PROVIDER_ERROR: i32 = 1006;
    pub const INTERNAL_ERROR: i32 = 5000;
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    use super::*;

    fn test_config(secret: &str) -> Config {
        Config {
            database_url: "postgres://localhost/test".into(),
            jwt_secret: secret.into(),
            server_host: "127.0.0.1".into(),
            server_port: 4000,
            allowed_origins: vec![],
            geocoder_base_url: "https://nominatim.openstreetmap.org".into(),
            geocoder_timeout_secs: 10,
            reverse_geo_ttl_secs: 86400,
            reverse_geo_precision: 3,
        }
    }

    fn token_for(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims_expiring_at(exp: i64) -> Claims {
        Claims {
            sub: "user-1".into(),
            email: Some("alice@example.com".into()),
            user_metadata: Some(json!({"full_name": "Alice Doe"})),
            exp,
        }
    }

    #[test]
    fn verify_accepts_valid_token() {
        let claims = claims_expiring_at(chrono::Utc::now().timestamp() + 3600);
        let token = token_for(&claims, "super-secret");

        let parsed = verify_token(&token, &test_config("super-secret")).unwrap();
        assert_eq!(parsed.sub, "user-1");
        assert_eq!(parsed.full_name().as_deref(), Some("Alice Doe"));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let claims = claims_expiring_at(chrono::Utc::now().timestamp() + 3600);
        let token = token_for(&claims, "other-secret");

        assert!(verify_token(&token, &test_config("super-secret")).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let claims = claims_expiring_at(chrono::Utc::now().timestamp() - 3600);
        let token = token_for(&claims, "super-secret");

        assert!(verify_token(&token, &test_config("super-secret")).is_err());
    }

    #[test]
    fn full_name_absent_when_metadata_missing() {
        let claims = Claims {
            sub: "user-1".into(),
            email: None,
            user_metadata: None,
            exp: 0,
        };
        assert!(claims.full_name().is_none());
    }
}
