mod cache;
mod nominatim;

pub use cache::GeoCache;
pub use nominatim::NominatimClient;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 归一化后的地点描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDescription {
    pub place_name: String,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub raw: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("invalid coordinates: {0}")]
    InvalidInput(String),
    #[error("geocoding provider error: {0}")]
    Provider(String),
}

/// 反向地理编码提供方，生产实现为 NominatimClient，测试时可替换
pub trait ReverseProvider {
    async fn reverse(&self, lat: f64, lng: f64) -> Result<PlaceDescription, GeocodeError>;
}

/// 反向地理编码服务：进程内缓存 + 上游提供方
pub struct GeocodeService<P> {
    cache: GeoCache,
    provider: P,
}

impl<P: ReverseProvider> GeocodeService<P> {
    pub fn new(cache: GeoCache, provider: P) -> Self {
        Self { cache, provider }
    }

    /// 坐标转地点描述。先查缓存，未命中再调上游并写回。
    /// 同一网格的并发未命中允许重复请求上游，后写的覆盖先写的。
    pub async fn resolve(&self, lat: f64, lng: f64) -> Result<PlaceDescription, GeocodeError> {
        if !lat.is_finite() || !lng.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
            return Err(GeocodeError::InvalidInput(format!("({}, {})", lat, lng)));
        }

        if let Some(cached) = self.cache.lookup(lat, lng).await {
            return Ok(cached);
        }

        // 上游用原始坐标，取整只影响缓存键
        let place = self.provider.reverse(lat, lng).await?;
        self.cache.store(lat, lng, place.clone()).await;

        Ok(place)
    }
}
