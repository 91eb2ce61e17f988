use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::PlaceDescription;

// 缓存条目，带绝对过期时间
#[derive(Debug, Clone)]
struct CacheEntry {
    data: PlaceDescription,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// 反向地理编码结果缓存
/// 坐标按固定精度取整后作为键，同一网格内的坐标共享一个条目。
/// 过期采用惰性判断，没有后台清理，条目数随不同网格数增长。
pub struct GeoCache {
    store: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    precision: u32,
}

impl GeoCache {
    pub fn new(ttl: Duration, precision: u32) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            ttl,
            precision,
        }
    }

    /// 生成网格键，精度3时形如 "41.903,12.496"
    pub fn grid_key(&self, lat: f64, lng: f64) -> String {
        let factor = 10f64.powi(self.precision as i32);
        let lat_key = (lat * factor).round() / factor;
        let lng_key = (lng * factor).round() / factor;
        format!("{},{}", lat_key, lng_key)
    }

    /// 查缓存，过期条目视为未命中
    pub async fn lookup(&self, lat: f64, lng: f64) -> Option<PlaceDescription> {
        let key = self.grid_key(lat, lng);
        let store = self.store.read().await;

        match store.get(&key) {
            Some(entry) if !entry.is_expired() => {
                tracing::debug!("Reverse-geocode cache hit: {}", key);
                Some(entry.data.clone())
            }
            _ => None,
        }
    }

    /// 写入缓存，同键覆盖
    pub async fn store(&self, lat: f64, lng: f64, data: PlaceDescription) {
        let key = self.grid_key(lat, lng);
        let entry = CacheEntry {
            data,
            expires_at: Instant::now() + self.ttl,
        };

        let mut store = self.store.write().await;
        store.insert(key, entry);
    }
}
