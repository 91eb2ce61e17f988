use std::time::Duration;

use serde::Deserialize;

use super::{GeocodeError, PlaceDescription, ReverseProvider};

const USER_AGENT: &str = "beenthere-backend/0.1 (travel check-in game)";

/// 地名里州/省占主导地位的国家
const STATE_PROMINENT: [&str; 3] = ["us", "ca", "au"];

const UNKNOWN_LOCATION: &str = "Unknown location";

/// Nominatim 反向地理编码客户端
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

/// Nominatim 返回的地址明细，只保留用到的字段
#[derive(Debug, Default, Deserialize)]
pub struct NominatimAddress {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub hamlet: Option<String>,
    pub suburb: Option<String>,
    pub neighbourhood: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub province: Option<String>,
    pub county: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NominatimReply {
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: NominatimAddress,
}

impl NominatimAddress {
    /// 城市级地名，从精细到粗糙取第一个非空的
    fn locality(&self) -> Option<&str> {
        [
            &self.city,
            &self.town,
            &self.village,
            &self.hamlet,
            &self.suburb,
            &self.neighbourhood,
        ]
        .into_iter()
        .find_map(|v| v.as_deref().filter(|s| !s.is_empty()))
    }

    /// 州/省级地名
    fn region_level(&self) -> Option<&str> {
        [&self.state, &self.region, &self.province, &self.county]
            .into_iter()
            .find_map(|v| v.as_deref().filter(|s| !s.is_empty()))
    }
}

impl NominatimClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl ReverseProvider for NominatimClient {
    async fn reverse(&self, lat: f64, lng: f64) -> Result<PlaceDescription, GeocodeError> {
        let url = format!("{}/reverse", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("format", "json".to_string()),
                ("zoom", "10".to_string()),
                ("addressdetails", "1".to_string()),
                ("accept-language", "en".to_string()),
            ])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| GeocodeError::Provider(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Provider(format!(
                "provider returned status {}",
                response.status()
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GeocodeError::Provider(format!("invalid response body: {}", e)))?;

        Ok(normalize_reply(raw))
    }
}

/// 把 Nominatim 原始响应归一化为稳定的地点描述，原始payload原样保留
pub fn normalize_reply(raw: serde_json::Value) -> PlaceDescription {
    let reply: NominatimReply = serde_json::from_value(raw.clone()).unwrap_or_default();

    let country_code = reply
        .address
        .country_code
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|cc| cc.to_lowercase());
    let country = reply
        .address
        .country
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let place_name = synthesize_place_name(&reply);

    PlaceDescription {
        place_name,
        country,
        country_code,
        raw,
    }
}

/// 拼出人类可读的地名。us/ca/au 优先带上州名，其余国家只拼城市和国家，
/// 部件缺失时逐级降级，最后落到 display_name 或固定的未知地名。
pub fn synthesize_place_name(reply: &NominatimReply) -> String {
    let addr = &reply.address;
    let cc = addr
        .country_code
        .as_deref()
        .map(|c| c.to_lowercase())
        .unwrap_or_default();

    let locality = addr.locality();
    let region = addr.region_level();
    let country = addr.country.as_deref().filter(|s| !s.is_empty());

    let synthesized = if STATE_PROMINENT.contains(&cc.as_str()) {
        match (locality, region, country) {
            (Some(l), Some(r), Some(c)) => Some(format!("{}, {}, {}", l, r, c)),
            (Some(l), None, Some(c)) => Some(format!("{}, {}", l, c)),
            (None, Some(r), Some(c)) => Some(format!("{}, {}", r, c)),
            (Some(l), _, None) => Some(l.to_string()),
            (None, None, Some(c)) => Some(c.to_string()),
            (None, _, None) => None,
        }
    } else {
        match (locality, region, country) {
            (Some(l), _, Some(c)) => Some(format!("{}, {}", l, c)),
            (Some(l), _, None) => Some(l.to_string()),
            (None, Some(r), Some(c)) => Some(format!("{}, {}", r, c)),
            (None, None, Some(c)) => Some(c.to_string()),
            (None, _, None) => None,
        }
    };

    synthesized
        .or_else(|| {
            reply
                .display_name
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(v: serde_json::Value) -> NominatimReply {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn city_and_country() {
        let r = reply(json!({
            "display_name": "Paris, Ile-de-France, Metropolitan France, France",
            "address": {"city": "Paris", "country": "France", "country_code": "fr"}
        }));
        assert_eq!(synthesize_place_name(&r), "Paris, France");
    }

    #[test]
    fn state_prominent_includes_region() {
        let r = reply(json!({
            "address": {
                "city": "Austin",
                "state": "Texas",
                "country": "United States",
                "country_code": "us"
            }
        }));
        assert_eq!(synthesize_place_name(&r), "Austin, Texas, United States");
    }

    #[test]
    fn state_prominent_without_locality() {
        let r = reply(json!({
            "address": {"state": "Texas", "country": "United States", "country_code": "us"}
        }));
        assert_eq!(synthesize_place_name(&r), "Texas, United States");
    }

    #[test]
    fn state_prominent_without_region() {
        let r = reply(json!({
            "address": {"city": "Seattle", "country": "United States", "country_code": "us"}
        }));
        assert_eq!(synthesize_place_name(&r), "Seattle, United States");
    }

    #[test]
    fn locality_prefers_most_specific() {
        let r = reply(json!({
            "address": {
                "town": "Greve in Chianti",
                "village": "Panzano",
                "country": "Italy",
                "country_code": "it"
            }
        }));
        assert_eq!(synthesize_place_name(&r), "Greve in Chianti, Italy");
    }

    #[test]
    fn region_falls_back_through_preference_list() {
        let r = reply(json!({
            "address": {"county": "Kerry", "country": "Ireland", "country_code": "ie"}
        }));
        assert_eq!(synthesize_place_name(&r), "Kerry, Ireland");
    }

    #[test]
    fn locality_without_country() {
        let r = reply(json!({
            "address": {"city": "Atlantis"}
        }));
        assert_eq!(synthesize_place_name(&r), "Atlantis");
    }

    #[test]
    fn country_alone() {
        let r = reply(json!({
            "address": {"country": "Monaco", "country_code": "mc"}
        }));
        assert_eq!(synthesize_place_name(&r), "Monaco");
    }

    #[test]
    fn empty_address_uses_display_name() {
        let r = reply(json!({
            "display_name": "Middle of the Atlantic Ocean"
        }));
        assert_eq!(synthesize_place_name(&r), "Middle of the Atlantic Ocean");
    }

    #[test]
    fn empty_reply_is_unknown_location() {
        let r = reply(json!({}));
        assert_eq!(synthesize_place_name(&r), "Unknown location");
    }

    #[test]
    fn normalize_lowercases_country_code() {
        let place = normalize_reply(json!({
            "address": {"country": "France", "country_code": "FR"}
        }));
        assert_eq!(place.country_code.as_deref(), Some("fr"));
        assert_eq!(place.country.as_deref(), Some("France"));
        assert_eq!(place.place_name, "France");
    }

    #[test]
    fn normalize_keeps_raw_payload() {
        let raw = json!({
            "display_name": "Rome, Italy",
            "osm_id": 41485,
            "address": {"city": "Rome", "country": "Italy", "country_code": "it"}
        });
        let place = normalize_reply(raw.clone());
        assert_eq!(place.raw, raw);
        assert_eq!(place.place_name, "Rome, Italy");
    }
}
