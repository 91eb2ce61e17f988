use std::sync::Arc;

use config::Config;
use geo::{GeocodeService, NominatimClient};
use sqlx::PgPool;

pub mod config;
pub mod error;
pub mod geo;
pub mod middleware;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub geocoder: Arc<GeocodeService<NominatimClient>>,
}
