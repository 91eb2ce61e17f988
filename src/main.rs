use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post},
};
use beenthere_backend::{
    AppState,
    config::Config,
    geo::{GeoCache, GeocodeService, NominatimClient},
    middleware::{auth_middleware, log_errors},
    routes,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'beenthere_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    // 反向地理编码：进程内缓存 + Nominatim 客户端
    let cache = GeoCache::new(config.reverse_geo_ttl(), config.reverse_geo_precision);
    let provider = NominatimClient::new(&config.geocoder_base_url, config.geocoder_timeout())
        .expect("Failed to build geocoder client");
    let geocoder = Arc::new(GeocodeService::new(cache, provider));

    // 设置应用状态
    let state = AppState {
        pool,
        config: config.clone(),
        geocoder,
    };

    // 公开路由
    let public_routes = Router::new()
        .route("/health", get(routes::health::health))
        .route("/db-test", get(routes::health::db_test))
        .route("/visits/public", get(routes::visit::public_visits))
        .route("/leaderboard", get(routes::leaderboard::user_ranking))
        .route(
            "/leaderboard/countries",
            get(routes::leaderboard::country_ranking),
        );

    // 需要认证的路由
    let protected_routes = Router::new()
        .route(
            "/user/profile",
            get(routes::user::get_profile).post(routes::user::update_profile),
        )
        .route(
            "/visits",
            get(routes::visit::list_visits).post(routes::visit::create_visit),
        )
        .route("/visits/{id}", delete(routes::visit::delete_visit))
        .route("/reverse-geocode", post(routes::geocode::reverse_geocode))
        // 应用认证中间件
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // 跨域白名单
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // 创建基础路由
    let router = Router::new()
        .nest(
            "/api",
            Router::new().merge(public_routes).merge(protected_routes),
        )
        .layer(axum::middleware::from_fn(log_errors))
        .layer(cors);

    // 添加应用状态
    let app = router.with_state(state.clone());

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .await
    .expect("Failed to start server");
}
