mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use redis::Client as RedisClient;
use sqlx::PgPool;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use middleware::auth::JwtSecret;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: redis::aio::MultiplexedConnection,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let config = Arc::new(config);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let redis_client = RedisClient::open(config.redis_url.as_str())?;
    let redis_conn = redis_client.get_multiplexed_async_connection().await?;
    info!("Redis connected");

    let state = AppState {
        db: pool.clone(),
        redis: redis_conn,
        config: config.clone(),
    };

    services::metrics::start(pool);

    // CORS: the booking pages are path-addressed under the app base URL, so a
    // single exact origin plus localhost covers every caller.
    let cors_origin = {
        let base = config.app_base_url.clone();
        AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            let o = match origin.to_str() {
                Ok(s) => s,
                Err(_) => return false,
            };
            // Always allow localhost / 127.0.0.1 for local development
            if o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") {
                return true;
            }
            o == base
        })
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(cors_origin);

    let jwt_secret = JwtSecret(config.jwt_secret.clone());

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        // Auth
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh_token))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/me", get(routes::auth::me))
        .route("/subscription/activate", post(routes::auth::activate_subscription))
        // Catalog
        .route("/services", get(routes::services::list_services).post(routes::services::create_service))
        .route("/services/{id}", put(routes::services::update_service).delete(routes::services::delete_service))
        // Working hours
        .route("/working-hours", get(routes::schedule::get_week).put(routes::schedule::replace_week))
        // Appointments
        .route("/appointments", get(routes::appointments::list_appointments))
        .route("/appointments/{id}/status", put(routes::appointments::update_status))
        .route("/dashboard/summary", get(routes::appointments::dashboard_summary))
        // Public booking surface
        .route("/public/{slug}", get(routes::booking::get_shop))
        .route("/public/{slug}/services", get(routes::booking::list_services))
        .route("/public/{slug}/availability", get(routes::booking::availability))
        .route("/public/{slug}/booking", post(routes::booking::start_booking))
        .route("/public/{slug}/booking/{id}", get(routes::booking::get_booking))
        .route("/public/{slug}/booking/{id}/service", post(routes::booking::pick_service))
        .route("/public/{slug}/booking/{id}/date", post(routes::booking::pick_date))
        .route("/public/{slug}/booking/{id}/slot", post(routes::booking::pick_slot))
        .route("/public/{slug}/booking/{id}/continue", post(routes::booking::continue_to_details))
        .route("/public/{slug}/booking/{id}/back", post(routes::booking::back))
        .route("/public/{slug}/booking/{id}/restart", post(routes::booking::restart))
        .route("/public/{slug}/booking/{id}/confirm", post(routes::booking::confirm))
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("trimly API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
