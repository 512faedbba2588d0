use server::config;
use server::db;
use server::routes;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Extension, Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();

    // Connect to Postgres
    tracing::info!("Connecting to database...");
    let pool = db::pool::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run schema migrations
    tracing::info!("Running migrations...");
    db::pool::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    db::settings::seed_defaults(&pool, &config)
        .await
        .expect("Failed to seed app settings");

    // Expire idle view sessions now and then periodically
    tokio::spawn({
        let pool = pool.clone();
        let ttl_hours = config.session_ttl_hours;
        async move {
            let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
            loop {
                ticker.tick().await;
                match db::sessions::purge_expired(&pool, ttl_hours).await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!("Purged {} idle view sessions", n),
                    Err(e) => tracing::warn!("Failed to purge view sessions: {}", e),
                }
            }
        }
    });

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([axum::http::HeaderName::from_static(server::session::SESSION_HEADER)]);

    // Build router
    let app = Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Auth
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/me", get(routes::auth::me))
        // Posts
        .route(
            "/api/posts",
            get(routes::posts::list_posts).post(routes::posts::create_post),
        )
        .route(
            "/api/posts/{post_id}",
            get(routes::posts::get_post)
                .put(routes::posts::update_post)
                .delete(routes::posts::delete_post),
        )
        // Game viewer
        .route(
            "/api/games/{game_id}/view",
            get(routes::games::view_game).post(routes::games::view_game),
        )
        // Admin
        .route(
            "/api/admin/config",
            get(routes::admin::get_config).put(routes::admin::update_config),
        )
        .route("/api/admin/accounts", get(routes::admin::list_accounts))
        .route("/api/admin/accounts/{account_id}", put(routes::admin::update_account))
        .fallback(routes::not_found)
        // Shared state
        .layer(DefaultBodyLimit::max(config.max_content_length))
        .layer(Extension(pool))
        .layer(Extension(config.clone()))
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}
