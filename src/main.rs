use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod batch;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod notify;
mod report;
mod scoring;

use auth::rate_limit::RateLimitState;
use config::Config;
use notify::Mailer;
use report::AnalysisConfig;
use scoring::flow::FlowScorer;
use scoring::SentimentScorer;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub analysis: AnalysisConfig,
    pub scorer: Arc<dyn SentimentScorer>,
    pub mailer: Mailer,
    pub rate_limiter: RateLimitState,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diarypulse_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Config::from_env();
    let config = Arc::new(config);

    // Database
    let db = db::create_pool(&config.database_url).await;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let analysis = AnalysisConfig {
        neutral_threshold: config.neutral_threshold,
        ..AnalysisConfig::default()
    };
    let scorer: Arc<dyn SentimentScorer> = Arc::new(FlowScorer::new(&config));
    let mailer = Mailer::new(&config);
    let rate_limiter = RateLimitState::new();

    let state = AppState {
        db,
        config: config.clone(),
        analysis,
        scorer,
        mailer,
        rate_limiter,
    };

    // Report generation triggers scoring calls, so it gets its own limit
    let generate_routes = Router::new()
        .route("/api/reports", post(handlers::reports::create_report))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_reports,
        ));

    let protected_routes = Router::new()
        .route("/api/reports", get(handlers::reports::list_reports))
        .route("/api/reports/latest", get(handlers::reports::latest_report))
        .route("/api/reports/:id", get(handlers::reports::get_report))
        .merge(generate_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    // The batch trigger authenticates via HMAC signature, not JWT
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route(
            "/internal/batch/weekly",
            post(handlers::batch::trigger_weekly_batch),
        );

    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = vec![config
            .frontend_url
            .parse::<axum::http::HeaderValue>()
            .unwrap()];
        // In dev, also allow LAN access (e.g. testing from another device)
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true);

    // Start rate limit cleanup worker (drops stale windows every 5 min)
    auth::rate_limit::spawn_cleanup_worker(state.rate_limiter.clone());

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    // Use into_make_service_with_connect_info to provide client IP for rate limiting
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .unwrap();
}
