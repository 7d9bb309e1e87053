//! Pressroom - content management core for categories, tags and posts

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pressroom::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{SqlxCategoryRepository, SqlxPostRepository, SqlxTagRepository},
    },
    services::{CategoryService, PostService, TagLifecycleManager, TagService, MAX_PAGE_SIZE},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pressroom=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Pressroom...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let db = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    let applied = db::migrations::run_migrations(&db).await?;
    tracing::info!("Database migrations completed ({} applied)", applied);

    // Create repositories
    let category_repo = SqlxCategoryRepository::boxed(db.clone());
    let tag_repo = SqlxTagRepository::boxed(db.clone());
    let post_repo = SqlxPostRepository::boxed(db.clone());

    // Initialize services
    let tag_lifecycle = Arc::new(TagLifecycleManager::new(tag_repo.clone()));
    let category_service = Arc::new(CategoryService::new(category_repo.clone()));
    let tag_service = Arc::new(TagService::new(tag_repo));
    let post_service = Arc::new(PostService::new(post_repo, category_repo, tag_lifecycle));

    if config.auth.tokens.is_empty() {
        tracing::warn!("No API tokens configured; write endpoints will reject every request");
    }

    // Build application state
    let state = AppState {
        db: db.clone(),
        auth: Arc::new(config.auth.clone()),
        default_limit: i64::from(config.pagination.default_limit).clamp(1, MAX_PAGE_SIZE),
        category_service,
        tag_service,
        post_service,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
