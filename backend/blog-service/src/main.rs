use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blog_service::middleware::IdentityMiddleware;
use blog_service::repository::{BlogStore, MemoryBlogStore, PgBlogStore};
use blog_service::storage::{ImageStore, LocalImageStore};
use blog_service::{configure, AppState, Config};

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(env = %config.app.env, "Starting blog-service");

    let store: Arc<dyn BlogStore> = if config.database.is_memory() {
        info!("Using in-memory store");
        Arc::new(MemoryBlogStore::new())
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect(&config.database.url)
            .await
            .context("Failed to connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations applied");

        Arc::new(PgBlogStore::new(pool))
    };

    let images: Arc<dyn ImageStore> = Arc::new(LocalImageStore::new(
        &config.media.root,
        config.media.max_upload_bytes,
    ));

    let state = web::Data::new(AppState::new(store.clone(), images, &config));
    let jwt_secret = config.auth.jwt_secret.clone();

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    info!("Starting HTTP server at {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(IdentityMiddleware::new(store.clone(), jwt_secret.as_str()))
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(configure)
    })
    .shutdown_timeout(30)
    .bind(&bind_address)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")?;

    info!("blog-service stopped");
    Ok(())
}
