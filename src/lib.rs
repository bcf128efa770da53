pub mod data_formats;
pub mod errors;
mod handlers;
pub mod models;
pub mod slug;
pub mod store;

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
pub use data_formats::*;
use handlers::*;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite};
use std::{
    net::{SocketAddr, TcpListener},
    sync::Arc,
};

use store::{cms::CmsStore, files::FileStore, sql::SqlStore, ContentStore};

pub type JsonResponse<T> = (StatusCode, Json<T>);

/// The live backend, picked once at startup. Handlers only ever see this.
pub type Store = Arc<dyn ContentStore>;

pub async fn run_app(app: Router, store: Store, address: SocketAddr) -> Result<()> {
    let app = app.layer(Extension(store));
    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

/// Build the backend named by `CONTENT_BACKEND` (`sql`, `cms` or `files`).
pub async fn init_store() -> Result<Store> {
    let backend = std::env::var("CONTENT_BACKEND").unwrap_or_else(|_| "sql".to_string());
    let store: Store = match backend.as_str() {
        "sql" => Arc::new(init_sql_store().await?),
        "cms" => Arc::new(CmsStore::from_env()?),
        "files" => {
            let root = std::env::var("CONTENT_DIR")
                .context("CONTENT_DIR must be set for the files backend")?;
            Arc::new(FileStore::new(root))
        }
        other => anyhow::bail!("unknown CONTENT_BACKEND: {other}"),
    };
    tracing::info!("content backend: {backend}");
    Ok(store)
}

pub async fn init_sql_store() -> Result<SqlStore> {
    let db_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    if !Sqlite::database_exists(&db_url).await.unwrap_or(false) {
        tracing::info!("creating database {db_url}");
        Sqlite::create_database(&db_url)
            .await
            .context("Failed to create database")?;
    }
    let pool = SqlitePoolOptions::new().connect(&db_url).await?;
    store::sql::MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("migrations completed");
    Ok(SqlStore::new(pool))
}

pub fn get_random_free_port() -> (u16, SocketAddr) {
    let listener = TcpListener::bind("localhost:0").unwrap();
    match listener.local_addr() {
        Ok(addr) => (addr.port(), addr),
        Err(_) => panic!("Could not get a free port"),
    }
}

pub fn make_router() -> Router {
    Router::new()
        .route("/check_health", get(alive))
        .route("/api/categories", get(list_categories).post(create_category))
        .route(
            "/api/categories/:slug",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/api/articles", get(list_articles).post(create_article))
        .route("/api/articles/preview", get(preview_article))
        .route("/api/articles/slug/:slug", get(get_article_by_slug))
        .route(
            "/api/articles/:id",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route("/api/sections", get(list_sections).post(create_section))
        .route(
            "/api/sections/:id",
            put(update_section).delete(delete_section),
        )
        .route("/api/media", get(list_media).post(create_media))
        .route("/api/media/:id", delete(delete_media))
        .route("/api/resources", get(list_resources).post(create_resource))
        .route("/api/resources/:id", delete(delete_resource))
        .route("/api/newsletter/subscribe", post(subscribe))
        .route("/api/subscribers", get(list_subscribers))
        .route(
            "/api/subscribers/:id",
            put(update_subscriber).delete(delete_subscriber),
        )
        .route("/api/contact", post(submit_contact))
        .route("/api/contacts", get(list_contacts))
        .route(
            "/api/contacts/:id",
            put(update_contact).delete(delete_contact),
        )
        .fallback(not_found)
}
