//! Server Binary - the HTTP API on a single host
//!
//! It wires up:
//! - The configured store (MongoDB, or in memory for development)
//! - The configured media storage (Cloudinary, or the local disk)
//! - The axum router with the `/api/v1` endpoints

use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vidtube::adapters::cloudinary::CloudinaryMedia;
use vidtube::adapters::local::{FsMedia, Ffprobe};
use vidtube::adapters::memory::MemoryStore;
use vidtube::adapters::mongo::MongoStore;
use vidtube::auth::TokenService;
use vidtube::config::{AppConfig, MediaBackend, StoreBackend};
use vidtube::ports::media::MediaStorage;
use vidtube::{router, AppState, Services};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // 1. Media storage
    let media: Arc<dyn MediaStorage> = match &config.media {
        MediaBackend::Cloudinary(cloudinary) => {
            tracing::info!("Storing media on Cloudinary cloud {}", cloudinary.cloud_name);
            match CloudinaryMedia::new(cloudinary.clone()) {
                Ok(media) => Arc::new(media),
                Err(e) => {
                    tracing::error!("Failed to build the Cloudinary client: {}", e);
                    std::process::exit(1);
                }
            }
        }
        MediaBackend::Local => {
            tracing::info!("Storing media under {:?}", config.media_dir());
            Arc::new(FsMedia::new(config.media_dir(), config.public_url.clone(), Ffprobe))
        }
    };

    // 2. Store and application services
    let tokens = TokenService::new(&config.tokens);
    let services = match &config.store {
        StoreBackend::Mongo { uri, database } => {
            let store = match MongoStore::connect(uri, database).await {
                Ok(store) => store,
                Err(e) => {
                    tracing::error!("Failed to connect to MongoDB: {}", e);
                    std::process::exit(1);
                }
            };
            if let Err(e) = store.ensure_indexes().await {
                tracing::error!("Failed to create indexes: {}", e);
                std::process::exit(1);
            }
            tracing::info!("Connected to MongoDB database {}", database);
            Services::new(Arc::new(store), media, tokens)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, data is lost on exit");
            Services::new(Arc::new(MemoryStore::new()), media, tokens)
        }
    };

    if let Err(e) = tokio::fs::create_dir_all(config.temp_dir()).await {
        tracing::error!("Failed to create {:?}: {}", config.temp_dir(), e);
        std::process::exit(1);
    }

    // 3. HTTP layer
    let app = router(AppState::new(services, &config), &config);

    // 4. Start Server
    let listener = match tokio::net::TcpListener::bind(format!("{}:{}", config.addr, config.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}:{}: {}", config.addr, config.port, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening at {}:{}", config.addr, config.port);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
