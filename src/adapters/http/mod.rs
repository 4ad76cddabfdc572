//! HTTP inbound adapter.
//!
//! Exposes the services under `/api/v1` as JSON endpoints, wrapping every
//! answer in the [`response::ApiResponse`] envelope. When media is kept on
//! local disk the stored files are served under `/media`.

mod comments;
mod dashboard;
pub mod extract;
mod health;
mod likes;
mod playlists;
pub mod response;
mod subscriptions;
mod tweets;
pub mod upload;
mod users;
mod videos;

use crate::application::Services;
use crate::config::{AppConfig, MediaBackend};
use crate::domain::pagination::PageRequest;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    /// Where multipart files are staged before they reach media storage
    pub temp_dir: PathBuf,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(services: Services, config: &AppConfig) -> Self {
        Self {
            services,
            temp_dir: config.temp_dir(),
            secure_cookies: config.secure_cookies,
        }
    }
}

/// `?page=&limit=` on listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    page: Option<String>,
    limit: Option<String>,
}

impl PageParams {
    pub fn request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.limit.as_deref())
    }
}

fn cors(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
        Err(_) => {
            tracing::warn!("ignoring unusable CORS_ORIGIN {:?}, allowing any origin", origin);
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let api = Router::new()
        .route("/healthcheck", get(health::healthcheck))
        .nest("/users", users::routes())
        .nest("/videos", videos::routes())
        .nest("/comments", comments::routes())
        .nest("/tweets", tweets::routes())
        .nest("/likes", likes::routes())
        .nest("/playlist", playlists::routes())
        .nest("/subscriptions", subscriptions::routes())
        .nest("/dashboard", dashboard::routes());

    let mut app = Router::new().nest("/api/v1", api);
    if config.media == MediaBackend::Local {
        app = app.nest_service("/media", ServeDir::new(config.media_dir()));
    }

    app.layer(DefaultBodyLimit::max(config.json_limit))
        .layer(cors(&config.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
