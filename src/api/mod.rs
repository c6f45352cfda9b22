use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod attributes;
pub mod auth;
mod error;
mod observability;
mod recipes;
mod system;
mod types;
mod users;
mod validation;

pub use error::{ApiError, ApiJson, ApiPath, ApiQuery};
pub use types::*;

use tokio::sync::RwLock;

use crate::services::{AttributeService, AuthService, ImageService, RecipeService};
use metrics_exporter_prometheus::PrometheusHandle;

/// Multipart framing on top of the image itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn image_service(&self) -> &Arc<ImageService> {
        &self.shared.image_service
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn recipe_service(&self) -> &Arc<dyn RecipeService> {
        &self.shared.recipe_service
    }

    #[must_use]
    pub fn attribute_service(&self) -> &Arc<dyn AttributeService> {
        &self.shared.attribute_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, max_image_bytes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.uploads.max_image_bytes,
        )
    };
    let media_root = state.image_service().media_root().to_path_buf();

    let protected_routes = create_protected_router(state.clone(), max_image_bytes);

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/user/create", post(users::create_user))
        .route("/user/token", post(users::create_token))
        .route("/health", get(system::health))
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .nest_service("/media", tower_http::services::ServeDir::new(media_root))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::track_requests))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>, max_image_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/recipes",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/recipes/{id}",
            get(recipes::get_recipe)
                .put(recipes::replace_recipe)
                .patch(recipes::patch_recipe)
                .delete(recipes::delete_recipe),
        )
        .route(
            "/recipes/{id}/upload-image",
            post(recipes::upload_image).layer(DefaultBodyLimit::max(
                max_image_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route("/tags", get(attributes::tags::list))
        .route(
            "/tags/{id}",
            axum::routing::patch(attributes::tags::rename)
                .put(attributes::tags::rename)
                .delete(attributes::tags::delete),
        )
        .route("/ingredients", get(attributes::ingredients::list))
        .route(
            "/ingredients/{id}",
            axum::routing::patch(attributes::ingredients::rename)
                .put(attributes::ingredients::rename)
                .delete(attributes::ingredients::delete),
        )
        .route("/user/me", get(users::get_me).patch(users::update_me))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
