/// Application state and router builder
///
/// `AppState` is cloned into every handler via Axum's `State` extractor; the
/// store is held as `Arc<dyn Store>` so the same router serves Postgres in
/// production and the in-memory store in tests.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use taskhive_core::auth::{Policy, SessionService};
use taskhive_core::store::Store;

use crate::{config::Config, middleware::auth::require_auth, routes};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Entity persistence
    pub store: Arc<dyn Store>,

    /// Session lifecycle (the sole writer of refresh-token references)
    pub sessions: SessionService,

    /// Central authorization policy
    pub policy: Policy,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let sessions = SessionService::new(
            store.clone(),
            config.auth.jwt_secret.clone(),
            chrono::Duration::minutes(config.auth.access_ttl_minutes),
            chrono::Duration::days(config.auth.refresh_ttl_days),
        );
        let policy = Policy::new(config.auth.super_admin_email.clone());

        Self {
            store,
            sessions,
            policy,
            config: Arc::new(config),
        }
    }

    /// JWT signing secret for token validation in middleware.
    pub fn jwt_secret(&self) -> &str {
        &self.config.auth.jwt_secret
    }
}

/// Builds the complete Axum router
///
/// ```text
/// /
/// ├── /health                          # public
/// └── /api/v1/
///     ├── /users/                      # register/login/refresh public,
///     │                                # the rest behind the auth layer
///     ├── /task-lists/                 # authenticated
///     └── /tasks/                      # authenticated
/// ```
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public: no identity required.
    let public_user_routes = Router::new()
        .route("/register", post(routes::users::register))
        .route("/login", post(routes::users::login))
        .route("/refresh-token", post(routes::users::refresh));

    // Authenticated user-account routes.
    let user_routes = Router::new()
        .route("/", get(routes::users::me))
        .route("/get-all", get(routes::users::get_all))
        .route("/logout", post(routes::users::logout))
        .route("/update-role", post(routes::users::update_role))
        .route("/change-password", post(routes::users::change_password))
        .route("/update-account", patch(routes::users::update_account))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let task_list_routes = Router::new()
        .route("/create", post(routes::task_lists::create))
        .route("/get-all", get(routes::task_lists::get_all))
        .route("/", get(routes::task_lists::mine))
        .route("/update/:id", patch(routes::task_lists::update))
        .route("/:id", get(routes::task_lists::get_by_id))
        .route("/:id", delete(routes::task_lists::remove))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let task_routes = Router::new()
        .route("/create", post(routes::tasks::create))
        .route("/update/:id", patch(routes::tasks::update))
        .route("/:id", get(routes::tasks::get_by_id))
        .route("/:id", delete(routes::tasks::remove))
        .route("/assign/:task_id", post(routes::tasks::assign))
        .route("/unassign/:task_id", post(routes::tasks::unassign))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let v1_routes = Router::new()
        .nest("/users", public_user_routes.merge(user_routes))
        .nest("/task-lists", task_list_routes)
        .nest("/tasks", task_routes);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::COOKIE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
