use axum::{
    Router,
    routing::{get, post},
};
use http::{
    HeaderValue, Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::handlers;
use crate::middleware::require_auth;
use crate::state::AppState;

/// Router の構築
pub fn create_router(state: AppState) -> Router {
    // Bearer トークン必須のルート
    let protected = Router::new()
        .route("/api/users/me", get(handlers::me))
        .route("/api/password/reset", post(handlers::reset_password))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let router = Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/users", post(handlers::register))
        .route("/api/users/login", post(handlers::login))
        .route(
            "/api/password/reset-request",
            post(handlers::request_password_reset),
        )
        .merge(protected)
        .layer(TraceLayer::new_for_http());

    let router = match cors_layer(&state.config) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.with_state(state)
}

/// CORS 許可オリジンが設定されていれば CorsLayer を作る
fn cors_layer(config: &Config) -> Option<CorsLayer> {
    let origin = config.cors_allowed_origin.as_deref()?;

    match origin.parse::<HeaderValue>() {
        Ok(origin) => Some(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
        ),
        Err(e) => {
            tracing::warn!(error = ?e, origin = %origin, "CORS オリジンが不正なため無視");
            None
        }
    }
}
