//! HTTP route definitions (§4.4): wires the handlers up behind the
//! authentication middleware, except the registration route itself, which
//! necessarily runs before a caller has anything to sign with.

use crate::{handlers, middleware, state::AppState};
use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, routing::post, Router};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::Any, cors::CorsLayer, trace::TraceLayer};

pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/keyhandler/getbundle", post(handlers::keyhandler::get_bundle))
        .route("/api/fs/upload", post(handlers::fs::upload))
        .route("/api/fs/download", post(handlers::fs::download))
        .route("/api/fs/list", post(handlers::fs::list))
        .route("/api/fs/share", post(handlers::fs::share))
        .route("/api/fs/revoke", post(handlers::fs::revoke))
        .route("/api/fs/delete", post(handlers::fs::delete))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), middleware::auth_middleware));

    let public = Router::new().route("/api/keyhandler/register", post(handlers::keyhandler::register));

    let mut router = Router::new()
        .merge(public)
        .merge(protected)
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(state.config.max_body_size));

    if state.config.cors_enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}
