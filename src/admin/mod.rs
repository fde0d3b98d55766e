pub mod auth;
pub mod handlers;
pub mod session;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;
use crate::security::limits::upload_body_limit;
use crate::security::rate_limit::login_rate_limit;

pub use auth::{Authenticator, StaticAuthenticator};
pub use session::{AdminSession, SessionRegistry};

pub fn setup_admin_router(state: AppState, max_upload_bytes: usize) -> Router<AppState> {
    let login_routes = Router::new()
        .route("/api/login", post(login))
        .route_layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    let protected = Router::new()
        .route("/api/logout", post(logout))
        .route("/api/update", post(update_content))
        .route(
            "/api/upload/{role}",
            post(upload_asset).layer(upload_body_limit(max_upload_bytes)),
        )
        .route("/api/delete_image", post(delete_image))
        .route("/api/images", get(list_images))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware));

    login_routes.merge(protected)
}
