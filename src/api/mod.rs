// src/api/mod.rs
pub mod health;
pub mod notification;
pub mod requests;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app_state::AppState;
use crate::middleware::auth::jwt_middleware;

/// Assembles the full application router. The websocket endpoint stays
/// public: its authenticate handshake happens at the application level, as
/// the frontend's notification client expects.
pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .merge(health::health_routes())
        .merge(notification::notification_routes());

    let private_routes = requests::request_routes().route_layer(from_fn(jwt_middleware));

    Router::new()
        .merge(public_routes)
        .merge(private_routes)
        .merge(
            SwaggerUi::new("/swagger")
                .url("/api-docs/openapi.json", requests::RequestDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
