use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use gitsync_core::Endpoint;
use tower_http::trace::TraceLayer;

use crate::{
    handlers,
    state::{ApiState, EndpointState},
};

pub const HEALTH_PATH: &str = "/health";

/// Build the router for a set of provisioned endpoints.
///
/// Endpoint paths must be unique and must not collide with [`HEALTH_PATH`].
pub fn create_router(state: ApiState, endpoints: Vec<Endpoint>) -> Router {
    let mut router = Router::new()
        // Health check
        .route(HEALTH_PATH, get(handlers::health::health_check));

    // One update route per endpoint
    for endpoint in endpoints {
        let path = endpoint.path().to_string();
        let endpoint_state = EndpointState {
            endpoint: Arc::new(endpoint),
            coordinator: state.coordinator.clone(),
        };
        router = router.route(
            &path,
            post(handlers::update::update_repository).with_state(endpoint_state),
        );
    }

    router
        // Add state
        .with_state(state)
        // Request tracing
        .layer(TraceLayer::new_for_http())
}
