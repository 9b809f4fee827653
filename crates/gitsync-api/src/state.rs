use std::sync::Arc;

use gitsync_core::{Endpoint, UpdateCoordinator};

#[derive(Clone)]
pub struct ApiState {
    pub coordinator: UpdateCoordinator,
}

/// State for the route of one provisioned endpoint.
#[derive(Clone)]
pub struct EndpointState {
    pub endpoint: Arc<Endpoint>,
    pub coordinator: UpdateCoordinator,
}
