use axum::{extract::State, http::HeaderMap, response::Response};
use gitsync_core::{Error, HeaderSource, RequestOutcome, WebhookAuthenticator};
use tracing::Instrument;
use uuid::Uuid;

use crate::{response, state::EndpointState};

/// Adapts axum's header map to the authenticator's header lookup.
pub struct RequestHeaders<'a>(pub &'a HeaderMap);

impl HeaderSource for RequestHeaders<'_> {
    fn header_value(&self, name: &str) -> Option<&[u8]> {
        self.0.get(name).map(|value| value.as_bytes())
    }
}

/// Webhook entry point: authenticate, update the repository, respond.
pub async fn update_repository(
    State(state): State<EndpointState>,
    headers: HeaderMap,
) -> Response {
    let span = tracing::info_span!(
        parent: state.endpoint.logger(),
        "update_request",
        request_id = %Uuid::new_v4(),
        instance_name = %state.endpoint.name(),
    );

    let outcome = handle_update(&state, &headers).instrument(span).await;
    response::into_response(&outcome)
}

/// Run one request through resolution, authentication and dispatch.
///
/// Every path ends in an outcome; nothing here is retried.
pub async fn handle_update(state: &EndpointState, headers: &HeaderMap) -> RequestOutcome {
    let repo_name = state.endpoint.repository_name();
    tracing::debug!(repo_name = %repo_name, "received update git repo request");

    // Unknown repositories fail before any authentication runs.
    let repo = match state.coordinator.resolve(repo_name) {
        Ok(repo) => repo,
        Err(e) => return RequestOutcome::from(&e),
    };

    if let Err(failure) = WebhookAuthenticator::authenticate(repo.config(), &RequestHeaders(headers)) {
        return RequestOutcome::from(&Error::Authentication(failure));
    }

    let result = state.coordinator.update(&repo).await;
    if result.is_ok() {
        tracing::info!(repo_name = %repo_name, "dispatched update git repo request");
    }
    RequestOutcome::from(result)
}
