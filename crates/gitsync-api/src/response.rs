use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use gitsync_core::{Error, RequestOutcome};
use serde::Serialize;

/// Body sent when the real body cannot be serialized.
const FALLBACK_BODY: &[u8] = br#"{"status_code":500}"#;

/// Encode an outcome into a status code and JSON body.
///
/// An outcome carrying an invalid status code is answered with 500.
pub fn encode(outcome: &RequestOutcome) -> (StatusCode, Vec<u8>) {
    match StatusCode::from_u16(outcome.status_code) {
        Ok(status) => encode_body(status, outcome),
        Err(_) => encode_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            &RequestOutcome::internal_error(),
        ),
    }
}

/// Serialize `body` as JSON, falling back to a fixed 500 response on failure.
pub fn encode_body<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> (StatusCode, Vec<u8>) {
    match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            let error = Error::from(e);
            tracing::error!(error = %error, "failed encoding response");
            (StatusCode::INTERNAL_SERVER_ERROR, FALLBACK_BODY.to_vec())
        }
    }
}

pub fn into_response(outcome: &RequestOutcome) -> Response {
    let (status, body) = encode(outcome);
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serializer;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cannot serialize"))
        }
    }

    #[test]
    fn test_encode_ok() {
        let (status, body) = encode(&RequestOutcome::ok());
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"status_code":200}"#.to_vec());
    }

    #[test]
    fn test_encode_unauthorized() {
        let (status, body) = encode(&RequestOutcome::unauthorized());
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status_code"], 401);
    }

    #[test]
    fn test_default_outcome_is_not_ok() {
        let (status, _) = encode(&RequestOutcome::default());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_status_code_falls_back() {
        let outcome = RequestOutcome {
            status_code: 42,
            message: None,
        };
        let (status, body) = encode(&outcome);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status_code"], 500);
    }

    #[test]
    fn test_serialization_failure_still_answers() {
        let (status, body) = encode_body(StatusCode::OK, &Unserializable);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, FALLBACK_BODY.to_vec());
    }
}
