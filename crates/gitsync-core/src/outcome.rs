use serde::{Deserialize, Serialize};

use crate::Error;

pub const STATUS_OK: u16 = 200;
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Result of handling one update request, prior to HTTP encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOutcome {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RequestOutcome {
    pub fn ok() -> Self {
        Self {
            status_code: STATUS_OK,
            message: None,
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            status_code: STATUS_UNAUTHORIZED,
            message: Some("unauthorized".to_string()),
        }
    }

    pub fn internal_error() -> Self {
        Self {
            status_code: STATUS_INTERNAL_ERROR,
            message: Some("internal error".to_string()),
        }
    }
}

impl Default for RequestOutcome {
    fn default() -> Self {
        Self::internal_error()
    }
}

// Error details stay in the logs; the caller only sees the status class.
impl From<&Error> for RequestOutcome {
    fn from(error: &Error) -> Self {
        match error.status_code() {
            STATUS_UNAUTHORIZED => Self::unauthorized(),
            _ => Self::internal_error(),
        }
    }
}

impl From<crate::Result<()>> for RequestOutcome {
    fn from(result: crate::Result<()>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::from(&e),
        }
    }
}
