pub mod index;
pub mod probe;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::config::MIN_MSS;

// ─── Unified error type ──────────────────────────────────────────

/// Everything a request can fail with before or after the probe runs.
/// Probe failures themselves are not errors here: they render as
/// `iperf3_success 0`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("'target' parameter must be specified")]
    MissingTarget,

    #[error("'{param}' parameter must be a duration")]
    InvalidDuration { param: &'static str },

    #[error("'mss' parameter must be an integer >= {MIN_MSS}")]
    InvalidMss,

    #[error("'reverse' parameter must be a boolean")]
    InvalidReverse,

    #[error("rendering metrics failed: {0}")]
    Internal(#[from] prometheus::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = serde_json::json!({
            "error":  self.to_string(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
