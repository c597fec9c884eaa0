use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use railtag_ledger::LedgerError;

/// Server lifecycle errors (startup, config, bind).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// Request-level errors, mapped onto HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Ledger(err) => match err {
                LedgerError::Validation(message) => {
                    (StatusCode::BAD_REQUEST, json!({ "error": message }))
                }
                LedgerError::NotFound(message) => {
                    (StatusCode::NOT_FOUND, json!({ "error": message }))
                }
                // The observation was ledgered even though resolution
                // failed; hand the caller the scan id as proof.
                LedgerError::UnknownCode { code, scan_id } => (
                    StatusCode::NOT_FOUND,
                    json!({
                        "error": format!("unrecognized QR code: {code}"),
                        "qrCode": code,
                        "scanId": scan_id,
                    }),
                ),
                LedgerError::Conflict(message) => {
                    (StatusCode::CONFLICT, json!({ "error": message }))
                }
                LedgerError::TransientStore(message) | LedgerError::StoreUnavailable(message) => {
                    (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": message }))
                }
                LedgerError::Internal(message) => {
                    tracing::error!(error = %message, "internal error serving request");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({ "error": "internal error" }),
                    )
                }
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railtag_types::ScanId;

    #[test]
    fn status_mapping() {
        let cases = [
            (ApiError::Ledger(LedgerError::Validation("v".into())), 400),
            (ApiError::Ledger(LedgerError::NotFound("n".into())), 404),
            (
                ApiError::Ledger(LedgerError::UnknownCode {
                    code: "IR-X".into(),
                    scan_id: ScanId::new(),
                }),
                404,
            ),
            (ApiError::Ledger(LedgerError::Conflict("c".into())), 409),
            (ApiError::Ledger(LedgerError::TransientStore("t".into())), 503),
            (ApiError::Ledger(LedgerError::StoreUnavailable("s".into())), 503),
            (ApiError::Ledger(LedgerError::Internal("i".into())), 500),
            (ApiError::BadRequest("b".into()), 400),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status().as_u16(), expected);
        }
    }
}
