use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use wishwall_core::error::CoreError;
use wishwall_core::gateway::GatewayError;
use wishwall_veo::provider::ProviderError;
use wishwall_veo::proxy::ProxyError;

/// Application-level error type for HTTP handlers.
///
/// Wraps the library error types and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses
/// of the form `{ "error": <message>, "code": <CODE> }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `wishwall_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A petition store failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A video provider failure, including a missing credential.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A media proxy failure.
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The route exists but not for this HTTP method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Store errors ---
            AppError::Gateway(err) => classify_gateway_error(err),

            // --- Video provider errors ---
            AppError::Provider(err) => classify_provider_error(err),

            // --- Media proxy errors ---
            AppError::Proxy(err) => match err {
                ProxyError::MissingUri => {
                    (StatusCode::BAD_REQUEST, "MISSING_URI", err.to_string())
                }
                ProxyError::InvalidUri(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_URI", err.to_string())
                }
                ProxyError::HostNotAllowed(_) => {
                    (StatusCode::BAD_REQUEST, "HOST_NOT_ALLOWED", err.to_string())
                }
                ProxyError::UpstreamUnavailable(msg) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "UPSTREAM_UNAVAILABLE",
                    msg.clone(),
                ),
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                "Method not allowed".to_string(),
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a store error into an HTTP status, error code, and message.
///
/// Every store failure is a 500; the code tells the caller which one.
/// Duplicate ids and unknown petitions keep their message, everything
/// else is sanitized.
fn classify_gateway_error(err: &GatewayError) -> (StatusCode, &'static str, String) {
    let message = match err {
        GatewayError::DuplicateId(_) | GatewayError::UnknownPetition(_) => err.to_string(),
        GatewayError::StoreUnavailable(_) => "Petition store unavailable".to_string(),
        GatewayError::QueryError(_) => "Failed to read petitions".to_string(),
        GatewayError::WriteError(_) => "Failed to write to petition store".to_string(),
    };
    tracing::error!(error = %err, code = err.code(), "Petition store error");
    (StatusCode::INTERNAL_SERVER_ERROR, err.code(), message)
}

/// Classify a provider error into an HTTP status, error code, and message.
///
/// - Invalid requests map to 400.
/// - A missing credential maps to 500 `CONFIGURATION_ERROR`.
/// - Provider-reported failures map to 500 with the provider's reason.
/// - Transport failures map to 500 with a sanitized message.
fn classify_provider_error(err: &ProviderError) -> (StatusCode, &'static str, String) {
    match err {
        ProviderError::InvalidRequest(msg) => {
            (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
        }
        ProviderError::MissingCredential => {
            tracing::error!("Video request rejected: provider credential not configured");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                err.to_string(),
            )
        }
        ProviderError::Api { status, message } => {
            tracing::error!(upstream_status = status, error = %message, "Video provider error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PROVIDER_ERROR",
                message.clone(),
            )
        }
        ProviderError::Malformed(msg) => {
            tracing::error!(error = %msg, "Malformed video provider response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PROVIDER_ERROR",
                "Malformed response from video provider".to_string(),
            )
        }
        ProviderError::Request(e) => {
            tracing::error!(error = %e, "Video provider unreachable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PROVIDER_UNAVAILABLE",
                "Video provider unavailable".to_string(),
            )
        }
    }
}
