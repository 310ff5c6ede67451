pub mod petitions;
pub mod proxy;
pub mod veo;

use crate::error::AppError;

/// Fallback for a known path hit with an unsupported method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
