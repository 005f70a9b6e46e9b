use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

pub const CLIENT_ID_HEADER: &str = "x-client-id";

const MAX_CLIENT_ID_LEN: usize = 128;

/// Tenant the request acts for, taken from `X-Client-ID`. The header is set
/// by the authentication layer in front of this service.
///
/// ```ignore
/// async fn handler(ClientScope(client_id): ClientScope) -> AppResult<Json<()>> { ... }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientScope(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientScope {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(CLIENT_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing X-Client-ID header".into()))?;

        let client_id = value
            .to_str()
            .ok()
            .map(str::trim)
            .filter(|s| !s.is_empty() && s.len() <= MAX_CLIENT_ID_LEN)
            .ok_or_else(|| AppError::Unauthorized("Invalid X-Client-ID header".into()))?;

        Ok(ClientScope(client_id.to_string()))
    }
}
