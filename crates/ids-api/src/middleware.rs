//! Bearer-token authentication extraction (§6's "signed opaque string with
//! claims `{sub, exp}`").

use axum::{extract::Request, http::header, middleware::Next, response::Response};
use ids_common::auth;
use ids_common::error::IdsError;

/// Authentication context extracted from the `Authorization` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub principal_id: uuid::Uuid,
}

/// Extract and validate the JWT from `Authorization: Bearer <token>`.
pub async fn auth_middleware(mut request: Request, next: Next) -> Result<Response, IdsError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(IdsError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(IdsError::Unauthorized)?;

    let config = ids_common::config::get();
    let claims =
        auth::validate_token(token, &config.auth.jwt_secret).map_err(|_| IdsError::Unauthorized)?;
    let principal_id = claims.principal_id().map_err(|_| IdsError::Unauthorized)?;

    request.extensions_mut().insert(AuthContext { principal_id });

    Ok(next.run(request).await)
}

impl AuthContext {
    pub fn from_request_extensions(extensions: &axum::http::Extensions) -> Result<&Self, IdsError> {
        extensions.get::<AuthContext>().ok_or(IdsError::Unauthorized)
    }
}
