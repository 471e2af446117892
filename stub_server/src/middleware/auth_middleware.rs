use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::errors::ErrorKind;
use salon_client::models::User;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::jwt::verify_token;
use crate::state::AppState;

/// The authenticated caller, inserted as a request extension.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Bearer header
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;

    // 2. Signature, expiry and revocation epoch
    let data = verify_token(token, &state.config.jwt_secret).map_err(|e| {
        let msg = match *e.kind() {
            ErrorKind::ExpiredSignature => "Token has expired",
            _ => "Invalid token",
        };
        AppError::Unauthorized(msg.into())
    })?;
    if data.claims.epoch != state.token_epoch() {
        debug!("Rejecting token from revoked epoch {}", data.claims.epoch);
        return Err(AppError::Unauthorized("Token has been revoked".into()));
    }

    // 3. Owner still exists
    let user_id = Uuid::parse_str(&data.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;
    let user = state
        .users
        .get(&user_id)
        .map(|record| record.user.clone())
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
