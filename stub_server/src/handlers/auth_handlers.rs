use axum::{
    extract::{Json, State},
    http::StatusCode,
    Extension,
};
use chrono::Utc;
use salon_client::models::{
    LoginRequest, ProfileUpdate, RefreshRequest, RefreshResponse, RegisterRequest, Role,
    TokenResponse, User,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::jwt::generate_token;
use crate::error::AppError;
use crate::middleware::auth_middleware::CurrentUser;
use crate::state::{AppState, UserRecord};

const REFRESH_WINDOW_SECS: u64 = 24 * 60 * 60;

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest("Email and password are required".into()));
    }
    if state.emails.contains_key(&email) {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = bcrypt::hash(&payload.password, state.config.bcrypt_cost)?;
    let user = User {
        id: Uuid::new_v4(),
        name: payload.name,
        email: email.clone(),
        phone: payload.phone,
        role: Role::Customer,
        created_at: Some(Utc::now()),
    };

    state.emails.insert(email, user.id);
    state.users.insert(
        user.id,
        UserRecord {
            user: user.clone(),
            password_hash,
        },
    );
    info!("Registered {}", user.email);

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid email or password".into());

    let record = state.user_by_email(payload.email.trim()).ok_or_else(invalid)?;
    if !bcrypt::verify(&payload.password, &record.password_hash)? {
        return Err(invalid());
    }

    let access_token = generate_token(
        &record.user.id,
        state.token_epoch(),
        state.config.access_ttl,
        &state.config.jwt_secret,
    )?;
    let refresh_token = Uuid::new_v4().to_string();
    state.refresh_tokens.insert(refresh_token.clone(), record.user.id);
    info!("{} logged in", record.user.email);

    Ok(Json(TokenResponse {
        access_token,
        refresh_token,
        token_type: Some("bearer".into()),
        expires_in: Some(state.config.access_ttl.as_secs()),
        refresh_expires_in: Some(REFRESH_WINDOW_SECS),
    }))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    state.record_refresh();

    let user_id = state
        .refresh_tokens
        .get(&payload.refresh_token)
        .map(|id| *id)
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".into()))?;
    if !state.users.contains_key(&user_id) {
        return Err(AppError::Unauthorized("User not found".into()));
    }

    let access_token = generate_token(
        &user_id,
        state.token_epoch(),
        state.config.access_ttl,
        &state.config.jwt_secret,
    )?;
    debug!("Issued refreshed access token for {user_id}");

    Ok(Json(RefreshResponse {
        access_token,
        expires_in: Some(state.config.access_ttl.as_secs()),
    }))
}

pub async fn profile(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    let mut record = state
        .users
        .get_mut(&user.id)
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if let Some(name) = payload.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty".into()));
        }
        record.user.name = name.to_string();
    }
    if let Some(phone) = payload.phone {
        record.user.phone = Some(phone).filter(|p| !p.trim().is_empty());
    }

    Ok(Json(record.user.clone()))
}
