use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::rate_limit::{check_rate_limit, real_ip};
use crate::models::auth::AuthenticatedOwner;
use crate::models::owner::{
    LoginRequest, LoginResponse, OwnerProfile, RefreshTokenRequest, RegisterRequest,
};
use crate::services::auth::AuthService;
use crate::services::metrics::{LOGINS_COUNTER, REGISTRATIONS_COUNTER};
use crate::AppState;

const RESERVED_SLUGS: &[&str] = &[
    "www", "api", "app", "admin", "login", "signup", "register", "support",
    "billing", "status", "about", "contact", "docs", "demo", "public",
    "booking", "dashboard",
];

/// Stricter than the lookup rule: new slugs are 3-32 characters.
fn is_valid_signup_slug(s: &str) -> bool {
    let len = s.len();
    len >= 3
        && len <= 32
        && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !s.starts_with('-')
        && !s.ends_with('-')
}

pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let ip = real_ip(&headers);
    let mut redis = state.redis.clone();

    // 5 registrations/hour per IP, 20/hour globally
    check_rate_limit(&mut redis, &format!("rate:register:ip:{ip}"), 5, 3600).await?;
    check_rate_limit(&mut redis, "rate:register:global", 20, 3600).await?;

    body.shop_slug = body.shop_slug.to_lowercase();

    if !is_valid_signup_slug(&body.shop_slug) {
        return Err(ApiError::Validation(
            "Shop address must be 3-32 characters (lowercase letters, digits, hyphens), \
             not starting or ending with a hyphen"
                .into(),
        ));
    }
    if RESERVED_SLUGS.contains(&body.shop_slug.as_str()) {
        return Err(ApiError::Validation("This shop address is reserved".into()));
    }
    if !body.email.contains('@') {
        return Err(ApiError::Validation("Invalid email address".into()));
    }
    if body.password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    if body.shop_name.trim().is_empty() {
        return Err(ApiError::Validation("Shop name is required".into()));
    }
    if body.owner_name.trim().is_empty() {
        return Err(ApiError::Validation("Owner name is required".into()));
    }

    let response = AuthService::register(
        &state.db,
        &body,
        state.config.trial_days,
        &state.config.jwt_secret,
        &state.config.jwt_refresh_secret,
        state.config.jwt_expiry_seconds,
        state.config.jwt_refresh_expiry_days,
    )
    .await?;

    REGISTRATIONS_COUNTER.inc();
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    // 5 attempts per 15 min per email
    let rate_key = format!("rate:login:{}", body.email.to_lowercase());
    let mut redis = state.redis.clone();
    check_rate_limit(&mut redis, &rate_key, 5, 900).await?;

    let result = AuthService::login(
        &state.db,
        &body.email,
        &body.password,
        &state.config.jwt_secret,
        &state.config.jwt_refresh_secret,
        state.config.jwt_expiry_seconds,
        state.config.jwt_refresh_expiry_days,
    )
    .await;

    match &result {
        Ok(_) => LOGINS_COUNTER.with_label_values(&["success"]).inc(),
        Err(_) => LOGINS_COUNTER.with_label_values(&["failure"]).inc(),
    }

    result.map(Json)
}

pub async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    AuthService::refresh(
        &state.db,
        &body.refresh_token,
        &state.config.jwt_secret,
        &state.config.jwt_refresh_secret,
        state.config.jwt_expiry_seconds,
        state.config.jwt_refresh_expiry_days,
    )
    .await
    .map(Json)
}

pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<Value>, ApiError> {
    AuthService::logout(&state.db, &body.refresh_token, &state.config.jwt_refresh_secret)
        .await?;
    Ok(Json(json!({ "message": "Logged out" })))
}

pub async fn me(
    State(state): State<AppState>,
    owner: AuthenticatedOwner,
) -> Result<Json<OwnerProfile>, ApiError> {
    let owner = AuthService::get_owner(&state.db, owner.owner_id).await?;
    Ok(Json(owner.into()))
}

pub async fn activate_subscription(
    State(state): State<AppState>,
    owner: AuthenticatedOwner,
) -> Result<Json<OwnerProfile>, ApiError> {
    let owner = AuthService::activate_subscription(&state.db, owner.owner_id).await?;
    Ok(Json(owner.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_slug_is_stricter_than_lookup() {
        assert!(is_valid_signup_slug("barbearia-do-ze"));
        assert!(!is_valid_signup_slug("ab")); // lookup allows 2 chars, signup does not
        assert!(!is_valid_signup_slug(&"x".repeat(33)));
        assert!(is_valid_signup_slug(&"x".repeat(32)));
        assert!(!is_valid_signup_slug("-bad"));
        assert!(!is_valid_signup_slug("Bad"));
    }

    #[test]
    fn test_reserved_slugs_include_routing_names() {
        for slug in ["www", "api", "public", "booking"] {
            assert!(RESERVED_SLUGS.contains(&slug));
        }
    }
}
