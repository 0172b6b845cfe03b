use std::collections::HashMap;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use chrono::Utc;

use crate::error::ApiError;
use crate::models::owner::Owner;
use crate::AppState;

/// Validates that a slug only contains lowercase ASCII letters, digits and
/// hyphens, does not start or end with a hyphen, and is between 2 and 63
/// characters.
pub fn is_valid_slug(s: &str) -> bool {
    let len = s.len();
    len >= 2
        && len <= 63
        && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !s.starts_with('-')
        && !s.ends_with('-')
}

/// Resolves the `{slug}` path segment of public routes to the shop owner,
/// rejecting shops whose trial has run out or whose subscription is
/// inactive.
#[derive(Debug, Clone)]
pub struct ShopBySlug(pub Owner);

impl FromRequestParts<AppState> for ShopBySlug {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Path(params): Path<HashMap<String, String>> =
            Path::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Validation("Missing shop identifier".into()))?;

        let slug = params
            .get("slug")
            .map(|s| s.to_lowercase())
            .ok_or_else(|| ApiError::Validation("Missing shop identifier".into()))?;

        if !is_valid_slug(&slug) {
            return Err(ApiError::Validation("Invalid shop identifier".into()));
        }

        let owner: Option<Owner> = sqlx::query_as("SELECT * FROM owners WHERE shop_slug = $1")
            .bind(&slug)
            .fetch_optional(&state.db)
            .await?;

        match owner {
            None => Err(ApiError::NotFound("Shop not found".into())),
            Some(owner) if !owner.subscription_is_current(Utc::now()) => {
                Err(ApiError::SubscriptionExpired)
            }
            Some(owner) => Ok(ShopBySlug(owner)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_rules() {
        assert!(is_valid_slug("barbearia-do-ze"));
        assert!(is_valid_slug("corte42"));
        assert!(is_valid_slug("ab"));
        assert!(!is_valid_slug("a"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug("UpperCase"));
        assert!(!is_valid_slug("with space"));
        assert!(!is_valid_slug("under_score"));
        assert!(!is_valid_slug(&"x".repeat(64)));
        assert!(is_valid_slug(&"x".repeat(63)));
    }
}
