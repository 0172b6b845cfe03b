use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::auth::{Claims, RefreshClaims};
use crate::models::owner::{LoginResponse, Owner, RefreshToken, RegisterRequest};

pub struct AuthService;

impl AuthService {
    /// Creates the owner account with a fresh trial and signs them in.
    /// Inputs are already validated by the handler; the unique constraints
    /// on email and slug are the last line of defence against races.
    pub async fn register(
        pool: &PgPool,
        body: &RegisterRequest,
        trial_days: i64,
        jwt_secret: &str,
        refresh_secret: &str,
        access_ttl: u64,
        refresh_ttl_days: u64,
    ) -> Result<LoginResponse, ApiError> {
        let password_hash = bcrypt::hash(&body.password, 12)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Password hashing failed: {e}")))?;
        let trial_expires_at = Utc::now() + chrono::Duration::days(trial_days);

        let result = sqlx::query_as::<_, Owner>(
            "INSERT INTO owners (email, password_hash, owner_name, shop_name, shop_slug, phone, trial_expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(body.email.trim().to_lowercase())
        .bind(&password_hash)
        .bind(body.owner_name.trim())
        .bind(body.shop_name.trim())
        .bind(&body.shop_slug)
        .bind(body.phone.as_deref().filter(|s| !s.trim().is_empty()))
        .bind(trial_expires_at)
        .fetch_one(pool)
        .await;

        let owner = match result {
            Ok(owner) => owner,
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("owners_email_key") {
                    return Err(ApiError::Conflict("This email is already registered".into()));
                }
                if msg.contains("owners_shop_slug_key") {
                    return Err(ApiError::Conflict("This shop address is already taken".into()));
                }
                return Err(e.into());
            }
        };

        Self::issue_tokens(pool, owner, jwt_secret, refresh_secret, access_ttl, refresh_ttl_days)
            .await
    }

    pub async fn login(
        pool: &PgPool,
        email: &str,
        password: &str,
        jwt_secret: &str,
        refresh_secret: &str,
        access_ttl: u64,
        refresh_ttl_days: u64,
    ) -> Result<LoginResponse, ApiError> {
        let owner: Owner = sqlx::query_as("SELECT * FROM owners WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotAuthenticated("Invalid email or password".into()))?;

        let valid = bcrypt::verify(password, &owner.password_hash)
            .map_err(|_| ApiError::NotAuthenticated("Invalid email or password".into()))?;
        if !valid {
            return Err(ApiError::NotAuthenticated("Invalid email or password".into()));
        }

        Self::issue_tokens(pool, owner, jwt_secret, refresh_secret, access_ttl, refresh_ttl_days)
            .await
    }

    /// Rotate refresh token: revoke old, issue new pair.
    pub async fn refresh(
        pool: &PgPool,
        refresh_token_str: &str,
        jwt_secret: &str,
        refresh_secret: &str,
        access_ttl: u64,
        refresh_ttl_days: u64,
    ) -> Result<LoginResponse, ApiError> {
        use jsonwebtoken::{decode, DecodingKey, Validation};

        let key = DecodingKey::from_secret(refresh_secret.as_bytes());
        let data = decode::<RefreshClaims>(
            refresh_token_str,
            &key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| ApiError::NotAuthenticated("Invalid refresh token".into()))?;
        let jti: Uuid = data
            .claims
            .jti
            .parse()
            .map_err(|_| ApiError::NotAuthenticated("Invalid refresh token".into()))?;

        let stored: RefreshToken =
            sqlx::query_as("SELECT * FROM refresh_tokens WHERE id = $1 AND revoked = FALSE")
                .bind(jti)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| {
                    ApiError::NotAuthenticated("Refresh token not found or revoked".into())
                })?;

        if stored.expires_at < Utc::now() {
            return Err(ApiError::NotAuthenticated("Refresh token expired".into()));
        }
        if !bcrypt::verify(refresh_token_str, &stored.token_hash).unwrap_or(false) {
            return Err(ApiError::NotAuthenticated("Refresh token invalid".into()));
        }

        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1")
            .bind(jti)
            .execute(pool)
            .await?;

        let owner: Owner = sqlx::query_as("SELECT * FROM owners WHERE id = $1")
            .bind(stored.owner_id)
            .fetch_one(pool)
            .await?;

        Self::issue_tokens(pool, owner, jwt_secret, refresh_secret, access_ttl, refresh_ttl_days)
            .await
    }

    /// Revoke a refresh token (logout). Undecodable tokens are ignored so
    /// logout never fails client-side.
    pub async fn logout(
        pool: &PgPool,
        refresh_token_str: &str,
        refresh_secret: &str,
    ) -> Result<(), ApiError> {
        use jsonwebtoken::{decode, DecodingKey, Validation};

        let key = DecodingKey::from_secret(refresh_secret.as_bytes());
        if let Ok(data) =
            decode::<RefreshClaims>(refresh_token_str, &key, &Validation::new(Algorithm::HS256))
        {
            if let Ok(jti) = data.claims.jti.parse::<Uuid>() {
                sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1")
                    .bind(jti)
                    .execute(pool)
                    .await?;
            }
        }
        Ok(())
    }

    pub async fn get_owner(pool: &PgPool, owner_id: Uuid) -> Result<Owner, ApiError> {
        sqlx::query_as("SELECT * FROM owners WHERE id = $1")
            .bind(owner_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Owner not found".into()))
    }

    /// Simulated checkout: flips the subscription to active. Revoking all
    /// sessions is not needed, the claim set does not carry the status.
    pub async fn activate_subscription(pool: &PgPool, owner_id: Uuid) -> Result<Owner, ApiError> {
        sqlx::query_as(
            "UPDATE owners SET subscription_status = 'active' WHERE id = $1 RETURNING *",
        )
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Owner not found".into()))
    }

    async fn issue_tokens(
        pool: &PgPool,
        owner: Owner,
        jwt_secret: &str,
        refresh_secret: &str,
        access_ttl: u64,
        refresh_ttl_days: u64,
    ) -> Result<LoginResponse, ApiError> {
        let access_token = Self::generate_access_token(&owner, jwt_secret, access_ttl)?;
        let (refresh_token_str, jti) =
            Self::generate_refresh_token(&owner.id, refresh_secret, refresh_ttl_days)?;

        let hash = bcrypt::hash(&refresh_token_str, 8)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Token hashing failed: {e}")))?;
        let expires_at = Utc::now() + chrono::Duration::days(refresh_ttl_days as i64);
        sqlx::query(
            "INSERT INTO refresh_tokens (id, owner_id, token_hash, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(jti)
        .bind(owner.id)
        .bind(hash)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(LoginResponse {
            access_token,
            refresh_token: refresh_token_str,
            owner: owner.into(),
        })
    }

    pub fn generate_access_token(
        owner: &Owner,
        secret: &str,
        ttl_seconds: u64,
    ) -> Result<String, ApiError> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: owner.id.to_string(),
            slug: owner.shop_slug.clone(),
            iat: now,
            exp: now + ttl_seconds as usize,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Token encoding failed: {e}")))
    }

    fn generate_refresh_token(
        owner_id: &Uuid,
        secret: &str,
        ttl_days: u64,
    ) -> Result<(String, Uuid), ApiError> {
        let now = Utc::now().timestamp() as usize;
        let jti = Uuid::new_v4();
        let claims = RefreshClaims {
            sub: owner_id.to_string(),
            jti: jti.to_string(),
            iat: now,
            exp: now + (ttl_days * 86400) as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Token encoding failed: {e}")))?;
        Ok((token, jti))
    }
}
