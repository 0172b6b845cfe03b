use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Owner {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub owner_name: String,
    pub shop_name: String,
    pub shop_slug: String,
    pub phone: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub trial_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owner {
    /// A shop is bookable while its trial is running or its subscription is
    /// active. Expired trials and inactive subscriptions are not.
    pub fn subscription_is_current(&self, now: DateTime<Utc>) -> bool {
        match self.subscription_status {
            SubscriptionStatus::Active => true,
            SubscriptionStatus::Trial => self.trial_expires_at > now,
            SubscriptionStatus::Inactive => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

// Request/Response DTOs

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub owner_name: String,
    pub shop_name: String,
    pub shop_slug: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub owner: OwnerProfile,
}

#[derive(Debug, Serialize)]
pub struct OwnerProfile {
    pub id: Uuid,
    pub email: String,
    pub owner_name: String,
    pub shop_name: String,
    pub shop_slug: String,
    pub phone: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub trial_expires_at: DateTime<Utc>,
}

impl From<Owner> for OwnerProfile {
    fn from(o: Owner) -> Self {
        Self {
            id: o.id,
            email: o.email,
            owner_name: o.owner_name,
            shop_name: o.shop_name,
            shop_slug: o.shop_slug,
            phone: o.phone,
            subscription_status: o.subscription_status,
            trial_expires_at: o.trial_expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// What the public booking page gets to see about a shop.
#[derive(Debug, Serialize)]
pub struct ShopPublicInfo {
    pub shop_name: String,
    pub shop_slug: String,
    pub phone: Option<String>,
}
