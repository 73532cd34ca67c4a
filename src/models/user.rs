use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{VipLevelResponse, WalletResponse};
use crate::entities::{UserRole, user_entity};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub phone_verified: bool,
    pub role: UserRole,
    pub vip_level: i32,
    pub profile_image: Option<String>,
    pub referral_code: Option<String>,
    pub referred_by: Option<i64>,
    pub daily_login_streak: i32,
    pub is_active: bool,
    pub is_suspended: bool,
    pub created_at: DateTime<Utc>,
    pub last_signed_in: DateTime<Utc>,
}

impl From<user_entity::Model> for UserResponse {
    fn from(m: user_entity::Model) -> Self {
        UserResponse {
            id: m.id,
            open_id: m.open_id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            phone_verified: m.phone_verified,
            role: m.role,
            vip_level: m.vip_level,
            profile_image: m.profile_image,
            referral_code: m.referral_code,
            referred_by: m.referred_by,
            daily_login_streak: m.daily_login_streak,
            is_active: m.is_active,
            is_suspended: m.is_suspended,
            created_at: m.created_at,
            last_signed_in: m.last_signed_in,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[schema(example = "Jane Wanjiru")]
    pub name: Option<String>,
    #[schema(example = "0712345678")]
    pub phone: Option<String>,
    pub profile_image: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name
            && name.trim().chars().count() < 2
        {
            return Err(AppError::ValidationError(
                "Name must be at least 2 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub wallet: WalletResponse,
    pub vip: Option<VipLevelResponse>,
    pub referral_count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub balance: i64,
    pub total_earned: i64,
    pub approved_tasks: u64,
    pub referral_count: u64,
    pub vip_level: i32,
    pub daily_login_streak: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApplyReferralCodeRequest {
    #[schema(example = "CB12AB34CD")]
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReferralCodeResponse {
    pub referral_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_profile_name_length() {
        let short = UpdateProfileRequest {
            name: Some(" J ".into()),
            phone: None,
            profile_image: None,
        };
        assert!(short.validate().is_err());

        let ok = UpdateProfileRequest {
            name: Some("Jo".into()),
            phone: None,
            profile_image: None,
        };
        assert!(ok.validate().is_ok());
    }
}
