use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::business_entity;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BusinessResponse {
    pub id: i64,
    pub user_id: i64,
    pub business_name: String,
    pub business_email: Option<String>,
    pub business_phone: Option<String>,
    pub business_logo: Option<String>,
    pub business_description: Option<String>,
    pub wallet_balance: i64,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<business_entity::Model> for BusinessResponse {
    fn from(m: business_entity::Model) -> Self {
        BusinessResponse {
            id: m.id,
            user_id: m.user_id,
            business_name: m.business_name,
            business_email: m.business_email,
            business_phone: m.business_phone,
            business_logo: m.business_logo,
            business_description: m.business_description,
            wallet_balance: m.wallet_balance,
            is_verified: m.is_verified,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateBusinessRequest {
    #[schema(example = "Mama Mboga Ltd")]
    pub business_name: String,
    pub business_email: Option<String>,
    pub business_phone: Option<String>,
    pub business_logo: Option<String>,
    pub business_description: Option<String>,
}

impl CreateBusinessRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.business_name.trim().chars().count() < 2 {
            return Err(AppError::ValidationError(
                "Business name must be at least 2 characters".to_string(),
            ));
        }
        Ok(())
    }
}
