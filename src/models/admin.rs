use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{FraudSeverity, UserRole, fraud_log_entity, setting_entity};
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStats {
    pub total_users: u64,
    pub total_tasks: u64,
    pub pending_withdrawals: u64,
    pub pending_completions: u64,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AdminUpdateUserRequest {
    pub vip_level: Option<i32>,
    pub is_active: Option<bool>,
    pub is_suspended: Option<bool>,
    pub role: Option<UserRole>,
}

impl AdminUpdateUserRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.vip_level.is_some_and(|l| !(0..=5).contains(&l)) {
            return Err(AppError::ValidationError(
                "VIP level must be between 0 and 5".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SettingResponse {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

impl From<setting_entity::Model> for SettingResponse {
    fn from(m: setting_entity::Model) -> Self {
        SettingResponse {
            key: m.key,
            value: m.value,
            description: m.description,
            updated_by: m.updated_by,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpsertSettingRequest {
    #[schema(example = "spin_daily_limit")]
    pub key: String,
    #[schema(example = "3")]
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FraudLogResponse {
    pub id: i64,
    pub user_id: i64,
    pub fraud_type: String,
    pub severity: FraudSeverity,
    pub description: Option<String>,
    pub ip_address: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub evidence_data: Option<serde_json::Value>,
    pub action_taken: Option<String>,
    pub resolved_by: Option<i64>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<fraud_log_entity::Model> for FraudLogResponse {
    fn from(m: fraud_log_entity::Model) -> Self {
        FraudLogResponse {
            id: m.id,
            user_id: m.user_id,
            fraud_type: m.fraud_type,
            severity: m.severity,
            description: m.description,
            ip_address: m.ip_address,
            evidence_data: m
                .evidence_data
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok()),
            action_taken: m.action_taken,
            resolved_by: m.resolved_by,
            resolved_at: m.resolved_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateFraudLogRequest {
    pub user_id: i64,
    #[schema(example = "multiple_accounts")]
    pub fraud_type: String,
    pub severity: Option<FraudSeverity>,
    pub description: Option<String>,
    pub ip_address: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub evidence_data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResolveFraudLogRequest {
    #[schema(example = "account_suspended")]
    pub action_taken: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct FraudLogQuery {
    #[serde(default)]
    pub unresolved_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_update_user_vip_range() {
        let mut req = AdminUpdateUserRequest {
            vip_level: Some(5),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
        req.vip_level = Some(6);
        assert!(req.validate().is_err());
        req.vip_level = Some(-1);
        assert!(req.validate().is_err());
    }
}
