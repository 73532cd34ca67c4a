use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::{SpinRewardType, spin_history_entity, spin_reward_entity};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpinRewardResponse {
    pub id: i64,
    pub reward_type: SpinRewardType,
    pub reward_value: i64,
    /// Relative weight among active rewards
    pub probability: i32,
    pub display_text: String,
}

impl From<spin_reward_entity::Model> for SpinRewardResponse {
    fn from(m: spin_reward_entity::Model) -> Self {
        SpinRewardResponse {
            id: m.id,
            reward_type: m.reward_type,
            reward_value: m.reward_value,
            probability: m.probability,
            display_text: m.display_text,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SpinResultResponse {
    pub reward: SpinRewardResponse,
    /// True when the reward was paid into the wallet
    pub credited: bool,
    pub history_id: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpinHistoryResponse {
    pub id: i64,
    pub reward_id: i64,
    pub reward_value: i64,
    pub created_at: DateTime<Utc>,
}

impl From<spin_history_entity::Model> for SpinHistoryResponse {
    fn from(m: spin_history_entity::Model) -> Self {
        SpinHistoryResponse {
            id: m.id,
            reward_id: m.reward_id,
            reward_value: m.reward_value,
            created_at: m.created_at,
        }
    }
}
