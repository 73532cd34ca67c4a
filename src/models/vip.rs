use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::vip_level_entity;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VipLevelResponse {
    pub level: i32,
    pub name: String,
    pub min_tasks: i64,
    pub min_earnings: i64,
    /// Percent, 100 = 1x
    pub task_reward_multiplier: i32,
    pub withdrawal_cooldown: i32,
    pub withdrawal_min_amount: i64,
    pub badge_image: Option<String>,
    pub benefits: Vec<String>,
}

impl From<vip_level_entity::Model> for VipLevelResponse {
    fn from(m: vip_level_entity::Model) -> Self {
        // Stored as a JSON array; unreadable content shows as no benefits
        let benefits = m
            .benefits
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
            .unwrap_or_default();
        VipLevelResponse {
            level: m.level,
            name: m.name,
            min_tasks: m.min_tasks,
            min_earnings: m.min_earnings,
            task_reward_multiplier: m.task_reward_multiplier,
            withdrawal_cooldown: m.withdrawal_cooldown,
            withdrawal_min_amount: m.withdrawal_min_amount,
            badge_image: m.badge_image,
            benefits,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VipStatusResponse {
    pub current: Option<VipLevelResponse>,
    pub next: Option<VipLevelResponse>,
    pub approved_tasks: u64,
    pub total_earned: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VipUpgradeResponse {
    pub upgraded: bool,
    pub vip_level: i32,
}
