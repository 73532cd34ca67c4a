use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// VIP tier configuration, levels 0-5.
/// - task_reward_multiplier: percent, 100 = 1x, 150 = 1.5x
/// - withdrawal_cooldown: days required between withdrawals
/// - withdrawal_min_amount: Ksh
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "vip_levels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub level: i32,
    pub name: String,
    pub min_tasks: i64,
    pub min_earnings: i64,
    pub task_reward_multiplier: i32,
    pub withdrawal_cooldown: i32,
    pub withdrawal_min_amount: i64,
    pub badge_image: Option<String>,
    /// JSON array of benefit strings
    pub benefits: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn is_reached_by(&self, approved_tasks: i64, total_earned: i64) -> bool {
        approved_tasks >= self.min_tasks && total_earned >= self.min_earnings
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
