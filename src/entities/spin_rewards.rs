use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "spin_reward_type")]
#[serde(rename_all = "snake_case")]
pub enum SpinRewardType {
    /// Credited to the wallet
    #[sea_orm(string_value = "cb_points")]
    CbPoints,
    #[sea_orm(string_value = "free_spin")]
    FreeSpin,
    #[sea_orm(string_value = "bonus_multiplier")]
    BonusMultiplier,
}

/// Spin wheel catalog entry. `probability` is a relative weight among
/// active rewards.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "spin_rewards")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub reward_type: SpinRewardType,
    pub reward_value: i64,
    pub probability: i32,
    pub display_text: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn credits_wallet(&self) -> bool {
        self.reward_type == SpinRewardType::CbPoints
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
