use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 1 CB Point = 1 Ksh
/// - total_earned: every credit
/// - total_withdrawn: withdrawal debits only
/// - total_spent: every other debit
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub user_id: i64,
    pub balance: i64,
    pub total_earned: i64,
    pub total_withdrawn: i64,
    pub total_spent: i64,
    pub last_withdrawal_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
