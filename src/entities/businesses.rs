use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "businesses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user (role business)
    #[sea_orm(unique)]
    pub user_id: i64,
    pub business_name: String,
    pub business_email: Option<String>,
    pub business_phone: Option<String>,
    pub business_logo: Option<String>,
    pub business_description: Option<String>,
    /// Task funding balance, separate from the owner's personal wallet
    pub wallet_balance: i64,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
