use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::{referral_entity, user_entity};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReferredUser {
    pub id: i64,
    pub name: Option<String>,
    pub vip_level: i32,
    pub created_at: DateTime<Utc>,
}

impl From<user_entity::Model> for ReferredUser {
    fn from(m: user_entity::Model) -> Self {
        ReferredUser {
            id: m.id,
            name: m.name,
            vip_level: m.vip_level,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReferralResponse {
    pub id: i64,
    pub referred_id: i64,
    pub bonus_amount: i64,
    pub bonus_paid: bool,
    pub milestone_bonus: i64,
    pub milestone_paid: bool,
    pub created_at: DateTime<Utc>,
    pub referred_user: Option<ReferredUser>,
}

impl ReferralResponse {
    pub fn new(m: referral_entity::Model, referred_user: Option<user_entity::Model>) -> Self {
        ReferralResponse {
            id: m.id,
            referred_id: m.referred_id,
            bonus_amount: m.bonus_amount,
            bonus_paid: m.bonus_paid,
            milestone_bonus: m.milestone_bonus,
            milestone_paid: m.milestone_paid,
            created_at: m.created_at,
            referred_user: referred_user.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyReferralsResponse {
    pub referral_code: Option<String>,
    pub total: u64,
    pub referrals: Vec<ReferralResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub name: Option<String>,
    pub referral_count: i64,
}
