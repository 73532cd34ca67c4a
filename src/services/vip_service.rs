use crate::database::DbPool;
use crate::entities::{
    CompletionStatus, NotificationType, task_completion_entity as completions, user_entity as users,
    vip_level_entity as vip_levels,
};
use crate::error::{AppError, AppResult};
use crate::models::{VipLevelResponse, VipStatusResponse, VipUpgradeResponse};
use crate::services::{NotificationService, WalletService};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// Percent applied when a user's tier has no configuration row.
pub const DEFAULT_MULTIPLIER: i32 = 100;

pub fn multiplier_for(level: Option<&vip_levels::Model>) -> i32 {
    level
        .map(|l| l.task_reward_multiplier)
        .unwrap_or(DEFAULT_MULTIPLIER)
}

/// floor(base * multiplier / 100)
pub fn compute_task_reward(base: i64, multiplier: i32) -> i64 {
    (base * i64::from(multiplier)).div_euclid(100)
}

/// Highest tier above `current` whose task and earnings thresholds are
/// both met. Never returns a tier at or below `current`.
pub fn select_upgrade(
    levels: &[vip_levels::Model],
    current: i32,
    approved_tasks: i64,
    total_earned: i64,
) -> Option<&vip_levels::Model> {
    let mut sorted: Vec<&vip_levels::Model> = levels.iter().collect();
    sorted.sort_by_key(|l| l.level);

    let mut chosen = None;
    for level in sorted {
        if level.level > current && level.is_reached_by(approved_tasks, total_earned) {
            chosen = Some(level);
        }
    }
    chosen
}

#[derive(Clone)]
pub struct VipService {
    pool: DbPool,
}

impl VipService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_levels(&self) -> AppResult<Vec<VipLevelResponse>> {
        let rows = vip_levels::Entity::find()
            .order_by_asc(vip_levels::Column::Level)
            .all(&*self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find_level_with<C: ConnectionTrait>(
        conn: &C,
        level: i32,
    ) -> AppResult<Option<vip_levels::Model>> {
        Ok(vip_levels::Entity::find()
            .filter(vip_levels::Column::Level.eq(level))
            .one(conn)
            .await?)
    }

    pub async fn approved_task_count<C: ConnectionTrait>(conn: &C, user_id: i64) -> AppResult<u64> {
        Ok(completions::Entity::find()
            .filter(completions::Column::UserId.eq(user_id))
            .filter(completions::Column::Status.eq(CompletionStatus::Approved))
            .count(conn)
            .await?)
    }

    pub async fn status(&self, user_id: i64) -> AppResult<VipStatusResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let levels = vip_levels::Entity::find()
            .order_by_asc(vip_levels::Column::Level)
            .all(&*self.pool)
            .await?;
        let approved_tasks = Self::approved_task_count(&*self.pool, user_id).await?;
        let total_earned = WalletService::find_wallet_with(&*self.pool, user_id)
            .await?
            .map(|w| w.total_earned)
            .unwrap_or(0);

        let current = levels.iter().find(|l| l.level == user.vip_level).cloned();
        let next = levels.iter().find(|l| l.level > user.vip_level).cloned();
        Ok(VipStatusResponse {
            current: current.map(Into::into),
            next: next.map(Into::into),
            approved_tasks,
            total_earned,
        })
    }

    /// Re-evaluates the user's tier and persists an upgrade. Tiers only go up.
    ///
    /// The user row stays locked while counts are read, so a concurrent
    /// evaluation waits and then starts from the level written here.
    pub async fn check_upgrade(&self, user_id: i64) -> AppResult<VipUpgradeResponse> {
        let txn = self.pool.begin().await?;
        let user = users::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let levels = vip_levels::Entity::find().all(&txn).await?;
        let approved_tasks = Self::approved_task_count(&txn, user_id).await?;
        let total_earned = WalletService::find_wallet_with(&txn, user_id)
            .await?
            .map(|w| w.total_earned)
            .unwrap_or(0);

        let current = user.vip_level;
        let Some(target) =
            select_upgrade(&levels, current, approved_tasks as i64, total_earned).cloned()
        else {
            return Ok(VipUpgradeResponse {
                upgraded: false,
                vip_level: current,
            });
        };

        let mut am = user.into_active_model();
        am.vip_level = Set(target.level);
        am.updated_at = Set(Utc::now());
        am.update(&txn).await?;

        NotificationService::notify_with(
            &txn,
            user_id,
            NotificationType::VipUpgrade,
            "VIP upgrade",
            format!(
                "Congratulations! You are now {} (VIP {}). Task rewards are multiplied by {}%.",
                target.name, target.level, target.task_reward_multiplier
            ),
            Some("/vip"),
        )
        .await?;
        txn.commit().await?;
        log::info!(
            "VIP upgrade: user={user_id}, from={current}, to={}",
            target.level
        );

        Ok(VipUpgradeResponse {
            upgraded: true,
            vip_level: target.level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::IntoPool;
    use crate::entities::{UserRole, notification_entity as notifications, wallet_entity as wallets};
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    fn tier(level: i32, min_tasks: i64, min_earnings: i64, multiplier: i32) -> vip_levels::Model {
        vip_levels::Model {
            id: i64::from(level) + 1,
            level,
            name: format!("Tier {level}"),
            min_tasks,
            min_earnings,
            task_reward_multiplier: multiplier,
            withdrawal_cooldown: 14,
            withdrawal_min_amount: 100,
            badge_image: None,
            benefits: None,
            created_at: Utc::now(),
        }
    }

    fn default_tiers() -> Vec<vip_levels::Model> {
        vec![
            tier(0, 0, 0, 100),
            tier(1, 10, 500, 110),
            tier(2, 50, 2500, 125),
            tier(3, 150, 7500, 150),
            tier(4, 300, 15000, 175),
            tier(5, 500, 25000, 200),
        ]
    }

    #[test]
    fn test_reward_is_floored() {
        assert_eq!(compute_task_reward(20, 100), 20);
        assert_eq!(compute_task_reward(20, 125), 25);
        assert_eq!(compute_task_reward(15, 110), 16); // 16.5
        assert_eq!(compute_task_reward(33, 175), 57); // 57.75
    }

    #[test]
    fn test_missing_tier_uses_default_multiplier() {
        assert_eq!(multiplier_for(None), 100);
        let gold = tier(3, 150, 7500, 150);
        assert_eq!(multiplier_for(Some(&gold)), 150);
    }

    #[test]
    fn test_twelve_tasks_and_600_earned_reach_bronze_only() {
        let tiers = default_tiers();
        let target = select_upgrade(&tiers, 0, 12, 600).unwrap();
        assert_eq!(target.level, 1);
    }

    #[test]
    fn test_both_thresholds_are_required() {
        let tiers = default_tiers();
        assert!(select_upgrade(&tiers, 0, 12, 499).is_none());
        assert!(select_upgrade(&tiers, 0, 9, 600).is_none());
    }

    #[test]
    fn test_upgrade_skips_to_highest_reached_tier() {
        let mut tiers = default_tiers();
        tiers.reverse();
        let target = select_upgrade(&tiers, 0, 160, 8000).unwrap();
        assert_eq!(target.level, 3);
    }

    #[test]
    fn test_never_downgrades() {
        let tiers = default_tiers();
        assert!(select_upgrade(&tiers, 4, 12, 600).is_none());
        assert!(select_upgrade(&tiers, 5, 1000, 100000).is_none());
    }

    fn user(vip_level: i32) -> users::Model {
        users::Model {
            id: 7,
            open_id: "open-7".to_string(),
            name: None,
            email: None,
            phone: None,
            phone_verified: false,
            login_method: None,
            role: UserRole::User,
            vip_level,
            profile_image: None,
            referral_code: None,
            referred_by: None,
            two_factor_enabled: false,
            daily_login_streak: 0,
            last_login_date: None,
            is_active: true,
            is_suspended: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_signed_in: Utc::now(),
        }
    }

    fn wallet(total_earned: i64) -> wallets::Model {
        wallets::Model {
            id: 1,
            user_id: 7,
            balance: total_earned,
            total_earned,
            total_withdrawn: 0,
            total_spent: 0,
            last_withdrawal_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn count(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    #[tokio::test]
    async fn test_stale_counts_keep_the_locked_level() {
        // Another evaluation already moved the user to Silver.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(2)]])
            .append_query_results([default_tiers()])
            .append_query_results([vec![count(12)]])
            .append_query_results([vec![wallet(600)]])
            .into_pool();

        let result = VipService::new(db).check_upgrade(7).await.unwrap();
        assert!(!result.upgraded);
        assert_eq!(result.vip_level, 2);
    }

    #[tokio::test]
    async fn test_upgrade_is_written_with_notification() {
        let notification = notifications::Model {
            id: 1,
            user_id: 7,
            notification_type: NotificationType::VipUpgrade,
            title: "VIP upgrade".to_string(),
            message: String::new(),
            is_read: false,
            action_url: Some("/vip".to_string()),
            created_at: Utc::now(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(0)]])
            .append_query_results([default_tiers()])
            .append_query_results([vec![count(12)]])
            .append_query_results([vec![wallet(600)]])
            .append_query_results([vec![user(1)]])
            .append_query_results([vec![notification]])
            .into_pool();

        let result = VipService::new(db).check_upgrade(7).await.unwrap();
        assert!(result.upgraded);
        assert_eq!(result.vip_level, 1);
    }
}
