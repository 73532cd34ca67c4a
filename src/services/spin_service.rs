use crate::database::DbPool;
use crate::entities::{
    TransactionType, spin_history_entity as history, spin_reward_entity as rewards,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{SpinHistoryResponse, SpinResultResponse, SpinRewardResponse};
use crate::services::setting_service::SPIN_DAILY_LIMIT;
use crate::services::{LedgerEntry, LedgerReference, SettingService, WalletService};
use chrono::Utc;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// Walks the catalog subtracting each weight from `roll` and returns the
/// first reward at which the remainder drops to zero or below. `roll` is
/// expected in `[0, total_weight)`; the first reward is the fallback.
pub fn pick_weighted(catalog: &[rewards::Model], roll: f64) -> Option<&rewards::Model> {
    let first = catalog.first()?;
    let mut remaining = roll;
    for reward in catalog {
        remaining -= f64::from(reward.probability);
        if remaining <= 0.0 {
            return Some(reward);
        }
    }
    Some(first)
}

pub fn total_weight(catalog: &[rewards::Model]) -> i64 {
    catalog.iter().map(|r| i64::from(r.probability)).sum()
}

#[derive(Clone)]
pub struct SpinService {
    pool: DbPool,
}

impl SpinService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn active_rewards(&self) -> AppResult<Vec<rewards::Model>> {
        Ok(rewards::Entity::find()
            .filter(rewards::Column::IsActive.eq(true))
            .order_by_asc(rewards::Column::Id)
            .all(&*self.pool)
            .await?)
    }

    pub async fn list_rewards(&self) -> AppResult<Vec<SpinRewardResponse>> {
        Ok(self
            .active_rewards()
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Counts today's spins on `conn`. Callers hold the user row lock so
    /// concurrent spins see each other's history rows.
    async fn enforce_daily_limit_with<C: ConnectionTrait>(conn: &C, user_id: i64) -> AppResult<()> {
        let limit = SettingService::get_i64_with(conn, SPIN_DAILY_LIMIT, 0).await?;
        if limit <= 0 {
            return Ok(());
        }
        let start_of_day = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .ok_or_else(|| AppError::InternalError("invalid start of day".to_string()))?;
        let spins_today = history::Entity::find()
            .filter(history::Column::UserId.eq(user_id))
            .filter(history::Column::CreatedAt.gte(start_of_day))
            .count(conn)
            .await?;
        if spins_today as i64 >= limit {
            return Err(AppError::ThresholdNotMet(format!(
                "Daily spin limit of {limit} reached"
            )));
        }
        Ok(())
    }

    pub async fn spin(&self, user_id: i64) -> AppResult<SpinResultResponse> {
        let catalog = self.active_rewards().await?;
        if catalog.is_empty() {
            return Err(AppError::ValidationError("No rewards available".to_string()));
        }

        let txn = self.pool.begin().await?;
        users::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Self::enforce_daily_limit_with(&txn, user_id).await?;

        let total = total_weight(&catalog);
        let roll = if total > 0 {
            rand::thread_rng().gen_range(0.0..total as f64)
        } else {
            0.0
        };
        let reward = pick_weighted(&catalog, roll)
            .cloned()
            .ok_or_else(|| AppError::ValidationError("No rewards available".to_string()))?;

        let entry = history::ActiveModel {
            user_id: Set(user_id),
            reward_id: Set(reward.id),
            reward_value: Set(reward.reward_value),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let credited = reward.credits_wallet() && reward.reward_value > 0;
        if credited {
            WalletService::credit_with(
                &txn,
                &LedgerEntry::new(
                    user_id,
                    reward.reward_value,
                    TransactionType::SpinWin,
                    format!("Spin & Win: {}", reward.display_text),
                    Some(LedgerReference::new("spin", entry.id)),
                ),
            )
            .await?;
        }
        txn.commit().await?;

        Ok(SpinResultResponse {
            reward: reward.into(),
            credited,
            history_id: entry.id,
        })
    }

    /// Newest first
    pub async fn history(&self, user_id: i64, limit: u64) -> AppResult<Vec<SpinHistoryResponse>> {
        let rows = history::Entity::find()
            .filter(history::Column::UserId.eq(user_id))
            .order_by_desc(history::Column::CreatedAt)
            .order_by_desc(history::Column::Id)
            .limit(limit)
            .all(&*self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{IntoPool, into_transaction_log};
    use crate::entities::{
        SpinRewardType, UserRole, setting_entity as settings, transaction_entity as transactions,
        wallet_entity as wallets,
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn reward(id: i64, value: i64, weight: i32) -> rewards::Model {
        typed_reward(id, SpinRewardType::CbPoints, value, weight)
    }

    fn typed_reward(id: i64, reward_type: SpinRewardType, value: i64, weight: i32) -> rewards::Model {
        rewards::Model {
            id,
            reward_type,
            reward_value: value,
            probability: weight,
            display_text: format!("{value} CB Points"),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn default_catalog() -> Vec<rewards::Model> {
        vec![
            reward(1, 5, 30),
            reward(2, 10, 25),
            reward(3, 20, 20),
            reward(4, 50, 15),
            reward(5, 100, 7),
        ]
    }

    #[test]
    fn test_pick_boundaries() {
        let catalog = default_catalog();
        assert_eq!(pick_weighted(&catalog, 0.0).unwrap().id, 1);
        assert_eq!(pick_weighted(&catalog, 30.0).unwrap().id, 1);
        assert_eq!(pick_weighted(&catalog, 30.5).unwrap().id, 2);
        assert_eq!(pick_weighted(&catalog, 96.9).unwrap().id, 5);
    }

    #[test]
    fn test_out_of_range_roll_falls_back_to_first() {
        let catalog = default_catalog();
        assert_eq!(pick_weighted(&catalog, 1000.0).unwrap().id, 1);
        assert!(pick_weighted(&[], 0.0).is_none());
    }

    #[test]
    fn test_frequencies_follow_weights() {
        let catalog = default_catalog();
        let total = total_weight(&catalog) as f64;
        let mut rng = rand::thread_rng();
        let mut counts = [0u32; 5];
        let draws = 100_000;
        for _ in 0..draws {
            let roll = rng.gen_range(0.0..total);
            let picked = pick_weighted(&catalog, roll).unwrap();
            counts[(picked.id - 1) as usize] += 1;
        }
        for (i, reward) in catalog.iter().enumerate() {
            let expected = f64::from(reward.probability) / total;
            let observed = f64::from(counts[i]) / f64::from(draws);
            assert!(
                (observed - expected).abs() < 0.01,
                "reward {} drawn {observed:.4}, expected {expected:.4}",
                reward.id
            );
        }
    }

    #[tokio::test]
    async fn test_empty_catalog_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<rewards::Model>::new()])
            .into_pool();

        match SpinService::new(db).spin(1).await {
            Err(AppError::ValidationError(msg)) => assert_eq!(msg, "No rewards available"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    fn user() -> users::Model {
        users::Model {
            id: 1,
            open_id: "open-1".to_string(),
            name: None,
            email: None,
            phone: None,
            phone_verified: false,
            login_method: None,
            role: UserRole::User,
            vip_level: 0,
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

    fn history_row(reward: &rewards::Model) -> history::Model {
        history::Model {
            id: 40,
            user_id: 1,
            reward_id: reward.id,
            reward_value: reward.reward_value,
            created_at: Utc::now(),
        }
    }

    fn wallet(balance: i64) -> wallets::Model {
        wallets::Model {
            id: 1,
            user_id: 1,
            balance,
            total_earned: balance,
            total_withdrawn: 0,
            total_spent: 0,
            last_withdrawal_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Catalog, user lock, no cap configured, history insert.
    fn through_history(reward: &rewards::Model) -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![reward.clone()]])
            .append_query_results([vec![user()]])
            .append_query_results([Vec::<settings::Model>::new()])
            .append_query_results([vec![history_row(reward)]])
    }

    #[tokio::test]
    async fn test_free_spin_does_not_touch_the_wallet() {
        let free_spin = typed_reward(2, SpinRewardType::FreeSpin, 1, 10);
        let db = through_history(&free_spin).into_pool();

        let result = SpinService::new(db.clone()).spin(1).await.unwrap();
        assert!(!result.credited);
        assert_eq!(result.history_id, 40);

        let statements = format!("{:?}", into_transaction_log(db));
        assert!(statements.contains("FOR UPDATE"));
        assert!(!statements.contains("wallets"));
        assert!(!statements.contains("transactions"));
    }

    #[tokio::test]
    async fn test_cb_points_are_credited() {
        let points = reward(1, 20, 10);
        let ledger = transactions::Model {
            id: 3,
            user_id: 1,
            transaction_type: TransactionType::SpinWin,
            amount: 20,
            balance_before: 0,
            balance_after: 20,
            description: None,
            reference_id: Some(40),
            reference_type: Some("spin".to_string()),
            created_at: Utc::now(),
        };
        let db = through_history(&points)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![wallet(0)]])
            .append_query_results([vec![wallet(20)]])
            .append_query_results([vec![ledger]])
            .into_pool();

        let result = SpinService::new(db.clone()).spin(1).await.unwrap();
        assert!(result.credited);

        let statements = format!("{:?}", into_transaction_log(db));
        assert!(statements.contains("spin_win"));
        assert!(statements.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_daily_cap_is_counted_inside_the_lock() {
        let points = reward(1, 20, 10);
        let cap = settings::Model {
            id: 2,
            key: SPIN_DAILY_LIMIT.to_string(),
            value: "1".to_string(),
            description: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![points]])
            .append_query_results([vec![user()]])
            .append_query_results([vec![cap]])
            .append_query_results([vec![BTreeMap::from([("num_items", Value::BigInt(Some(1)))])]])
            .into_pool();

        match SpinService::new(db).spin(1).await {
            Err(AppError::ThresholdNotMet(msg)) => assert_eq!(msg, "Daily spin limit of 1 reached"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
