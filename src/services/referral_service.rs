use crate::database::DbPool;
use crate::entities::{TransactionType, referral_entity as referrals, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{LeaderboardEntry, MyReferralsResponse, ReferralCodeResponse, ReferralResponse};
use crate::services::setting_service::REFERRAL_BONUS;
use crate::services::{LedgerEntry, LedgerReference, SettingService, WalletService};
use crate::utils::generate_referral_code;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    FromQueryResult, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use std::collections::HashMap;

pub const DEFAULT_REFERRAL_BONUS: i64 = 5;
pub const MILESTONE_SIZE: u64 = 50;
pub const MILESTONE_BONUS: i64 = 100;

const ALREADY_REFERRED: &str = "You have already used a referral code";

/// Milestone blocks earned but not yet paid:
/// floor(total / 50) - floor(paid_rows / 50).
pub fn unpaid_milestones(total: u64, paid_rows: u64) -> u64 {
    (total / MILESTONE_SIZE).saturating_sub(paid_rows / MILESTONE_SIZE)
}

/// Flags for the oldest unflagged referral rows after paying `blocks`
/// milestones. Returns (row count to flag, zero-based positions that carry
/// the bonus amount).
pub fn milestone_flags(blocks: u64) -> (u64, Vec<u64>) {
    let rows = blocks * MILESTONE_SIZE;
    let bonus_positions = (1..=blocks).map(|b| b * MILESTONE_SIZE - 1).collect();
    (rows, bonus_positions)
}

#[derive(Clone)]
pub struct ReferralService {
    pool: DbPool,
}

impl ReferralService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Stable once set.
    pub async fn generate_code(&self, user_id: i64) -> AppResult<ReferralCodeResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if let Some(code) = user.referral_code {
            return Ok(ReferralCodeResponse {
                referral_code: code,
            });
        }

        let code = generate_referral_code(user_id);
        let mut am = user.into_active_model();
        am.referral_code = Set(Some(code.clone()));
        am.updated_at = Set(Utc::now());
        am.update(&*self.pool).await?;
        Ok(ReferralCodeResponse {
            referral_code: code,
        })
    }

    /// Binds the acting user to the owner of `code` and pays the referrer.
    pub async fn redeem(&self, user_id: i64, code: &str) -> AppResult<ReferralResponse> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(AppError::ValidationError("Referral code is required".to_string()));
        }

        let txn = self.pool.begin().await?;
        let user = users::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if user.referred_by.is_some() {
            return Err(AppError::ValidationError(ALREADY_REFERRED.to_string()));
        }
        let existing = referrals::Entity::find()
            .filter(referrals::Column::ReferredId.eq(user_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError(ALREADY_REFERRED.to_string()));
        }

        let referrer = users::Entity::find()
            .filter(users::Column::ReferralCode.eq(code.as_str()))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid referral code".to_string()))?;
        if referrer.id == user.id {
            return Err(AppError::ValidationError(
                "You cannot refer yourself".to_string(),
            ));
        }

        let bonus = SettingService::get_i64_with(&txn, REFERRAL_BONUS, DEFAULT_REFERRAL_BONUS).await?;

        let mut am = user.into_active_model();
        am.referred_by = Set(Some(referrer.id));
        am.updated_at = Set(Utc::now());
        am.update(&txn).await?;

        let referral = referrals::ActiveModel {
            referrer_id: Set(referrer.id),
            referred_id: Set(user_id),
            bonus_amount: Set(bonus),
            bonus_paid: Set(false),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let referral = if bonus > 0 {
            WalletService::credit_with(
                &txn,
                &LedgerEntry::new(
                    referrer.id,
                    bonus,
                    TransactionType::ReferralBonus,
                    "Referral bonus for inviting new user",
                    Some(LedgerReference::new("referral", user_id)),
                ),
            )
            .await?;
            let mut am = referral.into_active_model();
            am.bonus_paid = Set(true);
            am.update(&txn).await?
        } else {
            referral
        };

        Self::pay_milestones(&txn, referrer.id).await?;
        txn.commit().await?;

        log::info!("Referral recorded: referrer={}, referred={user_id}", referrer.id);
        Ok(ReferralResponse::new(referral, None))
    }

    /// Pays every completed, unpaid block of 50 referrals and flags the
    /// rows it paid for.
    pub async fn pay_milestones<C: ConnectionTrait>(conn: &C, referrer_id: i64) -> AppResult<i64> {
        let total = referrals::Entity::find()
            .filter(referrals::Column::ReferrerId.eq(referrer_id))
            .count(conn)
            .await?;
        let paid_rows = referrals::Entity::find()
            .filter(referrals::Column::ReferrerId.eq(referrer_id))
            .filter(referrals::Column::MilestonePaid.eq(true))
            .count(conn)
            .await?;

        let blocks = unpaid_milestones(total, paid_rows);
        if blocks == 0 {
            return Ok(0);
        }
        let amount = blocks as i64 * MILESTONE_BONUS;
        WalletService::credit_with(
            conn,
            &LedgerEntry::new(
                referrer_id,
                amount,
                TransactionType::ReferralBonus,
                format!("Milestone bonus for {total} referrals"),
                Some(LedgerReference::kind_only("milestone")),
            ),
        )
        .await?;

        let (row_count, bonus_positions) = milestone_flags(blocks);
        let unflagged: Vec<i64> = referrals::Entity::find()
            .select_only()
            .column(referrals::Column::Id)
            .filter(referrals::Column::ReferrerId.eq(referrer_id))
            .filter(referrals::Column::MilestonePaid.eq(false))
            .order_by_asc(referrals::Column::CreatedAt)
            .order_by_asc(referrals::Column::Id)
            .limit(row_count)
            .into_tuple()
            .all(conn)
            .await?;

        let bonus_ids: Vec<i64> = bonus_positions
            .iter()
            .filter_map(|&p| unflagged.get(p as usize).copied())
            .collect();

        referrals::Entity::update_many()
            .col_expr(referrals::Column::MilestonePaid, Expr::value(true))
            .filter(referrals::Column::Id.is_in(unflagged))
            .exec(conn)
            .await?;
        if !bonus_ids.is_empty() {
            referrals::Entity::update_many()
                .col_expr(referrals::Column::MilestoneBonus, Expr::value(MILESTONE_BONUS))
                .filter(referrals::Column::Id.is_in(bonus_ids))
                .exec(conn)
                .await?;
        }

        log::info!("Milestone bonus paid: referrer={referrer_id}, blocks={blocks}, amount={amount}");
        Ok(amount)
    }

    pub async fn my_referrals(&self, user_id: i64) -> AppResult<MyReferralsResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let rows = referrals::Entity::find()
            .filter(referrals::Column::ReferrerId.eq(user_id))
            .order_by_desc(referrals::Column::CreatedAt)
            .all(&*self.pool)
            .await?;

        let referred_ids: Vec<i64> = rows.iter().map(|r| r.referred_id).collect();
        let mut referred: HashMap<i64, users::Model> = users::Entity::find()
            .filter(users::Column::Id.is_in(referred_ids))
            .all(&*self.pool)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let referrals: Vec<ReferralResponse> = rows
            .into_iter()
            .map(|r| {
                let referred_user = referred.remove(&r.referred_id);
                ReferralResponse::new(r, referred_user)
            })
            .collect();
        Ok(MyReferralsResponse {
            referral_code: user.referral_code,
            total: referrals.len() as u64,
            referrals,
        })
    }

    /// Referrers ranked by number of referrals.
    pub async fn leaderboard(&self, limit: u64) -> AppResult<Vec<LeaderboardEntry>> {
        #[derive(Debug, FromQueryResult)]
        struct CountRow {
            referrer_id: i64,
            referral_count: i64,
        }
        let rows = referrals::Entity::find()
            .select_only()
            .column(referrals::Column::ReferrerId)
            .column_as(Expr::col(referrals::Column::Id).count(), "referral_count")
            .group_by(referrals::Column::ReferrerId)
            .order_by_desc(Expr::col(referrals::Column::Id).count())
            .limit(limit)
            .into_model::<CountRow>()
            .all(&*self.pool)
            .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.referrer_id).collect();
        let names: HashMap<i64, Option<String>> = users::Entity::find()
            .filter(users::Column::Id.is_in(ids))
            .all(&*self.pool)
            .await?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        Ok(rows
            .into_iter()
            .map(|r| LeaderboardEntry {
                user_id: r.referrer_id,
                name: names.get(&r.referrer_id).cloned().flatten(),
                referral_count: r.referral_count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{IntoPool, into_transaction_log};
    use crate::entities::{
        UserRole, transaction_entity as transactions, wallet_entity as wallets,
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn user(id: i64, code: Option<&str>, referred_by: Option<i64>) -> users::Model {
        users::Model {
            id,
            open_id: format!("open-{id}"),
            name: Some(format!("User {id}")),
            email: None,
            phone: None,
            phone_verified: false,
            login_method: None,
            role: UserRole::User,
            vip_level: 0,
            profile_image: None,
            referral_code: code.map(str::to_string),
            referred_by,
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

    fn referral(referrer_id: i64, referred_id: i64) -> referrals::Model {
        referrals::Model {
            id: 1,
            referrer_id,
            referred_id,
            bonus_amount: 5,
            bonus_paid: true,
            milestone_bonus: 0,
            milestone_paid: false,
            created_at: Utc::now(),
        }
    }

    fn expect_validation(result: AppResult<ReferralResponse>, expected: &str) {
        match result {
            Err(AppError::ValidationError(msg)) => assert_eq!(msg, expected),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unpaid_milestones() {
        assert_eq!(unpaid_milestones(49, 0), 0);
        assert_eq!(unpaid_milestones(50, 0), 1);
        assert_eq!(unpaid_milestones(50, 50), 0);
        assert_eq!(unpaid_milestones(120, 50), 1);
        assert_eq!(unpaid_milestones(150, 0), 3);
    }

    #[test]
    fn test_milestone_flags_mark_block_ends() {
        let (rows, positions) = milestone_flags(2);
        assert_eq!(rows, 100);
        assert_eq!(positions, vec![49, 99]);
        assert_eq!(milestone_flags(0), (0, vec![]));
    }

    #[tokio::test]
    async fn test_self_referral_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(7, Some("CB7ABCDEF"), None)]])
            .append_query_results([Vec::<referrals::Model>::new()])
            .append_query_results([vec![user(7, Some("CB7ABCDEF"), None)]])
            .into_pool();

        let result = ReferralService::new(db).redeem(7, "cb7abcdef").await;
        expect_validation(result, "You cannot refer yourself");
    }

    #[tokio::test]
    async fn test_second_redemption_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(8, None, Some(7))]])
            .into_pool();

        let result = ReferralService::new(db).redeem(8, "CB7ABCDEF").await;
        expect_validation(result, "You have already used a referral code");
    }

    #[tokio::test]
    async fn test_existing_referral_row_blocks_redemption() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(8, None, None)]])
            .append_query_results([vec![referral(7, 8)]])
            .into_pool();

        let result = ReferralService::new(db).redeem(8, "CB7ABCDEF").await;
        expect_validation(result, "You have already used a referral code");
    }

    #[tokio::test]
    async fn test_unknown_code_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(8, None, None)]])
            .append_query_results([Vec::<referrals::Model>::new()])
            .append_query_results([Vec::<users::Model>::new()])
            .into_pool();

        let result = ReferralService::new(db).redeem(8, "CB0NOPE00").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    fn count(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    fn wallet(balance: i64) -> wallets::Model {
        wallets::Model {
            id: 1,
            user_id: 7,
            balance,
            total_earned: balance,
            total_withdrawn: 0,
            total_spent: 0,
            last_withdrawal_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_paid_milestones_are_not_paid_again() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count(50)]])
            .append_query_results([vec![count(50)]])
            .into_pool();

        assert_eq!(ReferralService::pay_milestones(&*db, 7).await.unwrap(), 0);
        // Only the two counts ran: no credit, no flagging
        assert_eq!(into_transaction_log(db).len(), 2);
    }

    #[tokio::test]
    async fn test_milestone_payout_flags_the_oldest_block() {
        let ledger = transactions::Model {
            id: 4,
            user_id: 7,
            transaction_type: TransactionType::ReferralBonus,
            amount: 100,
            balance_before: 0,
            balance_after: 100,
            description: None,
            reference_id: None,
            reference_type: Some("milestone".to_string()),
            created_at: Utc::now(),
        };
        let unflagged: Vec<BTreeMap<&str, Value>> = (101..=150)
            .map(|id| BTreeMap::from([("id", Value::BigInt(Some(id)))]))
            .collect();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count(50)]])
            .append_query_results([vec![count(0)]])
            .append_exec_results([exec_ok()])
            .append_query_results([vec![wallet(0)]])
            .append_query_results([vec![wallet(100)]])
            .append_query_results([vec![ledger]])
            .append_query_results([unflagged])
            .append_exec_results([exec_ok(), exec_ok()])
            .into_pool();

        assert_eq!(ReferralService::pay_milestones(&*db, 7).await.unwrap(), 100);

        let log = into_transaction_log(db);
        let flag_paid = format!("{:?}", log[log.len() - 2]);
        assert!(flag_paid.contains("milestone_paid"));
        assert!(flag_paid.contains("BigInt(Some(101))"));
        assert!(flag_paid.contains("BigInt(Some(150))"));
        // Only the 50th row carries the bonus amount
        let bonus = format!("{:?}", log[log.len() - 1]);
        assert!(bonus.contains("milestone_bonus"));
        assert!(bonus.contains("BigInt(Some(150))"));
        assert!(!bonus.contains("BigInt(Some(101))"));
    }
}
