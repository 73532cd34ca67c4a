use crate::database::DbPool;
use crate::entities::{
    NotificationType, TransactionType, WithdrawalStatus, user_entity as users, withdrawal_entity as withdrawals,
};
use crate::error::{AppError, AppResult};
use crate::external::MpesaService;
use crate::models::{WithdrawRequest, WithdrawalResponse};
use crate::services::{LedgerEntry, LedgerReference, NotificationService, VipService, WalletService};
use crate::utils::kenyan_payout_phone;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// Withdrawal limits of a VIP tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalPolicy {
    pub min_amount: i64,
    pub cooldown_days: i64,
}

impl Default for WithdrawalPolicy {
    /// Starter tier limits, used when a tier row is missing
    fn default() -> Self {
        Self {
            min_amount: 100,
            cooldown_days: 14,
        }
    }
}

/// Checked in order: balance, tier minimum, cooldown since the last payout.
pub fn check_withdrawal(
    balance: i64,
    amount: i64,
    policy: WithdrawalPolicy,
    last_withdrawal: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if balance < amount {
        return Err(AppError::InsufficientBalance);
    }
    if amount < policy.min_amount {
        return Err(AppError::ThresholdNotMet(format!(
            "Minimum withdrawal amount is {} Ksh",
            policy.min_amount
        )));
    }
    if let Some(last) = last_withdrawal {
        let elapsed = (now - last).num_days();
        if elapsed < policy.cooldown_days {
            return Err(AppError::ThresholdNotMet(format!(
                "Withdrawal cooldown: {} days remaining",
                policy.cooldown_days - elapsed
            )));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct WithdrawalService {
    pool: DbPool,
    wallet_service: WalletService,
    mpesa: MpesaService,
}

impl WithdrawalService {
    pub fn new(pool: DbPool, wallet_service: WalletService, mpesa: MpesaService) -> Self {
        Self {
            pool,
            wallet_service,
            mpesa,
        }
    }

    /// Records a pending request. The balance is only touched on approval.
    pub async fn request_withdrawal(
        &self,
        user_id: i64,
        req: WithdrawRequest,
    ) -> AppResult<WithdrawalResponse> {
        req.validate()?;
        let phone = kenyan_payout_phone(&req.phone_number)?;

        let user = users::Entity::find_by_id(user_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let wallet = self.wallet_service.get_or_create_wallet(user_id).await?;
        let policy = VipService::find_level_with(&*self.pool, user.vip_level)
            .await?
            .map(|tier| WithdrawalPolicy {
                min_amount: tier.withdrawal_min_amount,
                cooldown_days: i64::from(tier.withdrawal_cooldown),
            })
            .unwrap_or_default();

        check_withdrawal(
            wallet.balance,
            req.amount,
            policy,
            wallet.last_withdrawal_date,
            Utc::now(),
        )?;

        let created = withdrawals::ActiveModel {
            user_id: Set(user_id),
            amount: Set(req.amount),
            phone_number: Set(phone),
            status: Set(WithdrawalStatus::Pending),
            ..Default::default()
        }
        .insert(&*self.pool)
        .await?;

        log::info!(
            "Withdrawal {} requested: user={user_id}, amount={}",
            created.id,
            req.amount
        );
        Ok(created.into())
    }

    pub async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<WithdrawalResponse>> {
        let rows = withdrawals::Entity::find()
            .filter(withdrawals::Column::UserId.eq(user_id))
            .order_by_desc(withdrawals::Column::CreatedAt)
            .all(&*self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn list_pending(&self) -> AppResult<Vec<WithdrawalResponse>> {
        let rows = withdrawals::Entity::find()
            .filter(withdrawals::Column::Status.eq(WithdrawalStatus::Pending))
            .order_by_asc(withdrawals::Column::CreatedAt)
            .all(&*self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn lock_pending<C: ConnectionTrait>(
        conn: &C,
        withdrawal_id: i64,
    ) -> AppResult<withdrawals::Model> {
        let withdrawal = withdrawals::Entity::find_by_id(withdrawal_id)
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Withdrawal not found".to_string()))?;
        if withdrawal.status != WithdrawalStatus::Pending {
            return Err(AppError::ValidationError(
                "Withdrawal is not pending".to_string(),
            ));
        }
        Ok(withdrawal)
    }

    /// pending -> processing -> debit -> payout -> completed, all in one
    /// transaction. A payout failure rolls everything back and leaves the
    /// withdrawal `failed`.
    pub async fn approve_withdrawal(
        &self,
        admin_id: i64,
        withdrawal_id: i64,
    ) -> AppResult<WithdrawalResponse> {
        let txn = self.pool.begin().await?;
        let withdrawal = Self::lock_pending(&txn, withdrawal_id).await?;

        let now = Utc::now();
        let mut am = withdrawal.into_active_model();
        am.status = Set(WithdrawalStatus::Processing);
        am.approved_by = Set(Some(admin_id));
        am.approved_at = Set(Some(now));
        am.updated_at = Set(now);
        let processing = am.update(&txn).await?;

        WalletService::debit_with(
            &txn,
            &LedgerEntry::new(
                processing.user_id,
                processing.amount,
                TransactionType::Withdrawal,
                format!("M-Pesa withdrawal to {}", processing.phone_number),
                Some(LedgerReference::new("withdrawal", withdrawal_id)),
            ),
        )
        .await?;

        let reference = match self
            .mpesa
            .disburse(&processing.phone_number, processing.amount, withdrawal_id)
            .await
        {
            Ok(reference) => reference,
            Err(e) => {
                txn.rollback().await?;
                self.mark_failed(withdrawal_id, admin_id, &e).await?;
                return Err(e);
            }
        };

        let user_id = processing.user_id;
        let amount = processing.amount;
        let completed_at = Utc::now();
        let mut am = processing.into_active_model();
        am.status = Set(WithdrawalStatus::Completed);
        am.transfer_reference = Set(Some(reference.clone()));
        am.completed_at = Set(Some(completed_at));
        am.updated_at = Set(completed_at);
        let completed = am.update(&txn).await?;

        NotificationService::notify_with(
            &txn,
            user_id,
            NotificationType::WithdrawalProcessed,
            "Withdrawal completed",
            format!("{amount} Ksh has been sent to your M-Pesa. Reference: {reference}"),
            Some("/wallet"),
        )
        .await?;
        txn.commit().await?;

        log::info!(
            "Withdrawal {withdrawal_id} completed by admin {admin_id}: amount={amount}, reference={reference}"
        );
        Ok(completed.into())
    }

    async fn mark_failed(&self, withdrawal_id: i64, admin_id: i64, cause: &AppError) -> AppResult<()> {
        let withdrawal = withdrawals::Entity::find_by_id(withdrawal_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Withdrawal not found".to_string()))?;
        let now = Utc::now();
        let mut am = withdrawal.into_active_model();
        am.status = Set(WithdrawalStatus::Failed);
        am.approved_by = Set(Some(admin_id));
        am.approved_at = Set(Some(now));
        am.admin_notes = Set(Some(cause.to_string()));
        am.updated_at = Set(now);
        am.update(&*self.pool).await?;

        log::warn!("Withdrawal {withdrawal_id} failed at the payment rail: {cause}");
        Ok(())
    }

    pub async fn reject_withdrawal(
        &self,
        admin_id: i64,
        withdrawal_id: i64,
        reason: String,
    ) -> AppResult<WithdrawalResponse> {
        if reason.trim().is_empty() {
            return Err(AppError::ValidationError("Reason is required".to_string()));
        }
        let txn = self.pool.begin().await?;
        let withdrawal = Self::lock_pending(&txn, withdrawal_id).await?;

        let user_id = withdrawal.user_id;
        let amount = withdrawal.amount;
        let now = Utc::now();
        let mut am = withdrawal.into_active_model();
        am.status = Set(WithdrawalStatus::Rejected);
        am.approved_by = Set(Some(admin_id));
        am.rejected_reason = Set(Some(reason.clone()));
        am.updated_at = Set(now);
        let rejected = am.update(&txn).await?;

        NotificationService::notify_with(
            &txn,
            user_id,
            NotificationType::WithdrawalProcessed,
            "Withdrawal rejected",
            format!("Your withdrawal of {amount} Ksh was rejected: {reason}"),
            Some("/wallet"),
        )
        .await?;
        txn.commit().await?;

        log::info!("Withdrawal {withdrawal_id} rejected by admin {admin_id}");
        Ok(rejected.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MpesaConfig;
    use crate::database::{IntoPool, into_transaction_log};
    use crate::entities::{
        notification_entity as notifications, transaction_entity as transactions,
        wallet_entity as wallets,
    };
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};

    const STARTER: WithdrawalPolicy = WithdrawalPolicy {
        min_amount: 100,
        cooldown_days: 14,
    };

    #[test]
    fn test_below_tier_minimum_names_the_minimum() {
        let err = check_withdrawal(500, 50, STARTER, None, Utc::now()).unwrap_err();
        match err {
            AppError::ThresholdNotMet(msg) => {
                assert_eq!(msg, "Minimum withdrawal amount is 100 Ksh")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_balance_is_checked_first() {
        assert!(matches!(
            check_withdrawal(40, 50, STARTER, None, Utc::now()),
            Err(AppError::InsufficientBalance)
        ));
    }

    #[test]
    fn test_cooldown_reports_remaining_days() {
        let now = Utc::now();
        let err = check_withdrawal(500, 150, STARTER, Some(now - Duration::days(11)), now)
            .unwrap_err();
        match err {
            AppError::ThresholdNotMet(msg) => {
                assert_eq!(msg, "Withdrawal cooldown: 3 days remaining")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_partial_days_do_not_count() {
        let now = Utc::now();
        let last = now - Duration::days(13) - Duration::hours(23);
        assert!(check_withdrawal(500, 150, STARTER, Some(last), now).is_err());
        assert!(check_withdrawal(500, 150, STARTER, Some(now - Duration::days(14)), now).is_ok());
    }

    #[test]
    fn test_eligible_request_passes() {
        let diamond = WithdrawalPolicy {
            min_amount: 50,
            cooldown_days: 1,
        };
        let now = Utc::now();
        assert!(check_withdrawal(50, 50, diamond, Some(now - Duration::days(2)), now).is_ok());
    }

    #[test]
    fn test_missing_tier_falls_back_to_starter_limits() {
        assert_eq!(WithdrawalPolicy::default(), STARTER);
    }

    fn service(db: DbPool) -> WithdrawalService {
        WithdrawalService::new(
            db.clone(),
            WalletService::new(db),
            MpesaService::new(MpesaConfig::default()),
        )
    }

    fn withdrawal(status: WithdrawalStatus, phone: &str) -> withdrawals::Model {
        withdrawals::Model {
            id: 3,
            user_id: 7,
            amount: 150,
            phone_number: phone.to_string(),
            status,
            transfer_reference: None,
            admin_notes: None,
            approved_by: None,
            approved_at: None,
            completed_at: None,
            rejected_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn wallet(balance: i64) -> wallets::Model {
        wallets::Model {
            id: 1,
            user_id: 7,
            balance,
            total_earned: 500,
            total_withdrawn: 0,
            total_spent: 0,
            last_withdrawal_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ledger_row() -> transactions::Model {
        transactions::Model {
            id: 9,
            user_id: 7,
            transaction_type: TransactionType::Withdrawal,
            amount: -150,
            balance_before: 500,
            balance_after: 350,
            description: None,
            reference_id: Some(3),
            reference_type: Some("withdrawal".to_string()),
            created_at: Utc::now(),
        }
    }

    fn notification() -> notifications::Model {
        notifications::Model {
            id: 1,
            user_id: 7,
            notification_type: NotificationType::WithdrawalProcessed,
            title: "Withdrawal completed".to_string(),
            message: String::new(),
            is_read: false,
            action_url: Some("/wallet".to_string()),
            created_at: Utc::now(),
        }
    }

    /// Lock, processing update, wallet lock, wallet update, ledger insert.
    fn through_debit(phone: &str) -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![withdrawal(WithdrawalStatus::Pending, phone)]])
            .append_query_results([vec![withdrawal(WithdrawalStatus::Processing, phone)]])
            .append_query_results([vec![wallet(500)]])
            .append_query_results([vec![wallet(350)]])
            .append_query_results([vec![ledger_row()]])
    }

    #[tokio::test]
    async fn test_only_pending_withdrawals_can_be_approved() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![withdrawal(
                WithdrawalStatus::Completed,
                "+254712345678",
            )]])
            .into_pool();

        match service(db).approve_withdrawal(1, 3).await {
            Err(AppError::ValidationError(msg)) => assert_eq!(msg, "Withdrawal is not pending"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_successful_payout_records_the_reference() {
        let mut completed = withdrawal(WithdrawalStatus::Completed, "+254712345678");
        completed.transfer_reference = Some("MPESA1".to_string());
        let db = through_debit("+254712345678")
            .append_query_results([vec![completed]])
            .append_query_results([vec![notification()]])
            .into_pool();

        let result = service(db.clone()).approve_withdrawal(1, 3).await.unwrap();
        assert_eq!(result.status, WithdrawalStatus::Completed);

        let log = into_transaction_log(db);
        assert_eq!(log.len(), 1);
        let statements = format!("{:?}", log[0]);
        assert!(statements.contains("FOR UPDATE"));
        assert!(statements.contains("MPESA"));
        assert!(statements.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_rail_failure_rolls_back_and_marks_failed() {
        let mut failed = withdrawal(WithdrawalStatus::Failed, "+14155550123");
        failed.admin_notes = Some("rail".to_string());
        let db = through_debit("+14155550123")
            .append_query_results([vec![withdrawal(WithdrawalStatus::Processing, "+14155550123")]])
            .append_query_results([vec![failed]])
            .into_pool();

        let result = service(db.clone()).approve_withdrawal(1, 3).await;
        assert!(matches!(result, Err(AppError::ExternalApiError(_))));

        // Debit transaction, then the status lookup and update outside it
        let log = into_transaction_log(db);
        assert_eq!(log.len(), 3);
        let debit = format!("{:?}", log[0]);
        assert!(debit.contains("ROLLBACK"));
        assert!(!debit.contains("COMMIT"));
        let marked = format!("{:?}", log[2]);
        assert!(marked.contains("UPDATE"));
        assert!(marked.contains("failed"));
    }

    #[tokio::test]
    async fn test_non_kenyan_number_is_refused_at_request_time() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_pool();
        let result = service(db)
            .request_withdrawal(
                7,
                WithdrawRequest {
                    amount: 150,
                    phone_number: "+14155550123".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }
}
