use crate::database::DbPool;
use crate::entities::{TransactionType, transaction_entity as transactions, wallet_entity as wallets};
use crate::error::{AppError, AppResult};
use crate::models::{LedgerAuditResponse, TransactionResponse, WalletResponse};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// What a ledger row points back to, e.g. ("task", 12).
#[derive(Debug, Clone, Copy)]
pub struct LedgerReference {
    pub kind: &'static str,
    pub id: Option<i64>,
}

impl LedgerReference {
    pub fn new(kind: &'static str, id: i64) -> Self {
        Self { kind, id: Some(id) }
    }

    pub fn kind_only(kind: &'static str) -> Self {
        Self { kind, id: None }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub user_id: i64,
    /// Always positive; the direction comes from credit/debit
    pub amount: i64,
    pub transaction_type: TransactionType,
    pub description: String,
    pub reference: Option<LedgerReference>,
}

impl LedgerEntry {
    pub fn new(
        user_id: i64,
        amount: i64,
        transaction_type: TransactionType,
        description: impl Into<String>,
        reference: Option<LedgerReference>,
    ) -> Self {
        Self {
            user_id,
            amount,
            transaction_type,
            description: description.into(),
            reference,
        }
    }
}

/// Wallet figures after a credit or debit has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub balance_before: i64,
    pub balance_after: i64,
    pub total_earned: i64,
    pub total_withdrawn: i64,
    pub total_spent: i64,
    pub stamps_withdrawal_date: bool,
}

impl BalanceChange {
    /// Signed amount recorded in the ledger row
    pub fn signed_amount(&self) -> i64 {
        self.balance_after - self.balance_before
    }
}

fn ensure_positive(amount: i64) -> AppResult<()> {
    if amount <= 0 {
        return Err(AppError::ValidationError(
            "Amount must be positive".to_string(),
        ));
    }
    Ok(())
}

pub fn plan_credit(wallet: &wallets::Model, amount: i64) -> AppResult<BalanceChange> {
    ensure_positive(amount)?;
    Ok(BalanceChange {
        balance_before: wallet.balance,
        balance_after: wallet.balance + amount,
        total_earned: wallet.total_earned + amount,
        total_withdrawn: wallet.total_withdrawn,
        total_spent: wallet.total_spent,
        stamps_withdrawal_date: false,
    })
}

pub fn plan_debit(
    wallet: &wallets::Model,
    amount: i64,
    transaction_type: TransactionType,
) -> AppResult<BalanceChange> {
    ensure_positive(amount)?;
    if amount > wallet.balance {
        return Err(AppError::InsufficientBalance);
    }
    let is_withdrawal = transaction_type == TransactionType::Withdrawal;
    Ok(BalanceChange {
        balance_before: wallet.balance,
        balance_after: wallet.balance - amount,
        total_earned: wallet.total_earned,
        total_withdrawn: wallet.total_withdrawn + if is_withdrawal { amount } else { 0 },
        total_spent: wallet.total_spent + if is_withdrawal { 0 } else { amount },
        stamps_withdrawal_date: is_withdrawal,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub balance: i64,
    /// Every row's balance_before equals the running balance
    pub chain_intact: bool,
}

/// Replays ledger rows in creation order starting from zero.
pub fn replay_ledger(rows: &[transactions::Model]) -> ReplayOutcome {
    let mut balance = 0i64;
    let mut chain_intact = true;
    for row in rows {
        if row.balance_before != balance || row.balance_after != balance + row.amount {
            chain_intact = false;
        }
        balance += row.amount;
    }
    ReplayOutcome {
        balance,
        chain_intact,
    }
}

#[derive(Clone)]
pub struct WalletService {
    pool: DbPool,
}

impl WalletService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Idempotent: concurrent callers never create a second wallet.
    pub async fn ensure_wallet_with<C: ConnectionTrait>(conn: &C, user_id: i64) -> AppResult<()> {
        wallets::Entity::insert(wallets::ActiveModel {
            user_id: Set(user_id),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(wallets::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
        Ok(())
    }

    pub async fn get_or_create_wallet(&self, user_id: i64) -> AppResult<wallets::Model> {
        if let Some(wallet) = Self::find_wallet_with(&*self.pool, user_id).await? {
            return Ok(wallet);
        }
        Self::ensure_wallet_with(&*self.pool, user_id).await?;
        Self::find_wallet_with(&*self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::InternalError(format!("wallet for user {user_id} missing")))
    }

    pub async fn find_wallet_with<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
    ) -> AppResult<Option<wallets::Model>> {
        Ok(wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .one(conn)
            .await?)
    }

    async fn lock_wallet<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
    ) -> AppResult<Option<wallets::Model>> {
        Ok(wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(conn)
            .await?)
    }

    /// Credits inside the caller's transaction. The wallet row stays locked
    /// until that transaction ends.
    pub async fn credit_with<C: ConnectionTrait>(
        conn: &C,
        entry: &LedgerEntry,
    ) -> AppResult<transactions::Model> {
        ensure_positive(entry.amount)?;
        Self::ensure_wallet_with(conn, entry.user_id).await?;
        let wallet = Self::lock_wallet(conn, entry.user_id)
            .await?
            .ok_or_else(|| {
                AppError::InternalError(format!("wallet for user {} missing", entry.user_id))
            })?;
        let change = plan_credit(&wallet, entry.amount)?;
        Self::apply(conn, wallet, &change, entry).await
    }

    /// Debits inside the caller's transaction. A missing wallet has balance 0.
    pub async fn debit_with<C: ConnectionTrait>(
        conn: &C,
        entry: &LedgerEntry,
    ) -> AppResult<transactions::Model> {
        ensure_positive(entry.amount)?;
        let wallet = Self::lock_wallet(conn, entry.user_id)
            .await?
            .ok_or(AppError::InsufficientBalance)?;
        let change = plan_debit(&wallet, entry.amount, entry.transaction_type)?;
        Self::apply(conn, wallet, &change, entry).await
    }

    async fn apply<C: ConnectionTrait>(
        conn: &C,
        wallet: wallets::Model,
        change: &BalanceChange,
        entry: &LedgerEntry,
    ) -> AppResult<transactions::Model> {
        let now = Utc::now();
        let mut am = wallet.into_active_model();
        am.balance = Set(change.balance_after);
        am.total_earned = Set(change.total_earned);
        am.total_withdrawn = Set(change.total_withdrawn);
        am.total_spent = Set(change.total_spent);
        if change.stamps_withdrawal_date {
            am.last_withdrawal_date = Set(Some(now));
        }
        am.updated_at = Set(now);
        am.update(conn).await?;

        let row = transactions::ActiveModel {
            user_id: Set(entry.user_id),
            transaction_type: Set(entry.transaction_type),
            amount: Set(change.signed_amount()),
            balance_before: Set(change.balance_before),
            balance_after: Set(change.balance_after),
            description: Set(Some(entry.description.clone())),
            reference_id: Set(entry.reference.and_then(|r| r.id)),
            reference_type: Set(entry.reference.map(|r| r.kind.to_string())),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(row)
    }

    pub async fn credit(&self, entry: LedgerEntry) -> AppResult<transactions::Model> {
        let txn = self.pool.begin().await?;
        let row = Self::credit_with(&txn, &entry).await?;
        txn.commit().await?;
        Ok(row)
    }

    pub async fn debit(&self, entry: LedgerEntry) -> AppResult<transactions::Model> {
        let txn = self.pool.begin().await?;
        let row = Self::debit_with(&txn, &entry).await?;
        txn.commit().await?;
        Ok(row)
    }

    pub async fn get_balance(&self, user_id: i64) -> AppResult<WalletResponse> {
        Ok(self.get_or_create_wallet(user_id).await?.into())
    }

    /// Newest first
    pub async fn list_transactions(
        &self,
        user_id: i64,
        limit: u64,
    ) -> AppResult<Vec<TransactionResponse>> {
        let rows = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit)
            .all(&*self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Manual correction by an administrator.
    pub async fn admin_adjust(
        &self,
        admin_id: i64,
        user_id: i64,
        credit: bool,
        amount: i64,
        description: Option<String>,
    ) -> AppResult<TransactionResponse> {
        let (transaction_type, fallback) = if credit {
            (TransactionType::AdminCredit, "Admin credit")
        } else {
            (TransactionType::AdminDebit, "Admin debit")
        };
        let entry = LedgerEntry::new(
            user_id,
            amount,
            transaction_type,
            description.unwrap_or_else(|| fallback.to_string()),
            Some(LedgerReference::new("admin", admin_id)),
        );
        let row = if credit {
            self.credit(entry).await?
        } else {
            self.debit(entry).await?
        };
        log::info!(
            "Wallet adjusted by admin {admin_id}: user={user_id}, type={transaction_type}, amount={amount}"
        );
        Ok(row.into())
    }

    /// Replays the ledger and compares it with the stored balance.
    pub async fn audit(&self, user_id: i64) -> AppResult<LedgerAuditResponse> {
        let wallet = Self::find_wallet_with(&*self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Wallet not found".to_string()))?;
        let rows = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_asc(transactions::Column::CreatedAt)
            .order_by_asc(transactions::Column::Id)
            .all(&*self.pool)
            .await?;
        let outcome = replay_ledger(&rows);
        let consistent = outcome.chain_intact && outcome.balance == wallet.balance;
        if !consistent {
            log::warn!(
                "Ledger mismatch for user {user_id}: stored={}, replayed={}",
                wallet.balance,
                outcome.balance
            );
        }
        Ok(LedgerAuditResponse {
            user_id,
            stored_balance: wallet.balance,
            replayed_balance: outcome.balance,
            transaction_count: rows.len(),
            chain_intact: outcome.chain_intact,
            consistent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::IntoPool;
    use chrono::{DateTime, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn ts() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-09-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
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
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn row(id: i64, amount: i64, before: i64) -> transactions::Model {
        transactions::Model {
            id,
            user_id: 7,
            transaction_type: if amount > 0 {
                TransactionType::TaskReward
            } else {
                TransactionType::Withdrawal
            },
            amount,
            balance_before: before,
            balance_after: before + amount,
            description: None,
            reference_id: None,
            reference_type: None,
            created_at: ts(),
        }
    }

    #[test]
    fn test_credit_raises_balance_and_total_earned() {
        let change = plan_credit(&wallet(10), 5).unwrap();
        assert_eq!(change.balance_before, 10);
        assert_eq!(change.balance_after, 15);
        assert_eq!(change.total_earned, 15);
        assert_eq!(change.total_withdrawn, 0);
        assert_eq!(change.total_spent, 0);
        assert_eq!(change.signed_amount(), 5);
    }

    #[test]
    fn test_withdrawal_debit_raises_total_withdrawn_only() {
        let change = plan_debit(&wallet(100), 40, TransactionType::Withdrawal).unwrap();
        assert_eq!(change.balance_after, 60);
        assert_eq!(change.total_withdrawn, 40);
        assert_eq!(change.total_spent, 0);
        assert!(change.stamps_withdrawal_date);
        assert_eq!(change.signed_amount(), -40);
    }

    #[test]
    fn test_other_debit_raises_total_spent_only() {
        let change = plan_debit(&wallet(100), 40, TransactionType::AdminDebit).unwrap();
        assert_eq!(change.total_withdrawn, 0);
        assert_eq!(change.total_spent, 40);
        assert!(!change.stamps_withdrawal_date);
    }

    #[test]
    fn test_debit_above_balance_is_rejected() {
        assert!(matches!(
            plan_debit(&wallet(10), 15, TransactionType::Withdrawal),
            Err(AppError::InsufficientBalance)
        ));
        assert!(plan_debit(&wallet(10), 10, TransactionType::Withdrawal).is_ok());
    }

    #[test]
    fn test_non_positive_amounts_are_rejected() {
        assert!(matches!(
            plan_credit(&wallet(10), 0),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            plan_debit(&wallet(10), -5, TransactionType::AdminDebit),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_replay_reproduces_balance() {
        let rows = vec![row(1, 50, 0), row(2, 20, 50), row(3, -30, 70)];
        let outcome = replay_ledger(&rows);
        assert_eq!(outcome.balance, 40);
        assert!(outcome.chain_intact);
    }

    #[test]
    fn test_replay_flags_broken_chain() {
        let rows = vec![row(1, 50, 0), row(2, 20, 55)];
        let outcome = replay_ledger(&rows);
        assert_eq!(outcome.balance, 70);
        assert!(!outcome.chain_intact);
    }

    #[tokio::test]
    async fn test_debit_over_balance_writes_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![wallet(10)]])
            .into_pool();
        let service = WalletService::new(db);

        let result = service
            .debit(LedgerEntry::new(
                7,
                15,
                TransactionType::Withdrawal,
                "M-Pesa withdrawal",
                None,
            ))
            .await;
        assert!(matches!(result, Err(AppError::InsufficientBalance)));
    }

    #[tokio::test]
    async fn test_debit_without_wallet_is_insufficient() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<wallets::Model>::new()])
            .into_pool();
        let service = WalletService::new(db);

        let result = service
            .debit(LedgerEntry::new(7, 1, TransactionType::AdminDebit, "x", None))
            .await;
        assert!(matches!(result, Err(AppError::InsufficientBalance)));
    }

    #[tokio::test]
    async fn test_debit_within_balance_records_negative_row() {
        let mut debited = wallet(10);
        debited.balance = 4;
        debited.total_withdrawn = 6;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![wallet(10)], vec![debited]])
            .append_query_results([vec![row(9, -6, 10)]])
            .into_pool();
        let service = WalletService::new(db);

        let recorded = service
            .debit(LedgerEntry::new(
                7,
                6,
                TransactionType::Withdrawal,
                "M-Pesa withdrawal",
                Some(LedgerReference::new("withdrawal", 3)),
            ))
            .await
            .unwrap();
        assert_eq!(recorded.amount, -6);
        assert_eq!(recorded.balance_after, 4);
    }
}
