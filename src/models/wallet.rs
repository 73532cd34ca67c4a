use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{
    TransactionType, WithdrawalStatus, transaction_entity, wallet_entity, withdrawal_entity,
};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalletResponse {
    /// CB Points, 1 point = 1 Ksh
    pub balance: i64,
    pub total_earned: i64,
    pub total_withdrawn: i64,
    pub total_spent: i64,
    pub last_withdrawal_date: Option<DateTime<Utc>>,
}

impl From<wallet_entity::Model> for WalletResponse {
    fn from(m: wallet_entity::Model) -> Self {
        WalletResponse {
            balance: m.balance,
            total_earned: m.total_earned,
            total_withdrawn: m.total_withdrawn,
            total_spent: m.total_spent,
            last_withdrawal_date: m.last_withdrawal_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i64,
    pub transaction_type: TransactionType,
    /// Signed: negative for debits
    pub amount: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub description: Option<String>,
    pub reference_id: Option<i64>,
    pub reference_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<transaction_entity::Model> for TransactionResponse {
    fn from(m: transaction_entity::Model) -> Self {
        TransactionResponse {
            id: m.id,
            transaction_type: m.transaction_type,
            amount: m.amount,
            balance_before: m.balance_before,
            balance_after: m.balance_after,
            description: m.description,
            reference_id: m.reference_id,
            reference_type: m.reference_type,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WithdrawRequest {
    #[schema(example = 150)]
    pub amount: i64,
    #[schema(example = "0712345678")]
    pub phone_number: String,
}

impl WithdrawRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.amount < 1 {
            return Err(AppError::ValidationError(
                "Amount must be at least 1".to_string(),
            ));
        }
        crate::utils::validate_payout_phone(&self.phone_number)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WithdrawalResponse {
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub phone_number: String,
    pub status: WithdrawalStatus,
    pub transfer_reference: Option<String>,
    pub admin_notes: Option<String>,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rejected_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<withdrawal_entity::Model> for WithdrawalResponse {
    fn from(m: withdrawal_entity::Model) -> Self {
        WithdrawalResponse {
            id: m.id,
            user_id: m.user_id,
            amount: m.amount,
            phone_number: m.phone_number,
            status: m.status,
            transfer_reference: m.transfer_reference,
            admin_notes: m.admin_notes,
            approved_by: m.approved_by,
            approved_at: m.approved_at,
            completed_at: m.completed_at,
            rejected_reason: m.rejected_reason,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentDirection {
    Credit,
    Debit,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdjustWalletRequest {
    pub user_id: i64,
    pub direction: AdjustmentDirection,
    /// Positive amount in CB Points
    pub amount: i64,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LedgerAuditResponse {
    pub user_id: i64,
    pub stored_balance: i64,
    pub replayed_balance: i64,
    pub transaction_count: usize,
    /// Each row starts where the previous one ended
    pub chain_intact: bool,
    pub consistent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdraw_request_validation() {
        let ok = WithdrawRequest {
            amount: 100,
            phone_number: "0712345678".into(),
        };
        assert!(ok.validate().is_ok());

        let zero = WithdrawRequest {
            amount: 0,
            phone_number: "0712345678".into(),
        };
        assert!(zero.validate().is_err());

        let bad_phone = WithdrawRequest {
            amount: 100,
            phone_number: "12345".into(),
        };
        assert!(bad_phone.validate().is_err());
    }
}
