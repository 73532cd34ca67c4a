use crate::config::MpesaConfig;
use crate::error::{AppError, AppResult};
use crate::utils::KENYA_DIAL_PREFIX;
use chrono::Utc;

/// Mobile-money payout rail. Transfers are simulated: a reference is minted
/// locally instead of calling a B2C endpoint.
#[derive(Clone)]
pub struct MpesaService {
    config: MpesaConfig,
}

impl MpesaService {
    pub fn new(config: MpesaConfig) -> Self {
        Self { config }
    }

    /// Sends `amount` Ksh to `phone` and returns the transfer reference.
    pub async fn disburse(&self, phone: &str, amount: i64, withdrawal_id: i64) -> AppResult<String> {
        if amount <= 0 {
            return Err(AppError::ExternalApiError(format!(
                "M-Pesa rejected amount {amount}"
            )));
        }
        // Safaricom only pays out to Kenyan MSISDNs
        if !phone.starts_with(KENYA_DIAL_PREFIX) {
            log::warn!("M-Pesa payout refused for withdrawal {withdrawal_id}: non-Kenyan number");
            return Err(AppError::ExternalApiError(format!(
                "M-Pesa cannot pay out to {phone}"
            )));
        }

        let reference = format!(
            "{}{}",
            self.config.reference_prefix,
            Utc::now().timestamp_millis()
        );
        log::info!(
            "M-Pesa payout sent: withdrawal={withdrawal_id}, amount={amount}, reference={reference}"
        );
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> MpesaService {
        MpesaService::new(MpesaConfig::default())
    }

    #[tokio::test]
    async fn test_disburse_returns_prefixed_reference() {
        let reference = service().disburse("+254712345678", 150, 1).await.unwrap();
        assert!(reference.starts_with("MPESA"));
        assert!(reference["MPESA".len()..].chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_disburse_refuses_foreign_numbers() {
        let err = service().disburse("+14155550123", 150, 1).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalApiError(_)));
    }

    #[tokio::test]
    async fn test_disburse_refuses_non_positive_amount() {
        assert!(service().disburse("+254712345678", 0, 1).await.is_err());
    }
}
