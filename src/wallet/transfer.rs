// Peer-to-peer transfer: preview (client-side validation + fee math),
// explicit confirmation of the displayed breakdown, then a single submit
// call. No polling; the backend settles transfers synchronously.

use tracing::info;

use crate::wallet::errors::WalletApiError;
use crate::wallet::fees::transfer_fee;
use crate::wallet::rest::WalletRestClient;
use crate::wallet::types::{TransferReceipt, TransferRequest};

#[derive(Debug, Clone, Default)]
pub struct TransferInput {
    pub recipient_phone_number: String,
    pub amount: u64,
    pub description: Option<String>,
}

/// Breakdown shown in the confirmation step; discarded once the submission
/// resolves either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDetail {
    pub recipient_phone_number: String,
    pub amount: u64,
    pub fee: u64,
    /// Amount debited from the sender: principal + fee.
    pub total: u64,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct TransferFlow {
    rest: WalletRestClient,
}

impl TransferFlow {
    pub fn new(rest: WalletRestClient) -> Self {
        Self { rest }
    }

    // Ordered field checks, short-circuiting on the first failure.
    fn validate(input: &TransferInput) -> Result<(), WalletApiError> {
        if input.recipient_phone_number.trim().is_empty() {
            return Err(WalletApiError::Validation {
                field: "recipientPhoneNumber",
                message: "recipient phone number is required".to_string(),
            });
        }
        if input.amount == 0 {
            return Err(WalletApiError::Validation {
                field: "amount",
                message: "amount must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Validate the input against the given balance and compute the fee
    /// breakdown. Checks run in order and short-circuit: required fields,
    /// positive amount, then balance sufficiency including the fee. No
    /// network call happens here.
    pub fn preview(
        input: &TransferInput,
        available_balance: u64,
    ) -> Result<TransferDetail, WalletApiError> {
        Self::validate(input)?;
        let breakdown = transfer_fee(input.amount);
        if breakdown.total > available_balance {
            return Err(WalletApiError::InsufficientFunds {
                required: breakdown.total,
                available: available_balance,
            });
        }
        Ok(TransferDetail {
            recipient_phone_number: input.recipient_phone_number.trim().to_string(),
            amount: input.amount,
            fee: breakdown.fee,
            total: breakdown.total,
            description: input.description.clone(),
        })
    }

    /// Preview against a freshly fetched balance. Field checks still run
    /// before the balance call.
    pub async fn preview_refreshed(
        &self,
        input: &TransferInput,
    ) -> Result<TransferDetail, WalletApiError> {
        Self::validate(input)?;
        let available = self.rest.balance().await?;
        Self::preview(input, available)
    }

    /// Submit a confirmed transfer. Errors surface once; there is no
    /// automatic retry.
    pub async fn submit(&self, detail: &TransferDetail) -> Result<TransferReceipt, WalletApiError> {
        let req = TransferRequest {
            recipient_phone_number: detail.recipient_phone_number.clone(),
            amount: detail.amount,
            description: detail.description.clone(),
        };
        let receipt = self.rest.transfer(&req).await?;
        info!(
            target: "transfer",
            amount = receipt.amount,
            fee = receipt.fee,
            total = receipt.total,
            recipient = %receipt.recipient_name,
            "transfer submitted"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(amount: u64) -> TransferInput {
        TransferInput {
            recipient_phone_number: "+628123456789".to_string(),
            amount,
            description: None,
        }
    }

    #[test]
    fn preview_computes_fee_on_top_of_principal() {
        let detail = TransferFlow::preview(&input(10_000), 1_000_000).unwrap();
        assert_eq!(detail.fee, 100);
        assert_eq!(detail.total, 10_100);
    }

    #[test]
    fn missing_recipient_fails_first() {
        // Amount is also invalid; the field check must win.
        let bad = TransferInput {
            recipient_phone_number: "  ".to_string(),
            amount: 0,
            description: None,
        };
        let err = TransferFlow::preview(&bad, 1_000_000).unwrap_err();
        assert!(matches!(
            err,
            WalletApiError::Validation {
                field: "recipientPhoneNumber",
                ..
            }
        ));
    }

    #[test]
    fn zero_amount_fails_before_balance_check() {
        let err = TransferFlow::preview(&input(0), 0).unwrap_err();
        assert!(matches!(
            err,
            WalletApiError::Validation { field: "amount", .. }
        ));
    }

    #[test]
    fn insufficient_balance_blocks_before_any_network_call() {
        // balance 5000, requested 10000 -> fee 100 -> total 10100 > 5000
        let err = TransferFlow::preview(&input(10_000), 5_000).unwrap_err();
        match err {
            WalletApiError::InsufficientFunds {
                required,
                available,
            } => {
                assert_eq!(required, 10_100);
                assert_eq!(available, 5_000);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn exact_balance_including_fee_is_allowed() {
        let detail = TransferFlow::preview(&input(10_000), 10_100).unwrap();
        assert_eq!(detail.total, 10_100);
    }
}
