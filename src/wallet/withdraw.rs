// Bank withdrawal: preview (client-side validation + fee math), explicit
// confirmation, then a single submit call. The fee comes out of the
// requested amount; the wallet is debited for the full principal.

use tracing::info;

use crate::wallet::errors::WalletApiError;
use crate::wallet::fees::withdraw_fee;
use crate::wallet::rest::WalletRestClient;
use crate::wallet::types::{WithdrawReceipt, WithdrawRequest};

#[derive(Debug, Clone, Default)]
pub struct WithdrawInput {
    pub amount: u64,
    pub bank_code: String,
    pub account_number: String,
    pub account_holder_name: String,
}

/// Breakdown shown in the confirmation step; discarded once the submission
/// resolves either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawDetail {
    pub amount: u64,
    pub fee: u64,
    /// Amount the bank account receives: principal - fee.
    pub received: u64,
    pub bank_code: String,
    pub account_number: String,
    pub account_holder_name: String,
}

#[derive(Clone)]
pub struct WithdrawFlow {
    rest: WalletRestClient,
}

impl WithdrawFlow {
    pub fn new(rest: WalletRestClient) -> Self {
        Self { rest }
    }

    // Ordered field checks, short-circuiting on the first failure.
    fn validate(input: &WithdrawInput) -> Result<(), WalletApiError> {
        if input.bank_code.trim().is_empty() {
            return Err(WalletApiError::Validation {
                field: "bankCode",
                message: "bank code is required".to_string(),
            });
        }
        if input.account_number.trim().is_empty() {
            return Err(WalletApiError::Validation {
                field: "accountNumber",
                message: "account number is required".to_string(),
            });
        }
        if input.account_holder_name.trim().is_empty() {
            return Err(WalletApiError::Validation {
                field: "accountHolderName",
                message: "account holder name is required".to_string(),
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
    /// positive amount, then balance sufficiency. No network call happens
    /// here.
    pub fn preview(
        input: &WithdrawInput,
        available_balance: u64,
    ) -> Result<WithdrawDetail, WalletApiError> {
        Self::validate(input)?;
        if input.amount > available_balance {
            return Err(WalletApiError::InsufficientFunds {
                required: input.amount,
                available: available_balance,
            });
        }
        let breakdown = withdraw_fee(input.amount);
        Ok(WithdrawDetail {
            amount: input.amount,
            fee: breakdown.fee,
            received: breakdown.total,
            bank_code: input.bank_code.trim().to_string(),
            account_number: input.account_number.trim().to_string(),
            account_holder_name: input.account_holder_name.trim().to_string(),
        })
    }

    /// Preview against a freshly fetched balance. Field checks still run
    /// before the balance call.
    pub async fn preview_refreshed(
        &self,
        input: &WithdrawInput,
    ) -> Result<WithdrawDetail, WalletApiError> {
        Self::validate(input)?;
        let available = self.rest.balance().await?;
        Self::preview(input, available)
    }

    /// Submit a confirmed withdrawal. Errors surface once; there is no
    /// automatic retry.
    pub async fn submit(&self, detail: &WithdrawDetail) -> Result<WithdrawReceipt, WalletApiError> {
        let req = WithdrawRequest {
            amount: detail.amount,
            bank_code: detail.bank_code.clone(),
            account_number: detail.account_number.clone(),
            account_holder_name: detail.account_holder_name.clone(),
        };
        let receipt = self.rest.withdraw(&req).await?;
        info!(
            target: "withdraw",
            withdrawal_id = %receipt.withdrawal_id,
            amount = receipt.amount,
            fee = receipt.fee,
            total = receipt.total,
            status = %receipt.status,
            "withdrawal submitted"
        );
        Ok(receipt)
    }
}
