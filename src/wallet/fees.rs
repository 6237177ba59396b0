// Fee estimation. Pure functions over the configured policy; the server
// remains authoritative and may override these values at submission time.

use serde::{Deserialize, Serialize};

/// Top-up fee policy. Deployments run either a tiered flat fee or no fee
/// at all; the two are never mixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FeePolicy {
    Tiered {
        standard_fee: u64,
        high_fee: u64,
        high_threshold: u64,
    },
    Free,
}

impl Default for FeePolicy {
    fn default() -> Self {
        FeePolicy::Tiered {
            standard_fee: 2_500,
            high_fee: 5_000,
            high_threshold: 5_000_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "TOPUP")]
    TopUp,
    #[serde(rename = "TRANSFER")]
    Transfer,
    #[serde(rename = "WITHDRAW")]
    Withdraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeType {
    Flat,
    Percent,
    Free,
}

/// Client-side fee preview. For top-up and transfer `total` is the amount
/// debited (principal + fee); for withdraw it is the amount the bank
/// account receives (principal - fee).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub amount: u64,
    pub fee: u64,
    pub total: u64,
    pub fee_type: FeeType,
}

/// Estimate the fee for `amount` under the given transaction kind.
/// Callers reject non-positive amounts before calling; a valid positive
/// amount is assumed here. The policy only applies to top-ups.
pub fn estimate_fee(amount: u64, kind: TransactionKind, policy: &FeePolicy) -> FeeBreakdown {
    match kind {
        TransactionKind::TopUp => topup_fee(amount, policy),
        TransactionKind::Transfer => transfer_fee(amount),
        TransactionKind::Withdraw => withdraw_fee(amount),
    }
}

pub fn topup_fee(amount: u64, policy: &FeePolicy) -> FeeBreakdown {
    match *policy {
        FeePolicy::Free => FeeBreakdown {
            amount,
            fee: 0,
            total: amount,
            fee_type: FeeType::Free,
        },
        FeePolicy::Tiered {
            standard_fee,
            high_fee,
            high_threshold,
        } => {
            let fee = if amount >= high_threshold {
                high_fee
            } else {
                standard_fee
            };
            FeeBreakdown {
                amount,
                fee,
                total: amount + fee,
                fee_type: FeeType::Flat,
            }
        }
    }
}

pub fn transfer_fee(amount: u64) -> FeeBreakdown {
    let fee = percent_fee(amount);
    FeeBreakdown {
        amount,
        fee,
        total: amount + fee,
        fee_type: FeeType::Percent,
    }
}

/// `total` here is what the bank account receives.
pub fn withdraw_fee(amount: u64) -> FeeBreakdown {
    let fee = percent_fee(amount);
    FeeBreakdown {
        amount,
        fee,
        total: amount.saturating_sub(fee),
        fee_type: FeeType::Percent,
    }
}

// 1% of principal, rounded up.
fn percent_fee(amount: u64) -> u64 {
    amount.div_ceil(100)
}
