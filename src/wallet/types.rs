// Wire DTOs for the wallet API. Shapes mirror the backend's JSON; requests
// are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::wallet::fees::TransactionKind;

/// Standard success envelope: `{ success?, message?, data }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

// ---- users ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

/// Auth payload returned by register / login / verify-otp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub token: String,
}

impl AuthData {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login responses come in two shapes: a session payload, or a
/// needs-verification marker carrying the email to verify.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub needs_verification: Option<bool>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<AuthData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OtpKind {
    Verification,
    PasswordReset,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResendOtpRequest {
    pub email: String,
    #[serde(rename = "type")]
    pub kind: OtpKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceData {
    pub balance: u64,
}

// ---- wallet ----

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateFeeRequest {
    pub amount: u64,
    pub transaction_type: TransactionKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuoteData {
    pub fee: u64,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpCreateRequest {
    pub amount: u64,
    pub payment_method: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopUpStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TopUpStatus {
    /// PENDING is the only non-terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TopUpStatus::Pending)
    }
}

/// Payment intent created per top-up submission. Immutable once returned;
/// `reference_id` is the sole key for subsequent status queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub reference_id: String,
    pub payment_id: String,
    pub status: TopUpStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_string: Option<String>,
    pub is_redirect_required: bool,
}

/// One status poll result. Supersedes (never mutates) the previous
/// snapshot; `current_balance` is authoritative on COMPLETED.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpStatusSnapshot {
    pub status: TopUpStatus,
    pub amount: u64,
    pub reference_id: String,
    pub current_balance: u64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub recipient_phone_number: String,
    pub amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub amount: u64,
    pub fee: u64,
    pub total: u64,
    pub recipient_name: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub amount: u64,
    pub bank_code: String,
    pub account_number: String,
    pub account_holder_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawReceipt {
    pub withdrawal_id: String,
    pub amount: u64,
    pub fee: u64,
    pub total: u64,
    pub status: String,
}

// ---- transactions ----

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: u64,
    pub status: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionPage {
    pub transactions: Vec<TransactionRecord>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_intent_decodes_camel_case() {
        let body = r#"{
            "referenceId": "TOPUP-20250801-0001",
            "paymentId": "pay_9f2c",
            "status": "PENDING",
            "qrString": "00020101021226...",
            "isRedirectRequired": false
        }"#;
        let intent: PaymentIntent = serde_json::from_str(body).unwrap();
        assert_eq!(intent.reference_id, "TOPUP-20250801-0001");
        assert_eq!(intent.status, TopUpStatus::Pending);
        assert!(intent.checkout_url.is_none());
        assert!(intent.qr_string.is_some());
        assert!(!intent.is_redirect_required);
    }

    #[test]
    fn status_snapshot_decodes() {
        let body = r#"{
            "status": "COMPLETED",
            "amount": 100000,
            "referenceId": "TOPUP-20250801-0001",
            "currentBalance": 600000,
            "createdAt": "2025-08-01T10:00:00Z"
        }"#;
        let snap: TopUpStatusSnapshot = serde_json::from_str(body).unwrap();
        assert_eq!(snap.status, TopUpStatus::Completed);
        assert!(snap.status.is_terminal());
        assert_eq!(snap.current_balance, 600_000);
    }

    #[test]
    fn pending_is_the_only_non_terminal_status() {
        assert!(!TopUpStatus::Pending.is_terminal());
        assert!(TopUpStatus::Completed.is_terminal());
        assert!(TopUpStatus::Failed.is_terminal());
        assert!(TopUpStatus::Cancelled.is_terminal());
    }

    #[test]
    fn resend_otp_uses_type_field() {
        let req = ResendOtpRequest {
            email: "a@b.c".to_string(),
            kind: OtpKind::PasswordReset,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "PASSWORD_RESET");
    }

    #[test]
    fn transaction_kind_wire_names() {
        assert_eq!(
            serde_json::to_value(TransactionKind::TopUp).unwrap(),
            "TOPUP"
        );
        assert_eq!(
            serde_json::to_value(TransactionKind::Withdraw).unwrap(),
            "WITHDRAW"
        );
    }

    #[test]
    fn login_response_needs_verification_shape() {
        let body = r#"{"needsVerification": true, "email": "user@example.com"}"#;
        let resp: LoginResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.needs_verification, Some(true));
        assert_eq!(resp.email.as_deref(), Some("user@example.com"));
        assert!(resp.data.is_none());
    }
}
