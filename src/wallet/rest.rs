// Wallet REST client.
// JSON request/response, bearer-token auth on everything except the
// register/login/OTP/password-reset endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::wallet::errors::{map_error, WalletApiError};
use crate::wallet::fees::TransactionKind;
use crate::wallet::poller::TopUpStatusSource;
use crate::wallet::session::SessionStore;
use crate::wallet::types::{
    ApiEnvelope, AuthData, BalanceData, CalculateFeeRequest, ChangePasswordRequest, FeeQuoteData,
    ForgotPasswordRequest, LoginRequest, LoginResponse, PaymentIntent, RegisterRequest,
    ResendOtpRequest, ResetPasswordRequest, TopUpCreateRequest, TopUpStatusSnapshot,
    TransactionPage, TransferReceipt, TransferRequest, VerifyOtpRequest, WithdrawReceipt,
    WithdrawRequest,
};

#[derive(Clone)]
pub struct WalletRestClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
    pub(crate) session: Arc<dyn SessionStore>,
}

impl WalletRestClient {
    pub fn new(http: Client, base_url: String, session: Arc<dyn SessionStore>) -> Self {
        Self {
            http,
            base_url,
            session,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn apply_common_headers(
        &self,
        req: reqwest::RequestBuilder,
        authenticated: bool,
    ) -> reqwest::RequestBuilder {
        if authenticated {
            if let Some(token) = self.session.token() {
                return req.bearer_auth(token);
            }
        }
        req
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, WalletApiError> {
        let resp = req
            .send()
            .await
            .map_err(|e| WalletApiError::Transport(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| WalletApiError::Transport(e.to_string()))?;
        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| WalletApiError::Decode(e.to_string()))
        } else {
            Err(map_error(status, &text))
        }
    }

    fn require_data<T>(env: ApiEnvelope<T>, what: &'static str) -> Result<T, WalletApiError> {
        env.data
            .ok_or_else(|| WalletApiError::Decode(format!("missing data in {what} response")))
    }

    // POST /users/register
    #[instrument(skip(self, req), fields(method = "POST", path = "/users/register"))]
    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthData, WalletApiError> {
        info!(target: "wallet_api", email = %req.email, "register request");
        let builder = self.http.post(self.endpoint("/users/register")).json(req);
        let env: ApiEnvelope<AuthData> = self.send_json(builder).await?;
        Self::require_data(env, "register")
    }

    // POST /users/login
    #[instrument(skip(self, req), fields(method = "POST", path = "/users/login"))]
    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, WalletApiError> {
        info!(target: "wallet_api", email = %req.email, "login request");
        let builder = self.http.post(self.endpoint("/users/login")).json(req);
        self.send_json(builder).await
    }

    // POST /users/verify-otp
    #[instrument(skip(self, req), fields(method = "POST", path = "/users/verify-otp"))]
    pub async fn verify_otp(&self, req: &VerifyOtpRequest) -> Result<AuthData, WalletApiError> {
        info!(target: "wallet_api", email = %req.email, "verify otp request");
        let builder = self.http.post(self.endpoint("/users/verify-otp")).json(req);
        let env: ApiEnvelope<AuthData> = self.send_json(builder).await?;
        Self::require_data(env, "verify-otp")
    }

    // POST /users/resend-otp
    #[instrument(skip(self, req), fields(method = "POST", path = "/users/resend-otp"))]
    pub async fn resend_otp(&self, req: &ResendOtpRequest) -> Result<String, WalletApiError> {
        info!(target: "wallet_api", email = %req.email, kind = ?req.kind, "resend otp request");
        let builder = self.http.post(self.endpoint("/users/resend-otp")).json(req);
        let env: ApiEnvelope<serde_json::Value> = self.send_json(builder).await?;
        Ok(env.message.unwrap_or_default())
    }

    // POST /users/forgot-password
    #[instrument(skip(self, req), fields(method = "POST", path = "/users/forgot-password"))]
    pub async fn forgot_password(
        &self,
        req: &ForgotPasswordRequest,
    ) -> Result<String, WalletApiError> {
        info!(target: "wallet_api", email = %req.email, "forgot password request");
        let builder = self
            .http
            .post(self.endpoint("/users/forgot-password"))
            .json(req);
        let env: ApiEnvelope<serde_json::Value> = self.send_json(builder).await?;
        Ok(env.message.unwrap_or_default())
    }

    // POST /users/reset-password
    #[instrument(skip(self, req), fields(method = "POST", path = "/users/reset-password"))]
    pub async fn reset_password(
        &self,
        req: &ResetPasswordRequest,
    ) -> Result<String, WalletApiError> {
        info!(target: "wallet_api", email = %req.email, "reset password request");
        let builder = self
            .http
            .post(self.endpoint("/users/reset-password"))
            .json(req);
        let env: ApiEnvelope<serde_json::Value> = self.send_json(builder).await?;
        Ok(env.message.unwrap_or_default())
    }

    // POST /users/change-password
    #[instrument(skip(self, req), fields(method = "POST", path = "/users/change-password"))]
    pub async fn change_password(
        &self,
        req: &ChangePasswordRequest,
    ) -> Result<String, WalletApiError> {
        info!(target: "wallet_api", "change password request");
        let builder = self.apply_common_headers(
            self.http
                .post(self.endpoint("/users/change-password"))
                .json(req),
            true,
        );
        let env: ApiEnvelope<serde_json::Value> = self.send_json(builder).await?;
        Ok(env.message.unwrap_or_default())
    }

    // GET /users/balance
    #[instrument(skip(self), fields(method = "GET", path = "/users/balance"))]
    pub async fn balance(&self) -> Result<u64, WalletApiError> {
        let builder =
            self.apply_common_headers(self.http.get(self.endpoint("/users/balance")), true);
        let env: ApiEnvelope<BalanceData> = self.send_json(builder).await?;
        Self::require_data(env, "balance").map(|d| d.balance)
    }

    // POST /wallet/calculate-fee
    #[instrument(skip(self), fields(method = "POST", path = "/wallet/calculate-fee", amount = amount))]
    pub async fn calculate_fee(
        &self,
        amount: u64,
        kind: TransactionKind,
    ) -> Result<u64, WalletApiError> {
        info!(target: "wallet_api", amount = amount, kind = ?kind, "fee quote request");
        let req = CalculateFeeRequest {
            amount,
            transaction_type: kind,
        };
        let builder = self.apply_common_headers(
            self.http
                .post(self.endpoint("/wallet/calculate-fee"))
                .json(&req),
            true,
        );
        let env: ApiEnvelope<FeeQuoteData> = self.send_json(builder).await?;
        Self::require_data(env, "calculate-fee").map(|d| d.fee)
    }

    // POST /wallet/topup
    #[instrument(skip(self, req), fields(method = "POST", path = "/wallet/topup", amount = req.amount))]
    pub async fn create_topup(
        &self,
        req: &TopUpCreateRequest,
    ) -> Result<PaymentIntent, WalletApiError> {
        info!(
            target: "wallet_api",
            amount = req.amount,
            payment_method = %req.payment_method,
            "topup create request"
        );
        let builder = self.apply_common_headers(
            self.http.post(self.endpoint("/wallet/topup")).json(req),
            true,
        );
        let env: ApiEnvelope<PaymentIntent> = self.send_json(builder).await?;
        Self::require_data(env, "topup")
    }

    // GET /wallet/topup/status/{referenceId}
    // The status payload is not wrapped in a data envelope.
    #[instrument(skip(self), fields(method = "GET", path = "/wallet/topup/status/{referenceId}", reference_id = %reference_id))]
    pub async fn topup_status(
        &self,
        reference_id: &str,
    ) -> Result<TopUpStatusSnapshot, WalletApiError> {
        let url = self.endpoint(&format!("/wallet/topup/status/{reference_id}"));
        let builder = self.apply_common_headers(self.http.get(url), true);
        self.send_json(builder).await
    }

    // POST /wallet/transfer
    #[instrument(skip(self, req), fields(method = "POST", path = "/wallet/transfer", amount = req.amount))]
    pub async fn transfer(&self, req: &TransferRequest) -> Result<TransferReceipt, WalletApiError> {
        info!(
            target: "wallet_api",
            amount = req.amount,
            recipient = %req.recipient_phone_number,
            "transfer request"
        );
        let builder = self.apply_common_headers(
            self.http.post(self.endpoint("/wallet/transfer")).json(req),
            true,
        );
        let env: ApiEnvelope<TransferReceipt> = self.send_json(builder).await?;
        Self::require_data(env, "transfer")
    }

    // POST /wallet/withdraw
    #[instrument(skip(self, req), fields(method = "POST", path = "/wallet/withdraw", amount = req.amount))]
    pub async fn withdraw(&self, req: &WithdrawRequest) -> Result<WithdrawReceipt, WalletApiError> {
        info!(
            target: "wallet_api",
            amount = req.amount,
            bank_code = %req.bank_code,
            "withdraw request"
        );
        let builder = self.apply_common_headers(
            self.http.post(self.endpoint("/wallet/withdraw")).json(req),
            true,
        );
        let env: ApiEnvelope<WithdrawReceipt> = self.send_json(builder).await?;
        Self::require_data(env, "withdraw")
    }

    // GET /transactions?page&limit&type
    #[instrument(skip(self), fields(method = "GET", path = "/transactions", page = page, limit = limit))]
    pub async fn transactions(
        &self,
        page: u32,
        limit: u32,
        kind: Option<TransactionKind>,
    ) -> Result<TransactionPage, WalletApiError> {
        let mut query: Vec<(&str, String)> =
            vec![("page", page.to_string()), ("limit", limit.to_string())];
        if let Some(kind) = kind {
            let wire = match kind {
                TransactionKind::TopUp => "TOPUP",
                TransactionKind::Transfer => "TRANSFER",
                TransactionKind::Withdraw => "WITHDRAW",
            };
            query.push(("type", wire.to_string()));
        }
        let builder = self.apply_common_headers(
            self.http.get(self.endpoint("/transactions")).query(&query),
            true,
        );
        let env: ApiEnvelope<TransactionPage> = self.send_json(builder).await?;
        Self::require_data(env, "transactions")
    }
}

#[async_trait]
impl TopUpStatusSource for WalletRestClient {
    async fn fetch_status(&self, reference_id: &str) -> Result<TopUpStatusSnapshot, WalletApiError> {
        self.topup_status(reference_id).await
    }
}
