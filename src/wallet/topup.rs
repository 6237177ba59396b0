// Top-up flow: validation, fee reconciliation against the server, intent
// creation, and the confirmation handoff to the poller. Completion is only
// known once the poller reaches a terminal state; nothing here mutates the
// balance locally.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::settings::WalletSettings;
use crate::wallet::errors::WalletApiError;
use crate::wallet::fees::{estimate_fee, FeeBreakdown, TransactionKind};
use crate::wallet::methods::find_method;
use crate::wallet::poller::{TopUpOutcome, TopUpPoller, TopUpStatusSource};
use crate::wallet::rest::WalletRestClient;
use crate::wallet::types::{PaymentIntent, TopUpCreateRequest};

/// Server calls the top-up flow depends on, separated so the flow can be
/// exercised against fakes.
#[async_trait]
pub trait TopUpBackend: Send + Sync {
    async fn balance(&self) -> Result<u64, WalletApiError>;
    async fn quote_fee(&self, amount: u64) -> Result<u64, WalletApiError>;
    async fn create(&self, req: &TopUpCreateRequest) -> Result<PaymentIntent, WalletApiError>;
}

#[async_trait]
impl TopUpBackend for WalletRestClient {
    async fn balance(&self) -> Result<u64, WalletApiError> {
        WalletRestClient::balance(self).await
    }

    async fn quote_fee(&self, amount: u64) -> Result<u64, WalletApiError> {
        self.calculate_fee(amount, TransactionKind::TopUp).await
    }

    async fn create(&self, req: &TopUpCreateRequest) -> Result<PaymentIntent, WalletApiError> {
        self.create_topup(req).await
    }
}

pub struct TopUpFlow {
    backend: Arc<dyn TopUpBackend>,
    cfg: WalletSettings,
    poller: Arc<TopUpPoller>,
}

impl TopUpFlow {
    pub fn new(rest: WalletRestClient, cfg: WalletSettings) -> Self {
        let source: Arc<dyn TopUpStatusSource> = Arc::new(rest.clone());
        Self::with_backend(Arc::new(rest), source, cfg)
    }

    pub fn with_backend(
        backend: Arc<dyn TopUpBackend>,
        source: Arc<dyn TopUpStatusSource>,
        cfg: WalletSettings,
    ) -> Self {
        let poller = Arc::new(TopUpPoller::new(source, cfg.poller.clone()));
        Self {
            backend,
            cfg,
            poller,
        }
    }

    /// Handle to the confirmation poller, for subscribing to phase updates
    /// and for cancellation.
    pub fn poller(&self) -> Arc<TopUpPoller> {
        Arc::clone(&self.poller)
    }

    /// Fee breakdown for display before submission, reconciled against the
    /// server's quote.
    pub async fn preview(&self, amount: u64) -> Result<FeeBreakdown, WalletApiError> {
        self.validate_amount(amount)?;
        let mut breakdown = estimate_fee(amount, TransactionKind::TopUp, &self.cfg.fee_policy);
        let fee = self.reconciled_fee(amount, breakdown.fee).await;
        if fee != breakdown.fee {
            breakdown.fee = fee;
            breakdown.total = amount + fee;
        }
        Ok(breakdown)
    }

    /// Validate and submit a top-up, returning the payment intent. The
    /// caller must not treat the top-up as complete at this point; call
    /// [`TopUpFlow::confirm`] to poll for the terminal state.
    pub async fn initiate(
        &self,
        amount: u64,
        payment_method_id: &str,
    ) -> Result<PaymentIntent, WalletApiError> {
        self.validate_amount(amount)?;
        let method = find_method(payment_method_id).ok_or_else(|| WalletApiError::Validation {
            field: "paymentMethod",
            message: format!("unknown payment method {payment_method_id}"),
        })?;

        let local = estimate_fee(amount, TransactionKind::TopUp, &self.cfg.fee_policy);
        let fee = self.reconciled_fee(amount, local.fee).await;
        if fee > 0 {
            let available = self.backend.balance().await?;
            if fee > available {
                return Err(WalletApiError::InsufficientFunds {
                    required: fee,
                    available,
                });
            }
        }

        if !self.poller.try_begin() {
            return Err(WalletApiError::Validation {
                field: "topup",
                message: "another top-up confirmation is already in progress".to_string(),
            });
        }

        let req = TopUpCreateRequest {
            amount,
            payment_method: method.id.to_string(),
        };
        let intent = match self.backend.create(&req).await {
            Ok(intent) => intent,
            Err(err) => {
                self.poller.reset();
                return Err(err);
            }
        };
        info!(
            target: "topup",
            reference_id = %intent.reference_id,
            amount,
            fee,
            payment_method = %method.id,
            redirect = intent.is_redirect_required,
            "top-up created"
        );
        Ok(intent)
    }

    /// Poll the created intent until it reaches a terminal state, the
    /// attempt budget runs out, or the session is cancelled.
    pub async fn confirm(&self, intent: &PaymentIntent) -> Result<TopUpOutcome, WalletApiError> {
        self.poller.run(&intent.reference_id).await
    }

    /// Initiate and confirm in one call.
    pub async fn execute(
        &self,
        amount: u64,
        payment_method_id: &str,
    ) -> Result<TopUpOutcome, WalletApiError> {
        let intent = self.initiate(amount, payment_method_id).await?;
        self.confirm(&intent).await
    }

    fn validate_amount(&self, amount: u64) -> Result<(), WalletApiError> {
        if amount < self.cfg.min_topup_amount || amount > self.cfg.max_topup_amount {
            return Err(WalletApiError::Validation {
                field: "amount",
                message: format!(
                    "amount must be between {} and {}",
                    self.cfg.min_topup_amount, self.cfg.max_topup_amount
                ),
            });
        }
        Ok(())
    }

    // Local estimate checked against the server's quote; the server value
    // wins on mismatch. A failed quote call falls back to the local
    // estimate so a stale fee table never blocks the transaction.
    async fn reconciled_fee(&self, amount: u64, local_fee: u64) -> u64 {
        match self.backend.quote_fee(amount).await {
            Ok(server_fee) => {
                if server_fee != local_fee {
                    warn!(
                        target: "topup",
                        amount,
                        client_fee = local_fee,
                        server_fee,
                        "fee mismatch, using server value"
                    );
                }
                server_fee
            }
            Err(err) => {
                debug!(
                    target: "topup",
                    amount,
                    error = %err,
                    "fee quote unavailable, using local estimate"
                );
                local_fee
            }
        }
    }
}
