// Wallet API client module

pub mod auth;
pub mod errors;
pub mod fees;
pub mod methods;
pub mod poller;
pub mod rest;
pub mod session;
pub mod topup;
pub mod transfer;
pub mod types;
pub mod withdraw;

use reqwest::Client;
use std::sync::Arc;

use crate::settings::WalletSettings;
use self::auth::AuthFlow;
use self::errors::WalletApiError;
use self::fees::TransactionKind;
use self::rest::WalletRestClient;
use self::session::{InMemorySessionStore, SessionStore};
use self::topup::TopUpFlow;
use self::transfer::TransferFlow;
use self::types::TransactionPage;
use self::withdraw::WithdrawFlow;

/// Aggregate entry point: one HTTP client, one session store, and the
/// per-operation flows built over them.
#[derive(Clone)]
pub struct WalletProvider {
    pub(crate) cfg: WalletSettings,
    pub(crate) rest: WalletRestClient,
    pub(crate) session: Arc<dyn SessionStore>,
    auth: AuthFlow,
    topup: Arc<TopUpFlow>,
    transfer: TransferFlow,
    withdraw: WithdrawFlow,
}

impl std::fmt::Debug for WalletProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletProvider")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl WalletProvider {
    /// Build with the default in-memory session store.
    pub fn new(cfg: WalletSettings) -> Result<Self, WalletApiError> {
        Self::with_session_store(cfg, Arc::new(InMemorySessionStore::new()))
    }

    // Build reqwest client with rustls and timeout from cfg, store cfg clone.
    pub fn with_session_store(
        cfg: WalletSettings,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self, WalletApiError> {
        if cfg.base_url.trim().is_empty() {
            return Err(WalletApiError::Validation {
                field: "baseUrl",
                message: "wallet API base url is not configured".to_string(),
            });
        }
        let timeout = std::time::Duration::from_millis(if cfg.timeout_ms > 0 {
            cfg.timeout_ms
        } else {
            15_000
        });
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| WalletApiError::Transport(e.to_string()))?;

        let rest = WalletRestClient::new(http, cfg.base_url.clone(), Arc::clone(&session));

        let auth = AuthFlow::new(rest.clone(), Arc::clone(&session));
        let topup = Arc::new(TopUpFlow::new(rest.clone(), cfg.clone()));
        let transfer = TransferFlow::new(rest.clone());
        let withdraw = WithdrawFlow::new(rest.clone());

        Ok(Self {
            cfg,
            rest,
            session,
            auth,
            topup,
            transfer,
            withdraw,
        })
    }

    pub fn settings(&self) -> &WalletSettings {
        &self.cfg
    }

    pub fn rest(&self) -> &WalletRestClient {
        &self.rest
    }

    pub fn session(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.session)
    }

    pub fn auth(&self) -> &AuthFlow {
        &self.auth
    }

    /// The top-up flow is shared: its poller session must survive across
    /// calls so cancellation and phase observation keep working.
    pub fn topup(&self) -> Arc<TopUpFlow> {
        Arc::clone(&self.topup)
    }

    pub fn transfer(&self) -> &TransferFlow {
        &self.transfer
    }

    pub fn withdraw(&self) -> &WithdrawFlow {
        &self.withdraw
    }

    pub async fn balance(&self) -> Result<u64, WalletApiError> {
        self.rest.balance().await
    }

    pub async fn transactions(
        &self,
        page: u32,
        limit: u32,
        kind: Option<TransactionKind>,
    ) -> Result<TransactionPage, WalletApiError> {
        self.rest.transactions(page, limit, kind).await
    }
}
