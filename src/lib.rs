//! Async client for an e-wallet HTTP API.
//!
//! Covers registration and OTP verification, login, balance, top-up with
//! payment-confirmation polling, peer-to-peer transfer, and bank
//! withdrawal. The top-up confirmation is the interesting part: after an
//! intent is created the [`wallet::poller::TopUpPoller`] checks the status
//! endpoint on a fixed cadence until the payment reaches a terminal state,
//! treating transient errors as still-pending and enforcing a bounded
//! attempt budget.
//!
//! ```no_run
//! use ewallet_client::settings::Config;
//! use ewallet_client::wallet::WalletProvider;
//!
//! # async fn demo() -> Result<(), ewallet_client::wallet::errors::WalletApiError> {
//! let cfg = Config::load();
//! let provider = WalletProvider::new(cfg.wallet)?;
//!
//! provider.auth().login("user@example.com", "secret").await?;
//! let topup = provider.topup();
//! let intent = topup.initiate(100_000, "ID_OVO").await?;
//! let outcome = topup.confirm(&intent).await?;
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

pub mod settings;
pub mod wallet;

pub use settings::{Config, PollerSettings, WalletSettings};
pub use wallet::errors::WalletApiError;
pub use wallet::fees::{estimate_fee, FeeBreakdown, FeePolicy, FeeType, TransactionKind};
pub use wallet::methods::{find_method, PaymentMethod, PAYMENT_METHODS};
pub use wallet::poller::{PhaseUpdate, TopUpOutcome, TopUpPhase, TopUpPoller};
pub use wallet::session::{InMemorySessionStore, Session, SessionStore};
pub use wallet::types::{PaymentIntent, TopUpStatus, TopUpStatusSnapshot};
pub use wallet::WalletProvider;
