// Wallet API error taxonomy and server error envelope mapping.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletApiError {
    /// Client-side, pre-network, field-level failure.
    #[error("validation failed for {field}: {message}")]
    Validation { field: &'static str, message: String },
    /// 401 or needs-verification; callers route back to the auth flow.
    #[error("authentication required: {message}")]
    Auth { message: String },
    /// Client-computed shortfall, checked before any submission.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },
    /// Non-2xx response carrying a server-supplied message.
    #[error("server error: {message}")]
    Server { status: Option<u16>, message: String },
    /// Network-level failure, no server message available.
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
    /// Poller exhausted its attempt budget without a terminal status.
    #[error("payment confirmation timed out after {attempts} attempts")]
    PollTimeout { attempts: u32 },
}

impl WalletApiError {
    /// Message suitable for direct display. Server messages are surfaced
    /// verbatim; transport and decode failures get a generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            WalletApiError::Validation { message, .. } => message.clone(),
            WalletApiError::Auth { message } => message.clone(),
            WalletApiError::InsufficientFunds { .. } => "Insufficient balance".to_string(),
            WalletApiError::Server { message, .. } if !message.is_empty() => message.clone(),
            WalletApiError::Server { .. } | WalletApiError::Transport(_) | WalletApiError::Decode(_) => {
                "Something went wrong, please try again".to_string()
            }
            WalletApiError::PollTimeout { .. } => {
                "Payment confirmation timed out, check your transaction history".to_string()
            }
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, WalletApiError::Auth { .. })
    }
}

// Server error envelope: either { "message": ... } or { "error": ... },
// sometimes both. Decoded here once so callers never probe response shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiErrorEnvelope {
    pub fn into_api_error(self, status: Option<u16>) -> WalletApiError {
        let message = self
            .message
            .or(self.error)
            .unwrap_or_default();
        if status == Some(401) {
            WalletApiError::Auth {
                message: if message.is_empty() {
                    "session expired, please log in again".to_string()
                } else {
                    message
                },
            }
        } else {
            WalletApiError::Server { status, message }
        }
    }
}

pub fn map_error(status: StatusCode, body: &str) -> WalletApiError {
    if let Ok(env) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        env.into_api_error(Some(status.as_u16()))
    } else {
        WalletApiError::Server {
            status: Some(status.as_u16()),
            message: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_prefers_message_field() {
        let env: ApiErrorEnvelope =
            serde_json::from_str(r#"{"message":"Recipient not found","error":"NOT_FOUND"}"#)
                .unwrap();
        match env.into_api_error(Some(404)) {
            WalletApiError::Server { status, message } => {
                assert_eq!(status, Some(404));
                assert_eq!(message, "Recipient not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn envelope_falls_back_to_error_field() {
        let env: ApiErrorEnvelope = serde_json::from_str(r#"{"error":"amount too large"}"#).unwrap();
        match env.into_api_error(Some(400)) {
            WalletApiError::Server { message, .. } => assert_eq!(message, "amount too large"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unauthorized_maps_to_auth() {
        let err = map_error(StatusCode::UNAUTHORIZED, r#"{"message":"token expired"}"#);
        assert!(err.is_auth());
        assert_eq!(err.user_message(), "token expired");
    }

    #[test]
    fn unparseable_body_keeps_status() {
        let err = map_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        match err {
            WalletApiError::Server { status, message } => {
                assert_eq!(status, Some(502));
                assert!(message.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn server_message_surfaces_verbatim() {
        let err = WalletApiError::Server {
            status: Some(400),
            message: "Transfer amount exceeds daily limit".to_string(),
        };
        assert_eq!(err.user_message(), "Transfer amount exceeds daily limit");
    }

    #[test]
    fn transport_gets_generic_fallback() {
        let err = WalletApiError::Transport("connection reset".to_string());
        assert_eq!(err.user_message(), "Something went wrong, please try again");
    }
}
