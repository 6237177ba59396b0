// Auth flows: register, login with OTP verification, password management.
// These are the only writers of the session store; every other flow just
// reads the token from it.

use std::sync::Arc;
use tracing::info;

use crate::wallet::errors::WalletApiError;
use crate::wallet::rest::WalletRestClient;
use crate::wallet::session::{Session, SessionStore};
use crate::wallet::types::{
    AuthData, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, OtpKind,
    RegisterRequest, ResendOtpRequest, ResetPasswordRequest, VerifyOtpRequest,
};

/// Result of a login attempt: either a live session, or a signal that the
/// account still needs OTP verification.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Session(Session),
    NeedsVerification { email: String },
}

#[derive(Clone)]
pub struct AuthFlow {
    rest: WalletRestClient,
    session: Arc<dyn SessionStore>,
}

impl AuthFlow {
    pub fn new(rest: WalletRestClient, session: Arc<dyn SessionStore>) -> Self {
        Self { rest, session }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        phone_number: &str,
    ) -> Result<Session, WalletApiError> {
        require_field("name", name)?;
        require_email(email)?;
        require_field("password", password)?;
        require_field("phoneNumber", phone_number)?;

        let data = self
            .rest
            .register(&RegisterRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                phone_number: phone_number.to_string(),
            })
            .await?;
        Ok(self.store_session(data))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, WalletApiError> {
        require_email(email)?;
        require_field("password", password)?;

        let resp = self
            .rest
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        if resp.needs_verification.unwrap_or(false) {
            let email = resp.email.unwrap_or_else(|| email.to_string());
            info!(target: "auth", email = %email, "account needs OTP verification");
            return Ok(LoginOutcome::NeedsVerification { email });
        }
        let data = resp
            .data
            .ok_or_else(|| WalletApiError::Decode("missing data in login response".to_string()))?;
        Ok(LoginOutcome::Session(self.store_session(data)))
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<Session, WalletApiError> {
        require_email(email)?;
        require_otp(otp)?;

        let data = self
            .rest
            .verify_otp(&VerifyOtpRequest {
                email: email.to_string(),
                otp: otp.to_string(),
            })
            .await?;
        Ok(self.store_session(data))
    }

    pub async fn resend_otp(&self, email: &str, kind: OtpKind) -> Result<String, WalletApiError> {
        require_email(email)?;
        self.rest
            .resend_otp(&ResendOtpRequest {
                email: email.to_string(),
                kind,
            })
            .await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<String, WalletApiError> {
        require_email(email)?;
        self.rest
            .forgot_password(&ForgotPasswordRequest {
                email: email.to_string(),
            })
            .await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<String, WalletApiError> {
        require_email(email)?;
        require_otp(otp)?;
        require_field("newPassword", new_password)?;
        self.rest
            .reset_password(&ResetPasswordRequest {
                email: email.to_string(),
                otp: otp.to_string(),
                new_password: new_password.to_string(),
            })
            .await
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<String, WalletApiError> {
        require_field("oldPassword", old_password)?;
        require_field("newPassword", new_password)?;
        self.rest
            .change_password(&ChangePasswordRequest {
                old_password: old_password.to_string(),
                new_password: new_password.to_string(),
            })
            .await
    }

    /// Drop the token and profile together. Local only; the server keeps
    /// no session state worth revoking.
    pub fn logout(&self) {
        self.session.clear();
        info!(target: "auth", "session cleared");
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session.get()
    }

    fn store_session(&self, data: AuthData) -> Session {
        let session = Session {
            token: data.token.clone(),
            profile: data.profile(),
        };
        self.session.set(session.clone());
        info!(target: "auth", user_id = %session.profile.id, "session established");
        session
    }
}

fn require_field(field: &'static str, value: &str) -> Result<(), WalletApiError> {
    if value.trim().is_empty() {
        return Err(WalletApiError::Validation {
            field,
            message: format!("{field} is required"),
        });
    }
    Ok(())
}

fn require_email(email: &str) -> Result<(), WalletApiError> {
    require_field("email", email)?;
    if !email.contains('@') {
        return Err(WalletApiError::Validation {
            field: "email",
            message: "email is not valid".to_string(),
        });
    }
    Ok(())
}

fn require_otp(otp: &str) -> Result<(), WalletApiError> {
    if otp.len() != 6 || !otp.chars().all(|c| c.is_ascii_digit()) {
        return Err(WalletApiError::Validation {
            field: "otp",
            message: "OTP must be 6 digits".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_must_be_six_digits() {
        assert!(require_otp("123456").is_ok());
        assert!(require_otp("12345").is_err());
        assert!(require_otp("1234567").is_err());
        assert!(require_otp("12345a").is_err());
        assert!(require_otp("").is_err());
    }

    #[test]
    fn email_needs_an_at_sign() {
        assert!(require_email("user@example.com").is_ok());
        assert!(require_email("userexample.com").is_err());
        assert!(require_email("   ").is_err());
    }

    #[test]
    fn blank_fields_are_rejected() {
        let err = require_field("password", " ").unwrap_err();
        match err {
            WalletApiError::Validation { field, .. } => assert_eq!(field, "password"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
