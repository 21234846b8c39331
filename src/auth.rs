use crate::config::AdminConfig;
use argon2::{password_hash::PasswordHashString, PasswordVerifier};
use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

/// Verifies admin bearer tokens against the configured argon2 hash.
#[derive(Debug)]
pub struct Auth {
    token_hash: PasswordHashString,
}

impl Auth {
    pub fn new(AdminConfig { token_hash }: AdminConfig) -> Result<Self, AuthError> {
        let token_hash =
            PasswordHashString::new(&token_hash).map_err(|_| AuthError::InvalidHash)?;
        Ok(Self { token_hash })
    }

    pub fn verify_token(&self, token: &str) -> bool {
        argon2::Argon2::default()
            .verify_password(token.as_bytes(), &self.token_hash.password_hash())
            .is_ok()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Admin token required for requested resource")]
    MissingToken,

    #[error("Invalid admin token")]
    InvalidToken,

    #[error("Configured admin token hash is not a valid PHC string")]
    InvalidHash,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::MissingToken | Self::InvalidToken => {
                (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
            }
            Self::InvalidHash => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}
