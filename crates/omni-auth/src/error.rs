//! Authentication errors.

use omni_cache::ErrorKind;
use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Email/password pair did not match a user.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A user with this email already exists.
    #[error("account already exists: {0}")]
    DuplicateAccount(String),

    /// Login or registration attempted before passing the OTP gate.
    #[error("phone number not verified")]
    PhoneNotVerified,

    /// Input does not normalize to a 10-digit phone number.
    #[error("invalid phone number: expected 10 digits")]
    InvalidPhoneFormat,

    /// No unconsumed challenge exists for the phone.
    #[error("no active OTP challenge")]
    NoActiveChallenge,

    /// The challenge is past its window.
    #[error("OTP expired")]
    Expired,

    /// The submitted code is wrong.
    #[error("OTP does not match")]
    CodeMismatch,

    /// Too many wrong codes; a new challenge is needed.
    #[error("too many failed attempts")]
    TooManyAttempts,

    /// The OTP provider could not deliver the code.
    #[error("OTP delivery failed: {0}")]
    Delivery(String),

    /// Malformed input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Cache error.
    #[error("cache error: {0}")]
    Cache(#[from] omni_cache::CacheError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::PhoneNotVerified
            | AuthError::InvalidPhoneFormat
            | AuthError::CodeMismatch
            | AuthError::Validation(_) => ErrorKind::Validation,
            AuthError::NoActiveChallenge => ErrorKind::NotFound,
            AuthError::DuplicateAccount(_) | AuthError::TooManyAttempts => ErrorKind::Conflict,
            AuthError::Expired => ErrorKind::Expired,
            AuthError::Cache(e) => match e.kind() {
                ErrorKind::Conflict => ErrorKind::Conflict,
                _ => ErrorKind::Transport,
            },
            AuthError::Delivery(_) | AuthError::Serialization(_) | AuthError::Internal(_) => {
                ErrorKind::Transport
            }
        }
    }

    /// Check if this is an authentication failure.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::PhoneNotVerified
                | AuthError::CodeMismatch
                | AuthError::Expired
                | AuthError::NoActiveChallenge
                | AuthError::TooManyAttempts
        )
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        AuthError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(AuthError::Expired.kind(), ErrorKind::Expired);
        assert_eq!(AuthError::NoActiveChallenge.kind(), ErrorKind::NotFound);
        assert_eq!(
            AuthError::DuplicateAccount("a@b.c".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(AuthError::Delivery("down".into()).kind(), ErrorKind::Transport);
        assert_eq!(AuthError::InvalidPhoneFormat.kind(), ErrorKind::Validation);
    }
}
