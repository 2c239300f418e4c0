//! Identity for OmniStore.
//!
//! Provides the phone OTP gate, the user directory, and the per-session
//! identity state machine built on top of them.
//!
//! # Example
//!
//! ```rust,ignore
//! use omni_auth::prelude::*;
//!
//! let instruction = otp.issue("98765 43210").await?;
//! let proof = otp.verify("9876543210", &instruction.code.unwrap()).await?;
//! sessions.mark_verified(&session_id, proof).await?;
//! sessions.login(&session_id, "admin@omnistore.com", "admin123").await?;
//! ```

mod delivery;
mod directory;
mod error;
mod otp;
mod password;
mod phone;
mod session;
mod user;

pub use delivery::{LocalDelivery, OtpDelivery, RecordingDelivery, SentMessage};
pub use directory::{KvUserDirectory, UserDirectory, ADMIN_USER_ID};
pub use error::AuthError;
pub use otp::{
    DeliveryInstruction, OtpChallenge, OtpConfig, OtpMode, OtpVerifier, VerifiedPhone,
    CODE_LENGTH, DEFAULT_MAX_ATTEMPTS, DEFAULT_OTP_TTL_SECS,
};
pub use password::{PasswordHasher, MIN_PASSWORD_LENGTH};
pub use phone::{PhoneNumber, COUNTRY_CODE, PHONE_DIGITS};
pub use session::{SessionConfig, SessionManager, SessionRecord, SessionState};
pub use user::{Role, User, UserRecord};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AuthError, DeliveryInstruction, KvUserDirectory, OtpConfig, OtpMode, OtpVerifier,
        PhoneNumber, Role, SessionManager, SessionState, User, UserDirectory, VerifiedPhone,
    };
}
