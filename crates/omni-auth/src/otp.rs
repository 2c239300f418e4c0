//! Phone one-time-password challenges.
//!
//! One challenge per phone lives at `otp:{phone}`. Issuing replaces whatever
//! was there; verifying consumes it through a compare-and-swap, so of two
//! racing verifies with the right code exactly one succeeds.
//!
//! ```text
//! NoChallenge --issue--> Issued --verify(ok)--> Verified
//!                          |  ^
//!                          |  +--resend
//!                          +--ttl--> Expired
//! ```

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use omni_cache::{cache_key, Cache};
use omni_commerce::clock::SharedClock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::delivery::{LocalDelivery, OtpDelivery};
use crate::password::constant_time_compare;
use crate::{AuthError, PhoneNumber};

/// Digits in a code.
pub const CODE_LENGTH: usize = 6;

/// Default validity window in seconds.
pub const DEFAULT_OTP_TTL_SECS: i64 = 600;

/// Default number of wrong codes before a challenge locks.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Whether the issued code is returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OtpMode {
    /// Test mode: the code comes back in the [`DeliveryInstruction`].
    #[default]
    Local,
    /// The code only reaches the shopper through the provider.
    Provider,
}

impl OtpMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpMode::Local => "local",
            OtpMode::Provider => "provider",
        }
    }
}

impl FromStr for OtpMode {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(OtpMode::Local),
            "provider" => Ok(OtpMode::Provider),
            other => Err(AuthError::Validation(format!("unknown OTP mode: {other}"))),
        }
    }
}

/// OTP verifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OtpConfig {
    pub ttl_secs: i64,
    pub max_attempts: u32,
    pub mode: OtpMode,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_OTP_TTL_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            mode: OtpMode::default(),
        }
    }
}

impl OtpConfig {
    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_secs)
    }

    pub fn with_mode(mut self, mode: OtpMode) -> Self {
        self.mode = mode;
        self
    }
}

/// A stored challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpChallenge {
    pub phone: PhoneNumber,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub consumed: bool,
    #[serde(default)]
    pub failed_attempts: u32,
}

impl OtpChallenge {
    fn new(phone: PhoneNumber, code: String, issued_at: DateTime<Utc>) -> Self {
        Self {
            phone,
            code,
            issued_at,
            consumed: false,
            failed_attempts: 0,
        }
    }

    pub fn expires_at(&self, ttl: Duration) -> DateTime<Utc> {
        self.issued_at + ttl
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.issued_at > ttl
    }
}

/// What the caller learns after issuing a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryInstruction {
    pub phone: PhoneNumber,
    pub expires_at: DateTime<Utc>,
    pub mode: OtpMode,
    /// Present only in [`OtpMode::Local`].
    pub code: Option<String>,
}

/// Proof that a phone passed verification.
///
/// Only [`OtpVerifier::verify`] can create one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPhone {
    phone: PhoneNumber,
    verified_at: DateTime<Utc>,
}

impl VerifiedPhone {
    pub(crate) fn new(phone: PhoneNumber, verified_at: DateTime<Utc>) -> Self {
        Self { phone, verified_at }
    }

    pub fn phone(&self) -> &PhoneNumber {
        &self.phone
    }

    pub fn verified_at(&self) -> DateTime<Utc> {
        self.verified_at
    }
}

/// Issues and checks phone codes.
#[derive(Clone)]
pub struct OtpVerifier {
    cache: Cache,
    delivery: Arc<dyn OtpDelivery>,
    clock: SharedClock,
    config: OtpConfig,
}

impl std::fmt::Debug for OtpVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpVerifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OtpVerifier {
    pub fn new(
        cache: Cache,
        delivery: Arc<dyn OtpDelivery>,
        clock: SharedClock,
        config: OtpConfig,
    ) -> Self {
        Self {
            cache,
            delivery,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// Issue a fresh code for `phone`, replacing any earlier one.
    #[instrument(skip_all)]
    pub async fn issue(&self, phone: &str) -> Result<DeliveryInstruction, AuthError> {
        let phone = PhoneNumber::normalize(phone)?;
        self.issue_for(&phone).await
    }

    /// Replace the current code with a new, different one.
    #[instrument(skip_all)]
    pub async fn resend(&self, phone: &str) -> Result<DeliveryInstruction, AuthError> {
        let phone = PhoneNumber::normalize(phone)?;
        tracing::debug!(phone = %phone.masked(), "OTP resend requested");
        self.issue_for(&phone).await
    }

    /// Check `code` against the active challenge and consume it on success.
    #[instrument(skip_all)]
    pub async fn verify(&self, phone: &str, code: &str) -> Result<VerifiedPhone, AuthError> {
        let phone = PhoneNumber::normalize(phone)?;
        let code = code.trim();
        if code.len() != CODE_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(AuthError::Validation(format!(
                "code must be {CODE_LENGTH} digits"
            )));
        }

        let now = self.clock.now();
        let ttl = self.config.ttl();
        let max_attempts = self.config.max_attempts;
        let mut mismatch = false;

        let result = self
            .cache
            .update::<OtpChallenge, _, AuthError>(&Self::challenge_key(&phone), |current| {
                mismatch = false;
                let mut challenge = match current {
                    Some(c) if !c.consumed => c,
                    _ => return Err(AuthError::NoActiveChallenge),
                };
                if challenge.is_expired(now, ttl) {
                    return Err(AuthError::Expired);
                }
                if challenge.failed_attempts >= max_attempts {
                    return Err(AuthError::TooManyAttempts);
                }

                if constant_time_compare(challenge.code.as_bytes(), code.as_bytes()) {
                    challenge.consumed = true;
                } else {
                    challenge.failed_attempts += 1;
                    mismatch = true;
                }
                Ok(Some(challenge))
            })
            .await;

        if let Err(e) = result {
            tracing::warn!(phone = %phone.masked(), error = %e, "OTP verification failed");
            return Err(e);
        }
        if mismatch {
            tracing::warn!(phone = %phone.masked(), "OTP code mismatch");
            return Err(AuthError::CodeMismatch);
        }

        tracing::info!(phone = %phone.masked(), "phone verified");
        Ok(VerifiedPhone::new(phone, now))
    }

    /// The stored challenge for `phone`, consumed or not.
    pub async fn challenge(&self, phone: &PhoneNumber) -> Result<Option<OtpChallenge>, AuthError> {
        Ok(self.cache.get(&Self::challenge_key(phone)).await?)
    }

    async fn issue_for(&self, phone: &PhoneNumber) -> Result<DeliveryInstruction, AuthError> {
        let key = Self::challenge_key(phone);
        let now = self.clock.now();
        let mut previous: Option<OtpChallenge> = None;

        let challenge = self
            .cache
            .update::<OtpChallenge, _, AuthError>(&key, |current| {
                let code = generate_code(current.as_ref().map(|c| c.code.as_str()));
                previous = current;
                Ok(Some(OtpChallenge::new(phone.clone(), code, now)))
            })
            .await?
            .ok_or_else(|| AuthError::Internal("challenge was not written".into()))?;

        // Local mode hands the code back to the caller and never reaches the
        // provider.
        let delivered = match self.config.mode {
            OtpMode::Local => LocalDelivery.deliver(phone, &challenge.code).await,
            OtpMode::Provider => self.delivery.deliver(phone, &challenge.code).await,
        };
        if let Err(e) = delivered {
            tracing::warn!(phone = %phone.masked(), error = %e, "OTP delivery failed");
            self.restore(&key, &challenge, previous).await;
            return Err(e);
        }

        tracing::info!(phone = %phone.masked(), mode = self.config.mode.as_str(), "OTP issued");

        let code = match self.config.mode {
            OtpMode::Local => Some(challenge.code.clone()),
            OtpMode::Provider => None,
        };
        Ok(DeliveryInstruction {
            expires_at: challenge.expires_at(self.config.ttl()),
            phone: challenge.phone,
            mode: self.config.mode,
            code,
        })
    }

    /// Put back the challenge that `ours` replaced, unless someone has
    /// already written over `ours`.
    async fn restore(&self, key: &str, ours: &OtpChallenge, previous: Option<OtpChallenge>) {
        let result = self
            .cache
            .update::<OtpChallenge, _, AuthError>(key, |current| match current {
                Some(c) if &c == ours => Ok(previous.clone()),
                other => Ok(other),
            })
            .await;

        if let Err(e) = result {
            tracing::error!(key, error = %e, "failed to restore previous OTP challenge");
        }
    }

    fn challenge_key(phone: &PhoneNumber) -> String {
        cache_key!("otp", phone)
    }
}

/// A uniformly random six-digit code that differs from `previous`.
fn generate_code(previous: Option<&str>) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let code = rng.gen_range(100_000..=999_999u32).to_string();
        if previous != Some(code.as_str()) {
            return code;
        }
    }
}
