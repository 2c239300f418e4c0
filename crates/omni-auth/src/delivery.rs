//! OTP delivery providers.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::{AuthError, PhoneNumber};

/// Sends a one-time code to a phone.
#[async_trait]
pub trait OtpDelivery: Send + Sync {
    /// Deliver `code` to `phone`. An error means the shopper never got it.
    async fn deliver(&self, phone: &PhoneNumber, code: &str) -> Result<(), AuthError>;
}

/// Logs the send instead of contacting a provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDelivery;

#[async_trait]
impl OtpDelivery for LocalDelivery {
    async fn deliver(&self, phone: &PhoneNumber, _code: &str) -> Result<(), AuthError> {
        tracing::info!(phone = %phone.masked(), "simulated OTP delivery");
        Ok(())
    }
}

/// A message captured by [`RecordingDelivery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Country code plus national digits.
    pub to: String,
    pub code: String,
}

/// Captures every message; can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingDelivery {
    sent: Mutex<Vec<SentMessage>>,
    failing: AtomicBool,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent deliveries fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Most recent code sent to `phone`.
    pub fn last_code_for(&self, phone: &PhoneNumber) -> Option<String> {
        let to = phone.international();
        self.messages()
            .into_iter()
            .rev()
            .find(|m| m.to == to)
            .map(|m| m.code)
    }
}

#[async_trait]
impl OtpDelivery for RecordingDelivery {
    async fn deliver(&self, phone: &PhoneNumber, code: &str) -> Result<(), AuthError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuthError::Delivery("provider unavailable".into()));
        }
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(SentMessage {
                to: phone.international(),
                code: code.to_string(),
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_delivery_captures() {
        let delivery = RecordingDelivery::new();
        let phone = PhoneNumber::normalize("9876543210").unwrap();

        delivery.deliver(&phone, "111111").await.unwrap();
        delivery.deliver(&phone, "222222").await.unwrap();

        assert_eq!(delivery.messages().len(), 2);
        assert_eq!(delivery.messages()[0].to, "919876543210");
        assert_eq!(delivery.last_code_for(&phone).as_deref(), Some("222222"));
    }

    #[tokio::test]
    async fn test_recording_delivery_failure() {
        let delivery = RecordingDelivery::new();
        let phone = PhoneNumber::normalize("9876543210").unwrap();
        delivery.set_failing(true);

        assert!(matches!(
            delivery.deliver(&phone, "111111").await,
            Err(AuthError::Delivery(_))
        ));
        assert!(delivery.messages().is_empty());
    }

    #[tokio::test]
    async fn test_local_delivery_succeeds() {
        let phone = PhoneNumber::normalize("9876543210").unwrap();
        assert!(LocalDelivery.deliver(&phone, "123456").await.is_ok());
    }
}
