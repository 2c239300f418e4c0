//! UPI payment intents.
//!
//! A committed order is handed to a payment app as a deep link. Nothing
//! here confirms settlement.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::checkout::Order;
use crate::error::CommerceError;
use crate::money::Money;

/// Payment apps the storefront can launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentApp {
    PhonePe,
    GooglePay,
    Paytm,
}

impl PaymentApp {
    pub const ALL: [PaymentApp; 3] = [PaymentApp::PhonePe, PaymentApp::GooglePay, PaymentApp::Paytm];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentApp::PhonePe => "phonepe",
            PaymentApp::GooglePay => "googlepay",
            PaymentApp::Paytm => "paytm",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentApp::PhonePe => "PhonePe",
            PaymentApp::GooglePay => "Google Pay",
            PaymentApp::Paytm => "Paytm",
        }
    }

    /// Deep-link base of the app's pay intent.
    pub fn scheme(&self) -> &'static str {
        match self {
            PaymentApp::PhonePe => "phonepe://pay",
            PaymentApp::GooglePay => "tez://upi/pay",
            PaymentApp::Paytm => "paytmmp://pay",
        }
    }

}

impl FromStr for PaymentApp {
    type Err = CommerceError;

    /// Accepts any case and ignores spaces, dashes and underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '-', '_'], "").as_str() {
            "phonepe" => Ok(PaymentApp::PhonePe),
            "googlepay" | "gpay" | "tez" => Ok(PaymentApp::GooglePay),
            "paytm" => Ok(PaymentApp::Paytm),
            _ => {
                let known: Vec<&str> = PaymentApp::ALL.iter().map(|a| a.as_str()).collect();
                Err(CommerceError::Validation(format!(
                    "unknown payment app '{s}' (expected one of: {})",
                    known.join(", ")
                )))
            }
        }
    }
}

impl std::fmt::Display for PaymentApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Who gets paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payee {
    /// UPI virtual payment address.
    pub upi_id: String,
    /// Name shown in the payment app.
    pub name: String,
}

impl Payee {
    pub fn new(upi_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            upi_id: upi_id.into(),
            name: name.into(),
        }
    }
}

/// The `{amount, transaction note, payee}` handed to a payment app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub amount: Money,
    pub transaction_note: String,
    pub payee_id: String,
    pub payee_name: String,
}

impl PaymentIntent {
    pub fn for_order(order: &Order, payee: &Payee) -> Self {
        Self {
            amount: order.total,
            transaction_note: format!("{} Order {}", payee.name, order.id),
            payee_id: payee.upi_id.clone(),
            payee_name: payee.name.clone(),
        }
    }

    /// Format the intent as a deep link for `app`.
    pub fn deep_link(&self, app: PaymentApp) -> Result<String, CommerceError> {
        let mut url = Url::parse(app.scheme())
            .map_err(|e| CommerceError::Validation(format!("{}: {e}", app.scheme())))?;

        url.query_pairs_mut()
            .append_pair("pa", &self.payee_id)
            .append_pair("pn", &self.payee_name)
            .append_pair("am", &self.amount.amount().to_string())
            .append_pair("tn", &self.transaction_note);

        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::OrderLine;
    use chrono::Utc;

    fn intent() -> PaymentIntent {
        let lines = vec![OrderLine::new("p1".into(), "Lays", 2, Money::new(20)).unwrap()];
        let order = Order::new("ORD-ABC123".into(), "user-1".into(), Utc::now(), lines).unwrap();
        PaymentIntent::for_order(&order, &Payee::new("9392965097@ybl", "OmniStore"))
    }

    #[test]
    fn test_intent_from_order() {
        let intent = intent();
        assert_eq!(intent.amount, Money::new(40));
        assert_eq!(intent.transaction_note, "OmniStore Order ORD-ABC123");
        assert_eq!(intent.payee_id, "9392965097@ybl");
    }

    #[test]
    fn test_deep_links_per_app() {
        let intent = intent();

        let phonepe = intent.deep_link(PaymentApp::PhonePe).unwrap();
        assert!(phonepe.starts_with("phonepe://pay?"));
        assert!(phonepe.contains("pa=9392965097%40ybl"));
        assert!(phonepe.contains("pn=OmniStore"));
        assert!(phonepe.contains("am=40"));
        assert!(phonepe.contains("tn=OmniStore+Order+ORD-ABC123"));

        assert!(intent
            .deep_link(PaymentApp::GooglePay)
            .unwrap()
            .starts_with("tez://upi/pay?"));
        assert!(intent
            .deep_link(PaymentApp::Paytm)
            .unwrap()
            .starts_with("paytmmp://pay?"));
    }

    #[test]
    fn test_payment_app_from_str() {
        assert_eq!("PhonePe".parse::<PaymentApp>().unwrap(), PaymentApp::PhonePe);
        assert_eq!("google-pay".parse::<PaymentApp>().unwrap(), PaymentApp::GooglePay);
        assert_eq!("paytm".parse::<PaymentApp>().unwrap(), PaymentApp::Paytm);

        let err = "venmo".parse::<PaymentApp>().unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
        assert!(err.to_string().contains("expected one of: phonepe"));
    }
}
