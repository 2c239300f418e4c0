//! Checkout module.
//!
//! Contains the order record, the checkout engine and payment intents.

mod engine;
mod order;
mod payment;

pub use engine::{CheckoutEngine, MAX_ORDER_ID_ATTEMPTS};
pub use order::{Order, OrderLine, OrderStatus};
pub use payment::{Payee, PaymentApp, PaymentIntent};
