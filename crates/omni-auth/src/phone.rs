//! Phone number normalization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::AuthError;

/// Country calling code prepended for the SMS provider.
pub const COUNTRY_CODE: &str = "91";

/// Digits in a national mobile number.
pub const PHONE_DIGITS: usize = 10;

/// A mobile number reduced to its 10 national digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Strip everything but digits and require exactly ten of them.
    ///
    /// ```
    /// use omni_auth::PhoneNumber;
    ///
    /// let phone = PhoneNumber::normalize("98765 43210").unwrap();
    /// assert_eq!(phone.as_str(), "9876543210");
    /// assert_eq!(phone.international(), "919876543210");
    /// ```
    pub fn normalize(input: &str) -> Result<Self, AuthError> {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();
        if digits.len() != PHONE_DIGITS {
            return Err(AuthError::InvalidPhoneFormat);
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Country code plus national digits, as the SMS provider expects.
    pub fn international(&self) -> String {
        format!("{COUNTRY_CODE}{}", self.0)
    }

    /// Last four digits with the rest hidden, for logs.
    pub fn masked(&self) -> String {
        format!("******{}", &self.0[PHONE_DIGITS - 4..])
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PhoneNumber {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = AuthError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::normalize(&s)
    }
}

impl From<PhoneNumber> for String {
    fn from(p: PhoneNumber) -> Self {
        p.0
    }
}
