use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PRICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]{3})(\d+(?:\.\d+)?)$").expect("regex for prices"));

/// A vendor price string split into currency and amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub currency: String,
    pub amount: f64,
}

impl Price {
    /// Split `UAH1000.50` into `UAH` and `1000.50`.
    ///
    /// Returns `None` for anything without a three-letter currency followed by
    /// a plain decimal amount.
    pub fn parse(text: &str) -> Option<Price> {
        let caps = PRICE.captures(text.trim())?;
        let amount = caps.get(2)?.as_str().parse::<f64>().ok()?;
        Some(Price {
            currency: caps.get(1)?.as_str().to_string(),
            amount,
        })
    }

    /// Price string with this currency and a zero amount.
    pub fn zero_like(text: &str) -> Option<String> {
        Price::parse(text).map(|price| format!("{}0", price.currency))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.currency, self.amount)
    }
}
