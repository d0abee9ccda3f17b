//! Audit history and billing records written alongside domain mutations

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// History entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryType {
    DomainUpdate,
}

/// Audit trail entry for a domain mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub repo_id: String,
    pub domain_name: String,
    /// Sponsoring registrar at modification time
    pub registrar_id: String,
    pub history_type: HistoryType,
    pub by_superuser: bool,
    pub requested_by_registrar: bool,
    pub reason: String,
    pub modification_time: DateTime<Utc>,
}

/// Billing event reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingReason {
    ServerStatus,
}

/// One-time charge for a registrar-requested status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingEvent {
    pub id: String,
    pub reason: BillingReason,
    /// Domain name
    pub target_id: String,
    pub registrar_id: String,
    pub cost: Money,
    pub event_time: DateTime<Utc>,
    pub billing_time: DateTime<Utc>,
    /// History entry this charge belongs to
    pub history_id: String,
}

/// Amount of money in minor units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money {
    /// ISO 4217 code
    pub currency: String,
    /// Cents for two-decimal currencies
    pub amount_minor: i64,
}

impl Money {
    #[must_use]
    pub fn new(currency: &str, amount_minor: i64) -> Self {
        Self {
            currency: currency.to_ascii_uppercase(),
            amount_minor,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount_minor < 0 { "-" } else { "" };
        let abs = self.amount_minor.unsigned_abs();
        write!(f, "{} {sign}{}.{:02}", self.currency, abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = CoreError;

    /// Parses `USD 20.00` / `USD 20` / `USD 20.5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::ValidationError(format!("Invalid money amount: {s}"));

        let (currency, amount) = s.trim().split_once(' ').ok_or_else(invalid)?;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let amount = amount.trim();
        let (negative, amount) = match amount.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, amount),
        };
        let (whole, frac) = amount.split_once('.').unwrap_or((amount, ""));
        if frac.len() > 2 {
            return Err(invalid());
        }
        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            let parsed: i64 = frac.parse().map_err(|_| invalid())?;
            if frac.len() == 1 {
                parsed * 10
            } else {
                parsed
            }
        };
        let minor = whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(invalid)?;

        Ok(Self::new(currency, if negative { -minor } else { minor }))
    }
}

impl TryFrom<String> for Money {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_display() {
        assert_eq!(Money::new("usd", 2000).to_string(), "USD 20.00");
        assert_eq!(Money::new("JPY", -5).to_string(), "JPY -0.05");
    }

    #[test]
    fn money_parse() {
        assert_eq!("USD 20.00".parse::<Money>().unwrap(), Money::new("USD", 2000));
        assert_eq!("EUR 7.5".parse::<Money>().unwrap(), Money::new("EUR", 750));
        assert_eq!("USD 3".parse::<Money>().unwrap(), Money::new("USD", 300));
        assert!("20.00".parse::<Money>().is_err());
        assert!("USD 1.234".parse::<Money>().is_err());
        assert!("DOLLARS 1".parse::<Money>().is_err());
    }

    #[test]
    fn money_serializes_as_string() {
        let json = serde_json::to_string(&Money::new("USD", 1999)).unwrap();
        assert_eq!(json, "\"USD 19.99\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::new("USD", 1999));
    }
}
