//! Money - amounts in minor units

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// An amount held in minor units (paisa for PKR, cents for USD)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Build from an amount in major units as sent by clients (e.g. `1500.5`)
    ///
    /// Rounds to two decimal places. Rejects non-finite, zero, negative and
    /// out-of-range values.
    pub fn from_major(amount: f64) -> Result<Self, DomainError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(DomainError::Validation(format!(
                "amount must be a positive number, got {amount}"
            )));
        }

        let minor = (amount * 100.0).round();
        if minor < 1.0 || minor > i64::MAX as f64 {
            return Err(DomainError::Validation(format!(
                "amount {amount} is out of range"
            )));
        }

        Ok(Self(minor as i64))
    }

    /// Build from whole major units (plan prices)
    pub fn from_major_units(units: i64) -> Result<Self, DomainError> {
        units
            .checked_mul(100)
            .filter(|minor| *minor > 0)
            .map(Self)
            .ok_or_else(|| DomainError::Validation(format!("amount {units} is out of range")))
    }

    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Major-unit rendering without trailing zeros: `1500`, `1500.5`, `1500.05`
    pub fn to_major_string(&self) -> String {
        let whole = self.0 / 100;
        let cents = self.0 % 100;
        match cents {
            0 => whole.to_string(),
            c if c % 10 == 0 => format!("{}.{}", whole, c / 10),
            c => format!("{}.{:02}", whole, c),
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_major_string())
    }
}
