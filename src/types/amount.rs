use crate::types::errors::AmountError;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::debug;

/// A payment amount as received from the backend.
///
/// The backend stores the raw request body, so the amount can arrive as a JSON
/// number, a numeric string or something that is not a number at all. The raw
/// text is kept for searching and display; the coerced value is used for every
/// comparison and bucketing step and is `None` when coercion failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Amount {
    raw: String,
    value: Option<Decimal>
}

impl Amount {
    /// An amount that was not present in the payload.
    pub fn missing() -> Self {
        Self::default()
    }

    /// Builds an amount from received text, keeping the text even when it does not coerce.
    pub fn from_raw(raw: &str) -> Self {
        let value = match Self::parse_decimal(raw) {
            Ok(value) => Some(value),
            Err(error) => {
                debug!("Amount '{raw}' is not numeric: {error}");
                None
            }
        };

        Self { raw: raw.to_string(), value }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> Option<Decimal> {
        self.value
    }

    pub fn is_missing(&self) -> bool {
        self.raw.is_empty()
    }

    fn parse_decimal(raw: &str) -> Result<Decimal, AmountError> {
        let value = raw.trim();

        if value.is_empty() {
            return Err(AmountError::InvalidFormat("Value is an empty string".to_string()));
        }

        //NOTE: Browsers coerce "1e5" to a number, rust_decimal only does so through the scientific parser
        if let Ok(decimal) = Decimal::from_str(value) {
            return Ok(decimal);
        }

        match Decimal::from_scientific(value) {
            Ok(decimal) => Ok(decimal),
            Err(error) => value.parse::<f64>().ok()
                .and_then(Self::saturating_decimal)
                .ok_or(AmountError::Decimal(error))
        }
    }

    fn from_f64(value: f64) -> Self {
        Self {
            raw: value.to_string(),
            value: Self::saturating_decimal(value)
        }
    }

    /// Converts a finite float, clamping magnitudes beyond `Decimal`'s range to its bounds.
    fn saturating_decimal(value: f64) -> Option<Decimal> {
        if !value.is_finite() {
            return None;
        }

        Decimal::from_f64(value).or_else(|| match value {
            value if value >= 1.0 => Some(Decimal::MAX),
            value if value <= -1.0 => Some(Decimal::MIN),
            _ => Some(Decimal::ZERO)
        })
    }
}

impl Display for Amount {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(formatter, "{}", value.normalize()),
            None => write!(formatter, "{}", self.raw)
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let decimal = Self::parse_decimal(value)?;
        Ok(Self { raw: value.trim().to_string(), value: Some(decimal) })
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("a number or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Amount, E> {
        Ok(Amount { raw: value.to_string(), value: Some(Decimal::from(value)) })
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Amount, E> {
        Ok(Amount { raw: value.to_string(), value: Some(Decimal::from(value)) })
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Amount, E> {
        Ok(Amount::from_f64(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Amount, E> {
        Ok(Amount::from_raw(value))
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Amount, E> {
        Ok(Amount::from_raw(&value.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::missing())
    }

    fn visit_none<E: de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::missing())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}
