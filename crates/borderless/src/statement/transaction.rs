//! Statement transactions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, io::Read, str::FromStr};
use thiserror::Error;

/// JSON parsing errors for [`Statement`].
#[derive(Debug, Error)]
pub enum Error {
    /// The statement body could not be decoded.
    #[error("Unable to decode statement JSON")]
    Json(#[from] serde_json::Error),
}

/// An account statement for a single currency balance over a time interval.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub struct Statement {
    /// Statement transactions, in whatever order the server chose.
    pub transactions: Vec<StatementTransaction>,
}

/// A single balance movement.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub struct StatementTransaction {
    /// `DEBIT` or `CREDIT`.
    #[serde(rename = "type")]
    pub kind: String,

    /// When the movement was booked.
    pub date: DateTime<Utc>,

    /// Human-readable summary.
    #[serde(default)]
    pub description: String,

    /// Signed balance movement, denominated in the statement currency.
    pub amount: Money,

    /// Fees already included in `amount`.
    #[serde(rename = "totalFees", default)]
    pub total_fees: Option<Money>,

    /// What caused the movement.
    pub details: Details,

    #[serde(rename = "referenceNumber", default)]
    pub reference_number: Option<String>,
}

/// Movement details. Which fields are present depends on `kind`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct Details {
    /// `CARD`, `CONVERSION`, `DEPOSIT`, `TRANSFER`, `MONEY_ADDED`, ...
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub amount: Option<Money>,

    /// Conversion only: the leg that was sold.
    #[serde(rename = "sourceAmount", default)]
    pub source_amount: Option<Money>,

    /// Conversion only: the leg that was bought.
    #[serde(rename = "targetAmount", default)]
    pub target_amount: Option<Money>,
}

/// A value paired with its ISO 4217 currency code.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub struct Money {
    /// JSON numbers are read through their shortest decimal representation, so `0.1` is exactly
    /// `0.1` rather than the nearest binary float.
    #[serde(deserialize_with = "from_json_number")]
    pub value: Decimal,

    pub currency: String,
}

impl Statement {
    /// Decode a statement from a JSON reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        Ok(serde_json::from_reader(reader)?)
    }
}

fn from_json_number<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_any(DecimalVisitor)
}

struct DecimalVisitor;

impl serde::de::Visitor<'_> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a decimal number or numeric string")
    }

    fn visit_i64<E>(self, value: i64) -> Result<Decimal, E>
    where
        E: serde::de::Error,
    {
        Ok(Decimal::from(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Decimal, E>
    where
        E: serde::de::Error,
    {
        Ok(Decimal::from(value))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Decimal, E>
    where
        E: serde::de::Error,
    {
        // `f64::to_string` yields the shortest string that round-trips.
        Decimal::from_str(&value.to_string()).map_err(E::custom)
    }

    fn visit_str<E>(self, value: &str) -> Result<Decimal, E>
    where
        E: serde::de::Error,
    {
        Decimal::from_str(value).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONVERSION: &str = r#"{
        "transactions": [
            {
                "type": "CREDIT",
                "date": "2019-02-10T09:15:00.000Z",
                "amount": { "value": 120.1, "currency": "USD" },
                "totalFees": { "value": 0.0, "currency": "USD" },
                "details": {
                    "type": "CONVERSION",
                    "description": "Converted 100.00 EUR to 120.10 USD",
                    "sourceAmount": { "value": 100, "currency": "EUR" },
                    "targetAmount": { "value": 120.1, "currency": "USD" }
                },
                "referenceNumber": "BALANCE-1"
            }
        ]
    }"#;

    #[test]
    fn test_decode_conversion() {
        let statement = Statement::from_reader(CONVERSION.as_bytes()).unwrap();
        assert_eq!(statement.transactions.len(), 1);

        let tx = &statement.transactions[0];
        assert_eq!(tx.kind, "CREDIT");
        assert_eq!(tx.amount.value, Decimal::from_str("120.1").unwrap());
        assert_eq!(tx.details.kind, "CONVERSION");
        assert_eq!(tx.reference_number.as_deref(), Some("BALANCE-1"));

        let source = tx.details.source_amount.as_ref().unwrap();
        assert_eq!(source.value, Decimal::from(100));
        assert_eq!(source.currency, "EUR");
    }

    #[test]
    fn test_decode_missing_optional_fields() {
        let json = r#"{
            "transactions": [
                {
                    "type": "DEBIT",
                    "date": "2019-02-11T10:00:00Z",
                    "amount": { "value": "-4.5", "currency": "USD" },
                    "details": { "type": "CARD" }
                }
            ]
        }"#;
        let statement = Statement::from_reader(json.as_bytes()).unwrap();
        let tx = &statement.transactions[0];

        assert_eq!(tx.amount.value, Decimal::from_str("-4.5").unwrap());
        assert!(tx.total_fees.is_none());
        assert!(tx.details.source_amount.is_none());
        assert_eq!(tx.details.description, "");
    }

    #[test]
    fn test_decode_rejects_garbage_amount() {
        let json = r#"{
            "transactions": [
                {
                    "type": "DEBIT",
                    "date": "2019-02-11T10:00:00Z",
                    "amount": { "value": "lots", "currency": "USD" },
                    "details": { "type": "CARD" }
                }
            ]
        }"#;

        assert!(matches!(
            Statement::from_reader(json.as_bytes()),
            Err(Error::Json(_))
        ));
    }
}
