use crate::model::amount::{DomesticAmount, Money};
use chrono::{DateTime, Utc};
use std::fmt;

/// What caused a balance movement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransactionKind {
    /// Currency exchange. `source` is the leg that was sold, `target` the leg that was bought.
    Conversion { source: Money, target: Money },

    /// Card payment (negative amount) or card refund (positive amount).
    Card,

    /// Anything else, keeping the statement's type name.
    Other(String),
}

/// A single movement on the foreign currency account.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transaction {
    pub kind: TransactionKind,

    /// Signed movement in the account currency.
    pub amount: Money,

    pub time: DateTime<Utc>,

    pub description: String,

    /// Statement reference number, when the source provides one.
    pub reference: Option<String>,
}

/// A spend with its attributed domestic cost.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatementEntry {
    pub time: DateTime<Utc>,
    pub description: String,

    /// The original account currency movement.
    pub amount: Money,

    /// Domestic cost basis. Negative for spends, positive for refunds.
    pub cost_basis: DomesticAmount,
}

/// How the classifier handled a transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Classification {
    /// A conversion between two non-domestic currencies.
    Ignored,

    /// A conversion into or out of the domestic currency.
    Conversion { lot_created: bool },

    /// A card spend or refund. `emitted` is false when the entry falls on or before the cutoff.
    Spend { entry: StatementEntry, emitted: bool },

    /// Counted in the balance, no reserve or statement effect.
    Other,
}

impl TransactionKind {
    pub fn name(&self) -> &str {
        match self {
            Self::Conversion { .. } => "CONVERSION",
            Self::Card => "CARD",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} `{}`",
            self.time.format("%Y-%m-%d %H:%M:%S"),
            self.kind.name(),
            self.amount,
            self.description,
        )?;
        if let Some(reference) = &self.reference {
            write!(f, " (ref {reference})")?;
        }

        Ok(())
    }
}
