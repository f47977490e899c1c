use crate::basis::reserve::{ReserveError, ReserveLedger};
use crate::model::amount::{ConvertAmountError, CurrencyCode, ExchangeRate, ForeignAmount};
use crate::model::config::StatementConfig;
use crate::model::transaction::{Classification, StatementEntry, Transaction, TransactionKind};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

/// Classification failures, carrying the offending transaction.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Reserve error at {0}")]
    Reserve(Box<Transaction>, #[source] ReserveError),

    #[error("Transaction is not denominated in {1}: {0}")]
    CurrencyMismatch(Box<Transaction>, CurrencyCode),

    #[error("Unable to derive the conversion rate of {0}")]
    Rate(Box<Transaction>, #[source] ConvertAmountError),
}

/// Running totals threaded through every [`Classifier::classify`] call.
#[derive(Debug, Default)]
pub struct ReserveState {
    /// Sum of every counted account currency movement.
    pub balance: ForeignAmount,

    /// How much of `balance` has been placed in reserve lots, net of spends.
    pub total_reserved: ForeignAmount,

    pub reserves: ReserveLedger,
}

/// Routes transactions to the reserve ledger and decides which spends reach the statement.
#[derive(Clone, Debug)]
pub struct Classifier {
    domestic: CurrencyCode,
    foreign: CurrencyCode,
    cutoff: DateTime<Utc>,
}

impl ReserveState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier {
    pub fn new(domestic: CurrencyCode, foreign: CurrencyCode, cutoff: DateTime<Utc>) -> Self {
        Self {
            domestic,
            foreign,
            cutoff,
        }
    }

    pub fn from_config(config: &StatementConfig) -> Self {
        Self::new(
            config.domestic_currency,
            config.foreign_currency,
            config.cutoff,
        )
    }

    /// Apply one transaction to `state`. Transactions must arrive oldest first.
    ///
    /// On error `state` must be discarded; the run cannot continue.
    pub fn classify(
        &self,
        state: &mut ReserveState,
        tx: &Transaction,
    ) -> Result<Classification, ClassifyError> {
        if let TransactionKind::Conversion { source, target } = &tx.kind {
            if source.currency != self.domestic && target.currency != self.domestic {
                debug!("Ignoring conversion without {}: {tx}", self.domestic);
                return Ok(Classification::Ignored);
            }
        }

        if tx.amount.currency != self.foreign {
            return Err(ClassifyError::CurrencyMismatch(
                Box::new(tx.clone()),
                self.foreign,
            ));
        }
        let amount = ForeignAmount::new(tx.amount.value);
        state.balance += amount;

        let classification = match &tx.kind {
            TransactionKind::Conversion { source, target } => {
                let (foreign_leg, domestic_leg) = if source.currency == self.domestic {
                    (target, source)
                } else {
                    (source, target)
                };
                let rate = ExchangeRate::from_legs(foreign_leg, domestic_leg)
                    .map_err(|err| ClassifyError::Rate(Box::new(tx.clone()), err))?;

                let excess = state.balance - state.total_reserved;
                let lot_created = if excess.is_positive() {
                    state
                        .reserves
                        .add_lot(excess, rate, tx.time)
                        .map_err(|err| ClassifyError::Reserve(Box::new(tx.clone()), err))?;
                    state.total_reserved = state.balance;
                    true
                } else {
                    warn!("Conversion created no reserve: {tx}");
                    false
                };

                Classification::Conversion { lot_created }
            }

            TransactionKind::Card => {
                let spend = -amount;
                let cost_basis = if spend.is_negative() {
                    state.reserves.restore(-spend)
                } else {
                    state.reserves.consume(spend).map(|value| -value)
                }
                .map_err(|err| ClassifyError::Reserve(Box::new(tx.clone()), err))?;
                state.total_reserved -= spend;

                let emitted = tx.time > self.cutoff;
                if !emitted {
                    debug!("Suppressing spend on or before cutoff: {tx}");
                }

                Classification::Spend {
                    entry: StatementEntry {
                        time: tx.time,
                        description: tx.description.clone(),
                        amount: tx.amount.clone(),
                        cost_basis,
                    },
                    emitted,
                }
            }

            TransactionKind::Other(_) => Classification::Other,
        };
        debug_assert_eq!(state.reserves.total(), state.total_reserved);

        Ok(classification)
    }
}
