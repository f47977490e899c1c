use crate::model::amount::{DomesticAmount, ExchangeRate, ForeignAmount};
use crate::util::fifo::FIFO;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::trace;


#[cfg_attr(test, derive(Eq, PartialEq))]
#[derive(Debug, Error)]
pub enum ReserveError {
    #[error("FATAL: Reserve too low to attribute the spend: need {needed}, have {available}")]
    InsufficientReserve {
        needed: ForeignAmount,
        available: ForeignAmount,
    },

    #[error("Cannot reserve a zero or negative amount: {0}")]
    ZeroOrNegative(ForeignAmount),

    #[error("Cannot consume a negative amount: {0}")]
    Negative(ForeignAmount),

    #[error("No reserve lot exists to price the refund")]
    NoReserveRate,
}

/// Foreign currency acquired at a single exchange rate, waiting to be attributed to spends.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReserveLot {
    pub remaining: ForeignAmount,
    pub rate: ExchangeRate,
    /// Time of the conversion that created this lot.
    pub acquired: DateTime<Utc>,
}

/// One lot's contribution to a consumption.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReserveDraw {
    /// Creation index of the lot. Stable across [`ReserveLedger::compact`].
    pub lot: usize,
    pub taken: ForeignAmount,
    pub rate: ExchangeRate,
    pub value: DomesticAmount,
}

/// Result of [`ReserveLedger::consume_detailed`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Consumption {
    pub value: DomesticAmount,
    pub draws: Vec<ReserveDraw>,
}

/// Append-only FIFO of reserve lots.
///
/// Lots are consumed strictly in creation order, regardless of which rate would be more
/// favorable. Exhausted lots stay in the queue; `cursor` points at the oldest lot that may still
/// hold a balance so consumption never rescans them.
///
/// Failed operations never mutate the ledger. Sufficiency is checked against the running total
/// before any lot is drained.
#[derive(Clone, Debug, Default)]
pub struct ReserveLedger {
    lots: FIFO<ReserveLot>,
    cursor: usize,
    total: ForeignAmount,
    /// Number of lots dropped from the front by `compact`.
    compacted: usize,
}

impl ReserveLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new lot holding `amount` acquired at `rate`.
    pub fn add_lot(
        &mut self,
        amount: ForeignAmount,
        rate: ExchangeRate,
        acquired: DateTime<Utc>,
    ) -> Result<(), ReserveError> {
        if !amount.is_positive() {
            return Err(ReserveError::ZeroOrNegative(amount));
        }

        trace!("Adding reserve lot {} of {amount} @ {rate}", self.lot_count());
        self.lots.append_back(ReserveLot {
            remaining: amount,
            rate,
            acquired,
        });
        self.total += amount;

        Ok(())
    }

    /// Drain `amount` from the oldest lots and return its domestic value.
    pub fn consume(&mut self, amount: ForeignAmount) -> Result<DomesticAmount, ReserveError> {
        self.consume_detailed(amount)
            .map(|consumption| consumption.value)
    }

    /// Like [`Self::consume`], also reporting how much was taken from each lot.
    pub fn consume_detailed(&mut self, amount: ForeignAmount) -> Result<Consumption, ReserveError> {
        if amount.is_negative() {
            return Err(ReserveError::Negative(amount));
        }
        if amount > self.total {
            return Err(ReserveError::InsufficientReserve {
                needed: amount,
                available: self.total,
            });
        }

        let mut left = amount;
        let mut consumption = Consumption::default();
        let base = self.compacted + self.cursor;

        for (offset, lot) in self.lots.range_mut(self.cursor..).enumerate() {
            if left.is_zero() {
                break;
            }
            if !lot.remaining.is_positive() {
                continue;
            }

            let taken = lot.remaining.min(left);
            lot.remaining -= taken;
            left -= taken;

            let value = taken.to_domestic(lot.rate);
            consumption.value += value;

            trace!("Drew {taken} from reserve lot {} @ {}", base + offset, lot.rate);
            consumption.draws.push(ReserveDraw {
                lot: base + offset,
                taken,
                rate: lot.rate,
                value,
            });
        }
        debug_assert!(left.is_zero(), "running total diverged from lots");

        self.total -= amount;
        self.advance_cursor();

        Ok(consumption)
    }

    /// Credit a refunded `amount` back to the oldest active lot, priced at that lot's rate.
    ///
    /// When every lot is exhausted, the newest lot is re-activated instead.
    pub fn restore(&mut self, amount: ForeignAmount) -> Result<DomesticAmount, ReserveError> {
        if !amount.is_positive() {
            return Err(ReserveError::ZeroOrNegative(amount));
        }
        if self.lots.is_empty() {
            return Err(ReserveError::NoReserveRate);
        }

        if self.cursor >= self.lots.len() {
            self.cursor = self.lots.len() - 1;
        }
        let lot = &mut self.lots[self.cursor];
        lot.remaining += amount;
        self.total += amount;

        trace!(
            "Restored {amount} to reserve lot {} @ {}",
            self.compacted + self.cursor,
            lot.rate
        );

        Ok(amount.to_domestic(lot.rate))
    }

    /// Sum of all remaining lot amounts.
    pub fn total(&self) -> ForeignAmount {
        self.total
    }

    /// All retained lots, oldest first, including exhausted ones.
    pub fn lots(&self) -> impl Iterator<Item = &ReserveLot> + '_ {
        self.lots.iter()
    }

    /// Lots that still hold a balance, with their creation index.
    pub fn active_lots(&self) -> impl Iterator<Item = (usize, &ReserveLot)> + '_ {
        let base = self.compacted + self.cursor;

        self.lots
            .range(self.cursor..)
            .enumerate()
            .filter(|(_, lot)| lot.remaining.is_positive())
            .map(move |(offset, lot)| (base + offset, lot))
    }

    /// Number of lots ever created.
    pub fn lot_count(&self) -> usize {
        self.compacted + self.lots.len()
    }

    /// Drop exhausted lots in front of the cursor. Returns how many were dropped.
    ///
    /// The newest lot is always kept so a later refund can re-activate it.
    pub fn compact(&mut self) -> usize {
        let keep_newest = self.cursor.min(self.lots.len().saturating_sub(1));
        let dropped = self.lots.drain_front(keep_newest);
        self.compacted += dropped;
        self.cursor -= dropped;

        dropped
    }

    fn advance_cursor(&mut self) {
        while self.cursor < self.lots.len() && !self.lots[self.cursor].remaining.is_positive() {
            self.cursor += 1;
        }
    }
}
