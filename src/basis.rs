pub use self::classifier::{Classifier, ClassifyError, ReserveState};
pub use self::reserve::{Consumption, ReserveDraw, ReserveError, ReserveLedger, ReserveLot};
use crate::client::{SourceError, TransactionSource};
use crate::model::{Classification, StatementConfig, Stats};
use crate::statement::Mt940Writer;
use chrono::{DateTime, Utc};
use std::io::Write;
use thiserror::Error;
use tracing::{debug, info};

mod classifier;
mod reserve;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Unable to read transactions")]
    Source(#[from] SourceError),

    #[error("Transactions out of order: {1} follows {0}")]
    OutOfOrder(DateTime<Utc>, DateTime<Utc>),

    #[error("Unable to attribute transaction")]
    Classify(#[from] ClassifyError),

    #[error("Unable to write statement")]
    Write(#[from] std::io::Error),
}

/// Run every transaction from `source` through the reserve, writing the statement to `out`.
///
/// Returns the final reserve state. Nothing written to `out` is meaningful on error.
pub fn reconcile<S, W>(
    source: &S,
    config: &StatementConfig,
    out: W,
    stats: &mut Stats,
) -> Result<ReserveState, ReconcileError>
where
    S: TransactionSource + ?Sized,
    W: Write,
{
    let transactions = source.transactions()?;
    info!("Reconciling {} transactions", transactions.len());

    if let Some(pair) = transactions.windows(2).find(|w| w[0].time > w[1].time) {
        return Err(ReconcileError::OutOfOrder(pair[0].time, pair[1].time));
    }

    let classifier = Classifier::from_config(config);
    let mut state = ReserveState::new();
    let mut writer = Mt940Writer::new(out, config);

    writer.write_header()?;
    for tx in &transactions {
        stats.inc_transactions();

        let classification = classifier.classify(&mut state, tx)?;
        debug!("Classified: {classification:?}");

        if let Classification::Spend {
            entry,
            emitted: true,
        } = &classification
        {
            writer.write_entry(entry)?;
        }
        stats.record(&classification);
    }
    writer.write_trailer()?;

    info!(
        "Reserve holds {} {} across {} active lots",
        state.reserves.total(),
        config.foreign_currency,
        state.reserves.active_lots().count(),
    );

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::parse_statement;
    use crate::model::{ForeignAmount, Transaction};
    use borderless::statement::Statement;
    use similar_asserts::assert_eq;
    use tracing_test::traced_test;

    const FIXTURE: &str = include_str!("../tests/fixtures/statement.json");

    const EXPECTED: &str = concat!(
        ":940:\r\n",
        ":20:940A150326\r\n",
        ":25:Transferwise Account\r\n",
        ":28:00360/00\r\n",
        ":60F:C150325EUR000000000000.00\r\n",
        ":61:190214D000000084.09N5450300091494      US00TRAN000000000\r\n",
        ":86:Card transaction at Hardware Store (USD -100.50)\r\n",
        ":61:190220C000000004.00N5450300091494      US00TRAN000000000\r\n",
        ":86:Refund from Hardware Store (USD 4.40)\r\n",
        ":61:190225D000000030.00N5450300091494      US00TRAN000000000\r\n",
        ":86:Card transaction at Bookshop (USD -33.00)\r\n",
        ":62F:C150326EUR000000000000.00\r\n",
    );

    fn fixture() -> Vec<Transaction> {
        let statement = Statement::from_reader(FIXTURE.as_bytes()).unwrap();

        crate::imports::sort_by_time(parse_statement(statement).unwrap())
    }

    #[test]
    #[traced_test]
    fn fixture_statement() {
        let config = StatementConfig::default();
        let mut stats = Stats::default();
        let mut out = Vec::new();

        let state = reconcile(&fixture(), &config, &mut out, &mut stats).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), EXPECTED);
        assert_eq!(stats.transactions(), 8);
        assert_eq!(stats.emitted(), 3);

        // 120 @ 1.20 and 65 @ 1.10 reserved, 157.6 net spent.
        assert_eq!(state.reserves.lot_count(), 2);
        assert_eq!(state.reserves.total(), "31.9".parse::<ForeignAmount>().unwrap());
        assert_eq!(state.total_reserved, state.reserves.total());
        assert!(logs_contain("Reconciling 8 transactions"));
    }

    #[test]
    fn cutoff_moves_entries_in_and_out() {
        let config = StatementConfig {
            cutoff: "2019-01-01T00:00:00Z".parse().unwrap(),
            ..Default::default()
        };
        let mut stats = Stats::default();
        let mut out = Vec::new();

        reconcile(&fixture(), &config, &mut out, &mut stats).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(stats.emitted(), 4);
        assert!(text.contains(":61:190201D000000020.00"));
        assert!(text.contains(":86:Card transaction at Early Cafe (USD -24.00)\r\n"));
    }

    #[test]
    fn out_of_order_input_is_rejected() {
        let mut txs = fixture();
        txs.reverse();

        let err = reconcile(
            &txs,
            &StatementConfig::default(),
            Vec::new(),
            &mut Stats::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ReconcileError::OutOfOrder(_, _)));
    }

    #[test]
    fn overspend_aborts_the_run() {
        let mut txs = fixture();
        // Drop the first conversion; the early spend then has nothing to draw from.
        txs.retain(|tx| tx.reference.as_deref() != Some("BALANCE-1"));

        let err = reconcile(
            &txs,
            &StatementConfig::default(),
            Vec::new(),
            &mut Stats::default(),
        )
        .unwrap_err();

        let ReconcileError::Classify(ClassifyError::Reserve(tx, source)) = err else {
            panic!("expected a reserve error");
        };
        assert_eq!(tx.reference.as_deref(), Some("CARD-1002"));
        assert!(matches!(source, ReserveError::InsufficientReserve { .. }));
    }
}
