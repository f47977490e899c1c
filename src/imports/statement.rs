use crate::model::amount::{ConvertAmountError, Money};
use crate::model::transaction::{Transaction, TransactionKind};
use borderless::statement::{self, Statement, StatementTransaction};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::{fs::File, io::BufReader, path::Path, path::PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("I/O error reading `{0:?}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Unable to decode statement `{0:?}`")]
    Decode(PathBuf, #[source] statement::Error),

    #[error("Invalid money in statement transaction at {0}")]
    Money(DateTime<Utc>, #[source] ConvertAmountError),

    #[error("Conversion at {0} is missing its {1} amount")]
    MissingLeg(DateTime<Utc>, &'static str),
}

/// Read and merge statement JSON files, oldest transaction first.
pub fn read_statements<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Transaction>, ImportError> {
    let mut transactions = Vec::new();

    for path in paths {
        let path = path.as_ref();
        debug!("Reading statement {path:?}");

        let file = File::open(path).map_err(|err| ImportError::Io(path.to_path_buf(), err))?;
        let statement = Statement::from_reader(BufReader::new(file))
            .map_err(|err| ImportError::Decode(path.to_path_buf(), err))?;

        transactions.extend(parse_statement(statement)?);
    }

    Ok(sort_by_time(transactions))
}

/// Parse every transaction of a decoded statement, keeping the statement's order.
pub fn parse_statement(statement: Statement) -> Result<Vec<Transaction>, ImportError> {
    statement
        .transactions
        .into_iter()
        .map(|record| {
            debug!("Deserialized: {record:?}");
            let tx = parse_transaction(record)?;
            debug!("Parsed: {tx:?}");

            Ok(tx)
        })
        .collect()
}

pub fn parse_transaction(record: StatementTransaction) -> Result<Transaction, ImportError> {
    let time = record.date;
    let money = |value: borderless::statement::Money| {
        Money::parse(value.value, &value.currency).map_err(|err| ImportError::Money(time, err))
    };

    let kind = match record.details.kind.as_str() {
        "CONVERSION" => {
            let source = record
                .details
                .source_amount
                .ok_or(ImportError::MissingLeg(time, "source"))?;
            let target = record
                .details
                .target_amount
                .ok_or(ImportError::MissingLeg(time, "target"))?;

            TransactionKind::Conversion {
                source: money(source)?,
                target: money(target)?,
            }
        }
        "CARD" => TransactionKind::Card,
        other => TransactionKind::Other(other.to_string()),
    };

    let description = if record.details.description.is_empty() {
        record.description
    } else {
        record.details.description
    };

    Ok(Transaction {
        kind,
        amount: money(record.amount)?,
        time,
        description,
        reference: record.reference_number,
    })
}

/// Stable sort by timestamp. Transactions sharing a timestamp keep their relative order.
pub fn sort_by_time(transactions: impl IntoIterator<Item = Transaction>) -> Vec<Transaction> {
    // Use a BTreeMap to sort rows by timestamp
    let mut rows = BTreeMap::<_, Vec<_>>::new();
    for tx in transactions {
        rows.entry(tx.time).or_default().push(tx);
    }

    rows.into_values().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    const FIXTURE: &str = include_str!("../../tests/fixtures/statement.json");

    fn fixture() -> Statement {
        Statement::from_reader(FIXTURE.as_bytes()).unwrap()
    }

    #[test]
    fn fixture_parses_into_kinds() {
        let txs = parse_statement(fixture()).unwrap();
        let kinds: Vec<_> = txs.iter().map(|tx| tx.kind.name()).collect();

        assert!(kinds.contains(&"CONVERSION"));
        assert!(kinds.contains(&"CARD"));
        assert!(kinds.contains(&"DEPOSIT"));
    }

    #[test]
    fn conversion_legs_are_kept() {
        let mut statement = fixture();
        statement
            .transactions
            .retain(|tx| tx.details.kind == "CONVERSION");
        let tx = parse_transaction(statement.transactions.remove(0)).unwrap();

        let TransactionKind::Conversion { source, target } = tx.kind else {
            panic!("expected a conversion");
        };
        assert_eq!(source.currency.as_str(), "EUR");
        assert_eq!(target.currency.as_str(), "USD");
    }

    #[test]
    fn missing_conversion_leg_is_an_error() {
        let mut record = fixture()
            .transactions
            .into_iter()
            .find(|tx| tx.details.kind == "CONVERSION")
            .unwrap();
        record.details.target_amount = None;

        assert!(matches!(
            parse_transaction(record),
            Err(ImportError::MissingLeg(_, "target"))
        ));
    }

    #[test]
    fn unknown_currency_is_an_error() {
        let mut record = fixture().transactions.remove(0);
        record.amount.currency = "usd".to_string();

        assert!(matches!(
            parse_transaction(record),
            Err(ImportError::Money(_, ConvertAmountError::CurrencyCode(_)))
        ));
    }

    #[test]
    fn description_falls_back_to_summary() {
        let mut record = fixture().transactions.remove(0);
        record.details.description.clear();
        record.description = "Summary".to_string();

        assert_eq!(parse_transaction(record).unwrap().description, "Summary");
    }

    #[test]
    fn sorting_is_stable() {
        let txs = parse_statement(fixture()).unwrap();
        let mut reversed = txs.clone();
        reversed.reverse();

        let sorted = sort_by_time(txs.clone());
        assert!(sorted.windows(2).all(|w| w[0].time <= w[1].time));
        assert_eq!(sorted, sort_by_time(sorted.clone()));

        // Equal timestamps keep input order, whatever that order was.
        let forward: Vec<_> = sort_by_time(txs)
            .into_iter()
            .filter(|tx| tx.time == sorted[0].time)
            .map(|tx| tx.description)
            .collect();
        let backward: Vec<_> = sort_by_time(reversed)
            .into_iter()
            .filter(|tx| tx.time == sorted[0].time)
            .map(|tx| tx.description)
            .collect();
        assert_eq!(forward.len(), backward.len());
        assert_eq!(
            forward,
            backward.into_iter().rev().collect::<Vec<_>>()
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(
            read_statements(&["does/not/exist.json"]),
            Err(ImportError::Io(_, _))
        ));
    }
}
