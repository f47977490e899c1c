use crate::imports::{read_statements, ImportError};
use crate::model::transaction::Transaction;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{env, path::PathBuf};
use thiserror::Error;

pub use self::statement::{statement_windows, StatementClient, StatementClientError, Window};

mod statement;

// Concurrent statement window requests.
const DEFAULT_THREADPOOL_SIZE: usize = 4;

/// Produces the account's transactions, oldest first.
///
/// Exists as a trait so that unit tests can mock the transaction source.
pub trait TransactionSource {
    fn transactions(&self) -> Result<Vec<Transaction>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Statement file error")]
    Import(#[from] ImportError),

    #[error("Statement API error")]
    Client(#[from] StatementClientError),
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Error parsing RAYON_NUM_THREADS")]
    RayonThreadPoolSize(#[source] std::num::ParseIntError),

    #[error("Rayon thread pool error")]
    RayonThreadPoolInit(#[from] rayon::ThreadPoolBuildError),
}

/// Statement JSON files on disk.
#[derive(Clone, Debug)]
pub struct JsonStatements {
    paths: Vec<PathBuf>,
}

impl JsonStatements {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl TransactionSource for JsonStatements {
    fn transactions(&self) -> Result<Vec<Transaction>, SourceError> {
        Ok(read_statements(&self.paths)?)
    }
}

impl TransactionSource for Vec<Transaction> {
    fn transactions(&self) -> Result<Vec<Transaction>, SourceError> {
        Ok(self.clone())
    }
}

pub(crate) fn create_thread_pool() -> Result<(usize, ThreadPool), PoolError> {
    let num_threads = env::var("RAYON_NUM_THREADS")
        .unwrap_or_else(|_| DEFAULT_THREADPOOL_SIZE.to_string())
        .parse()
        .map_err(PoolError::RayonThreadPoolSize)?;

    let pool = ThreadPoolBuilder::new().num_threads(num_threads).build()?;

    Ok((num_threads, pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_statements_are_sorted() {
        let source = JsonStatements::new(vec![PathBuf::from("tests/fixtures/statement.json")]);

        let txs = source.transactions().unwrap();

        assert_eq!(txs.len(), 8);
        assert!(txs.windows(2).all(|w| w[0].time <= w[1].time));
        assert_eq!(txs[0].reference.as_deref(), Some("BALANCE-1"));
    }

    #[test]
    fn missing_statement_file() {
        let source = JsonStatements::new(vec![PathBuf::from("tests/fixtures/missing.json")]);

        assert!(matches!(
            source.transactions(),
            Err(SourceError::Import(ImportError::Io(_, _)))
        ));
    }
}
