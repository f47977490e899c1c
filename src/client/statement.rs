use super::{create_thread_pool, PoolError, SourceError, TransactionSource};
use crate::imports::{parse_statement, sort_by_time, ImportError};
use crate::model::amount::CurrencyCode;
use crate::model::config::StatementConfig;
use crate::model::constants::{DEFAULT_API_URL, ENV_API_TOKEN, ENV_API_URL};
use crate::model::transaction::Transaction;
use borderless::http::header::{InvalidHeaderValue, AUTHORIZATION};
use borderless::http::Uri;
use borderless::statement::{Borderless, Statement};
use borderless::Req;
use chrono::{DateTime, TimeDelta, Utc};
use rayon::{prelude::*, ThreadPool};
use std::{env, time::Duration, time::Instant};
use thiserror::Error;
use tracing::{debug, info};
use ureq::tls::{TlsConfig, TlsProvider};
use ureq::Agent;

#[derive(Debug, Error)]
pub enum StatementClientError {
    #[error("Invalid statement API URI")]
    ApiUri(#[from] borderless::http::Error),

    #[error("Statement API URL needs a scheme and host: `{0}`")]
    ApiServer(String),

    #[error("Missing API token, set `FXBASIS_API_TOKEN`")]
    MissingToken,

    #[error("API token is not a valid header value")]
    Token(#[from] InvalidHeaderValue),

    #[error("Thread Pool error")]
    ThreadPool(#[from] PoolError),

    #[error("Error requesting statement {0} to {1}")]
    Request(DateTime<Utc>, DateTime<Utc>, #[source] Box<ureq::Error>),

    #[error("Invalid transaction in statement {0} to {1}")]
    Import(DateTime<Utc>, DateTime<Utc>, #[source] ImportError),
}

/// A statement interval, both ends inclusive.
pub type Window = (DateTime<Utc>, DateTime<Utc>);

/// Fetches a statement period from the API, one window per request, concurrently.
pub struct StatementClient {
    pool: ThreadPool,
    agent: Agent,
    api: Borderless,
    token: String,
    account_id: u64,
    currency: CurrencyCode,
    windows: Vec<Window>,
}

impl StatementClient {
    /// Create a client for the period described by `config`, ending at `now` when the period is
    /// open-ended.
    pub fn new(
        api_server: &str,
        token: String,
        config: &StatementConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, StatementClientError> {
        let uri = api_server
            .parse::<Uri>()
            .map_err(borderless::http::Error::from)?;
        if uri.scheme().is_none() || uri.host().is_none() {
            return Err(StatementClientError::ApiServer(api_server.to_string()));
        }

        let (num_threads, pool) = create_thread_pool()?;

        let agent = Agent::from(
            Agent::config_builder()
                .max_idle_connections_per_host(num_threads)
                .timeout_global(Some(Duration::from_secs(config.api.timeout_secs)))
                .tls_config(
                    TlsConfig::builder()
                        .provider(TlsProvider::NativeTls)
                        .build(),
                )
                .build(),
        );
        let end = config.period_end.unwrap_or(now);

        Ok(Self {
            pool,
            agent,
            api: Borderless::new(uri)?,
            token,
            account_id: config.api.account_id,
            currency: config.foreign_currency,
            windows: statement_windows(config.period_start, end, config.api.window_days),
        })
    }

    /// Like [`Self::new`], with the API server and token taken from the environment.
    pub fn from_env(
        config: &StatementConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, StatementClientError> {
        let token = env::var(ENV_API_TOKEN).map_err(|_| StatementClientError::MissingToken)?;
        let api_server = env::var(ENV_API_URL).unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Self::new(&api_server, token, config, now)
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// Build the authorized request for one window.
    pub fn request(&self, (start, end): Window) -> Result<Req, StatementClientError> {
        let mut req = self
            .api
            .get_statement(self.account_id, self.currency.as_str(), start, end);
        req.headers_mut()
            .insert(AUTHORIZATION, format!("Bearer {}", self.token).parse()?);

        Ok(req)
    }

    fn fetch_window(&self, window: Window) -> Result<Vec<Transaction>, StatementClientError> {
        let thread_id = std::thread::current().id();
        let (start, end) = window;

        info!("Fetching statement {start} to {end} on {thread_id:?}");

        let start_time = Instant::now();
        let req = self.request(window)?;
        let request_err = |err| StatementClientError::Request(start, end, Box::new(err));
        let mut resp = self.agent.run(req).map_err(request_err)?;
        let statement: Statement = resp.body_mut().read_json().map_err(request_err)?;
        let dur = start_time.elapsed();

        info!(
            "Statement {start} to {end} received {} transactions in {dur:?}",
            statement.transactions.len()
        );

        parse_statement(statement).map_err(|err| StatementClientError::Import(start, end, err))
    }
}

impl TransactionSource for StatementClient {
    fn transactions(&self) -> Result<Vec<Transaction>, SourceError> {
        let pages = self.pool.in_place_scope(|_scope| {
            self.windows
                .par_iter()
                .map(|window| self.fetch_window(*window))
                .collect::<Result<Vec<_>, _>>()
        })?;
        debug!("Fetched {} statement windows", pages.len());

        Ok(sort_by_time(pages.into_iter().flatten()))
    }
}

/// Split `[start, end)` into consecutive windows of at most `days` days.
///
/// Each window ends one millisecond before the next one starts. Intervals are sent in milliseconds.
pub fn statement_windows(start: DateTime<Utc>, end: DateTime<Utc>, days: u32) -> Vec<Window> {
    let step = TimeDelta::days(i64::from(days.max(1)));
    let mut windows = Vec::new();

    let mut from = start;
    while from < end {
        let to = (from + step).min(end);
        windows.push((from, (to - TimeDelta::milliseconds(1)).max(from)));
        from = to;
    }

    windows
}
