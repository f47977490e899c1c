use crate::model::amount::CurrencyCode;
use crate::model::constants::*;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config `{0:?}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("RON parsing error in config `{0:?}`")]
    Parse(PathBuf, #[source] ron::de::SpannedError),

    #[error("Domestic and foreign currency are both {0}")]
    SameCurrency(CurrencyCode),

    #[error("Statement window must span at least one day")]
    WindowDays,

    #[error("Statement period is empty: {start} to {end}")]
    EmptyPeriod {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Statement field `{0}` must not contain line breaks")]
    LineBreak(&'static str),
}

/// Debit/credit mark of a statement amount.
#[derive(Copy, Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub enum Mark {
    Debit,
    Credit,
}

/// An opening or closing balance.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub struct BalanceLine {
    pub mark: Mark,
    pub date: NaiveDate,
    pub currency: CurrencyCode,
    pub amount: Decimal,
}

/// Statement API request parameters.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub account_id: u64,
    pub window_days: u32,
    pub timeout_secs: u64,
}

/// Everything that shapes a run, loaded from RON. Missing fields take their defaults.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
#[serde(default)]
pub struct StatementConfig {
    /// The currency the statement reports in.
    pub domestic_currency: CurrencyCode,

    /// The currency the account is held in.
    pub foreign_currency: CurrencyCode,

    pub period_start: DateTime<Utc>,

    /// `None` means "now".
    pub period_end: Option<DateTime<Utc>>,

    pub cutoff: DateTime<Utc>,

    pub statement_reference: String,
    pub account_identifier: String,
    pub statement_number: String,
    pub opening_balance: BalanceLine,
    pub closing_balance: BalanceLine,

    /// Appended verbatim to every movement line.
    pub entry_suffix: String,

    pub api: ApiConfig,
}

impl Mark {
    /// `Debit` for negative values, `Credit` for everything else.
    pub fn of(value: Decimal) -> Self {
        if value.is_sign_negative() && !value.is_zero() {
            Self::Debit
        } else {
            Self::Credit
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Debit => 'D',
            Self::Credit => 'C',
        }
    }
}

impl BalanceLine {
    fn zero(date: NaiveDate) -> Self {
        Self {
            mark: Mark::Credit,
            date,
            currency: DEFAULT_DOMESTIC_CURRENCY,
            amount: Decimal::ZERO,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            account_id: DEFAULT_ACCOUNT_ID,
            window_days: DEFAULT_WINDOW_DAYS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for StatementConfig {
    fn default() -> Self {
        Self {
            domestic_currency: DEFAULT_DOMESTIC_CURRENCY,
            foreign_currency: DEFAULT_FOREIGN_CURRENCY,
            period_start: start_of_day(DEFAULT_PERIOD_START),
            period_end: None,
            cutoff: start_of_day(DEFAULT_CUTOFF),
            statement_reference: DEFAULT_STATEMENT_REFERENCE.to_string(),
            account_identifier: DEFAULT_ACCOUNT_IDENTIFIER.to_string(),
            statement_number: DEFAULT_STATEMENT_NUMBER.to_string(),
            opening_balance: BalanceLine::zero(DEFAULT_OPENING_BALANCE_DATE),
            closing_balance: BalanceLine::zero(DEFAULT_CLOSING_BALANCE_DATE),
            entry_suffix: DEFAULT_ENTRY_SUFFIX.to_string(),
            api: ApiConfig::default(),
        }
    }
}

impl StatementConfig {
    /// Load a `StatementConfig` from the given path and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data =
            std::fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let config: Self =
            ron::from_str(&data).map_err(|err| ConfigError::Parse(path.to_path_buf(), err))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domestic_currency == self.foreign_currency {
            return Err(ConfigError::SameCurrency(self.domestic_currency));
        }
        if self.api.window_days == 0 {
            return Err(ConfigError::WindowDays);
        }
        if let Some(end) = self.period_end {
            if end <= self.period_start {
                return Err(ConfigError::EmptyPeriod {
                    start: self.period_start,
                    end,
                });
            }
        }

        let fields = [
            ("statement_reference", &self.statement_reference),
            ("account_identifier", &self.account_identifier),
            ("statement_number", &self.statement_number),
            ("entry_suffix", &self.entry_suffix),
        ];
        for (name, value) in fields {
            if value.contains(['\r', '\n']) {
                return Err(ConfigError::LineBreak(name));
            }
        }

        Ok(())
    }
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
