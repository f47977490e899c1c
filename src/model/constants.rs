//! Defaults for the statement configuration.

use crate::model::amount::CurrencyCode;
use chrono::NaiveDate;

const fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid date constant"),
    }
}

pub const DEFAULT_DOMESTIC_CURRENCY: CurrencyCode = CurrencyCode::EUR;
pub const DEFAULT_FOREIGN_CURRENCY: CurrencyCode = CurrencyCode::USD;

/// Earliest statement day fetched from the API.
pub const DEFAULT_PERIOD_START: NaiveDate = date(2018, 4, 1);

/// Spends on or before midnight of this day update the reserve but are not written out.
pub const DEFAULT_CUTOFF: NaiveDate = date(2019, 2, 7);

pub const DEFAULT_STATEMENT_REFERENCE: &str = "940A150326";
pub const DEFAULT_ACCOUNT_IDENTIFIER: &str = "Transferwise Account";
pub const DEFAULT_STATEMENT_NUMBER: &str = "00360/00";
pub const DEFAULT_OPENING_BALANCE_DATE: NaiveDate = date(2015, 3, 25);
pub const DEFAULT_CLOSING_BALANCE_DATE: NaiveDate = date(2015, 3, 26);
pub const DEFAULT_ENTRY_SUFFIX: &str = "N5450300091494      US00TRAN000000000";

pub const DEFAULT_API_URL: &str = "https://api.transferwise.com";
pub const DEFAULT_ACCOUNT_ID: u64 = 1540801;

/// The statement API serves at most this many days per request.
pub const DEFAULT_WINDOW_DAYS: u32 = 60;
pub const DEFAULT_TIMEOUT_SECS: u64 = 2;

pub const DEFAULT_OUTPUT_PATH: &str = "mt940.txt";

pub const ENV_API_TOKEN: &str = "FXBASIS_API_TOKEN";
pub const ENV_API_URL: &str = "FXBASIS_API_URL";
