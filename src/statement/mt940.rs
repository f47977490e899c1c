//! Fixed-width MT940 statement text.
//!
//! A statement is a header block, one `:61:`/`:86:` line pair per entry, and a closing balance.
//! Every line ends with CRLF.

use crate::model::amount::{CurrencyCode, STATEMENT_DIGITS};
use crate::model::config::{BalanceLine, Mark, StatementConfig};
use crate::model::transaction::StatementEntry;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::io::{self, Write};
use thiserror::Error;

const EOL: &str = "\r\n";
const DATE_FORMAT: &str = "%y%m%d";
const MOVEMENT_AMOUNT_WIDTH: usize = 12;
const BALANCE_AMOUNT_WIDTH: usize = 15;

#[cfg_attr(test, derive(Eq, PartialEq))]
#[derive(Debug, Error)]
pub enum StatementParseError {
    #[error("Expected a line starting with `{0}`")]
    Tag(&'static str),

    #[error("Line ends before the `{0}` field")]
    Truncated(&'static str),

    #[error("Invalid date `{0}`")]
    Date(String),

    #[error("Invalid debit/credit mark `{0}`")]
    Mark(String),

    #[error("Invalid amount `{0}`")]
    Amount(String),

    #[error("Invalid currency `{0}`")]
    Currency(String),
}

/// The fields of a `:61:` line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MovementLine {
    pub date: NaiveDate,
    pub mark: Mark,
    /// Unsigned; the sign is carried by `mark`.
    pub amount: Decimal,
    pub suffix: String,
}

/// Streams a statement to `W`.
///
/// Callers write the header once, any number of entries in chronological order, then the trailer.
pub struct Mt940Writer<'a, W: Write> {
    out: W,
    config: &'a StatementConfig,
}

impl<'a, W: Write> Mt940Writer<'a, W> {
    pub fn new(out: W, config: &'a StatementConfig) -> Self {
        Self { out, config }
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        let config = self.config;

        write!(self.out, ":940:{EOL}")?;
        write!(self.out, ":20:{}{EOL}", config.statement_reference)?;
        write!(self.out, ":25:{}{EOL}", config.account_identifier)?;
        write!(self.out, ":28:{}{EOL}", config.statement_number)?;
        write!(
            self.out,
            ":60F:{}{EOL}",
            balance_field(&config.opening_balance)
        )
    }

    pub fn write_entry(&mut self, entry: &StatementEntry) -> io::Result<()> {
        write!(
            self.out,
            "{}{EOL}{}{EOL}",
            movement_line(entry, &self.config.entry_suffix),
            description_line(entry),
        )
    }

    pub fn write_trailer(&mut self) -> io::Result<()> {
        write!(
            self.out,
            ":62F:{}{EOL}",
            balance_field(&self.config.closing_balance)
        )?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// `:61:<YYMMDD><D|C><domestic amount><suffix>`
///
/// The mark follows the sign of the account currency movement, the amount is the absolute cost
/// basis.
pub fn movement_line(entry: &StatementEntry, suffix: &str) -> String {
    format!(
        ":61:{}{}{}{suffix}",
        entry.time.format(DATE_FORMAT),
        Mark::of(entry.amount.value).as_char(),
        padded(entry.cost_basis.to_decimal().abs(), MOVEMENT_AMOUNT_WIDTH),
    )
}

/// `:86:<description> (<currency> <signed amount>)`
pub fn description_line(entry: &StatementEntry) -> String {
    let description = entry.description.replace(['\r', '\n'], " ");

    format!(
        ":86:{description} ({} {})",
        entry.amount.currency,
        fixed(entry.amount.value),
    )
}

/// `<D|C><YYMMDD><currency><amount>`
pub fn balance_field(line: &BalanceLine) -> String {
    format!(
        "{}{}{}{}",
        line.mark.as_char(),
        line.date.format(DATE_FORMAT),
        line.currency,
        padded(line.amount.abs(), BALANCE_AMOUNT_WIDTH),
    )
}

/// Read back the fields of a `:61:` line written by [`movement_line`].
pub fn parse_movement_line(line: &str) -> Result<MovementLine, StatementParseError> {
    let line = line.trim_end_matches(EOL);
    let rest = line
        .strip_prefix(":61:")
        .ok_or(StatementParseError::Tag(":61:"))?;

    let (date, rest) = split_field(rest, 6, "date")?;
    let (mark, rest) = split_field(rest, 1, "mark")?;
    let (amount, suffix) = split_amount(rest)?;

    Ok(MovementLine {
        date: parse_date(date)?,
        mark: parse_mark(mark)?,
        amount: parse_amount(amount)?,
        suffix: suffix.to_string(),
    })
}

/// Read back a `:60F:` or `:62F:` line written by [`balance_field`].
pub fn parse_balance_line(line: &str) -> Result<BalanceLine, StatementParseError> {
    let line = line.trim_end_matches(EOL);
    let rest = line
        .strip_prefix(":60F:")
        .or_else(|| line.strip_prefix(":62F:"))
        .ok_or(StatementParseError::Tag(":60F:"))?;

    let (mark, rest) = split_field(rest, 1, "mark")?;
    let (date, rest) = split_field(rest, 6, "date")?;
    let (currency, amount) = split_field(rest, 3, "currency")?;

    Ok(BalanceLine {
        mark: parse_mark(mark)?,
        date: parse_date(date)?,
        currency: currency
            .parse::<CurrencyCode>()
            .map_err(|_| StatementParseError::Currency(currency.to_string()))?,
        amount: parse_amount(amount)?,
    })
}

fn fixed(value: Decimal) -> String {
    let rounded =
        value.round_dp_with_strategy(STATEMENT_DIGITS, RoundingStrategy::MidpointAwayFromZero);

    format!("{rounded:.2}")
}

fn padded(value: Decimal, width: usize) -> String {
    format!("{:0>width$}", fixed(value))
}

fn split_field<'s>(
    s: &'s str,
    len: usize,
    field: &'static str,
) -> Result<(&'s str, &'s str), StatementParseError> {
    match (s.get(..len), s.get(len..)) {
        (Some(head), Some(tail)) => Ok((head, tail)),
        _ => Err(StatementParseError::Truncated(field)),
    }
}

/// Movement amounts are at least `MOVEMENT_AMOUNT_WIDTH` wide and end two digits after the point.
fn split_amount(s: &str) -> Result<(&str, &str), StatementParseError> {
    let (padded, _) = split_field(s, MOVEMENT_AMOUNT_WIDTH, "amount")?;
    let end = s
        .find('.')
        .map(|point| point + 1 + STATEMENT_DIGITS as usize)
        .filter(|&end| end >= MOVEMENT_AMOUNT_WIDTH)
        .ok_or_else(|| StatementParseError::Amount(padded.to_string()))?;

    split_field(s, end, "amount")
}

fn parse_date(s: &str) -> Result<NaiveDate, StatementParseError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| StatementParseError::Date(s.to_string()))
}

fn parse_mark(s: &str) -> Result<Mark, StatementParseError> {
    match s {
        "D" => Ok(Mark::Debit),
        "C" => Ok(Mark::Credit),
        _ => Err(StatementParseError::Mark(s.to_string())),
    }
}

fn parse_amount(s: &str) -> Result<Decimal, StatementParseError> {
    if !s.bytes().all(|byte| byte.is_ascii_digit() || byte == b'.') {
        return Err(StatementParseError::Amount(s.to_string()));
    }

    s.parse()
        .map_err(|_| StatementParseError::Amount(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::amount::{DomesticAmount, Money};
    use similar_asserts::assert_eq;

    fn entry(amount: &str, cost_basis: &str, description: &str) -> StatementEntry {
        StatementEntry {
            time: "2019-02-10T14:03:00Z".parse().unwrap(),
            description: description.to_string(),
            amount: Money::parse(amount.parse().unwrap(), "USD").unwrap(),
            cost_basis: cost_basis.parse::<DomesticAmount>().unwrap(),
        }
    }

    fn write_statement(entries: &[StatementEntry]) -> String {
        let config = StatementConfig::default();
        let mut writer = Mt940Writer::new(Vec::new(), &config);

        writer.write_header().unwrap();
        for entry in entries {
            writer.write_entry(entry).unwrap();
        }
        writer.write_trailer().unwrap();

        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn empty_statement() {
        assert_eq!(
            write_statement(&[]),
            concat!(
                ":940:\r\n",
                ":20:940A150326\r\n",
                ":25:Transferwise Account\r\n",
                ":28:00360/00\r\n",
                ":60F:C150325EUR000000000000.00\r\n",
                ":62F:C150326EUR000000000000.00\r\n",
            )
        );
    }

    #[test]
    fn debit_entry_lines() {
        let entry = entry("-4.5", "-3.7516", "Coffee Shop");

        assert_eq!(
            movement_line(&entry, DEFAULT_SUFFIX),
            ":61:190210D000000003.75N5450300091494      US00TRAN000000000"
        );
        assert_eq!(description_line(&entry), ":86:Coffee Shop (USD -4.50)");
    }

    #[test]
    fn credit_entry_lines() {
        let entry = entry("12", "10", "Refund");

        assert_eq!(
            movement_line(&entry, DEFAULT_SUFFIX),
            ":61:190210C000000010.00N5450300091494      US00TRAN000000000"
        );
        assert_eq!(description_line(&entry), ":86:Refund (USD 12.00)");
    }

    #[test]
    fn amounts_round_half_away_from_zero() {
        let entry = entry("-1", "-0.125", "x");

        assert!(movement_line(&entry, "").ends_with("D000000000.13"));
    }

    #[test]
    fn large_amounts_widen_the_field() {
        let entry = entry("-2000000000", "-1234567890.5", "x");

        assert_eq!(movement_line(&entry, ""), ":61:190210D1234567890.50");
    }

    #[test]
    fn widened_amounts_parse_back() {
        let entry = entry("-20000000000", "-12345678901.25", "x");
        let line = movement_line(&entry, "N545");
        assert_eq!(line, ":61:190210D12345678901.25N545");

        let parsed = parse_movement_line(&line).unwrap();

        assert_eq!(parsed.amount, Decimal::new(1234567890125, 2));
        assert_eq!(parsed.suffix, "N545");

        // A suffix starting with digits stays out of the amount.
        let parsed = parse_movement_line(&movement_line(&entry, "12.5")).unwrap();
        assert_eq!(parsed.amount, Decimal::new(1234567890125, 2));
        assert_eq!(parsed.suffix, "12.5");
    }

    #[test]
    fn descriptions_stay_on_one_line() {
        let entry = entry("-1", "-1", "two\r\nlines");

        assert_eq!(description_line(&entry), ":86:two  lines (USD -1.00)");
    }

    #[test]
    fn movement_line_round_trip() {
        let entry = entry("-4.5", "-3.7516", "Coffee Shop");
        let line = movement_line(&entry, DEFAULT_SUFFIX);

        let parsed = parse_movement_line(&format!("{line}\r\n")).unwrap();

        assert_eq!(parsed.date, entry.time.date_naive());
        assert_eq!(parsed.mark, Mark::Debit);
        assert_eq!(parsed.amount, Decimal::new(375, 2));
        assert_eq!(parsed.suffix, DEFAULT_SUFFIX);
    }

    #[test]
    fn balance_line_round_trip() {
        let config = StatementConfig::default();
        let line = format!(":60F:{}", balance_field(&config.opening_balance));

        assert_eq!(parse_balance_line(&line).unwrap(), config.opening_balance);
    }

    #[test]
    fn malformed_movement_lines() {
        assert_eq!(
            parse_movement_line(":86:nope").unwrap_err(),
            StatementParseError::Tag(":61:")
        );
        assert_eq!(
            parse_movement_line(":61:1902").unwrap_err(),
            StatementParseError::Truncated("date")
        );
        assert_eq!(
            parse_movement_line(":61:190210X000000003.75").unwrap_err(),
            StatementParseError::Mark("X".to_string())
        );
        assert_eq!(
            parse_movement_line(":61:190230D000000003.75").unwrap_err(),
            StatementParseError::Date("190230".to_string())
        );
        assert_eq!(
            parse_movement_line(":61:190210D-00000003.75").unwrap_err(),
            StatementParseError::Amount("-00000003.75".to_string())
        );
        assert_eq!(
            parse_movement_line(":61:190210D000000000375N").unwrap_err(),
            StatementParseError::Amount("000000000375".to_string())
        );
        assert_eq!(
            parse_movement_line(":61:190210D00000003.7").unwrap_err(),
            StatementParseError::Truncated("amount")
        );
    }

    const DEFAULT_SUFFIX: &str = crate::model::constants::DEFAULT_ENTRY_SUFFIX;
}
