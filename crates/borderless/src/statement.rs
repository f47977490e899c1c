//! An implementation of the borderless account statement protocol. The main type is the
//! [`Borderless`] client.

pub use self::transaction::{Details, Error, Money, Statement, StatementTransaction};
use crate::{append_path_and_query, Req};
use chrono::{DateTime, SecondsFormat, Utc};
use http::{Request, Uri};

mod transaction;

/// The main statement API client.
#[derive(Clone, Debug)]
pub struct Borderless {
    req: Req,
}

impl Borderless {
    /// Statement API client constructor.
    ///
    /// The API endpoint string must be a valid [`Uri`].
    ///
    /// # Example
    ///
    /// ```
    /// # use borderless::statement::Borderless;
    /// # fn main() -> anyhow::Result<()> {
    /// let borderless = Borderless::new("https://api.transferwise.com/")?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Panics
    ///
    /// This function asserts that the API server URL has both a scheme and host component. This
    /// disallows the use of relative URIs like `/hello/world` and non-network URIs like `data:` and
    /// `mailto:`.
    pub fn new<U>(api: U) -> Result<Self, http::Error>
    where
        U: TryInto<Uri>,
        <U as TryInto<Uri>>::Error: Into<http::Error>,
    {
        let req = Request::get(api).body(())?;
        assert!(req.uri().scheme().is_some());
        assert!(req.uri().host().is_some());

        Ok(Self { req })
    }

    /// Get the account [`Statement`] for `currency` in the interval `[start, end]`.
    ///
    /// Returns a [`Req`] which can be sent by your preferred HTTP client. Authorization is left to
    /// the caller.
    ///
    /// The response can be deserialized from JSON into a [`Statement`].
    pub fn get_statement(
        &self,
        account_id: u64,
        currency: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Req {
        let mut req = self.req.clone();
        let path = format!("v1/borderless-accounts/{account_id}/statement.json");
        let query = [
            ("currency", currency.to_string()),
            ("intervalStart", format_interval(start)),
            ("intervalEnd", format_interval(end)),
        ];
        append_path_and_query(&mut req, path, &query);

        req
    }
}

/// Interval bounds are sent with millisecond precision in UTC.
fn format_interval(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_statement() {
        let client = Borderless::new("https://api.transferwise.com/").unwrap();
        let start = "2019-01-01T00:00:00Z".parse().unwrap();
        let end = "2019-03-01T23:59:59Z".parse().unwrap();
        let req = client.get_statement(1540801, "USD", start, end);
        let uri = req.uri();

        assert_eq!(uri.scheme_str(), Some("https"));
        assert_eq!(uri.host(), Some("api.transferwise.com"));
        assert_eq!(
            uri.path(),
            "/v1/borderless-accounts/1540801/statement.json"
        );
        assert_eq!(
            uri.query(),
            Some(
                "currency=USD&intervalStart=2019-01-01T00:00:00.000Z\
                 &intervalEnd=2019-03-01T23:59:59.000Z"
            )
        );
    }

    #[test]
    fn test_empty_path() {
        let client = Borderless::new("http://localhost:3001").unwrap();
        let time = "2020-06-15T12:30:00Z".parse().unwrap();
        let req = client.get_statement(7, "GBP", time, time);
        let uri = req.uri();

        assert_eq!(uri.scheme_str(), Some("http"));
        assert_eq!(uri.host(), Some("localhost"));
        assert_eq!(uri.port_u16(), Some(3001));
        assert_eq!(uri.path(), "/v1/borderless-accounts/7/statement.json");
    }

    #[test]
    fn test_nested_api_root() {
        let client = Borderless::new("https://example.com/proxy/").unwrap();
        let time = "2020-06-15T12:30:00Z".parse().unwrap();
        let req = client.get_statement(1, "USD", time, time);

        assert_eq!(
            req.uri().path(),
            "/proxy/v1/borderless-accounts/1/statement.json"
        );
    }
}
