//! A multi-currency account statement API client, [sans I/O]. (Bring your own sync/async HTTP
//! client!)
//!
//! This library handles the protocol-layer aspects of the borderless account statement endpoint,
//! including ser-de and request-response abstractions.
//!
//! [sans I/O]: https://sans-io.readthedocs.io/how-to-sans-io.html
//!
//! # Sync example with `ureq`
//!
//! ```no_run
//! use borderless::statement::{Borderless, Statement};
//! use borderless::chrono::{Duration, Utc};
//!
//! fn main() -> anyhow::Result<()> {
//!     let agent = ureq::agent();
//!     let borderless = Borderless::new("https://api.transferwise.com/")?;
//!     let end = Utc::now();
//!     let start = end - Duration::days(60);
//!
//!     let mut req = borderless.get_statement(1540801, "USD", start, end);
//!     req.headers_mut().insert(
//!         borderless::http::header::AUTHORIZATION,
//!         "Bearer my-token".parse()?,
//!     );
//!     let mut resp = agent.run(req)?;
//!
//!     let statement: Statement = resp.body_mut().read_json()?;
//!
//!     println!("{statement:#?}");
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

pub use chrono;
pub use http;
pub use rust_decimal;

pub mod statement;

pub type Req = http::Request<()>;

/// Append a path and query string to the request.
pub(crate) fn append_path_and_query(req: &mut Req, path: String, query: &[(&str, String)]) {
    // The `http` crate has really bad ergonomics for updating paths.
    // SEE: https://github.com/hyperium/http/issues/594
    let req_uri = req.uri_mut();
    let mut uri_parts = req_uri.clone().into_parts();
    let root = req_uri.path();

    let mut path_and_query = format!("{root}{path}");
    for (index, (key, value)) in query.iter().enumerate() {
        path_and_query.push(if index == 0 { '?' } else { '&' });
        path_and_query.push_str(key);
        path_and_query.push('=');
        path_and_query.push_str(value);
    }

    // Keys are static and values are digits, ISO codes, or RFC 3339 timestamps, all of which are
    // valid in a URI query without escaping.
    uri_parts.path_and_query = Some(path_and_query.parse().unwrap());
    *req_uri = http::Uri::from_parts(uri_parts).unwrap();
}
