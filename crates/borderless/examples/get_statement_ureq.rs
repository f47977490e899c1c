use borderless::chrono::{Duration, Utc};
use borderless::http::header::AUTHORIZATION;
use borderless::statement::{Borderless, Statement};
use std::env;
use ureq::tls::{TlsConfig, TlsProvider};
use ureq::Agent;

fn main() -> anyhow::Result<()> {
    let agent = Agent::from(
        Agent::config_builder()
            .tls_config(
                TlsConfig::builder()
                    .provider(TlsProvider::NativeTls)
                    .build(),
            )
            .build(),
    );
    let api_server =
        env::var("FXBASIS_API_URL").unwrap_or_else(|_| "https://api.transferwise.com/".to_string());
    let token = env::var("FXBASIS_API_TOKEN")?;
    let borderless = Borderless::new(api_server)?;

    let account_id: u64 = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Missing account ID"))?
        .parse()?;
    let currency = env::args().nth(2).unwrap_or_else(|| "USD".to_string());

    let end = Utc::now();
    let start = end - Duration::days(60);
    let mut req = borderless.get_statement(account_id, &currency, start, end);
    req.headers_mut()
        .insert(AUTHORIZATION, format!("Bearer {token}").parse()?);

    let mut resp = agent.run(req)?;
    let statement: Statement = resp.body_mut().read_json()?;

    for tx in &statement.transactions {
        println!(
            "{} {:>8} {:>12} {} {}",
            tx.date, tx.details.kind, tx.amount.value, tx.amount.currency, tx.details.description
        );
    }

    Ok(())
}
