use padding_oracle::{decrypt_concurrently, AttackConfig, OracleClient, PaddingOracleAttack};

use anyhow::Context;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AttackConfig::from_env()?;
    info!(
        oracle = %config.address(),
        timeout_secs = config.timeout.as_secs(),
        workers = config.workers,
        ciphertext_len = config.ciphertext.len(),
        "starting padding oracle attack"
    );

    let address = config.address();
    let (plaintext, oracles) = if config.workers > 1 {
        decrypt_concurrently(&config.ciphertext, config.workers, || {
            OracleClient::connect(address.clone(), config.timeout)
        })
        .await
        .with_context(|| format!("attack against oracle at {address} failed"))?
    } else {
        let oracle = OracleClient::connect(address.clone(), config.timeout)
            .await
            .with_context(|| format!("could not reach oracle at {address}"))?;
        let mut attack = PaddingOracleAttack::new(oracle);
        let plaintext = attack
            .decrypt(&config.ciphertext)
            .await
            .with_context(|| format!("attack against oracle at {address} failed"))?;
        (plaintext, vec![attack.into_inner()])
    };

    let queries: u64 = oracles.iter().map(OracleClient::queries).sum();
    info!(queries, connections = oracles.len(), "attack finished");
    for oracle in oracles {
        oracle.disconnect().await?;
    }

    println!("Result: {}", String::from_utf8_lossy(&plaintext));
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("padding_oracle=info")),
        )
        .init();
}
