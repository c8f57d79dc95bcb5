//! Example: poll status and follow live updates.

use std::time::Duration;

use toonapi::{ApiConfig, Toon};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toonapi=debug".into()),
        )
        .init();

    let config = ApiConfig::load()?;
    let toon = Toon::with_config("put-in-token-here", config);

    let agreements = toon.agreements().await?;
    for agreement in &agreements {
        println!(
            "agreement {} at {} {}",
            agreement.agreement_id,
            agreement.street.as_deref().unwrap_or("-"),
            agreement.house_number.as_deref().unwrap_or("-"),
        );
    }

    toon.activate_agreement(&agreements[0].agreement_id).await?;

    let status = toon.update().await?;
    println!("gas: {:?}", status.gas_usage);
    println!("thermostat: {:?}", status.thermostat);
    println!("power: {:?}", status.power_usage);

    toon.subscribe(
        |status| {
            println!(
                "live update: temperature {:?}, setpoint {:?}",
                status.thermostat.current_display_temperature,
                status.thermostat.current_setpoint,
            );
        },
        |error| {
            eprintln!("live update channel failed: {error}");
        },
    )
    .await?;

    tokio::time::sleep(Duration::from_secs(60)).await;

    toon.close().await;
    Ok(())
}
