//! Asynchronous Rust client for the Quby Toon cloud API
//!
//! Lists and activates utility agreements, polls device status (gas, power
//! and water usage, thermostat state), controls the thermostat, and can keep
//! a live update channel open that merges incremental pushes into the same
//! status snapshot.
//!
//! ```no_run
//! use toonapi::Toon;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let toon = Toon::new("put-in-token-here");
//!
//!     let agreements = toon.agreements().await?;
//!     toon.activate_agreement(&agreements[0].agreement_id).await?;
//!
//!     let status = toon.update().await?;
//!     println!("current temperature: {:?}", status.thermostat.current_display_temperature);
//!     println!("gas used today: {:?} m3", status.gas_usage.day_usage);
//!
//!     toon.close().await;
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod live;
mod models;

pub use client::{Toon, TokenProvider};
pub use config::{ApiConfig, ListenConfig};
pub use error::{Error, Result};
pub use live::ChannelState;
pub use models::{
    ActiveState, Agreement, BurnerState, GasUsage, PowerUsage, ProgramState, Status,
    ThermostatInfo, WaterUsage,
};
