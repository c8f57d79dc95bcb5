//! Error types for the Toon API client

use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The API rejected the bearer token (401/403).
    #[error("authentication with the Toon API failed: {0}")]
    Authentication(String),

    /// The API kept answering 429 after the configured retries.
    #[error("rate limited by the Toon API (retry after {retry_after:?})")]
    RateLimit { retry_after: Option<Duration> },

    /// Non-2xx response or a payload that does not match the vendor schema.
    #[error("Toon API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// A request did not complete within the configured timeout.
    #[error("timeout while communicating with the Toon API")]
    Timeout,

    /// Network-level failure after the configured retries.
    #[error("error communicating with the Toon API: {0}")]
    Transport(String),

    /// The live update channel gave up after the configured reconnect budget.
    #[error("live update channel unrecoverable after {attempts} connection attempts")]
    Connection { attempts: u32 },

    /// The requested agreement is not part of the most recently listed set.
    #[error("agreement not found on the linked account: {0}")]
    UnknownAgreement(String),

    /// Status or control calls require an activated agreement.
    #[error("no agreement has been activated")]
    NoAgreementActivated,

    /// A live update subscription is already running for this session.
    #[error("a live update subscription is already active")]
    AlreadySubscribed,

    /// The session was closed; create a new client to continue.
    #[error("session is closed")]
    SessionClosed,

    /// Configuration could not be loaded or is not usable.
    #[error("configuration error: {0}")]
    Config(String),
}
