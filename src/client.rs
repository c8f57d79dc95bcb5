//! Toon API client
//!
//! Owns the session (token, HTTP client, active agreement), issues the
//! request/response calls and hands the live update channel its context.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::json;
use tokio::sync::{watch, Mutex, RwLock};

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::live::{self, ChannelState, ListenerContext, ListenerHandle};
use crate::models::{ActiveState, Agreement, ProgramState, Status, StatusUpdate, ThermostatUpdate};

const API_VERSION: &str = "v3";

/// Supplies the bearer token for each request.
///
/// Implement this to plug in an OAuth refresh flow; the provider is
/// consulted before every request and every stream (re)connect, so a
/// rotated token is picked up without restarting the session.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Fixed token, for sessions that outlive their work.
struct StaticToken(String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone)]
struct ActiveAgreement {
    agreement_id: String,
    display_common_name: String,
}

/// Main handle for the Quby Toon cloud API.
pub struct Toon {
    http: reqwest::Client,
    config: ApiConfig,
    token: Arc<dyn TokenProvider>,
    user_agent: String,
    /// Most recent listing, kept for the defensive activation check.
    agreements: RwLock<Vec<Agreement>>,
    active: RwLock<Option<ActiveAgreement>>,
    status: Arc<RwLock<Option<Status>>>,
    listener: Mutex<Option<ListenerHandle>>,
    state_tx: Arc<watch::Sender<ChannelState>>,
    state_rx: watch::Receiver<ChannelState>,
    closed: AtomicBool,
}

impl Toon {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_config(token, ApiConfig::default())
    }

    pub fn with_config(token: impl Into<String>, config: ApiConfig) -> Self {
        Self::build(Arc::new(StaticToken(token.into())), config, None)
    }

    /// Use a token provider instead of a fixed token.
    pub fn with_token_provider(provider: Arc<dyn TokenProvider>, config: ApiConfig) -> Self {
        Self::build(provider, config, None)
    }

    /// Reuse an externally constructed HTTP client.
    pub fn with_http_client(
        token: impl Into<String>,
        config: ApiConfig,
        http: reqwest::Client,
    ) -> Self {
        Self::build(Arc::new(StaticToken(token.into())), config, Some(http))
    }

    fn build(
        token: Arc<dyn TokenProvider>,
        config: ApiConfig,
        http: Option<reqwest::Client>,
    ) -> Self {
        let http = http.unwrap_or_else(|| {
            reqwest::Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .unwrap_or_default()
        });

        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("RustToonAPI/{}", env!("CARGO_PKG_VERSION")));

        let (state_tx, state_rx) = watch::channel(ChannelState::Disconnected);

        Self {
            http,
            config,
            token,
            user_agent,
            agreements: RwLock::new(Vec::new()),
            active: RwLock::new(None),
            status: Arc::new(RwLock::new(None)),
            listener: Mutex::new(None),
            state_tx: Arc::new(state_tx),
            state_rx,
            closed: AtomicBool::new(false),
        }
    }

    /// List the utility agreements linked to the account, in vendor order.
    ///
    /// The result is also retained to validate a later activation.
    pub async fn agreements(&self) -> Result<Vec<Agreement>> {
        let value = self
            .request(Method::GET, &format!("/toon/{API_VERSION}/agreements"), None)
            .await?
            .ok_or_else(|| Error::Api {
                status: StatusCode::NO_CONTENT.as_u16(),
                message: "empty agreements response".to_string(),
            })?;

        let agreements: Vec<Agreement> = serde_json::from_value(value).map_err(|e| Error::Api {
            status: StatusCode::OK.as_u16(),
            message: format!("malformed agreements payload: {e}"),
        })?;

        *self.agreements.write().await = agreements.clone();
        Ok(agreements)
    }

    /// Activate the agreement with the given id.
    ///
    /// Fetches the agreement list first if none was listed yet. Fails with
    /// [`Error::UnknownAgreement`] when the id is not part of the most
    /// recently listed set; the vendor itself does not validate this.
    pub async fn activate_agreement(&self, agreement_id: &str) -> Result<Agreement> {
        self.activate_matching(agreement_id, |agreement| {
            agreement.agreement_id == agreement_id
        })
        .await
    }

    /// Activate the agreement with the given display common name.
    pub async fn activate_agreement_by_display(
        &self,
        display_common_name: &str,
    ) -> Result<Agreement> {
        self.activate_matching(display_common_name, |agreement| {
            agreement.display_common_name == display_common_name
        })
        .await
    }

    async fn activate_matching<F>(&self, selector: &str, matches: F) -> Result<Agreement>
    where
        F: Fn(&Agreement) -> bool,
    {
        self.ensure_open()?;

        if self.agreements.read().await.is_empty() {
            self.agreements().await?;
        }

        let found = {
            let listed = self.agreements.read().await;
            listed.iter().find(|agreement| matches(agreement)).cloned()
        }
        .ok_or_else(|| Error::UnknownAgreement(selector.to_string()))?;

        *self.active.write().await = Some(ActiveAgreement {
            agreement_id: found.agreement_id.clone(),
            display_common_name: found.display_common_name.clone(),
        });
        // fresh snapshot; readings from a previous agreement are meaningless
        *self.status.write().await = Some(Status::new(found.clone()));

        tracing::info!("activated agreement {}", found.agreement_id);
        Ok(found)
    }

    /// Fetch the full current state and merge it into the snapshot.
    ///
    /// Sections the vendor omits (it skips unchanged ones) keep their
    /// previous values. Returns the merged snapshot.
    pub async fn update(&self) -> Result<Status> {
        let agreement_id = self.active_agreement_id().await?;

        let value = self
            .request(
                Method::GET,
                &format!("/toon/{API_VERSION}/{agreement_id}/status"),
                None,
            )
            .await?
            .ok_or_else(|| Error::Api {
                status: StatusCode::NO_CONTENT.as_u16(),
                message: "empty status response".to_string(),
            })?;

        let update: StatusUpdate = serde_json::from_value(value).map_err(|e| Error::Api {
            status: StatusCode::OK.as_u16(),
            message: format!("malformed status payload: {e}"),
        })?;

        let mut guard = self.status.write().await;
        let status = guard.as_mut().ok_or(Error::NoAgreementActivated)?;
        status.apply(update);
        Ok(status.clone())
    }

    /// Set the thermostat target temperature, in degrees Celsius.
    ///
    /// Puts the program into override, as the display itself does.
    pub async fn set_current_setpoint(&self, temperature: f64) -> Result<()> {
        let agreement_id = self.active_agreement_id().await?;

        let data = json!({
            "currentSetpoint": (temperature * 100.0).round() as i64,
            "programState": ProgramState::Override.as_raw(),
            "activeState": ActiveState::Off.as_raw(),
        });

        self.request(
            Method::PUT,
            &format!("/toon/{API_VERSION}/{agreement_id}/thermostat"),
            Some(data.clone()),
        )
        .await?;

        self.merge_thermostat(data).await;
        Ok(())
    }

    /// Switch the thermostat preset.
    pub async fn set_active_state(
        &self,
        active_state: ActiveState,
        program_state: ProgramState,
    ) -> Result<()> {
        let agreement_id = self.active_agreement_id().await?;

        let data = json!({
            "programState": program_state.as_raw(),
            "activeState": active_state.as_raw(),
        });

        self.request(
            Method::PUT,
            &format!("/toon/{API_VERSION}/{agreement_id}/thermostat"),
            Some(data.clone()),
        )
        .await?;

        self.merge_thermostat(data).await;
        Ok(())
    }

    /// Merge a thermostat write back into the snapshot without waiting for
    /// the next poll, the way the display itself reflects it immediately.
    async fn merge_thermostat(&self, data: serde_json::Value) {
        let Ok(patch) = serde_json::from_value::<ThermostatUpdate>(data) else {
            return;
        };
        let mut guard = self.status.write().await;
        if let Some(status) = guard.as_mut() {
            status.thermostat.apply(patch, chrono::Utc::now());
        }
    }

    /// Start the live update channel for the active agreement.
    ///
    /// `on_update` fires once per merged update with the post-merge
    /// snapshot; `on_error` fires once if the channel becomes
    /// unrecoverable after the configured reconnect budget.
    pub async fn subscribe<U, E>(&self, on_update: U, on_error: E) -> Result<()>
    where
        U: Fn(Status) + Send + Sync + 'static,
        E: Fn(Error) + Send + Sync + 'static,
    {
        self.ensure_open()?;
        let active = self
            .active
            .read()
            .await
            .clone()
            .ok_or(Error::NoAgreementActivated)?;

        let mut listener = self.listener.lock().await;
        if let Some(handle) = listener.as_ref() {
            if !handle.is_finished() {
                return Err(Error::AlreadySubscribed);
            }
        }

        let context = ListenerContext {
            endpoint: self.stream_endpoint(&active.agreement_id)?,
            token: Arc::clone(&self.token),
            status: Arc::clone(&self.status),
            on_update: Arc::new(on_update),
            on_error: Arc::new(on_error),
            config: self.config.listen.clone(),
            state: Arc::clone(&self.state_tx),
        };

        *listener = Some(live::spawn(context));
        Ok(())
    }

    /// Stop the live update channel. No-op when nothing is subscribed.
    pub async fn unsubscribe(&self) {
        let handle = self.listener.lock().await.take();
        if let Some(handle) = handle {
            handle.shutdown().await;
            let _ = self.state_tx.send(ChannelState::Closed);
        }
    }

    /// Current state of the live update channel.
    pub fn channel_state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    /// Watch channel state transitions.
    pub fn channel_state_watch(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// The last merged snapshot, if an agreement has been activated.
    pub async fn status(&self) -> Option<Status> {
        self.status.read().await.clone()
    }

    /// Close the session: stops the live update channel and rejects any
    /// further calls. Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let handle = self.listener.lock().await.take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
        let _ = self.state_tx.send(ChannelState::Closed);
        tracing::debug!("session closed");
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }

    async fn active_agreement_id(&self) -> Result<String> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|active| active.agreement_id.clone())
            .ok_or(Error::NoAgreementActivated)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn stream_endpoint(&self, agreement_id: &str) -> Result<String> {
        let base = match &self.config.stream_url {
            Some(stream) => stream.clone(),
            None => live::websocket_url(&self.config.base_url).ok_or_else(|| {
                Error::Config(format!(
                    "cannot derive a stream URL from {}",
                    self.config.base_url
                ))
            })?,
        };
        Ok(format!(
            "{}/toon/{API_VERSION}/{agreement_id}/updates",
            base.trim_end_matches('/')
        ))
    }

    /// Issue a request against the API, mapping status codes into the error
    /// taxonomy and retrying transient failures with exponential backoff.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Option<serde_json::Value>> {
        self.ensure_open()?;

        let url = self.endpoint(path);
        let token = self.token.access_token().await?;
        let agreement = self.active.read().await.clone();

        let mut backoff = Duration::from_millis(self.config.retry_backoff_ms);
        let mut attempt: u32 = 0;

        loop {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .header("Authorization", format!("Bearer {token}"))
                .header("User-Agent", &self.user_agent)
                .header("Accept", "application/json");

            if let Some(active) = &agreement {
                request = request
                    .header("X-Agreement-ID", &active.agreement_id)
                    .header("X-Common-Name", &active.display_common_name);
            }
            if let Some(body) = &body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    if attempt < self.config.request_retries {
                        attempt += 1;
                        tracing::warn!(
                            "request to {url} failed ({e}), retry {attempt} in {backoff:?}"
                        );
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                        continue;
                    }
                    return Err(if e.is_timeout() {
                        Error::Timeout
                    } else {
                        Error::Transport(e.to_string())
                    });
                }
            };

            let status = response.status();

            if status == StatusCode::NO_CONTENT {
                return Ok(None);
            }

            if status.is_success() {
                let content_type = response
                    .headers()
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("");
                // control endpoints answer without a body
                if !content_type.contains("application/json") {
                    return Ok(None);
                }
                let value =
                    response
                        .json::<serde_json::Value>()
                        .await
                        .map_err(|e| Error::Api {
                            status: status.as_u16(),
                            message: format!("invalid JSON body: {e}"),
                        })?;
                return Ok(Some(value));
            }

            match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    return Err(Error::Authentication(format!(
                        "server replied with {status}"
                    )));
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = parse_retry_after(&response);
                    if attempt < self.config.request_retries {
                        attempt += 1;
                        let delay = retry_after.unwrap_or(backoff);
                        tracing::warn!("rate limited, retry {attempt} in {delay:?}");
                        tokio::time::sleep(delay).await;
                        backoff *= 2;
                        continue;
                    }
                    return Err(Error::RateLimit { retry_after });
                }
                status if status.is_server_error() => {
                    if attempt < self.config.request_retries {
                        attempt += 1;
                        tracing::warn!(
                            "server replied with {status}, retry {attempt} in {backoff:?}"
                        );
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                        continue;
                    }
                    return Err(Error::Api {
                        status: status.as_u16(),
                        message: error_body(response).await,
                    });
                }
                status => {
                    return Err(Error::Api {
                        status: status.as_u16(),
                        message: error_body(response).await,
                    });
                }
            }
        }
    }
}

impl Drop for Toon {
    fn drop(&mut self) {
        // releases the live channel on every exit path, panics included
        if let Ok(mut listener) = self.listener.try_lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }
}

fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

async fn error_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(text) if !text.is_empty() => text,
        _ => "no response body".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_cleanly() {
        let toon = Toon::with_config(
            "token",
            ApiConfig {
                base_url: "http://localhost:1234/".to_string(),
                ..ApiConfig::default()
            },
        );
        assert_eq!(
            toon.endpoint("/toon/v3/agreements"),
            "http://localhost:1234/toon/v3/agreements"
        );
    }

    #[test]
    fn test_stream_endpoint_prefers_override() {
        let toon = Toon::with_config(
            "token",
            ApiConfig {
                base_url: "https://api.toon.eu".to_string(),
                stream_url: Some("ws://127.0.0.1:9000".to_string()),
                ..ApiConfig::default()
            },
        );
        assert_eq!(
            toon.stream_endpoint("1665").unwrap(),
            "ws://127.0.0.1:9000/toon/v3/1665/updates"
        );

        let toon = Toon::new("token");
        assert_eq!(
            toon.stream_endpoint("1665").unwrap(),
            "wss://api.toon.eu/toon/v3/1665/updates"
        );
    }
}
