use crate::{config::Config, session::SessionStore, Error, Result};
use raspadinha_types::{Amount, Envelope};
use reqwest::{multipart::Form, Client as HttpClient, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

/// Timeout for connections and requests
const TIMEOUT: Duration = Duration::from_secs(30);

/// Retry policy for transient HTTP failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request (including the first attempt).
    pub max_attempts: usize,
    /// Initial backoff delay after the first retryable failure.
    pub initial_backoff: Duration,
    /// Maximum backoff delay between attempts.
    pub max_backoff: Duration,
    /// Whether non-idempotent requests (e.g., POST) may be retried.
    pub retry_non_idempotent: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
            retry_non_idempotent: false,
        }
    }
}

/// Amount limits enforced locally before a request is sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub min_deposit: Amount,
    pub min_withdrawal: Amount,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_deposit: Amount::from_reais(10),
            min_withdrawal: Amount::from_reais(20),
        }
    }
}

/// Raspadinha API client
#[derive(Clone)]
pub struct Client {
    pub base_url: Url,
    pub http_client: HttpClient,

    session: SessionStore,
    limits: Limits,
    retry_policy: RetryPolicy,
}

impl Client {
    /// Create a new client with an in-memory session.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, TIMEOUT)
    }

    /// Create a client from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Self::with_timeout(&config.api_url, config.request_timeout())?
            .with_limits(config.limits())
            .with_retry_policy(config.retry_policy());
        Ok(client)
    }

    fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        match base_url.scheme() {
            "http" | "https" => {}
            scheme => return Err(Error::InvalidScheme(scheme.to_string())),
        }

        // Relative joins drop the last path segment unless it ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = HttpClient::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            http_client,
            session: SessionStore::in_memory(),
            limits: Limits::default(),
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Returns a new client sharing the provided session store.
    pub fn with_session(mut self, session: SessionStore) -> Self {
        self.session = session;
        self
    }

    /// Returns a new client with the provided limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns a new client with the provided retry policy.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Returns a copy of the current retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.call::<(), T>(Method::GET, path, None, true).await
    }

    pub(crate) async fn get_public<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.call::<(), T>(Method::GET, path, None, false).await
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::POST, path, Some(body), true).await
    }

    pub(crate) async fn post_public<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::POST, path, Some(body), false).await
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::PUT, path, Some(body), true).await
    }

    pub(crate) async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::PATCH, path, Some(body), true).await
    }

    /// Send an authenticated request whose envelope carries no useful data.
    pub(crate) async fn call_unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<()> {
        let response = self.send(method, path, body, true).await?;
        self.read_envelope::<serde_json::Value>(response, true)
            .await
            .map(|_| ())
    }

    /// Send an authenticated multipart request. Never retried.
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T> {
        let url = self.base_url.join(path)?;
        let token = self.session.token().ok_or(Error::NotAuthenticated)?;
        debug!(%url, "sending multipart request");
        let response = self
            .http_client
            .post(url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        self.read_envelope::<T>(response, true)
            .await?
            .data
            .ok_or(Error::MissingData)
    }

    async fn call<B, T>(&self, method: Method, path: &str, body: Option<&B>, auth: bool) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, auth).await?;
        self.read_envelope::<T>(response, auth)
            .await?
            .data
            .ok_or(Error::MissingData)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: bool,
    ) -> Result<reqwest::Response> {
        let url = self.base_url.join(path)?;
        let token = if auth {
            Some(self.session.token().ok_or(Error::NotAuthenticated)?)
        } else {
            None
        };
        debug!(%method, %url, "sending request");

        self.send_with_retry(method.clone(), || {
            let mut request = self.http_client.request(method.clone(), url.clone());
            if let Some(token) = &token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }
            request
        })
        .await
    }

    async fn send_with_retry(
        &self,
        method: Method,
        make_request: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let max_attempts = if method == Method::GET || self.retry_policy.retry_non_idempotent {
            self.retry_policy.max_attempts.max(1)
        } else {
            1
        };

        let mut attempt = 0usize;
        let mut backoff = self.retry_policy.initial_backoff;
        loop {
            attempt += 1;
            let result = make_request().send().await;
            match result {
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable_status(status) || attempt >= max_attempts {
                        return Ok(response);
                    }
                    debug!(%status, attempt, "retrying request");
                }
                Err(err) => {
                    if attempt >= max_attempts || !is_retryable_error(&err) {
                        return Err(Error::Reqwest(err));
                    }
                    debug!(error = %err, attempt, "retrying request");
                }
            }

            if backoff > Duration::ZERO {
                sleep(backoff).await;
                backoff = std::cmp::min(backoff.saturating_mul(2), self.retry_policy.max_backoff);
            }
        }
    }

    /// Decode the response envelope, mapping failures onto [`Error`].
    async fn read_envelope<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        auth: bool,
    ) -> Result<Envelope<T>> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            if auth && status == StatusCode::UNAUTHORIZED {
                warn!("session rejected by server; clearing");
                if let Err(err) = self.session.clear() {
                    warn!(error = %err, "failed to clear session");
                }
            }
            let message = serde_json::from_slice::<Envelope<serde_json::Value>>(&bytes)
                .ok()
                .and_then(|envelope| envelope.message)
                .filter(|message| !message.trim().is_empty());
            return Err(match message {
                Some(message) => Error::Rejected { status, message },
                None => Error::Failed(status),
            });
        }

        let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
        if !envelope.success {
            return Err(match envelope.message {
                Some(message) if !message.trim().is_empty() => Error::Api(message),
                _ => Error::Unsuccessful,
            });
        }
        Ok(envelope)
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}
