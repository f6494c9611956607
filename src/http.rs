//! Outbound HTTP with an on-disk response cache and retry on transient failure.
//!
//! Requests are identified by a signature: the URL with its query
//! parameters sorted by name. A fresh cached body under that signature is
//! served without touching the network. Otherwise the request is sent
//! through a `reqwest-retry` middleware that retries timeouts, connection
//! errors and transient statuses (5xx, 408, 429) with capped exponential
//! backoff. Successful bodies replace whatever was stored before.

use reqwest::Url;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{Jitter, RetryTransientMiddleware, policies::ExponentialBackoff};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::cache::PersistentCache;
use crate::error::WeatherError;

/// Retry, timeout and cache policy for [`CachingHttpClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct HttpClientConfig {
    /// Time-to-live for cached responses
    pub ttl: Duration,
    /// Total attempts per request, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry
    pub backoff_base: Duration,
    /// Upper bound for a single backoff delay
    pub backoff_max: Duration,
    /// Timeout for a single attempt
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            max_attempts: 5,
            backoff_base: Duration::from_millis(200),
            backoff_max: Duration::from_secs(10),
            timeout: Duration::from_secs(10),
            user_agent: format!("ai-weather/{}", crate::VERSION),
        }
    }
}

/// Body of a successful GET, and whether it came from the cache
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub body: String,
    pub from_cache: bool,
}

/// Caching, retrying GET client.
///
/// Cheap to clone; clones share the HTTP connection pool, the cache store
/// and the per-signature locks.
#[derive(Clone)]
pub struct CachingHttpClient {
    client: ClientWithMiddleware,
    cache: PersistentCache,
    config: HttpClientConfig,
    in_flight: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl CachingHttpClient {
    /// Build a client whose cache lives under `cache_dir`
    pub fn new(config: HttpClientConfig, cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref();
        let cache = PersistentCache::open(cache_dir).map_err(|e| {
            WeatherError::cache(format!(
                "Failed to open cache database at {}: {e}",
                cache_dir.display()
            ))
        })?;
        Self::with_cache(config, cache)
    }

    pub fn with_cache(config: HttpClientConfig, cache: PersistentCache) -> Result<Self> {
        if config.max_attempts == 0 {
            return Err(WeatherError::config("max_attempts must be at least 1"));
        }
        if config.backoff_base > config.backoff_max {
            return Err(WeatherError::config(
                "backoff_base cannot exceed backoff_max",
            ));
        }

        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| WeatherError::config(format!("Failed to create HTTP client: {e}")))?;

        // Delay before retry n is base * 2^n, capped, no jitter
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(config.backoff_base, config.backoff_max)
            .jitter(Jitter::None)
            .base(2)
            .build_with_max_retries(config.max_attempts - 1);

        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            cache,
            config,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Default time-to-live for cached responses
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        self.config.ttl
    }

    /// GET `url` with `params`, serving a fresh cached body when one exists.
    ///
    /// Concurrent calls with the same signature are serialized, so only the
    /// first one reaches the network and the rest read its cached body.
    #[instrument(skip(self, params), fields(url = %url))]
    pub async fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        ttl: Duration,
    ) -> Result<HttpResponse> {
        let request_url = build_url(url, params)?;
        let signature = request_url.to_string();

        let _guard = self.lock_signature(&signature).await;

        match self.cache.get::<String>(&signature).await {
            Ok(Some(body)) => {
                debug!("Serving response from cache");
                self.release_signature(&signature).await;
                return Ok(HttpResponse {
                    body,
                    from_cache: true,
                });
            }
            Ok(None) => debug!("Cache miss"),
            Err(e) => warn!("Cache read failed, fetching fresh: {e}"),
        }

        let fetched = self.send(request_url).await;
        if let Ok(body) = &fetched {
            if let Err(e) = self.cache.put(&signature, body.clone(), ttl).await {
                warn!("Failed to store response in cache: {e}");
            }
        }
        self.release_signature(&signature).await;

        fetched.map(|body| HttpResponse {
            body,
            from_cache: false,
        })
    }

    /// GET with retries but without reading or writing the cache
    #[instrument(skip(self, params), fields(url = %url))]
    pub async fn get_fresh(&self, url: &str, params: &[(&str, String)]) -> Result<String> {
        let request_url = build_url(url, params)?;
        self.send(request_url).await
    }

    async fn send(&self, url: Url) -> Result<String> {
        let started = Instant::now();
        let attempts = self.config.max_attempts;
        let display_url = redact(&url);

        let response = self.client.get(url).send().await.map_err(|e| {
            let cause = error_chain(&e);
            warn!("Request to {display_url} failed: {cause}");
            WeatherError::network(cause, attempts)
        })?;

        let status = response.status();
        if status.is_server_error()
            || status == reqwest::StatusCode::REQUEST_TIMEOUT
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            warn!("Transient status {status} persisted across {attempts} attempt(s)");
            return Err(WeatherError::network(
                format!("last response was HTTP {status}"),
                attempts,
            ));
        }
        if !status.is_success() {
            warn!("Terminal status {status} from {display_url}");
            return Err(WeatherError::http_status(status.as_u16(), display_url));
        }

        let body = response
            .text()
            .await
            .map_err(|e| WeatherError::network(format!("failed to read body: {e}"), attempts))?;

        info!(
            "Fetched {} bytes in {:.3}s",
            body.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(body)
    }

    async fn lock_signature(&self, signature: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight
                .entry(signature.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    async fn release_signature(&self, signature: &str) {
        let mut in_flight = self.in_flight.lock().await;
        // Only the map and the caller's guard hold it: nobody else is waiting
        if in_flight
            .get(signature)
            .is_some_and(|lock| Arc::strong_count(lock) <= 2)
        {
            in_flight.remove(signature);
        }
    }
}

/// Build the request URL with parameters sorted by name, then value.
///
/// The string form of the result is the request signature.
pub fn build_url(base: &str, params: &[(&str, String)]) -> Result<Url> {
    let mut sorted: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
    sorted.sort_unstable();
    Url::parse_with_params(base, sorted)
        .map_err(|e| WeatherError::validation(format!("invalid URL '{base}': {e}")))
}

/// Render an error with all of its sources, skipping causes whose text
/// is already included
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_ignores_parameter_order() {
        let a = build_url(
            "https://api.example.org/v1/forecast",
            &[("longitude", "2.35".into()), ("latitude", "48.85".into())],
        )
        .unwrap();
        let b = build_url(
            "https://api.example.org/v1/forecast",
            &[("latitude", "48.85".into()), ("longitude", "2.35".into())],
        )
        .unwrap();
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(
            a.to_string(),
            "https://api.example.org/v1/forecast?latitude=48.85&longitude=2.35"
        );
    }

    #[test]
    fn test_signature_encodes_values() {
        let url = build_url(
            "https://geo.example.org/search",
            &[("name", "Saint-Étienne du Rouvray".into())],
        )
        .unwrap();
        assert!(url.as_str().starts_with("https://geo.example.org/search?name=Saint"));
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = build_url("not a url", &[]).unwrap_err();
        assert!(matches!(err, WeatherError::Validation { .. }));
    }

    #[test]
    fn test_redact_drops_query() {
        let url = Url::parse("https://api.example.org/v1/forecast?latitude=1").unwrap();
        assert_eq!(redact(&url), "https://api.example.org/v1/forecast");
    }

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(3600));
        assert_eq!(config.max_attempts, 5);
    }

    #[derive(Debug)]
    struct Layer(&'static str, Option<Box<Layer>>);

    impl std::fmt::Display for Layer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for Layer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            self.1.as_deref().map(|l| l as &(dyn std::error::Error + 'static))
        }
    }

    #[test]
    fn test_error_chain_keeps_root_cause() {
        let err = Layer(
            "Request failed after 4 retries",
            Some(Box::new(Layer(
                "error sending request",
                Some(Box::new(Layer("operation timed out", None))),
            ))),
        );
        assert_eq!(
            error_chain(&err),
            "Request failed after 4 retries: error sending request: operation timed out"
        );
    }

    #[test]
    fn test_error_chain_skips_repeated_text() {
        let err = Layer(
            "connect failed: refused",
            Some(Box::new(Layer("refused", None))),
        );
        assert_eq!(error_chain(&err), "connect failed: refused");
    }

    #[tokio::test]
    async fn test_backoff_base_above_cap_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = HttpClientConfig {
            backoff_base: Duration::from_secs(30),
            backoff_max: Duration::from_secs(1),
            ..HttpClientConfig::default()
        };
        let err = CachingHttpClient::new(config, dir.path()).err().unwrap();
        assert!(matches!(err, WeatherError::Config { .. }));
    }

    #[tokio::test]
    async fn test_zero_attempts_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = HttpClientConfig {
            max_attempts: 0,
            ..HttpClientConfig::default()
        };
        let err = CachingHttpClient::new(config, dir.path()).err().unwrap();
        assert!(matches!(err, WeatherError::Config { .. }));
    }
}
