// # deSEC Zone Client
//
// This crate provides the deSEC implementation of `ZoneApi` for zonesync.
//
// ## Behavior
//
// - One HTTP request per call, no retry, no backoff
// - Fixed per-request timeout (10 seconds unless configured)
// - Every request additionally bounded by the caller's `RequestContext`
// - Non-2xx responses surface the method, path and raw body text
// - No caching: the token is the only state held
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Client construction fails if the token is empty
//
// ## API Reference
//
// - deSEC API: https://desec.readthedocs.io/en/latest/dns/domains.html
// - List domains: GET `/domains/`
// - List RRSets: GET `/domains/:name/rrsets/`
// - Bulk modify RRSets: PUT `/domains/:name/rrsets/`

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;
use zonesync_core::config::{DEFAULT_DESEC_BASE_URL, DEFAULT_HTTP_TIMEOUT_SECS, ProviderConfig};
use zonesync_core::error::UNREADABLE_BODY;
use zonesync_core::traits::{ZoneApi, ZoneApiFactory};
use zonesync_core::{Error, ProviderRegistry, RRSet, RequestContext, Result, Zone};

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS);

/// deSEC RRSet API client
///
/// Stateless apart from the credential. Retries and scheduling belong to the
/// caller.
pub struct DesecClient {
    /// deSEC API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API root, without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for DesecClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesecClient")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DesecClient {
    /// Create a client for the public deSEC API with the default timeout
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        Self::with_options(api_token, None, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a client with an explicit base URL and per-request timeout
    ///
    /// # Parameters
    ///
    /// - `api_token`: deSEC token, sent as `Authorization: Token <token>`
    /// - `base_url`: API root (defaults to `https://desec.io/api/v1`)
    /// - `timeout`: per-request timeout
    pub fn with_options(
        api_token: impl Into<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("deSEC API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_DESEC_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_token,
            base_url,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one request and return the body text of a 2xx response
    async fn send(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<String> {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        let url = format!("{}{}", self.base_url, path);

        tracing::debug!("{} {}", method, path);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(AUTHORIZATION, format!("Token {}", self.api_token))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.body(body);
        }

        ctx.run(async {
            let response = request
                .send()
                .await
                .map_err(|e| Error::network(method.as_str(), &path, describe(&e)))?;

            let status = response.status();
            if !status.is_success() {
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| UNREADABLE_BODY.to_string());
                tracing::debug!("{} {} returned {}", method, path, status);
                return Err(status_error(method.as_str(), &path, status.as_u16(), text));
            }

            response
                .text()
                .await
                .map_err(|e| Error::network(method.as_str(), &path, describe(&e)))
        })
        .await
    }

    /// Issue one GET request and decode its JSON response
    async fn get<T: DeserializeOwned>(&self, ctx: &RequestContext, path: &str) -> Result<T> {
        let text = self.send(ctx, Method::GET, path, None).await?;
        decode(Method::GET.as_str(), path, &text)
    }
}

/// Map a non-2xx status to an error carrying the raw body
pub fn status_error(method: &str, path: &str, status: u16, body: String) -> Error {
    match status {
        401 | 403 => Error::auth(method, path, body),
        400 | 422 => Error::validation(method, path, body),
        429 => Error::rate_limited(method, path, body),
        _ => Error::provider(method, path, status, body),
    }
}

fn decode<T: DeserializeOwned>(method: &str, path: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| Error::decode(method, path, e.to_string()))
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}

fn rrsets_path(zone: &str) -> Result<String> {
    if zone.is_empty() || zone.contains('/') {
        return Err(Error::invalid_input(format!("Invalid zone name: {:?}", zone)));
    }
    Ok(format!("/domains/{}/rrsets/", zone))
}

#[async_trait]
impl ZoneApi for DesecClient {
    async fn list_zones(&self, ctx: &RequestContext) -> Result<Vec<Zone>> {
        let zones: Vec<Zone> = self.get(ctx, "/domains/").await?;
        tracing::debug!("deSEC returned {} zone(s)", zones.len());
        Ok(zones)
    }

    async fn list_rrsets(&self, ctx: &RequestContext, zone: &str) -> Result<Vec<RRSet>> {
        let path = rrsets_path(zone)?;
        self.get(ctx, &path).await
    }

    async fn bulk_write_rrsets(
        &self,
        ctx: &RequestContext,
        zone: &str,
        rrsets: &[RRSet],
    ) -> Result<Vec<RRSet>> {
        let path = rrsets_path(zone)?;
        let payload = serde_json::to_vec(rrsets)?;

        tracing::info!("Submitting {} rrset(s) to deSEC zone {}", rrsets.len(), zone);

        let text = self.send(ctx, Method::PUT, &path, Some(payload)).await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        decode(Method::PUT.as_str(), &path, &text)
    }

    fn provider_name(&self) -> &'static str {
        "desec"
    }
}

/// Factory for creating deSEC clients
pub struct DesecFactory;

impl ZoneApiFactory for DesecFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneApi>> {
        match config {
            ProviderConfig::Desec {
                api_token,
                base_url,
                timeout_secs,
            } => {
                if api_token.is_empty() {
                    return Err(Error::config("deSEC API token is required"));
                }

                let timeout = timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT);

                Ok(Box::new(DesecClient::with_options(
                    api_token.clone(),
                    base_url.clone(),
                    timeout,
                )?))
            }
            _ => Err(Error::config("Invalid config for deSEC provider")),
        }
    }
}

/// Register the deSEC provider with a registry
///
/// # Example
///
/// ```rust
/// use zonesync_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// zonesync_provider_desec::register(&registry);
/// assert!(registry.has_provider("desec"));
/// ```
pub fn register(registry: &ProviderRegistry) {
    registry.register_provider("desec", Box::new(DesecFactory));
}
