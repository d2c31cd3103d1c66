//! Configuration types for zonesync
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::DomainFilter;
use crate::materializer::SupportedTypes;

/// Default deSEC API base URL
pub const DEFAULT_DESEC_BASE_URL: &str = "https://desec.io/api/v1";

/// Default per-request HTTP timeout (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Settings for a reconciliation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Which zones may be managed
    #[serde(default)]
    pub domain_filter: DomainFilter,

    /// Plan and log writes without submitting them
    #[serde(default)]
    pub dry_run: bool,

    /// Record types reported on the read path
    #[serde(default)]
    pub supported_types: SupportedTypes,

    /// Keep only the last RRSet per (subname, type) within a zone bucket
    ///
    /// Off by default: the deSEC bulk endpoint applies repeated entries in
    /// order. Turn this on for APIs that reject duplicates.
    #[serde(default)]
    pub collapse_duplicates: bool,

    /// Capacity of the sync event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SyncConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            domain_filter: DomainFilter::default(),
            dry_run: false,
            supported_types: SupportedTypes::default(),
            collapse_duplicates: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Restrict management to the given zone roots
    pub fn with_domain_filter(mut self, filter: DomainFilter) -> Self {
        self.domain_filter = filter;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enable or disable duplicate collapsing
    pub fn with_collapse_duplicates(mut self, collapse: bool) -> Self {
        self.collapse_duplicates = collapse;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        if self.supported_types.is_empty() {
            return Err(crate::Error::config(
                "At least one supported record type is required",
            ));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_event_channel_capacity() -> usize {
    256
}

/// Remote provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// deSEC RRSet API
    Desec {
        /// API token, sent as `Authorization: Token <token>`
        api_token: String,
        /// Base URL override (defaults to [`DEFAULT_DESEC_BASE_URL`])
        #[serde(default)]
        base_url: Option<String>,
        /// Per-request timeout in seconds (defaults to [`DEFAULT_HTTP_TIMEOUT_SECS`])
        #[serde(default)]
        timeout_secs: Option<u64>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Desec {
                api_token,
                base_url,
                timeout_secs,
            } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("deSEC API token cannot be empty"));
                }
                if let Some(url) = base_url
                    && !url.starts_with("https://")
                    && !url.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "deSEC base URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                if *timeout_secs == Some(0) {
                    return Err(crate::Error::config("HTTP timeout must be > 0"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Desec { .. } => "desec",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

// The API token must never reach logs
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderConfig::Desec {
                base_url,
                timeout_secs,
                ..
            } => f
                .debug_struct("Desec")
                .field("api_token", &"<REDACTED>")
                .field("base_url", base_url)
                .field("timeout_secs", timeout_secs)
                .finish(),
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", &"<REDACTED>")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desec(token: &str) -> ProviderConfig {
        ProviderConfig::Desec {
            api_token: token.to_string(),
            base_url: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(desec("").validate().is_err());
        assert!(desec("abc").validate().is_ok());
    }

    #[test]
    fn base_url_scheme_is_checked() {
        let config = ProviderConfig::Desec {
            api_token: "abc".to_string(),
            base_url: Some("ftp://desec.io".to_string()),
            timeout_secs: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", desec("super-secret-token"));
        assert!(!rendered.contains("super-secret-token"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn provider_config_is_tagged_by_type() {
        let config: ProviderConfig =
            serde_json::from_str(r#"{"type":"desec","api_token":"abc"}"#).unwrap();
        assert_eq!(config.type_name(), "desec");
    }

    #[test]
    fn sync_config_defaults_are_valid() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.dry_run);
        assert!(!config.collapse_duplicates);
    }

    #[test]
    fn zero_channel_capacity_is_rejected() {
        let config = SyncConfig {
            event_channel_capacity: 0,
            ..SyncConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
