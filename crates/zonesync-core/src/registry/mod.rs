//! Plugin-based provider registry
//!
//! The registry allows zone API clients to be registered at runtime,
//! avoiding hardcoded if-else chains in the binary.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zonesync_core::registry::ProviderRegistry;
//! use zonesync_core::config::ProviderConfig;
//!
//! let registry = ProviderRegistry::new();
//! zonesync_provider_desec::register(&registry);
//!
//! let config = ProviderConfig::Desec { api_token, base_url: None, timeout_secs: None };
//! let api = registry.create_provider(&config)?;
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{ZoneApi, ZoneApiFactory};
use std::collections::HashMap;
use std::sync::RwLock;

/// Provider registry for plugin-based zone client creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Box<dyn ZoneApiFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone API factory under a provider type name (e.g. "desec")
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn ZoneApiFactory>) {
        let mut providers = self.providers.write().unwrap_or_else(|e| e.into_inner());
        providers.insert(name.into(), factory);
    }

    /// Create a zone client from configuration
    ///
    /// Validates the configuration, then dispatches on
    /// [`ProviderConfig::type_name`].
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ZoneApi>)`: Created client
    /// - `Err(Error)`: Invalid config, unregistered type, or creation failure
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneApi>> {
        config.validate()?;

        let provider_type = config.type_name();
        let providers = self.providers.read().unwrap_or_else(|e| e.into_inner());

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self.providers.read().unwrap_or_else(|e| e.into_inner());
        providers.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProviderFactory;

    impl ZoneApiFactory for MockProviderFactory {
        fn create(&self, _config: &ProviderConfig) -> Result<Box<dyn ZoneApi>> {
            Err(Error::Other("mock provider not implemented".to_string()))
        }
    }

    fn custom(factory: &str) -> ProviderConfig {
        ProviderConfig::Custom {
            factory: factory.to_string(),
            config: serde_json::json!({}),
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = ProviderRegistry::new();

        assert!(!registry.has_provider("mock"));

        registry.register_provider("mock", Box::new(MockProviderFactory));

        assert!(registry.has_provider("mock"));
        assert_eq!(registry.list_providers(), vec!["mock".to_string()]);
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let registry = ProviderRegistry::new();
        let result = registry.create_provider(&custom("route53"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_dispatches_to_registered_factory() {
        let registry = ProviderRegistry::new();
        registry.register_provider("mock", Box::new(MockProviderFactory));

        let result = registry.create_provider(&custom("mock"));
        assert!(matches!(result, Err(Error::Other(_))));
    }

    #[test]
    fn test_invalid_config_rejected_before_dispatch() {
        let registry = ProviderRegistry::new();
        registry.register_provider("desec", Box::new(MockProviderFactory));

        let config = ProviderConfig::Desec {
            api_token: String::new(),
            base_url: None,
            timeout_secs: None,
        };
        assert!(matches!(
            registry.create_provider(&config),
            Err(Error::Config(_))
        ));
    }
}
