//! Provider registry indexed by name and by IdP-derived aliases.
//!
//! Every provider is stored under its name and aliased as `issuer:<issuer>`,
//! `tokenEp:<token endpoint>`, `authEp:<authorization endpoint>`, and
//! `metadataUrl:<discovery URL>` for each value the IdP advertises. Mutation is
//! append/overwrite-only: registering a name again replaces the entry and re-points its aliases.

// self
use crate::{
	_prelude::*,
	cache::{KeyedCache, MemoryCache},
	config::IdpConfig,
	http::HttpTransport,
	provider::Provider,
};
#[cfg(feature = "reqwest")]
use crate::config::TransportConfig;

/// Provider lookup failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RegistryError {
	/// No provider is registered under the requested key.
	#[error("Unrecognized provider: no provider matches {lookup} `{key}`.")]
	UnrecognizedProvider {
		/// Kind of lookup that failed (`name`, `issuer`, ...).
		lookup: &'static str,
		/// Requested key.
		key: String,
	},
}

/// Thread-safe, multi-indexed store of [`Provider`]s.
#[derive(Clone)]
pub struct ProviderRegistry {
	cache: Arc<dyn KeyedCache<Arc<Provider>>>,
}
impl ProviderRegistry {
	const ISSUER: &'static str = "issuer:";
	const TOKEN_ENDPOINT: &'static str = "tokenEp:";
	const AUTHORIZATION_ENDPOINT: &'static str = "authEp:";
	const METADATA_URL: &'static str = "metadataUrl:";

	/// Creates a registry backed by a process-local [`MemoryCache`].
	pub fn new() -> Self {
		Self::with_cache(Arc::new(MemoryCache::new()))
	}

	/// Creates a registry backed by a caller-supplied keyed cache.
	pub fn with_cache(cache: Arc<dyn KeyedCache<Arc<Provider>>>) -> Self {
		Self { cache }
	}

	/// Builds a provider over a reqwest transport and registers it.
	#[cfg(feature = "reqwest")]
	pub async fn register_provider(
		&self,
		config: IdpConfig,
		transport: &TransportConfig,
	) -> Result<Arc<Provider>> {
		let provider = Provider::new(config, transport).await?;

		self.insert_provider(Arc::new(provider))
	}

	/// Builds a provider over `transport` and registers it.
	pub async fn register_provider_with_http_client(
		&self,
		config: IdpConfig,
		transport: Arc<dyn HttpTransport>,
	) -> Result<Arc<Provider>> {
		let provider = Provider::builder(config, transport).build().await?;

		self.insert_provider(Arc::new(provider))
	}

	/// Registers an already built provider under its name and aliases.
	pub fn insert_provider(&self, provider: Arc<Provider>) -> Result<Arc<Provider>> {
		let name = provider.name().to_owned();

		self.cache.set(&name, Arc::clone(&provider));

		let aliases = [
			(Self::ISSUER, Some(provider.issuer())),
			(Self::TOKEN_ENDPOINT, provider.token_endpoint()),
			(Self::AUTHORIZATION_ENDPOINT, provider.authorization_endpoint()),
			(Self::METADATA_URL, Some(provider.metadata_url())),
		];

		for (prefix, value) in aliases {
			if let Some(value) = value.filter(|v| !v.is_empty()) {
				self.cache.set_secondary_key(&name, &format!("{prefix}{value}"))?;
			}
		}

		#[cfg(feature = "tracing")]
		tracing::debug!(provider = %name, issuer = provider.issuer(), "Provider registered.");

		Ok(provider)
	}

	/// Looks up a provider by name.
	pub fn get_provider_by_name(&self, name: &str) -> Result<Arc<Provider>> {
		self.cache.get(name).map_err(|_| unrecognized("name", name))
	}

	/// Looks up a provider by issuer.
	pub fn get_provider_by_issuer(&self, issuer: &str) -> Result<Arc<Provider>> {
		self.lookup_alias("issuer", Self::ISSUER, issuer)
	}

	/// Looks up a provider by token endpoint.
	pub fn get_provider_by_token_endpoint(&self, endpoint: &str) -> Result<Arc<Provider>> {
		self.lookup_alias("token endpoint", Self::TOKEN_ENDPOINT, endpoint)
	}

	/// Looks up a provider by authorization endpoint.
	pub fn get_provider_by_authorization_endpoint(&self, endpoint: &str) -> Result<Arc<Provider>> {
		self.lookup_alias("authorization endpoint", Self::AUTHORIZATION_ENDPOINT, endpoint)
	}

	/// Looks up a provider by discovery document URL.
	pub fn get_provider_by_metadata_url(&self, url: &str) -> Result<Arc<Provider>> {
		self.lookup_alias("metadata URL", Self::METADATA_URL, url.trim())
	}

	fn lookup_alias(&self, lookup: &'static str, prefix: &str, key: &str) -> Result<Arc<Provider>> {
		self.cache
			.get_by_secondary_key(&format!("{prefix}{key}"))
			.map_err(|_| unrecognized(lookup, key))
	}
}
impl Default for ProviderRegistry {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for ProviderRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ProviderRegistry(..)")
	}
}

fn unrecognized(lookup: &'static str, key: &str) -> Error {
	RegistryError::UnrecognizedProvider { lookup, key: key.to_owned() }.into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn empty_registry_reports_unrecognized_provider() {
		let registry = ProviderRegistry::default();
		let err = registry.get_provider_by_issuer("https://nope").expect_err("Lookup should fail.");

		assert!(matches!(
			err,
			Error::Registry(RegistryError::UnrecognizedProvider { lookup: "issuer", ref key })
				if key == "https://nope"
		));
		assert_eq!(
			err.to_string(),
			"Unrecognized provider: no provider matches issuer `https://nope`."
		);
		assert!(registry.get_provider_by_name("okta").is_err());
	}
}
