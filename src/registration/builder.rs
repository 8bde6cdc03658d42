//! Fluent construction of registration requests.

// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	error::ValidationError,
	registration::ClientMetadata,
};

/// Fluent constructor for [`ClientMetadata`] registration requests.
///
/// [`ClientBuilder::build`] rejects extension properties that shadow fixed fields and
/// redirect-based grants without redirect URIs, so invalid requests never reach the network.
#[derive(Debug, Default)]
pub struct ClientBuilder {
	metadata: ClientMetadata,
	extra_properties: BTreeMap<String, JsonValue>,
}
impl ClientBuilder {
	/// Creates an empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the client name.
	pub fn client_name(mut self, name: impl Into<String>) -> Self {
		self.metadata.client_name = Some(name.into());

		self
	}

	/// Sets the requested scope.
	pub fn scope(mut self, scope: ScopeSet) -> Self {
		self.metadata.scope = scope;

		self
	}

	/// Sets the grant types.
	pub fn grant_types<I, S>(mut self, grant_types: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.metadata.grant_types = grant_types.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the response types.
	pub fn response_types<I, S>(mut self, response_types: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.metadata.response_types = response_types.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the token endpoint auth method.
	pub fn token_endpoint_auth_method(mut self, method: impl Into<String>) -> Self {
		self.metadata.token_endpoint_auth_method = Some(method.into());

		self
	}

	/// Sets the client home page.
	pub fn client_uri(mut self, uri: impl Into<String>) -> Self {
		self.metadata.client_uri = Some(uri.into());

		self
	}

	/// Adds a redirect URI.
	pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
		self.metadata.redirect_uris.push(uri.into());

		self
	}

	/// Replaces the redirect URIs.
	pub fn redirect_uris<I, S>(mut self, uris: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.metadata.redirect_uris = uris.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the JWKS URL.
	pub fn jwks_uri(mut self, uri: impl Into<String>) -> Self {
		self.metadata.jwks_uri = Some(uri.into());

		self
	}

	/// Sets an inline JWKS document.
	pub fn jwks(mut self, jwks: JsonValue) -> Self {
		self.metadata.jwks = Some(jwks);

		self
	}

	/// Sets the logo URL.
	pub fn logo_uri(mut self, uri: impl Into<String>) -> Self {
		self.metadata.logo_uri = Some(uri.into());

		self
	}

	/// Sets the expected certificate subject DN.
	pub fn tls_client_auth_subject_dn(mut self, dn: impl Into<String>) -> Self {
		self.metadata.tls_client_auth_subject_dn = Some(dn.into());

		self
	}

	/// Sets the expected certificate SAN DNS name.
	pub fn tls_client_auth_san_dns(mut self, dns: impl Into<String>) -> Self {
		self.metadata.tls_client_auth_san_dns = Some(dns.into());

		self
	}

	/// Sets the expected certificate SAN URI.
	pub fn tls_client_auth_san_uri(mut self, uri: impl Into<String>) -> Self {
		self.metadata.tls_client_auth_san_uri = Some(uri.into());

		self
	}

	/// Sets the expected certificate SAN IP address.
	pub fn tls_client_auth_san_ip(mut self, ip: impl Into<String>) -> Self {
		self.metadata.tls_client_auth_san_ip = Some(ip.into());

		self
	}

	/// Adds a vendor extension property.
	pub fn extra_property(mut self, key: impl Into<String>, value: JsonValue) -> Self {
		self.extra_properties.insert(key.into(), value);

		self
	}

	/// Adds several vendor extension properties.
	pub fn extra_properties(mut self, properties: BTreeMap<String, JsonValue>) -> Self {
		self.extra_properties.extend(properties);

		self
	}

	/// Validates and returns the metadata.
	pub fn build(self) -> Result<ClientMetadata, ValidationError> {
		let mut metadata = self.metadata;

		for (key, value) in self.extra_properties {
			metadata.insert_extra_property(key, value)?;
		}

		metadata.validate()?;

		Ok(metadata)
	}
}
