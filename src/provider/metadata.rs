//! OIDC discovery document snapshot.

// self
use crate::_prelude::*;

/// Alternate endpoints an IdP exposes for mutual-TLS clients (RFC 8705).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MtlsEndpointAliases {
	/// mTLS token endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_endpoint: Option<String>,
	/// mTLS registration endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub registration_endpoint: Option<String>,
	/// mTLS introspection endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub introspection_endpoint: Option<String>,
	/// mTLS revocation endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub revocation_endpoint: Option<String>,
}

/// Authorization-server metadata fetched once when a provider is constructed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationServerMetadata {
	/// Issuer identifier; also the audience of JWT client assertions.
	#[serde(default)]
	pub issuer: String,
	/// Authorization endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authorization_endpoint: Option<String>,
	/// Token endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_endpoint: Option<String>,
	/// Dynamic client registration endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub registration_endpoint: Option<String>,
	/// Token introspection endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub introspection_endpoint: Option<String>,
	/// Token revocation endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub revocation_endpoint: Option<String>,
	/// RP-initiated logout endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub end_session_endpoint: Option<String>,
	/// JWKS URL.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub jwks_uri: Option<String>,
	/// mTLS endpoint aliases.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mtls_endpoint_aliases: Option<MtlsEndpointAliases>,
	/// Supported grant types.
	#[serde(
		default,
		deserialize_with = "crate::registration::null_as_default",
		skip_serializing_if = "Vec::is_empty"
	)]
	pub grant_types_supported: Vec<String>,
	/// Supported scopes.
	#[serde(
		default,
		deserialize_with = "crate::registration::null_as_default",
		skip_serializing_if = "Vec::is_empty"
	)]
	pub scopes_supported: Vec<String>,
	/// Supported response types.
	#[serde(
		default,
		deserialize_with = "crate::registration::null_as_default",
		skip_serializing_if = "Vec::is_empty"
	)]
	pub response_types_supported: Vec<String>,
	/// Supported token endpoint auth methods.
	#[serde(
		default,
		deserialize_with = "crate::registration::null_as_default",
		skip_serializing_if = "Vec::is_empty"
	)]
	pub token_endpoint_auth_methods_supported: Vec<String>,
}
impl AuthorizationServerMetadata {
	/// Token endpoint to use, preferring the mTLS alias when `mtls` is set and one is advertised.
	pub fn token_endpoint_for(&self, mtls: bool) -> Option<&str> {
		self.mtls_alias(mtls, |a| a.token_endpoint.as_deref())
			.or(non_empty(self.token_endpoint.as_deref()))
	}

	/// Registration endpoint to use, preferring the mTLS alias when `mtls` is set and one is
	/// advertised.
	pub fn registration_endpoint_for(&self, mtls: bool) -> Option<&str> {
		self.mtls_alias(mtls, |a| a.registration_endpoint.as_deref())
			.or(non_empty(self.registration_endpoint.as_deref()))
	}

	/// Returns `true` when the IdP lists `grant_type` as supported.
	pub fn supports_grant_type(&self, grant_type: &str) -> bool {
		self.grant_types_supported.iter().any(|g| g == grant_type)
	}

	fn mtls_alias<'a>(
		&'a self,
		mtls: bool,
		pick: impl FnOnce(&'a MtlsEndpointAliases) -> Option<&'a str>,
	) -> Option<&'a str> {
		if !mtls {
			return None;
		}

		non_empty(self.mtls_endpoint_aliases.as_ref().and_then(pick))
	}
}

fn non_empty(value: Option<&str>) -> Option<&str> {
	value.filter(|v| !v.trim().is_empty())
}
