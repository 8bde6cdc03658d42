//! RFC 7591 client metadata exchanged with IdP registration endpoints.
//!
//! [`ClientMetadata`] models the fixed registration fields and keeps every other top-level JSON
//! member in an extension-property map, so vendor fields such as Okta's `pkce_required` or
//! `application_type` survive a decode/encode cycle untouched.

pub mod builder;

pub use builder::ClientBuilder;

// crates.io
use serde::Deserializer;
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, Secret},
	error::ValidationError,
};

/// JSON keys owned by [`ClientMetadata`] fields; extension properties may not use them.
pub const FIXED_FIELDS: &[&str] = &[
	"client_name",
	"client_id",
	"client_secret",
	"client_id_issued_at",
	"client_secret_expires_at",
	"scope",
	"grant_types",
	"response_types",
	"token_endpoint_auth_method",
	"client_uri",
	"redirect_uris",
	"jwks_uri",
	"jwks",
	"logo_uri",
	"tls_client_auth_subject_dn",
	"tls_client_auth_san_dns",
	"tls_client_auth_san_uri",
	"tls_client_auth_san_ip",
	"registration_access_token",
];

/// `authorization_code` grant type.
pub const AUTHORIZATION_CODE: &str = "authorization_code";
/// `client_credentials` grant type.
pub const CLIENT_CREDENTIALS: &str = "client_credentials";
/// `implicit` grant type.
pub const IMPLICIT: &str = "implicit";

// Grant types that redirect the user agent back to the client.
const REDIRECT_GRANT_TYPES: &[&str] = &[AUTHORIZATION_CODE, IMPLICIT];

/// One OAuth client application as represented by an IdP.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientMetadata {
	/// Human-readable client name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_name: Option<String>,
	/// Identifier assigned by the IdP.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_id: Option<String>,
	/// Secret assigned by the IdP.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_secret: Option<Secret>,
	/// Issue time of the client identifier (Unix seconds on the wire).
	#[serde(
		default,
		with = "time::serde::timestamp::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub client_id_issued_at: Option<OffsetDateTime>,
	/// Expiry of the client secret (Unix seconds on the wire, `0` for never).
	#[serde(
		default,
		with = "time::serde::timestamp::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub client_secret_expires_at: Option<OffsetDateTime>,
	/// Space-delimited scope on the wire.
	#[serde(default, skip_serializing_if = "ScopeSet::is_empty")]
	pub scope: ScopeSet,
	/// Grant types the client may use.
	#[serde(
		default,
		deserialize_with = "crate::registration::null_as_default",
		skip_serializing_if = "Vec::is_empty"
	)]
	pub grant_types: Vec<String>,
	/// Response types the client may use.
	#[serde(
		default,
		deserialize_with = "crate::registration::null_as_default",
		skip_serializing_if = "Vec::is_empty"
	)]
	pub response_types: Vec<String>,
	/// Token endpoint authentication method.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_endpoint_auth_method: Option<String>,
	/// Client home page.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_uri: Option<String>,
	/// Redirect URIs for redirect-based grants.
	#[serde(
		default,
		deserialize_with = "crate::registration::null_as_default",
		skip_serializing_if = "Vec::is_empty"
	)]
	pub redirect_uris: Vec<String>,
	/// URL of the client's JSON Web Key Set.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub jwks_uri: Option<String>,
	/// Inline JSON Web Key Set.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub jwks: Option<JsonValue>,
	/// Client logo.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub logo_uri: Option<String>,
	/// Expected certificate subject DN for `tls_client_auth`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tls_client_auth_subject_dn: Option<String>,
	/// Expected certificate SAN DNS name for `tls_client_auth`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tls_client_auth_san_dns: Option<String>,
	/// Expected certificate SAN URI for `tls_client_auth`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tls_client_auth_san_uri: Option<String>,
	/// Expected certificate SAN IP address for `tls_client_auth`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tls_client_auth_san_ip: Option<String>,
	/// Token for the client configuration endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub registration_access_token: Option<Secret>,
	#[serde(flatten)]
	extra_properties: BTreeMap<String, JsonValue>,
}
impl ClientMetadata {
	/// Vendor extension properties.
	pub fn extra_properties(&self) -> &BTreeMap<String, JsonValue> {
		&self.extra_properties
	}

	/// Returns one extension property.
	pub fn extra_property(&self, key: &str) -> Option<&JsonValue> {
		self.extra_properties.get(key)
	}

	/// Adds or replaces an extension property; keys of fixed fields are rejected.
	pub fn insert_extra_property(
		&mut self,
		key: impl Into<String>,
		value: JsonValue,
	) -> Result<Option<JsonValue>, ValidationError> {
		let key = key.into();

		if FIXED_FIELDS.contains(&key.as_str()) {
			return Err(ValidationError::ReservedExtraProperty { key });
		}

		Ok(self.extra_properties.insert(key, value))
	}

	/// Removes an extension property.
	pub fn remove_extra_property(&mut self, key: &str) -> Option<JsonValue> {
		self.extra_properties.remove(key)
	}

	/// Returns `true` when `grant_type` is listed.
	pub fn has_grant_type(&self, grant_type: &str) -> bool {
		self.grant_types.iter().any(|g| g == grant_type)
	}

	/// Returns `true` when `response_type` is listed.
	pub fn has_response_type(&self, response_type: &str) -> bool {
		self.response_types.iter().any(|r| r == response_type)
	}

	/// Checks the request-construction rules that need no IdP knowledge.
	///
	/// Redirect-based grants (`authorization_code`, `implicit`) require at least one redirect URI.
	pub fn validate(&self) -> Result<(), ValidationError> {
		if self.redirect_uris.iter().any(|uri| !uri.trim().is_empty()) {
			return Ok(());
		}

		match self.grant_types.iter().find(|g| REDIRECT_GRANT_TYPES.contains(&g.as_str())) {
			Some(grant_type) =>
				Err(ValidationError::MissingRedirectUri { grant_type: grant_type.clone() }),
			None => Ok(()),
		}
	}
}

/// Decodes JSON `null` as the type's default; IdPs send `null` for empty lists.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(<Option<T>>::deserialize(deserializer)?.unwrap_or_default())
}
