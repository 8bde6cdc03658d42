//! Identity-provider and transport configuration.
//!
//! Values are plain serde data so hosts can load them from whatever property source they use.
//! [`IdpConfig::validate`] reports the first problem as a [`ConfigError`] instead of deferring
//! failures to the first network call.

// std
use std::{path::PathBuf, time::Duration as StdDuration};
// crates.io
use jsonwebtoken::Algorithm;
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, Secret},
	error::ConfigError,
};

/// Identity-provider flavors with dedicated registration behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IdpType {
	/// Standards-compliant OIDC provider.
	#[default]
	Generic,
	/// Okta, which authenticates management calls with `SSWS` tokens.
	Okta,
	/// Keycloak; registers like a generic provider.
	Keycloak,
}
impl IdpType {
	/// Returns the configuration label for the type.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Generic => "generic",
			Self::Okta => "okta",
			Self::Keycloak => "keycloak",
		}
	}
}
impl From<&str> for IdpType {
	fn from(value: &str) -> Self {
		match value.trim().to_ascii_lowercase().as_str() {
			"okta" => Self::Okta,
			"keycloak" => Self::Keycloak,
			_ => Self::Generic,
		}
	}
}
impl From<String> for IdpType {
	fn from(value: String) -> Self {
		Self::from(value.as_str())
	}
}
impl From<IdpType> for String {
	fn from(value: IdpType) -> Self {
		value.as_str().to_owned()
	}
}
impl Display for IdpType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Client-authentication method used to obtain tokens from the IdP.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AuthType {
	/// Pre-issued access token; no token endpoint calls.
	AccessToken,
	/// Legacy alias for `client_secret_post`.
	Client,
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form body `client_id`/`client_secret`.
	ClientSecretPost,
	/// HMAC-signed JWT assertion keyed with the client secret.
	ClientSecretJwt,
	/// RSA-signed JWT assertion keyed with a private key.
	PrivateKeyJwt,
	/// Mutual TLS with a CA-issued certificate.
	TlsClientAuth,
	/// Mutual TLS with a self-signed certificate.
	SelfSignedTlsClientAuth,
}
impl AuthType {
	/// Returns the configuration label for the auth type.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AccessToken => "access_token",
			Self::Client => "client",
			Self::ClientSecretBasic => "client_secret_basic",
			Self::ClientSecretPost => "client_secret_post",
			Self::ClientSecretJwt => "client_secret_jwt",
			Self::PrivateKeyJwt => "private_key_jwt",
			Self::TlsClientAuth => "tls_client_auth",
			Self::SelfSignedTlsClientAuth => "self_signed_tls_client_auth",
		}
	}

	/// Returns `true` for the mutual-TLS methods.
	pub const fn is_tls(self) -> bool {
		matches!(self, Self::TlsClientAuth | Self::SelfSignedTlsClientAuth)
	}

	/// Returns `true` when the method authenticates with a client secret.
	pub const fn needs_secret(self) -> bool {
		matches!(
			self,
			Self::Client | Self::ClientSecretBasic | Self::ClientSecretPost | Self::ClientSecretJwt
		)
	}
}
impl FromStr for AuthType {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"access_token" | "accessToken" => Ok(Self::AccessToken),
			"client" => Ok(Self::Client),
			"client_secret_basic" => Ok(Self::ClientSecretBasic),
			"client_secret_post" => Ok(Self::ClientSecretPost),
			"client_secret_jwt" => Ok(Self::ClientSecretJwt),
			"private_key_jwt" => Ok(Self::PrivateKeyJwt),
			"tls_client_auth" => Ok(Self::TlsClientAuth),
			"self_signed_tls_client_auth" => Ok(Self::SelfSignedTlsClientAuth),
			other => Err(ConfigError::UnsupportedAuthType { value: other.to_owned() }),
		}
	}
}
impl TryFrom<String> for AuthType {
	type Error = ConfigError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}
impl From<AuthType> for String {
	fn from(value: AuthType) -> Self {
		value.as_str().to_owned()
	}
}
impl Display for AuthType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Credentials and token-request options for one IdP.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdpAuthConfig {
	/// Client-authentication method.
	#[serde(rename = "type")]
	pub auth_type: AuthType,
	/// Pre-issued access token for [`AuthType::AccessToken`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<Secret>,
	/// OAuth client identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_id: Option<String>,
	/// OAuth client secret.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_secret: Option<Secret>,
	/// Path to the PEM private key used by `private_key_jwt`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub private_key: Option<PathBuf>,
	/// Path to the PEM (or DER) public key used to compute the JWT `kid`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub public_key: Option<PathBuf>,
	/// Password protecting an encrypted PKCS#8 private key.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub key_password: Option<Secret>,
	/// JWS algorithm name for JWT assertions (`HS256`, `RS256`, ...).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_signing_method: Option<String>,
	/// `iss` claim of JWT assertions; defaults to the client identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub assertion_issuer: Option<String>,
	/// Scope requested on token requests.
	#[serde(default)]
	pub scope: ScopeSet,
	/// Reuse tokens until 80% of their lifetime has elapsed.
	#[serde(default = "default_true")]
	pub use_cached_token: bool,
	/// Keep the registration access token returned by the IdP.
	#[serde(default)]
	pub use_registration_access_token: bool,
	/// Extra headers sent with every token request.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub request_headers: BTreeMap<String, String>,
	/// Extra query parameters appended to the token endpoint.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub query_params: BTreeMap<String, String>,
}
impl IdpAuthConfig {
	/// Creates an empty auth config for the given method.
	pub fn new(auth_type: AuthType) -> Self {
		Self {
			auth_type,
			access_token: None,
			client_id: None,
			client_secret: None,
			private_key: None,
			public_key: None,
			key_password: None,
			token_signing_method: None,
			assertion_issuer: None,
			scope: ScopeSet::default(),
			use_cached_token: true,
			use_registration_access_token: false,
			request_headers: BTreeMap::new(),
			query_params: BTreeMap::new(),
		}
	}

	/// Auth config that presents a pre-issued access token.
	pub fn access_token(token: impl Into<String>) -> Self {
		Self::new(AuthType::AccessToken).with_access_token(token)
	}

	/// Sets the pre-issued access token.
	pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(Secret::new(token));

		self
	}

	/// Sets the client identifier.
	pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(Secret::new(secret));

		self
	}

	/// Sets the key pair paths used by `private_key_jwt`.
	pub fn with_key_pair(
		mut self,
		private_key: impl Into<PathBuf>,
		public_key: impl Into<PathBuf>,
	) -> Self {
		self.private_key = Some(private_key.into());
		self.public_key = Some(public_key.into());

		self
	}

	/// Sets the password for an encrypted private key.
	pub fn with_key_password(mut self, password: impl Into<String>) -> Self {
		self.key_password = Some(Secret::new(password));

		self
	}

	/// Overrides the JWS algorithm used for JWT assertions.
	pub fn with_signing_method(mut self, method: impl Into<String>) -> Self {
		self.token_signing_method = Some(method.into());

		self
	}

	/// Overrides the `iss` claim of JWT assertions.
	pub fn with_assertion_issuer(mut self, issuer: impl Into<String>) -> Self {
		self.assertion_issuer = Some(issuer.into());

		self
	}

	/// Sets the scope requested on token requests.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Adds a header to every token request.
	pub fn with_request_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.request_headers.insert(name.into(), value.into());

		self
	}

	/// Adds a query parameter to the token endpoint.
	pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query_params.insert(name.into(), value.into());

		self
	}

	/// Toggles token caching.
	pub fn with_cached_token(mut self, enabled: bool) -> Self {
		self.use_cached_token = enabled;

		self
	}

	/// Toggles retention of the registration access token.
	pub fn with_registration_access_token(mut self, keep: bool) -> Self {
		self.use_registration_access_token = keep;

		self
	}

	/// Resolves the JWS algorithm for the configured JWT method.
	pub fn signing_algorithm(&self) -> Result<Algorithm, ConfigError> {
		let (allowed, default): (&[Algorithm], Algorithm) = match self.auth_type {
			AuthType::ClientSecretJwt =>
				(&[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512], Algorithm::HS256),
			AuthType::PrivateKeyJwt =>
				(&[Algorithm::RS256, Algorithm::RS384, Algorithm::RS512], Algorithm::RS256),
			_ => return Ok(Algorithm::HS256),
		};
		let Some(raw) = self.token_signing_method.as_deref().filter(|v| !v.trim().is_empty())
		else {
			return Ok(default);
		};
		let unsupported = || ConfigError::UnsupportedSigningMethod {
			value: raw.to_owned(),
			auth_type: self.auth_type.as_str(),
		};
		let algorithm = Algorithm::from_str(raw.trim()).map_err(|_| unsupported())?;

		if allowed.contains(&algorithm) { Ok(algorithm) } else { Err(unsupported()) }
	}

	/// Checks that the credentials required by the auth type are present.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.auth_type == AuthType::AccessToken {
			return require_secret("auth_config.access_token", self.access_token.as_ref());
		}

		require("auth_config.client_id", self.client_id.as_deref())?;

		if self.auth_type.needs_secret() {
			require_secret("auth_config.client_secret", self.client_secret.as_ref())?;
		}
		if self.auth_type == AuthType::PrivateKeyJwt {
			if self.private_key.is_none() {
				return Err(ConfigError::MissingField { field: "auth_config.private_key" });
			}
			if self.public_key.is_none() {
				return Err(ConfigError::MissingField { field: "auth_config.public_key" });
			}
		}

		self.signing_algorithm().map(|_| ())
	}
}

/// Configuration of one identity provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdpConfig {
	/// Unique provider name used as the registry primary key.
	pub name: String,
	/// Provider flavor.
	#[serde(rename = "type", default)]
	pub idp_type: IdpType,
	/// OIDC discovery document URL.
	pub metadata_url: String,
	/// Token acquisition settings.
	pub auth_config: IdpAuthConfig,
	/// Default scopes for registered clients.
	#[serde(default)]
	pub client_scopes: ScopeSet,
	/// Default grant type for registered clients.
	#[serde(default = "default_grant_type")]
	pub grant_type: String,
	/// Default token endpoint auth method for registered clients.
	#[serde(default = "default_auth_method")]
	pub auth_method: String,
	/// Vendor properties attached to every registration request.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub extra_properties: BTreeMap<String, JsonValue>,
}
impl IdpConfig {
	/// Creates a config with registration defaults (`client_credentials`,
	/// `client_secret_basic`).
	pub fn new(
		name: impl Into<String>,
		metadata_url: impl Into<String>,
		auth_config: IdpAuthConfig,
	) -> Self {
		Self {
			name: name.into(),
			idp_type: IdpType::Generic,
			metadata_url: metadata_url.into(),
			auth_config,
			client_scopes: ScopeSet::default(),
			grant_type: default_grant_type(),
			auth_method: default_auth_method(),
			extra_properties: BTreeMap::new(),
		}
	}

	/// Sets the provider flavor.
	pub fn with_idp_type(mut self, idp_type: IdpType) -> Self {
		self.idp_type = idp_type;

		self
	}

	/// Sets the default client scopes.
	pub fn with_client_scopes(mut self, scopes: ScopeSet) -> Self {
		self.client_scopes = scopes;

		self
	}

	/// Sets the default grant type.
	pub fn with_grant_type(mut self, grant_type: impl Into<String>) -> Self {
		self.grant_type = grant_type.into();

		self
	}

	/// Sets the default token endpoint auth method.
	pub fn with_auth_method(mut self, auth_method: impl Into<String>) -> Self {
		self.auth_method = auth_method.into();

		self
	}

	/// Adds a vendor property sent with every registration.
	pub fn with_extra_property(mut self, key: impl Into<String>, value: JsonValue) -> Self {
		self.extra_properties.insert(key.into(), value);

		self
	}

	/// Parses the metadata URL.
	pub fn metadata_url(&self) -> Result<Url, ConfigError> {
		Url::parse(self.metadata_url.trim())
			.map_err(|source| ConfigError::InvalidUrl { field: "metadata", source })
	}

	/// Validates the configuration without touching the network.
	pub fn validate(&self) -> Result<(), ConfigError> {
		require("name", Some(self.name.as_str()))?;
		require("metadata_url", Some(self.metadata_url.as_str()))?;

		self.metadata_url()?;
		self.auth_config.validate()
	}
}

/// TLS options for the reqwest transport.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
	/// Additional PEM root certificate to trust.
	pub root_ca: Option<PathBuf>,
	/// PEM client certificate presented for mutual TLS.
	pub client_certificate: Option<PathBuf>,
	/// PEM private key matching [`TlsConfig::client_certificate`].
	pub client_key: Option<PathBuf>,
	/// Accepts invalid certificates and host names; development only.
	pub insecure_skip_verify: bool,
}

/// Transport options applied when the HTTP client is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
	/// Per-request timeout.
	pub timeout: StdDuration,
	/// Optional proxy URL applied to all requests.
	pub proxy_url: Option<String>,
	/// TLS settings.
	pub tls: TlsConfig,
}
impl TransportConfig {
	const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Overrides the request timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Routes requests through a proxy.
	pub fn with_proxy(mut self, url: impl Into<String>) -> Self {
		self.proxy_url = Some(url.into());

		self
	}

	/// Overrides the TLS settings.
	pub fn with_tls(mut self, tls: TlsConfig) -> Self {
		self.tls = tls;

		self
	}
}
impl Default for TransportConfig {
	fn default() -> Self {
		Self { timeout: Self::DEFAULT_TIMEOUT, proxy_url: None, tls: TlsConfig::default() }
	}
}

fn default_true() -> bool {
	true
}

fn default_grant_type() -> String {
	"client_credentials".into()
}

fn default_auth_method() -> String {
	"client_secret_basic".into()
}

fn require(field: &'static str, value: Option<&str>) -> Result<(), ConfigError> {
	match value {
		Some(v) if !v.trim().is_empty() => Ok(()),
		_ => Err(ConfigError::MissingField { field }),
	}
}

fn require_secret(field: &'static str, value: Option<&Secret>) -> Result<(), ConfigError> {
	require(field, value.map(Secret::expose))
}
