//! Client-authentication strategies for the `client_credentials` token request.
//!
//! Every strategy turns its credential material into form fields plus optional headers; the
//! [`AuthClient`](crate::auth::AuthClient) owns the HTTP exchange. JWT assertions are minted per
//! call and expire [`Authenticator::ASSERTION_LIFETIME`] after issue, so they are never reused.

// crates.io
use base64::{Engine as _, engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD}};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
// self
use crate::{
	_prelude::*,
	auth::{KeyError, KeyReader, PrivateKey, ScopeSet, Secret, compute_key_id},
	config::{AuthType, IdpAuthConfig},
	error::ConfigError,
};

/// `client_assertion_type` value for JWT bearer client assertions.
pub const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Form fields and headers produced by an [`Authenticator`].
#[derive(Clone, Default)]
pub struct TokenRequest {
	/// URL-encoded form fields, `grant_type` first.
	pub form: Vec<(&'static str, String)>,
	/// Extra headers such as `Authorization: Basic ...`.
	pub headers: Vec<(&'static str, String)>,
}
impl TokenRequest {
	fn client_credentials(scope: &ScopeSet) -> Self {
		let mut request =
			Self { form: vec![("grant_type", "client_credentials".into())], headers: Vec::new() };

		if let Some(scope) = scope.to_param() {
			request.form.push(("scope", scope));
		}

		request
	}

	/// Returns the value of a form field.
	pub fn form_value(&self, name: &str) -> Option<&str> {
		self.form.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
	}

	/// Returns the value of a header.
	pub fn header_value(&self, name: &str) -> Option<&str> {
		self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
	}
}
impl Debug for TokenRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRequest")
			.field("form", &self.form.iter().map(|(k, _)| *k).collect::<Vec<_>>())
			.field("headers", &self.headers.iter().map(|(k, _)| *k).collect::<Vec<_>>())
			.finish()
	}
}

/// Claims carried by JWT client assertions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
	/// Issuer; the client identifier unless overridden.
	pub iss: String,
	/// Subject; always the client identifier.
	pub sub: String,
	/// Audience; the authorization server issuer.
	pub aud: String,
	/// Issued-at, Unix seconds.
	pub iat: i64,
	/// Expiry, Unix seconds.
	pub exp: i64,
	/// Unique assertion identifier.
	pub jti: String,
}

/// HTTP Basic client authentication.
#[derive(Clone, Debug)]
pub struct ClientSecretBasic {
	client_id: String,
	client_secret: Secret,
	scope: ScopeSet,
}
impl ClientSecretBasic {
	/// Creates the strategy from a client identifier and secret.
	pub fn new(client_id: impl Into<String>, client_secret: Secret) -> Self {
		Self { client_id: client_id.into(), client_secret, scope: ScopeSet::default() }
	}

	/// Sets the requested scope.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	fn prepare(&self) -> TokenRequest {
		let mut request = TokenRequest::client_credentials(&self.scope);
		let credentials = format!("{}:{}", self.client_id, self.client_secret.expose());

		request.headers.push(("Authorization", format!("Basic {}", STANDARD.encode(credentials))));

		request
	}
}

/// Client secret sent in the form body.
#[derive(Clone, Debug)]
pub struct ClientSecretPost {
	client_id: String,
	client_secret: Secret,
	scope: ScopeSet,
}
impl ClientSecretPost {
	/// Creates the strategy from a client identifier and secret.
	pub fn new(client_id: impl Into<String>, client_secret: Secret) -> Self {
		Self { client_id: client_id.into(), client_secret, scope: ScopeSet::default() }
	}

	/// Sets the requested scope.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	fn prepare(&self) -> TokenRequest {
		let mut request = TokenRequest::client_credentials(&self.scope);

		request.form.push(("client_id", self.client_id.clone()));

		if !self.client_secret.is_empty() {
			request.form.push(("client_secret", self.client_secret.expose().to_owned()));
		}

		request
	}
}

/// JWT assertion signed with the client secret (HMAC).
#[derive(Clone, Debug)]
pub struct ClientSecretJwt {
	client_id: String,
	client_secret: Secret,
	scope: ScopeSet,
	issuer: Option<String>,
	audience: String,
	algorithm: Algorithm,
}
impl ClientSecretJwt {
	/// Creates the strategy; `audience` is the authorization server issuer.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: Secret,
		audience: impl Into<String>,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret,
			scope: ScopeSet::default(),
			issuer: None,
			audience: audience.into(),
			algorithm: Algorithm::HS256,
		}
	}

	/// Sets the requested scope.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Overrides the `iss` claim.
	pub fn with_issuer(mut self, issuer: Option<String>) -> Self {
		self.issuer = issuer;

		self
	}

	/// Selects the HMAC algorithm.
	pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
		self.algorithm = algorithm;

		self
	}

	fn prepare(&self, now: OffsetDateTime) -> Result<TokenRequest, KeyError> {
		let claims = assertion_claims(&self.client_id, self.issuer.as_deref(), &self.audience, now);
		let key = EncodingKey::from_secret(self.client_secret.expose().as_bytes());
		let assertion = jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &key)
			.map_err(KeyError::Sign)?;
		let mut request = TokenRequest::client_credentials(&self.scope);

		request.form.push(("client_id", self.client_id.clone()));
		request.form.push(("client_assertion_type", CLIENT_ASSERTION_TYPE.into()));
		request.form.push(("client_assertion", assertion));

		Ok(request)
	}
}

/// JWT assertion signed with an RSA private key.
#[derive(Clone, Debug)]
pub struct PrivateKeyJwt {
	client_id: String,
	scope: ScopeSet,
	issuer: Option<String>,
	audience: String,
	key: PrivateKey,
	key_id: String,
	algorithm: Algorithm,
}
impl PrivateKeyJwt {
	/// Creates the strategy; the `kid` header is derived from `public_key_der`.
	pub fn new(
		client_id: impl Into<String>,
		key: PrivateKey,
		public_key_der: &[u8],
		audience: impl Into<String>,
	) -> Self {
		Self {
			client_id: client_id.into(),
			scope: ScopeSet::default(),
			issuer: None,
			audience: audience.into(),
			key,
			key_id: compute_key_id(public_key_der),
			algorithm: Algorithm::RS256,
		}
	}

	/// Sets the requested scope.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Overrides the `iss` claim.
	pub fn with_issuer(mut self, issuer: Option<String>) -> Self {
		self.issuer = issuer;

		self
	}

	/// Selects the RSA algorithm.
	pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
		self.algorithm = algorithm;

		self
	}

	/// Returns the `kid` placed in assertion headers.
	pub fn key_id(&self) -> &str {
		&self.key_id
	}

	fn prepare(&self, now: OffsetDateTime) -> Result<TokenRequest, KeyError> {
		let claims = assertion_claims(&self.client_id, self.issuer.as_deref(), &self.audience, now);
		let mut header = Header::new(self.algorithm);

		header.kid = Some(self.key_id.clone());

		let assertion = jsonwebtoken::encode(&header, &claims, self.key.encoding_key())
			.map_err(KeyError::Sign)?;
		let mut request = TokenRequest::client_credentials(&self.scope);

		request.form.push(("client_assertion_type", CLIENT_ASSERTION_TYPE.into()));
		request.form.push(("client_assertion", assertion));

		Ok(request)
	}
}

/// Mutual-TLS client authentication; the certificate lives in the transport.
#[derive(Clone, Debug)]
pub struct TlsClientAuth {
	client_id: String,
	scope: ScopeSet,
}
impl TlsClientAuth {
	/// Creates the strategy from a client identifier.
	pub fn new(client_id: impl Into<String>) -> Self {
		Self { client_id: client_id.into(), scope: ScopeSet::default() }
	}

	/// Sets the requested scope.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	fn prepare(&self) -> TokenRequest {
		let mut request = TokenRequest::client_credentials(&self.scope);

		request.form.push(("client_id", self.client_id.clone()));

		request
	}
}

/// Closed set of client-authentication strategies.
#[derive(Clone, Debug)]
pub enum Authenticator {
	/// `client_secret_basic`.
	ClientSecretBasic(ClientSecretBasic),
	/// `client_secret_post` (and the legacy `client` label).
	ClientSecretPost(ClientSecretPost),
	/// `client_secret_jwt`.
	ClientSecretJwt(ClientSecretJwt),
	/// `private_key_jwt`.
	PrivateKeyJwt(PrivateKeyJwt),
	/// `tls_client_auth` and `self_signed_tls_client_auth`.
	TlsClientAuth(TlsClientAuth),
}
impl Authenticator {
	/// Lifetime of JWT client assertions.
	pub const ASSERTION_LIFETIME: Duration = Duration::seconds(60);

	/// Builds the strategy selected by `config`, or `None` for pre-issued access tokens.
	///
	/// `audience` is the discovered issuer used by the JWT strategies; keys for
	/// `private_key_jwt` are loaded through `key_reader`.
	pub fn from_config(
		config: &IdpAuthConfig,
		audience: &str,
		key_reader: &dyn KeyReader,
	) -> Result<Option<Self>> {
		config.validate()?;

		let client_id = config
			.client_id
			.clone()
			.ok_or(ConfigError::MissingField { field: "auth_config.client_id" });
		let client_secret = || {
			config
				.client_secret
				.clone()
				.ok_or(ConfigError::MissingField { field: "auth_config.client_secret" })
		};
		let scope = config.scope.clone();
		let authenticator = match config.auth_type {
			AuthType::AccessToken => return Ok(None),
			AuthType::Client | AuthType::ClientSecretPost => Self::ClientSecretPost(
				ClientSecretPost::new(client_id?, client_secret()?).with_scope(scope),
			),
			AuthType::ClientSecretBasic => Self::ClientSecretBasic(
				ClientSecretBasic::new(client_id?, client_secret()?).with_scope(scope),
			),
			AuthType::ClientSecretJwt => Self::ClientSecretJwt(
				ClientSecretJwt::new(client_id?, client_secret()?, audience)
					.with_scope(scope)
					.with_issuer(config.assertion_issuer.clone())
					.with_algorithm(config.signing_algorithm()?),
			),
			AuthType::PrivateKeyJwt => {
				let private_path = config
					.private_key
					.as_deref()
					.ok_or(ConfigError::MissingField { field: "auth_config.private_key" })?;
				let public_path = config
					.public_key
					.as_deref()
					.ok_or(ConfigError::MissingField { field: "auth_config.public_key" })?;
				let key = key_reader.read_private_key(private_path, config.key_password.as_ref())?;
				let public_key = key_reader.read_public_key(public_path)?;

				Self::PrivateKeyJwt(
					PrivateKeyJwt::new(client_id?, key, &public_key, audience)
						.with_scope(scope)
						.with_issuer(config.assertion_issuer.clone())
						.with_algorithm(config.signing_algorithm()?),
				)
			},
			AuthType::TlsClientAuth | AuthType::SelfSignedTlsClientAuth =>
				Self::TlsClientAuth(TlsClientAuth::new(client_id?).with_scope(scope)),
		};

		Ok(Some(authenticator))
	}

	/// Produces the form fields and headers for one token request.
	pub fn prepare_request(&self, now: OffsetDateTime) -> Result<TokenRequest, KeyError> {
		match self {
			Self::ClientSecretBasic(inner) => Ok(inner.prepare()),
			Self::ClientSecretPost(inner) => Ok(inner.prepare()),
			Self::ClientSecretJwt(inner) => inner.prepare(now),
			Self::PrivateKeyJwt(inner) => inner.prepare(now),
			Self::TlsClientAuth(inner) => Ok(inner.prepare()),
		}
	}

	/// Returns the client identifier the strategy authenticates as.
	pub fn client_id(&self) -> &str {
		match self {
			Self::ClientSecretBasic(inner) => &inner.client_id,
			Self::ClientSecretPost(inner) => &inner.client_id,
			Self::ClientSecretJwt(inner) => &inner.client_id,
			Self::PrivateKeyJwt(inner) => &inner.client_id,
			Self::TlsClientAuth(inner) => &inner.client_id,
		}
	}

	/// Returns `true` when the token request must use the mTLS endpoint aliases.
	pub fn uses_mtls(&self) -> bool {
		matches!(self, Self::TlsClientAuth(_))
	}
}

fn assertion_claims(
	client_id: &str,
	issuer: Option<&str>,
	audience: &str,
	now: OffsetDateTime,
) -> AssertionClaims {
	let iat = now.unix_timestamp();

	AssertionClaims {
		iss: issuer.filter(|i| !i.is_empty()).unwrap_or(client_id).to_owned(),
		sub: client_id.to_owned(),
		aud: audience.to_owned(),
		iat,
		exp: iat + Authenticator::ASSERTION_LIFETIME.whole_seconds(),
		jti: URL_SAFE_NO_PAD.encode(rand::random::<[u8; 16]>()),
	}
}
