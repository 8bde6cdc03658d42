//! Caching `client_credentials` token client.

// self
use crate::{
	_prelude::*,
	auth::{Authenticator, Secret},
	clock::{Clock, SystemClock},
	error::ConfigError,
	http::{self, HttpTransport},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
};

/// Token that may be served from cache until `refresh_at`.
#[derive(Clone)]
struct CachedToken {
	access_token: Secret,
	refresh_at: OffsetDateTime,
}
impl CachedToken {
	// Tokens are refreshed once 80% of their lifetime has elapsed.
	fn new(access_token: Secret, expires_in: u64, fetched_at: OffsetDateTime) -> Self {
		let seconds = expires_in.min(u64::from(u32::MAX)) * 4 / 5;
		let refresh_at =
			fetched_at.checked_add(Duration::seconds(seconds as i64)).unwrap_or(fetched_at);

		Self { access_token, refresh_at }
	}

	fn is_fresh(&self, now: OffsetDateTime) -> bool {
		now < self.refresh_at
	}
}

#[derive(Deserialize)]
struct TokenResponse {
	access_token: Secret,
	#[serde(default)]
	expires_in: Option<u64>,
}

/// Obtains bearer tokens with one [`Authenticator`] and caches the latest one.
///
/// All callers share one async mutex that is held across the token request, so concurrent
/// [`AuthClient::get_token`] calls issue at most one request and every waiter observes the
/// token it produced. Failures are returned uncached; the next call starts from scratch.
pub struct AuthClient {
	server_name: String,
	token_endpoint: Url,
	authenticator: Authenticator,
	transport: Arc<dyn HttpTransport>,
	clock: Arc<dyn Clock>,
	request_headers: BTreeMap<String, String>,
	use_cached_token: bool,
	cache: AsyncMutex<Option<CachedToken>>,
}
impl AuthClient {
	/// Starts building a client for `token_endpoint`.
	pub fn builder(token_endpoint: Url, transport: Arc<dyn HttpTransport>) -> AuthClientBuilder {
		AuthClientBuilder::new(token_endpoint, transport)
	}

	/// Returns a valid access token, fetching a new one when the cached token is stale.
	pub async fn get_token(&self) -> Result<Secret> {
		let span = OperationSpan::new(OperationKind::Token, "get_token", &self.server_name);

		span.instrument(async {
			let mut cache = self.cache.lock().await;

			let now = self.clock.now();

			if let Some(cached) = cache.as_ref().filter(|c| self.use_cached_token && c.is_fresh(now)) {
				return Ok(cached.access_token.clone());
			}

			*cache = None;

			obs::record_operation_outcome(
				OperationKind::Token,
				&self.server_name,
				OperationOutcome::Attempt,
			);

			let fetched = obs::observe(OperationKind::Token, &self.server_name, self.fetch().await)?;
			let access_token = fetched.access_token.clone();

			if self.use_cached_token {
				*cache = Some(fetched);
			}

			Ok(access_token)
		})
		.await
	}

	/// Token endpoint the client posts to, including configured query parameters.
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}

	/// Authentication strategy bound to the client.
	pub fn authenticator(&self) -> &Authenticator {
		&self.authenticator
	}

	async fn fetch(&self) -> Result<CachedToken> {
		let prepared = self.authenticator.prepare_request(self.clock.now())?;
		let headers = self
			.request_headers
			.iter()
			.map(|(k, v)| (k.as_str(), v.as_str()))
			.chain(prepared.headers.iter().map(|(k, v)| (*k, v.as_str())));
		let request = http::form_request(&self.token_endpoint, headers, &prepared.form)?;
		let response = self.transport.send(request).await?;

		http::ensure_status(&self.server_name, &response, &[200])?;

		let body: TokenResponse = http::decode_json(&self.server_name, &response)?;

		Ok(CachedToken::new(body.access_token, body.expires_in.unwrap_or(0), self.clock.now()))
	}
}
impl Debug for AuthClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthClient")
			.field("server_name", &self.server_name)
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("authenticator", &self.authenticator)
			.field("use_cached_token", &self.use_cached_token)
			.finish_non_exhaustive()
	}
}

/// Builder for [`AuthClient`].
pub struct AuthClientBuilder {
	server_name: Option<String>,
	token_endpoint: Url,
	authenticator: Option<Authenticator>,
	transport: Arc<dyn HttpTransport>,
	clock: Arc<dyn Clock>,
	request_headers: BTreeMap<String, String>,
	query_params: BTreeMap<String, String>,
	use_cached_token: bool,
}
impl AuthClientBuilder {
	fn new(token_endpoint: Url, transport: Arc<dyn HttpTransport>) -> Self {
		Self {
			server_name: None,
			token_endpoint,
			authenticator: None,
			transport,
			clock: Arc::new(SystemClock),
			request_headers: BTreeMap::new(),
			query_params: BTreeMap::new(),
			use_cached_token: true,
		}
	}

	/// Label used in errors and logs; defaults to the token endpoint host.
	pub fn server_name(mut self, name: impl Into<String>) -> Self {
		self.server_name = Some(name.into());

		self
	}

	/// Sets the authentication strategy.
	pub fn authenticator(mut self, authenticator: Authenticator) -> Self {
		self.authenticator = Some(authenticator);

		self
	}

	/// Overrides the clock used for expiry and assertion timestamps.
	pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Adds headers to every token request.
	pub fn request_headers(mut self, headers: BTreeMap<String, String>) -> Self {
		self.request_headers.extend(headers);

		self
	}

	/// Appends query parameters to the token endpoint.
	pub fn query_params(mut self, params: BTreeMap<String, String>) -> Self {
		self.query_params.extend(params);

		self
	}

	/// Toggles token caching.
	pub fn use_cached_token(mut self, enabled: bool) -> Self {
		self.use_cached_token = enabled;

		self
	}

	/// Builds the client.
	pub fn build(self) -> Result<AuthClient, ConfigError> {
		let authenticator = self.authenticator.ok_or(ConfigError::MissingAuthenticator)?;
		let mut token_endpoint = self.token_endpoint;

		if !self.query_params.is_empty() {
			token_endpoint.query_pairs_mut().extend_pairs(&self.query_params);
		}

		let server_name = self
			.server_name
			.or_else(|| token_endpoint.host_str().map(ToOwned::to_owned))
			.unwrap_or_else(|| token_endpoint.to_string());

		Ok(AuthClient {
			server_name,
			token_endpoint,
			authenticator,
			transport: self.transport,
			clock: self.clock,
			request_headers: self.request_headers,
			use_cached_token: self.use_cached_token,
			cache: AsyncMutex::new(None),
		})
	}
}
