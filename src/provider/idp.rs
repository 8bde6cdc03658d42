//! [`Provider`]: one configured IdP bound to its discovered metadata.

// crates.io
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	auth::{AuthClient, Authenticator, FileKeyReader, KeyReader, Secret},
	clock::{Clock, SystemClock},
	config::{IdpConfig, IdpType},
	error::{ConfigError, ValidationError},
	http::{self, HttpTransport},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	provider::{AuthorizationServerMetadata, IdpStrategy, strategy_for},
	registration::{AUTHORIZATION_CODE, ClientMetadata, IMPLICIT},
};
#[cfg(feature = "reqwest")]
use crate::{config::TransportConfig, http::ReqwestHttpClient};

/// A configured identity provider with discovered metadata and a token source.
///
/// Providers are immutable after [`ProviderBuilder::build`]; the only mutable state is the
/// token cache inside the optional [`AuthClient`]. Share them behind `Arc`.
pub struct Provider {
	config: IdpConfig,
	metadata: AuthorizationServerMetadata,
	strategy: Arc<dyn IdpStrategy>,
	auth_client: Option<AuthClient>,
	transport: Arc<dyn HttpTransport>,
}
impl Provider {
	/// Starts building a provider that talks to the IdP through `transport`.
	pub fn builder(config: IdpConfig, transport: Arc<dyn HttpTransport>) -> ProviderBuilder {
		ProviderBuilder::new(config, transport)
	}

	/// Builds a provider over a reqwest transport configured by `transport`.
	#[cfg(feature = "reqwest")]
	pub async fn new(config: IdpConfig, transport: &TransportConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::from_config(transport)?;

		Self::builder(config, Arc::new(http_client)).build().await
	}

	/// Configured provider name.
	pub fn name(&self) -> &str {
		&self.config.name
	}

	/// Configured provider flavor.
	pub fn idp_type(&self) -> IdpType {
		self.config.idp_type
	}

	/// Configuration the provider was built from.
	pub fn config(&self) -> &IdpConfig {
		&self.config
	}

	/// Discovery document URL.
	pub fn metadata_url(&self) -> &str {
		self.config.metadata_url.trim()
	}

	/// Discovered metadata snapshot.
	pub fn metadata(&self) -> &AuthorizationServerMetadata {
		&self.metadata
	}

	/// Issuer advertised by the IdP.
	pub fn issuer(&self) -> &str {
		&self.metadata.issuer
	}

	/// Token endpoint advertised by the IdP.
	pub fn token_endpoint(&self) -> Option<&str> {
		self.metadata.token_endpoint.as_deref()
	}

	/// Authorization endpoint advertised by the IdP.
	pub fn authorization_endpoint(&self) -> Option<&str> {
		self.metadata.authorization_endpoint.as_deref()
	}

	/// Registration endpoint advertised by the IdP.
	pub fn registration_endpoint(&self) -> Option<&str> {
		self.metadata.registration_endpoint.as_deref()
	}

	/// Scheme placed before tokens in registration calls (`Bearer`, `SSWS`).
	pub fn authorization_header_prefix(&self) -> &'static str {
		self.strategy.authorization_header_prefix()
	}

	/// Token client, absent when the provider uses a pre-issued access token.
	pub fn auth_client(&self) -> Option<&AuthClient> {
		self.auth_client.as_ref()
	}

	/// Returns a token for registration calls: a cached or fresh client-credentials token, or the
	/// configured static access token.
	pub async fn get_token(&self) -> Result<Secret> {
		match &self.auth_client {
			Some(client) => client.get_token().await,
			None => self
				.config
				.auth_config
				.access_token
				.clone()
				.filter(|token| !token.is_empty())
				.ok_or_else(|| {
					ConfigError::MissingAccessToken { provider: self.config.name.clone() }.into()
				}),
		}
	}

	/// Registers `client` with the IdP and returns the IdP's representation of it.
	///
	/// The request is enriched with configured defaults and vendor rules and validated before
	/// any network call. The registration access token is stripped from the result unless the
	/// auth config asks to keep it.
	pub async fn register_client(&self, client: ClientMetadata) -> Result<ClientMetadata> {
		let span = OperationSpan::new(OperationKind::RegisterClient, "register_client", self.name());

		span.instrument(async move {
			let mut client = client;

			obs::record_operation_outcome(
				OperationKind::RegisterClient,
				self.name(),
				OperationOutcome::Attempt,
			);

			let result = self.try_register(&mut client).await;

			self.observe_client_call(OperationKind::RegisterClient, &client, &result);

			result
		})
		.await
	}

	/// Deletes the client `client_id` at the IdP.
	///
	/// When `access_token` is `None` the provider's own token source is used. Success is
	/// HTTP 204 exactly.
	pub async fn unregister_client(&self, client_id: &str, access_token: Option<&str>) -> Result<()> {
		let span =
			OperationSpan::new(OperationKind::UnregisterClient, "unregister_client", self.name());

		span.instrument(async move {
			let mut client = ClientMetadata::default();

			client.client_id = Some(client_id.to_owned());

			obs::record_operation_outcome(
				OperationKind::UnregisterClient,
				self.name(),
				OperationOutcome::Attempt,
			);

			let result = self.try_unregister(client_id, access_token).await;

			self.observe_client_call(OperationKind::UnregisterClient, &client, &result);

			result
		})
		.await
	}

	/// Applies configured defaults, vendor rules, and response-type derivation to `client`.
	pub fn enrich_client_request(&self, client: &mut ClientMetadata) -> Result<(), ValidationError> {
		if client.scope.is_empty() {
			client.scope = self.config.client_scopes.clone();
		}
		if client.grant_types.is_empty() && !self.config.grant_type.trim().is_empty() {
			client.grant_types = vec![self.config.grant_type.trim().to_owned()];
		}
		if client.token_endpoint_auth_method.is_none() && !self.config.auth_method.trim().is_empty()
		{
			client.token_endpoint_auth_method = Some(self.config.auth_method.trim().to_owned());
		}

		for (key, value) in &self.config.extra_properties {
			if client.extra_property(key).is_none() {
				client.insert_extra_property(key.clone(), value.clone())?;
			}
		}

		self.strategy.validate_extra_properties(client.extra_properties())?;
		self.strategy.pre_process_client_request(client)?;

		for (grant_type, response_type) in [(AUTHORIZATION_CODE, "code"), (IMPLICIT, "token")] {
			if client.has_grant_type(grant_type) && !client.has_response_type(response_type) {
				client.response_types.push(response_type.to_owned());
			}
		}

		Ok(())
	}

	async fn try_register(&self, client: &mut ClientMetadata) -> Result<ClientMetadata> {
		self.enrich_client_request(client)?;
		client.validate()?;

		let url = self.registration_url()?;
		let token = self.get_token().await?;
		let body = serde_json::to_vec(&*client).map_err(Error::Encode)?;
		let request = http::build_request(
			Method::POST,
			&url,
			[
				("Authorization", self.authorization_value(&token)),
				("Content-Type", "application/json".to_owned()),
				("Accept", "application/json".to_owned()),
			],
			body,
		)?;
		let response = self.transport.send(request).await?;

		http::ensure_status(self.name(), &response, &[200, 201])?;

		let mut registered: ClientMetadata = http::decode_json(self.name(), &response)?;

		if !self.config.auth_config.use_registration_access_token {
			registered.registration_access_token = None;
		}

		Ok(registered)
	}

	async fn try_unregister(&self, client_id: &str, access_token: Option<&str>) -> Result<()> {
		if client_id.trim().is_empty() {
			return Err(ValidationError::MissingClientId.into());
		}

		let mut url = self.registration_url()?;

		match url.path_segments_mut() {
			Ok(mut segments) => {
				segments.pop_if_empty().push(client_id.trim());
			},
			Err(()) =>
				return Err(ConfigError::InvalidUrl {
					field: "registration",
					source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
				}
				.into()),
		}

		let token = match access_token.filter(|t| !t.trim().is_empty()) {
			Some(token) => Secret::new(token.trim()),
			None => self.get_token().await?,
		};
		let request = http::build_request(
			Method::DELETE,
			&url,
			[("Authorization", self.authorization_value(&token))],
			Vec::new(),
		)?;
		let response = self.transport.send(request).await?;

		http::ensure_status(self.name(), &response, &[204])?;

		Ok(())
	}

	fn registration_url(&self) -> Result<Url> {
		let mtls = self.config.auth_config.auth_type.is_tls();
		let endpoint = self.metadata.registration_endpoint_for(mtls).ok_or_else(|| {
			ConfigError::MissingEndpoint {
				provider: self.config.name.clone(),
				endpoint: "registration",
			}
		})?;

		Ok(parse_endpoint("registration", endpoint)?)
	}

	fn authorization_value(&self, token: &Secret) -> String {
		format!("{} {}", self.authorization_header_prefix(), token.expose())
	}

	fn observe_client_call<T>(&self, kind: OperationKind, client: &ClientMetadata, result: &Result<T>) {
		match result {
			Ok(_) => obs::record_operation_outcome(kind, self.name(), OperationOutcome::Success),
			Err(e) => {
				obs::record_operation_outcome(kind, self.name(), OperationOutcome::Failure);
				obs::log_client_failure(kind, self.name(), client, e);
			},
		}
	}
}
impl Debug for Provider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Provider")
			.field("name", &self.config.name)
			.field("idp_type", &self.config.idp_type)
			.field("issuer", &self.metadata.issuer)
			.field("auth_client", &self.auth_client)
			.finish_non_exhaustive()
	}
}

/// Builder for [`Provider`].
pub struct ProviderBuilder {
	config: IdpConfig,
	transport: Arc<dyn HttpTransport>,
	key_reader: Arc<dyn KeyReader>,
	clock: Arc<dyn Clock>,
}
impl ProviderBuilder {
	fn new(config: IdpConfig, transport: Arc<dyn HttpTransport>) -> Self {
		Self {
			config,
			transport,
			key_reader: Arc::new(FileKeyReader),
			clock: Arc::new(SystemClock),
		}
	}

	/// Overrides the key loader used for `private_key_jwt`.
	pub fn key_reader(mut self, key_reader: Arc<dyn KeyReader>) -> Self {
		self.key_reader = key_reader;

		self
	}

	/// Overrides the clock used by the token client.
	pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Validates the configuration, discovers the IdP metadata, and builds the token client.
	///
	/// Discovery failures are fatal; nothing is retried.
	pub async fn build(self) -> Result<Provider> {
		let Self { config, transport, key_reader, clock } = self;

		config.validate()?;

		let span = OperationSpan::new(OperationKind::Discovery, "build", &config.name);
		let metadata = span.instrument(discover(&config, transport.as_ref())).await?;
		let auth_client = match Authenticator::from_config(
			&config.auth_config,
			&metadata.issuer,
			key_reader.as_ref(),
		)? {
			Some(authenticator) => {
				let endpoint = metadata.token_endpoint_for(authenticator.uses_mtls()).ok_or_else(
					|| ConfigError::MissingEndpoint { provider: config.name.clone(), endpoint: "token" },
				)?;
				let auth_client = AuthClient::builder(parse_endpoint("token", endpoint)?, transport.clone())
					.server_name(config.name.clone())
					.authenticator(authenticator)
					.clock(clock)
					.request_headers(config.auth_config.request_headers.clone())
					.query_params(config.auth_config.query_params.clone())
					.use_cached_token(config.auth_config.use_cached_token)
					.build()?;

				Some(auth_client)
			},
			None => None,
		};
		let strategy = strategy_for(config.idp_type);

		Ok(Provider { config, metadata, strategy, auth_client, transport })
	}
}

async fn discover(
	config: &IdpConfig,
	transport: &dyn HttpTransport,
) -> Result<AuthorizationServerMetadata> {
	obs::record_operation_outcome(
		OperationKind::Discovery,
		&config.name,
		OperationOutcome::Attempt,
	);

	obs::observe(OperationKind::Discovery, &config.name, fetch_metadata(config, transport).await)
}

async fn fetch_metadata(
	config: &IdpConfig,
	transport: &dyn HttpTransport,
) -> Result<AuthorizationServerMetadata> {
	let url = config.metadata_url()?;
	let request =
		http::build_request(Method::GET, &url, [("Accept", "application/json")], Vec::new())?;
	let response = transport.send(request).await?;

	http::ensure_status(&config.name, &response, &[200])?;

	Ok(http::decode_json(&config.name, &response)?)
}

fn parse_endpoint(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { field, source })
}
