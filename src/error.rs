//! Crate-level error types shared across authenticators, providers, and the registry.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; fatal at construction time.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Upstream answered with an unexpected status or an undecodable body.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// Request construction was rejected before any network call.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Key material could not be loaded or used.
	#[error("{0}")]
	Key(
		#[from]
		#[source]
		crate::auth::KeyError,
	),
	/// Keyed-cache failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Provider lookup failure.
	#[error(transparent)]
	Registry(#[from] crate::registry::RegistryError),
	/// A request body could not be encoded.
	#[error("Failed to encode the request body.")]
	Encode(#[source] serde_json::Error),
}

/// Configuration and construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A configured or discovered URL cannot be parsed.
	#[error("The {field} URL is invalid.")]
	InvalidUrl {
		/// Which URL failed to parse.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A file referenced by the configuration cannot be read.
	#[error("Failed to read {}.", path.display())]
	ReadFile {
		/// Path that failed.
		path: std::path::PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// A required configuration field is empty.
	#[error("Configuration field `{field}` is required.")]
	MissingField {
		/// Name of the missing field.
		field: &'static str,
	},
	/// The auth-config type is not one of the supported client-authentication methods.
	#[error("Unsupported auth type `{value}`.")]
	UnsupportedAuthType {
		/// Raw configured value.
		value: String,
	},
	/// The configured token signing method does not fit the auth type.
	#[error("Signing method `{value}` is not supported for {auth_type}.")]
	UnsupportedSigningMethod {
		/// Raw configured value.
		value: String,
		/// Auth type the method was configured for.
		auth_type: &'static str,
	},
	/// An auth client was requested without an authenticator.
	#[error("Auth client requires an authenticator.")]
	MissingAuthenticator,
	/// The provider metadata does not advertise an endpoint the operation needs.
	#[error("Provider `{provider}` does not advertise a {endpoint} endpoint.")]
	MissingEndpoint {
		/// Provider name.
		provider: String,
		/// Which endpoint is missing.
		endpoint: &'static str,
	},
	/// Neither an auth client nor a static access token is available.
	#[error("Provider `{provider}` has no access token configured.")]
	MissingAccessToken {
		/// Provider name.
		provider: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Endpoint URL that was being called.
		endpoint: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint: endpoint.into(), source: Box::new(src) }
	}
}

/// Upstream responses that do not match the wire contract.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// The endpoint answered with a status other than the expected one.
	#[error("{endpoint} returned HTTP {status}: {body}")]
	UnexpectedStatus {
		/// Server or endpoint label.
		endpoint: String,
		/// HTTP status code.
		status: u16,
		/// Response body preview.
		body: String,
	},
	/// The endpoint answered with JSON that could not be decoded.
	#[error("{endpoint} returned malformed JSON.")]
	MalformedJson {
		/// Server or endpoint label.
		endpoint: String,
		/// HTTP status code.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl ProtocolError {
	const BODY_PREVIEW_LIMIT: usize = 512;

	/// Builds an [`ProtocolError::UnexpectedStatus`] carrying a bounded body preview.
	pub fn unexpected_status(endpoint: impl Into<String>, status: u16, body: &[u8]) -> Self {
		Self::UnexpectedStatus {
			endpoint: endpoint.into(),
			status,
			body: truncate_preview(String::from_utf8_lossy(body).into_owned()),
		}
	}

	/// Returns the HTTP status associated with the failure.
	pub fn status(&self) -> u16 {
		match self {
			Self::UnexpectedStatus { status, .. } | Self::MalformedJson { status, .. } => *status,
		}
	}
}

/// Request-construction failures raised before any network call.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// Redirect-based grants need at least one redirect URI.
	#[error("Redirect uri should be set for the {grant_type} grant.")]
	MissingRedirectUri {
		/// Grant type that requires redirects.
		grant_type: String,
	},
	/// Okta only accepts PKCE for browser applications.
	#[error("Okta requires application_type `browser` when pkce_required is set, found `{found}`.")]
	OktaApplicationType {
		/// Application type that was supplied.
		found: String,
	},
	/// Client deletion needs the identifier assigned by the IdP.
	#[error("Client id is required to unregister a client.")]
	MissingClientId,
	/// Extension properties cannot shadow fixed client metadata fields.
	#[error("Extra property `{key}` collides with a client metadata field.")]
	ReservedExtraProperty {
		/// Offending key.
		key: String,
	},
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= ProtocolError::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = body.chars().take(ProtocolError::BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}
