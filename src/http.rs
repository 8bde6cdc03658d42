//! HTTP transport seam shared by token requests, discovery, and client registration.
//!
//! The crate only ever speaks to the network through [`HttpTransport`], an object-safe trait
//! over the `oauth2` crate's [`HttpRequest`]/[`HttpResponse`] aliases (plain `http` types with
//! `Vec<u8>` bodies). [`ReqwestHttpClient`] is the stock implementation; tests and hosts with
//! their own stacks plug in anything else behind `Arc<dyn HttpTransport>`.

// crates.io
pub use oauth2::{HttpRequest, HttpResponse};
use oauth2::http::{Method, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, ProtocolError, TransportError},
};
#[cfg(feature = "reqwest")]
use crate::config::TransportConfig;

/// Boxed future returned by [`HttpTransport::send`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Sends one HTTP request and returns the full response.
///
/// Implementations must not follow redirects and must report non-2xx statuses as ordinary
/// responses; status interpretation belongs to the caller. Timeouts, proxies, and client
/// certificates are properties of the transport and are fixed when it is constructed.
pub trait HttpTransport
where
	Self: Send + Sync,
{
	/// Executes `request`.
	fn send(&self, request: HttpRequest) -> HttpFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
/// Token and registration endpoints answer directly, so redirects are never followed; configure
/// any custom [`ReqwestClient`] passed to [`ReqwestHttpClient::with_client`] the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the timeout, proxy, and TLS settings in `config`.
	pub fn from_config(config: &TransportConfig) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder()
			.timeout(config.timeout)
			.redirect(reqwest::redirect::Policy::none());

		if let Some(proxy) = config.proxy_url.as_deref().filter(|p| !p.trim().is_empty()) {
			builder = builder.proxy(reqwest::Proxy::all(proxy.trim())?);
		}
		if let Some(path) = &config.tls.root_ca {
			builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&read_file(path)?)?);
		}

		match (&config.tls.client_certificate, &config.tls.client_key) {
			(Some(cert), Some(key)) => {
				let mut pem = read_file(cert)?;

				pem.push(b'\n');
				pem.extend(read_file(key)?);

				builder = builder.identity(reqwest::Identity::from_pem(&pem)?);
			},
			(Some(_), None) => return Err(ConfigError::MissingField { field: "tls.client_key" }),
			(None, Some(_)) =>
				return Err(ConfigError::MissingField { field: "tls.client_certificate" }),
			(None, None) => {},
		}

		if config.tls.insecure_skip_verify {
			builder = builder.danger_accept_invalid_certs(true);
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	fn send(&self, request: HttpRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			let endpoint = request.uri().to_string();
			let network = |e: ReqwestError| TransportError::network(endpoint.as_str(), e);
			let response = self.0.execute(request.try_into().map_err(network)?).await.map_err(network)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await.map_err(network)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Builds a request with the given headers and body.
pub(crate) fn build_request<I, K, V>(
	method: Method,
	url: &Url,
	headers: I,
	body: Vec<u8>,
) -> Result<HttpRequest, ConfigError>
where
	I: IntoIterator<Item = (K, V)>,
	K: AsRef<str>,
	V: AsRef<str>,
{
	let mut builder = oauth2::http::Request::builder().method(method).uri(url.as_str());

	for (name, value) in headers {
		builder = builder.header(name.as_ref(), value.as_ref());
	}

	Ok(builder.body(body)?)
}

/// Builds a `application/x-www-form-urlencoded` POST.
pub(crate) fn form_request<I, K, V>(
	url: &Url,
	headers: I,
	form: &[(&'static str, String)],
) -> Result<HttpRequest, ConfigError>
where
	I: IntoIterator<Item = (K, V)>,
	K: AsRef<str>,
	V: AsRef<str>,
{
	let body = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(form).finish();
	let mut request = build_request(Method::POST, url, headers, body.into_bytes())?;

	request.headers_mut().insert(
		CONTENT_TYPE,
		oauth2::http::HeaderValue::from_static("application/x-www-form-urlencoded"),
	);

	Ok(request)
}

/// Fails with [`ProtocolError::UnexpectedStatus`] unless the status is one of `accepted`.
pub(crate) fn ensure_status(
	endpoint: &str,
	response: &HttpResponse,
	accepted: &[u16],
) -> Result<(), ProtocolError> {
	let status = response.status().as_u16();

	if accepted.contains(&status) {
		Ok(())
	} else {
		Err(ProtocolError::unexpected_status(endpoint, status, response.body()))
	}
}

/// Decodes a JSON body, recording the failing path on error.
pub(crate) fn decode_json<T>(endpoint: &str, response: &HttpResponse) -> Result<T, ProtocolError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(response.body());

	serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
		ProtocolError::MalformedJson {
			endpoint: endpoint.to_owned(),
			status: response.status().as_u16(),
			source,
		}
	})
}

#[cfg(feature = "reqwest")]
fn read_file(path: &std::path::Path) -> Result<Vec<u8>, ConfigError> {
	std::fs::read(path).map_err(|source| ConfigError::ReadFile { path: path.to_owned(), source })
}
