//! Shared fixtures for integration tests: a mock IdP discovery document, config helpers, and a
//! transport that records every request before forwarding it over reqwest.

#![allow(dead_code)]

// std
use std::{
	path::{Path, PathBuf},
	sync::Arc,
};
// crates.io
use httpmock::{Mock, prelude::*};
use parking_lot::Mutex;
use serde_json::{Value, json};
// self
use oauth2_idp::{
	config::{IdpAuthConfig, IdpConfig, IdpType, TlsConfig, TransportConfig},
	http::{HttpFuture, HttpRequest, HttpTransport, ReqwestHttpClient},
};

pub const METADATA_PATH: &str = "/.well-known/openid-configuration";
pub const TOKEN_PATH: &str = "/oauth2/v1/token";
pub const AUTHORIZE_PATH: &str = "/oauth2/v1/authorize";
pub const REGISTER_PATH: &str = "/oauth2/v1/clients";
pub const CLIENT_ID: &str = "agent";
pub const CLIENT_SECRET: &str = "agent-secret";

/// Request as seen on the wire.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub method: String,
	pub path: String,
	pub authorization: Option<String>,
	pub content_type: Option<String>,
	pub body: Vec<u8>,
}
impl RecordedRequest {
	pub fn json(&self) -> Value {
		serde_json::from_slice(&self.body).expect("Recorded body should be JSON.")
	}

	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Reqwest transport that keeps a copy of every request it sends.
pub struct RecordingTransport {
	inner: ReqwestHttpClient,
	requests: Mutex<Vec<RecordedRequest>>,
}
impl RecordingTransport {
	pub fn new() -> Arc<Self> {
		let inner = ReqwestHttpClient::from_config(&transport_config())
			.expect("Test transport should build.");

		Arc::new(Self { inner, requests: Mutex::new(Vec::new()) })
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().clone()
	}

	pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
		self.requests().into_iter().filter(|r| r.path == path).collect()
	}
}
impl HttpTransport for RecordingTransport {
	fn send(&self, request: HttpRequest) -> HttpFuture<'_> {
		let header = |name: &str| {
			request.headers().get(name).and_then(|v| v.to_str().ok()).map(ToOwned::to_owned)
		};
		let recorded = RecordedRequest {
			method: request.method().to_string(),
			path: request.uri().path().to_owned(),
			authorization: header("authorization"),
			content_type: header("content-type"),
			body: request.body().clone(),
		};

		self.requests.lock().push(recorded);
		self.inner.send(request)
	}
}

/// Transport settings that trust the self-signed certificates served by `httpmock`.
pub fn transport_config() -> TransportConfig {
	TransportConfig::default()
		.with_tls(TlsConfig { insecure_skip_verify: true, ..Default::default() })
}

pub fn fixture(name: &str) -> PathBuf {
	Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

pub fn discovery_document(server: &MockServer) -> Value {
	json!({
		"issuer": server.base_url(),
		"authorization_endpoint": server.url(AUTHORIZE_PATH),
		"token_endpoint": server.url(TOKEN_PATH),
		"registration_endpoint": server.url(REGISTER_PATH),
		"grant_types_supported": ["authorization_code", "client_credentials"],
		"token_endpoint_auth_methods_supported": ["client_secret_basic", "private_key_jwt"],
		"claims_supported": ["sub"]
	})
}

pub async fn mock_discovery(server: &MockServer) -> Mock<'_> {
	mock_discovery_document(server, discovery_document(server)).await
}

pub async fn mock_discovery_document<'a>(server: &'a MockServer, document: Value) -> Mock<'a> {
	let body = document.to_string();

	server
		.mock_async(|when, then| {
			when.method(GET).path(METADATA_PATH);
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

pub async fn mock_token<'a>(server: &'a MockServer, token: &str, expires_in: u64) -> Mock<'a> {
	let body = json!({ "access_token": token, "token_type": "Bearer", "expires_in": expires_in })
		.to_string();

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

pub fn idp_config(server: &MockServer, name: &str, auth_config: IdpAuthConfig) -> IdpConfig {
	IdpConfig::new(name, server.url(METADATA_PATH), auth_config)
}

pub fn basic_auth() -> IdpAuthConfig {
	IdpAuthConfig::new(oauth2_idp::config::AuthType::ClientSecretBasic)
		.with_client_id(CLIENT_ID)
		.with_client_secret(CLIENT_SECRET)
}

pub fn okta_config(server: &MockServer) -> IdpConfig {
	idp_config(server, "okta", IdpAuthConfig::access_token("ssws-api-token"))
		.with_idp_type(IdpType::Okta)
}
