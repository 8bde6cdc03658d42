//! Vendor hooks applied to dynamic client registration.
//!
//! Strategies only see crate-owned data ([`ClientMetadata`] and its extension-property map),
//! so adding an IdP never touches the registration algorithm in [`Provider`](super::Provider).

// self
use crate::{
	_prelude::*,
	config::IdpType,
	error::ValidationError,
	registration::{CLIENT_CREDENTIALS, ClientMetadata},
};

/// Strategy hook that lets IdPs customize registration requests.
///
/// Implementors are required to be `Send + Sync`. Both request hooks default to no-ops, so
/// a standards-compliant IdP only chooses its authorization header prefix.
pub trait IdpStrategy
where
	Self: Send + Sync,
{
	/// Scheme placed before the token in the registration `Authorization` header.
	fn authorization_header_prefix(&self) -> &'static str;

	/// Rewrites an outgoing registration request; must be idempotent.
	fn pre_process_client_request(&self, _client: &mut ClientMetadata) -> Result<(), ValidationError> {
		Ok(())
	}

	/// Rejects extension-property combinations the IdP would refuse.
	fn validate_extra_properties(
		&self,
		_properties: &BTreeMap<String, JsonValue>,
	) -> Result<(), ValidationError> {
		Ok(())
	}
}

/// Standards-compliant IdP using `Bearer` tokens.
#[derive(Clone, Copy, Debug, Default)]
pub struct GenericIdp;
impl IdpStrategy for GenericIdp {
	fn authorization_header_prefix(&self) -> &'static str {
		"Bearer"
	}
}

/// Okta, which authenticates management calls with `SSWS` API tokens and classifies clients by
/// `application_type`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OktaIdp;
impl OktaIdp {
	/// Extension property toggling PKCE for the client.
	pub const PKCE_REQUIRED: &'static str = "pkce_required";
	/// Extension property holding the Okta application type.
	pub const APPLICATION_TYPE: &'static str = "application_type";

	fn pkce_required(properties: &BTreeMap<String, JsonValue>) -> bool {
		match properties.get(Self::PKCE_REQUIRED) {
			Some(JsonValue::Bool(flag)) => *flag,
			Some(JsonValue::String(flag)) => flag.eq_ignore_ascii_case("true"),
			_ => false,
		}
	}
}
impl IdpStrategy for OktaIdp {
	fn authorization_header_prefix(&self) -> &'static str {
		"SSWS"
	}

	fn pre_process_client_request(&self, client: &mut ClientMetadata) -> Result<(), ValidationError> {
		let pkce = Self::pkce_required(client.extra_properties());

		if client.extra_property(Self::APPLICATION_TYPE).is_none() {
			let redirecting = client.grant_types.iter().any(|g| g != CLIENT_CREDENTIALS);
			let application_type = match (redirecting, pkce) {
				(false, _) => "service",
				(true, true) => "browser",
				(true, false) => "web",
			};

			client.insert_extra_property(Self::APPLICATION_TYPE, application_type.into())?;
		}
		if client.has_grant_type(CLIENT_CREDENTIALS) && client.response_types.is_empty() {
			client.response_types = vec!["token".into()];
		}
		if pkce {
			client.token_endpoint_auth_method = Some("none".into());
		}

		Ok(())
	}

	fn validate_extra_properties(
		&self,
		properties: &BTreeMap<String, JsonValue>,
	) -> Result<(), ValidationError> {
		if !Self::pkce_required(properties) {
			return Ok(());
		}

		match properties.get(Self::APPLICATION_TYPE) {
			None | Some(JsonValue::Null) => Ok(()),
			Some(JsonValue::String(kind)) if kind == "browser" => Ok(()),
			Some(JsonValue::String(kind)) =>
				Err(ValidationError::OktaApplicationType { found: kind.clone() }),
			Some(other) => Err(ValidationError::OktaApplicationType { found: other.to_string() }),
		}
	}
}

/// Selects the strategy for an IdP type; Keycloak registers like a generic IdP.
pub fn strategy_for(idp_type: IdpType) -> Arc<dyn IdpStrategy> {
	match idp_type {
		IdpType::Okta => Arc::new(OktaIdp),
		IdpType::Generic | IdpType::Keycloak => Arc::new(GenericIdp),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::registration::{AUTHORIZATION_CODE, ClientBuilder};

	#[test]
	fn prefixes_follow_idp_type() {
		assert_eq!(strategy_for(IdpType::Generic).authorization_header_prefix(), "Bearer");
		assert_eq!(strategy_for(IdpType::Keycloak).authorization_header_prefix(), "Bearer");
		assert_eq!(strategy_for(IdpType::Okta).authorization_header_prefix(), "SSWS");
	}

	#[test]
	fn okta_pkce_preprocessing_is_idempotent() {
		let mut client = ClientBuilder::new()
			.grant_types([AUTHORIZATION_CODE])
			.redirect_uri("https://app.example.com/cb")
			.token_endpoint_auth_method("client_secret_basic")
			.extra_property(OktaIdp::PKCE_REQUIRED, json!(true))
			.build()
			.expect("Client fixture should build.");

		OktaIdp.pre_process_client_request(&mut client).expect("First pass should succeed.");

		let first = client.clone();

		OktaIdp.pre_process_client_request(&mut client).expect("Second pass should succeed.");

		assert_eq!(client, first);
		assert_eq!(client.extra_property(OktaIdp::APPLICATION_TYPE), Some(&json!("browser")));
		assert_eq!(client.token_endpoint_auth_method.as_deref(), Some("none"));
	}

	#[test]
	fn okta_derives_application_type_from_grants() {
		let mut service = ClientBuilder::new()
			.grant_types([CLIENT_CREDENTIALS])
			.build()
			.expect("Client fixture should build.");

		OktaIdp.pre_process_client_request(&mut service).expect("Preprocessing should succeed.");

		assert_eq!(service.extra_property(OktaIdp::APPLICATION_TYPE), Some(&json!("service")));
		assert_eq!(service.response_types, ["token"]);

		let mut web = ClientBuilder::new()
			.grant_types([AUTHORIZATION_CODE])
			.redirect_uri("https://app.example.com/cb")
			.build()
			.expect("Client fixture should build.");

		OktaIdp.pre_process_client_request(&mut web).expect("Preprocessing should succeed.");

		assert_eq!(web.extra_property(OktaIdp::APPLICATION_TYPE), Some(&json!("web")));
		assert!(web.response_types.is_empty());
		assert_eq!(web.token_endpoint_auth_method, None);
	}

	#[test]
	fn okta_pkce_requires_browser_application_type() {
		let pkce = |application_type: Option<JsonValue>| {
			let mut properties = BTreeMap::from([(OktaIdp::PKCE_REQUIRED.to_owned(), json!("true"))]);

			if let Some(kind) = application_type {
				properties.insert(OktaIdp::APPLICATION_TYPE.to_owned(), kind);
			}

			OktaIdp.validate_extra_properties(&properties)
		};

		assert_eq!(pkce(None), Ok(()));
		assert_eq!(pkce(Some(json!("browser"))), Ok(()));
		assert_eq!(
			pkce(Some(json!("web"))),
			Err(ValidationError::OktaApplicationType { found: "web".into() })
		);

		let no_pkce = BTreeMap::from([(OktaIdp::APPLICATION_TYPE.to_owned(), json!("web"))]);

		assert_eq!(OktaIdp.validate_extra_properties(&no_pkce), Ok(()));
		assert_eq!(GenericIdp.validate_extra_properties(&no_pkce), Ok(()));
	}
}
