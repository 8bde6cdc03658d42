//! Optional observability helpers for token, discovery, and registration calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_idp.operation` with the `operation`,
//!   `stage`, and `provider` fields, plus warning events for every failure returned to a caller.
//! - Enable `metrics` to increment the `oauth2_idp_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation`, `provider`, and `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, registration::ClientMetadata};

/// Network-bound operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Authorization-server metadata discovery.
	Discovery,
	/// Client-credentials token request.
	Token,
	/// Dynamic client registration.
	RegisterClient,
	/// Client deletion.
	UnregisterClient,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Discovery => "discovery",
			OperationKind::Token => "token",
			OperationKind::RegisterClient => "register_client",
			OperationKind::UnregisterClient => "unregister_client",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the outcome of `result` and logs failures before handing the result back.
pub(crate) fn observe<T>(kind: OperationKind, server: &str, result: Result<T>) -> Result<T> {
	match &result {
		Ok(_) => record_operation_outcome(kind, server, OperationOutcome::Success),
		Err(e) => {
			record_operation_outcome(kind, server, OperationOutcome::Failure);
			log_operation_failure(kind, server, e);
		},
	}

	result
}

/// Logs a failed operation against `server`.
pub fn log_operation_failure(kind: OperationKind, server: &str, error: &Error) {
	#[cfg(feature = "tracing")]
	::tracing::warn!(operation = kind.as_str(), server, error = %error, "IdP call failed.");

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, server, error);
	}
}

/// Logs a failed registration call with the client's non-secret attributes.
pub fn log_client_failure(
	kind: OperationKind,
	provider: &str,
	client: &ClientMetadata,
	error: &Error,
) {
	#[cfg(feature = "tracing")]
	::tracing::warn!(
		operation = kind.as_str(),
		provider,
		client_name = client.client_name.as_deref().unwrap_or_default(),
		grant_types = ?client.grant_types,
		auth_method = client.token_endpoint_auth_method.as_deref().unwrap_or_default(),
		response_types = ?client.response_types,
		redirect_uris = ?client.redirect_uris,
		error = %error,
		"Client registration call failed."
	);

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, provider, client, error);
	}
}
