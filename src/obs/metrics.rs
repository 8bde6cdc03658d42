// self
use crate::obs::{OperationKind, OperationOutcome};

/// Counts one IdP operation outcome for `provider` via the global metrics recorder (when
/// enabled).
pub fn record_operation_outcome(kind: OperationKind, provider: &str, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_idp_operation_total",
			"operation" => kind.as_str(),
			"provider" => provider.to_owned(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, provider, outcome);
	}
}
