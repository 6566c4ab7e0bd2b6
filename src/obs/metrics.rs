// self
use crate::obs::HandshakeOutcome;

/// Records a handshake outcome via the global metrics recorder (when enabled).
pub fn record_handshake_outcome(outcome: HandshakeOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oauth2_popup_handshake_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_handshake_outcome_noop_without_metrics() {
		record_handshake_outcome(HandshakeOutcome::Canceled);
	}
}
