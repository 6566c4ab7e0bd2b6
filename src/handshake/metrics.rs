// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::HandshakeOutcome;

/// Thread-safe counters for handshake attempts and their outcomes.
#[derive(Debug, Default)]
pub struct HandshakeMetrics {
	attempts: AtomicU64,
	fulfilled: AtomicU64,
	rejected: AtomicU64,
	canceled: AtomicU64,
}
impl HandshakeMetrics {
	/// Returns the number of popups opened.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of handshakes fulfilled with a success payload.
	pub fn fulfilled(&self) -> u64 {
		self.fulfilled.load(Ordering::Relaxed)
	}

	/// Returns the number of handshakes rejected by the remote platform.
	pub fn rejected(&self) -> u64 {
		self.rejected.load(Ordering::Relaxed)
	}

	/// Returns the number of handshakes canceled by closing the popup.
	pub fn canceled(&self) -> u64 {
		self.canceled.load(Ordering::Relaxed)
	}

	pub(crate) fn record(&self, outcome: HandshakeOutcome) {
		let counter = match outcome {
			HandshakeOutcome::Attempt => &self.attempts,
			HandshakeOutcome::Fulfilled => &self.fulfilled,
			HandshakeOutcome::Rejected => &self.rejected,
			HandshakeOutcome::Canceled => &self.canceled,
		};

		counter.fetch_add(1, Ordering::Relaxed);
	}
}
