//! Optional observability helpers for popup handshakes.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_popup.handshake` with the `stage`
//!   and `target` fields, plus debug events for settlements and ignored signals.
//! - Enable `metrics` to increment the `oauth2_popup_handshake_total` counter for every
//!   attempt/fulfillment/rejection/cancellation, labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, error::HandshakeRejected, handshake::AuthorizationResult};

/// Coordinator entry points observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandshakeStage {
	/// Opening the popup for a target.
	Initiate,
	/// Receiving a result from the callback page.
	Deliver,
	/// Cancellation watch reporting on the popup.
	Watch,
}
impl HandshakeStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			HandshakeStage::Initiate => "initiate",
			HandshakeStage::Deliver => "deliver",
			HandshakeStage::Watch => "watch",
		}
	}
}
impl Display for HandshakeStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandshakeOutcome {
	/// A popup was opened.
	Attempt,
	/// The callback delivered a success payload.
	Fulfilled,
	/// The callback delivered a remote error.
	Rejected,
	/// The user closed the popup first.
	Canceled,
}
impl HandshakeOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			HandshakeOutcome::Attempt => "attempt",
			HandshakeOutcome::Fulfilled => "fulfilled",
			HandshakeOutcome::Rejected => "rejected",
			HandshakeOutcome::Canceled => "canceled",
		}
	}

	/// Maps a settled result to its label.
	pub fn of(result: &AuthorizationResult) -> Self {
		match result {
			Ok(_) => HandshakeOutcome::Fulfilled,
			Err(HandshakeRejected::Remote { .. }) => HandshakeOutcome::Rejected,
			Err(HandshakeRejected::Closed) => HandshakeOutcome::Canceled,
		}
	}
}
impl Display for HandshakeOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
