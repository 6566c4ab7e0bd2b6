//! Crate-level error types shared by configuration, popup hosts, and the handshake coordinator.

// self
use crate::{_prelude::*, auth::TargetId};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
///
/// Every variant is raised synchronously by the call that violated a precondition. Handshake
/// outcomes travel through [`PendingAuthorization`](crate::handshake::PendingAuthorization) as
/// [`HandshakeRejected`] instead.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Configuration could not be validated.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Popup host failure.
	#[error(transparent)]
	Popup(#[from] PopupError),

	/// No target identifier was supplied.
	#[error("Missing target id.")]
	MissingTargetId,
	/// The supplied target identifier is not a positive integer.
	#[error("Invalid target id \"{value}\".")]
	InvalidTargetId {
		/// Raw value as received.
		value: String,
	},
	/// Another target is already mid-handshake.
	#[error(
		"Cannot start an integration for target {requested}: target {pending} is still pending."
	)]
	SessionAlreadyPending {
		/// Target identifier of the in-flight session.
		pending: TargetId,
		/// Target identifier that was requested.
		requested: TargetId,
	},
	/// A delivery named a different target than the active session.
	#[error("Received a callback for target {received}, where {expected} was expected.")]
	TargetMismatch {
		/// Target identifier of the active session.
		expected: TargetId,
		/// Target identifier carried by the delivery.
		received: TargetId,
	},
	/// A delivery arrived while no session has been opened.
	#[error("Received a callback for target {received} but no integration was initiated.")]
	NoSession {
		/// Target identifier carried by the delivery.
		received: TargetId,
	},
	/// A delivery payload could not be decoded.
	#[error("Callback payload is malformed.")]
	MalformedDelivery {
		/// Structured decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Configuration failures raised before any popup is opened.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// The configuration carries a key that is not recognized.
	#[error("Unknown config parameter \"{key}\".")]
	UnknownKey {
		/// Offending key.
		key: String,
	},
	/// A recognized key is absent after defaults were merged.
	#[error("Missing parameter \"{key}\" from config.")]
	MissingKey {
		/// Missing key.
		key: &'static str,
	},
	/// A recognized key failed its predicate.
	#[error("Parameter \"{key}\" in config is invalid: \"{value}\".")]
	InvalidValue {
		/// Offending key.
		key: &'static str,
		/// Display rendering of the rejected value.
		value: String,
	},
	/// Configuration text is not a JSON object.
	#[error("Configuration is not a JSON object.")]
	InvalidJson {
		/// Underlying parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// Validated configuration could not be decoded into its typed form.
	#[error("Configuration could not be decoded.")]
	Decode {
		/// Structured decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Failures reported by a [`PopupHost`](crate::popup::PopupHost).
#[derive(Debug, ThisError)]
pub enum PopupError {
	/// The host refused to open a window (popup blocker, missing `window`).
	#[error("Popup window could not be opened.")]
	Blocked,
	/// Host-specific failure while opening or watching a window.
	#[error("Popup host failed: {message}.")]
	Host {
		/// Host-supplied description.
		message: String,
	},
}

/// Reasons a handshake settles with a rejection.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum HandshakeRejected {
	/// The user closed the popup before any result was delivered.
	#[error("closed")]
	Closed,
	/// The remote platform reported an error through the callback.
	#[error("Authorization was rejected: {error}.")]
	Remote {
		/// Error value exactly as delivered.
		error: Value,
	},
}
impl HandshakeRejected {
	/// Short reason label (`closed` or `remote`).
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::Closed => "closed",
			Self::Remote { .. } => "remote",
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn config_errors_name_the_key() {
		let err: Error = ConfigError::MissingKey { key: "clientId" }.into();

		assert!(matches!(err, Error::Config(ConfigError::MissingKey { key: "clientId" })));
		assert_eq!(err.to_string(), "Missing parameter \"clientId\" from config.");

		let err = ConfigError::UnknownKey { key: "foo".into() };

		assert_eq!(err.to_string(), "Unknown config parameter \"foo\".");
	}

	#[test]
	fn closed_rejection_renders_as_closed() {
		let rejection = HandshakeRejected::Closed;

		assert_eq!(rejection.to_string(), "closed");
		assert_eq!(rejection.as_str(), "closed");

		let remote = HandshakeRejected::Remote { error: Value::from("access_denied") };

		assert_eq!(remote.as_str(), "remote");
		assert!(remote.to_string().contains("access_denied"));
	}
}
