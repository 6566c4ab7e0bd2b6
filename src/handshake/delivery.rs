//! Results delivered by the callback page, and the payload handed to callers on success.

// crates.io
use serde::Deserializer;
// self
use crate::{
	_prelude::*,
	auth::TargetId,
	error::HandshakeRejected,
	handshake::AuthorizationResult,
};

/// Callback parameters sent by the page loaded inside the popup.
///
/// The target identifier is read from `targetId`, with `portalId` and `hubId` accepted as aliases;
/// string identifiers are coerced to numbers. The presence of an `error` key, whatever its value,
/// marks the delivery as a failure. Every other key is kept verbatim.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Delivery {
	/// Account the callback is about.
	#[serde(rename = "targetId", alias = "portalId", alias = "hubId")]
	pub target_id: TargetId,
	/// Error reported by the remote platform, if any.
	#[serde(default, deserialize_with = "present")]
	pub error: Option<Value>,
	/// Remaining delivered fields.
	#[serde(flatten)]
	pub fields: Map<String, Value>,
}
impl Delivery {
	/// Successful delivery for `target_id` with no extra fields.
	pub fn success(target_id: TargetId) -> Self {
		Self { target_id, error: None, fields: Map::new() }
	}

	/// Failed delivery carrying the remote `error` value.
	pub fn failure(target_id: TargetId, error: impl Into<Value>) -> Self {
		Self { target_id, error: Some(error.into()), fields: Map::new() }
	}

	/// Adds a delivered field.
	pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.fields.insert(key.into(), value.into());

		self
	}

	/// Decodes an untyped payload (callback argument or message `data`).
	pub fn from_value(value: Value) -> Result<Self> {
		serde_path_to_error::deserialize(value)
			.map_err(|source| Error::MalformedDelivery { source })
	}

	/// Converts the delivery into the value the pending authorization settles with.
	pub fn into_outcome(self) -> AuthorizationResult {
		match self.error {
			Some(error) => Err(HandshakeRejected::Remote { error }),
			None => Ok(AuthorizationPayload { target_id: self.target_id, fields: self.fields }),
		}
	}
}

/// Success value of a handshake.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuthorizationPayload {
	/// Account that was authorized, always numeric.
	#[serde(rename = "targetId")]
	pub target_id: TargetId,
	/// Any other fields delivered by the callback page.
	#[serde(flatten)]
	pub fields: Map<String, Value>,
}
impl AuthorizationPayload {
	/// Looks up a delivered field.
	pub fn field(&self, key: &str) -> Option<&Value> {
		self.fields.get(key)
	}
}

// Keeps an explicit `"error": null` distinguishable from a missing key.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
	D: Deserializer<'de>,
{
	Value::deserialize(deserializer).map(Some)
}
