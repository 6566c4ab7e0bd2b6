//! Strongly typed identifiers for the integrating client and the account under authorization.

// std
use std::num::NonZeroU64;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError};
use uuid::Uuid;
// self
use crate::_prelude::*;

/// Largest integer a JavaScript number represents exactly (2^53 - 1).
const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;
/// Length of the hyphenated UUID rendering.
const HYPHENATED_UUID_LEN: usize = 36;

/// Remote platform account (portal/hub) identifier: a positive integer.
///
/// Values arriving from the popup or message channel may be strings; they are coerced to numbers
/// on the way in and always serialize as JSON numbers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId(NonZeroU64);
impl TargetId {
	/// Creates a target identifier, rejecting zero and values beyond the JS safe integer range.
	pub fn new(value: u64) -> Result<Self> {
		match NonZeroU64::new(value) {
			Some(id) if value <= MAX_SAFE_INTEGER => Ok(Self(id)),
			_ => Err(Error::InvalidTargetId { value: value.to_string() }),
		}
	}

	/// Coerces an untyped value into a target identifier.
	///
	/// `null` maps to [`Error::MissingTargetId`]. Numbers must be positive integers; strings must
	/// parse as one.
	pub fn from_value(value: &Value) -> Result<Self> {
		match value {
			Value::Null => Err(Error::MissingTargetId),
			Value::Number(number) => {
				if let Some(int) = number.as_u64() {
					return Self::new(int);
				}

				number
					.as_f64()
					.and_then(Self::from_integral)
					.ok_or_else(|| Error::InvalidTargetId { value: number.to_string() })
			},
			Value::String(text) => text.parse(),
			other => Err(Error::InvalidTargetId { value: other.to_string() }),
		}
	}

	/// Returns the numeric value.
	pub fn get(self) -> u64 {
		self.0.get()
	}

	// Integral floats (`12.0`, `1e3`) name the same id as their integer form.
	fn from_integral(float: f64) -> Option<Self> {
		if !float.is_finite() || float.fract() != 0. || float <= 0. {
			return None;
		}

		Self::new(float as u64).ok()
	}
}
impl Debug for TargetId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TargetId({})", self.0)
	}
}
impl Display for TargetId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0, f)
	}
}
impl FromStr for TargetId {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || Error::InvalidTargetId { value: s.to_owned() };
		let trimmed = s.trim();

		if trimmed.is_empty() {
			return Err(invalid());
		}

		match trimmed.parse::<u64>() {
			Ok(value) => Self::new(value).map_err(|_| invalid()),
			Err(_) => trimmed.parse::<f64>().ok().and_then(Self::from_integral).ok_or_else(invalid),
		}
	}
}
impl TryFrom<u64> for TargetId {
	type Error = Error;

	fn try_from(value: u64) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<TargetId> for u64 {
	fn from(value: TargetId) -> Self {
		value.get()
	}
}
impl From<TargetId> for Value {
	fn from(value: TargetId) -> Self {
		Value::from(value.get())
	}
}
impl Serialize for TargetId {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u64(self.get())
	}
}
impl<'de> Deserialize<'de> for TargetId {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = Value::deserialize(deserializer)?;

		TargetId::from_value(&raw).map_err(DeError::custom)
	}
}

/// Error returned when a client identifier is not a hyphenated UUID.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Client id must be a hyphenated UUID: {value}.")]
pub struct ClientIdError {
	/// Rejected input.
	pub value: String,
}

/// OAuth client identifier of the integrating application.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(Uuid);
impl ClientId {
	/// Parses a hyphenated UUID (`8-4-4-4-12` hex groups).
	pub fn new(value: impl AsRef<str>) -> Result<Self, ClientIdError> {
		let view = value.as_ref();
		let invalid = || ClientIdError { value: view.to_owned() };

		if view.len() != HYPHENATED_UUID_LEN {
			return Err(invalid());
		}

		Uuid::try_parse(view).map(Self).map_err(|_| invalid())
	}

	/// Underlying UUID.
	pub fn as_uuid(&self) -> &Uuid {
		&self.0
	}
}
impl Debug for ClientId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "ClientId({})", self.0.hyphenated())
	}
}
impl Display for ClientId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0.hyphenated(), f)
	}
}
impl FromStr for ClientId {
	type Err = ClientIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl TryFrom<String> for ClientId {
	type Error = ClientIdError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<ClientId> for String {
	fn from(value: ClientId) -> Self {
		value.to_string()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn target_ids_must_be_positive() {
		let id = TargetId::new(123_456).expect("Positive ids should be accepted.");

		assert_eq!(id.get(), 123_456);
		assert!(matches!(TargetId::new(0), Err(Error::InvalidTargetId { .. })));
		assert!(TargetId::new(MAX_SAFE_INTEGER + 1).is_err());
	}

	#[test]
	fn target_ids_coerce_from_json() {
		let from_string = TargetId::from_value(&Value::from("123456"))
			.expect("Numeric strings should coerce into target ids.");
		let from_number = TargetId::from_value(&serde_json::json!(123456))
			.expect("Numbers should pass through unchanged.");
		let from_float = TargetId::from_value(&serde_json::json!(42.0))
			.expect("Integral floats should be accepted.");

		assert_eq!(from_string, from_number);
		assert_eq!(from_float.get(), 42);
		assert!(matches!(TargetId::from_value(&Value::Null), Err(Error::MissingTargetId)));
		assert!(TargetId::from_value(&serde_json::json!(1.5)).is_err());
		assert!(TargetId::from_value(&serde_json::json!(true)).is_err());
	}

	#[test]
	fn numeric_strings_follow_the_number_rules() {
		for raw in ["12.0", " 12 ", "1.2e1"] {
			let id = TargetId::from_value(&Value::from(raw))
				.expect("Integral numeric strings should be accepted.");

			assert_eq!(id.get(), 12, "Unexpected id for {raw:?}.");
		}

		let id = TargetId::from_str("1e3").expect("Exponent notation should parse.");

		assert_eq!(id.get(), 1_000);

		for raw in ["12.5", "-12", "0.0", "NaN", "inf", ""] {
			assert!(
				matches!(TargetId::from_str(raw), Err(Error::InvalidTargetId { .. })),
				"{raw:?} must be rejected."
			);
		}
	}

	#[test]
	fn invalid_target_ids_echo_their_input() {
		let err = TargetId::from_value(&Value::from("not a number"))
			.expect_err("Non-numeric strings must be rejected.");

		assert_eq!(err.to_string(), "Invalid target id \"not a number\".");

		let err = TargetId::from_value(&serde_json::json!(-123456))
			.expect_err("Negative numbers must be rejected.");

		assert_eq!(err.to_string(), "Invalid target id \"-123456\".");
	}

	#[test]
	fn target_ids_serialize_as_numbers() {
		let id: TargetId =
			serde_json::from_str("\"77\"").expect("String ids should deserialize with coercion.");

		assert_eq!(serde_json::to_string(&id).expect("Target ids should serialize."), "77");
	}

	#[test]
	fn client_ids_require_hyphenated_uuids() {
		let id = ClientId::new("cc7ef1d9-d6a5-48c5-bfe8-c3f74f20633b")
			.expect("Hyphenated UUID fixture should be accepted.");

		assert_eq!(id.to_string(), "cc7ef1d9-d6a5-48c5-bfe8-c3f74f20633b");
		assert!(ClientId::new("123-456").is_err());
		assert!(ClientId::new("123456").is_err());
		assert!(ClientId::new("cc7ef1d9d6a548c5bfe8c3f74f20633b").is_err());
	}
}
