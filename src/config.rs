//! Popup client configuration: immutable defaults, the per-key validator table, and typed decoding.
//!
//! Configuration arrives as a flat map of option name to JSON value. Defaults are merged first,
//! then the whole map is validated against [`CONFIG_VALIDATORS`]: unknown keys are rejected before
//! anything else, then every recognized key must be present and satisfy its predicate. Only a map
//! that passes every check is decoded into [`PopupConfig`].

// std
use std::{sync::LazyLock, time::Duration};
// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet},
	error::ConfigError,
	popup::CancelWatch,
};

/// Default authorization endpoint.
pub const DEFAULT_AUTHORIZATION_URI: &str = "https://app.hubspot.com/auth/authenticate";
/// Default popup window title.
pub const DEFAULT_WINDOW_TITLE: &str = "Integrate with HubSpot";
/// Default popup width in CSS pixels.
pub const DEFAULT_POPUP_WIDTH: f64 = 600.;
/// Default popup height in CSS pixels.
pub const DEFAULT_POPUP_HEIGHT: f64 = 400.;
/// Default cancellation watch mode.
pub const DEFAULT_CANCEL_WATCH: &str = "poll";
/// Default poll interval for the cancellation watch, in milliseconds.
pub const DEFAULT_CANCEL_CHECK_INTERVAL_MS: u32 = 100;

/// Predicate applied to a single configuration value.
pub type Validator = fn(&Value) -> bool;

/// Recognized configuration keys and their predicates, in validation order.
pub static CONFIG_VALIDATORS: &[(&str, Validator)] = &[
	("authorizationUri", is_http_url),
	("clientId", is_client_id),
	("scope", is_scope_list),
	("redirectUri", is_http_url),
	("windowTitle", Value::is_string),
	("popupWidth", is_positive_number),
	("popupHeight", is_positive_number),
	("cancelWatch", is_cancel_watch),
	("cancelCheckIntervalMs", is_positive_interval),
];

/// Default option values merged underneath caller-supplied options.
pub static DEFAULT_OPTIONS: LazyLock<Map<String, Value>> = LazyLock::new(|| {
	let mut defaults = Map::new();

	defaults.insert("authorizationUri".into(), Value::from(DEFAULT_AUTHORIZATION_URI));
	defaults.insert("windowTitle".into(), Value::from(DEFAULT_WINDOW_TITLE));
	defaults.insert("popupWidth".into(), Value::from(DEFAULT_POPUP_WIDTH));
	defaults.insert("popupHeight".into(), Value::from(DEFAULT_POPUP_HEIGHT));
	defaults.insert("cancelWatch".into(), Value::from(DEFAULT_CANCEL_WATCH));
	defaults.insert("cancelCheckIntervalMs".into(), Value::from(DEFAULT_CANCEL_CHECK_INTERVAL_MS));

	defaults
});

/// Validated popup client configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct PopupConfig {
	/// Authorization endpoint the popup is pointed at.
	pub authorization_uri: Url,
	/// OAuth client identifier of the integrating application.
	pub client_id: ClientId,
	/// Scopes requested from the user.
	pub scope: ScopeSet,
	/// Where the remote platform redirects after consent.
	pub redirect_uri: Url,
	/// Title (window name) used when opening the popup.
	pub window_title: String,
	/// Popup width in CSS pixels.
	pub popup_width: f64,
	/// Popup height in CSS pixels.
	pub popup_height: f64,
	/// How the coordinator notices that the user closed the popup.
	pub cancel_watch: CancelWatch,
}
impl PopupConfig {
	/// Merges defaults underneath `options`, validates the result, and decodes it.
	pub fn from_options(options: Map<String, Value>) -> Result<Self, ConfigError> {
		let mut merged = DEFAULT_OPTIONS.clone();

		merged.extend(options);
		validate(&merged)?;

		let raw: RawConfig = serde_path_to_error::deserialize(Value::Object(merged))
			.map_err(|source| ConfigError::Decode { source })?;

		Ok(raw.into())
	}

	/// Parses a JSON object and hands it to [`PopupConfig::from_options`].
	pub fn from_json(text: &str) -> Result<Self, ConfigError> {
		let options: Map<String, Value> =
			serde_json::from_str(text).map_err(|source| ConfigError::InvalidJson { source })?;

		Self::from_options(options)
	}
}
impl TryFrom<Map<String, Value>> for PopupConfig {
	type Error = ConfigError;

	fn try_from(value: Map<String, Value>) -> Result<Self, Self::Error> {
		Self::from_options(value)
	}
}
impl FromStr for PopupConfig {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_json(s)
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConfig {
	authorization_uri: Url,
	client_id: ClientId,
	scope: ScopeSet,
	redirect_uri: Url,
	window_title: String,
	popup_width: f64,
	popup_height: f64,
	cancel_watch: CancelWatchMode,
	cancel_check_interval_ms: u32,
}
impl From<RawConfig> for PopupConfig {
	fn from(raw: RawConfig) -> Self {
		let cancel_watch = match raw.cancel_watch {
			CancelWatchMode::Poll => CancelWatch::Poll {
				interval: Duration::from_millis(raw.cancel_check_interval_ms.into()),
			},
			CancelWatchMode::Unload => CancelWatch::Unload,
		};

		Self {
			authorization_uri: raw.authorization_uri,
			client_id: raw.client_id,
			scope: raw.scope,
			redirect_uri: raw.redirect_uri,
			window_title: raw.window_title,
			popup_width: raw.popup_width,
			popup_height: raw.popup_height,
			cancel_watch,
		}
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum CancelWatchMode {
	Poll,
	Unload,
}

/// Validates a fully merged option map against [`CONFIG_VALIDATORS`].
pub fn validate(options: &Map<String, Value>) -> Result<(), ConfigError> {
	if let Some(key) = options.keys().find(|key| validator(key).is_none()) {
		return Err(ConfigError::UnknownKey { key: key.clone() });
	}

	for &(key, predicate) in CONFIG_VALIDATORS {
		let value = options.get(key).ok_or(ConfigError::MissingKey { key })?;

		if !predicate(value) {
			return Err(ConfigError::InvalidValue { key, value: render(value) });
		}
	}

	Ok(())
}

fn validator(key: &str) -> Option<Validator> {
	CONFIG_VALIDATORS.iter().find(|(name, _)| *name == key).map(|&(_, predicate)| predicate)
}

// Strings render bare and arrays render comma-joined so messages quote what the caller typed.
fn render(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(","),
		other => other.to_string(),
	}
}

fn is_http_url(value: &Value) -> bool {
	value
		.as_str()
		.and_then(|text| Url::parse(text).ok())
		.is_some_and(|url| matches!(url.scheme(), "http" | "https"))
}

fn is_client_id(value: &Value) -> bool {
	value.as_str().is_some_and(|text| ClientId::new(text).is_ok())
}

fn is_scope_list(value: &Value) -> bool {
	let Some(items) = value.as_array() else {
		return false;
	};
	let Some(names) = items.iter().map(Value::as_str).collect::<Option<Vec<_>>>() else {
		return false;
	};

	ScopeSet::new(names).is_ok()
}

fn is_positive_number(value: &Value) -> bool {
	value.as_f64().is_some_and(|number| number.is_finite() && number > 0.)
}

fn is_cancel_watch(value: &Value) -> bool {
	matches!(value.as_str(), Some("poll" | "unload"))
}

fn is_positive_interval(value: &Value) -> bool {
	value.as_u64().is_some_and(|ms| ms > 0 && u32::try_from(ms).is_ok())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn valid_options() -> Map<String, Value> {
		let Value::Object(options) = serde_json::json!({
			"clientId": "cc7ef1d9-d6a5-48c5-bfe8-c3f74f20633b",
			"scope": ["contacts-rw", "events-rw"],
			"redirectUri": "https://app.example.com/oauth/callback",
		}) else {
			unreachable!("Fixture literal is an object.");
		};

		options
	}

	fn with(key: &str, value: Value) -> Map<String, Value> {
		let mut options = valid_options();

		options.insert(key.into(), value);

		options
	}

	fn without(key: &str) -> Map<String, Value> {
		let mut options = valid_options();

		options.remove(key);

		options
	}

	#[test]
	fn valid_options_merge_defaults() {
		let config =
			PopupConfig::from_options(valid_options()).expect("Valid fixture should build.");

		assert_eq!(config.authorization_uri.as_str(), DEFAULT_AUTHORIZATION_URI);
		assert_eq!(config.window_title, DEFAULT_WINDOW_TITLE);
		assert_eq!(config.popup_width, DEFAULT_POPUP_WIDTH);
		assert_eq!(config.popup_height, DEFAULT_POPUP_HEIGHT);
		assert_eq!(config.cancel_watch, CancelWatch::Poll { interval: Duration::from_millis(100) });
		assert_eq!(config.scope.normalized(), "contacts-rw events-rw");
	}

	#[test]
	fn every_required_key_is_reported_when_missing() {
		for key in ["clientId", "scope", "redirectUri"] {
			let err = PopupConfig::from_options(without(key))
				.expect_err("Missing required keys must be rejected.");

			assert!(
				matches!(err, ConfigError::MissingKey { key: missing } if missing == key),
				"Unexpected error for {key}: {err:?}."
			);
		}
	}

	#[test]
	fn unknown_keys_are_rejected_before_validation() {
		let mut options = without("clientId");

		options.insert("applicationId".into(), Value::from(123_456));

		let err = PopupConfig::from_options(options).expect_err("Unknown keys must be rejected.");

		assert!(matches!(err, ConfigError::UnknownKey { ref key } if key == "applicationId"));
		assert_eq!(err.to_string(), "Unknown config parameter \"applicationId\".");
	}

	#[test]
	fn invalid_values_quote_the_rejected_input() {
		let cases = [
			("clientId", Value::from("123-456"), "123-456"),
			("clientId", Value::from(123_456), "123456"),
			("scope", Value::from("123456"), "123456"),
			("scope", serde_json::json!(["123456"]), "123456"),
			("scope", serde_json::json!([]), ""),
			("popupWidth", Value::from("123456"), "123456"),
			("popupHeight", Value::from(-1), "-1"),
			("windowTitle", Value::from(123_456), "123456"),
			("cancelWatch", Value::from("sometimes"), "sometimes"),
			("cancelCheckIntervalMs", Value::from(0), "0"),
			("redirectUri", Value::from("not a url"), "not a url"),
		];

		for (key, value, rendered) in cases {
			let err = PopupConfig::from_options(with(key, value))
				.expect_err("Invalid values must be rejected.");

			assert_eq!(
				err.to_string(),
				format!("Parameter \"{key}\" in config is invalid: \"{rendered}\".")
			);
		}
	}

	#[test]
	fn unload_mode_ignores_the_interval() {
		let config = PopupConfig::from_options(with("cancelWatch", Value::from("unload")))
			.expect("Unload mode should be accepted.");

		assert_eq!(config.cancel_watch, CancelWatch::Unload);
	}

	#[test]
	fn json_text_is_accepted() {
		let config = PopupConfig::from_json(
			r#"{
				"clientId": "cc7ef1d9-d6a5-48c5-bfe8-c3f74f20633b",
				"scope": ["offline"],
				"redirectUri": "https://app.example.com/cb",
				"popupWidth": 800,
				"cancelCheckIntervalMs": 250
			}"#,
		)
		.expect("JSON configuration should parse.");

		assert_eq!(config.popup_width, 800.);
		assert_eq!(config.cancel_watch, CancelWatch::Poll { interval: Duration::from_millis(250) });
		assert!(matches!(
			PopupConfig::from_json("[1, 2]"),
			Err(ConfigError::InvalidJson { .. })
		));
	}
}
