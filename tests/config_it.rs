// std
use std::rc::Rc;
// crates.io
use serde_json::{Map, Value, json};
// self
use oauth2_popup::{
	auth::TargetId,
	config::{CONFIG_VALIDATORS, PopupConfig},
	error::{ConfigError, Error},
	handshake::Coordinator,
	popup::MemoryHost,
};

fn required() -> Map<String, Value> {
	let Value::Object(options) = json!({
		"clientId": "cc7ef1d9-d6a5-48c5-bfe8-c3f74f20633b",
		"scope": ["offline"],
		"redirectUri": "https://app.example.com/oauth/callback",
	}) else {
		unreachable!("Fixture literal is an object.");
	};

	options
}

#[test]
fn each_missing_required_key_is_named() {
	for key in ["clientId", "scope", "redirectUri"] {
		let mut options = required();

		options.remove(key);

		let err = Coordinator::from_options(options, Rc::new(MemoryHost::default()))
			.expect_err("Construction without a required key must fail.");

		assert!(
			matches!(
				&err,
				Error::Config(ConfigError::MissingKey { key: missing }) if *missing == key
			),
			"Unexpected error for {key}: {err:?}."
		);
		assert_eq!(err.to_string(), format!("Missing parameter \"{key}\" from config."));
	}
}

#[test]
fn unrecognized_keys_are_named() {
	let mut options = required();

	options.insert("popupDepth".into(), json!(3));

	let err = Coordinator::from_options(options, Rc::new(MemoryHost::default()))
		.expect_err("Construction with an unknown key must fail.");

	assert!(matches!(&err, Error::Config(ConfigError::UnknownKey { key }) if key == "popupDepth"));
}

#[test]
fn every_recognized_key_can_be_overridden() {
	let config = PopupConfig::from_json(
		r#"{
			"authorizationUri": "https://auth.example.com/authorize?env=qa",
			"clientId": "cc7ef1d9-d6a5-48c5-bfe8-c3f74f20633b",
			"scope": ["blog-rw", "keyword-rw"],
			"redirectUri": "https://app.example.com/cb",
			"windowTitle": "Connect",
			"popupWidth": 800,
			"popupHeight": 640,
			"cancelWatch": "poll",
			"cancelCheckIntervalMs": 250
		}"#,
	)
	.expect("A fully specified configuration should build.");

	assert_eq!(CONFIG_VALIDATORS.len(), 9);
	assert_eq!(config.window_title, "Connect");
	assert_eq!(config.popup_width, 800.);

	let url = oauth2_popup::authorize::build_authorization_url(
		&config,
		TargetId::new(62_515).expect("Target fixture should be valid."),
	);

	assert_eq!(
		url.as_str(),
		"https://auth.example.com/authorize?env=qa&client_id=cc7ef1d9-d6a5-48c5-bfe8-c3f74f20633b\
		 &portalId=62515&scope=blog-rw+keyword-rw&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb"
	);
}
