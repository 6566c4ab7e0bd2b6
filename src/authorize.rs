//! Authorization URL construction.
//!
//! Query components are percent-encoded against the RFC 3986 unreserved set, which escapes the
//! `! ' ( ) *` characters that lenient URI encoders leave alone. Scopes are joined with `+`.

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TargetId},
	config::PopupConfig,
};

/// Everything except RFC 3986 unreserved characters.
const STRICT_COMPONENT: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Builds `<authorizationUri>?client_id=..&portalId=..&scope=..&redirect_uri=..` for `target`.
///
/// Any query already present on the configured endpoint is kept in front of the generated pairs.
pub fn build_authorization_url(config: &PopupConfig, target: TargetId) -> Url {
	let mut url = config.authorization_uri.clone();
	let generated = [
		("client_id", encode_component(&config.client_id.to_string())),
		("portalId", encode_component(&target.to_string())),
		("scope", encode_scope(&config.scope)),
		("redirect_uri", encode_component(config.redirect_uri.as_str())),
	]
	.into_iter()
	.map(|(key, value)| format!("{key}={value}"))
	.collect::<Vec<_>>()
	.join("&");
	let query = match url.query() {
		Some(existing) if !existing.is_empty() => format!("{existing}&{generated}"),
		_ => generated,
	};

	url.set_query(Some(&query));

	url
}

/// Percent-encodes a single query component.
pub fn encode_component(raw: &str) -> String {
	utf8_percent_encode(raw, STRICT_COMPONENT).to_string()
}

fn encode_scope(scope: &ScopeSet) -> String {
	scope.iter().map(|scope| encode_component(scope.as_str())).collect::<Vec<_>>().join("+")
}
