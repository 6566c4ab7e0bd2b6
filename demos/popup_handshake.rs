//! Walks through one canceled and one fulfilled popup handshake against the in-memory host.

// std
use std::rc::Rc;
// crates.io
use color_eyre::Result;
use serde_json::json;
// self
use oauth2_popup::{
	auth::TargetId,
	handshake::{Coordinator, Delivery},
	popup::MemoryHost,
	serde_json::Value,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let host = MemoryHost::default();
	let Value::Object(options) = json!({
		"clientId": "cc7ef1d9-d6a5-48c5-bfe8-c3f74f20633b",
		"scope": ["offline", "contacts-rw"],
		"redirectUri": "https://app.example.com/oauth/callback",
	}) else {
		unreachable!("Demo options are an object.");
	};
	let coordinator = Coordinator::from_options(options, Rc::new(host.clone()))?;
	let target = TargetId::new(62_515)?;
	let pending = coordinator.initiate(target)?;

	println!("Opened {}.", coordinator.authorization_url(target));

	// The user closes the window; the next watch tick notices.
	if let Some(window) = host.last_window() {
		window.close_by_user();
	}

	host.tick();

	match pending.await {
		Ok(payload) => println!("Unexpectedly authorized target {}.", payload.target_id),
		Err(reason) => println!("First attempt rejected: {reason}."),
	}

	let pending = coordinator.initiate(target)?;

	// The callback page reports success, possibly with the id as a string.
	coordinator.deliver(Delivery::from_value(json!({ "portalId": "62515", "code": "demo" }))?)?;

	let payload = pending.await?;

	println!(
		"Authorized target {} with fields {}.",
		payload.target_id,
		Value::Object(payload.fields.clone())
	);
	println!(
		"Attempts: {}, fulfilled: {}, canceled: {}.",
		coordinator.metrics().attempts(),
		coordinator.metrics().fulfilled(),
		coordinator.metrics().canceled()
	);

	Ok(())
}
