//! Browser backend: `window.open` popups, timer/unload watches, the `message` listener, and the
//! `PopupOAuthClient` JavaScript binding.

// std
use std::time::Duration;
// crates.io
use gloo_timers::callback::{Interval, Timeout};
use wasm_bindgen::{JsCast, prelude::*};
use web_sys::{Event, EventTarget, MessageEvent, Window};
// self
use crate::{
	_prelude::*,
	auth::TargetId,
	error::{HandshakeRejected, PopupError},
	handshake::{Coordinator, HandshakeState},
	obs::{HandshakeSpan, HandshakeStage},
	popup::{
		CancelWatch, CloseSignal, PopupHost, PopupWindow, ScreenGeometry, ScreenReadings,
		UNLOAD_FALLBACK_INTERVAL, WatchGuard, WatchStatus, WindowFeatures,
	},
};

/// [`PopupHost`] backed by the page's `window`.
#[derive(Clone, Debug)]
pub struct BrowserHost {
	window: Window,
}
impl BrowserHost {
	/// Host for the current global `window`.
	pub fn new() -> Result<Self, PopupError> {
		let window = web_sys::window().ok_or(PopupError::Blocked)?;

		Ok(Self { window })
	}

	/// Host for an explicit `window`.
	pub fn from_window(window: Window) -> Self {
		Self { window }
	}
}
impl PopupHost for BrowserHost {
	fn screen(&self) -> ScreenGeometry {
		let window: &JsValue = self.window.as_ref();
		let screen = self.window.screen().ok();
		let screen_value: Option<&JsValue> = screen.as_ref().map(AsRef::as_ref);
		let element = self.window.document().and_then(|document| document.document_element());

		ScreenReadings {
			window_offset: (number_prop(window, "screenLeft"), number_prop(window, "screenTop")),
			screen_offset: (
				screen_value.and_then(|screen| number_prop(screen, "left")),
				screen_value.and_then(|screen| number_prop(screen, "top")),
			),
			viewport: (number_prop(window, "innerWidth"), number_prop(window, "innerHeight")),
			document: (
				element.as_ref().map(|element| f64::from(element.client_width())),
				element.as_ref().map(|element| f64::from(element.client_height())),
			),
			screen: (
				screen.as_ref().and_then(|screen| screen.width().ok()).map(f64::from),
				screen.as_ref().and_then(|screen| screen.height().ok()).map(f64::from),
			),
		}
		.resolve()
	}

	fn open(
		&self,
		url: &Url,
		name: &str,
		features: &WindowFeatures,
	) -> Result<Box<dyn PopupWindow>, PopupError> {
		match self.window.open_with_url_and_target_and_features(
			url.as_str(),
			name,
			&features.to_string(),
		) {
			Ok(Some(popup)) => Ok(Box::new(BrowserPopup(popup))),
			Ok(None) => Err(PopupError::Blocked),
			Err(err) => {
				log_js_error("window.open", &err);

				Err(PopupError::Blocked)
			},
		}
	}
}

/// Popup opened by [`BrowserHost`].
#[derive(Debug)]
pub struct BrowserPopup(Window);
impl BrowserPopup {
	fn watch_interval(&self, interval: Duration, signal: CloseSignal) -> WatchGuard {
		let timer = Interval::new(millis(interval), move || {
			signal.poll();
		});

		// The guard may be dropped from inside the timer callback when a tick settles the session.
		WatchGuard::new(move || wasm_bindgen_futures::spawn_local(async move { drop(timer) }))
	}

	fn watch_unload(&self, signal: CloseSignal) -> Result<WatchGuard, PopupError> {
		let fallback = Rc::new(RefCell::new(None::<Interval>));
		let slot = Rc::downgrade(&fallback);
		// The closed flag flips after `unload` fires; check on the next turn of the event loop.
		let callback = Closure::wrap(Box::new(move |_: Event| {
			let signal = signal.clone();
			let slot = slot.clone();

			Timeout::new(0, move || {
				if signal.poll() != WatchStatus::Watching {
					return;
				}

				// Still open: the popup navigated and the new document (possibly cross-origin) has
				// no listener of ours.
				let Some(slot) = slot.upgrade() else {
					return;
				};
				let mut slot = slot.borrow_mut();

				if slot.is_none() {
					*slot = Some(Interval::new(millis(UNLOAD_FALLBACK_INTERVAL), move || {
						signal.poll();
					}));
				}
			})
			.forget();
		}) as Box<dyn FnMut(Event)>);
		let listener = ListenerHandle::attach(self.0.clone().into(), "unload", callback)?;

		Ok(WatchGuard::new(move || {
			wasm_bindgen_futures::spawn_local(async move {
				drop(listener);
				drop(fallback.take());
			})
		}))
	}
}
impl PopupWindow for BrowserPopup {
	fn is_closed(&self) -> bool {
		self.0.closed().unwrap_or(true)
	}

	fn close(&self) {
		if let Err(err) = self.0.close() {
			log_js_error("window.close", &err);
		}
	}

	fn focus(&self) {
		if let Err(err) = self.0.focus() {
			log_js_error("window.focus", &err);
		}
	}

	fn watch(&self, mode: CancelWatch, signal: CloseSignal) -> Result<WatchGuard, PopupError> {
		match mode {
			CancelWatch::Poll { interval } => Ok(self.watch_interval(interval, signal)),
			CancelWatch::Unload => self.watch_unload(signal),
		}
	}
}

/// Registration of the opener-side `message` listener; removed on drop.
pub struct MessageListener(ListenerHandle);
impl Debug for MessageListener {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("MessageListener(..)")
	}
}

/// Forwards `message` events posted to `window` into [`Coordinator::deliver_value`].
///
/// Only messages whose origin matches the configured redirect URI are considered.
pub fn listen_messages(
	window: &Window,
	coordinator: Coordinator,
) -> Result<MessageListener, PopupError> {
	let origin = coordinator.config().redirect_uri.origin().ascii_serialization();
	let callback = Closure::wrap(Box::new(move |event: Event| {
		let Ok(event) = event.dyn_into::<MessageEvent>() else {
			return;
		};

		if event.origin() != origin {
			return;
		}

		let payload = match serde_wasm_bindgen::from_value::<Value>(event.data()) {
			Ok(payload) => payload,
			Err(err) => {
				log_js_error("message", &err.into());

				return;
			},
		};

		if let Err(err) = coordinator.deliver_value(payload) {
			log_js_error("message", &JsValue::from_str(&err.to_string()));
		}
	}) as Box<dyn FnMut(Event)>);

	Ok(MessageListener(ListenerHandle::attach(window.clone().into(), "message", callback)?))
}

/// JavaScript-facing popup OAuth client.
#[wasm_bindgen]
pub struct PopupOAuthClient {
	coordinator: Coordinator,
	_messages: Option<MessageListener>,
}
#[wasm_bindgen]
impl PopupOAuthClient {
	/// Validates `config` and listens for callback messages on the current window.
	#[wasm_bindgen(constructor)]
	pub fn new(config: JsValue) -> Result<PopupOAuthClient, JsValue> {
		let options = match serde_wasm_bindgen::from_value::<Value>(config)? {
			Value::Object(options) => options,
			other => return Err(js_error(&format!("Configuration is not an object: {other}."))),
		};
		let host = BrowserHost::new().map_err(|err| js_error(&err.to_string()))?;
		let window = host.window.clone();
		let coordinator = Coordinator::from_options(options, Rc::new(host))
			.map_err(|err| js_error(&err.to_string()))?;
		let messages = match listen_messages(&window, coordinator.clone()) {
			Ok(listener) => Some(listener),
			Err(err) => {
				log_js_error("addEventListener", &JsValue::from_str(&err.to_string()));

				None
			},
		};

		Ok(Self { coordinator, _messages: messages })
	}

	/// Opens the popup for `target_id` and returns a promise for its outcome.
	///
	/// Throws synchronously on a missing/invalid id, a conflicting pending integration, or a
	/// blocked popup.
	#[wasm_bindgen(js_name = "initiateIntegration")]
	pub fn initiate_integration(&self, target_id: JsValue) -> Result<js_sys::Promise, JsValue> {
		let target = if target_id.is_undefined() || target_id.is_null() {
			None
		} else {
			Some(serde_wasm_bindgen::from_value::<Value>(target_id)?)
		};
		let pending = self
			.coordinator
			.initiate_value(target.as_ref())
			.map_err(|err| js_error(&err.to_string()))?;

		let span = HandshakeSpan::new(HandshakeStage::Initiate, Some(pending.target()));

		Ok(wasm_bindgen_futures::future_to_promise(span.instrument(async move {
			match pending.await {
				Ok(payload) => to_js(&payload),
				Err(rejection) => Err(rejection_to_js(rejection)),
			}
		})))
	}

	/// Delivers callback parameters (as passed by the page loaded in the popup).
	#[wasm_bindgen(js_name = "oAuthCallback")]
	pub fn o_auth_callback(&self, params: JsValue) -> Result<(), JsValue> {
		let payload = serde_wasm_bindgen::from_value::<Value>(params)?;

		self.coordinator.deliver_value(payload).map(drop).map_err(|err| js_error(&err.to_string()))
	}

	/// Whether an integration is waiting for its result.
	#[wasm_bindgen(js_name = "isPending")]
	pub fn is_pending(&self) -> bool {
		self.coordinator.is_pending()
	}

	/// Target identifier of the pending integration, if any.
	#[wasm_bindgen(js_name = "pendingTargetId")]
	pub fn pending_target_id(&self) -> Option<f64> {
		match self.coordinator.state() {
			HandshakeState::Pending { target } => Some(target.get() as f64),
			_ => None,
		}
	}

	/// Authorization URL for `target_id`, without opening anything.
	#[wasm_bindgen(js_name = "authorizationUrl")]
	pub fn authorization_url(&self, target_id: JsValue) -> Result<String, JsValue> {
		let target = TargetId::from_value(&serde_wasm_bindgen::from_value::<Value>(target_id)?)
			.map_err(|err| js_error(&err.to_string()))?;

		Ok(self.coordinator.authorization_url(target).into())
	}
}

struct ListenerHandle {
	target: EventTarget,
	event: &'static str,
	callback: Closure<dyn FnMut(Event)>,
}
impl ListenerHandle {
	fn attach(
		target: EventTarget,
		event: &'static str,
		callback: Closure<dyn FnMut(Event)>,
	) -> Result<Self, PopupError> {
		target
			.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
			.map_err(|err| PopupError::Host { message: stringify_js_error(&err) })?;

		Ok(Self { target, event, callback })
	}
}
impl Drop for ListenerHandle {
	fn drop(&mut self) {
		if let Err(err) = self
			.target
			.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref())
		{
			log_js_error("removeEventListener", &err);
		}
	}
}

fn number_prop(target: &JsValue, key: &str) -> Option<f64> {
	js_sys::Reflect::get(target, &JsValue::from_str(key)).ok().and_then(|value| value.as_f64())
}

fn millis(interval: Duration) -> u32 {
	u32::try_from(interval.as_millis()).unwrap_or(u32::MAX)
}

// `closed` for a dismissed popup, the callback's error value otherwise.
fn rejection_to_js(rejection: HandshakeRejected) -> JsValue {
	match rejection {
		HandshakeRejected::Closed => JsValue::from_str(HandshakeRejected::Closed.as_str()),
		HandshakeRejected::Remote { error } => to_js(&error).unwrap_or_else(|err| err),
	}
}

fn to_js<T>(value: &T) -> Result<JsValue, JsValue>
where
	T: ?Sized + Serialize,
{
	value
		.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
		.map_err(JsValue::from)
}

fn js_error(message: &str) -> JsValue {
	js_sys::Error::new(message).into()
}

fn stringify_js_error(err: &JsValue) -> String {
	if let Some(text) = err.as_string() {
		return text;
	}
	if let Some(text) = js_sys::JSON::stringify(err).ok().and_then(|value| value.as_string()) {
		return text;
	}

	format!("{err:?}")
}

fn log_js_error(context: &str, err: &JsValue) {
	web_sys::console::error_2(&JsValue::from_str(context), err);
}
