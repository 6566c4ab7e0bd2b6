//! Client-facing entry point that drives popup handshakes.

// self
use crate::{
	_prelude::*,
	auth::TargetId,
	authorize,
	config::PopupConfig,
	error::HandshakeRejected,
	handshake::{
		AuthorizationResult, Delivery, HandshakeMetrics, IntegrationSession, PendingAuthorization,
	},
	obs::{self, HandshakeOutcome, HandshakeSpan, HandshakeStage},
	popup::{PopupHost, PopupWindow, WindowFeatures},
};

/// Externally visible handshake state.
#[derive(Clone, Debug, PartialEq)]
pub enum HandshakeState {
	/// No integration was started yet.
	Idle,
	/// A popup is open and its result has not settled.
	Pending {
		/// Target under authorization.
		target: TargetId,
	},
	/// The last integration settled; a new one may be started.
	Settled {
		/// Target of the last integration.
		target: TargetId,
		/// How it settled.
		outcome: AuthorizationResult,
	},
}

/// What a settlement attempt did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settlement {
	/// The pending result was settled by this call.
	Applied,
	/// The result had already settled; nothing changed.
	AlreadySettled,
}

/// What a watch tick concluded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchStatus {
	/// The session is still pending; keep watching.
	Watching,
	/// The session settled or was replaced; the watch can stop.
	Finished,
}
impl WatchStatus {
	/// Returns true once watching is no longer useful.
	pub fn is_finished(self) -> bool {
		matches!(self, WatchStatus::Finished)
	}
}

/// Coordinates popup handshakes for one integrating application.
///
/// The coordinator validates its configuration up front, tracks at most one
/// [`IntegrationSession`], and settles it exactly once from either a [`Delivery`] or the
/// cancellation watch. It is meant for a single-threaded event loop: clones share the same
/// state, and host callbacks may safely re-enter it because host calls are never made while
/// that state is borrowed.
#[derive(Clone)]
pub struct Coordinator {
	config: Arc<PopupConfig>,
	host: Rc<dyn PopupHost>,
	shared: Rc<Shared>,
}
impl Coordinator {
	/// Creates a coordinator from an already validated configuration.
	pub fn new(config: PopupConfig, host: Rc<dyn PopupHost>) -> Self {
		Self { config: Arc::new(config), host, shared: Default::default() }
	}

	/// Validates `options` (see [`PopupConfig::from_options`]) and creates a coordinator.
	pub fn from_options(options: Map<String, Value>, host: Rc<dyn PopupHost>) -> Result<Self> {
		Ok(Self::new(PopupConfig::from_options(options)?, host))
	}

	/// Validated configuration.
	pub fn config(&self) -> &PopupConfig {
		&self.config
	}

	/// Shared counters for handshake attempts and outcomes.
	pub fn metrics(&self) -> Arc<HandshakeMetrics> {
		self.shared.metrics.clone()
	}

	/// Current handshake state.
	pub fn state(&self) -> HandshakeState {
		let slot = self.shared.slot.borrow();

		match slot.session.as_ref() {
			None => HandshakeState::Idle,
			Some(session) => match session.outcome() {
				None => HandshakeState::Pending { target: session.target() },
				Some(outcome) => HandshakeState::Settled { target: session.target(), outcome },
			},
		}
	}

	/// Whether a handshake is in flight.
	pub fn is_pending(&self) -> bool {
		self.shared.slot.borrow().session.as_ref().is_some_and(IntegrationSession::is_pending)
	}

	/// Authorization URL the popup is opened at for `target`.
	pub fn authorization_url(&self, target: TargetId) -> Url {
		authorize::build_authorization_url(&self.config, target)
	}

	/// Starts an integration from an untyped identifier.
	///
	/// `None` (or JSON `null`) fails with [`Error::MissingTargetId`]; anything that is not a
	/// positive integer, or a string holding one, fails with [`Error::InvalidTargetId`].
	pub fn initiate_value(&self, target: Option<&Value>) -> Result<PendingAuthorization> {
		let target = TargetId::from_value(target.unwrap_or(&Value::Null))?;

		self.initiate(target)
	}

	/// Opens the popup for `target` and returns its pending result.
	///
	/// Re-initiating the target that is already pending returns the existing pending result and
	/// focuses its popup instead of opening another one. Initiating a different target while one
	/// is pending fails with [`Error::SessionAlreadyPending`] and leaves the pending one untouched.
	pub fn initiate(&self, target: TargetId) -> Result<PendingAuthorization> {
		const STAGE: HandshakeStage = HandshakeStage::Initiate;

		let _span = HandshakeSpan::new(STAGE, Some(target)).entered();

		if let Some(existing) = self.pending_for(target)? {
			obs::trace_event(STAGE, "Target is already pending; reusing its pending result.");

			return Ok(existing);
		}

		let url = self.authorization_url(target);
		let features = WindowFeatures::centered(
			self.config.popup_width,
			self.config.popup_height,
			&self.host.screen(),
		);
		let popup = self.host.open(&url, &self.config.window_title, &features)?;
		let (generation, pending, popup) = {
			let mut slot = self.shared.slot.borrow_mut();

			slot.generation += 1;

			let session = IntegrationSession::open(target, slot.generation, popup);
			let opened = (slot.generation, session.pending(), session.popup());

			slot.session = Some(session);

			opened
		};
		let Some(popup) = popup else {
			return Ok(pending);
		};
		let signal = CloseSignal { shared: Rc::downgrade(&self.shared), generation };

		match popup.watch(self.config.cancel_watch, signal) {
			Ok(guard) => {
				let unused = self
					.shared
					.slot
					.borrow_mut()
					.current_mut(generation)
					.and_then(|session| session.attach_watch(guard));

				drop(unused);
				self.shared.metrics.record(HandshakeOutcome::Attempt);
				obs::record_handshake_outcome(HandshakeOutcome::Attempt);
				obs::trace_event(STAGE, "Popup opened and watched.");

				Ok(pending)
			},
			Err(err) => {
				self.shared.slot.borrow_mut().discard(generation);

				if !popup.is_closed() {
					popup.close();
				}

				Err(err.into())
			},
		}
	}

	/// Delivers the callback result for the active session.
	///
	/// Fails with [`Error::TargetMismatch`] when `delivery` names another target (the pending
	/// result is not touched) and with [`Error::NoSession`] when nothing was initiated. A
	/// delivery for a session that already settled returns [`Settlement::AlreadySettled`].
	pub fn deliver(&self, delivery: Delivery) -> Result<Settlement> {
		const STAGE: HandshakeStage = HandshakeStage::Deliver;

		let received = delivery.target_id;
		let _span = HandshakeSpan::new(STAGE, Some(received)).entered();
		let (generation, expected) = {
			let slot = self.shared.slot.borrow();

			match slot.session.as_ref() {
				Some(session) => (session.generation(), session.target()),
				None => return Err(Error::NoSession { received }),
			}
		};

		if expected != received {
			return Err(Error::TargetMismatch { expected, received });
		}

		let settlement = self.shared.settle(generation, delivery.into_outcome());

		if settlement == Settlement::AlreadySettled {
			obs::trace_event(STAGE, "Delivery arrived after settlement; ignored.");
		}

		Ok(settlement)
	}

	/// Decodes an untyped callback payload and delivers it.
	pub fn deliver_value(&self, payload: Value) -> Result<Settlement> {
		self.deliver(Delivery::from_value(payload)?)
	}

	// Err on a conflicting target, Ok(Some) when `target` is already pending.
	fn pending_for(&self, target: TargetId) -> Result<Option<PendingAuthorization>> {
		let (pending, popup) = {
			let slot = self.shared.slot.borrow();
			let Some(session) = slot.session.as_ref().filter(|session| session.is_pending()) else {
				return Ok(None);
			};

			if session.target() != target {
				return Err(Error::SessionAlreadyPending {
					pending: session.target(),
					requested: target,
				});
			}

			(session.pending(), session.popup())
		};

		if let Some(popup) = popup {
			popup.focus();
		}

		Ok(Some(pending))
	}
}
impl Debug for Coordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Coordinator")
			.field("client_id", &self.config.client_id)
			.field("authorization_uri", &self.config.authorization_uri.as_str())
			.field("state", &self.state())
			.finish()
	}
}

/// Handle given to a popup watch so it can report closure of one specific session.
///
/// Signals are bound to the session that was current when the watch started; a signal that
/// outlives its session (or the coordinator) does nothing.
#[derive(Clone)]
pub struct CloseSignal {
	shared: Weak<Shared>,
	generation: u64,
}
impl CloseSignal {
	/// Checks whether the popup is closed and, if so, rejects the pending result with
	/// [`HandshakeRejected::Closed`].
	pub fn poll(&self) -> WatchStatus {
		self.check(false)
	}

	/// Reports that the popup is definitely gone and rejects the pending result.
	pub fn closed(&self) -> WatchStatus {
		self.check(true)
	}

	fn check(&self, confirmed: bool) -> WatchStatus {
		let Some(shared) = self.shared.upgrade() else {
			return WatchStatus::Finished;
		};
		let Some(popup) = shared.pending_popup(self.generation) else {
			return WatchStatus::Finished;
		};

		if !confirmed && !popup.is_closed() {
			return WatchStatus::Watching;
		}

		let _span = HandshakeSpan::new(HandshakeStage::Watch, None).entered();

		if shared.settle(self.generation, Err(HandshakeRejected::Closed)) == Settlement::Applied {
			obs::trace_event(HandshakeStage::Watch, "Popup closed before completion.");
		}

		WatchStatus::Finished
	}
}
impl Debug for CloseSignal {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CloseSignal").field("generation", &self.generation).finish()
	}
}

#[derive(Default)]
struct Shared {
	slot: RefCell<SessionSlot>,
	metrics: Arc<HandshakeMetrics>,
}
impl Shared {
	// The only place a session settles.
	fn settle(&self, generation: u64, outcome: AuthorizationResult) -> Settlement {
		let label = HandshakeOutcome::of(&outcome);
		let teardown = {
			let mut slot = self.slot.borrow_mut();
			let Some(session) = slot.current_mut(generation) else {
				return Settlement::AlreadySettled;
			};

			match session.settle(outcome) {
				Some(teardown) => teardown,
				None => return Settlement::AlreadySettled,
			}
		};

		self.metrics.record(label);
		obs::record_handshake_outcome(label);
		teardown.run();

		Settlement::Applied
	}

	fn pending_popup(&self, generation: u64) -> Option<Rc<dyn PopupWindow>> {
		let slot = self.slot.borrow();

		slot.current(generation)
			.filter(|session| session.is_pending())
			.and_then(IntegrationSession::popup)
	}
}

#[derive(Default)]
struct SessionSlot {
	generation: u64,
	session: Option<IntegrationSession>,
}
impl SessionSlot {
	fn current(&self, generation: u64) -> Option<&IntegrationSession> {
		self.session.as_ref().filter(|session| session.generation() == generation)
	}

	fn current_mut(&mut self, generation: u64) -> Option<&mut IntegrationSession> {
		self.session.as_mut().filter(|session| session.generation() == generation)
	}

	fn discard(&mut self, generation: u64) {
		if self.current(generation).is_some() {
			self.session = None;
		}
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::time::Duration;
	// self
	use super::*;
	use crate::popup::{CancelWatch, MemoryHost};

	fn options(watch: &str) -> Map<String, Value> {
		let Value::Object(options) = serde_json::json!({
			"clientId": "cc7ef1d9-d6a5-48c5-bfe8-c3f74f20633b",
			"scope": ["contacts-rw", "events-rw"],
			"redirectUri": "https://app.example.com/oauth/callback",
			"cancelWatch": watch,
		}) else {
			unreachable!("Fixture literal is an object.");
		};

		options
	}

	fn coordinator(watch: &str) -> (Coordinator, MemoryHost) {
		let host = MemoryHost::default();
		let coordinator = Coordinator::from_options(options(watch), Rc::new(host.clone()))
			.expect("Coordinator fixture should build.");

		(coordinator, host)
	}

	fn target(value: u64) -> TargetId {
		TargetId::new(value).expect("Target fixture should be valid.")
	}

	#[test]
	fn initiate_opens_a_centered_popup_at_the_authorization_url() {
		let (coordinator, host) = coordinator("poll");
		let pending = coordinator.initiate(target(123_456)).expect("Initiate should succeed.");
		let window = host.last_window().expect("A popup should have been opened.");

		assert!(pending.is_pending());
		assert_eq!(window.url(), Some(coordinator.authorization_url(target(123_456))));
		assert_eq!(window.name(), "Integrate with HubSpot");
		assert_eq!(window.features(), Some(WindowFeatures::centered(600., 400., &host.screen())));
		assert_eq!(
			window.watch_mode(),
			Some(CancelWatch::Poll { interval: Duration::from_millis(100) })
		);
		assert_eq!(coordinator.state(), HandshakeState::Pending { target: target(123_456) });
	}

	#[test]
	fn stale_close_signals_do_not_touch_newer_sessions() {
		let (coordinator, host) = coordinator("poll");
		let first = coordinator.initiate(target(1)).expect("First initiate should succeed.");
		let stale = host.last_window().and_then(|window| window.signal()).expect("Watch signal.");

		coordinator.deliver(Delivery::success(target(1))).expect("Delivery should succeed.");

		let second = coordinator.initiate(target(2)).expect("Second initiate should succeed.");

		assert_eq!(stale.closed(), WatchStatus::Finished);
		assert!(first.try_outcome().is_some_and(|outcome| outcome.is_ok()));
		assert!(second.is_pending(), "Stale signals must not settle the new session.");
	}

	#[test]
	fn watch_failures_close_the_popup_and_leave_no_session() {
		let (coordinator, host) = coordinator("poll");

		host.fail_next_watch();

		let err = coordinator.initiate(target(5)).expect_err("Watch failures should propagate.");
		let window = host.last_window().expect("A popup should have been opened.");

		assert!(matches!(err, Error::Popup(_)));
		assert!(window.is_closed());
		assert_eq!(coordinator.state(), HandshakeState::Idle);
		assert_eq!(coordinator.metrics().attempts(), 0, "Unwatched popups are not attempts.");
	}

	#[test]
	fn dropped_coordinator_finishes_outstanding_watches() {
		let (coordinator, host) = coordinator("unload");
		let _pending = coordinator.initiate(target(5)).expect("Initiate should succeed.");
		let signal = host.last_window().and_then(|window| window.signal()).expect("Watch signal.");

		drop(coordinator);

		assert!(signal.poll().is_finished());
	}
}
