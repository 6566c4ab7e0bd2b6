//! State of one authorization attempt.

// self
use crate::{
	_prelude::*,
	auth::TargetId,
	handshake::{AuthorizationResult, Deferred, PendingAuthorization, deferred::Wakeup},
	popup::{PopupWindow, WatchGuard},
};

/// One authorization attempt: the target under authorization, its popup, and its pending result.
///
/// The session is the exclusive owner of the popup. Whether it is still pending is read from the
/// result latch itself, so there is no separate flag to drift out of sync.
pub struct IntegrationSession {
	target: TargetId,
	generation: u64,
	deferred: Deferred,
	popup: Option<Rc<dyn PopupWindow>>,
	watch: Option<WatchGuard>,
}
impl IntegrationSession {
	pub(crate) fn open(target: TargetId, generation: u64, popup: Box<dyn PopupWindow>) -> Self {
		Self {
			target,
			generation,
			deferred: Deferred::new(),
			popup: Some(popup.into()),
			watch: None,
		}
	}

	/// Target identifier this session authorizes.
	pub fn target(&self) -> TargetId {
		self.target
	}

	/// Whether the pending result has not settled yet.
	pub fn is_pending(&self) -> bool {
		self.deferred.is_pending()
	}

	/// Settled outcome, if any.
	pub fn outcome(&self) -> Option<AuthorizationResult> {
		self.deferred.outcome()
	}

	pub(crate) fn generation(&self) -> u64 {
		self.generation
	}

	pub(crate) fn pending(&self) -> PendingAuthorization {
		self.deferred.handle(self.target)
	}

	pub(crate) fn popup(&self) -> Option<Rc<dyn PopupWindow>> {
		self.popup.clone()
	}

	/// Keeps the watch alive for as long as the session is pending.
	///
	/// Hands the guard back when the session already settled so the caller can release it.
	pub(crate) fn attach_watch(&mut self, guard: WatchGuard) -> Option<WatchGuard> {
		if self.is_pending() {
			self.watch = Some(guard);

			None
		} else {
			Some(guard)
		}
	}

	/// Settles the pending result; the first call wins.
	///
	/// On success the returned [`Teardown`] must be run once the caller stops borrowing the
	/// session: it wakes waiting tasks, closes the popup, and stops the watch.
	pub(crate) fn settle(&mut self, outcome: AuthorizationResult) -> Option<Teardown> {
		let wakeup = self.deferred.settle(outcome)?;

		Some(Teardown { wakeup, popup: self.popup.take(), watch: self.watch.take() })
	}
}
impl Debug for IntegrationSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IntegrationSession")
			.field("target", &self.target)
			.field("generation", &self.generation)
			.field("pending", &self.is_pending())
			.field("popup_held", &self.popup.is_some())
			.finish()
	}
}

/// Side effects of a settlement, run outside any coordinator borrow.
#[must_use]
pub(crate) struct Teardown {
	wakeup: Wakeup,
	popup: Option<Rc<dyn PopupWindow>>,
	watch: Option<WatchGuard>,
}
impl Teardown {
	pub(crate) fn run(self) {
		let Teardown { wakeup, popup, watch } = self;

		wakeup.wake();

		if let Some(popup) = popup.filter(|popup| !popup.is_closed()) {
			popup.close();
		}

		drop(watch);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::HandshakeRejected, popup::MemoryWindow};

	fn session() -> (IntegrationSession, MemoryWindow) {
		let window = MemoryWindow::detached();
		let target = TargetId::new(99).expect("Target fixture should be valid.");

		(IntegrationSession::open(target, 1, Box::new(window.clone())), window)
	}

	#[test]
	fn settling_closes_the_popup_once() {
		let (mut session, window) = session();

		assert!(session.is_pending());

		session.settle(Err(HandshakeRejected::Closed)).expect("First settlement wins.").run();

		assert!(!session.is_pending());
		assert!(window.is_closed());
		assert_eq!(window.close_calls(), 1);
		assert!(session.settle(Err(HandshakeRejected::Closed)).is_none());
		assert_eq!(session.outcome(), Some(Err(HandshakeRejected::Closed)));
	}

	#[test]
	fn popup_already_closed_by_the_user_is_left_alone() {
		let (mut session, window) = session();

		window.close_by_user();
		session.settle(Err(HandshakeRejected::Closed)).expect("First settlement wins.").run();

		assert_eq!(window.close_calls(), 0);
	}

	#[test]
	fn watch_guard_is_returned_after_settlement() {
		let (mut session, _window) = session();

		assert!(session.attach_watch(WatchGuard::noop()).is_none());

		session.settle(Err(HandshakeRejected::Closed)).expect("First settlement wins.").run();

		assert!(session.attach_watch(WatchGuard::noop()).is_some());
	}
}
