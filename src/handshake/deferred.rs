//! Single-assignment latch behind [`PendingAuthorization`].

// self
use crate::{
	_prelude::*,
	auth::TargetId,
	error::HandshakeRejected,
	handshake::AuthorizationPayload,
};

/// Final value of a handshake.
pub type AuthorizationResult = Result<AuthorizationPayload, HandshakeRejected>;

#[derive(Debug)]
enum LatchState {
	Unsettled { wakers: Vec<Waker> },
	Settled(AuthorizationResult),
}

/// Shared latch written once by the coordinator and read by every [`PendingAuthorization`].
#[derive(Clone, Debug)]
pub(crate) struct Deferred {
	state: Arc<Mutex<LatchState>>,
}
impl Deferred {
	pub(crate) fn new() -> Self {
		Self { state: Arc::new(Mutex::new(LatchState::Unsettled { wakers: Vec::new() })) }
	}

	/// Stores `outcome` if nothing was stored yet.
	///
	/// Returns the wakers to notify; `None` means the latch was already settled and `outcome` was
	/// dropped.
	pub(crate) fn settle(&self, outcome: AuthorizationResult) -> Option<Wakeup> {
		let mut state = self.state.lock();
		let LatchState::Unsettled { wakers } = &mut *state else {
			return None;
		};
		let wakers = std::mem::take(wakers);

		*state = LatchState::Settled(outcome);

		Some(Wakeup(wakers))
	}

	pub(crate) fn is_pending(&self) -> bool {
		matches!(*self.state.lock(), LatchState::Unsettled { .. })
	}

	pub(crate) fn outcome(&self) -> Option<AuthorizationResult> {
		match &*self.state.lock() {
			LatchState::Settled(outcome) => Some(outcome.clone()),
			LatchState::Unsettled { .. } => None,
		}
	}

	pub(crate) fn handle(&self, target: TargetId) -> PendingAuthorization {
		PendingAuthorization { target, deferred: self.clone() }
	}
}

/// Tasks waiting on a latch that just settled.
#[must_use]
pub(crate) struct Wakeup(Vec<Waker>);
impl Wakeup {
	pub(crate) fn wake(self) {
		for waker in self.0 {
			waker.wake();
		}
	}
}

/// Future resolving to the outcome of one handshake.
///
/// Returned by [`Coordinator::initiate`](crate::handshake::Coordinator::initiate) before anything
/// settles. Every clone observes the same outcome, and polling after completion yields it again.
#[derive(Clone)]
pub struct PendingAuthorization {
	target: TargetId,
	deferred: Deferred,
}
impl PendingAuthorization {
	/// Target identifier the handshake was started for.
	pub fn target(&self) -> TargetId {
		self.target
	}

	/// Whether the handshake has not settled yet.
	pub fn is_pending(&self) -> bool {
		self.deferred.is_pending()
	}

	/// Outcome, if the handshake already settled.
	pub fn try_outcome(&self) -> Option<AuthorizationResult> {
		self.deferred.outcome()
	}
}
impl Future for PendingAuthorization {
	type Output = AuthorizationResult;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let mut state = self.deferred.state.lock();

		match &mut *state {
			LatchState::Settled(outcome) => Poll::Ready(outcome.clone()),
			LatchState::Unsettled { wakers } => {
				if !wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
					wakers.push(cx.waker().clone());
				}

				Poll::Pending
			},
		}
	}
}
impl Debug for PendingAuthorization {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingAuthorization")
			.field("target", &self.target)
			.field("pending", &self.is_pending())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn target() -> TargetId {
		TargetId::new(123_456).expect("Target fixture should be valid.")
	}

	#[test]
	fn first_settlement_wins() {
		let deferred = Deferred::new();
		let pending = deferred.handle(target());

		assert!(pending.is_pending());
		assert!(deferred.settle(Err(HandshakeRejected::Closed)).is_some());
		assert!(
			deferred
				.settle(Err(HandshakeRejected::Remote { error: Value::from("late") }))
				.is_none()
		);
		assert_eq!(pending.try_outcome(), Some(Err(HandshakeRejected::Closed)));
	}

	#[tokio::test]
	async fn awaiting_resolves_after_settlement() {
		let deferred = Deferred::new();
		let pending = deferred.handle(target());
		let settle = {
			let deferred = deferred.clone();

			async move {
				tokio::task::yield_now().await;

				if let Some(wakeup) = deferred.settle(Err(HandshakeRejected::Closed)) {
					wakeup.wake();
				}
			}
		};
		let (outcome, ()) = tokio::join!(pending.clone(), settle);

		assert_eq!(outcome, Err(HandshakeRejected::Closed));
		assert_eq!(pending.await, Err(HandshakeRejected::Closed), "Clones see the same outcome.");
	}
}
