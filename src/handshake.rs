//! Popup handshake coordination.
//!
//! A [`Coordinator`] owns at most one [`IntegrationSession`] at a time. Starting an integration
//! opens the popup and hands the caller a [`PendingAuthorization`] immediately; the session then
//! settles exactly once, from whichever arrives first:
//!
//! - a [`Delivery`] from the callback page (success payload or remote error),
//! - the cancellation watch noticing that the user closed the popup.
//!
//! Settlement goes through a single-assignment latch, so a late close signal racing a delivery
//! (or the other way around) has no effect. Precondition failures are returned synchronously and
//! never routed through the pending result.

pub mod coordinator;
pub mod deferred;
pub mod delivery;
pub mod session;

mod metrics;

pub use coordinator::*;
pub use deferred::*;
pub use delivery::*;
pub use metrics::HandshakeMetrics;
pub use session::*;
