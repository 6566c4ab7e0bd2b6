// self
use crate::{_prelude::*, auth::TargetId, obs::HandshakeStage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedHandshake<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedHandshake<F> = F;

/// A span builder used by the handshake coordinator.
#[derive(Clone, Debug)]
pub struct HandshakeSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl HandshakeSpan {
	/// Creates a new span tagged with the provided stage and, when known, the target id.
	pub fn new(stage: HandshakeStage, target: Option<TargetId>) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"oauth2_popup.handshake",
				stage = stage.as_str(),
				target = target.map(TargetId::get)
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, target);

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> HandshakeSpanGuard {
		#[cfg(feature = "tracing")]
		{
			HandshakeSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			HandshakeSpanGuard {}
		}
	}

	/// Instruments a future without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedHandshake<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`HandshakeSpan::entered`].
pub struct HandshakeSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for HandshakeSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("HandshakeSpanGuard(..)")
	}
}

/// Emits a debug event inside the current span (when tracing is enabled).
pub fn trace_event(stage: HandshakeStage, message: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(stage = stage.as_str(), "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, message);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn handshake_span_noop_without_tracing() {
		let _guard = HandshakeSpan::new(HandshakeStage::Initiate, None).entered();

		trace_event(HandshakeStage::Initiate, "smoke");
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let target = TargetId::new(5).expect("Target fixture should be valid.");
		let span = HandshakeSpan::new(HandshakeStage::Deliver, Some(target));
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
