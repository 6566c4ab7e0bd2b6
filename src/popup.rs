//! Popup host contracts plus geometry helpers.
//!
//! [`PopupHost`] opens windows and reports the screen they are centered on; [`PopupWindow`] is the
//! handle the coordinator keeps for the lifetime of one session. Hosts never decide handshake
//! outcomes: they only report what they observe through the [`CloseSignal`] handed to
//! [`PopupWindow::watch`]. The in-memory host backs tests and headless demos; the browser host
//! lives in the `web` module behind the `web` feature.

pub mod memory;

pub use memory::{MemoryHost, MemoryWindow};

// std
use std::time::Duration;
// self
use crate::{_prelude::*, error::PopupError};

pub use crate::handshake::{CloseSignal, WatchStatus};

/// Poll interval an unload watch falls back to once the popup's first document is gone.
pub const UNLOAD_FALLBACK_INTERVAL: Duration = Duration::from_millis(100);

/// Window-opening side of the host environment.
pub trait PopupHost {
	/// Geometry of the screen the opener currently lives on.
	fn screen(&self) -> ScreenGeometry;

	/// Opens a new window at `url`.
	///
	/// Returns [`PopupError::Blocked`] when the environment refuses to open one.
	fn open(
		&self,
		url: &Url,
		name: &str,
		features: &WindowFeatures,
	) -> Result<Box<dyn PopupWindow>, PopupError>;
}

/// Handle to an opened popup window.
///
/// Implementations must not call back into the coordinator from [`is_closed`](Self::is_closed).
pub trait PopupWindow {
	/// Whether the window has been closed (by the user or programmatically).
	fn is_closed(&self) -> bool;

	/// Closes the window. Closing an already closed window is a no-op.
	fn close(&self);

	/// Brings the window to the front, when supported.
	fn focus(&self) {}

	/// Starts watching the window for closure in the given mode.
	///
	/// - [`CancelWatch::Poll`]: call [`CloseSignal::poll`] every `interval` until it returns
	///   [`WatchStatus::Finished`].
	/// - [`CancelWatch::Unload`]: call [`CloseSignal::poll`] whenever the window reports an unload,
	///   or [`CloseSignal::closed`] when closure is certain. An unload that leaves the window
	///   open is a navigation; the new document carries no listener, so from then on poll every
	///   [`UNLOAD_FALLBACK_INTERVAL`] as in poll mode.
	///
	/// The returned guard stops the watch when dropped.
	fn watch(&self, mode: CancelWatch, signal: CloseSignal) -> Result<WatchGuard, PopupError>;
}

/// How the coordinator notices that the user closed the popup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelWatch {
	/// Check the window's closed flag on a fixed interval.
	Poll {
		/// Delay between two checks.
		interval: Duration,
	},
	/// React to the window's own unload notifications.
	Unload,
}
impl CancelWatch {
	/// Stable label for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			CancelWatch::Poll { .. } => "poll",
			CancelWatch::Unload => "unload",
		}
	}
}

/// RAII handle returned by [`PopupWindow::watch`]; dropping it stops the watch.
pub struct WatchGuard {
	cleanup: Option<Box<dyn FnOnce()>>,
}
impl WatchGuard {
	/// Runs `cleanup` once when the guard is dropped.
	pub fn new(cleanup: impl 'static + FnOnce()) -> Self {
		Self { cleanup: Some(Box::new(cleanup)) }
	}

	/// Guard with nothing to release.
	pub fn noop() -> Self {
		Self { cleanup: None }
	}
}
impl Drop for WatchGuard {
	fn drop(&mut self) {
		if let Some(cleanup) = self.cleanup.take() {
			cleanup();
		}
	}
}
impl Debug for WatchGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("WatchGuard(..)")
	}
}

/// Screen area the popup is centered on, including multi-monitor offsets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenGeometry {
	/// Usable width.
	pub width: f64,
	/// Usable height.
	pub height: f64,
	/// Horizontal offset of this screen within the virtual desktop.
	pub left: f64,
	/// Vertical offset of this screen within the virtual desktop.
	pub top: f64,
}
impl Default for ScreenGeometry {
	fn default() -> Self {
		Self { width: 1280., height: 800., left: 0., top: 0. }
	}
}

/// Raw screen measurements a host managed to read, resolved in fallback order.
///
/// Offsets prefer the window's own position over the screen's. Extents take the first positive
/// value among viewport, document, and screen, then fall back to [`ScreenGeometry::default`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenReadings {
	/// Window position on the virtual desktop (`screenLeft`, `screenTop`).
	pub window_offset: (Option<f64>, Option<f64>),
	/// Screen position on the virtual desktop.
	pub screen_offset: (Option<f64>, Option<f64>),
	/// Viewport size (`innerWidth`, `innerHeight`).
	pub viewport: (Option<f64>, Option<f64>),
	/// Root element client size.
	pub document: (Option<f64>, Option<f64>),
	/// Physical screen size.
	pub screen: (Option<f64>, Option<f64>),
}
impl ScreenReadings {
	/// Resolves the readings into the geometry the popup is centered on.
	pub fn resolve(self) -> ScreenGeometry {
		let fallback = ScreenGeometry::default();
		let extent = |candidates: [Option<f64>; 3], default: f64| {
			candidates
				.into_iter()
				.flatten()
				.find(|value| value.is_finite() && *value > 0.)
				.unwrap_or(default)
		};

		ScreenGeometry {
			width: extent([self.viewport.0, self.document.0, self.screen.0], fallback.width),
			height: extent([self.viewport.1, self.document.1, self.screen.1], fallback.height),
			left: self.window_offset.0.or(self.screen_offset.0).unwrap_or(fallback.left),
			top: self.window_offset.1.or(self.screen_offset.1).unwrap_or(fallback.top),
		}
	}
}

/// Feature string components passed when opening the popup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowFeatures {
	/// Popup width.
	pub width: f64,
	/// Popup height.
	pub height: f64,
	/// Distance from the left edge of the virtual desktop.
	pub left: f64,
	/// Distance from the top edge of the virtual desktop.
	pub top: f64,
}
impl WindowFeatures {
	/// Centers a `width` x `height` popup on `screen`.
	pub fn centered(width: f64, height: f64, screen: &ScreenGeometry) -> Self {
		Self {
			width,
			height,
			left: screen.width / 2. - width / 2. + screen.left,
			top: screen.height / 2. - height / 2. + screen.top,
		}
	}
}
impl Display for WindowFeatures {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(
			f,
			"scrollbars=yes, width={}, height={}, top={}, left={}",
			self.width, self.height, self.top, self.left
		)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn popup_is_centered_with_screen_offsets() {
		let screen = ScreenGeometry { width: 1920., height: 1080., left: 1920., top: 0. };
		let features = WindowFeatures::centered(600., 400., &screen);

		assert_eq!(features.left, 2580.);
		assert_eq!(features.top, 340.);
		assert_eq!(
			features.to_string(),
			"scrollbars=yes, width=600, height=400, top=340, left=2580"
		);
	}

	#[test]
	fn screen_readings_fall_back_in_order() {
		let readings = ScreenReadings {
			window_offset: (None, Some(25.)),
			screen_offset: (Some(1920.), Some(0.)),
			viewport: (Some(0.), None),
			document: (Some(1024.), None),
			screen: (Some(1920.), Some(1080.)),
		};

		assert_eq!(
			readings.resolve(),
			ScreenGeometry { width: 1024., height: 1080., left: 1920., top: 25. }
		);
		assert_eq!(ScreenReadings::default().resolve(), ScreenGeometry::default());
	}

	#[test]
	fn watch_guard_runs_cleanup_once() {
		let hits = Rc::new(RefCell::new(0));
		let counter = hits.clone();
		let guard = WatchGuard::new(move || *counter.borrow_mut() += 1);

		drop(guard);
		drop(WatchGuard::noop());

		assert_eq!(*hits.borrow(), 1);
	}
}
