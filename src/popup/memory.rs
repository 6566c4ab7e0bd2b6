//! Scriptable in-memory [`PopupHost`] for tests and headless demos.

// self
use crate::{
	_prelude::*,
	error::PopupError,
	popup::{
		CancelWatch, CloseSignal, PopupHost, PopupWindow, ScreenGeometry, UNLOAD_FALLBACK_INTERVAL,
		WatchGuard, WatchStatus, WindowFeatures,
	},
};

/// Host that "opens" [`MemoryWindow`]s and lets the caller drive them by hand.
///
/// Poll-mode watches only fire when [`MemoryHost::tick`] is called, which stands in for one timer
/// interval elapsing.
#[derive(Clone, Debug, Default)]
pub struct MemoryHost(Rc<RefCell<HostState>>);
impl MemoryHost {
	/// Host reporting `screen` as the opener's screen.
	pub fn with_screen(screen: ScreenGeometry) -> Self {
		let host = Self::default();

		host.0.borrow_mut().screen = screen;

		host
	}

	/// Makes subsequent opens fail with [`PopupError::Blocked`].
	pub fn set_blocked(&self, blocked: bool) {
		self.0.borrow_mut().blocked = blocked;
	}

	/// Makes the watch of the next opened window fail.
	pub fn fail_next_watch(&self) {
		self.0.borrow_mut().fail_next_watch = true;
	}

	/// Every window opened so far, oldest first.
	pub fn windows(&self) -> Vec<MemoryWindow> {
		self.0.borrow().windows.clone()
	}

	/// Most recently opened window.
	pub fn last_window(&self) -> Option<MemoryWindow> {
		self.0.borrow().windows.last().cloned()
	}

	/// Runs one check for every poll-mode watch and returns how many are still watching.
	pub fn tick(&self) -> usize {
		let signals = self
			.0
			.borrow()
			.windows
			.iter()
			.filter_map(|window| window.signal_for(|mode| matches!(mode, CancelWatch::Poll { .. })))
			.collect::<Vec<_>>();

		signals.into_iter().filter(|signal| !signal.poll().is_finished()).count()
	}
}
impl PopupHost for MemoryHost {
	fn screen(&self) -> ScreenGeometry {
		self.0.borrow().screen
	}

	fn open(
		&self,
		url: &Url,
		name: &str,
		features: &WindowFeatures,
	) -> Result<Box<dyn PopupWindow>, PopupError> {
		let mut state = self.0.borrow_mut();

		if state.blocked {
			return Err(PopupError::Blocked);
		}

		let window = MemoryWindow(Rc::new(RefCell::new(WindowState {
			url: Some(url.clone()),
			name: name.to_owned(),
			features: Some(*features),
			fail_watch: std::mem::take(&mut state.fail_next_watch),
			..Default::default()
		})));

		state.windows.push(window.clone());

		Ok(Box::new(window))
	}
}

#[derive(Debug, Default)]
struct HostState {
	screen: ScreenGeometry,
	blocked: bool,
	fail_next_watch: bool,
	windows: Vec<MemoryWindow>,
}

/// Window opened by [`MemoryHost`]. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct MemoryWindow(Rc<RefCell<WindowState>>);
impl MemoryWindow {
	/// Window that was never opened through a host.
	pub fn detached() -> Self {
		Self::default()
	}

	/// URL the window was opened at.
	pub fn url(&self) -> Option<Url> {
		self.0.borrow().url.clone()
	}

	/// Window name passed to the host.
	pub fn name(&self) -> String {
		self.0.borrow().name.clone()
	}

	/// Placement the window was opened with.
	pub fn features(&self) -> Option<WindowFeatures> {
		self.0.borrow().features
	}

	/// Number of programmatic [`PopupWindow::close`] calls.
	pub fn close_calls(&self) -> usize {
		self.0.borrow().close_calls
	}

	/// Number of [`PopupWindow::focus`] calls.
	pub fn focus_calls(&self) -> usize {
		self.0.borrow().focus_calls
	}

	/// Whether a watch is currently registered.
	pub fn is_watched(&self) -> bool {
		self.0.borrow().watch.is_some()
	}

	/// Mode of the registered watch.
	pub fn watch_mode(&self) -> Option<CancelWatch> {
		self.0.borrow().watch.as_ref().map(|(mode, _)| *mode)
	}

	/// Signal handed to the registered watch.
	pub fn signal(&self) -> Option<CloseSignal> {
		self.signal_for(|_| true)
	}

	/// Simulates the user closing the window.
	///
	/// Unload-mode watches are notified; poll-mode watches notice on the next
	/// [`MemoryHost::tick`].
	pub fn close_by_user(&self) -> Option<WatchStatus> {
		self.0.borrow_mut().closed = true;

		self.fire_unload()
	}

	/// Simulates the window unloading its page without closing (a redirect inside the popup).
	///
	/// An unload watch that sees the window still open switches to polling, so later closures are
	/// only noticed by [`MemoryHost::tick`].
	pub fn navigate(&self) -> Option<WatchStatus> {
		self.fire_unload()
	}

	fn fire_unload(&self) -> Option<WatchStatus> {
		let status = self.signal_for(|mode| mode == CancelWatch::Unload)?.poll();

		if status == WatchStatus::Watching {
			// The next document has no unload listener; keep watching on the host's ticks.
			if let Some((mode, _)) = self.0.borrow_mut().watch.as_mut() {
				*mode = CancelWatch::Poll { interval: UNLOAD_FALLBACK_INTERVAL };
			}
		}

		Some(status)
	}

	fn signal_for(&self, accept: impl FnOnce(CancelWatch) -> bool) -> Option<CloseSignal> {
		let state = self.0.borrow();
		let (mode, signal) = state.watch.as_ref()?;

		accept(*mode).then(|| signal.clone())
	}
}
impl PopupWindow for MemoryWindow {
	fn is_closed(&self) -> bool {
		self.0.borrow().closed
	}

	fn close(&self) {
		let was_closed = {
			let mut state = self.0.borrow_mut();

			state.close_calls += 1;

			std::mem::replace(&mut state.closed, true)
		};

		if !was_closed {
			self.fire_unload();
		}
	}

	fn focus(&self) {
		self.0.borrow_mut().focus_calls += 1;
	}

	fn watch(&self, mode: CancelWatch, signal: CloseSignal) -> Result<WatchGuard, PopupError> {
		let mut state = self.0.borrow_mut();

		if state.fail_watch {
			return Err(PopupError::Host { message: "watch registration failed".into() });
		}

		state.watch = Some((mode, signal));

		let registration = Rc::downgrade(&self.0);

		Ok(WatchGuard::new(move || {
			if let Some(state) = registration.upgrade() {
				state.borrow_mut().watch = None;
			}
		}))
	}
}

#[derive(Default)]
struct WindowState {
	url: Option<Url>,
	name: String,
	features: Option<WindowFeatures>,
	closed: bool,
	close_calls: usize,
	focus_calls: usize,
	fail_watch: bool,
	watch: Option<(CancelWatch, CloseSignal)>,
}
impl Debug for WindowState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WindowState")
			.field("url", &self.url.as_ref().map(Url::as_str))
			.field("closed", &self.closed)
			.field("close_calls", &self.close_calls)
			.field("watch", &self.watch.as_ref().map(|(mode, _)| mode.as_str()))
			.finish()
	}
}
