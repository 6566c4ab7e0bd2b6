//! Popup-window OAuth handshakes for browser apps: open the consent window, watch it for
//! cancellation, and settle a single pending authorization exactly once.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod authorize;
pub mod config;
pub mod error;
pub mod handshake;
pub mod obs;
pub mod popup;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

mod _prelude {
	pub use std::{
		cell::RefCell,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		rc::{Rc, Weak},
		str::FromStr,
		sync::Arc,
		task::{Context, Poll, Waker},
	};

	pub use parking_lot::Mutex;
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use serde_json;
pub use url;
#[cfg(test)] use {color_eyre as _, tokio as _};
#[cfg(all(test, target_arch = "wasm32"))] use wasm_bindgen_test as _;
