//! Sitelens Browser - Headless browser surface for rendering-dependent checks.
//!
//! Wraps chromiumoxide behind a small engine so the lateral-scroll check can
//! load a page at several viewport sizes and evaluate probe scripts. Engine
//! launch failure degrades the calling check, never the whole audit.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod engine;
pub mod error;

pub use engine::{BrowserEngine, PageHandle, Viewport};
pub use error::{BrowserError, Result};
