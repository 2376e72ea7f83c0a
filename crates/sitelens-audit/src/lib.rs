//! Sitelens Audit - Concurrent dispatch of registered checks.
//!
//! Takes a [`sitelens_check::CheckRegistry`], fans every runnable check out
//! as its own task, and folds the outcomes into a single
//! [`sitelens_core::AuditReport`]. The run itself is infallible: every
//! internal failure is converted to a per-check `erro` outcome so a report
//! is always produced.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod orchestrator;

pub use orchestrator::{AuditOrchestrator, ExtraArgs};
