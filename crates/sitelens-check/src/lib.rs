//! Sitelens Check - Check contract and registry.
//!
//! This crate defines what a validation check *is*: the [`Check`] trait every
//! check implements, the [`CheckDescriptor`] declaring which named parameters
//! a check binds, the read-only [`CheckContext`] supplied per run, and the
//! in-memory [`CheckRegistry`] the orchestrator dispatches from.
//!
//! Checks are registered explicitly through fallible factories rather than
//! discovered by filesystem scanning; a factory that fails to construct its
//! check is logged and skipped so one bad check never aborts discovery.
//!
//! The [`aggregate`] module carries the tolerance-threshold policy shared by
//! multi-page checks: structural defects dominate, availability noise below
//! the threshold is tolerated.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod aggregate;
pub mod contract;
pub mod error;
pub mod registry;

// Re-export commonly used types
pub use aggregate::{SubProbe, SubProbeFailure, ToleranceTally};
pub use contract::{Check, CheckContext, CheckDescriptor, CheckParam};
pub use error::{CheckError, Result};
pub use registry::{CheckFactory, CheckRegistry};
