//! Sitelens Core - Shared types for the website audit engine.
//!
//! This crate defines the vocabulary the rest of the workspace speaks:
//! check identifiers, the closed verdict enumeration, the per-check outcome
//! and audit report shapes, and the TOML-backed configuration.
//!
//! # Architecture
//!
//! - **Types** ([`types`]): `CheckId`, `Verdict`, `CheckOutcome`, `AuditReport`
//! - **Config** ([`config`]): TOML configuration with env-var overrides
//! - **Errors** ([`error`]): core error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AuditConfig, BrowserConfig, CheckTuning, FetchConfig};
pub use error::{ConfigError, ConfigResult, CoreError};
pub use types::{AuditReport, AuditStatus, CheckId, CheckOutcome, Details, Verdict};
