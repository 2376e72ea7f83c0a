//! Sitelens Fetch - Bounded-concurrency HTTP helper for checks.
//!
//! Every check that touches the network goes through a [`Fetcher`]: an HTTP
//! client scoped to one check invocation, bounded by its own counting
//! semaphore, with two retry policies:
//!
//! - an **escalating timeout schedule** for slow targets (retried on timeout
//!   only; HTTP error statuses fail immediately), and
//! - a **small fixed retry count** for transient statuses (408, 429, 500,
//!   502, 503, 504) during link-liveness probes; other statuses are terminal.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod fetcher;

// Re-export commonly used types
pub use error::{FetchError, Result};
pub use fetcher::{Fetcher, ProbeResult, RetrySchedule, TRANSIENT_STATUSES};
