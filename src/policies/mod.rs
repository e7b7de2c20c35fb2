//! Retry delays for callers that choose to retry.
//!
//! Nothing in the runtime retries on its own. A caller that wants to wait out
//! a `TransactionConflict` passes a [`BackoffPolicy`] to
//! [`ContentModels::open_with_retry`](crate::ContentModels::open_with_retry).
//!
//! ## Contents
//! - [`BackoffPolicy`] how the delay grows per attempt (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization so competing callers do not retry in lockstep
//!
//! ## Defaults
//! `BackoffPolicy::default()` → first=20ms, factor=2.0, max=1s, jitter=Equal.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
