//! Slack delivery core for pingpost.
//!
//! Posts probe output into a Slack channel as a thread-anchored file
//! attachment and decides, per iteration, whether to open a new thread or
//! append to the one the caller carried forward. The caller owns the thread
//! handle: `deliver_artifact` returns the handle to feed into the next call
//! and keeps no state of its own.

pub mod api_client;
pub mod delivery;
pub mod error;

pub use api_client::{PostedMessage, RetryPolicy, SlackApiClient, SlackApiClientConfig};
pub use delivery::{deliver_artifact, Artifact, UNTHREADED_THREAD_TS};
pub use error::SlackError;
