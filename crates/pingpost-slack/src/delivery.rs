//! Thread-continuity flow: decides whether a delivery opens a new Slack
//! thread or appends to the one the caller carried forward.

use crate::api_client::SlackApiClient;
use crate::error::SlackError;

/// Thread timestamp placeholder meaning "not part of a thread". The finalize
/// call always carries some thread value; this named constant keeps the
/// unthreaded case distinct from an absent handle.
pub const UNTHREADED_THREAD_TS: &str = "0";

/// One probe output to deliver: UTF-8 text plus the title Slack displays for
/// the attachment. Built fresh each iteration and dropped after delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub title: String,
    pub content: Vec<u8>,
}

impl Artifact {
    pub fn new(title: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// How one delivery relates to the ongoing thread.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ThreadState {
    /// Threading disabled: every iteration posts a fresh top-level message
    /// and attaches with the neutral placeholder.
    NoThreading,
    /// Threading wanted, no anchor yet: the next post opens the thread.
    Pending,
    /// An anchor exists: append under it, no new post.
    Active(String),
}

fn thread_state(threading_enabled: bool, prior_thread: Option<String>) -> ThreadState {
    match (threading_enabled, prior_thread) {
        (false, _) => ThreadState::NoThreading,
        (true, None) => ThreadState::Pending,
        (true, Some(thread_ts)) => ThreadState::Active(thread_ts),
    }
}

/// Delivers one artifact into `channel` and returns the thread handle the
/// caller must pass back on the next call to keep the thread growing.
///
/// Continuity lives entirely in that returned handle: this function keeps no
/// state between calls. With threading disabled the anchor message's
/// timestamp is discarded and `None` comes back every time, so each iteration
/// stands alone at the top level of the channel.
pub async fn deliver_artifact(
    client: &SlackApiClient,
    channel: &str,
    artifact: &Artifact,
    threading_enabled: bool,
    prior_thread: Option<String>,
) -> Result<Option<String>, SlackError> {
    let anchor_text = format!("Uploading the file {} to Slack.", artifact.title);
    match thread_state(threading_enabled, prior_thread) {
        ThreadState::NoThreading => {
            client.post_message(channel, &anchor_text).await?;
            client
                .upload_to_thread(channel, UNTHREADED_THREAD_TS, artifact)
                .await?;
            Ok(None)
        }
        ThreadState::Pending => {
            let posted = client.post_message(channel, &anchor_text).await?;
            client
                .upload_to_thread(channel, &posted.ts, artifact)
                .await?;
            Ok(Some(posted.ts))
        }
        ThreadState::Active(thread_ts) => {
            client
                .upload_to_thread(channel, &thread_ts, artifact)
                .await?;
            Ok(Some(thread_ts))
        }
    }
}
