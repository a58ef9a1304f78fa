use thiserror::Error;

#[derive(Debug, Error)]
/// Failure modes of one Slack delivery call.
pub enum SlackError {
    /// The API answered with a non-success HTTP status.
    #[error("slack api {operation} failed with status {status}: {body}")]
    Transport {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// The request never produced a status (connect, timeout, body I/O).
    #[error("slack api {operation} request failed: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP success, but Slack reported `"ok": false`.
    #[error("slack api {operation} failed: {error}")]
    Api {
        operation: &'static str,
        error: String,
    },

    /// HTTP success and `"ok": true`, but a required field was absent.
    #[error("slack api {operation} response missing {field}")]
    Protocol {
        operation: &'static str,
        field: &'static str,
    },
}

impl SlackError {
    pub(crate) fn api(operation: &'static str, error: Option<String>) -> Self {
        Self::Api {
            operation,
            error: error.unwrap_or_else(|| "unknown error".to_string()),
        }
    }

    /// True when the failure happened at the HTTP layer rather than in the
    /// response contents. A caller looping indefinitely can treat these as
    /// transient and simply try again next iteration.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Http { .. })
    }
}
