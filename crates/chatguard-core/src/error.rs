use std::fmt;

/// Pipeline stage an error originated from.
///
/// # Examples
///
/// ```
/// use chatguard_core::Stage;
///
/// assert_eq!(Stage::Classify.to_string(), "classify");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Turning the raw webhook event into a [`Payload`](crate::Payload).
    Normalize,
    /// Sentiment classification of the payload text.
    Classify,
    /// Posting the moderation comment.
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Normalize => write!(f, "normalize"),
            Stage::Classify => write!(f, "classify"),
            Stage::Publish => write!(f, "publish"),
        }
    }
}

/// Errors that can occur across ChatGuard.
///
/// Library crates use this type directly; the binary converts to a
/// `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use chatguard_core::ChatGuardError;
///
/// let err = ChatGuardError::UnrecognizedEvent("workflow_run".into());
/// assert!(err.to_string().contains("workflow_run"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ChatGuardError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The event document has no object under the key its name maps to.
    #[error("unrecognized event {0:?}: no matching object in the event payload")]
    UnrecognizedEvent(String),

    /// A required field of the event document is missing or has the wrong type.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// The classifier replied with an empty message.
    #[error("classifier returned an empty message")]
    EmptyResponse,

    /// The classifier reply is not a valid analysis result.
    #[error("malformed classifier response: {0}")]
    MalformedResponse(String),

    /// Completion API error or unexpected completion document.
    #[error("LLM error: {0}")]
    Llm(String),

    /// An HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The GraphQL endpoint answered with a non-200 status.
    #[error("GraphQL endpoint returned status {status}: {body}")]
    Transport {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The GraphQL response carried a non-empty `errors` list.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// The run's deadline elapsed while waiting on a network call.
    #[error("deadline exceeded during {stage}")]
    DeadlineExceeded {
        /// Stage that was in flight.
        stage: Stage,
    },

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
