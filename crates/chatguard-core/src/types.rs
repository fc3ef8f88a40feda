use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized view of one triggering event.
///
/// `parent_id` identifies the object that receives the moderation comment:
/// the object itself for issues, pull requests and discussions, the
/// containing issue or discussion for comments.
///
/// # Examples
///
/// ```
/// use chatguard_core::Payload;
///
/// let payload = Payload {
///     node_id: "IC_1".into(),
///     parent_id: "I_1".into(),
///     title: None,
///     body: "hello".into(),
///     user_login: "octocat".into(),
/// };
/// assert_ne!(payload.node_id, payload.parent_id);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    /// Node ID of the object the event describes.
    pub node_id: String,
    /// Node ID of the object to comment on.
    pub parent_id: String,
    /// Title, for issues, pull requests and discussions only.
    pub title: Option<String>,
    /// Text content to classify. Empty when the event carried no body.
    pub body: String,
    /// Login of the acting user. Empty when the event had no actor.
    pub user_login: String,
}

/// Input to one classification call.
///
/// # Examples
///
/// ```
/// use chatguard_core::{AnalysisRequest, Payload};
///
/// let payload = Payload {
///     node_id: "D_1".into(),
///     parent_id: "D_1".into(),
///     title: Some("Question".into()),
///     body: "How do I build this?".into(),
///     user_login: "alice".into(),
/// };
/// let request = AnalysisRequest::from_payload("discussion", &payload);
/// assert_eq!(request.kind, "discussion");
/// assert_eq!(request.title, "Question");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Event name the content came from (e.g. `issue_comment`).
    pub kind: String,
    /// Title, empty for comments.
    pub title: String,
    /// Text content.
    pub content: String,
}

impl AnalysisRequest {
    /// Build the request for `payload` as delivered by the `event_name` event.
    pub fn from_payload(event_name: &str, payload: &Payload) -> Self {
        Self {
            kind: event_name.to_string(),
            title: payload.title.clone().unwrap_or_default(),
            content: payload.body.clone(),
        }
    }
}

/// Verdict of the sentiment classifier.
///
/// # Examples
///
/// ```
/// use chatguard_core::Sentiment;
///
/// let s: Sentiment = serde_json::from_str("\"negative\"").unwrap();
/// assert_eq!(s, Sentiment::Negative);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// Acceptable content; nothing is posted.
    Positive,
    /// Spam, adverts, insults and the like.
    Negative,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
        }
    }
}

/// Structured classifier reply.
///
/// `kind` and `explanation` are only meaningful for negative results; they
/// default to empty when the classifier leaves them out.
///
/// # Examples
///
/// ```
/// use chatguard_core::{AnalysisResult, Sentiment};
///
/// let result: AnalysisResult = serde_json::from_str(r#"{"sentiment":"positive"}"#).unwrap();
/// assert_eq!(result.sentiment, Sentiment::Positive);
/// assert!(result.kind.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Positive or negative verdict.
    pub sentiment: Sentiment,
    /// Category of negative content (e.g. `spam`).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Why the content was judged negative.
    #[serde(default)]
    pub explanation: String,
}

impl AnalysisResult {
    /// Whether the content should be answered with a moderation comment.
    pub fn is_negative(&self) -> bool {
        self.sentiment == Sentiment::Negative
    }
}
