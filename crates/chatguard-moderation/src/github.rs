use async_trait::async_trait;
use chatguard_core::{ChatGuardError, GitHubConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const USER_AGENT: &str = concat!("chatguard/", env!("CARGO_PKG_VERSION"));

/// Object a moderation comment is attached to.
///
/// # Examples
///
/// ```
/// use chatguard_moderation::github::CommentTarget;
///
/// let target = CommentTarget::for_event("discussion_comment", "D_1");
/// assert_eq!(target, CommentTarget::Discussion("D_1".into()));
///
/// let target = CommentTarget::for_event("issue_comment", "I_1");
/// assert_eq!(target, CommentTarget::Subject("I_1".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentTarget {
    /// Issue or pull request, commented on with `addComment`.
    Subject(String),
    /// Discussion, commented on with `addDiscussionComment`.
    Discussion(String),
}

impl CommentTarget {
    /// Resolve the target for a comment on `parent_id` delivered by `event_name`.
    pub fn for_event(event_name: &str, parent_id: impl Into<String>) -> Self {
        match event_name {
            "discussion" | "discussion_comment" => CommentTarget::Discussion(parent_id.into()),
            _ => CommentTarget::Subject(parent_id.into()),
        }
    }

    /// Node ID of the target.
    pub fn id(&self) -> &str {
        match self {
            CommentTarget::Subject(id) | CommentTarget::Discussion(id) => id,
        }
    }

    /// GraphQL mutation that adds a comment to this target.
    pub fn mutation_name(&self) -> &'static str {
        match self {
            CommentTarget::Subject(_) => "addComment",
            CommentTarget::Discussion(_) => "addDiscussionComment",
        }
    }
}

/// Build the GraphQL mutation text adding `body` as a comment on `target`.
///
/// The target ID is interpolated as-is; the body is embedded as a JSON
/// string literal.
///
/// # Errors
///
/// Returns [`ChatGuardError::Serialization`] if the body cannot be encoded.
///
/// # Examples
///
/// ```
/// use chatguard_moderation::github::{build_mutation, CommentTarget};
///
/// let mutation = build_mutation(&CommentTarget::Subject("I_1".into()), "hi").unwrap();
/// assert_eq!(
///     mutation,
///     r#"mutation{addComment(input:{subjectId:"I_1", body:"hi"}){clientMutationId}}"#
/// );
/// ```
pub fn build_mutation(target: &CommentTarget, body: &str) -> Result<String, ChatGuardError> {
    let body = serde_json::to_string(body)?;
    let mutation = match target {
        CommentTarget::Subject(id) => format!(
            r#"mutation{{addComment(input:{{subjectId:"{id}", body:{body}}}){{clientMutationId}}}}"#
        ),
        CommentTarget::Discussion(id) => format!(
            r#"mutation{{addDiscussionComment(input:{{discussionId:"{id}", body:{body}}}){{clientMutationId}}}}"#
        ),
    };
    Ok(mutation)
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
}

/// Build the JSON request body `{"query": <mutation>}`.
///
/// # Errors
///
/// Returns [`ChatGuardError::Serialization`] if encoding fails.
pub fn build_request(target: &CommentTarget, body: &str) -> Result<String, ChatGuardError> {
    let mutation = build_mutation(target, body)?;
    Ok(serde_json::to_string(&GraphQlRequest { query: &mutation })?)
}

/// GraphQL response envelope.
///
/// A non-empty `errors` list is a failure regardless of `data`.
///
/// # Examples
///
/// ```
/// use chatguard_moderation::github::GraphQlEnvelope;
///
/// let envelope: GraphQlEnvelope =
///     serde_json::from_str(r#"{"data":null,"errors":[{"message":"not found"}]}"#).unwrap();
/// assert!(envelope.has_errors());
/// assert!(envelope.into_result().is_err());
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct GraphQlEnvelope {
    /// Mutation result, if any.
    #[serde(default)]
    pub data: Option<Value>,
    /// Error entries, kept as raw JSON.
    #[serde(default)]
    pub errors: Option<Vec<Value>>,
}

impl GraphQlEnvelope {
    /// Whether the response carries at least one error entry.
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }

    /// The error entries joined with `,`.
    pub fn error_message(&self) -> String {
        self.errors
            .iter()
            .flatten()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Convert into the `data` payload, or a [`ChatGuardError::GraphQl`].
    ///
    /// # Errors
    ///
    /// Returns [`ChatGuardError::GraphQl`] with the joined entries when
    /// `errors` is non-empty.
    pub fn into_result(self) -> Result<Option<Value>, ChatGuardError> {
        if self.has_errors() {
            return Err(ChatGuardError::GraphQl(self.error_message()));
        }
        Ok(self.data)
    }
}

/// Posts a moderation comment.
#[async_trait]
pub trait CommentPublisher: Send + Sync {
    /// Attach `body` as a comment on `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatGuardError::Transport`] for non-200 responses and
    /// [`ChatGuardError::GraphQl`] when the response lists errors.
    async fn publish(&self, target: &CommentTarget, body: &str) -> Result<(), ChatGuardError>;
}

/// GitHub GraphQL client for posting moderation comments.
///
/// Requests carry no timeout of their own; the pipeline's run deadline bounds them.
pub struct GitHubClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl GitHubClient {
    /// Create a client from the GitHub section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ChatGuardError::Config`] if no token is configured, or
    /// [`ChatGuardError::Request`] if the HTTP client cannot be built.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatguard_core::GitHubConfig;
    /// use chatguard_moderation::github::GitHubClient;
    ///
    /// let config = GitHubConfig {
    ///     token: Some("ghs_xxxx".into()),
    ///     ..GitHubConfig::default()
    /// };
    /// let client = GitHubClient::new(&config).unwrap();
    /// assert_eq!(client.endpoint(), "https://api.github.com/graphql");
    /// ```
    pub fn new(config: &GitHubConfig) -> Result<Self, ChatGuardError> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ChatGuardError::Config("GitHub token not set".into()))?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ChatGuardError::Request(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.graphql_url.clone(),
            token,
        })
    }

    /// The GraphQL endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST a serialized GraphQL request and return the `data` payload.
    ///
    /// # Errors
    ///
    /// Returns [`ChatGuardError::Request`] if the request cannot be sent,
    /// [`ChatGuardError::Transport`] for non-200 statuses, and
    /// [`ChatGuardError::GraphQl`] for error envelopes or undecodable bodies.
    pub async fn request(&self, payload: String) -> Result<Option<Value>, ChatGuardError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("bearer {}", self.token))
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| ChatGuardError::Request(format!("GraphQL request: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ChatGuardError::Request(format!("failed to read GraphQL response: {e}")))?;

        if status != reqwest::StatusCode::OK {
            return Err(ChatGuardError::Transport {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: GraphQlEnvelope = serde_json::from_str(&text)
            .map_err(|e| ChatGuardError::GraphQl(format!("failed to decode response: {e}")))?;
        envelope.into_result()
    }
}

#[async_trait]
impl CommentPublisher for GitHubClient {
    async fn publish(&self, target: &CommentTarget, body: &str) -> Result<(), ChatGuardError> {
        let payload = build_request(target, body)?;
        debug!(
            mutation = target.mutation_name(),
            target = target.id(),
            bytes = payload.len(),
            "sending GraphQL mutation"
        );
        self.request(payload).await?;
        Ok(())
    }
}
