use chatguard_core::{ChatGuardError, LlmConfig};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// A message in a chat conversation with the LLM.
///
/// # Examples
///
/// ```
/// use chatguard_moderation::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage::new(Role::User, "Type:issues");
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Build a message with the given role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Role in the chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that exposes the `/v1/chat/completions` endpoint.
/// Requests carry no timeout of their own; callers bound them.
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ChatGuardError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, ChatGuardError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ChatGuardError::Llm(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!("{base_url}/v1/chat/completions")
    }

    /// Send a chat completion request and return the first choice's text.
    ///
    /// A choice without content yields an empty string; deciding what an
    /// empty reply means is left to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ChatGuardError::Request`] if the request cannot be sent or an
    /// error body cannot be read, and
    /// [`ChatGuardError::Llm`] on non-success statuses or a response without
    /// choices.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, ChatGuardError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
        });

        let mut request = self.client.post(self.endpoint());
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }
        request = request.header("Content-Type", "application/json");

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatGuardError::Request(format!("chat completion: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.map_err(|e| {
                ChatGuardError::Request(format!("failed to read chat completion error body: {e}"))
            })?;
            return Err(ChatGuardError::Llm(format!(
                "LLM API error {status}: {body_text}"
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatGuardError::Llm(format!("failed to parse response: {e}")))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatGuardError::Llm("response contained no choices".into()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}
