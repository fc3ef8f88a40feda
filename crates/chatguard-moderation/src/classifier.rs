use async_trait::async_trait;
use chatguard_core::{AnalysisRequest, AnalysisResult, ChatGuardError};
use tracing::debug;

use crate::llm::{ChatMessage, LlmClient, Role};
use crate::prompt;

/// Classifies the sentiment of an [`AnalysisRequest`].
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Classify `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatGuardError::EmptyResponse`] or
    /// [`ChatGuardError::MalformedResponse`] when the reply is unusable, and
    /// transport errors from the backend unchanged.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ChatGuardError>;
}

/// Sentiment classifier backed by a chat completion model.
///
/// Sends exactly two messages: the moderation persona and the serialized
/// request. No retries.
pub struct SentimentAssistant {
    llm: LlmClient,
}

impl SentimentAssistant {
    /// Wrap an LLM client.
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// The two messages sent for `request`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatguard_core::AnalysisRequest;
    /// use chatguard_moderation::classifier::SentimentAssistant;
    /// use chatguard_moderation::llm::Role;
    ///
    /// let request = AnalysisRequest {
    ///     kind: "discussion".into(),
    ///     title: "T".into(),
    ///     content: "B".into(),
    /// };
    /// let messages = SentimentAssistant::messages(&request);
    /// assert_eq!(messages.len(), 2);
    /// assert_eq!(messages[0].role, Role::System);
    /// assert_eq!(messages[1].content, "Type:discussion\nTitle:T\nContent:B");
    /// ```
    pub fn messages(request: &AnalysisRequest) -> Vec<ChatMessage> {
        vec![
            ChatMessage::new(Role::System, prompt::build_system_prompt()),
            ChatMessage::new(Role::User, prompt::build_analysis_prompt(request)),
        ]
    }
}

#[async_trait]
impl SentimentClassifier for SentimentAssistant {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ChatGuardError> {
        debug!(
            model = self.llm.model(),
            kind = %request.kind,
            content_len = request.content.len(),
            "requesting sentiment analysis"
        );
        let reply = self.llm.chat(Self::messages(request)).await?;
        prompt::parse_analysis_response(&reply)
    }
}
