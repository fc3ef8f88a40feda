use chatguard_core::{AnalysisRequest, AnalysisResult, ChatGuardError};

const SYSTEM_PROMPT: &str = "\
You are the moderator of a repository on GitHub.

Your job is to analyse the titles and content of discussions, issues, pull \
requests and comments and evaluate their sentiment. Give a negative rating \
for spam, illegal adverts and insults.

Respond with a JSON object:
{
  \"sentiment\": \"negative\",
  \"type\": \"spam\",
  \"explanation\": \"The content repeats promotional links unrelated to the project.\"
}

The sentiment field must be one of two values: \"negative\" or \"positive\". \
If the content has a positive sentiment, leave the type and explanation fields blank.";

/// Build the system prompt for the moderation classifier.
///
/// # Examples
///
/// ```
/// use chatguard_moderation::prompt::build_system_prompt;
///
/// let prompt = build_system_prompt();
/// assert!(prompt.contains("moderator"));
/// assert!(prompt.contains("\"positive\""));
/// ```
pub fn build_system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

/// Serialize an analysis request as the second chat message.
///
/// # Examples
///
/// ```
/// use chatguard_core::AnalysisRequest;
/// use chatguard_moderation::prompt::build_analysis_prompt;
///
/// let request = AnalysisRequest {
///     kind: "issues".into(),
///     title: "Crash".into(),
///     content: "It crashes".into(),
/// };
/// assert_eq!(
///     build_analysis_prompt(&request),
///     "Type:issues\nTitle:Crash\nContent:It crashes"
/// );
/// ```
pub fn build_analysis_prompt(request: &AnalysisRequest) -> String {
    format!(
        "Type:{}\nTitle:{}\nContent:{}",
        request.kind, request.title, request.content
    )
}

/// Parse the classifier's reply into an [`AnalysisResult`].
///
/// Handles markdown code fences around the JSON.
///
/// # Errors
///
/// Returns [`ChatGuardError::EmptyResponse`] for a blank reply and
/// [`ChatGuardError::MalformedResponse`] if the reply is not the expected
/// JSON object.
///
/// # Examples
///
/// ```
/// use chatguard_core::Sentiment;
/// use chatguard_moderation::prompt::parse_analysis_response;
///
/// let result = parse_analysis_response(r#"{"sentiment":"positive"}"#).unwrap();
/// assert_eq!(result.sentiment, Sentiment::Positive);
/// ```
pub fn parse_analysis_response(response: &str) -> Result<AnalysisResult, ChatGuardError> {
    let cleaned = strip_code_fences(response);
    if cleaned.is_empty() {
        return Err(ChatGuardError::EmptyResponse);
    }
    serde_json::from_str(cleaned).map_err(|e| ChatGuardError::MalformedResponse(e.to_string()))
}

fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}
