use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ChatGuardError;

/// Top-level configuration loaded from `.chatguard.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
/// The binary resolves it once and hands the sections to the clients.
///
/// # Examples
///
/// ```
/// use chatguard_core::ChatGuardConfig;
///
/// let config = ChatGuardConfig::default();
/// assert_eq!(config.timeout_secs, 60);
/// assert_eq!(config.llm.model, "gpt-3.5-turbo");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatGuardConfig {
    /// Deadline for a whole run, in seconds (default: 60).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Chat completion settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// GitHub GraphQL settings.
    #[serde(default)]
    pub github: GitHubConfig,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ChatGuardConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            llm: LlmConfig::default(),
            github: GitHubConfig::default(),
        }
    }
}

impl ChatGuardConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatGuardError::Io`] if the file cannot be read, or
    /// [`ChatGuardError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use chatguard_core::ChatGuardConfig;
    /// use std::path::Path;
    ///
    /// let config = ChatGuardConfig::from_file(Path::new(".chatguard.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, ChatGuardError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ChatGuardError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatguard_core::ChatGuardConfig;
    ///
    /// let toml = r#"
    /// timeout_secs = 30
    /// [llm]
    /// model = "gpt-4o-mini"
    /// "#;
    /// let config = ChatGuardConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.timeout_secs, 30);
    /// assert_eq!(config.llm.model, "gpt-4o-mini");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, ChatGuardError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// The run deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check that everything a run needs is present.
    ///
    /// # Errors
    ///
    /// Returns [`ChatGuardError::Config`] naming the first missing value.
    pub fn validate(&self) -> Result<(), ChatGuardError> {
        if self.timeout_secs == 0 {
            return Err(ChatGuardError::Config(
                "timeout must be at least one second".into(),
            ));
        }
        if self.llm.api_key.as_deref().unwrap_or_default().is_empty() {
            return Err(ChatGuardError::Config(
                "OpenAI API key not set. Pass --openai-api-key or set OPENAI_API_KEY".into(),
            ));
        }
        if self.github.token.as_deref().unwrap_or_default().is_empty() {
            return Err(ChatGuardError::Config(
                "GitHub token not set. Pass --github-token or set GITHUB_TOKEN".into(),
            ));
        }
        if self.github.graphql_url.trim().is_empty() {
            return Err(ChatGuardError::Config("GraphQL endpoint is empty".into()));
        }
        Ok(())
    }
}

/// Chat completion provider configuration.
///
/// # Examples
///
/// ```
/// use chatguard_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert!(config.api_key.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the provider.
    pub api_key: Option<String>,
    /// Custom base URL for an OpenAI-compatible API.
    pub base_url: Option<String>,
}

fn default_model() -> String {
    "gpt-3.5-turbo".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: None,
        }
    }
}

/// GitHub GraphQL configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Token sent as `Authorization: bearer <token>`.
    pub token: Option<String>,
    /// GraphQL endpoint (default: `https://api.github.com/graphql`).
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,
}

fn default_graphql_url() -> String {
    "https://api.github.com/graphql".into()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            graphql_url: default_graphql_url(),
        }
    }
}

/// Split an `owner/name` repository slug.
///
/// # Errors
///
/// Returns [`ChatGuardError::Config`] if either part is missing.
///
/// # Examples
///
/// ```
/// use chatguard_core::parse_repository;
///
/// let (owner, name) = parse_repository("octocat/hello-world").unwrap();
/// assert_eq!(owner, "octocat");
/// assert_eq!(name, "hello-world");
/// ```
pub fn parse_repository(slug: &str) -> Result<(String, String), ChatGuardError> {
    match slug.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner.to_string(), name.to_string()))
        }
        _ => Err(ChatGuardError::Config(format!(
            "invalid repository '{slug}', expected owner/name"
        ))),
    }
}
