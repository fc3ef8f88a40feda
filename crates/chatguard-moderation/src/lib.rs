//! Moderation pipeline: sentiment classification and comment publishing.
//!
//! Provides the chat completion client, the classifier prompt, the
//! sentiment classifier adapter, the moderation comment template, the
//! GitHub GraphQL publisher, and the orchestrating pipeline.

pub mod classifier;
pub mod comment;
pub mod github;
pub mod llm;
pub mod pipeline;
pub mod prompt;
