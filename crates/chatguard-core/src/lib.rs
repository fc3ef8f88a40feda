//! Core types, configuration, and error handling for ChatGuard.
//!
//! This crate provides the shared foundation used by the other ChatGuard crates:
//! - [`ChatGuardError`]: unified error type using `thiserror`
//! - [`ChatGuardConfig`]: configuration loaded from `.chatguard.toml`
//! - Shared types: [`Payload`], [`AnalysisRequest`], [`AnalysisResult`], [`Sentiment`]

mod config;
mod error;
mod types;

pub use config::{parse_repository, ChatGuardConfig, GitHubConfig, LlmConfig};
pub use error::{ChatGuardError, Stage};
pub use types::{AnalysisRequest, AnalysisResult, Payload, Sentiment};
