//! Webhook event handling for ChatGuard.
//!
//! Maps event names to artifact kinds and turns the raw event documents of
//! `issues`, `issue_comment`, `pull_request`, `discussion` and
//! `discussion_comment` webhooks into a single [`Payload`](chatguard_core::Payload).

pub mod artifact;
pub mod normalize;

pub use artifact::{artifact_kind, EventShape};
pub use normalize::{normalize, normalize_file, normalize_reader};
