use std::fmt;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use chatguard_core::{AnalysisRequest, ChatGuardError, Payload, Stage};
use chatguard_events::artifact_kind;
use serde_json::Value;
use tokio::time::{timeout_at, Instant};
use tracing::info;

use crate::classifier::SentimentClassifier;
use crate::comment;
use crate::github::{CommentPublisher, CommentTarget};

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Content judged positive; nothing was posted.
    Positive,
    /// A moderation comment was posted on `target`.
    Published {
        /// Object that received the comment.
        target: CommentTarget,
    },
    /// Content judged negative, but publishing was disabled.
    DryRun {
        /// Object that would have received the comment.
        target: CommentTarget,
        /// Comment that would have been posted.
        body: String,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Positive => write!(f, "content has a positive sentiment, no action taken"),
            Outcome::Published { target } => {
                write!(f, "moderation comment posted on {}", target.id())
            }
            Outcome::DryRun { target, .. } => write!(
                f,
                "dry run: moderation comment for {} not posted",
                target.id()
            ),
        }
    }
}

/// A failed run: the stage that failed and why.
#[derive(Debug, thiserror::Error)]
#[error("{stage}: {source}")]
pub struct PipelineError {
    /// Stage the failure happened in.
    pub stage: Stage,
    /// Underlying error, unchanged in kind.
    #[source]
    pub source: ChatGuardError,
}

impl PipelineError {
    fn new(stage: Stage, source: ChatGuardError) -> Self {
        Self { stage, source }
    }

    /// The underlying error.
    pub fn kind(&self) -> &ChatGuardError {
        &self.source
    }
}

/// Single-pass moderation run: normalize, classify, then comment on
/// negative content.
///
/// Every network call runs under one deadline fixed when the run starts.
/// Nothing is retried.
pub struct ModerationPipeline<C, P> {
    classifier: C,
    publisher: P,
    timeout: Duration,
    dry_run: bool,
}

impl<C, P> ModerationPipeline<C, P>
where
    C: SentimentClassifier,
    P: CommentPublisher,
{
    /// Create a pipeline whose runs must finish within `timeout`.
    pub fn new(classifier: C, publisher: P, timeout: Duration) -> Self {
        Self {
            classifier,
            publisher,
            timeout,
            dry_run: false,
        }
    }

    /// Compose the comment for negative content but do not post it.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run on a decoded event document.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] labelled with the failing stage.
    pub async fn run(&self, event_name: &str, event: &Value) -> Result<Outcome, PipelineError> {
        let deadline = Instant::now() + self.timeout;
        let payload = chatguard_events::normalize(event_name, event)
            .map_err(|e| PipelineError::new(Stage::Normalize, e))?;
        self.moderate(event_name, &payload, deadline).await
    }

    /// Run on the event document stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] labelled with the failing stage.
    pub async fn run_file(&self, event_name: &str, path: &Path) -> Result<Outcome, PipelineError> {
        let deadline = Instant::now() + self.timeout;
        let payload = chatguard_events::normalize_file(event_name, path)
            .map_err(|e| PipelineError::new(Stage::Normalize, e))?;
        self.moderate(event_name, &payload, deadline).await
    }

    /// Classify an already normalized payload and act on the verdict.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] for the classify or publish stage.
    pub async fn moderate(
        &self,
        event_name: &str,
        payload: &Payload,
        deadline: Instant,
    ) -> Result<Outcome, PipelineError> {
        info!(
            event = event_name,
            node_id = %payload.node_id,
            parent_id = %payload.parent_id,
            "event normalized"
        );

        let request = AnalysisRequest::from_payload(event_name, payload);
        let result = within(deadline, Stage::Classify, self.classifier.analyze(&request)).await?;
        info!(sentiment = %result.sentiment, kind = %result.kind, "content classified");

        if !result.is_negative() {
            info!("content has a positive sentiment");
            return Ok(Outcome::Positive);
        }

        let target = CommentTarget::for_event(event_name, payload.parent_id.as_str());
        let body = comment::compose(
            artifact_kind(event_name),
            &result.kind,
            &result.explanation,
            &payload.user_login,
        );

        if self.dry_run {
            info!(target = target.id(), "dry run, skipping publish");
            return Ok(Outcome::DryRun { target, body });
        }

        within(
            deadline,
            Stage::Publish,
            self.publisher.publish(&target, &body),
        )
        .await?;
        info!(
            mutation = target.mutation_name(),
            target = target.id(),
            "moderation comment published"
        );
        Ok(Outcome::Published { target })
    }
}

async fn within<T, F>(deadline: Instant, stage: Stage, call: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, ChatGuardError>>,
{
    match timeout_at(deadline, call).await {
        Ok(result) => result.map_err(|e| PipelineError::new(stage, e)),
        Err(_) => Err(PipelineError::new(
            stage,
            ChatGuardError::DeadlineExceeded { stage },
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatguard_core::{AnalysisResult, Sentiment};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    enum Verdict {
        Result(AnalysisResult),
        Empty,
        Hang,
        Slow(AnalysisResult, Duration),
    }

    struct FakeClassifier {
        verdict: Verdict,
        seen: Arc<Mutex<Vec<AnalysisRequest>>>,
    }

    impl FakeClassifier {
        fn returning(sentiment: Sentiment, kind: &str, explanation: &str) -> Self {
            Self::with(Verdict::Result(AnalysisResult {
                sentiment,
                kind: kind.into(),
                explanation: explanation.into(),
            }))
        }

        fn with(verdict: Verdict) -> Self {
            Self {
                verdict,
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl SentimentClassifier for FakeClassifier {
        async fn analyze(
            &self,
            request: &AnalysisRequest,
        ) -> Result<AnalysisResult, ChatGuardError> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.verdict {
                Verdict::Result(result) => Ok(result.clone()),
                Verdict::Empty => Err(ChatGuardError::EmptyResponse),
                Verdict::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(ChatGuardError::EmptyResponse)
                }
                Verdict::Slow(result, delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(result.clone())
                }
            }
        }
    }

    #[derive(Default)]
    struct FakePublisher {
        calls: Arc<Mutex<Vec<(CommentTarget, String)>>>,
        fail_with: Option<String>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl CommentPublisher for FakePublisher {
        async fn publish(&self, target: &CommentTarget, body: &str) -> Result<(), ChatGuardError> {
            self.calls
                .lock()
                .unwrap()
                .push((target.clone(), body.to_string()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.fail_with {
                Some(message) => Err(ChatGuardError::GraphQl(message.clone())),
                None => Ok(()),
            }
        }
    }

    fn issue_comment_event() -> Value {
        json!({
            "action": "created",
            "comment": {"node_id": "C_1", "body": "spam!!"},
            "issue": {"node_id": "I_1", "title": "Bug"},
            "sender": {"login": "bob"}
        })
    }

    fn discussion_event() -> Value {
        json!({
            "discussion": {"node_id": "D_1", "title": "T", "body": "B"},
            "sender": {"login": "alice"}
        })
    }

    fn pipeline(
        classifier: FakeClassifier,
        publisher: FakePublisher,
    ) -> ModerationPipeline<FakeClassifier, FakePublisher> {
        ModerationPipeline::new(classifier, publisher, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn positive_sentiment_never_publishes() {
        let publisher = FakePublisher::default();
        let calls = publisher.calls.clone();
        let p = pipeline(
            FakeClassifier::returning(Sentiment::Positive, "", ""),
            publisher,
        );

        let outcome = p.run("issue_comment", &issue_comment_event()).await.unwrap();

        assert_eq!(outcome, Outcome::Positive);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn positive_with_stray_type_is_ignored() {
        let publisher = FakePublisher::default();
        let calls = publisher.calls.clone();
        let p = pipeline(
            FakeClassifier::returning(Sentiment::Positive, "spam", "odd"),
            publisher,
        );

        assert_eq!(
            p.run("discussion", &discussion_event()).await.unwrap(),
            Outcome::Positive
        );
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn negative_issue_comment_targets_issue() {
        let publisher = FakePublisher::default();
        let calls = publisher.calls.clone();
        let p = pipeline(
            FakeClassifier::returning(Sentiment::Negative, "spam", "Repeated links."),
            publisher,
        );

        let outcome = p.run("issue_comment", &issue_comment_event()).await.unwrap();

        let target = CommentTarget::Subject("I_1".into());
        assert_eq!(
            outcome,
            Outcome::Published {
                target: target.clone()
            }
        );
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, target);
        assert!(calls[0].1.contains("identified as spam"));
        assert!(calls[0].1.contains("@bob"));
        assert_eq!(calls[0].1.matches("comment").count(), 2);
    }

    #[tokio::test]
    async fn negative_discussion_uses_discussion_target() {
        let publisher = FakePublisher::default();
        let calls = publisher.calls.clone();
        let p = pipeline(
            FakeClassifier::returning(Sentiment::Negative, "insult", "Name calling."),
            publisher,
        );

        p.run("discussion", &discussion_event()).await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].0, CommentTarget::Discussion("D_1".into()));
    }

    #[tokio::test]
    async fn classifier_sees_event_name_title_and_body() {
        let classifier = FakeClassifier::returning(Sentiment::Positive, "", "");
        let seen = classifier.seen.clone();
        let p = pipeline(classifier, FakePublisher::default());

        p.run("discussion", &discussion_event()).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen[0],
            AnalysisRequest {
                kind: "discussion".into(),
                title: "T".into(),
                content: "B".into(),
            }
        );
    }

    #[tokio::test]
    async fn normalize_failure_skips_classifier() {
        let classifier = FakeClassifier::returning(Sentiment::Negative, "spam", "x");
        let seen = classifier.seen.clone();
        let p = pipeline(classifier, FakePublisher::default());

        let err = p
            .run("issue_comment", &json!({"comment": {"node_id": "C_1"}}))
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::Normalize);
        assert!(matches!(err.kind(), ChatGuardError::MalformedEvent(_)));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_response_stops_before_publish() {
        let publisher = FakePublisher::default();
        let calls = publisher.calls.clone();
        let p = pipeline(FakeClassifier::with(Verdict::Empty), publisher);

        let err = p
            .run("issue_comment", &issue_comment_event())
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::Classify);
        assert!(matches!(err.kind(), ChatGuardError::EmptyResponse));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn publisher_error_is_labelled() {
        let publisher = FakePublisher {
            fail_with: Some(r#"{"message":"not found"}"#.into()),
            ..FakePublisher::default()
        };
        let p = pipeline(
            FakeClassifier::returning(Sentiment::Negative, "spam", "x"),
            publisher,
        );

        let err = p
            .run("issue_comment", &issue_comment_event())
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::Publish);
        assert!(err.to_string().starts_with("publish: GraphQL error"));
        assert!(err.kind().to_string().contains("not found"));
    }

    #[tokio::test]
    async fn deadline_aborts_slow_classifier() {
        let publisher = FakePublisher::default();
        let calls = publisher.calls.clone();
        let p = ModerationPipeline::new(
            FakeClassifier::with(Verdict::Hang),
            publisher,
            Duration::from_millis(50),
        );

        let err = p
            .run("issue_comment", &issue_comment_event())
            .await
            .unwrap_err();

        assert!(matches!(
            err.kind(),
            ChatGuardError::DeadlineExceeded {
                stage: Stage::Classify
            }
        ));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn publisher_only_gets_time_left_by_classifier() {
        let publisher = FakePublisher {
            delay: Some(Duration::from_millis(80)),
            ..FakePublisher::default()
        };
        let calls = publisher.calls.clone();
        let classifier = FakeClassifier::with(Verdict::Slow(
            AnalysisResult {
                sentiment: Sentiment::Negative,
                kind: "spam".into(),
                explanation: "x".into(),
            },
            Duration::from_millis(80),
        ));
        let p = ModerationPipeline::new(classifier, publisher, Duration::from_millis(120));

        let err = p
            .run("issue_comment", &issue_comment_event())
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::Publish);
        assert!(matches!(
            err.kind(),
            ChatGuardError::DeadlineExceeded {
                stage: Stage::Publish
            }
        ));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dry_run_composes_without_publishing() {
        let publisher = FakePublisher::default();
        let calls = publisher.calls.clone();
        let p = pipeline(
            FakeClassifier::returning(Sentiment::Negative, "spam", "x"),
            publisher,
        )
        .with_dry_run(true);

        let outcome = p.run("issue_comment", &issue_comment_event()).await.unwrap();

        match outcome {
            Outcome::DryRun { target, body } => {
                assert_eq!(target, CommentTarget::Subject("I_1".into()));
                assert!(body.contains("@bob"));
            }
            other => panic!("expected dry run, got {other:?}"),
        }
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_file_reads_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(&path, discussion_event().to_string()).unwrap();
        let p = pipeline(
            FakeClassifier::returning(Sentiment::Positive, "", ""),
            FakePublisher::default(),
        );

        assert_eq!(
            p.run_file("discussion", &path).await.unwrap(),
            Outcome::Positive
        );
    }
}
