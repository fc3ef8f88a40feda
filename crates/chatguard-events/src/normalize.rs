use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chatguard_core::{ChatGuardError, Payload};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::artifact::EventShape;

/// The issue, pull request, discussion or comment an event describes.
#[derive(Deserialize)]
struct ArtifactObject {
    node_id: String,
    #[serde(default, deserialize_with = "string_or_none")]
    title: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    body: Option<String>,
}

// Optional text fields of any other JSON type read as absent.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}

/// The issue or discussion a comment belongs to.
#[derive(Deserialize)]
struct ContainerRef {
    node_id: String,
}

#[derive(Deserialize)]
struct Actor {
    #[serde(default)]
    login: Option<String>,
}

/// Normalize a decoded event document delivered under `event_name`.
///
/// # Errors
///
/// Returns [`ChatGuardError::UnrecognizedEvent`] if the document has no
/// object under the event's artifact key, and [`ChatGuardError::MalformedEvent`]
/// if a required `node_id` is missing, empty or not a string.
///
/// # Examples
///
/// ```
/// use chatguard_events::normalize;
/// use serde_json::json;
///
/// let event = json!({
///     "comment": {"node_id": "IC_1", "body": "spam!!"},
///     "issue": {"node_id": "I_1"},
///     "sender": {"login": "bob"}
/// });
/// let payload = normalize("issue_comment", &event).unwrap();
/// assert_eq!(payload.node_id, "IC_1");
/// assert_eq!(payload.parent_id, "I_1");
/// assert_eq!(payload.user_login, "bob");
/// ```
pub fn normalize(event_name: &str, event: &Value) -> Result<Payload, ChatGuardError> {
    let root = event.as_object().ok_or_else(|| {
        ChatGuardError::MalformedEvent(format!("{event_name} event is not a JSON object"))
    })?;

    let shape = EventShape::for_event(event_name);
    let object = root
        .get(shape.key())
        .ok_or_else(|| ChatGuardError::UnrecognizedEvent(event_name.to_string()))?;
    let artifact = ArtifactObject::deserialize(object)
        .map_err(|e| ChatGuardError::MalformedEvent(format!("`{}` object: {e}", shape.key())))?;
    require_id(&artifact.node_id, shape.key())?;

    let parent_id = match shape.container() {
        None => artifact.node_id.clone(),
        Some(container) => {
            let value = root.get(container).ok_or_else(|| {
                ChatGuardError::MalformedEvent(format!(
                    "{event_name} event has no `{container}` object"
                ))
            })?;
            let parent = ContainerRef::deserialize(value).map_err(|e| {
                ChatGuardError::MalformedEvent(format!("`{container}` object: {e}"))
            })?;
            require_id(&parent.node_id, container)?;
            parent.node_id
        }
    };

    let payload = Payload {
        node_id: artifact.node_id,
        parent_id,
        title: artifact.title,
        body: artifact.body.unwrap_or_default(),
        user_login: actor_login(root).unwrap_or_default(),
    };

    debug!(
        event = event_name,
        node_id = %payload.node_id,
        parent_id = %payload.parent_id,
        "normalized event"
    );
    Ok(payload)
}

/// Decode an event document from `reader` and normalize it.
///
/// # Errors
///
/// Returns [`ChatGuardError::MalformedEvent`] if the input is not JSON, plus
/// everything [`normalize`] returns.
pub fn normalize_reader<R: Read>(event_name: &str, reader: R) -> Result<Payload, ChatGuardError> {
    let event: Value = serde_json::from_reader(reader).map_err(|e| {
        ChatGuardError::MalformedEvent(format!("failed to decode {event_name} event: {e}"))
    })?;
    normalize(event_name, &event)
}

/// Read the event document at `path` and normalize it.
///
/// # Errors
///
/// Returns [`ChatGuardError::Io`] if the file cannot be opened, plus
/// everything [`normalize_reader`] returns.
pub fn normalize_file(event_name: &str, path: &Path) -> Result<Payload, ChatGuardError> {
    let file = File::open(path)?;
    normalize_reader(event_name, BufReader::new(file))
}

fn require_id(node_id: &str, key: &str) -> Result<(), ChatGuardError> {
    if node_id.is_empty() {
        return Err(ChatGuardError::MalformedEvent(format!(
            "`{key}` object has an empty node_id"
        )));
    }
    Ok(())
}

// Webhooks carry the actor as `sender`; some fixtures use a top-level `user`.
fn actor_login(root: &serde_json::Map<String, Value>) -> Option<String> {
    ["sender", "user"].iter().find_map(|key| {
        root.get(*key)
            .and_then(|value| Actor::deserialize(value).ok())
            .and_then(|actor| actor.login)
    })
}
