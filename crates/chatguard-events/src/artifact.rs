/// Map an event name to the artifact kind it refers to.
///
/// The result is both the key of the payload object inside the event
/// document and the noun used in the moderation comment. Names outside the
/// fixed table pass through unchanged.
///
/// # Examples
///
/// ```
/// use chatguard_events::artifact_kind;
///
/// assert_eq!(artifact_kind("issues"), "issue");
/// assert_eq!(artifact_kind("discussion_comment"), "comment");
/// assert_eq!(artifact_kind("pull_request"), "pull_request");
/// ```
pub fn artifact_kind(event_name: &str) -> &str {
    match event_name {
        "issues" => "issue",
        "issue_comment" | "discussion_comment" => "comment",
        other => other,
    }
}

/// Layout of an event document, selected by event name.
///
/// # Examples
///
/// ```
/// use chatguard_events::EventShape;
///
/// let shape = EventShape::for_event("issue_comment");
/// assert_eq!(shape.key(), "comment");
/// assert_eq!(shape.container(), Some("issue"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventShape<'a> {
    /// The object under `key` is itself the comment target.
    TopLevel {
        /// Key of the payload object.
        key: &'a str,
    },
    /// The object under `key` is a comment; the target sits under `container`.
    Comment {
        /// Key of the comment object.
        key: &'a str,
        /// Key of the sibling object that receives the moderation comment.
        container: &'static str,
    },
}

impl<'a> EventShape<'a> {
    /// Resolve the shape for `event_name`.
    pub fn for_event(event_name: &'a str) -> Self {
        let key = artifact_kind(event_name);
        match event_name {
            "issue_comment" => EventShape::Comment {
                key,
                container: "issue",
            },
            "discussion_comment" => EventShape::Comment {
                key,
                container: "discussion",
            },
            _ => EventShape::TopLevel { key },
        }
    }

    /// Key of the payload object.
    pub fn key(&self) -> &'a str {
        match self {
            EventShape::TopLevel { key } | EventShape::Comment { key, .. } => *key,
        }
    }

    /// Key of the containing object, for comment events.
    pub fn container(&self) -> Option<&'static str> {
        match self {
            EventShape::TopLevel { .. } => None,
            EventShape::Comment { container, .. } => Some(*container),
        }
    }
}
