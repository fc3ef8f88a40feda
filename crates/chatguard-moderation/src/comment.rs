/// Compose the moderation comment for negative content.
///
/// `artifact_kind` appears twice, once in the body and once in the footer;
/// `user_login` is mentioned with a leading `@`.
///
/// # Examples
///
/// ```
/// use chatguard_moderation::comment::compose;
///
/// let body = compose("issue", "spam", "Promotional links.", "bob");
/// assert!(body.contains("identified as spam"));
/// assert!(body.contains("@bob"));
/// ```
pub fn compose(artifact_kind: &str, kind: &str, explanation: &str, user_login: &str) -> String {
    format!(
        "\u{1f6e1}\u{fe0f} ChatGuard Analysis: The content has been reviewed, and based on \
         sentiment analysis, it has been identified as {kind}.\n\
         \n\
         Explanation: {explanation}\n\
         \n\
         This {artifact_kind} has been labeled accordingly for further review.\n\
         \n\
         @{user_login} please ensure future contributions align with our community \
         guidelines. Thank you! \u{1f680}\n\
         \n\
         *Note: This message is generated automatically, and the labels were assigned \
         based on the analysis of the {artifact_kind}'s content.*"
    )
}
