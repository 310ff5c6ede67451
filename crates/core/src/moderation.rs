//! Substring block-list moderation for user-submitted petitions.
//!
//! The check is a plain case-insensitive substring scan over the
//! space-joined title, description, and author. There is no word-boundary
//! logic: a blocked entry embedded inside a longer word still matches.
//! Signatures are not moderated.

use crate::error::CoreError;

/// Disallowed substrings, matched case-insensitively.
pub const BLOCK_LIST: &[&str] = &["单飞", "df", "解散", "DF", "sf"];

/// Message shown to the submitter when moderation rejects a petition.
pub const BLOCKED_CONTENT_MESSAGE: &str =
    "提交失败：内容包含敏感词汇，请修改后重试。为了维护良好的社区环境，请礼貌发言。";

/// Return the first block-list entry contained in `text`, if any.
///
/// Both `text` and the entries are lowercased before comparison.
pub fn check_blocked(text: &str) -> Option<&'static str> {
    let haystack = text.to_lowercase();
    BLOCK_LIST
        .iter()
        .copied()
        .find(|word| haystack.contains(&word.to_lowercase()))
}

/// Join the moderated fields the way the submission form does.
pub fn moderated_text(title: &str, description: &str, author: &str) -> String {
    format!("{title} {description} {author}")
}

/// Reject a petition whose title, description, or author hits the block-list.
pub fn ensure_allowed(title: &str, description: &str, author: &str) -> Result<(), CoreError> {
    match check_blocked(&moderated_text(title, description, author)) {
        Some(_) => Err(CoreError::Validation(BLOCKED_CONTENT_MESSAGE.to_string())),
        None => Ok(()),
    }
}
