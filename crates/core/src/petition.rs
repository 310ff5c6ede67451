//! Petition ("wish") and signature entities.
//!
//! A [`Petition`] owns its signatures by containment. Signatures are only
//! ever appended, so `signatures.len()` is the support count. Neither
//! entity is edited or deleted after creation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::moderation;
use crate::types::{EntityId, EpochMillis};

/// Author shown when the submitter leaves the field blank.
pub const ANONYMOUS_AUTHOR: &str = "匿名爆米花";

/// How far ahead of the receiving clock a client-stamped time may be.
pub const MAX_CLOCK_SKEW_MS: EpochMillis = 24 * 60 * 60 * 1000;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A single supporter's endorsement of a petition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub timestamp: EpochMillis,
}

/// A user-submitted wish that others can sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Petition {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    /// Self-contained encoded image (data URL), if one was attached.
    pub image_url: Option<String>,
    pub author: String,
    pub created_at: EpochMillis,
    /// Append-only, in submission order.
    #[serde(default)]
    pub signatures: Vec<Signature>,
}

impl Petition {
    /// Number of accepted signatures.
    pub fn support_count(&self) -> usize {
        self.signatures.len()
    }

    /// Append a signature, preserving submission order.
    pub fn append_signature(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }

    /// The last `n` signatures, newest first.
    pub fn recent_signatures(&self, n: usize) -> impl Iterator<Item = &Signature> {
        self.signatures.iter().rev().take(n)
    }
}

// ---------------------------------------------------------------------------
// Input DTOs
// ---------------------------------------------------------------------------

/// Fields a submitter fills in when creating a petition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub author: String,
}

impl PetitionDraft {
    /// Run moderation and required-field checks.
    ///
    /// Moderation sees the author exactly as typed, before the anonymous
    /// placeholder is substituted.
    pub fn validate(&self) -> Result<(), CoreError> {
        moderation::ensure_allowed(&self.title, &self.description, &self.author)?;
        require_non_empty("title", &self.title)?;
        require_non_empty("description", &self.description)?;
        Ok(())
    }

    /// Validate the draft and build a petition with no signatures.
    pub fn into_petition(
        self,
        id: EntityId,
        created_at: EpochMillis,
    ) -> Result<Petition, CoreError> {
        self.validate()?;
        Ok(Petition {
            id,
            title: self.title,
            description: self.description,
            image_url: self.image_url.filter(|url| !url.is_empty()),
            author: author_or_anonymous(&self.author),
            created_at,
            signatures: Vec::new(),
        })
    }
}

/// Fields a signer supplies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl SignerDetails {
    /// All three fields are required.
    pub fn validate(&self) -> Result<(), CoreError> {
        require_non_empty("firstName", &self.first_name)?;
        require_non_empty("lastName", &self.last_name)?;
        require_non_empty("email", &self.email)?;
        Ok(())
    }

    /// Validate and stamp the signer's details into a [`Signature`].
    pub fn into_signature(
        self,
        id: EntityId,
        timestamp: EpochMillis,
    ) -> Result<Signature, CoreError> {
        self.validate()?;
        Ok(Signature {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            timestamp,
        })
    }
}

/// Validate a fully-formed signature received over the wire.
pub fn validate_signature(signature: &Signature) -> Result<(), CoreError> {
    require_non_empty("id", &signature.id)?;
    require_non_empty("firstName", &signature.first_name)?;
    require_non_empty("lastName", &signature.last_name)?;
    require_non_empty("email", &signature.email)?;
    Ok(())
}

/// Substitute the anonymous placeholder for a blank author.
pub fn author_or_anonymous(author: &str) -> String {
    if author.trim().is_empty() {
        ANONYMOUS_AUTHOR.to_string()
    } else {
        author.to_string()
    }
}

/// Reject a client-stamped time that is negative or more than
/// [`MAX_CLOCK_SKEW_MS`] past `now`.
pub fn check_timestamp(field: &str, value: EpochMillis, now: EpochMillis) -> Result<(), CoreError> {
    if value < 0 || value > now.saturating_add(MAX_CLOCK_SKEW_MS) {
        return Err(CoreError::Validation(format!("{field} is out of range")));
    }
    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// How a petition listing is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    /// Most signatures first; ties keep their existing order.
    #[default]
    Popular,
    /// Most recently created first.
    Newest,
}

/// Return references to `petitions` in the requested order.
pub fn sort_petitions(petitions: &[Petition], order: SortOrder) -> Vec<&Petition> {
    let mut sorted: Vec<&Petition> = petitions.iter().collect();
    match order {
        SortOrder::Popular => sorted.sort_by(|a, b| b.support_count().cmp(&a.support_count())),
        SortOrder::Newest => sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
    sorted
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn draft(title: &str, author: &str) -> PetitionDraft {
        PetitionDraft {
            title: title.to_string(),
            description: "一起去看演唱会".to_string(),
            image_url: None,
            author: author.to_string(),
        }
    }

    fn signer(first: &str) -> SignerDetails {
        SignerDetails {
            first_name: first.to_string(),
            last_name: "王".to_string(),
            email: "fan@example.com".to_string(),
        }
    }

    fn petition(id: &str, created_at: EpochMillis, signatures: usize) -> Petition {
        let mut p = draft("心愿", "爆米花")
            .into_petition(id.to_string(), created_at)
            .unwrap();
        for i in 0..signatures {
            p.append_signature(signer("小").into_signature(format!("{id}-{i}"), 0).unwrap());
        }
        p
    }

    #[test]
    fn new_petition_starts_without_signatures() {
        let p = draft("巡演请愿", "爆米花")
            .into_petition("p1".into(), 42)
            .unwrap();
        assert_eq!(p.support_count(), 0);
        assert_eq!(p.created_at, 42);
        assert_eq!(p.author, "爆米花");
    }

    #[test]
    fn blank_author_becomes_anonymous() {
        let p = draft("巡演请愿", "  ").into_petition("p1".into(), 1).unwrap();
        assert_eq!(p.author, ANONYMOUS_AUTHOR);
    }

    #[test]
    fn blocked_title_is_rejected() {
        let err = draft("单飞请愿", "").into_petition("p1".into(), 1).unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn missing_title_is_rejected() {
        let err = draft("", "a").into_petition("p1".into(), 1).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("title"));
    }

    #[test]
    fn empty_image_is_treated_as_absent() {
        let mut d = draft("巡演请愿", "");
        d.image_url = Some(String::new());
        assert_eq!(d.into_petition("p1".into(), 1).unwrap().image_url, None);
    }

    #[test]
    fn signer_requires_every_field() {
        let mut s = signer("小");
        s.email = " ".into();
        assert_matches!(
            s.into_signature("s1".into(), 1),
            Err(CoreError::Validation(msg)) if msg.contains("email")
        );
    }

    #[test]
    fn signatures_keep_insertion_order() {
        let mut p = petition("p", 1, 0);
        for i in 0..5 {
            p.append_signature(signer(&i.to_string()).into_signature(i.to_string(), i).unwrap());
        }
        let order: Vec<_> = p.signatures.iter().map(|s| s.first_name.as_str()).collect();
        assert_eq!(order, ["0", "1", "2", "3", "4"]);
        assert_eq!(p.support_count(), 5);
    }

    #[test]
    fn timestamps_must_be_non_negative_and_not_far_ahead() {
        let now = 1_700_000_000_000;
        assert!(check_timestamp("createdAt", now, now).is_ok());
        assert!(check_timestamp("createdAt", now + MAX_CLOCK_SKEW_MS, now).is_ok());
        assert_matches!(
            check_timestamp("createdAt", -1, now),
            Err(CoreError::Validation(msg)) if msg.contains("createdAt")
        );
        assert_matches!(
            check_timestamp("timestamp", EpochMillis::MAX, now),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn recent_signatures_are_newest_first() {
        let p = petition("p", 1, 7);
        let recent: Vec<_> = p.recent_signatures(3).map(|s| s.id.as_str()).collect();
        assert_eq!(recent, ["p-6", "p-5", "p-4"]);
    }

    #[test]
    fn popular_sort_is_stable_on_ties() {
        let list = vec![petition("a", 3, 1), petition("b", 2, 4), petition("c", 1, 1)];
        let ids: Vec<_> = sort_petitions(&list, SortOrder::Popular)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn newest_sort_orders_by_creation_time() {
        let list = vec![petition("a", 1, 0), petition("b", 3, 0), petition("c", 2, 0)];
        let ids: Vec<_> = sort_petitions(&list, SortOrder::Newest)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn wire_format_is_camel_case_with_null_image() {
        let p = petition("p1", 5, 0);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["createdAt"], 5);
        assert!(json["imageUrl"].is_null());
        assert!(json["signatures"].as_array().unwrap().is_empty());
    }

    #[test]
    fn creation_payload_without_signatures_deserializes() {
        let p: Petition = serde_json::from_value(serde_json::json!({
            "id": "1", "title": "t", "description": "d",
            "imageUrl": null, "author": "a", "createdAt": 9
        }))
        .unwrap();
        assert!(p.signatures.is_empty());
    }
}
