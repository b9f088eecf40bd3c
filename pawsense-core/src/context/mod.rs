//! Assessment context shared across screens
//!
//! One assessment session spans several screens (subject selection,
//! questionnaire, photo capture). The context records what has been
//! decided so far and is persisted between them. The submission pipeline
//! only reads it, to validate subject-kind consistency before uploading;
//! the surrounding app owns its lifecycle.

mod store;

use serde::{Deserialize, Serialize};

pub use store::{ContextStore, FileContextStore, MemoryContextStore};

/// Kind of animal being assessed, normalized from free-text species input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectKind {
    Canine,
    Feline,
}

/// Known synonyms, matched case-insensitively as substrings.
const CANINE_HINTS: &[&str] = &["dog", "canine", "puppy"];
const FELINE_HINTS: &[&str] = &["cat", "feline", "kitten"];

impl SubjectKind {
    /// Normalize a free-text species hint.
    ///
    /// Matches case-insensitively against known synonyms, substring
    /// included, so "Dog", "my dog rex" and "CANINE" all resolve to
    /// `Canine`. Returns `None` for anything unrecognized.
    pub fn from_hint(hint: &str) -> Option<Self> {
        let lower = hint.to_lowercase();
        if CANINE_HINTS.iter().any(|s| lower.contains(s)) {
            Some(Self::Canine)
        } else if FELINE_HINTS.iter().any(|s| lower.contains(s)) {
            Some(Self::Feline)
        } else {
            None
        }
    }
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Canine => write!(f, "canine"),
            Self::Feline => write!(f, "feline"),
        }
    }
}

/// Whether the subject is a registered pet in the user's account.
///
/// Governs which downstream screens are reachable; `Unknown` until the
/// user has answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Registration {
    Yes,
    No,
    #[default]
    Unknown,
}

/// Persisted record of an in-progress assessment session.
///
/// Stored as a JSON blob under a well-known key; field names match the
/// stored shape (camelCase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentContext {
    /// Normalized subject kind for the active flow.
    pub subject_kind: SubjectKind,
    /// Identifier of a registered subject; absent for ad-hoc subjects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    /// Display name of a registered subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    /// Tri-state registration answer.
    #[serde(default)]
    pub is_subject_registered: Registration,
    /// Set only after the full questionnaire finishes.
    #[serde(default)]
    pub questions_completed: bool,
}

impl AssessmentContext {
    /// Create a fresh context for a newly chosen subject kind.
    pub fn new(subject_kind: SubjectKind) -> Self {
        Self {
            subject_kind,
            subject_id: None,
            subject_name: None,
            is_subject_registered: Registration::Unknown,
            questions_completed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hint_recognizes_canine_synonyms() {
        assert_eq!(SubjectKind::from_hint("dog"), Some(SubjectKind::Canine));
        assert_eq!(SubjectKind::from_hint("Dog"), Some(SubjectKind::Canine));
        assert_eq!(SubjectKind::from_hint("CANINE"), Some(SubjectKind::Canine));
        assert_eq!(
            SubjectKind::from_hint("my dog rex"),
            Some(SubjectKind::Canine)
        );
        assert_eq!(SubjectKind::from_hint("puppy"), Some(SubjectKind::Canine));
    }

    #[test]
    fn from_hint_recognizes_feline_synonyms() {
        assert_eq!(SubjectKind::from_hint("cat"), Some(SubjectKind::Feline));
        assert_eq!(SubjectKind::from_hint("Feline"), Some(SubjectKind::Feline));
        assert_eq!(SubjectKind::from_hint("kitten"), Some(SubjectKind::Feline));
    }

    #[test]
    fn from_hint_rejects_unrecognized_species() {
        assert_eq!(SubjectKind::from_hint("parrot"), None);
        assert_eq!(SubjectKind::from_hint(""), None);
    }

    #[test]
    fn context_serializes_with_camel_case_keys() {
        let ctx = AssessmentContext {
            subject_kind: SubjectKind::Feline,
            subject_id: Some("pet-42".into()),
            subject_name: Some("Misu".into()),
            is_subject_registered: Registration::Yes,
            questions_completed: true,
        };

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["subjectKind"], "Feline");
        assert_eq!(json["subjectId"], "pet-42");
        assert_eq!(json["isSubjectRegistered"], "yes");
        assert_eq!(json["questionsCompleted"], true);
    }

    #[test]
    fn context_deserializes_with_missing_optional_fields() {
        let json = r#"{ "subjectKind": "Canine" }"#;
        let ctx: AssessmentContext = serde_json::from_str(json).unwrap();

        assert_eq!(ctx.subject_kind, SubjectKind::Canine);
        assert!(ctx.subject_id.is_none());
        assert_eq!(ctx.is_subject_registered, Registration::Unknown);
        assert!(!ctx.questions_completed);
    }

    #[test]
    fn new_context_starts_unregistered_and_unanswered() {
        let ctx = AssessmentContext::new(SubjectKind::Canine);
        assert_eq!(ctx.is_subject_registered, Registration::Unknown);
        assert!(!ctx.questions_completed);
        assert!(ctx.subject_id.is_none());
        assert!(ctx.subject_name.is_none());
    }
}
