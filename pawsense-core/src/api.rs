//! Inference API wire shapes and response classification
//!
//! The backend reports failures on two channels: HTTP status codes, and a
//! `detail` envelope in the body which may be a structured object or a
//! bare string. A successful status can also carry an in-band error tag,
//! so every reply goes through [`classify`] regardless of status.
//!
//! Classification is a pure function of status + body: the same reply
//! always produces the same outcome.

use serde::{Deserialize, Serialize};

use crate::error::AssessmentError;

/// Error tag the backend uses when no qualifying subject is in the photo.
pub const NO_SUBJECT_TAG: &str = "NO_SUBJECT_DETECTED";

const DEFAULT_NO_SUBJECT_MESSAGE: &str = "No pet detected in the photo";
const DEFAULT_NO_SUBJECT_GUIDANCE: &str = "Take a clear, well-lit photo of your pet's face";
const DEFAULT_INVALID_MESSAGE: &str = "The photo could not be analyzed";
const DEFAULT_INVALID_GUIDANCE: &str = "Try a different photo";
const DEFAULT_UNAVAILABLE_MESSAGE: &str = "The analysis service is temporarily unavailable";
const DEFAULT_UNAVAILABLE_GUIDANCE: &str = "Wait a moment and try again";

/// How much raw body text is carried into a fallback message.
const RAW_SNIPPET_LEN: usize = 200;

/// Successful inference payload.
///
/// Only the fields the client interprets are typed; everything else the
/// model returns rides along in `extra` so the result screen receives the
/// payload unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainAssessment {
    pub pain_level: String,
    pub confidence: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Error envelope: `{ "detail": { ... } }` or `{ "detail": "text" }`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    detail: DetailBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetailBody {
    Structured {
        error_type: Option<String>,
        error_message: Option<String>,
        error_guidance: Option<String>,
    },
    Text(String),
}

/// Detail fields extracted from an error body, shape-independent.
struct Detail {
    tag: Option<String>,
    message: Option<String>,
    guidance: Option<String>,
}

fn parse_detail(body: &str) -> Option<Detail> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    Some(match envelope.detail {
        DetailBody::Structured {
            error_type,
            error_message,
            error_guidance,
        } => Detail {
            tag: error_type,
            message: error_message,
            guidance: error_guidance,
        },
        DetailBody::Text(text) => Detail {
            tag: None,
            message: Some(text),
            guidance: None,
        },
    })
}

fn snippet(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    trimmed.chars().take(RAW_SNIPPET_LEN).collect()
}

/// Classify an HTTP reply into a payload or an [`AssessmentError`].
///
/// Tie-breaks follow the backend's contract:
/// - a parseable structured `detail` takes precedence over generic
///   status-based classification for 400 replies;
/// - a 2xx body is still checked for an in-band error tag before it is
///   accepted as a payload;
/// - unparseable bodies fall back to a message derived from the raw text.
pub fn classify(status: u16, body: &str) -> Result<PainAssessment, AssessmentError> {
    if (200..300).contains(&status) {
        return classify_success_body(body);
    }

    let detail = parse_detail(body);
    match status {
        400 => match detail {
            Some(d) if d.tag.as_deref() == Some(NO_SUBJECT_TAG) => {
                Err(AssessmentError::NoSubjectDetected {
                    message: d.message.unwrap_or_else(|| DEFAULT_NO_SUBJECT_MESSAGE.into()),
                    guidance: d
                        .guidance
                        .unwrap_or_else(|| DEFAULT_NO_SUBJECT_GUIDANCE.into()),
                })
            }
            Some(d) => Err(AssessmentError::InvalidImage {
                message: d.message.unwrap_or_else(|| DEFAULT_INVALID_MESSAGE.into()),
                guidance: d.guidance.unwrap_or_else(|| DEFAULT_INVALID_GUIDANCE.into()),
            }),
            None => Err(AssessmentError::InvalidImage {
                message: snippet(body),
                guidance: DEFAULT_INVALID_GUIDANCE.into(),
            }),
        },
        503 => {
            let d = detail.unwrap_or(Detail {
                tag: None,
                message: None,
                guidance: None,
            });
            Err(AssessmentError::ServiceUnavailable {
                message: d
                    .message
                    .unwrap_or_else(|| DEFAULT_UNAVAILABLE_MESSAGE.into()),
                guidance: d
                    .guidance
                    .unwrap_or_else(|| DEFAULT_UNAVAILABLE_GUIDANCE.into()),
            })
        }
        _ => {
            let message = detail
                .and_then(|d| d.message)
                .unwrap_or_else(|| snippet(body));
            Err(AssessmentError::Unknown(format!("HTTP {status}: {message}")))
        }
    }
}

/// Accept a 2xx body as a payload, honoring the in-band error channel.
fn classify_success_body(body: &str) -> Result<PainAssessment, AssessmentError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|_| AssessmentError::Unknown(format!("unparseable response: {}", snippet(body))))?;

    // The backend can flag a failure in-band even on HTTP 200.
    let tag = value
        .get("error_type")
        .or_else(|| value.get("error"))
        .and_then(|v| v.as_str());
    if let Some(tag) = tag {
        let message = value
            .get("error_message")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let guidance = value
            .get("error_guidance")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        if tag == NO_SUBJECT_TAG {
            return Err(AssessmentError::NoSubjectDetected {
                message: message.unwrap_or_else(|| DEFAULT_NO_SUBJECT_MESSAGE.into()),
                guidance: guidance.unwrap_or_else(|| DEFAULT_NO_SUBJECT_GUIDANCE.into()),
            });
        }
        return Err(AssessmentError::Unknown(
            message.unwrap_or_else(|| format!("service reported error: {tag}")),
        ));
    }

    serde_json::from_value(value)
        .map_err(|_| AssessmentError::Unknown(format!("unexpected payload shape: {}", snippet(body))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_payload_parses() {
        let body = r#"{"pain_level": "mild", "confidence": 0.8}"#;
        let payload = classify(200, body).unwrap();
        assert_eq!(payload.pain_level, "mild");
        assert!((payload.confidence - 0.8).abs() < f64::EPSILON);
        assert!(payload.extra.is_empty());
    }

    #[test]
    fn ok_payload_keeps_extra_fields() {
        let body = r#"{"pain_level": "severe", "confidence": 0.95, "landmarks": [1, 2, 3]}"#;
        let payload = classify(200, body).unwrap();
        assert_eq!(payload.extra["landmarks"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn ok_with_in_band_no_subject_tag_is_no_subject_detected() {
        let body = r#"{"error_type": "NO_SUBJECT_DETECTED", "error_message": "No cat face detected"}"#;
        let err = classify(200, body).unwrap_err();
        assert!(matches!(
            err,
            AssessmentError::NoSubjectDetected { ref message, .. } if message == "No cat face detected"
        ));
    }

    #[test]
    fn ok_with_other_in_band_error_is_unknown() {
        let body = r#"{"error": "MODEL_OVERLOADED", "error_message": "busy"}"#;
        let err = classify(200, body).unwrap_err();
        assert_eq!(err, AssessmentError::Unknown("busy".into()));
    }

    #[test]
    fn ok_with_unparseable_body_is_unknown() {
        let err = classify(200, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, AssessmentError::Unknown(_)));
    }

    #[test]
    fn ok_with_wrong_payload_shape_is_unknown() {
        let err = classify(200, r#"{"something": "else"}"#).unwrap_err();
        assert!(matches!(err, AssessmentError::Unknown(_)));
    }

    #[test]
    fn tagged_400_is_no_subject_detected_with_extracted_detail() {
        let body = r#"{"detail": {"error_type": "NO_SUBJECT_DETECTED",
            "error_message": "No cat face detected",
            "error_guidance": "Please upload a clear photo"}}"#;
        let err = classify(400, body).unwrap_err();
        assert_eq!(
            err,
            AssessmentError::NoSubjectDetected {
                message: "No cat face detected".into(),
                guidance: "Please upload a clear photo".into(),
            }
        );
    }

    #[test]
    fn untagged_400_is_invalid_image() {
        let body = r#"{"detail": {"error_message": "unsupported format"}}"#;
        let err = classify(400, body).unwrap_err();
        assert_eq!(
            err,
            AssessmentError::InvalidImage {
                message: "unsupported format".into(),
                guidance: DEFAULT_INVALID_GUIDANCE.into(),
            }
        );
    }

    #[test]
    fn string_detail_400_uses_text_as_message() {
        let body = r#"{"detail": "file too large"}"#;
        let err = classify(400, body).unwrap_err();
        assert!(matches!(
            err,
            AssessmentError::InvalidImage { ref message, .. } if message == "file too large"
        ));
    }

    #[test]
    fn unparseable_400_falls_back_to_raw_text() {
        let err = classify(400, "bad request").unwrap_err();
        assert!(matches!(
            err,
            AssessmentError::InvalidImage { ref message, .. } if message == "bad request"
        ));
    }

    #[test]
    fn status_503_is_service_unavailable() {
        let body = r#"{"detail": {"error_message": "model warming up",
            "error_guidance": "retry shortly"}}"#;
        let err = classify(503, body).unwrap_err();
        assert_eq!(
            err,
            AssessmentError::ServiceUnavailable {
                message: "model warming up".into(),
                guidance: "retry shortly".into(),
            }
        );
        assert!(err.retryable());
    }

    #[test]
    fn bare_503_gets_default_copy() {
        let err = classify(503, "").unwrap_err();
        assert_eq!(
            err,
            AssessmentError::ServiceUnavailable {
                message: DEFAULT_UNAVAILABLE_MESSAGE.into(),
                guidance: DEFAULT_UNAVAILABLE_GUIDANCE.into(),
            }
        );
    }

    #[test]
    fn other_statuses_are_unknown_with_best_effort_message() {
        let err = classify(500, r#"{"detail": "internal error"}"#).unwrap_err();
        assert_eq!(err, AssessmentError::Unknown("HTTP 500: internal error".into()));

        let err = classify(418, "teapot").unwrap_err();
        assert_eq!(err, AssessmentError::Unknown("HTTP 418: teapot".into()));
    }

    #[test]
    fn classification_is_idempotent() {
        let cases: &[(u16, &str)] = &[
            (200, r#"{"pain_level": "mild", "confidence": 0.8}"#),
            (400, r#"{"detail": {"error_type": "NO_SUBJECT_DETECTED"}}"#),
            (400, r#"{"detail": "bad"}"#),
            (503, ""),
            (500, "boom"),
        ];
        for (status, body) in cases {
            assert_eq!(classify(*status, body), classify(*status, body));
        }
    }
}
