use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::models::feedback::Feedback;

/// Key prefix for resume records in the record store.
pub const RECORD_KEY_PREFIX: &str = "resume:";
/// Pattern matching every resume record key.
pub const RECORD_LIST_PATTERN: &str = "resume:*";

pub fn record_key(id: Uuid) -> String {
    format!("{RECORD_KEY_PREFIX}{id}")
}

/// Feedback slot of a record: the empty-string sentinel until scoring
/// completes, then the scored value. Never goes back to `Pending`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FeedbackState {
    #[default]
    Pending,
    Scored(Box<Feedback>),
}

impl FeedbackState {
    pub fn as_scored(&self) -> Option<&Feedback> {
        match self {
            FeedbackState::Pending => None,
            FeedbackState::Scored(feedback) => Some(feedback),
        }
    }
}

impl Serialize for FeedbackState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeedbackState::Pending => serializer.serialize_str(""),
            FeedbackState::Scored(feedback) => feedback.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FeedbackState {
    /// Anything that is not a valid feedback object reads back as `Pending`.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Null => Ok(FeedbackState::Pending),
            Value::String(s) if s.is_empty() => Ok(FeedbackState::Pending),
            Value::Object(_) => match serde_json::from_value::<Feedback>(value) {
                Ok(feedback) => Ok(FeedbackState::Scored(Box::new(feedback))),
                Err(e) => {
                    warn!("Stored feedback does not match the schema, treating as pending: {e}");
                    Ok(FeedbackState::Pending)
                }
            },
            other => {
                warn!("Unexpected stored feedback value {other}, treating as pending");
                Ok(FeedbackState::Pending)
            }
        }
    }
}

/// One resume submission as persisted in the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: Uuid,
    pub resume_path: String,
    pub image_path: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub feedback: FeedbackState,
}

impl ResumeRecord {
    pub fn key(&self) -> String {
        record_key(self.id)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.feedback, FeedbackState::Pending)
    }

    /// ATS score, 0 while the record is pending.
    pub fn ats_score(&self) -> u32 {
        self.feedback.as_scored().map(|f| f.ats.score).unwrap_or(0)
    }

    /// `improve` ATS tip labels; empty while pending.
    pub fn improve_labels(&self) -> Vec<&str> {
        self.feedback
            .as_scored()
            .map(|f| f.ats.improve_labels().collect())
            .unwrap_or_default()
    }

    pub fn matched_keywords(&self) -> &[String] {
        self.feedback
            .as_scored()
            .map(|f| f.ats.matched_keywords.as_slice())
            .unwrap_or_default()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_pending_serializes_as_empty_string() {
        let record = pending_record("Acme");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["feedback"], Value::String(String::new()));
        assert_eq!(json["companyName"], "Acme");
    }

    #[test]
    fn test_scored_record_survives_store_round_trip() {
        let record = scored_record("Acme", 81, &["Add metrics"]);
        let stored = serde_json::to_string(&record).unwrap();
        let back: ResumeRecord = serde_json::from_str(&stored).unwrap();
        assert_eq!(back, record);
        assert!(stored.contains("\"ATS\""));
    }

    #[test]
    fn test_malformed_feedback_reads_as_pending() {
        let id = Uuid::new_v4();
        let raw = format!(
            r#"{{"id":"{id}","resumePath":"a","imagePath":"b","companyName":"","jobTitle":"","jobDescription":"","feedback":{{"overallScore":"high"}}}}"#
        );
        let record: ResumeRecord = serde_json::from_str(&raw).unwrap();
        assert!(record.is_pending());
        assert_eq!(record.ats_score(), 0);
        assert!(record.improve_labels().is_empty());
    }

    #[test]
    fn test_stored_tip_without_explanation_stays_scored() {
        let id = Uuid::new_v4();
        let category = r#"{"score":60,"tips":[{"type":"improve","tip":"Tighten summary"}]}"#;
        let raw = format!(
            r#"{{"id":"{id}","resumePath":"a","imagePath":"b","companyName":"Acme","jobTitle":"","jobDescription":"","feedback":{{"overallScore":74,"ATS":{{"score":81,"tips":[{{"type":"improve","tip":"Add metrics"}}]}},"toneAndStyle":{category},"content":{category},"structure":{category},"skills":{category}}}}}"#
        );
        let record: ResumeRecord = serde_json::from_str(&raw).unwrap();
        assert!(!record.is_pending());
        assert_eq!(record.ats_score(), 81);

        let back: ResumeRecord =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_pending_record_scores_zero() {
        let record = pending_record("Acme");
        assert_eq!(record.ats_score(), 0);
        assert!(record.matched_keywords().is_empty());
    }

    #[test]
    fn test_record_key_uses_resume_prefix() {
        let record = pending_record("Acme");
        assert_eq!(record.key(), format!("resume:{}", record.id));
    }
}
