//! Structured feedback returned by the scoring engine.
//!
//! The engine answers with free text; `Feedback::from_engine_text` is the only
//! way that text becomes a `Feedback` value. It strips code fences, runs the
//! serde schema, then checks every score is within 0–100.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm_client::strip_json_fences;

pub const MAX_SCORE: u32 = 100;

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("feedback is not valid JSON for the expected schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("{field} score {score} is outside 0-100")]
    ScoreOutOfRange { field: &'static str, score: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Good,
    Improve,
}

/// Summary tip attached to the ATS category. Never carries an explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsTip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    pub tip: String,
}

/// Tip attached to one of the four detailed categories. Only these tips can
/// carry an explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    pub tip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub score: u32,
    pub tips: Vec<CategoryTip>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsCategory {
    pub score: u32,
    pub tips: Vec<AtsTip>,
    /// Keywords from the job description already present in the resume.
    #[serde(default)]
    pub matched_keywords: Vec<String>,
}

impl AtsCategory {
    /// Labels of the corrective tips, in the order the engine returned them.
    pub fn improve_labels(&self) -> impl Iterator<Item = &str> {
        self.tips
            .iter()
            .filter(|t| t.kind == TipKind::Improve)
            .map(|t| t.tip.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub overall_score: u32,
    // Older records spell the key `ats`; both land in the same field and a
    // payload carrying both is rejected as a duplicate.
    #[serde(rename = "ATS", alias = "ats")]
    pub ats: AtsCategory,
    pub tone_and_style: Category,
    pub content: Category,
    pub structure: Category,
    pub skills: Category,
}

impl Feedback {
    /// Parses raw engine output into a validated `Feedback`.
    pub fn from_engine_text(text: &str) -> Result<Self, FeedbackError> {
        let mut feedback: Feedback = serde_json::from_str(strip_json_fences(text))?;
        feedback.validate()?;
        feedback.dedup_matched_keywords();
        Ok(feedback)
    }

    fn validate(&self) -> Result<(), FeedbackError> {
        let scores = [
            ("overallScore", self.overall_score),
            ("ATS", self.ats.score),
            ("toneAndStyle", self.tone_and_style.score),
            ("content", self.content.score),
            ("structure", self.structure.score),
            ("skills", self.skills.score),
        ];
        for (field, score) in scores {
            if score > MAX_SCORE {
                return Err(FeedbackError::ScoreOutOfRange { field, score });
            }
        }
        Ok(())
    }

    fn dedup_matched_keywords(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.ats
            .matched_keywords
            .retain(|kw| seen.insert(kw.clone()));
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const ENGINE_JSON: &str = r#"{
        "overallScore": 82,
        "ATS": {
            "score": 78,
            "tips": [
                {"type": "good", "tip": "Standard headings"},
                {"type": "improve", "tip": "Add metrics"}
            ],
            "matchedKeywords": ["Rust", "Kafka", "Rust"]
        },
        "toneAndStyle": {"score": 80, "tips": [{"type": "good", "tip": "Confident", "explanation": "Active verbs throughout."}]},
        "content": {"score": 75, "tips": []},
        "structure": {"score": 90, "tips": []},
        "skills": {"score": 70, "tips": [{"type": "improve", "tip": "List tooling", "explanation": "Name the build tools you used."}]}
    }"#;

    #[test]
    fn test_parses_engine_json() {
        let feedback = Feedback::from_engine_text(ENGINE_JSON).unwrap();
        assert_eq!(feedback.overall_score, 82);
        assert_eq!(feedback.ats.score, 78);
        assert_eq!(feedback.ats.improve_labels().collect::<Vec<_>>(), vec!["Add metrics"]);
        assert_eq!(feedback.skills.tips[0].kind, TipKind::Improve);
    }

    #[test]
    fn test_matched_keywords_collapse_duplicates() {
        let feedback = Feedback::from_engine_text(ENGINE_JSON).unwrap();
        assert_eq!(feedback.ats.matched_keywords, vec!["Rust", "Kafka"]);
    }

    #[test]
    fn test_lowercase_ats_key_is_accepted() {
        let lower = ENGINE_JSON.replace("\"ATS\"", "\"ats\"");
        let upper = Feedback::from_engine_text(ENGINE_JSON).unwrap();
        let lower = Feedback::from_engine_text(&lower).unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_both_ats_spellings_is_rejected() {
        let both = ENGINE_JSON.replacen(
            "\"overallScore\": 82,",
            "\"overallScore\": 82, \"ats\": {\"score\": 10, \"tips\": []},",
            1,
        );
        assert!(matches!(
            Feedback::from_engine_text(&both),
            Err(FeedbackError::Schema(_))
        ));
    }

    #[test]
    fn test_fenced_output_is_accepted() {
        let fenced = format!("```json\n{ENGINE_JSON}\n```");
        assert_eq!(Feedback::from_engine_text(&fenced).unwrap().overall_score, 82);
    }

    #[test]
    fn test_score_above_100_is_rejected() {
        let bad = ENGINE_JSON.replace("\"overallScore\": 82", "\"overallScore\": 182");
        assert!(matches!(
            Feedback::from_engine_text(&bad),
            Err(FeedbackError::ScoreOutOfRange {
                field: "overallScore",
                score: 182
            })
        ));
    }

    #[test]
    fn test_category_tip_without_explanation_is_accepted() {
        let terse = ENGINE_JSON.replace(", \"explanation\": \"Active verbs throughout.\"", "");
        let feedback = Feedback::from_engine_text(&terse).unwrap();
        assert_eq!(feedback.tone_and_style.tips[0].explanation, None);
        assert_eq!(feedback.ats.score, 78);

        let json = serde_json::to_value(&feedback).unwrap();
        assert!(json["toneAndStyle"]["tips"][0].get("explanation").is_none());
        assert_eq!(
            json["skills"]["tips"][0]["explanation"],
            "Name the build tools you used."
        );
    }

    #[test]
    fn test_ats_tips_never_carry_explanation() {
        let with_extra = ENGINE_JSON.replace(
            "{\"type\": \"improve\", \"tip\": \"Add metrics\"}",
            "{\"type\": \"improve\", \"tip\": \"Add metrics\", \"explanation\": \"More numbers.\"}",
        );
        let feedback = Feedback::from_engine_text(&with_extra).unwrap();
        let json = serde_json::to_value(&feedback).unwrap();
        assert!(json["ATS"]["tips"][1].get("explanation").is_none());
    }

    #[test]
    fn test_malformed_json_is_schema_error() {
        assert!(matches!(
            Feedback::from_engine_text("{\"overallScore\": "),
            Err(FeedbackError::Schema(_))
        ));
    }
}
