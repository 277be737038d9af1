use std::collections::HashMap;

use serde::Serialize;

use crate::models::resume::ResumeRecord;

const TOP_SKILL_GAPS: usize = 5;
const TOP_COMPANIES: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreDistribution {
    /// 90–100
    pub excellent: usize,
    /// 70–89
    pub good: usize,
    /// 50–69
    pub average: usize,
    /// 0–49
    pub poor: usize,
}

impl ScoreDistribution {
    fn record(&mut self, score: u32) {
        match score {
            90..=u32::MAX => self.excellent += 1,
            70..=89 => self.good += 1,
            50..=69 => self.average += 1,
            _ => self.poor += 1,
        }
    }

    #[allow(dead_code)]
    pub fn total(&self) -> usize {
        self.excellent + self.good + self.average + self.poor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rating {
    Good,
    Average,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl Rating {
    pub fn for_score(score: f64) -> Self {
        match score {
            s if s >= 70.0 => Rating::Good,
            s if s >= 50.0 => Rating::Average,
            _ => Rating::NeedsImprovement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub average_score: f64,
    pub average_rating: Rating,
    pub best_score: u32,
    pub total_resumes: usize,
    pub pending_resumes: usize,
    pub score_distribution: ScoreDistribution,
    pub top_skill_gaps: Vec<String>,
    pub most_applied_companies: Vec<CompanyCount>,
}

/// Reduces all records to a dashboard summary. Pending records count as a
/// score of 0. Returns `None` for an empty slice.
pub fn summarize(records: &[ResumeRecord]) -> Option<AnalyticsSummary> {
    if records.is_empty() {
        return None;
    }

    let mut distribution = ScoreDistribution::default();
    let mut total_score = 0u64;
    let mut best_score = 0;
    let mut pending_resumes = 0;
    let mut gaps = FrequencyCounter::default();
    let mut companies = FrequencyCounter::default();

    for record in records {
        let score = record.ats_score();
        distribution.record(score);
        total_score += u64::from(score);
        best_score = best_score.max(score);
        if record.is_pending() {
            pending_resumes += 1;
        }
        for label in record.improve_labels() {
            gaps.add(label);
        }
        if !record.company_name.is_empty() {
            companies.add(&record.company_name);
        }
    }

    let average_score = total_score as f64 / records.len() as f64;

    Some(AnalyticsSummary {
        average_score,
        average_rating: Rating::for_score(average_score),
        best_score,
        total_resumes: records.len(),
        pending_resumes,
        score_distribution: distribution,
        top_skill_gaps: gaps
            .top(TOP_SKILL_GAPS)
            .into_iter()
            .map(|(label, _)| label)
            .collect(),
        most_applied_companies: companies
            .top(TOP_COMPANIES)
            .into_iter()
            .map(|(name, count)| CompanyCount { name, count })
            .collect(),
    })
}

/// Counts strings, remembering the order each was first seen in.
#[derive(Default)]
struct FrequencyCounter {
    counts: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl FrequencyCounter {
    fn add(&mut self, value: &str) {
        match self.index.get(value) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(value.to_string(), self.counts.len());
                self.counts.push((value.to_string(), 1));
            }
        }
    }

    /// Most frequent first; ties keep first-seen order.
    fn top(mut self, n: usize) -> Vec<(String, usize)> {
        // sort_by is stable
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts.truncate(n);
        self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::fixtures::{pending_record, scored_record};

    #[test]
    fn test_empty_input_has_no_summary() {
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn test_distribution_and_average() {
        let records = vec![
            scored_record("Acme", 95, &[]),
            scored_record("Globex", 72, &[]),
            scored_record("Initech", 40, &[]),
        ];
        let summary = summarize(&records).unwrap();

        assert_eq!(
            summary.score_distribution,
            ScoreDistribution {
                excellent: 1,
                good: 1,
                average: 0,
                poor: 1
            }
        );
        assert_eq!(summary.average_score, 69.0);
        assert_eq!(summary.average_rating, Rating::Average);
        assert_eq!(summary.best_score, 95);
        assert_eq!(summary.total_resumes, 3);
        assert_eq!(summary.score_distribution.total(), summary.total_resumes);
    }

    #[test]
    fn test_pending_records_count_as_zero() {
        let records = vec![scored_record("Acme", 80, &[]), pending_record("Globex")];
        let summary = summarize(&records).unwrap();
        assert_eq!(summary.average_score, 40.0);
        assert_eq!(summary.pending_resumes, 1);
        assert_eq!(summary.score_distribution.poor, 1);
        assert_eq!(summary.average_rating, Rating::NeedsImprovement);
    }

    #[test]
    fn test_all_pending_best_score_is_zero() {
        let summary = summarize(&[pending_record("Acme")]).unwrap();
        assert_eq!(summary.best_score, 0);
        assert!(summary.top_skill_gaps.is_empty());
    }

    #[test]
    fn test_distribution_boundaries() {
        let records: Vec<_> = [100, 90, 89, 70, 69, 50, 49, 0]
            .into_iter()
            .map(|s| scored_record("Acme", s, &[]))
            .collect();
        let summary = summarize(&records).unwrap();
        assert_eq!(
            summary.score_distribution,
            ScoreDistribution {
                excellent: 2,
                good: 2,
                average: 2,
                poor: 2
            }
        );
    }

    #[test]
    fn test_top_skill_gaps_by_frequency_then_first_seen() {
        let records = vec![
            scored_record("Acme", 60, &["Add metrics", "Use active voice", "Add summary"]),
            scored_record("Acme", 60, &["Use active voice", "Shorten bullets"]),
            scored_record("Acme", 60, &["Add metrics", "Use active voice", "Fix dates"]),
            scored_record("Acme", 60, &["List certifications", "Quantify impact"]),
        ];
        let summary = summarize(&records).unwrap();
        assert_eq!(
            summary.top_skill_gaps,
            vec![
                "Use active voice",
                "Add metrics",
                "Add summary",
                "Shorten bullets",
                "Fix dates"
            ]
        );
    }

    #[test]
    fn test_most_applied_companies_skip_empty_names() {
        let records = vec![
            scored_record("", 60, &[]),
            scored_record("", 60, &[]),
            scored_record("Globex", 60, &[]),
            scored_record("Acme", 60, &[]),
            scored_record("Acme", 60, &[]),
            scored_record("Initech", 60, &[]),
            scored_record("Umbrella", 60, &[]),
        ];
        let summary = summarize(&records).unwrap();
        assert_eq!(
            summary.most_applied_companies,
            vec![
                CompanyCount {
                    name: "Acme".into(),
                    count: 2
                },
                CompanyCount {
                    name: "Globex".into(),
                    count: 1
                },
                CompanyCount {
                    name: "Initech".into(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = summarize(&[scored_record("Acme", 40, &[])]).unwrap();
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["averageRating"], "Needs Improvement");
        assert_eq!(json["scoreDistribution"]["poor"], 1);
        assert_eq!(json["mostAppliedCompanies"][0]["name"], "Acme");
    }
}
