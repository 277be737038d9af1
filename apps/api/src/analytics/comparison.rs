//! Side-by-side comparison of two scored resumes.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::models::resume::ResumeRecord;

const MAX_SELECTED: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordComparison {
    pub common: Vec<String>,
    pub unique_to_a: Vec<String>,
    pub unique_to_b: Vec<String>,
}

pub fn score_difference(a: &ResumeRecord, b: &ResumeRecord) -> u32 {
    a.ats_score().abs_diff(b.ats_score())
}

/// Splits the `improve` ATS tip labels of both records into shared and
/// one-sided sets. Duplicates collapse; each list keeps first-seen order.
pub fn compare_keywords(a: &ResumeRecord, b: &ResumeRecord) -> KeywordComparison {
    let a_labels = distinct(a.improve_labels());
    let b_labels = distinct(b.improve_labels());
    let a_set: HashSet<&str> = a_labels.iter().copied().collect();
    let b_set: HashSet<&str> = b_labels.iter().copied().collect();

    let owned = |labels: &[&str], keep: &dyn Fn(&str) -> bool| -> Vec<String> {
        labels
            .iter()
            .filter(|l| keep(l))
            .map(|l| l.to_string())
            .collect()
    };

    KeywordComparison {
        common: owned(&a_labels, &|l| b_set.contains(l)),
        unique_to_a: owned(&a_labels, &|l| !b_set.contains(l)),
        unique_to_b: owned(&b_labels, &|l| !a_set.contains(l)),
    }
}

fn distinct(labels: Vec<&str>) -> Vec<&str> {
    let mut seen = HashSet::new();
    labels.into_iter().filter(|l| seen.insert(*l)).collect()
}

/// Records eligible for comparison: those with an ATS score above 0.
pub fn scored_records(records: &[ResumeRecord]) -> Vec<&ResumeRecord> {
    records.iter().filter(|r| r.ats_score() > 0).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub a: ComparedResume,
    pub b: ComparedResume,
    pub score_difference: u32,
    pub keywords: KeywordComparison,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedResume {
    pub id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub ats_score: u32,
}

impl From<&ResumeRecord> for ComparedResume {
    fn from(record: &ResumeRecord) -> Self {
        Self {
            id: record.id,
            company_name: record.company_name.clone(),
            job_title: record.job_title.clone(),
            ats_score: record.ats_score(),
        }
    }
}

pub fn compare(a: &ResumeRecord, b: &ResumeRecord) -> ComparisonReport {
    ComparisonReport {
        a: a.into(),
        b: b.into(),
        score_difference: score_difference(a, b),
        keywords: compare_keywords(a, b),
    }
}

/// Up to two record ids picked for comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonSelection {
    selected: Vec<Uuid>,
}

impl ComparisonSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deselects `id` if selected, otherwise selects it unless two are
    /// already chosen. Returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, id: Uuid) -> bool {
        if let Some(pos) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(pos);
            return false;
        }
        if self.selected.len() < MAX_SELECTED {
            self.selected.push(id);
            return true;
        }
        false
    }

    #[allow(dead_code)]
    pub fn selected(&self) -> &[Uuid] {
        &self.selected
    }

    /// The selected pair, in selection order, when both are among `records`.
    pub fn pair<'a>(
        &self,
        records: &[&'a ResumeRecord],
    ) -> Option<(&'a ResumeRecord, &'a ResumeRecord)> {
        let [a, b] = self.selected.as_slice() else {
            return None;
        };
        let find = |id: &Uuid| records.iter().copied().find(|r| r.id == *id);
        Some((find(a)?, find(b)?))
    }
}
