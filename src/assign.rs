//! Materialization of an accepted partition into per-student rows.

use anyhow::{Result, bail};
use serde::Deserialize;

use crate::config::Grade;
use crate::roster::Roster;

/// One student row of a materialized assignment. The serde renames match the
/// CSV interchange header.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreRow {
    #[serde(rename = "Raw Score")]
    pub score: i64,
    #[serde(rename = "Letter Grade")]
    pub grade: String,
    #[serde(rename = "GPA Value")]
    pub gpa: f64,
}

/// Expands per-grade student counts into rows, walking the unique-score
/// groups once and consuming whole groups only. The search proposes cuts only
/// on group boundaries, so the splitting checks here should never fire; when
/// one does it signals an engine bug, not bad input.
pub fn materialize(roster: &Roster, grades: &[Grade], counts: &[usize]) -> Result<Vec<ScoreRow>> {
    if counts.len() != grades.len() {
        bail!(
            "inconsistent partition: {} counts for {} grades",
            counts.len(),
            grades.len()
        );
    }
    let total: usize = counts.iter().sum();
    if total != roster.total_students() {
        bail!(
            "inconsistent partition: counts cover {} students, roster has {}",
            total,
            roster.total_students()
        );
    }

    let groups = roster.groups();
    let mut rows = Vec::with_capacity(total);
    let mut cursor = 0;
    for (grade, &count) in grades.iter().zip(counts) {
        let mut needed = count;
        while needed > 0 {
            let Some(group) = groups.get(cursor) else {
                bail!(
                    "inconsistent partition: ran out of scores while filling grade {}",
                    grade.label
                );
            };
            if group.count > needed {
                bail!(
                    "inconsistent partition: boundary splits the {} students scoring {}",
                    group.count,
                    group.score
                );
            }
            for _ in 0..group.count {
                rows.push(ScoreRow {
                    score: group.score,
                    grade: grade.label.clone(),
                    gpa: grade.value,
                });
            }
            needed -= group.count;
            cursor += 1;
        }
    }
    Ok(rows)
}
