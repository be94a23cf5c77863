//! Score indexing: raw score multiset to descending unique values with
//! multiplicities.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Raw scores for the graded section this tool was built around. Used when no
/// scores file is supplied on the command line.
pub const DEFAULT_ROSTER: [i64; 79] = [
    97, 97, 91, 90, 90, 89, 89, 88, 87, 87, 86, 86, 86, 86, 85, 85, 85, 85, 84, 84, 84, 83, 83,
    83, 82, 82, 82, 82, 81, 81, 81, 81, 80, 80, 80, 80, 79, 79, 79, 78, 78, 78, 78, 78, 77, 76,
    76, 76, 76, 75, 75, 75, 75, 74, 74, 74, 74, 74, 73, 72, 72, 70, 70, 70, 69, 69, 68, 66, 65,
    63, 63, 62, 61, 60, 60, 59, 55, 51, 77,
];

/// A distinct raw score and the number of students who share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreGroup {
    pub score: i64,
    pub count: usize,
}

/// Descending index of distinct scores. The grouping is what lets the search
/// assign tied students atomically.
#[derive(Debug, Clone)]
pub struct Roster {
    groups: Vec<ScoreGroup>,
    total: usize,
}

impl Roster {
    pub fn from_scores(scores: &[i64]) -> Result<Self> {
        if scores.is_empty() {
            bail!("empty score population: nothing to grade");
        }
        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for &score in scores {
            *counts.entry(score).or_insert(0) += 1;
        }
        let groups = counts
            .into_iter()
            .rev()
            .map(|(score, count)| ScoreGroup { score, count })
            .collect();
        Ok(Roster {
            groups,
            total: scores.len(),
        })
    }

    /// Reads one integer score per line; blank lines are ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed reading scores: {}", path.display()))?;
        let mut scores = Vec::new();
        for (lineno, line) in data.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let score: i64 = line
                .parse()
                .with_context(|| format!("invalid score '{}' on line {}", line, lineno + 1))?;
            scores.push(score);
        }
        Self::from_scores(&scores)
    }

    pub fn groups(&self) -> &[ScoreGroup] {
        &self.groups
    }

    pub fn total_students(&self) -> usize {
        self.total
    }
}
