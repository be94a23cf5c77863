//! Scenario statistics recomputed from materialized assignments.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::assign::ScoreRow;
use crate::config::CurveConfig;
use crate::constraints::{mean, pct, stddev};

#[derive(Debug, Serialize)]
pub struct TierStat {
    pub(crate) labels: Vec<String>,
    pub(crate) count: usize,
    pub(crate) percent: f64,
}

/// Snapshot of an exported scenario, written alongside its CSV.
#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    pub(crate) scenario: String,
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) students: usize,
    pub(crate) mean_gpa: f64,
    pub(crate) stddev_gpa: f64,
    pub(crate) grade_counts: BTreeMap<String, usize>,
    /// Minimum raw score that earned each grade.
    pub(crate) cutoffs: BTreeMap<String, i64>,
    pub(crate) tiers: Vec<TierStat>,
}

pub fn scenario_report(scenario: &str, rows: &[ScoreRow], config: &CurveConfig) -> ScenarioReport {
    let students = rows.len();

    let gpas: Vec<f64> = rows.iter().map(|r| r.gpa).collect();
    let mean_gpa = mean(&gpas);
    let stddev_gpa = stddev(&gpas, mean_gpa);

    let mut grade_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut cutoffs: BTreeMap<String, i64> = BTreeMap::new();
    for row in rows {
        *grade_counts.entry(row.grade.clone()).or_insert(0) += 1;
        cutoffs
            .entry(row.grade.clone())
            .and_modify(|floor| *floor = (*floor).min(row.score))
            .or_insert(row.score);
    }

    let tiers = config
        .distribution
        .iter()
        .map(|tier| {
            let count = tier
                .labels
                .iter()
                .map(|label| grade_counts.get(label).copied().unwrap_or(0))
                .sum();
            TierStat {
                labels: tier.labels.clone(),
                count,
                percent: pct(count, students),
            }
        })
        .collect();

    ScenarioReport {
        scenario: scenario.to_string(),
        generated_at: Utc::now(),
        students,
        mean_gpa,
        stddev_gpa,
        grade_counts,
        cutoffs,
        tiers,
    }
}
