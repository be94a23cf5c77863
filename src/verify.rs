//! Independent audit of a materialized assignment.
//!
//! The checks re-derive every statistic from the rows alone; nothing from the
//! search engine is reused. All four checks always run, and each one reports
//! every violation it finds, so a failing file yields a complete diagnosis
//! rather than the first offense.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Result, bail};
use serde::Serialize;

use crate::assign::ScoreRow;
use crate::config::CurveConfig;
use crate::constraints::{mean, pct, within_range};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckResult {
    pub passed: bool,
    pub violations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MeanCheck {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TierCheck {
    pub labels: Vec<String>,
    pub count: usize,
    pub percent: f64,
    pub min: f64,
    pub max: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuditReport {
    pub students: usize,
    pub passed: bool,
    pub monotonicity: CheckResult,
    pub tie_consistency: CheckResult,
    pub mean: MeanCheck,
    pub tiers: Vec<TierCheck>,
}

/// Audits assignment rows against the configured constraints. Rows may arrive
/// in any order; the check re-sorts rather than trusting the producer.
pub fn verify_rows(rows: &[ScoreRow], config: &CurveConfig) -> Result<AuditReport> {
    if rows.is_empty() {
        bail!("empty score population: nothing to audit");
    }

    let mut ordered: Vec<&ScoreRow> = rows.iter().collect();
    ordered.sort_by(|a, b| b.score.cmp(&a.score).then(b.gpa.total_cmp(&a.gpa)));
    let students = ordered.len();

    // 1. Monotonicity: GPA must never rise as the score drops.
    let mut violations = Vec::new();
    for pair in ordered.windows(2) {
        let (upper, lower) = (pair[0], pair[1]);
        if lower.gpa > upper.gpa {
            violations.push(format!(
                "score {} got {} ({:.3}) but lower score {} got {} ({:.3})",
                upper.score, upper.grade, upper.gpa, lower.score, lower.grade, lower.gpa
            ));
        }
    }
    let monotonicity = CheckResult {
        passed: violations.is_empty(),
        violations,
    };

    // 2. Tie consistency: one score, one grade.
    let mut labels_by_score: BTreeMap<i64, BTreeSet<&str>> = BTreeMap::new();
    for row in rows {
        labels_by_score
            .entry(row.score)
            .or_default()
            .insert(row.grade.as_str());
    }
    let mut violations = Vec::new();
    for (score, labels) in &labels_by_score {
        if labels.len() > 1 {
            violations.push(format!(
                "score {} maps to multiple grades: {}",
                score,
                labels.iter().copied().collect::<Vec<_>>().join(", ")
            ));
        }
    }
    let tie_consistency = CheckResult {
        passed: violations.is_empty(),
        violations,
    };

    // 3. Mean GPA against the configured window.
    let gpas: Vec<f64> = rows.iter().map(|r| r.gpa).collect();
    let mean_gpa = mean(&gpas);
    let rule = &config.aggregate.mean;
    let mean_check = MeanCheck {
        mean: mean_gpa,
        min: rule.min,
        max: rule.max,
        passed: within_range(mean_gpa, rule.min, rule.max),
    };

    // 4. Tier distribution recomputed from the row labels.
    let mut grade_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        *grade_counts.entry(row.grade.as_str()).or_insert(0) += 1;
    }
    let tiers: Vec<TierCheck> = config
        .distribution
        .iter()
        .map(|tier| {
            let count = tier
                .labels
                .iter()
                .map(|label| grade_counts.get(label.as_str()).copied().unwrap_or(0))
                .sum();
            let percent = pct(count, students);
            TierCheck {
                labels: tier.labels.clone(),
                count,
                percent,
                min: tier.min,
                max: tier.max,
                passed: within_range(percent, tier.min, tier.max),
            }
        })
        .collect();

    let passed = monotonicity.passed
        && tie_consistency.passed
        && mean_check.passed
        && tiers.iter().all(|t| t.passed);

    Ok(AuditReport {
        students,
        passed,
        monotonicity,
        tie_consistency,
        mean: mean_check,
        tiers,
    })
}
