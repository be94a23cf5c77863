//! Grade table, tier table, and search settings.
//!
//! A single [`CurveConfig`] is consumed by the search engine, the
//! materializer, the audit checks, and the reporting code, so the tables are
//! never duplicated across components.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// A letter grade and its GPA weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Grade {
    pub label: String,
    pub value: f64,
}

/// A band of consecutive grades with a population-percentage rule.
///
/// `target` is the recommended share of students; `min`/`max` is the
/// admissible range checked by the strict search and by the audit. The ranked
/// search uses `target` together with the configured slack instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tier {
    pub labels: Vec<String>,
    pub target: f64,
    pub min: f64,
    pub max: f64,
}

impl Tier {
    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeanRule {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateRules {
    pub mean: MeanRule,
}

/// How the partition search selects among feasible candidates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Accept the first `max_solutions` feasible candidates in search order.
    Strict,
    /// Tolerate tier deviation up to `slack` around each target, collect all
    /// candidates, and keep the `max_solutions` with the lowest deviation.
    Ranked,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchOptions {
    /// Stop after this many accepted solutions.
    #[serde(default = "default_max_solutions")]
    pub max_solutions: usize,
    #[serde(default = "default_strategy")]
    pub strategy: Strategy,
    /// Admissible |percent - target| per tier in ranked mode.
    #[serde(default = "default_slack")]
    pub slack: f64,
    /// Mean the ranked deviation score is measured against.
    #[serde(default = "default_target_mean")]
    pub target_mean: f64,
}

fn default_max_solutions() -> usize {
    3
}

fn default_strategy() -> Strategy {
    Strategy::Strict
}

fn default_slack() -> f64 {
    4.5
}

fn default_target_mean() -> f64 {
    3.30
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            max_solutions: default_max_solutions(),
            strategy: default_strategy(),
            slack: default_slack(),
            target_mean: default_target_mean(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurveConfig {
    pub grades: Vec<Grade>,
    pub distribution: Vec<Tier>,
    pub aggregate: AggregateRules,
    #[serde(default)]
    pub search: SearchOptions,
}

impl Default for CurveConfig {
    fn default() -> Self {
        let grade = |label: &str, value: f64| Grade {
            label: label.to_string(),
            value,
        };
        let tier = |labels: &[&str], target: f64, min: f64, max: f64| Tier {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            target,
            min,
            max,
        };
        CurveConfig {
            grades: vec![
                grade("A+", 4.333),
                grade("A", 4.000),
                grade("A-", 3.666),
                grade("B+", 3.333),
                grade("B", 3.000),
                grade("B-", 2.666),
                grade("C+", 2.333),
                grade("C", 2.000),
                grade("C-", 1.666),
                grade("D", 1.000),
                grade("F", 0.000),
            ],
            distribution: vec![
                tier(&["A+", "A"], 12.0, 10.0, 14.0),
                tier(&["A-"], 20.0, 18.0, 22.0),
                tier(&["B+"], 33.0, 30.0, 36.0),
                tier(&["B"], 20.0, 18.0, 22.0),
                tier(&["B-"], 13.0, 11.0, 15.0),
                tier(&["C+", "C", "C-", "D", "F"], 2.0, 1.0, 4.0),
            ],
            aggregate: AggregateRules {
                mean: MeanRule {
                    min: 3.28,
                    max: 3.32,
                },
            },
            search: SearchOptions::default(),
        }
    }
}

impl CurveConfig {
    /// Loads a config from a JSON file, or returns the built-in defaults when
    /// no path is given. The result is validated either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            None => CurveConfig::default(),
            Some(path) => {
                let data = fs::read_to_string(path)
                    .with_context(|| format!("failed reading config: {}", path.display()))?;
                serde_json::from_str(&data)
                    .with_context(|| format!("failed parsing config: {}", path.display()))?
            }
        };
        if let Err(errors) = config.validate() {
            return Err(anyhow!("invalid configuration: {}", errors.join("; ")));
        }
        Ok(config)
    }

    /// Validates the tables, collecting every problem rather than stopping at
    /// the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.grades.is_empty() {
            errors.push("grades: table must not be empty".to_string());
        }
        for (i, grade) in self.grades.iter().enumerate() {
            if grade.value < 0.0 {
                errors.push(format!("grades[{}]: value must be non-negative", i));
            }
            if self.grades[..i].iter().any(|g| g.label == grade.label) {
                errors.push(format!("grades[{}]: duplicate label '{}'", i, grade.label));
            }
        }
        for pair in self.grades.windows(2) {
            if pair[0].value < pair[1].value {
                errors.push(format!(
                    "grades: value must not increase down the table ('{}' {} < '{}' {})",
                    pair[0].label, pair[0].value, pair[1].label, pair[1].value
                ));
            }
        }

        for (i, tier) in self.distribution.iter().enumerate() {
            if tier.labels.is_empty() {
                errors.push(format!("distribution[{}]: labels must not be empty", i));
            }
            if tier.min > tier.max {
                errors.push(format!("distribution[{}]: min exceeds max", i));
            }
            if tier.min < 0.0 || tier.max > 100.0 {
                errors.push(format!("distribution[{}]: range must lie in [0, 100]", i));
            }

            let mut ranks = Vec::new();
            for label in &tier.labels {
                match self.grades.iter().position(|g| &g.label == label) {
                    Some(rank) => ranks.push(rank),
                    None => errors.push(format!(
                        "distribution[{}]: unknown grade label '{}'",
                        i, label
                    )),
                }
                if self.distribution[..i].iter().any(|t| t.contains(label)) {
                    errors.push(format!(
                        "distribution[{}]: label '{}' already belongs to an earlier tier",
                        i, label
                    ));
                }
            }
            if !ranks.is_empty() {
                let lo = *ranks.iter().min().unwrap_or(&0);
                let hi = *ranks.iter().max().unwrap_or(&0);
                if hi - lo + 1 != ranks.len() {
                    errors.push(format!(
                        "distribution[{}]: labels must be consecutive grades",
                        i
                    ));
                }
            }
        }

        if self.aggregate.mean.min > self.aggregate.mean.max {
            errors.push("aggregate.mean: min exceeds max".to_string());
        }
        if self.search.max_solutions == 0 {
            errors.push("search.max_solutions: must be at least 1".to_string());
        }
        if self.search.slack < 0.0 {
            errors.push("search.slack: must be non-negative".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
