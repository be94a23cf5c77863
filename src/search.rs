//! Depth-first search for feasible grade band partitions.
//!
//! The search walks the grade table and the descending unique-score sequence
//! in lockstep, choosing at each grade how many leading unique scores it
//! absorbs. Cuts land only on unique-score boundaries, so tied students are
//! never split, and grade rank stays monotonic in score by construction.

use std::time::Instant;

use tracing::debug;

use crate::config::{CurveConfig, Strategy, Tier};
use crate::constraints::{tier_percentage, within_range};
use crate::roster::Roster;

/// Weight of the mean deviation relative to the summed tier deviations when
/// ranking candidates.
const MEAN_DEVIATION_WEIGHT: f64 = 50.0;

/// An accepted partition: students per grade, in grade-table order.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub counts: Vec<usize>,
    pub mean: f64,
    pub deviation: f64,
}

/// Runs the partition search. An empty result means no candidate satisfied
/// the constraints; the caller decides whether to relax and re-run. The
/// optional deadline is checked on entry to every branch.
pub fn find_partitions(
    roster: &Roster,
    config: &CurveConfig,
    deadline: Option<Instant>,
) -> Vec<Candidate> {
    let mut engine = Search {
        roster,
        config,
        deadline,
        tier_end: tier_end_table(config),
        found: Vec::new(),
    };
    engine.descend(0, 0, 0.0, Vec::new());

    let mut found = engine.found;
    if config.search.strategy == Strategy::Ranked {
        found.sort_by(|a, b| a.deviation.total_cmp(&b.deviation));
        found.truncate(config.search.max_solutions);
    }
    found
}

/// For each grade index, the tier that closes there (the grade is the last
/// member of that tier in table order), if any.
fn tier_end_table(config: &CurveConfig) -> Vec<Option<usize>> {
    config
        .grades
        .iter()
        .enumerate()
        .map(|(rank, grade)| {
            let tier = config
                .distribution
                .iter()
                .position(|t| t.contains(&grade.label))?;
            let continues = config.grades[rank + 1..]
                .iter()
                .any(|later| config.distribution[tier].contains(&later.label));
            if continues { None } else { Some(tier) }
        })
        .collect()
}

struct Search<'a> {
    roster: &'a Roster,
    config: &'a CurveConfig,
    deadline: Option<Instant>,
    tier_end: Vec<Option<usize>>,
    found: Vec<Candidate>,
}

impl Search<'_> {
    fn capped(&self) -> bool {
        self.config.search.strategy == Strategy::Strict
            && self.found.len() >= self.config.search.max_solutions
    }

    fn tier_rule_ok(&self, tier: &Tier, percent: f64) -> bool {
        match self.config.search.strategy {
            Strategy::Strict => within_range(percent, tier.min, tier.max),
            Strategy::Ranked => (percent - tier.target).abs() <= self.config.search.slack,
        }
    }

    /// Fires exactly when `counts` closes a tier: the tier's share must
    /// already be admissible, or the whole branch is hopeless.
    fn tier_close_ok(&self, rank: usize, counts: &[usize]) -> bool {
        let Some(tier) = self.tier_end[rank] else {
            return true;
        };
        let tier = &self.config.distribution[tier];
        let percent = tier_percentage(
            tier,
            &self.config.grades,
            counts,
            self.roster.total_students(),
        );
        self.tier_rule_ok(tier, percent)
    }

    fn all_tiers_ok(&self, counts: &[usize]) -> bool {
        self.config.distribution.iter().all(|tier| {
            let percent = tier_percentage(
                tier,
                &self.config.grades,
                counts,
                self.roster.total_students(),
            );
            self.tier_rule_ok(tier, percent)
        })
    }

    fn deviation(&self, counts: &[usize], mean: f64) -> f64 {
        let tier_error: f64 = self
            .config
            .distribution
            .iter()
            .map(|tier| {
                let percent = tier_percentage(
                    tier,
                    &self.config.grades,
                    counts,
                    self.roster.total_students(),
                );
                (percent - tier.target).abs()
            })
            .sum();
        tier_error + (mean - self.config.search.target_mean).abs() * MEAN_DEVIATION_WEIGHT
    }

    /// `counts` holds one entry per grade already filled; each branch owns its
    /// own copy, so siblings never see each other's mutations.
    fn descend(&mut self, rank: usize, score_idx: usize, points: f64, counts: Vec<usize>) {
        if self.capped() {
            return;
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return;
            }
        }

        let grades = &self.config.grades;
        let total = self.roster.total_students();
        let assigned: usize = counts.iter().sum();
        let remaining = total - assigned;

        // Best case gives every unassigned student the current grade, worst
        // case the lowest grade. If the admissible mean window misses the
        // whole interval, no future choice can repair this branch.
        if remaining > 0 {
            let rule = &self.config.aggregate.mean;
            let best = points + remaining as f64 * grades[rank].value;
            let worst = points + remaining as f64 * grades[grades.len() - 1].value;
            if best / (total as f64) < rule.min || worst / (total as f64) > rule.max {
                return;
            }
        }

        // The last grade is the catch-all for everything still unassigned.
        if rank == grades.len() - 1 {
            let final_points = points + remaining as f64 * grades[rank].value;
            let mean = final_points / total as f64;
            let rule = &self.config.aggregate.mean;
            if !within_range(mean, rule.min, rule.max) {
                return;
            }
            let mut full = counts;
            full.push(remaining);
            if !self.all_tiers_ok(&full) {
                return;
            }
            let deviation = self.deviation(&full, mean);
            debug!(mean, deviation, "candidate accepted");
            self.found.push(Candidate {
                counts: full,
                mean,
                deviation,
            });
            return;
        }

        let groups = self.roster.groups();
        let mut batch = 0usize;
        for take in 0..=(groups.len() - score_idx) {
            if take > 0 {
                batch += groups[score_idx + take - 1].count;
            }
            let mut child = counts.clone();
            child.push(batch);
            if !self.tier_close_ok(rank, &child) {
                continue;
            }
            self.descend(
                rank + 1,
                score_idx + take,
                points + batch as f64 * grades[rank].value,
                child,
            );
            if self.capped() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AggregateRules, Grade, MeanRule, SearchOptions, Tier};
    use crate::constraints::population_mean;
    use std::time::Duration;

    fn grade(label: &str, value: f64) -> Grade {
        Grade {
            label: label.to_string(),
            value,
        }
    }

    fn tier(labels: &[&str], target: f64, min: f64, max: f64) -> Tier {
        Tier {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            target,
            min,
            max,
        }
    }

    /// Six grades, three constrained tiers, 18 students across 6 distinct
    /// scores.
    fn small_config(mean_min: f64, mean_max: f64) -> CurveConfig {
        CurveConfig {
            grades: vec![
                grade("A+", 4.333),
                grade("A", 4.000),
                grade("A-", 3.666),
                grade("B+", 3.333),
                grade("B", 3.000),
                grade("F", 0.000),
            ],
            distribution: vec![
                tier(&["A+", "A"], 12.0, 10.0, 14.0),
                tier(&["A-"], 15.0, 0.0, 30.0),
                tier(&["F"], 10.0, 0.0, 30.0),
            ],
            aggregate: AggregateRules {
                mean: MeanRule {
                    min: mean_min,
                    max: mean_max,
                },
            },
            search: SearchOptions {
                max_solutions: 100,
                ..SearchOptions::default()
            },
        }
    }

    fn small_roster() -> Roster {
        let mut scores = Vec::new();
        for (score, count) in [(97, 2), (90, 2), (85, 4), (80, 4), (75, 4), (60, 2)] {
            scores.extend(std::iter::repeat_n(score, count));
        }
        Roster::from_scores(&scores).unwrap()
    }

    #[test]
    fn test_small_population_finds_feasible_partitions() {
        let config = small_config(3.0, 3.5);
        let roster = small_roster();
        let found = find_partitions(&roster, &config, None);

        assert_eq!(found.len(), 27);
        for candidate in &found {
            assert_eq!(candidate.counts.iter().sum::<usize>(), 18);
            assert!(within_range(candidate.mean, 3.0, 3.5));
        }
        // First candidate in depth-first order: the two 97s take A, everyone
        // down to the 60s takes B.
        assert_eq!(found[0].counts, vec![0, 2, 0, 0, 16, 0]);
        let expected = (2.0 * 4.0 + 16.0 * 3.0) / 18.0;
        assert!((found[0].mean - expected).abs() < 1e-9);
    }

    #[test]
    fn test_candidate_mean_matches_evaluator() {
        let config = small_config(3.0, 3.5);
        let roster = small_roster();
        for candidate in find_partitions(&roster, &config, None) {
            let recomputed = population_mean(&candidate.counts, &config.grades, 18);
            assert!((candidate.mean - recomputed).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unreachable_mean_range_yields_empty_set() {
        let config = small_config(4.3, 4.4);
        let found = find_partitions(&small_roster(), &config, None);
        assert!(found.is_empty());
    }

    #[test]
    fn test_unsatisfiable_tier_yields_empty_set() {
        // Ten students all tied at 80: the A+ tier can only capture 0% or
        // 100%, never something inside [40, 60].
        let config = CurveConfig {
            grades: vec![grade("A+", 4.333), grade("F", 0.000)],
            distribution: vec![tier(&["A+"], 50.0, 40.0, 60.0)],
            aggregate: AggregateRules {
                mean: MeanRule { min: 0.0, max: 5.0 },
            },
            search: SearchOptions::default(),
        };
        let roster = Roster::from_scores(&[80; 10]).unwrap();
        assert!(find_partitions(&roster, &config, None).is_empty());
    }

    #[test]
    fn test_solution_cap_is_honored() {
        let mut config = small_config(3.0, 3.5);
        config.search.max_solutions = 2;
        let found = find_partitions(&small_roster(), &config, None);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_ranked_strategy_orders_by_deviation() {
        let mut config = small_config(3.0, 3.5);
        config.search.strategy = Strategy::Ranked;
        config.search.slack = 100.0;
        config.search.target_mean = 3.25;
        config.search.max_solutions = 5;
        let found = find_partitions(&small_roster(), &config, None);

        assert_eq!(found.len(), 5);
        for pair in found.windows(2) {
            assert!(pair[0].deviation <= pair[1].deviation);
        }
    }

    #[test]
    fn test_expired_deadline_stops_the_search() {
        let config = small_config(3.0, 3.5);
        let deadline = Instant::now() - Duration::from_millis(1);
        let found = find_partitions(&small_roster(), &config, Some(deadline));
        assert!(found.is_empty());
    }

    #[test]
    fn test_untiered_grades_carry_no_closure_constraint() {
        // B+ and B belong to no tier; the search is free to size them.
        let config = small_config(3.0, 3.5);
        let found = find_partitions(&small_roster(), &config, None);
        assert!(found.iter().any(|c| c.counts[3] > 0));
        assert!(found.iter().any(|c| c.counts[3] == 0));
    }
}
