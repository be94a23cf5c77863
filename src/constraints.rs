//! Pure aggregate arithmetic shared by the search-time pruning and the
//! post-hoc audit. Both sides call these same formulas on independently
//! derived inputs; that duplication of derivation is the audit mechanism.

use crate::config::{Grade, Tier};

/// `part` of `total` as a percentage. Returns 0.0 when `total` is zero.
pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Percentage of the population captured by a tier's grades, given per-grade
/// student counts. `counts` may be a prefix of the grade table during search;
/// grades beyond it contribute nothing.
pub fn tier_percentage(tier: &Tier, grades: &[Grade], counts: &[usize], total: usize) -> f64 {
    let students = grades
        .iter()
        .zip(counts)
        .filter(|(grade, _)| tier.contains(&grade.label))
        .map(|(_, count)| *count)
        .sum();
    pct(students, total)
}

/// Population mean GPA implied by per-grade student counts.
pub fn population_mean(counts: &[usize], grades: &[Grade], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let points: f64 = grades
        .iter()
        .zip(counts)
        .map(|(grade, count)| grade.value * *count as f64)
        .sum();
    points / total as f64
}

/// Inclusive range membership.
pub fn within_range(value: f64, min: f64, max: f64) -> bool {
    value >= min && value <= max
}

/// Arithmetic mean of a sample. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation given a pre-computed mean. Returns 0.0 for
/// empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CurveConfig;

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(pct(50, 100), 50.0);
        assert_eq!(pct(1, 4), 25.0);
    }

    #[test]
    fn test_tier_percentage_sums_member_grades() {
        let config = CurveConfig::default();
        // A+ and A form the first tier
        let mut counts = vec![0usize; config.grades.len()];
        counts[0] = 3;
        counts[1] = 5;
        counts[2] = 12;
        let p = tier_percentage(&config.distribution[0], &config.grades, &counts, 20);
        assert_eq!(p, 40.0);
    }

    #[test]
    fn test_tier_percentage_with_prefix_counts() {
        let config = CurveConfig::default();
        let p = tier_percentage(&config.distribution[0], &config.grades, &[2, 2], 8);
        assert_eq!(p, 50.0);
    }

    #[test]
    fn test_population_mean() {
        let config = CurveConfig::default();
        // 2 students at A (4.0), 2 at B (3.0)
        let mut counts = vec![0usize; config.grades.len()];
        counts[1] = 2;
        counts[4] = 2;
        let m = population_mean(&counts, &config.grades, 4);
        assert!((m - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_population_mean_empty() {
        assert_eq!(population_mean(&[], &[], 0), 0.0);
    }

    #[test]
    fn test_within_range_is_inclusive() {
        assert!(within_range(3.28, 3.28, 3.32));
        assert!(within_range(3.32, 3.28, 3.32));
        assert!(!within_range(3.2799, 3.28, 3.32));
        assert!(!within_range(3.3201, 3.28, 3.32));
    }

    #[test]
    fn test_mean_and_stddev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&values);
        assert_eq!(m, 5.0);
        assert_eq!(stddev(&values, m), 2.0);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(stddev(&[], 0.0), 0.0);
    }
}
