use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

pub const DEFAULT_PASS_THRESHOLD: i64 = 40;
pub const MAX_MARK: i64 = 100;
/// Largest credit weight a class may carry.
pub const MAX_CREDIT: i64 = 1_000;

/// Inclusive ranges of the five-bucket histogram.
pub const BUCKETS: [(i64, i64); 5] = [(0, 19), (20, 39), (40, 59), (60, 79), (80, 100)];

/// Administrative codes recorded instead of a numeric mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCode {
    Absent,
    Extension,
    Unmarked,
}

impl AdminCode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ABS" => Some(AdminCode::Absent),
            "EN" => Some(AdminCode::Extension),
            "UM" => Some(AdminCode::Unmarked),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdminCode::Absent => "ABS",
            AdminCode::Extension => "EN",
            AdminCode::Unmarked => "UM",
        }
    }
}

/// What a mark row holds: a numeric value, an administrative code, or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkValue {
    Scored(i64),
    Code(AdminCode),
    NoSubmission,
}

impl MarkValue {
    /// Builds a mark value from its two nullable columns. Both set is rejected.
    pub fn from_parts(value: Option<i64>, code: Option<&str>) -> Result<Self, StatsError> {
        match (value, code.map(str::trim).filter(|c| !c.is_empty())) {
            (Some(_), Some(_)) => Err(StatsError::ValueAndCode),
            (Some(v), None) => {
                check_range(v)?;
                Ok(MarkValue::Scored(v))
            }
            (None, Some(c)) => AdminCode::parse(c)
                .map(MarkValue::Code)
                .ok_or_else(|| StatsError::UnknownCode(c.to_string())),
            (None, None) => Ok(MarkValue::NoSubmission),
        }
    }

    pub fn numeric(self) -> Option<i64> {
        match self {
            MarkValue::Scored(v) => Some(v),
            _ => None,
        }
    }

    pub fn code(self) -> Option<&'static str> {
        match self {
            MarkValue::Code(c) => Some(c.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("no numeric marks to aggregate")]
    NoData,
    #[error("mark {0} is outside 0..=100")]
    OutOfRange(i64),
    #[error("a mark cannot carry both a value and an administrative code")]
    ValueAndCode,
    #[error("unknown administrative code: {0}")]
    UnknownCode(String),
    #[error("credit weight {0} is negative")]
    NegativeCredit(i64),
    #[error("credit weights sum to zero")]
    ZeroCredit,
    #[error("credit weights are too large to combine")]
    CreditOverflow,
}

fn check_range(v: i64) -> Result<(), StatsError> {
    if (0..=MAX_MARK).contains(&v) {
        Ok(())
    } else {
        Err(StatsError::OutOfRange(v))
    }
}

/// Rounds `num / den` to the nearest integer, ties to even. `den` must be positive.
pub fn round_half_even(num: i64, den: i64) -> i64 {
    debug_assert!(den > 0);
    let q = num.div_euclid(den);
    let r = num.rem_euclid(den);
    // 2 * r can overflow; den - r cannot.
    match r.cmp(&(den - r)) {
        Ordering::Less => q,
        Ordering::Greater => q + 1,
        Ordering::Equal => {
            if q.rem_euclid(2) == 0 {
                q
            } else {
                q + 1
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub count: usize,
    pub mean: i64,
    pub median: i64,
    pub mode: i64,
    pub pass_rate: i64,
    pub bucket_counts: [usize; 5],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkTally {
    pub scored_count: usize,
    pub coded_count: usize,
    pub no_submission_count: usize,
}

/// Splits mark rows into the numeric values that feed the statistics and a
/// tally of what was left out.
pub fn numeric_values<I>(marks: I) -> (Vec<i64>, MarkTally)
where
    I: IntoIterator<Item = MarkValue>,
{
    let mut values = Vec::new();
    let mut tally = MarkTally::default();
    for m in marks {
        match m {
            MarkValue::Scored(v) => {
                tally.scored_count += 1;
                values.push(v);
            }
            MarkValue::Code(_) => tally.coded_count += 1,
            MarkValue::NoSubmission => tally.no_submission_count += 1,
        }
    }
    (values, tally)
}

fn compute_median(sorted: &[i64]) -> i64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        round_half_even(sorted[(n / 2) - 1] + sorted[n / 2], 2)
    }
}

/// Most frequent value; ties go to the smallest value.
fn compute_mode(values: &[i64]) -> i64 {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(*v).or_insert(0) += 1;
    }
    let mut best = (values[0], 0_usize);
    // BTreeMap iterates ascending, so a strict `>` keeps the smallest tied value.
    for (v, c) in counts {
        if c > best.1 {
            best = (v, c);
        }
    }
    best.0
}

fn bucket_counts(values: &[i64]) -> [usize; 5] {
    let mut out = [0_usize; 5];
    for v in values {
        if let Some(idx) = BUCKETS.iter().position(|(lo, hi)| v >= lo && v <= hi) {
            out[idx] += 1;
        }
    }
    out
}

pub fn compute_statistics(values: &[i64], pass_threshold: i64) -> Result<Statistics, StatsError> {
    if values.is_empty() {
        return Err(StatsError::NoData);
    }
    for v in values {
        check_range(*v)?;
    }

    let n = values.len() as i64;
    let sum: i64 = values.iter().sum();
    let passed = values.iter().filter(|v| **v >= pass_threshold).count() as i64;

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    Ok(Statistics {
        count: values.len(),
        mean: round_half_even(sum, n),
        median: compute_median(&sorted),
        mode: compute_mode(&sorted),
        pass_rate: round_half_even(100 * passed, n),
        bucket_counts: bucket_counts(values),
    })
}

/// Credit-weighted mean of `(mark, credit)` pairs.
pub fn compute_weighted_mean(pairs: &[(i64, i64)]) -> Result<i64, StatsError> {
    if pairs.is_empty() {
        return Err(StatsError::NoData);
    }
    let mut weighted_sum = 0_i64;
    let mut total_credit = 0_i64;
    for (mark, credit) in pairs {
        check_range(*mark)?;
        if *credit < 0 {
            return Err(StatsError::NegativeCredit(*credit));
        }
        weighted_sum = mark
            .checked_mul(*credit)
            .and_then(|w| weighted_sum.checked_add(w))
            .ok_or(StatsError::CreditOverflow)?;
        total_credit = total_credit
            .checked_add(*credit)
            .ok_or(StatsError::CreditOverflow)?;
    }
    if total_credit == 0 {
        return Err(StatsError::ZeroCredit);
    }
    Ok(round_half_even(weighted_sum, total_credit))
}

pub fn raw_mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
}

/// Population standard deviation (divides by n, so a single mark gives 0).
pub fn population_stdev(values: &[i64]) -> Option<f64> {
    let mean = raw_mean(values)?;
    let var = values
        .iter()
        .map(|v| {
            let d = *v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_half_even_breaks_ties_to_even() {
        assert_eq!(round_half_even(5, 2), 2);
        assert_eq!(round_half_even(7, 2), 4);
        assert_eq!(round_half_even(1, 2), 0);
        assert_eq!(round_half_even(10, 3), 3);
        assert_eq!(round_half_even(11, 3), 4);
        assert_eq!(round_half_even(4000, 60), 67);
        assert_eq!(round_half_even(0, 7), 0);
    }

    #[test]
    fn statistics_on_known_sequence() {
        let s = compute_statistics(&[35, 40, 55, 55, 90], DEFAULT_PASS_THRESHOLD).expect("stats");
        assert_eq!(s.count, 5);
        assert_eq!(s.mean, 55);
        assert_eq!(s.median, 55);
        assert_eq!(s.mode, 55);
        assert_eq!(s.pass_rate, 80);
        assert_eq!(s.bucket_counts, [0, 1, 3, 0, 1]);
    }

    #[test]
    fn mean_rounds_half_to_even() {
        // 41.5 -> 42, 42.5 -> 42
        assert_eq!(compute_statistics(&[41, 42], 40).expect("stats").mean, 42);
        assert_eq!(compute_statistics(&[42, 43], 40).expect("stats").mean, 42);
        // 62.666.. -> 63
        assert_eq!(compute_statistics(&[60, 64, 64], 40).expect("stats").mean, 63);
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        assert_eq!(compute_statistics(&[90, 10, 50, 51], 40).expect("stats").median, 50);
        assert_eq!(compute_statistics(&[10, 53, 90, 50], 40).expect("stats").median, 52);
    }

    #[test]
    fn mode_ties_resolve_to_smallest_value() {
        let s = compute_statistics(&[70, 30, 70, 30, 90], 40).expect("stats");
        assert_eq!(s.mode, 30);
        let all_distinct = compute_statistics(&[88, 12, 47], 40).expect("stats");
        assert_eq!(all_distinct.mode, 12);
    }

    #[test]
    fn bucket_edges_are_inclusive() {
        let s = compute_statistics(&[0, 19, 20, 39, 40, 59, 60, 79, 80, 100], 40).expect("stats");
        assert_eq!(s.bucket_counts, [2, 2, 2, 2, 2]);
    }

    #[test]
    fn pass_rate_matches_rounded_ratio() {
        let cases: Vec<Vec<i64>> = vec![
            vec![39],
            vec![40],
            vec![39, 40, 41],
            vec![10, 20, 30, 40, 50, 60, 70],
            vec![100; 9],
            vec![0, 0, 0, 45, 45, 45, 45, 45],
        ];
        for values in cases {
            let s = compute_statistics(&values, 40).expect("stats");
            let passed = values.iter().filter(|v| **v >= 40).count() as f64;
            let expected = (100.0 * passed / values.len() as f64).round_ties_even() as i64;
            assert_eq!(s.pass_rate, expected, "values {:?}", values);
            assert!((0..=100).contains(&s.pass_rate));
        }
    }

    #[test]
    fn custom_pass_threshold_is_honoured() {
        let s = compute_statistics(&[45, 50, 55, 60], 50).expect("stats");
        assert_eq!(s.pass_rate, 75);
    }

    #[test]
    fn empty_input_is_no_data() {
        assert_eq!(compute_statistics(&[], 40), Err(StatsError::NoData));
        assert_eq!(compute_weighted_mean(&[]), Err(StatsError::NoData));
        assert_eq!(population_stdev(&[]), None);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert_eq!(
            compute_statistics(&[50, 101], 40),
            Err(StatsError::OutOfRange(101))
        );
        assert_eq!(compute_statistics(&[-1], 40), Err(StatsError::OutOfRange(-1)));
    }

    #[test]
    fn statistics_do_not_touch_input_order() {
        let values = vec![90, 10, 55, 40, 70];
        let first = compute_statistics(&values, 40).expect("stats");
        let second = compute_statistics(&values, 40).expect("stats");
        assert_eq!(first, second);
        assert_eq!(values, vec![90, 10, 55, 40, 70]);
    }

    #[test]
    fn weighted_mean_uses_credits() {
        assert_eq!(compute_weighted_mean(&[(80, 20), (60, 40)]), Ok(67));
        assert_eq!(compute_weighted_mean(&[(70, 10)]), Ok(70));
        assert_eq!(compute_weighted_mean(&[(70, 0), (50, 10)]), Ok(50));
    }

    #[test]
    fn weighted_mean_rejects_bad_credits() {
        assert_eq!(
            compute_weighted_mean(&[(80, -5)]),
            Err(StatsError::NegativeCredit(-5))
        );
        assert_eq!(
            compute_weighted_mean(&[(80, 0), (60, 0)]),
            Err(StatsError::ZeroCredit)
        );
    }

    #[test]
    fn weighted_mean_reports_overflow_instead_of_wrapping() {
        assert_eq!(
            compute_weighted_mean(&[(80, i64::MAX / 10)]),
            Err(StatsError::CreditOverflow)
        );
        assert_eq!(
            compute_weighted_mean(&[(0, i64::MAX), (0, 1)]),
            Err(StatsError::CreditOverflow)
        );
    }

    #[test]
    fn round_half_even_with_huge_denominator() {
        let den = i64::MAX - 1;
        assert_eq!(round_half_even(den / 2, den), 0);
        assert_eq!(round_half_even(den / 2 + 1, den), 1);
        assert_eq!(round_half_even(i64::MAX - 2, den), 1);
    }

    #[test]
    fn population_stdev_of_constant_is_zero() {
        assert_eq!(population_stdev(&[60, 60, 60]), Some(0.0));
        let sd = population_stdev(&[40, 60]).expect("stdev");
        assert!((sd - 10.0).abs() < 1e-9);
    }

    #[test]
    fn mark_value_from_parts() {
        assert_eq!(MarkValue::from_parts(Some(55), None), Ok(MarkValue::Scored(55)));
        assert_eq!(
            MarkValue::from_parts(None, Some("abs")),
            Ok(MarkValue::Code(AdminCode::Absent))
        );
        assert_eq!(MarkValue::from_parts(None, Some("  ")), Ok(MarkValue::NoSubmission));
        assert_eq!(
            MarkValue::from_parts(Some(55), Some("EN")),
            Err(StatsError::ValueAndCode)
        );
        assert_eq!(
            MarkValue::from_parts(None, Some("XX")),
            Err(StatsError::UnknownCode("XX".to_string()))
        );
        assert_eq!(
            MarkValue::from_parts(Some(120), None),
            Err(StatsError::OutOfRange(120))
        );
    }

    #[test]
    fn numeric_values_skip_codes_and_blanks() {
        let (values, tally) = numeric_values(vec![
            MarkValue::Scored(50),
            MarkValue::Code(AdminCode::Absent),
            MarkValue::NoSubmission,
            MarkValue::Scored(0),
        ]);
        assert_eq!(values, vec![50, 0]);
        assert_eq!(tally.scored_count, 2);
        assert_eq!(tally.coded_count, 1);
        assert_eq!(tally.no_submission_count, 1);
    }
}
