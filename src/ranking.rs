use serde::Serialize;
use std::cmp::Ordering;

use crate::calc;

pub const DEFAULT_RANK_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassMetric {
    pub class_code: String,
    pub mean: f64,
    pub stdev: f64,
}

impl ClassMetric {
    /// `None` when the class has no numeric marks.
    pub fn from_values(class_code: &str, values: &[i64]) -> Option<Self> {
        Some(ClassMetric {
            class_code: class_code.to_string(),
            mean: calc::raw_mean(values)?,
            stdev: calc::population_stdev(values)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRanking {
    pub lowest: Vec<ClassMetric>,
    pub highest: Vec<ClassMetric>,
    pub most_consistent: Vec<ClassMetric>,
}

fn by_code(a: &ClassMetric, b: &ClassMetric) -> Ordering {
    a.class_code.cmp(&b.class_code)
}

/// Lowest and highest performing classes by mean, and the classes with the
/// smallest spread of marks. Ties fall back to class code so the output does
/// not depend on input order.
pub fn rank_classes(metrics: &[ClassMetric], n: usize) -> ClassRanking {
    let mut by_mean = metrics.to_vec();
    by_mean.sort_by(|a, b| a.mean.total_cmp(&b.mean).then_with(|| by_code(a, b)));
    let lowest = by_mean.iter().take(n).cloned().collect::<Vec<_>>();

    let mut by_mean_desc = metrics.to_vec();
    by_mean_desc.sort_by(|a, b| b.mean.total_cmp(&a.mean).then_with(|| by_code(a, b)));
    let highest = by_mean_desc.iter().take(n).cloned().collect::<Vec<_>>();

    let mut by_spread = metrics.to_vec();
    by_spread.sort_by(|a, b| a.stdev.total_cmp(&b.stdev).then_with(|| by_code(a, b)));
    let most_consistent = by_spread.into_iter().take(n).collect::<Vec<_>>();

    ClassRanking {
        lowest,
        highest,
        most_consistent,
    }
}
