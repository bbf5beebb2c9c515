//! Reporting over mark rows: per class, per lecturer and system-wide.
//!
//! Nothing here is cached. Every call reloads the rows and recomputes, which
//! keeps results consistent with the latest edits but makes the system-wide
//! reports scale with the total number of marks.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::calc::{self, MarkTally, MarkValue, Statistics};
use crate::error::{AppError, AppResult, EntityKind};
use crate::policy::{authorize, Operation, ResourceFacts};
use crate::ranking::{self, ClassMetric, ClassRanking};
use crate::store::classes::{self, ClassRow};
use crate::store::marks::{self, ClassMark};
use crate::store::users;
use crate::usecases::classes::load_class;
use crate::usecases::RequestCtx;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStatistics {
    pub class_code: String,
    pub class_name: String,
    pub pass_threshold: i64,
    pub statistics: Statistics,
    pub tally: MarkTally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassBreakdown {
    pub class_code: String,
    pub class_name: String,
    /// `None` when the class has no numeric marks yet.
    pub statistics: Option<Statistics>,
    pub tally: MarkTally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LecturerMetrics {
    pub lecturer_id: i64,
    pub lecturer_email: String,
    pub pass_threshold: i64,
    /// `None` until any of the lecturer's classes has a numeric mark.
    pub overall: Option<Statistics>,
    pub classes: Vec<ClassBreakdown>,
    pub ranking: ClassRanking,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStatistics {
    pub pass_threshold: i64,
    pub class_count: usize,
    pub classes_with_marks: usize,
    pub overall: Statistics,
    pub tally: MarkTally,
    pub ranking: ClassRanking,
}

fn group_by_class(rows: Vec<ClassMark>) -> BTreeMap<String, Vec<MarkValue>> {
    let mut out: BTreeMap<String, Vec<MarkValue>> = BTreeMap::new();
    for row in rows {
        out.entry(row.class_code)
            .or_default()
            .push(row.mark.mark_value());
    }
    out
}

fn class_metrics(grouped: &BTreeMap<String, Vec<MarkValue>>) -> Vec<ClassMetric> {
    grouped
        .iter()
        .filter_map(|(code, values)| {
            let (numeric, _) = calc::numeric_values(values.iter().copied());
            ClassMetric::from_values(code, &numeric)
        })
        .collect()
}

fn breakdown(
    class: &ClassRow,
    values: &[MarkValue],
    pass_threshold: i64,
) -> AppResult<ClassBreakdown> {
    let (numeric, tally) = calc::numeric_values(values.iter().copied());
    Ok(ClassBreakdown {
        class_code: class.code.clone(),
        class_name: class.name.clone(),
        statistics: statistics_if_any(&numeric, pass_threshold)?,
        tally,
    })
}

/// Like [`calc::compute_statistics`], with an empty input as `None`.
fn statistics_if_any(values: &[i64], pass_threshold: i64) -> AppResult<Option<Statistics>> {
    match calc::compute_statistics(values, pass_threshold) {
        Ok(s) => Ok(Some(s)),
        Err(calc::StatsError::NoData) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// get_class_statistics
pub fn class_statistics(ctx: &RequestCtx<'_>, class_code: &str) -> AppResult<ClassStatistics> {
    let principal = ctx.principal()?;
    let class = load_class(ctx, class_code)?;
    authorize(&principal, Operation::ClassStatistics, &ResourceFacts::class(class.lecturer_id))?;

    let rows = marks::find_marks_for_class(ctx.conn, class.id)?;
    let (numeric, tally) = calc::numeric_values(rows.iter().map(|m| m.mark_value()));
    let statistics = calc::compute_statistics(&numeric, ctx.config.pass_threshold)?;
    Ok(ClassStatistics {
        class_code: class.code,
        class_name: class.name,
        pass_threshold: ctx.config.pass_threshold,
        statistics,
        tally,
    })
}

/// get_lecturer_metrics. Without an email the caller's own classes are used.
///
/// Unlike the class and global reports this never answers `NoData`: a
/// lecturer whose classes hold no numeric marks still gets the per-class
/// tallies, with `overall` left empty.
pub fn lecturer_metrics(
    ctx: &RequestCtx<'_>,
    lecturer_email: Option<&str>,
) -> AppResult<LecturerMetrics> {
    let principal = ctx.principal()?;
    let target = match lecturer_email {
        Some(email) => {
            let user = users::find_principal_by_subject(ctx.conn, email)?
                .ok_or(AppError::NotFound(EntityKind::User))?;
            (user.id, user.email, user.is_lecturer)
        }
        None => (principal.id, principal.email.clone(), principal.is_lecturer),
    };
    let (target_id, target_email, target_is_lecturer) = target;
    authorize(
        &principal,
        Operation::LecturerMetrics,
        &ResourceFacts::target_user(target_id),
    )?;
    if !target_is_lecturer {
        return Err(AppError::invalid(format!("{} is not a lecturer", target_email)));
    }

    let pass_threshold = ctx.config.pass_threshold;
    let taught = classes::list_classes_for_lecturer(ctx.conn, target_id)?;
    let rows = marks::find_marks_for_principal(ctx.conn, target_id)?;
    let grouped = group_by_class(rows);

    let (numeric, _) = calc::numeric_values(grouped.values().flatten().copied());
    let overall = statistics_if_any(&numeric, pass_threshold)?;

    let mut per_class = Vec::with_capacity(taught.len());
    for class in &taught {
        let values = grouped.get(&class.code).map(Vec::as_slice).unwrap_or(&[]);
        per_class.push(breakdown(class, values, pass_threshold)?);
    }

    Ok(LecturerMetrics {
        lecturer_id: target_id,
        lecturer_email: target_email,
        pass_threshold,
        overall,
        classes: per_class,
        ranking: ranking::rank_classes(&class_metrics(&grouped), ctx.config.rank_size),
    })
}

/// get_global_statistics
pub fn global_statistics(ctx: &RequestCtx<'_>) -> AppResult<GlobalStatistics> {
    let principal = ctx.principal()?;
    authorize(&principal, Operation::GlobalStatistics, &ResourceFacts::none())?;

    let class_count = classes::list_classes(ctx.conn)?.len();
    let grouped = group_by_class(marks::find_all_marks(ctx.conn)?);
    let (numeric, tally) = calc::numeric_values(grouped.values().flatten().copied());
    let overall = calc::compute_statistics(&numeric, ctx.config.pass_threshold)?;
    let metrics = class_metrics(&grouped);

    Ok(GlobalStatistics {
        pass_threshold: ctx.config.pass_threshold,
        class_count,
        classes_with_marks: metrics.len(),
        overall,
        tally,
        ranking: ranking::rank_classes(&metrics, ctx.config.rank_size),
    })
}

/// Ranks every class with numeric marks. `n` defaults to the configured size.
pub fn rank_classes(ctx: &RequestCtx<'_>, n: Option<usize>) -> AppResult<ClassRanking> {
    let principal = ctx.principal()?;
    authorize(&principal, Operation::RankClasses, &ResourceFacts::none())?;
    let grouped = group_by_class(marks::find_all_marks(ctx.conn)?);
    Ok(ranking::rank_classes(
        &class_metrics(&grouped),
        n.unwrap_or(ctx.config.rank_size),
    ))
}
