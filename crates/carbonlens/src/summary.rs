//! Answer assembly: summaries, statistics and chart points.

use serde::Serialize;

use crate::execution::{ExecutionResult, ResultValue};
use crate::intent::{Aggregation, IntentOrigin};
use crate::store::Row;
use crate::validation::ValidatedIntent;

/// Maximum number of data points returned with an answer.
pub const DATA_POINT_LIMIT: usize = 500;

/// One `(entity, year, value)` observation behind an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub entity: String,
    pub year: i32,
    pub value: f64,
}

/// Descriptive statistics over the rows a query selected.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Statistics {
    /// Rows with a present value.
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
}

impl Statistics {
    /// Compute statistics of `column` over the given rows, skipping missing values.
    pub fn from_rows(rows: &[Row<'_>], column: &str) -> Self {
        let mut stats = Statistics::default();
        let mut sum = 0.0;

        for row in rows {
            let Some(value) = row.value(column) else {
                continue;
            };
            stats.count += 1;
            sum += value;
            stats.min = Some(stats.min.map_or(value, |m| m.min(value)));
            stats.max = Some(stats.max.map_or(value, |m| m.max(value)));
            stats.first_year = Some(stats.first_year.map_or(row.year(), |y| y.min(row.year())));
            stats.last_year = Some(stats.last_year.map_or(row.year(), |y| y.max(row.year())));
        }

        if stats.count > 0 {
            stats.mean = Some(sum / stats.count as f64);
        }
        stats
    }
}

/// The full answer to one question.
#[derive(Debug, Clone, Serialize)]
pub struct QueryAnswer {
    pub result: ExecutionResult,
    pub intent: ValidatedIntent,
    pub summary: String,
    pub statistics: Statistics,
    pub data: Vec<DataPoint>,
    pub query_used: String,
    pub origin: IntentOrigin,
    /// Human-readable repairs made during validation.
    pub notes: Vec<String>,
}

/// Contributing observations, in row order, capped at [`DATA_POINT_LIMIT`].
pub fn data_points(rows: &[Row<'_>], column: &str) -> Vec<DataPoint> {
    rows.iter()
        .filter_map(|row| {
            row.value(column).map(|value| DataPoint {
                entity: row.entity().to_string(),
                year: row.year(),
                value,
            })
        })
        .take(DATA_POINT_LIMIT)
        .collect()
}

/// A sentence restating exactly what was computed.
pub fn summarize(intent: &ValidatedIntent, result: &ExecutionResult) -> String {
    let metric = &intent.metric().name;
    let label = aggregation_label(intent.aggregation());
    let years = intent.years();
    let unit = &result.unit;

    match &result.value {
        ResultValue::Empty => format!(
            "No {} data for {} in {}.",
            metric,
            intent.entities(),
            years
        ),
        ResultValue::Scalar(value) => format!(
            "{} {} for {} in {}: {}.",
            label,
            metric,
            intent.entities(),
            years,
            with_unit(format_number(*value), unit)
        ),
        ResultValue::Comparison(entries) => {
            let parts: Vec<String> = entries
                .iter()
                .map(|e| match e.value {
                    Some(v) => format!("{} {}", e.entity, with_unit(format_number(v), unit)),
                    None => format!("{} no data", e.entity),
                })
                .collect();
            format!("{} {} in {}: {}.", label, metric, years, parts.join("; "))
        }
        ResultValue::Series(points) => match (points.first(), points.last()) {
            (Some(first), Some(last)) => {
                let mut text = format!(
                    "{} for {}: {} in {} to {} in {}",
                    metric,
                    intent.entities(),
                    with_unit(format_number(first.value), unit),
                    first.year,
                    with_unit(format_number(last.value), unit),
                    last.year
                );
                if first.value != 0.0 && points.len() > 1 {
                    let change = (last.value - first.value) / first.value.abs() * 100.0;
                    text.push_str(&format!(" ({:+.1}%)", change));
                }
                text.push('.');
                text
            }
            _ => format!("No {} data for {} in {}.", metric, intent.entities(), years),
        },
    }
}

fn aggregation_label(aggregation: Aggregation) -> &'static str {
    match aggregation {
        Aggregation::Average => "Average",
        Aggregation::Sum => "Total",
        Aggregation::Min => "Minimum",
        Aggregation::Max => "Maximum",
        Aggregation::Count => "Number of rows with",
        Aggregation::Latest => "Latest",
        Aggregation::Trend => "Trend of",
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn with_unit(number: String, unit: &str) -> String {
    if unit.is_empty() {
        number
    } else {
        format!("{} {}", number, unit)
    }
}
