//! Deterministic aggregation over validated intents.

use thiserror::Error;
use tracing::debug;

use super::result::{AppliedFilters, EntityValue, ExecutionResult, ResultValue, YearValue};
use crate::intent::Aggregation;
use crate::store::{DatasetStore, EntitySelection, Row};
use crate::validation::{Rejection, ValidatedIntent};

/// Execution failures. Only intent shapes that cannot be computed end up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("{0}")]
    UnsupportedCombination(Rejection),

    #[error("intent was validated against store {expected}, but the current store is {actual}")]
    StoreMismatch { expected: String, actual: String },
}

impl ExecutionError {
    /// The user-facing rejection, if this error is one.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ExecutionError::UnsupportedCombination(r) => Some(r),
            ExecutionError::StoreMismatch { .. } => None,
        }
    }
}

/// Apply a validated intent to the store it was validated against.
///
/// Reads only the in-memory store. The same intent on the same snapshot
/// always produces an identical result.
pub fn execute(
    intent: &ValidatedIntent,
    store: &DatasetStore,
) -> Result<ExecutionResult, ExecutionError> {
    if intent.store_fingerprint() != store.fingerprint() {
        return Err(ExecutionError::StoreMismatch {
            expected: intent.store_fingerprint().to_string(),
            actual: store.fingerprint().to_string(),
        });
    }

    let aggregation = intent.aggregation();
    if aggregation == Aggregation::Trend {
        check_single_series(intent.entities(), store)?;
    }

    let column = intent.metric().name.as_str();
    let years = intent.years();
    let rows = store.rows_matching(intent.entities(), &years);

    let unit = if aggregation == Aggregation::Count {
        "rows".to_string()
    } else {
        intent.metric().unit_or_empty().to_string()
    };
    let applied_filters = AppliedFilters {
        entities: intent.entities().clone(),
        years: years.as_pair(),
    };

    let (value, row_count) = if rows.is_empty() {
        (ResultValue::Empty, 0)
    } else {
        match aggregation {
            Aggregation::Trend => trend(&rows, column),
            _ if intent.comparison() => per_entity(intent.entities(), &rows, aggregation, column),
            Aggregation::Latest => {
                let groups = group_by_entity(intent.entities(), &rows);
                if let [(_, only)] = groups.as_slice() {
                    scalar(reduce(aggregation, only, column))
                } else {
                    per_entity(intent.entities(), &rows, aggregation, column)
                }
            }
            _ => scalar(reduce(aggregation, &rows, column)),
        }
    };

    debug!(
        metric = column,
        aggregation = %aggregation,
        row_count,
        empty = value.is_empty(),
        "Executed intent"
    );

    Ok(ExecutionResult {
        value,
        unit,
        applied_filters,
        row_count,
    })
}

fn check_single_series(
    entities: &EntitySelection,
    store: &DatasetStore,
) -> Result<(), ExecutionError> {
    let count = match entities {
        EntitySelection::All => store.entities().len(),
        EntitySelection::Only(names) => names.len(),
    };
    if count > 1 {
        let detail = match entities {
            EntitySelection::All => {
                "A trend needs exactly one entity; name the country or region to chart".to_string()
            }
            EntitySelection::Only(names) => format!(
                "A trend covers a single entity, but {} were requested ({})",
                names.len(),
                names.join(", ")
            ),
        };
        return Err(ExecutionError::UnsupportedCombination(Rejection::unsupported(
            detail,
        )));
    }
    Ok(())
}

fn scalar((value, count): (Option<f64>, usize)) -> (ResultValue, usize) {
    match value {
        Some(v) => (ResultValue::Scalar(v), count),
        None => (ResultValue::Empty, 0),
    }
}

fn trend(rows: &[Row<'_>], column: &str) -> (ResultValue, usize) {
    let points: Vec<YearValue> = rows
        .iter()
        .filter_map(|row| row.value(column).map(|value| YearValue { year: row.year(), value }))
        .collect();
    if points.is_empty() {
        (ResultValue::Empty, 0)
    } else {
        let count = points.len();
        (ResultValue::Series(points), count)
    }
}

fn per_entity(
    entities: &EntitySelection,
    rows: &[Row<'_>],
    aggregation: Aggregation,
    column: &str,
) -> (ResultValue, usize) {
    let mut total = 0;
    let entries = group_by_entity(entities, rows)
        .into_iter()
        .map(|(entity, group)| {
            let (value, count) = reduce(aggregation, &group, column);
            total += count;
            EntityValue {
                entity: entity.to_string(),
                value,
            }
        })
        .collect();
    (ResultValue::Comparison(entries), total)
}

/// Split rows per entity. Named selections keep their order and include
/// entities without rows; `All` lists entities as they appear in `rows`.
fn group_by_entity<'s, 'r>(
    entities: &'s EntitySelection,
    rows: &[Row<'r>],
) -> Vec<(&'s str, Vec<Row<'r>>)>
where
    'r: 's,
{
    match entities {
        EntitySelection::Only(names) => names
            .iter()
            .map(|name| {
                let group = rows.iter().filter(|r| r.entity() == name.as_str()).copied().collect();
                (name.as_str(), group)
            })
            .collect(),
        EntitySelection::All => {
            let mut groups: Vec<(&str, Vec<Row<'r>>)> = Vec::new();
            for row in rows {
                match groups.last_mut() {
                    Some((entity, group)) if *entity == row.entity() => group.push(*row),
                    _ => groups.push((row.entity(), vec![*row])),
                }
            }
            groups
        }
    }
}

/// Reduce rows to one value and the number of rows that contributed.
///
/// Rows must be year-ordered within an entity.
fn reduce(aggregation: Aggregation, rows: &[Row<'_>], column: &str) -> (Option<f64>, usize) {
    if aggregation == Aggregation::Count {
        return (Some(rows.len() as f64), rows.len());
    }

    // Trend is never reduced per entity; a single entity trend reports its last point.
    if matches!(aggregation, Aggregation::Latest | Aggregation::Trend) {
        return match rows.iter().rev().find_map(|row| row.value(column)) {
            Some(v) => (Some(v), 1),
            None => (None, 0),
        };
    }

    let values: Vec<f64> = rows.iter().filter_map(|row| row.value(column)).collect();
    if values.is_empty() {
        return (None, 0);
    }

    let value = match aggregation {
        Aggregation::Sum => values.iter().sum(),
        Aggregation::Average => values.iter().sum::<f64>() / values.len() as f64,
        Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Aggregation::Count | Aggregation::Latest | Aggregation::Trend => return (None, 0),
    };
    (Some(value), values.len())
}
