//! Execution output types.

use serde::Serialize;

use crate::store::EntitySelection;

/// One point of a trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

/// One entry of a per-entity result. `value` is `None` when the entity
/// has no data in the selected years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityValue {
    pub entity: String,
    pub value: Option<f64>,
}

/// The computed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultValue {
    /// No row matched; a legitimate answer, not an error.
    Empty,
    Scalar(f64),
    /// Year-ordered series for a single entity.
    Series(Vec<YearValue>),
    /// One value per entity, in selection order.
    Comparison(Vec<EntityValue>),
}

impl ResultValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, ResultValue::Empty)
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ResultValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_comparison(&self) -> Option<&[EntityValue]> {
        match self {
            ResultValue::Comparison(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_series(&self) -> Option<&[YearValue]> {
        match self {
            ResultValue::Series(points) => Some(points),
            _ => None,
        }
    }
}

/// Filters actually used to compute a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedFilters {
    pub entities: EntitySelection,
    /// Inclusive `(start, end)` years after clamping.
    pub years: (i32, i32),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub value: ResultValue,
    /// Unit of the metric, empty when unknown.
    pub unit: String,
    pub applied_filters: AppliedFilters,
    /// Rows that contributed to `value`.
    pub row_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_serialization_shapes() {
        assert_eq!(serde_json::to_value(ResultValue::Empty).unwrap(), serde_json::Value::Null);
        assert_eq!(serde_json::to_value(ResultValue::Scalar(1.5)).unwrap(), 1.5);

        let comparison = ResultValue::Comparison(vec![
            EntityValue {
                entity: "China".to_string(),
                value: Some(2.0),
            },
            EntityValue {
                entity: "India".to_string(),
                value: None,
            },
        ]);
        let json = serde_json::to_value(&comparison).unwrap();
        assert_eq!(json[0]["entity"], "China");
        assert!(json[1]["value"].is_null());

        let series = ResultValue::Series(vec![YearValue {
            year: 2020,
            value: 3.0,
        }]);
        assert_eq!(serde_json::to_value(&series).unwrap()[0]["year"], 2020);
    }
}
