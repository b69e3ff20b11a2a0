//! Typed row selections: which entities and which years.

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

/// An inclusive span of years. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearSpan {
    pub start: i32,
    pub end: i32,
}

impl YearSpan {
    /// Create a span, swapping the bounds if they are inverted.
    pub fn new(a: i32, b: i32) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Check whether a year falls inside the span.
    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }

    /// Intersect with another span; `None` when they do not overlap.
    pub fn intersect(&self, other: &YearSpan) -> Option<YearSpan> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(YearSpan { start, end })
    }

    /// The span as a `(start, end)` pair.
    pub fn as_pair(&self) -> (i32, i32) {
        (self.start, self.end)
    }
}

impl fmt::Display for YearSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Which entities a query covers.
///
/// Serializes as the string `"all"` or as a list of canonical entity names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntitySelection {
    /// Every entity in the dataset.
    All,
    /// An ordered list of canonical entity names.
    Only(Vec<String>),
}

impl EntitySelection {
    /// Check whether the selection names exactly the given entity.
    pub fn includes(&self, entity: &str) -> bool {
        match self {
            EntitySelection::All => true,
            EntitySelection::Only(names) => names.iter().any(|n| n == entity),
        }
    }

    /// The named entities, or an empty slice for [`EntitySelection::All`].
    pub fn names(&self) -> &[String] {
        match self {
            EntitySelection::All => &[],
            EntitySelection::Only(names) => names,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, EntitySelection::All)
    }
}

impl fmt::Display for EntitySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntitySelection::All => write!(f, "all entities"),
            EntitySelection::Only(names) => write!(f, "{}", names.join(", ")),
        }
    }
}

impl Serialize for EntitySelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EntitySelection::All => serializer.serialize_str("all"),
            EntitySelection::Only(names) => {
                let mut seq = serializer.serialize_seq(Some(names.len()))?;
                for name in names {
                    seq.serialize_element(name)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for EntitySelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SelectionVisitor;

        impl<'de> Visitor<'de> for SelectionVisitor {
            type Value = EntitySelection;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("the string \"all\" or a list of entity names")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                if value.eq_ignore_ascii_case("all") {
                    Ok(EntitySelection::All)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(value), &self))
                }
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut names = Vec::new();
                while let Some(name) = seq.next_element::<String>()? {
                    names.push(name);
                }
                Ok(EntitySelection::Only(names))
            }
        }

        deserializer.deserialize_any(SelectionVisitor)
    }
}
