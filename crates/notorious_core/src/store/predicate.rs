//! Document predicates: always-true, field equality, field membership and
//! their conjunction.
//!
//! # Invariants
//! - A missing field compares equal to JSON `null`.
//! - `In` with no values matches nothing.
//! - `And` of nothing (and `All`) matches everything.

use crate::model::entity::EntityId;
use serde_json::Value;
use std::ops::BitAnd;

/// Field every stored document is keyed by.
pub const ID_FIELD: &str = "id";

static NULL: Value = Value::Null;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    All,
    Eq { field: String, value: Value },
    In { field: String, values: Vec<Value> },
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn any_of<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn id_eq(id: EntityId) -> Self {
        Self::eq(ID_FIELD, id.to_string())
    }

    pub fn id_in<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = EntityId>,
    {
        Self::any_of(ID_FIELD, ids.into_iter().map(|id| id.to_string()))
    }

    /// Intersects two predicates, collapsing `All` and nested conjunctions.
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::All, other) => other,
            (this, Predicate::All) => this,
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), other) => {
                left.push(other);
                Predicate::And(left)
            }
            (this, Predicate::And(right)) => {
                let mut parts = Vec::with_capacity(right.len() + 1);
                parts.push(this);
                parts.extend(right);
                Predicate::And(parts)
            }
            (this, other) => Predicate::And(vec![this, other]),
        }
    }

    /// Evaluates the predicate against one JSON document.
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Eq { field, value } => lookup(document, field) == value,
            Predicate::In { field, values } => values.contains(lookup(document, field)),
            Predicate::And(parts) => parts.iter().all(|part| part.matches(document)),
        }
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Predicate) -> Predicate {
        self.and(rhs)
    }
}

/// Resolves a dotted field path, treating absent fields as `null`.
fn lookup<'doc>(document: &'doc Value, field: &str) -> &'doc Value {
    field
        .split('.')
        .try_fold(document, |current, key| current.get(key))
        .unwrap_or(&NULL)
}
