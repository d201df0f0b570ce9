//! Feature filters.
//!
//! A [`FilterExpr`] is the declarative filter of a style layer. It is
//! compiled once into a [`FeatureFilter`], a predicate closure over
//! features, so repeated evaluation does not walk the expression tree
//! matching on operator names.

use serde::{Deserialize, Serialize};

use super::{Feature, Value};

/// Key selecting the geometry type instead of a property.
pub const GEOMETRY_TYPE_KEY: &str = "$type";

/// Declarative feature filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpr {
    All(Vec<FilterExpr>),
    Any(Vec<FilterExpr>),
    None(Vec<FilterExpr>),
    Eq(String, Value),
    Ne(String, Value),
    Lt(String, Value),
    Le(String, Value),
    Gt(String, Value),
    Ge(String, Value),
    In(String, Vec<Value>),
    NotIn(String, Vec<Value>),
    Has(String),
    NotHas(String),
}

type Predicate = Box<dyn Fn(&Feature) -> bool + Send + Sync>;

/// A compiled feature predicate.
pub struct FeatureFilter {
    predicate: Predicate,
}

impl FeatureFilter {
    /// Compile `expr`; a missing filter accepts every feature.
    pub fn compile(expr: Option<&FilterExpr>) -> Self {
        Self {
            predicate: match expr {
                Some(expr) => compile(expr),
                None => Box::new(|_: &Feature| true),
            },
        }
    }

    /// Whether `feature` passes the filter.
    pub fn matches(&self, feature: &Feature) -> bool {
        (self.predicate)(feature)
    }
}

impl std::fmt::Debug for FeatureFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureFilter").finish_non_exhaustive()
    }
}

fn lookup(feature: &Feature, key: &str) -> Option<Value> {
    if key == GEOMETRY_TYPE_KEY {
        Some(Value::from(feature.geometry_type.as_str()))
    } else {
        feature.property(key).cloned()
    }
}

fn compare(key: String, value: Value, accept: fn(std::cmp::Ordering) -> bool) -> Predicate {
    Box::new(move |feature: &Feature| {
        let Some(actual) = lookup(feature, &key) else {
            return false;
        };
        let ordering = match (&actual, &value) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        };
        ordering.is_some_and(accept)
    })
}

fn compile(expr: &FilterExpr) -> Predicate {
    match expr.clone() {
        FilterExpr::All(exprs) => {
            let preds: Vec<_> = exprs.iter().map(compile).collect();
            Box::new(move |f: &Feature| preds.iter().all(|p| p(f)))
        }
        FilterExpr::Any(exprs) => {
            let preds: Vec<_> = exprs.iter().map(compile).collect();
            Box::new(move |f: &Feature| preds.iter().any(|p| p(f)))
        }
        FilterExpr::None(exprs) => {
            let preds: Vec<_> = exprs.iter().map(compile).collect();
            Box::new(move |f: &Feature| !preds.iter().any(|p| p(f)))
        }
        FilterExpr::Eq(key, value) => {
            Box::new(move |f: &Feature| lookup(f, &key).as_ref() == Some(&value))
        }
        FilterExpr::Ne(key, value) => {
            Box::new(move |f: &Feature| lookup(f, &key).as_ref() != Some(&value))
        }
        FilterExpr::Lt(key, value) => compare(key, value, std::cmp::Ordering::is_lt),
        FilterExpr::Le(key, value) => compare(key, value, std::cmp::Ordering::is_le),
        FilterExpr::Gt(key, value) => compare(key, value, std::cmp::Ordering::is_gt),
        FilterExpr::Ge(key, value) => compare(key, value, std::cmp::Ordering::is_ge),
        FilterExpr::In(key, values) => Box::new(move |f: &Feature| {
            lookup(f, &key).is_some_and(|actual| values.contains(&actual))
        }),
        FilterExpr::NotIn(key, values) => Box::new(move |f: &Feature| {
            !lookup(f, &key).is_some_and(|actual| values.contains(&actual))
        }),
        FilterExpr::Has(key) => Box::new(move |f: &Feature| lookup(f, &key).is_some()),
        FilterExpr::NotHas(key) => Box::new(move |f: &Feature| lookup(f, &key).is_none()),
    }
}
