//! Predicate types and evaluation logic for rule segment criteria.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateGroup {
    pub operator: LogicalOperator,
    #[serde(default)]
    pub predicates: Vec<Predicate>,
    #[serde(default)]
    pub groups: Vec<PredicateGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Compare a profile attribute. A missing attribute compares as null.
    Attribute {
        key: String,
        operator: ComparisonOperator,
        value: serde_json::Value,
    },
    /// Count occurrences of an event within the trailing window.
    Event {
        event_name: String,
        count_operator: ComparisonOperator,
        count: u64,
        within_days: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    IsSet,
    IsNotSet,
    InList,
    NotInList,
    /// Inclusive numeric range; `expected` is `[low, high]`.
    Between,
}

impl PredicateGroup {
    pub fn empty(operator: LogicalOperator) -> Self {
        Self {
            operator,
            predicates: Vec::new(),
            groups: Vec::new(),
        }
    }
}

pub fn compare_values(
    actual: &serde_json::Value,
    operator: ComparisonOperator,
    expected: &serde_json::Value,
) -> bool {
    use ComparisonOperator as Op;

    let strings = || actual.as_str().zip(expected.as_str());
    match operator {
        Op::Equals => actual == expected,
        Op::NotEquals => actual != expected,
        Op::GreaterThan => numeric_cmp(actual, expected) == Some(Ordering::Greater),
        Op::GreaterThanOrEqual => {
            matches!(numeric_cmp(actual, expected), Some(Ordering::Greater | Ordering::Equal))
        }
        Op::LessThan => numeric_cmp(actual, expected) == Some(Ordering::Less),
        Op::LessThanOrEqual => {
            matches!(numeric_cmp(actual, expected), Some(Ordering::Less | Ordering::Equal))
        }
        Op::Contains => strings().is_some_and(|(a, e)| a.contains(e)),
        Op::NotContains => strings().map_or(true, |(a, e)| !a.contains(e)),
        Op::StartsWith => strings().is_some_and(|(a, e)| a.starts_with(e)),
        Op::EndsWith => strings().is_some_and(|(a, e)| a.ends_with(e)),
        Op::IsSet => !actual.is_null(),
        Op::IsNotSet => actual.is_null(),
        Op::InList => expected.as_array().is_some_and(|list| list.contains(actual)),
        Op::NotInList => expected.as_array().map_or(true, |list| !list.contains(actual)),
        Op::Between => match expected.as_array().map(Vec::as_slice) {
            Some([low, high]) => {
                compare_values(actual, Op::GreaterThanOrEqual, low)
                    && compare_values(actual, Op::LessThanOrEqual, high)
            }
            _ => false,
        },
    }
}

pub fn compare_numbers(actual: u64, operator: ComparisonOperator, expected: u64) -> bool {
    match operator {
        ComparisonOperator::Equals => actual == expected,
        ComparisonOperator::NotEquals => actual != expected,
        ComparisonOperator::GreaterThan => actual > expected,
        ComparisonOperator::GreaterThanOrEqual => actual >= expected,
        ComparisonOperator::LessThan => actual < expected,
        ComparisonOperator::LessThanOrEqual => actual <= expected,
        _ => false,
    }
}

fn numeric_cmp(a: &serde_json::Value, b: &serde_json::Value) -> Option<Ordering> {
    let a_num = a.as_f64()?;
    let b_num = b.as_f64()?;
    a_num.partial_cmp(&b_num)
}
