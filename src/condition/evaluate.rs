/*!
 * Condition Evaluation
 * Pure, total evaluation of resolved condition trees
 */

use super::types::{CompareOp, ConditionExpr};
use crate::policy::RequestContext;
use serde_json::Value;
use std::cmp::Ordering;

impl ConditionExpr {
    /// Evaluate against a request context
    ///
    /// Never fails. A missing attribute makes every comparison variant
    /// `false`; `Not` negates whatever its child yields. `All` stops at the
    /// first `false`, `Any` at the first `true`.
    pub fn evaluate(&self, context: &RequestContext) -> bool {
        match self {
            ConditionExpr::Always(value) => *value,
            ConditionExpr::Equals { attribute, value } => context
                .attribute(attribute)
                .is_some_and(|actual| values_equal(actual, value)),
            ConditionExpr::Compare {
                attribute,
                op,
                value,
            } => context
                .attribute(attribute)
                .is_some_and(|actual| compare(actual, *op, value)),
            ConditionExpr::Exists(attribute) => context.attribute(attribute).is_some(),
            ConditionExpr::TimeWindow {
                not_before,
                not_after,
            } => {
                let now = context.unix_seconds();
                not_before.map_or(true, |start| now >= start)
                    && not_after.map_or(true, |end| now <= end)
            }
            ConditionExpr::All(children) => children.iter().all(|c| c.evaluate(context)),
            ConditionExpr::Any(children) => children.iter().any(|c| c.evaluate(context)),
            ConditionExpr::Not(child) => !child.evaluate(context),
        }
    }
}

/// Equality that treats `1` and `1.0` as the same number
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Ordering between two scalars of the same kind
fn ordering(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn compare(actual: &Value, op: CompareOp, expected: &Value) -> bool {
    match op {
        CompareOp::Eq => values_equal(actual, expected),
        CompareOp::Ne => !values_equal(actual, expected),
        CompareOp::Lt => ordering(actual, expected) == Some(Ordering::Less),
        CompareOp::Le => matches!(
            ordering(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        CompareOp::Gt => ordering(actual, expected) == Some(Ordering::Greater),
        CompareOp::Ge => matches!(
            ordering(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CompareOp::In => expected
            .as_array()
            .is_some_and(|items| items.iter().any(|item| values_equal(actual, item))),
        CompareOp::Contains => match (actual, expected) {
            (Value::Array(items), _) => items.iter().any(|item| values_equal(item, expected)),
            (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
            _ => false,
        },
        CompareOp::StartsWith => match (actual, expected) {
            (Value::String(s), Value::String(prefix)) => s.starts_with(prefix.as_str()),
            _ => false,
        },
    }
}
