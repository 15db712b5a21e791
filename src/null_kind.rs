//! The "Null" scalar type: validates that a value is, actually, null.
//!
//! Ordinary optional/nullable modifiers mean "any value or absence". This
//! type expresses the opposite contract: the field may hold *only* null (or
//! one of its absent-equivalents), and marking it required guarantees the
//! document carries an explicit null rather than omitting the field.
//!
//! Cast accepts null, undefined (absent) and the empty string; everything
//! else fails, falsy values like `0` and `false` included.

use serde_json::Value;

use crate::model::{self, CastError, QueryCast, QueryCastError, ScalarType};

pub const TYPE_NAME: &str = "Null";

/// The canonical null sentinel every null-equivalent input casts to.
pub const CANONICAL: Value = Value::Null;

/// Register the type into the process-wide registry. Idempotent; safe to
/// call from every compile.
pub fn register() {
    model::register_scalar(ScalarType {
        name: TYPE_NAME,
        cast,
        check_required,
        cast_for_query,
    });
}

/// `None` is "undefined": the field was absent from the document.
pub fn cast(value: Option<&Value>, path: &str) -> Result<Value, CastError> {
    match value {
        None => Ok(CANONICAL),
        Some(Value::Null) => Ok(CANONICAL),
        Some(Value::String(s)) if s.is_empty() => Ok(CANONICAL),
        Some(other) => Err(CastError {
            kind: TYPE_NAME,
            value: other.to_string(),
            path: path.to_string(),
        }),
    }
}

/// Required is satisfied only by the literal null, not by absence.
pub fn check_required(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Null))
}

/// Operator-aware casting for query conditions. Comparison operators cast a
/// single value; set-membership operators cast element-wise.
pub fn cast_for_query(operator: &str, value: &Value, path: &str) -> Result<QueryCast, QueryCastError> {
    match operator {
        "$eq" | "$lt" | "$lte" | "$gt" | "$gte" | "$ne" => {
            Ok(QueryCast::One(cast(Some(value), path)?))
        }
        "$in" | "$nin" | "$all" | "$mod" => {
            let elements = match value {
                Value::Array(xs) => xs
                    .iter()
                    .map(|x| cast(Some(x), path))
                    .collect::<Result<Vec<_>, _>>()?,
                single => vec![cast(Some(single), path)?],
            };
            Ok(QueryCast::Many(elements))
        }
        other => Err(QueryCastError::UnsupportedOperator {
            operator: other.to_string(),
            kind: TYPE_NAME,
        }),
    }
}

// ------------------------------- Tests ------------------------------------ //
