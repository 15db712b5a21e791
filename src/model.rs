//! Minimal binding to the document-modeling layer.
//!
//! Two concerns live here: the process-wide registry of custom scalar types
//! (register-if-absent, so repeated registration is a no-op and concurrent
//! compiles stay race-free), and `Schema`, which turns a compiled
//! `SchemaDefinition` into an executable validator that walks a candidate
//! document and aggregates per-field failures.

use std::collections::BTreeMap;
use std::sync::Mutex;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::rules::{FieldRule, Repr, Rule, RuleNode, SchemaDefinition};

// --------------------------- Scalar type registry ------------------------- //

/// A candidate value failed to coerce to a scalar representation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Cast to {kind} failed for value `{value}` at path `{path}`")]
pub struct CastError {
    pub kind: &'static str,
    pub value: String,
    pub path: String,
}

/// Result of casting a value for use inside a query condition.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryCast {
    One(Value),
    Many(Vec<Value>),
}

#[derive(Debug, thiserror::Error)]
pub enum QueryCastError {
    #[error(transparent)]
    Cast(#[from] CastError),
    #[error("Can't use {operator} with {kind}.")]
    UnsupportedOperator { operator: String, kind: &'static str },
}

/// A custom scalar type: cast, required-predicate, operator-cast table.
/// Plain function pointers keep the surface minimal and the registry `Copy`.
#[derive(Debug, Clone, Copy)]
pub struct ScalarType {
    pub name: &'static str,
    /// `None` is "undefined" (the field was absent).
    pub cast: fn(Option<&Value>, &str) -> Result<Value, CastError>,
    pub check_required: fn(Option<&Value>) -> bool,
    pub cast_for_query: fn(&str, &Value, &str) -> Result<QueryCast, QueryCastError>,
}

static SCALAR_TYPES: Lazy<Mutex<BTreeMap<&'static str, ScalarType>>> =
    Lazy::new(|| Mutex::new(BTreeMap::new()));

/// Register-if-absent. The first registration under a name wins.
pub fn register_scalar(ty: ScalarType) {
    let mut registry = SCALAR_TYPES.lock().expect("scalar type registry lock");
    registry.entry(ty.name).or_insert(ty);
}

pub fn scalar(name: &str) -> Option<ScalarType> {
    let registry = SCALAR_TYPES.lock().expect("scalar type registry lock");
    registry.get(name).copied()
}

// ------------------------------- Validation ------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self { path: path.to_string(), message: message.into() }
    }
}

/// An executable schema built from a compiled definition.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: IndexMap<String, Rule>,
}

impl Schema {
    pub fn new(definition: SchemaDefinition) -> Self {
        Self { fields: definition.fields }
    }

    /// Validate one candidate document. All field failures are collected
    /// before reporting; there is no early bail per the aggregate contract.
    pub fn validate(&self, document: &Value) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        match document.as_object() {
            Some(map) => validate_fields(&self.fields, map, "", &mut errors),
            None => errors.push(ValidationError::new("", "document is not an object")),
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() { name.to_string() } else { format!("{prefix}.{name}") }
}

fn validate_fields(
    fields: &IndexMap<String, Rule>,
    object: &serde_json::Map<String, Value>,
    prefix: &str,
    errors: &mut Vec<ValidationError>,
) {
    for (name, rule) in fields {
        let path = join_path(prefix, name);
        validate_rule(rule, object.get(name.as_str()), &path, errors);
    }
}

fn validate_rule(rule: &Rule, value: Option<&Value>, path: &str, errors: &mut Vec<ValidationError>) {
    match &rule.node {
        RuleNode::Field(field) => validate_field(field, rule.required, value, path, errors),

        RuleNode::Object(fields) => match value {
            None | Some(Value::Null) => {
                if rule.required {
                    errors.push(ValidationError::new(path, "missing required value"));
                }
            }
            Some(Value::Object(map)) => validate_fields(fields, map, path, errors),
            Some(_) => errors.push(ValidationError::new(path, "expected an object value")),
        },

        RuleNode::Array(item) => match value {
            None | Some(Value::Null) => {
                if rule.required {
                    errors.push(ValidationError::new(path, "missing required value"));
                }
            }
            // deferred structural validation: each element checked
            // independently by the item rule
            Some(Value::Array(elements)) => {
                for (index, element) in elements.iter().enumerate() {
                    let element_path = join_path(path, &index.to_string());
                    validate_rule(item, Some(element), &element_path, errors);
                }
            }
            Some(_) => errors.push(ValidationError::new(path, "expected an array value")),
        },
    }
}

fn validate_field(
    field: &FieldRule,
    required: bool,
    value: Option<&Value>,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    // custom scalar types own both their cast and their required semantics
    if field.repr == Repr::Null {
        let Some(ty) = scalar(crate::null_kind::TYPE_NAME) else {
            errors.push(ValidationError::new(path, "scalar type Null is not registered"));
            return;
        };
        if let Err(err) = (ty.cast)(value, path) {
            errors.push(ValidationError::new(path, err.to_string()));
            return;
        }
        if required && !(ty.check_required)(value) {
            errors.push(ValidationError::new(path, "missing required value"));
        }
        return;
    }

    // explicit null counts as absence for the built-in representations
    let Some(value) = value.filter(|v| !v.is_null()) else {
        if required {
            errors.push(ValidationError::new(path, "missing required value"));
        }
        return;
    };

    let representable = match field.repr {
        Repr::Any => true,
        Repr::Text => value.is_string(),
        Repr::Number => value.is_number(),
        Repr::Boolean => value.is_boolean(),
        // raw reference id or an already-resolved document instance
        Repr::Reference => value.is_string() || value.is_object(),
        Repr::Null => true,
    };
    if !representable {
        errors.push(ValidationError::new(
            path,
            format!("expected a {} value", field.repr.name()),
        ));
        return;
    }

    if !field.enum_.is_empty() {
        let s = value.as_str().unwrap_or_default();
        if !field.enum_.iter().any(|allowed| allowed == s) {
            errors.push(ValidationError::new(
                path,
                format!("`{s}` is not in enumeration: {}", field.enum_.join(", ")),
            ));
        }
    }
    if let Some(rx) = &field.pattern {
        let s = value.as_str().unwrap_or_default();
        if !rx.is_match(s) {
            errors.push(ValidationError::new(
                path,
                format!("`{s}` does not match pattern {}", rx.as_str()),
            ));
        }
    }
    if let Some(n) = value.as_f64() {
        if let Some(min) = field.min {
            if n < min {
                errors.push(ValidationError::new(path, format!("Number less than minimum: {min}")));
            }
        }
        if let Some(max) = field.max {
            if n > max {
                errors.push(ValidationError::new(path, format!("Number more than maximum: {max}")));
            }
        }
    }
    for constraint in &field.checks {
        if !constraint.holds(value) {
            errors.push(ValidationError::new(path, constraint.message.clone()));
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
