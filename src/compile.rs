//! Recursive WS → rule-tree lowering.
//!
//! `compile` checks the root is of object kind, then `lower` walks each node
//! and produces its `rules::Rule`. Every kind in the closed vocabulary has an
//! explicit arm; unions and positional arrays fail loudly instead of
//! degrading. Compilation is pure: fresh rules per call, no partial result on
//! error, input never mutated.

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use regex::Regex;
use serde_json::Value;

use crate::null_kind;
use crate::rules::{Check, Constraint, FieldRule, Repr, Rule, RuleNode, SchemaDefinition};
use crate::ws::{Items, Kind, KindDecl, WsNode};

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("the schema root has to be of object type")]
    RootNotObject,

    #[error("unknown type `{0}`")]
    UnknownType(String),

    /// Recognized vocabulary that is deliberately not implemented
    /// (positional array types, union types).
    #[error("{0} are not yet supported")]
    Unsupported(&'static str),

    #[error("invalid pattern `{pattern}`: {source}")]
    BadPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Compile a WS root node into the mapping the modeling layer consumes.
///
/// Also makes sure the Null scalar type is registered (idempotent), so a
/// compiled `null` field can be validated later in the same process.
pub fn compile(root: &WsNode) -> Result<SchemaDefinition, SchemaError> {
    null_kind::register();

    match &root.kind {
        Some(KindDecl::Name(name)) if Kind::from_name(name) == Some(Kind::Object) => {}
        _ => return Err(SchemaError::RootNotObject),
    }

    let mut fields = IndexMap::new();
    for (name, child) in root.properties.iter().flatten() {
        fields.insert(name.clone(), lower(child)?);
    }
    Ok(SchemaDefinition { fields })
}

/// Lower one node. `required` is carried on the emitted rule and only takes
/// effect where the rule sits inside an object mapping.
pub fn lower(ws: &WsNode) -> Result<Rule, SchemaError> {
    let name = match &ws.kind {
        None => "any",
        Some(KindDecl::Name(name)) => name.as_str(),
        Some(KindDecl::Union(_)) => return Err(SchemaError::Unsupported("union types")),
    };
    let kind = Kind::from_name(name).ok_or_else(|| SchemaError::UnknownType(name.to_string()))?;

    let node = match kind {
        Kind::Any => RuleNode::Field(FieldRule::new(Repr::Any)),

        Kind::Object => {
            let mut fields = IndexMap::new();
            for (name, child) in ws.properties.iter().flatten() {
                fields.insert(name.clone(), lower(child)?);
            }
            RuleNode::Object(fields)
        }

        Kind::Array => match &ws.items {
            Some(Items::One(item)) => RuleNode::Array(Box::new(lower(item)?)),
            Some(Items::Positional(_)) => {
                return Err(SchemaError::Unsupported("positional array types"));
            }
            // no items declared: elements are unconstrained
            None => RuleNode::Array(Box::new(Rule {
                required: false,
                node: RuleNode::Field(FieldRule::new(Repr::Any)),
            })),
        },

        Kind::String | Kind::Text | Kind::Html => RuleNode::Field(lower_string(ws)?),
        Kind::Number => RuleNode::Field(lower_number(ws)),
        Kind::Boolean => RuleNode::Field(lower_boolean(ws)),

        Kind::Null => RuleNode::Field(FieldRule::new(Repr::Null)),
        Kind::Link => RuleNode::Field(FieldRule::new(Repr::Reference)),

        Kind::Date => RuleNode::Field(validated_text(Check::Date, "Not a valid date.")),
        Kind::Time => RuleNode::Field(validated_text(Check::Time, "Not a valid time.")),
        Kind::DatetimeLocal => {
            RuleNode::Field(validated_text(Check::DatetimeLocal, "Not a valid datetime-local."))
        }
    };

    Ok(Rule { required: ws.required, node })
}

fn lower_string(ws: &WsNode) -> Result<FieldRule, SchemaError> {
    let mut rule = FieldRule::new(Repr::Text);

    if let Some(lits) = &ws.enum_ {
        rule.enum_ = lits
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
    }
    if let Some(src) = &ws.pattern {
        // compiled from the source as given; the caller anchors
        let rx = Regex::new(src).map_err(|source| SchemaError::BadPattern {
            pattern: src.clone(),
            source,
        })?;
        rule.pattern = Some(rx);
    }
    if let Some(n) = ws.max_length {
        rule.checks
            .push(Constraint::new(Check::MaxLength(n), format!("String longer than {n}")));
    }
    if let Some(n) = ws.min_length {
        rule.checks
            .push(Constraint::new(Check::MinLength(n), format!("String shorter than {n}")));
    }
    Ok(rule)
}

fn lower_number(ws: &WsNode) -> FieldRule {
    let mut rule = FieldRule::new(Repr::Number);

    if let Some(lits) = &ws.enum_ {
        let values: Vec<f64> = lits.iter().filter_map(Value::as_f64).collect();
        let listing = values.iter().map(f64::to_string).collect::<Vec<_>>().join(", ");
        let set = values.into_iter().map(OrderedFloat).collect();
        rule.checks.push(Constraint::new(
            Check::NumberEnum(set),
            format!("Number not in enumeration: {listing}"),
        ));
    }
    rule.max = ws.maximum;
    rule.min = ws.minimum;
    if let Some(x) = ws.maximum_exclusive {
        rule.checks.push(Constraint::new(
            Check::StrictMax(x),
            format!("Number not strictly less than: {x}"),
        ));
    }
    if let Some(x) = ws.minimum_exclusive {
        rule.checks.push(Constraint::new(
            Check::StrictMin(x),
            format!("Number not strictly more than: {x}"),
        ));
    }
    rule
}

fn lower_boolean(ws: &WsNode) -> FieldRule {
    let mut rule = FieldRule::new(Repr::Boolean);

    if let Some(lits) = &ws.enum_ {
        let allowed: Vec<bool> = lits.iter().filter_map(Value::as_bool).collect();
        let listing = allowed.iter().map(bool::to_string).collect::<Vec<_>>().join(", ");
        rule.checks.push(Constraint::new(
            Check::BoolEnum(allowed),
            format!("Boolean not in enumeration: {listing}"),
        ));
    }
    rule
}

fn validated_text(check: Check, message: &str) -> FieldRule {
    let mut rule = FieldRule::new(Repr::Text);
    rule.checks.push(Constraint::new(check, message));
    rule
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::describe;
    use serde_json::json;

    fn ws(v: serde_json::Value) -> WsNode {
        serde_json::from_value(v).expect("fixture parses")
    }

    fn compile_ws(v: serde_json::Value) -> Result<SchemaDefinition, SchemaError> {
        compile(&ws(v))
    }

    #[test]
    fn rejects_non_object_root() {
        let err = compile_ws(json!({ "type": "string" })).unwrap_err();
        assert!(matches!(err, SchemaError::RootNotObject));
        // a root-level union is a root failure too, not an unsupported-feature one
        let err = compile_ws(json!({ "type": ["string", "number"] })).unwrap_err();
        assert!(matches!(err, SchemaError::RootNotObject));
    }

    #[test]
    fn rejects_unknown_types() {
        let err = compile_ws(json!({
            "type": "object",
            "properties": { "name": { "type": "whatever" } }
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType(ref name) if name == "whatever"));
    }

    #[test]
    fn rejects_positional_array_items_regardless_of_length() {
        for items in [
            json!([{ "type": "string" }]),
            json!([{ "type": "string" }, { "type": "number" }]),
        ] {
            let err = compile_ws(json!({
                "type": "object",
                "properties": { "name": { "type": "array", "items": items } }
            }))
            .unwrap_err();
            assert!(matches!(err, SchemaError::Unsupported("positional array types")));
        }
    }

    #[test]
    fn rejects_union_types_regardless_of_branch_count() {
        for decl in [json!([{ "type": "string" }]), json!(["string", "number"])] {
            let err = compile_ws(json!({
                "type": "object",
                "properties": { "name": { "type": decl } }
            }))
            .unwrap_err();
            assert!(matches!(err, SchemaError::Unsupported("union types")));
        }
    }

    #[test]
    fn absent_kind_defaults_to_any() {
        let def = compile_ws(json!({
            "type": "object",
            "properties": { "blob": {} }
        }))
        .unwrap();
        let rule = &def.fields["blob"];
        assert!(
            matches!(&rule.node, RuleNode::Field(f) if f.repr == Repr::Any),
            "absent kind lowers to the opaque-any representation"
        );
    }

    #[test]
    fn required_propagates_from_property_nodes_only() {
        let def = compile_ws(json!({
            "type": "object",
            "required": true, // meaningless at the root
            "properties": {
                "name": { "type": "string", "required": true },
                "nick": { "type": "string" }
            }
        }))
        .unwrap();
        assert!(def.fields["name"].required);
        assert!(!def.fields["nick"].required);
    }

    #[test]
    fn string_constraints_all_accumulate() {
        let def = compile_ws(json!({
            "type": "object",
            "properties": {
                "tag": {
                    "type": "string",
                    "enum": ["a", "bb"],
                    "pattern": "^[ab]+$",
                    "minLength": 1,
                    "maxLength": 2
                }
            }
        }))
        .unwrap();
        let RuleNode::Field(field) = &def.fields["tag"].node else {
            panic!("expected a field rule");
        };
        assert_eq!(field.repr, Repr::Text);
        assert_eq!(field.enum_, vec!["a", "bb"]);
        assert_eq!(field.pattern.as_ref().map(|r| r.as_str()), Some("^[ab]+$"));
        // both length bounds present as independent checks
        let names: Vec<_> = field.checks.iter().map(|c| c.check.name()).collect();
        assert_eq!(names, vec!["maxLength", "minLength"]);
    }

    #[test]
    fn number_bounds_inclusive_native_exclusive_as_checks() {
        let def = compile_ws(json!({
            "type": "object",
            "properties": {
                "n": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": 10,
                    "minimumExclusive": 3,
                    "maximumExclusive": 5
                }
            }
        }))
        .unwrap();
        let RuleNode::Field(field) = &def.fields["n"].node else {
            panic!("expected a field rule");
        };
        assert_eq!((field.min, field.max), (Some(0.0), Some(10.0)));
        let names: Vec<_> = field.checks.iter().map(|c| c.check.name()).collect();
        assert_eq!(names, vec!["strictMax", "strictMin"]);
        assert!(field.checks.iter().any(|c| c.message == "Number not strictly less than: 5"));
    }

    #[test]
    fn nested_objects_arrays_and_scalars_lower_recursively() {
        let def = compile_ws(json!({
            "type": "object",
            "properties": {
                "who": { "type": "link" },
                "gap": { "type": "null" },
                "meta": {
                    "type": "object",
                    "properties": { "born": { "type": "date", "required": true } }
                },
                "tags": { "type": "array", "items": { "type": "string", "maxLength": 8 } }
            }
        }))
        .unwrap();

        assert!(matches!(&def.fields["who"].node, RuleNode::Field(f) if f.repr == Repr::Reference));
        assert!(matches!(&def.fields["gap"].node, RuleNode::Field(f) if f.repr == Repr::Null));

        let RuleNode::Object(meta) = &def.fields["meta"].node else {
            panic!("expected nested mapping");
        };
        assert!(meta["born"].required);

        let RuleNode::Array(item) = &def.fields["tags"].node else {
            panic!("expected wrapped array rule");
        };
        assert!(matches!(&item.node, RuleNode::Field(f) if f.repr == Repr::Text));
    }

    #[test]
    fn compiling_twice_yields_identical_rules() {
        let node = ws(json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "minLength": 3, "maxLength": 5, "required": true },
                "score": { "type": "number", "minimumExclusive": 3, "maximumExclusive": 5 },
                "flag": { "type": "boolean", "enum": [false] },
                "when": { "type": "datetime-local" }
            }
        }));
        let first = describe(&compile(&node).unwrap());
        let second = describe(&compile(&node).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn bad_pattern_sources_fail_the_compile() {
        let err = compile_ws(json!({
            "type": "object",
            "properties": { "name": { "type": "string", "pattern": "(" } }
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::BadPattern { .. }));
    }
}
