// Strongly-typed rule IR handed to the modeling layer. No serde_json::Value
// stored in the tree itself; raw values only appear at check time.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;
use regex::Regex;
use serde_json::{Value, json};

/// Underlying scalar representation of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repr {
    /// Accepts any value, null and composites included.
    Any,
    Text,
    Number,
    Boolean,
    /// Opaque foreign-document reference: raw id or resolved instance.
    Reference,
    /// The custom null scalar type (see `null_kind`).
    Null,
}

impl Repr {
    pub fn name(self) -> &'static str {
        match self {
            Repr::Any => "any",
            Repr::Text => "text",
            Repr::Number => "number",
            Repr::Boolean => "boolean",
            Repr::Reference => "reference",
            Repr::Null => "null",
        }
    }
}

/// Value-carrying predicate. Each constraint is its own record so multiple
/// constraints on one field accumulate (AND) instead of overwriting.
#[derive(Debug, Clone)]
pub enum Check {
    MinLength(u64),
    MaxLength(u64),
    /// minimumExclusive: value must be strictly greater.
    StrictMin(f64),
    /// maximumExclusive: value must be strictly less.
    StrictMax(f64),
    NumberEnum(BTreeSet<OrderedFloat<f64>>),
    BoolEnum(Vec<bool>),
    Date,
    Time,
    DatetimeLocal,
}

impl Check {
    pub fn name(&self) -> &'static str {
        match self {
            Check::MinLength(_) => "minLength",
            Check::MaxLength(_) => "maxLength",
            Check::StrictMin(_) => "strictMin",
            Check::StrictMax(_) => "strictMax",
            Check::NumberEnum(_) => "numberEnum",
            Check::BoolEnum(_) => "boolEnum",
            Check::Date => "date",
            Check::Time => "time",
            Check::DatetimeLocal => "datetimeLocal",
        }
    }

    /// Length is counted in Unicode scalar values, no trimming.
    pub fn holds(&self, value: &Value) -> bool {
        match self {
            Check::MinLength(n) => value.as_str().is_some_and(|s| s.chars().count() as u64 >= *n),
            Check::MaxLength(n) => value.as_str().is_some_and(|s| s.chars().count() as u64 <= *n),
            Check::StrictMin(x) => value.as_f64().is_some_and(|v| v > *x),
            Check::StrictMax(x) => value.as_f64().is_some_and(|v| v < *x),
            Check::NumberEnum(set) => value.as_f64().is_some_and(|v| set.contains(&OrderedFloat(v))),
            Check::BoolEnum(set) => value.as_bool().is_some_and(|b| set.contains(&b)),
            Check::Date => value.as_str().is_some_and(is_date),
            Check::Time => value.as_str().is_some_and(is_time),
            Check::DatetimeLocal => value.as_str().is_some_and(is_datetime_local),
        }
    }
}

/// A check paired with the message reported when it fails.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub check: Check,
    pub message: String,
}

impl Constraint {
    pub fn new(check: Check, message: impl Into<String>) -> Self {
        Self { check, message: message.into() }
    }

    pub fn holds(&self, value: &Value) -> bool {
        self.check.holds(value)
    }
}

/// One scalar field's validation contract.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub repr: Repr,
    /// Native allowed-value set (string kinds).
    pub enum_: Vec<String>,
    /// Compiled from the authored source as-is; no anchors added.
    pub pattern: Option<Regex>,
    /// Inclusive bounds, understood natively by the modeling layer.
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub checks: Vec<Constraint>,
}

impl FieldRule {
    pub fn new(repr: Repr) -> Self {
        Self {
            repr,
            enum_: Vec::new(),
            pattern: None,
            min: None,
            max: None,
            checks: Vec::new(),
        }
    }
}

/// Compiled form of one WS node, with the `required` flag read from the
/// node's own position inside its parent's `properties`.
#[derive(Debug, Clone)]
pub struct Rule {
    pub required: bool,
    pub node: RuleNode,
}

#[derive(Debug, Clone)]
pub enum RuleNode {
    Field(FieldRule),
    /// Nested mapping, consumed structurally by the modeling layer.
    Object(IndexMap<String, Rule>),
    /// Wrapped array form: exactly the item rule, `[itemRule]` on the wire.
    Array(Box<Rule>),
}

/// The finished top-level mapping handed to the modeling layer.
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    pub fields: IndexMap<String, Rule>,
}

// ------------------------- Date/time validity ----------------------------- //

static DATE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d\d-\d\d$").unwrap());
static TIME_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d\d:\d\d(:\d\d(\.\d{1,3})?)?$").unwrap());
static DATETIME_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d\d-\d\dT\d\d:\d\d(:\d\d(\.\d{1,3})?)?$").unwrap());

/// Shape-valid AND a real calendar date (rejects `2013-02-32`).
pub fn is_date(s: &str) -> bool {
    DATE_SHAPE.is_match(s) && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// `HH:MM[:SS[.sss]]`, zero-padded, and a real time-of-day (rejects `24:12`).
pub fn is_time(s: &str) -> bool {
    if !TIME_SHAPE.is_match(s) {
        return false;
    }
    let fmt = match s.len() {
        5 => "%H:%M",
        8 => "%H:%M:%S",
        _ => "%H:%M:%S%.f",
    };
    NaiveTime::parse_from_str(s, fmt).is_ok()
}

/// `YYYY-MM-DDTHH:MM[:SS[.sss]]` denoting a real date+time.
pub fn is_datetime_local(s: &str) -> bool {
    if !DATETIME_SHAPE.is_match(s) {
        return false;
    }
    let fmt = match s.len() {
        16 => "%Y-%m-%dT%H:%M",
        19 => "%Y-%m-%dT%H:%M:%S",
        _ => "%Y-%m-%dT%H:%M:%S%.f",
    };
    NaiveDateTime::parse_from_str(s, fmt).is_ok()
}

// ------------------------------- Emission --------------------------------- //

/// JSON debug view of a compiled definition (stable for identical input).
pub fn describe(def: &SchemaDefinition) -> Value {
    Value::Object(
        def.fields
            .iter()
            .map(|(name, rule)| (name.clone(), describe_rule(rule)))
            .collect(),
    )
}

pub fn describe_rule(rule: &Rule) -> Value {
    let mut out = match &rule.node {
        RuleNode::Field(field) => describe_field(field),
        RuleNode::Object(fields) => {
            let inner: serde_json::Map<String, Value> = fields
                .iter()
                .map(|(name, rule)| (name.clone(), describe_rule(rule)))
                .collect();
            json!({ "fields": inner })
        }
        RuleNode::Array(item) => json!([describe_rule(item)]),
    };
    if rule.required {
        if let Some(map) = out.as_object_mut() {
            map.insert("required".into(), Value::Bool(true));
        }
    }
    out
}

fn describe_field(field: &FieldRule) -> Value {
    let mut o = json!({ "repr": field.repr.name() });
    if !field.enum_.is_empty() {
        o["enum"] = Value::Array(field.enum_.iter().cloned().map(Value::from).collect());
    }
    if let Some(rx) = &field.pattern {
        o["pattern"] = Value::from(rx.as_str());
    }
    if let Some(m) = field.min {
        o["min"] = json_num_pref_i64(m);
    }
    if let Some(m) = field.max {
        o["max"] = json_num_pref_i64(m);
    }
    if !field.checks.is_empty() {
        o["checks"] = Value::Array(
            field
                .checks
                .iter()
                .map(|c| json!({ "check": c.check.name(), "message": c.message }))
                .collect(),
        );
    }
    o
}

// Helper: prefer emitting integers when exact
fn json_num_pref_i64(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn length_bounds_are_independent() {
        let min = Constraint::new(Check::MinLength(3), "String shorter than 3");
        let max = Constraint::new(Check::MaxLength(5), "String longer than 5");

        for ok in ["abc", "abcd", "abcde"] {
            assert!(min.holds(&json!(ok)), "min accepts {ok}");
            assert!(max.holds(&json!(ok)), "max accepts {ok}");
        }
        // length 2 fails min but passes max; length 6 the other way around
        assert!(!min.holds(&json!("ab")));
        assert!(max.holds(&json!("ab")));
        assert!(min.holds(&json!("abcdef")));
        assert!(!max.holds(&json!("abcdef")));
    }

    #[test]
    fn exclusive_bounds_reject_the_boundary() {
        let lo = Check::StrictMin(3.0);
        let hi = Check::StrictMax(5.0);
        assert!(lo.holds(&json!(4)) && hi.holds(&json!(4)));
        assert!(!lo.holds(&json!(3)));
        assert!(!hi.holds(&json!(5)));
    }

    #[test]
    fn number_enum_matches_by_exact_value() {
        let set = [1.0, 2.5].into_iter().map(OrderedFloat).collect();
        let check = Check::NumberEnum(set);
        assert!(check.holds(&json!(1)));
        assert!(check.holds(&json!(2.5)));
        assert!(!check.holds(&json!(2)));
        assert!(!check.holds(&json!("1")));
    }

    #[test]
    fn bool_enum_with_only_false_rejects_true() {
        let check = Check::BoolEnum(vec![false]);
        assert!(check.holds(&json!(false)));
        assert!(!check.holds(&json!(true)));
    }

    #[test]
    fn date_requires_a_real_calendar_date() {
        assert!(is_date("1977-03-15"));
        assert!(!is_date("2013-02-32")); // shape-valid, not a real date
        assert!(!is_date("13-07-04")); // wrong shape
    }

    #[test]
    fn time_requires_padding_and_a_real_time_of_day() {
        assert!(is_time("20:17"));
        assert!(is_time("20:17:42"));
        assert!(is_time("20:17:42.123"));
        assert!(!is_time("24:12"));
        assert!(!is_time("2:14"));
        assert!(!is_time("20:17:42.1234")); // more than 3 fractional digits
    }

    #[test]
    fn datetime_local_combines_both() {
        assert!(is_datetime_local("1977-03-15T20:17"));
        assert!(is_datetime_local("1977-03-15T20:17:42.5"));
        assert!(!is_datetime_local("1977-03-15 20:17"));
        assert!(!is_datetime_local("2013-02-32T20:17"));
        assert!(!is_datetime_local("1977-03-15T24:12"));
    }

    #[test]
    fn describe_renders_the_wrapped_array_form() {
        let item = Rule { required: false, node: RuleNode::Field(FieldRule::new(Repr::Number)) };
        let rule = Rule { required: false, node: RuleNode::Array(Box::new(item)) };
        assert_eq!(describe_rule(&rule), json!([{ "repr": "number" }]));
    }
}
