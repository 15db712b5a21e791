//! WS ("web schema") input model.
//!
//! A WS node is a declarative, JSON-like description of a document's shape:
//! a `type` name from a small closed vocabulary plus per-kind constraint
//! fields (enum, pattern, length and numeric bounds, nested `properties`,
//! array `items`). Nodes are caller-owned and read-only; `compile::lower`
//! walks them and never mutates.
//!
//! Fields irrelevant to a node's kind are ignored, not rejected, so the
//! model keeps everything optional and lets lowering pick what applies.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// One WS node. `kind` defaults to `any` when absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsNode {
    #[serde(rename = "type")]
    pub kind: Option<KindDecl>,

    /// Present iff `kind = object`; authored order is preserved.
    pub properties: Option<IndexMap<String, WsNode>>,

    /// Present iff `kind = array`.
    pub items: Option<Items>,

    /// Meaningful only when this node sits inside a parent's `properties`.
    #[serde(default)]
    pub required: bool,

    /// Allowed literal values (string-like, number, boolean kinds).
    #[serde(rename = "enum")]
    pub enum_: Option<Vec<Value>>,

    /// Regex source, taken as authored (the caller supplies anchors).
    pub pattern: Option<String>,

    pub min_length: Option<u64>,
    pub max_length: Option<u64>,

    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub minimum_exclusive: Option<f64>,
    pub maximum_exclusive: Option<f64>,
}

/// The `type` field as authored: a kind name, or a sequence of branches
/// (a union — recognized so lowering can reject it loudly).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum KindDecl {
    Name(String),
    Union(Vec<Value>),
}

/// The `items` field: one node (homogeneous array) or a sequence of nodes
/// (positional tuple — recognized only to be rejected).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Items {
    One(Box<WsNode>),
    Positional(Vec<Value>),
}

/// Closed kind vocabulary. Lowering matches on this exhaustively, so a
/// missing arm is a compile-time hole rather than a runtime fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Any,
    Object,
    Array,
    String,
    Text,
    Html,
    Number,
    Boolean,
    Null,
    Link,
    Date,
    Time,
    DatetimeLocal,
}

impl Kind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "any" => Kind::Any,
            "object" => Kind::Object,
            "array" => Kind::Array,
            "string" => Kind::String,
            "text" => Kind::Text,
            "html" => Kind::Html,
            "number" => Kind::Number,
            "boolean" => Kind::Boolean,
            "null" => Kind::Null,
            "link" => Kind::Link,
            "date" => Kind::Date,
            "time" => Kind::Time,
            "datetime-local" => Kind::DatetimeLocal,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::Any => "any",
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::String => "string",
            Kind::Text => "text",
            Kind::Html => "html",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::Null => "null",
            Kind::Link => "link",
            Kind::Date => "date",
            Kind::Time => "time",
            Kind::DatetimeLocal => "datetime-local",
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
