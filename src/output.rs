//! Host representation of parsed scripts.
//!
//! Every node converts to a `serde_json::Value` through the single function
//! [`to_host`], which matches once on the node kind. Consumers embedding the
//! parser in another runtime walk the resulting JSON instead of the Rust types.
//!
//! # Shapes
//!
//! ```text
//! number    {"kind":"number","text":"1.50","value":1.5}      // value is null for missing
//! ident     {"kind":"ident","name":"income"}
//! string    {"kind":"string","value":"hello"}
//! datetime  {"kind":"datetime","date":"2020-03-15","time":null}
//! branch    {"kind":"branch","op":"+","children":[...]}
//! modifier  {"kind":"modifier","name":"by","args":[...],"options":null}
//! option    {"kind":"option","name":"level","args":[...],"suboptions":null}
//! command   {"kind":"command","verb":"regress","varlist":[...],"if":null,...}
//! embedded  {"kind":"embedded","text":"..."}
//! block     {"kind":"block","header":{...},"body":[...]}
//! ```
//!
//! Absent optional parts are `null`, never an empty value. Object keys are
//! sorted, so output is deterministic.
//!
//! # Examples
//!
//! ```
//! use ado_parser::output::to_json;
//!
//! let script = ado_parser::parse("summarize price if foreign\n").unwrap();
//! let json = to_json(&script);
//! assert!(json.contains(r#""verb":"summarize""#));
//! assert!(json.contains(r#""range":null"#));
//! ```

use serde_json::{Value, json};

use crate::ast::{
    CommandOption, Datetime, Expr, GeneralCommand, Modifier, NodeRef, Number, Range, RangeBound,
    Script,
};

/// Converts any node, with its subtree, to its host representation.
pub fn to_host(node: NodeRef<'_>) -> Value {
    let kind = node.kind().name();
    match node {
        NodeRef::Number(number) => json!({
            "kind": kind,
            "text": number.to_string(),
            "value": number_value(number),
        }),
        NodeRef::Ident(name) => json!({ "kind": kind, "name": name }),
        NodeRef::String(value) => json!({ "kind": kind, "value": value }),
        NodeRef::Datetime(datetime) => datetime_value(kind, datetime),
        NodeRef::Branch(branch) => json!({
            "kind": kind,
            "op": branch.op.tag(),
            "children": expressions(&branch.children),
        }),
        NodeRef::Modifier(modifier) => modifier_value(kind, modifier),
        NodeRef::Option(option) => option_value(kind, option),
        NodeRef::Command(command) => command_value(kind, command),
        NodeRef::Embedded(code) => json!({ "kind": kind, "text": code.text }),
        NodeRef::Block(block) => json!({
            "kind": kind,
            "header": to_host(NodeRef::Command(&block.header)),
            "body": block.body.iter().map(|c| to_host(c.as_node())).collect::<Vec<_>>(),
        }),
    }
}

fn number_value(number: &Number) -> Value {
    if let Some(integer) = number.as_integer() {
        return json!(integer);
    }
    number
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn datetime_value(kind: &str, datetime: &Datetime) -> Value {
    json!({
        "kind": kind,
        "date": datetime.date.map(|d| d.to_string()),
        "time": datetime.time.map(|t| t.to_string()),
    })
}

fn expressions(exprs: &[Expr]) -> Vec<Value> {
    exprs.iter().map(|e| to_host(e.as_node())).collect()
}

fn option_list(options: Option<&Vec<CommandOption>>) -> Value {
    match options {
        Some(options) => options
            .iter()
            .map(|o| to_host(NodeRef::Option(o)))
            .collect(),
        None => Value::Null,
    }
}

fn modifier_value(kind: &str, modifier: &Modifier) -> Value {
    json!({
        "kind": kind,
        "name": modifier.name,
        "args": expressions(&modifier.args),
        "options": option_list(modifier.options.as_ref()),
    })
}

fn option_value(kind: &str, option: &CommandOption) -> Value {
    json!({
        "kind": kind,
        "name": option.name,
        "args": option.args.as_deref().map(expressions),
        "suboptions": option_list(option.suboptions.as_ref()),
    })
}

fn bound_value(bound: RangeBound) -> Value {
    match bound {
        RangeBound::Index(index) => json!(index),
        RangeBound::First => json!("f"),
        RangeBound::Last => json!("l"),
        RangeBound::Unbounded => json!("."),
    }
}

fn range_value(range: &Range) -> Value {
    json!({
        "lower": bound_value(range.lower),
        "upper": bound_value(range.upper),
    })
}

fn command_value(kind: &str, command: &GeneralCommand) -> Value {
    json!({
        "kind": kind,
        "verb": command.verb,
        "modifiers": command.modifiers.as_ref().map(|mods| {
            mods.iter().map(|m| to_host(NodeRef::Modifier(m))).collect::<Vec<_>>()
        }),
        "varlist": command.varlist.as_deref().map(expressions),
        "assignment": command.assignment.as_ref().map(|a| json!({
            "target": a.target,
            "value": to_host(a.value.as_node()),
        })),
        "if": command.if_exp.as_ref().map(|e| to_host(e.as_node())),
        "range": command.range.as_ref().map(range_value),
        "weight": command.weight.as_ref().map(|w| json!({
            "kind": w.kind,
            "column": w.column,
        })),
        "using": command.using,
        "options": option_list(command.options.as_ref()),
    })
}

/// Host representation of a whole script: an array of commands.
pub fn script_to_host(script: &Script) -> Value {
    Value::Array(script.iter().map(|c| to_host(c.as_node())).collect())
}

/// Compact JSON for a whole script.
pub fn to_json(script: &Script) -> String {
    script_to_host(script).to_string()
}

/// Pretty-printed JSON for a whole script, two-space indented.
pub fn to_json_pretty(script: &Script) -> String {
    format!("{:#}", script_to_host(script))
}
