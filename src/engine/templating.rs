use std::collections::HashMap;

use serde_json::{Map, Value};

/// Flat `internalName -> value` binding a card template is expanded against.
pub type TemplateValues = HashMap<String, String>;

const ROOT_SCOPE: &str = "$root.";

/// Expands every `${name}` token found in the string values of `template`.
///
/// Unbound tokens expand to an empty string. Object keys and non-string
/// scalars are left untouched.
pub fn expand_card(template: &Value, values: &TemplateValues) -> Value {
    match template {
        Value::String(s) => Value::String(templ_str(s, values)),
        Value::Array(items) => Value::Array(items.iter().map(|v| expand_card(v, values)).collect()),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), expand_card(v, values));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

pub(crate) fn templ_str(s: &str, values: &TemplateValues) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let (head, tail) = rest.split_at(start);
        out.push_str(head);
        if let Some(end_rel) = tail.find('}') {
            let expr = tail[2..end_rel].trim();
            if let Some(val) = lookup_binding(expr, values) {
                out.push_str(val);
            }
            rest = &tail[end_rel + 1..];
        } else {
            out.push_str(tail);
            rest = "";
            break;
        }
    }
    out.push_str(rest);
    out
}

fn lookup_binding<'a>(expr: &str, values: &'a TemplateValues) -> Option<&'a str> {
    let name = expr.strip_prefix(ROOT_SCOPE).unwrap_or(expr);
    values.get(name).map(|s| s.as_str())
}
