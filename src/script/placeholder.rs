//! `{{name}}` placeholders in script string leaves

use serde_json::Value;
use std::{collections::{BTreeSet, HashMap},
          sync::LazyLock};

static PLACEHOLDER: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_\-]*)\s*\}\}").unwrap());

/// Names of every placeholder found in the string leaves of `value`, sorted and deduplicated
pub fn collect(value: &Value) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    walk(value, &mut |text| {
        for captures in PLACEHOLDER.captures_iter(text) {
            names.insert(captures[1].to_string());
        }
    });
    names
}

/// Replace placeholders whose name is in `values`; unknown names are left untouched
pub fn substitute(value: &mut Value, values: &HashMap<String, String>) {
    match value {
        Value::String(text) => {
            if PLACEHOLDER.is_match(text) {
                *text = substitute_str(text, values);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|item| substitute(item, values)),
        Value::Object(map) => map.values_mut().for_each(|item| substitute(item, values)),
        _ => {}
    }
}

/// Replace placeholders in one string
pub fn substitute_str(text: &str, values: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(text, |captures: &regex::Captures<'_>| match values.get(&captures[1]) {
            Some(value) => value.clone(),
            None => captures[0].to_string(),
        })
        .into_owned()
}

fn walk(value: &Value, visit: &mut impl FnMut(&str)) {
    match value {
        Value::String(text) => visit(text),
        Value::Array(items) => items.iter().for_each(|item| walk(item, visit)),
        Value::Object(map) => map.values().for_each(|item| walk(item, visit)),
        _ => {}
    }
}
