//! Matching of reference items against the `ext.filter` pattern of a parameter.
//!
//! A pattern is a JSON object. Each property must match the item's property of the same name:
//! text, numbers and booleans match by case-insensitive substring, nested objects match
//! recursively and lists match when any of their members does. The property name `$` matches
//! against every property of the item.

use serde_json::Value as Json;

use super::ReferenceItem;

const ANY_PROPERTY: &str = "$";

/// Keeps the items that match every property of `pattern`.
pub fn filter_all(items: &[ReferenceItem], pattern: &Json) -> Vec<ReferenceItem> {
    items
        .iter()
        .filter(|item| matches(&item.0, pattern))
        .cloned()
        .collect()
}

/// Keeps the items that match any single property of `pattern`, or any member of a property's
/// list. Items are kept in the order the pattern properties select them, without duplicates.
pub fn filter_any(items: &[ReferenceItem], pattern: &Json) -> Vec<ReferenceItem> {
    let Json::Object(properties) = pattern else {
        return filter_all(items, pattern);
    };

    let mut selected: Vec<usize> = Vec::new();
    for (key, expected) in properties {
        let options: Vec<&Json> = match expected {
            Json::Array(options) => options.iter().collect(),
            single => vec![single],
        };
        for option in options {
            let mut single = serde_json::Map::new();
            single.insert(key.clone(), option.clone());
            let single = Json::Object(single);
            for (index, item) in items.iter().enumerate() {
                if !selected.contains(&index) && matches(&item.0, &single) {
                    selected.push(index);
                }
            }
        }
    }

    selected.into_iter().map(|index| items[index].clone()).collect()
}

/// True if `actual` matches `expected`.
pub fn matches(actual: &Json, expected: &Json) -> bool {
    match expected {
        Json::Null => true,
        Json::Array(options) => options.iter().any(|option| matches(actual, option)),
        Json::Object(pattern) => pattern.iter().all(|(key, expected)| {
            if key == ANY_PROPERTY {
                any_property_matches(actual, expected)
            } else {
                match actual {
                    Json::Object(fields) => fields
                        .get(key)
                        .is_some_and(|field| matches(field, expected)),
                    _ => false,
                }
            }
        }),
        primitive => match actual {
            Json::Array(members) => members.iter().any(|member| matches(member, primitive)),
            Json::Object(_) | Json::Null => false,
            other => contains_ignore_case(&text(other), &text(primitive)),
        },
    }
}

fn any_property_matches(actual: &Json, expected: &Json) -> bool {
    match actual {
        Json::Object(fields) => fields.values().any(|field| matches(field, expected)),
        other => matches(other, expected),
    }
}

fn text(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
