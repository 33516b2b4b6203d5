//! Mapping between a parameter tree and its submission [Payload].
//!
//! [restore] fills a freshly built tree from a saved payload, [serialize] produces a payload
//! from the tree. On an unchanged tree, `serialize` after `restore` gives back the restored
//! payload.


use crate::{
    Payload,
    tree::{ParamId, Parameter, ParameterKind},
    validate::{self, UploadStatus, ValidationReport},
    value::Value,
};

/// Payload entries that [restore] could not apply as they were.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RestoreReport {
    /// Keys with no parameter of that name, identified by the id such a parameter would have.
    pub unmatched: Vec<ParamId>,
    /// Parameters whose payload value did not have the expected shape.
    pub malformed: Vec<ParamId>,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        self.unmatched.is_empty() && self.malformed.is_empty()
    }
}

/// Assigns values from `inputs` to the matching `params`, by name.
///
/// Groups are resized to the number of occurrences in the payload before their occurrences are
/// restored. Keys that match no parameter are skipped with a warning and listed in the report.
pub fn restore(inputs: &Payload, params: &mut [Parameter]) -> RestoreReport {
    let mut report = RestoreReport::default();
    restore_into(inputs, params, None, &mut report);
    report
}

fn restore_into(
    inputs: &Payload,
    params: &mut [Parameter],
    prefix: Option<&ParamId>,
    report: &mut RestoreReport,
) {
    for (key, value) in inputs {
        let Some(param) = params.iter_mut().find(|p| &p.name == key) else {
            let id = match prefix {
                Some(prefix) => prefix.child(key),
                None => ParamId::root(key),
            };
            log::warn!("Ignoring saved input {id}: no such parameter in the process description.");
            report.unmatched.push(id);
            continue;
        };

        if param.as_group().is_some() {
            restore_group(value, param, report);
        } else {
            restore_simple(value, param, report);
        }
    }
}

fn restore_simple(value: &serde_json::Value, param: &mut Parameter, report: &mut RestoreReport) {
    let ParameterKind::Simple(simple) = &mut param.kind else {
        return;
    };

    let values = if simple.is_array {
        // Array parameters hold their elements in `save`, wrapped in a one-element list.
        match value {
            serde_json::Value::Array(outer) => match outer.first() {
                Some(serde_json::Value::Array(items)) => Some(items.clone()),
                Some(single) => Some(vec![single.clone()]),
                None => Some(Vec::new()),
            },
            _ => None,
        }
    } else {
        match value {
            serde_json::Value::Array(items) => Some(items.clone()),
            _ => None,
        }
    };

    simple.save = match values {
        Some(items) => items.into_iter().map(Value::from).collect(),
        None => {
            log::warn!(
                "Saved input {} is not a list, keeping it as a single value.",
                param.id
            );
            report.malformed.push(param.id.clone());
            vec![Value::from(value.clone())]
        }
    };
}

fn restore_group(value: &serde_json::Value, param: &mut Parameter, report: &mut RestoreReport) {
    let serde_json::Value::Array(occurrences) = value else {
        log::warn!("Saved input {} is not a list of occurrences.", param.id);
        report.malformed.push(param.id.clone());
        return;
    };

    while param.occurrence_count() < occurrences.len() {
        // Only fails if the parameter is not a group, which the caller checked.
        if param.add_occurrence().is_err() {
            return;
        }
    }
    param.truncate_occurrences(occurrences.len());

    let group_id = param.id.clone();
    let Some(group) = param.as_group_mut() else {
        return;
    };
    for (index, (saved, occurrence)) in occurrences
        .iter()
        .zip(group.occurrences_mut().iter_mut())
        .enumerate()
    {
        let prefix = group_id.occurrence(index);
        match saved {
            serde_json::Value::Object(inputs) => {
                restore_into(inputs, occurrence, Some(&prefix), report);
            }
            _ => {
                log::warn!("Saved occurrence {prefix} is not an object.");
                report.malformed.push(prefix);
            }
        }
    }
}

/// Payload built from a tree, and the validation of the tree it was built from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Serialized {
    pub payload: Payload,
    pub report: ValidationReport,
}

impl Serialized {
    pub fn is_valid(&self) -> bool {
        self.report.is_valid()
    }
}

/// Builds the submission payload for `params`, validating every parameter on the way.
///
/// The payload is always complete: invalid parameters are serialized too.
pub fn serialize(params: &[Parameter], uploads: &dyn UploadStatus) -> Serialized {
    let mut report = ValidationReport::default();
    let payload = serialize_into(params, uploads, &mut report);
    Serialized { payload, report }
}

fn serialize_into(
    params: &[Parameter],
    uploads: &dyn UploadStatus,
    report: &mut ValidationReport,
) -> Payload {
    let mut payload = Payload::new();
    for param in params {
        report.push(validate::validate(param, uploads));
        let value = match &param.kind {
            ParameterKind::Simple(simple) => {
                let values =
                    serde_json::Value::Array(simple.save.iter().map(Value::to_json).collect());
                if simple.is_array {
                    serde_json::Value::Array(vec![values])
                } else {
                    values
                }
            }
            ParameterKind::Group(group) => serde_json::Value::Array(
                group
                    .occurrences()
                    .iter()
                    .map(|occurrence| {
                        serde_json::Value::Object(serialize_into(occurrence, uploads, report))
                    })
                    .collect(),
            ),
        };
        payload.insert(param.name.clone(), value);
    }
    payload
}
