//! Validation of parameter values against their bindings, restrictions and cardinality.
//!
//! Validation is read-only. It reports the first problem found for each parameter, and never
//! stops a tree from being serialized.


use crate::{
    binding::BindingKind,
    descriptor::MaxOccurs,
    tree::{ParamId, Parameter, ParameterKind, SimpleParameter},
    value::Value,
};

/// Reports whether a value slot is currently being filled by a file transfer.
pub trait UploadStatus {
    fn is_uploading(&self, id: &ParamId, index: usize) -> bool;
}

/// [UploadStatus] for contexts without uploads.
pub struct NoUploads;

impl UploadStatus for NoUploads {
    fn is_uploading(&self, _id: &ParamId, _index: usize) -> bool {
        false
    }
}

/// Reason a parameter is not valid. Displays as the user-facing message.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Invalid {
    #[error("Parameter {name} is mandatory")]
    MissingRequiredValue { name: String },
    #[error("Parameter {name} is not a Number")]
    TypeMismatch { name: String },
    #[error("Parameter {name} is still uploading")]
    UploadInProgress { name: String },
    #[error("Value of parameter {name} not valid.")]
    NotInEnumeration { name: String },
    #[error("Value of parameter {name} not valid. Should be within range [{min},{max}]")]
    OutOfRange { name: String, min: f64, max: f64 },
    #[error("Parameter {name} has {count} occurrence(s), expected between {min} and {max}")]
    OccurrencesOutOfBounds {
        name: String,
        count: usize,
        min: u32,
        max: MaxOccurs,
    },
}

/// Problem found with a specific parameter, and the value index when it concerns one value.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{error}")]
pub struct Diagnostic {
    pub id: ParamId,
    pub index: Option<usize>,
    pub error: Invalid,
}

/// Validates a single parameter, without descending into group occurrences.
///
/// Simple parameters check their values in order, stopping at the first invalid one:
///
/// 1. file bindings must not be mid-upload, as an upload clears the slot it fills,
/// 2. a null value of a mandatory parameter is missing; null values of optional parameters are
///    not checked further,
/// 3. numeric bindings require a number,
/// 4. an enumeration of primitive values must contain the value,
/// 5. a range must contain a numeric value.
///
/// Both simple parameters and groups must then have an occurrence count within
/// `[min_occurs, max_occurs]`.
pub fn validate(param: &Parameter, uploads: &dyn UploadStatus) -> Result<(), Diagnostic> {
    let diagnostic = |index, error| Diagnostic {
        id: param.id.clone(),
        index,
        error,
    };

    if let ParameterKind::Simple(simple) = &param.kind {
        if param.mandatory() && simple.save.is_empty() {
            return Err(diagnostic(None, missing(param)));
        }
        for (index, value) in simple.save.iter().enumerate() {
            validate_value(param, simple, index, value, uploads)
                .map_err(|error| diagnostic(Some(index), error))?;
        }
    }

    let count = param.occurrence_count();
    if count < param.min_occurs as usize || !param.max_occurs.allows(count) {
        return Err(diagnostic(
            None,
            Invalid::OccurrencesOutOfBounds {
                name: param.name.clone(),
                count,
                min: param.min_occurs,
                max: param.max_occurs,
            },
        ));
    }

    Ok(())
}

fn missing(param: &Parameter) -> Invalid {
    Invalid::MissingRequiredValue {
        name: param.name.clone(),
    }
}

fn validate_value(
    param: &Parameter,
    simple: &SimpleParameter,
    index: usize,
    value: &Value,
    uploads: &dyn UploadStatus,
) -> Result<(), Invalid> {
    let name = || param.name.clone();

    if simple.binding.kind() == BindingKind::File && uploads.is_uploading(&param.id, index) {
        return Err(Invalid::UploadInProgress { name: name() });
    }

    if value.is_null() {
        return if param.mandatory() {
            Err(missing(param))
        } else {
            Ok(())
        };
    }

    if simple.binding.kind().is_numeric() && !value.is_number() {
        return Err(Invalid::TypeMismatch { name: name() });
    }

    let enumeration = &simple.restriction.enumeration;
    if enumeration.first().is_some_and(Value::is_primitive)
        && !enumeration.iter().any(|member| member.loose_eq(value))
    {
        return Err(Invalid::NotInEnumeration { name: name() });
    }

    if let (Some(range), Some(number)) = (simple.restriction.range, value.as_f64()) {
        if !range.contains(number) {
            return Err(Invalid::OutOfRange {
                name: name(),
                min: range.min,
                max: range.max,
            });
        }
    }

    Ok(())
}

/// Outcome of validating every parameter of a tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    /// Diagnostics in tree order, at most one per parameter.
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// The first invalid parameter in tree order.
    pub fn first_invalid(&self) -> Option<&Diagnostic> {
        self.diagnostics.first()
    }

    pub fn diagnostic_for(&self, id: &ParamId) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|d| &d.id == id)
    }

    pub(crate) fn push(&mut self, result: Result<(), Diagnostic>) {
        if let Err(diagnostic) = result {
            log::debug!("Parameter {} is not valid: {diagnostic}", diagnostic.id);
            self.diagnostics.push(diagnostic);
        }
    }
}

/// Validates every parameter in `params`, and all occurrences of groups, depth first.
pub fn validate_tree(params: &[Parameter], uploads: &dyn UploadStatus) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_into(params, uploads, &mut report);
    report
}

fn validate_into(params: &[Parameter], uploads: &dyn UploadStatus, report: &mut ValidationReport) {
    for param in params {
        report.push(validate(param, uploads));
        if let Some(group) = param.as_group() {
            for occurrence in group.occurrences() {
                validate_into(occurrence, uploads, report);
            }
        }
    }
}
