//! Editable parameter tree built from [descriptor::ParameterDescriptor]s.
//!
//! Group occurrences are only ever created by re-parsing the group's descriptors, never by
//! copying an existing occurrence, so no two occurrences share state.

mod id;

use std::rc::Rc;

use crate::{
    binding::Binding,
    convert,
    descriptor::{self, DescriptorKind, MaxOccurs},
    registry,
    value::Value,
};

pub use id::ParamId;

/// Error while navigating or editing a parameter tree.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("no parameter with id {0}")]
    UnknownParameter(ParamId),
    #[error("parameter {0} is not a group")]
    NotAGroup(ParamId),
    #[error("parameter {0} is not a simple parameter")]
    NotASimple(ParamId),
    #[error("parameter {id} has no value at index {index}")]
    IndexOutOfRange { id: ParamId, index: usize },
}

/// Node of an editable parameter tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub id: ParamId,
    pub name: String,
    pub description: Option<String>,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub kind: ParameterKind,
}

/// Simple leaf or group of parameters.
#[derive(Clone, Debug, PartialEq, strum_macros::EnumDiscriminants)]
#[strum_discriminants(name(ParameterType), derive(strum_macros::Display))]
#[strum_discriminants(strum(serialize_all = "lowercase"))]
pub enum ParameterKind {
    Simple(SimpleParameter),
    Group(GroupParameter),
}

/// State of a simple parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct SimpleParameter {
    pub binding: Binding,
    /// The descriptor's class carried the array marker; the payload wraps `save` in a list.
    pub is_array: bool,
    pub default: Value,
    pub restriction: Restriction,
    pub unit: Option<String>,
    pub ext: Option<serde_json::Value>,
    /// Values currently held, one per occurrence.
    pub save: Vec<Value>,
}

/// Valid values of a simple parameter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Restriction {
    pub range: Option<Range>,
    pub enumeration: Vec<Value>,
}

/// Inclusive numeric range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// One repetition of a group's parameters.
pub type Occurrence = Vec<Parameter>;

/// State of a group parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupParameter {
    /// Child descriptors that every new occurrence is parsed from.
    template: Rc<Vec<descriptor::ParameterDescriptor>>,
    occurrences: Vec<Occurrence>,
}

impl GroupParameter {
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    pub fn occurrences_mut(&mut self) -> &mut [Occurrence] {
        &mut self.occurrences
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    pub fn descriptors(&self) -> &[descriptor::ParameterDescriptor] {
        &self.template
    }
}

/// Builds parameters from `descriptors`. Ids are `<prefix>_<name>`, or just `<name>` without a
/// prefix.
pub fn build(
    descriptors: &[descriptor::ParameterDescriptor],
    prefix: Option<&ParamId>,
) -> Vec<Parameter> {
    descriptors
        .iter()
        .map(|desc| build_parameter(desc, prefix))
        .collect()
}

fn build_parameter(desc: &descriptor::ParameterDescriptor, prefix: Option<&ParamId>) -> Parameter {
    let id = match prefix {
        Some(prefix) => prefix.child(&desc.name),
        None => ParamId::root(&desc.name),
    };

    let kind = match &desc.kind {
        DescriptorKind::Simple(simple) => {
            ParameterKind::Simple(build_simple(simple, desc.min_occurs))
        }
        DescriptorKind::Group(group) => {
            let template = Rc::new(group.descriptors.clone());
            let first = build(&template, Some(&id.occurrence(0)));
            ParameterKind::Group(GroupParameter {
                template,
                occurrences: vec![first],
            })
        }
    };

    log::debug!("Built {} parameter {id}.", ParameterType::from(&kind));

    Parameter {
        id,
        name: desc.name.clone(),
        description: desc.description.clone(),
        min_occurs: desc.min_occurs,
        max_occurs: desc.max_occurs,
        kind,
    }
}

fn build_simple(simple: &descriptor::SimpleDescriptor, min_occurs: u32) -> SimpleParameter {
    let (binding, is_array) = Binding::from_class(&simple.class);
    let default = convert::convert(
        simple
            .default_value
            .as_ref()
            .unwrap_or(&serde_json::Value::Null),
        &binding,
    );
    let restriction = simple
        .restriction
        .as_ref()
        .map(|r| build_restriction(r, &binding))
        .unwrap_or_default();

    SimpleParameter {
        save: vec![default.clone(); min_occurs as usize],
        binding,
        is_array,
        default,
        restriction,
        unit: simple.unit.clone(),
        ext: simple.ext.clone(),
    }
}

fn build_restriction(
    restriction: &descriptor::RestrictionDescriptor,
    binding: &Binding,
) -> Restriction {
    let range = match (&restriction.min_value, &restriction.max_value) {
        (Some(min), Some(max)) => match (range_bound(min), range_bound(max)) {
            (Some(min), Some(max)) => Some(Range { min, max }),
            _ => {
                log::warn!("Ignoring non-numeric range [{min}, {max}] for binding {binding}.");
                None
            }
        },
        _ => None,
    };

    let enumeration = restriction
        .valid_values
        .iter()
        .flatten()
        .map(|raw| convert::convert(raw, binding))
        .collect();

    Restriction { range, enumeration }
}

fn range_bound(raw: &serde_json::Value) -> Option<f64> {
    match convert::convert_kind(raw, crate::binding::BindingKind::Float) {
        Value::Float(f) if !f.is_nan() => Some(f),
        _ => None,
    }
}

impl Parameter {
    /// Mandatory parameters must occur at least once.
    pub fn mandatory(&self) -> bool {
        self.min_occurs > 0
    }

    pub fn parameter_type(&self) -> ParameterType {
        ParameterType::from(&self.kind)
    }

    pub fn as_simple(&self) -> Option<&SimpleParameter> {
        match &self.kind {
            ParameterKind::Simple(simple) => Some(simple),
            ParameterKind::Group(_) => None,
        }
    }

    pub fn as_simple_mut(&mut self) -> Option<&mut SimpleParameter> {
        match &mut self.kind {
            ParameterKind::Simple(simple) => Some(simple),
            ParameterKind::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupParameter> {
        match &self.kind {
            ParameterKind::Group(group) => Some(group),
            ParameterKind::Simple(_) => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut GroupParameter> {
        match &mut self.kind {
            ParameterKind::Group(group) => Some(group),
            ParameterKind::Simple(_) => None,
        }
    }

    /// Current number of occurrences: `save` length for simple parameters (array elements
    /// included), number of occurrences for groups.
    pub fn occurrence_count(&self) -> usize {
        match &self.kind {
            ParameterKind::Simple(simple) => simple.save.len(),
            ParameterKind::Group(group) => group.occurrences.len(),
        }
    }

    /// True if one more occurrence stays within `max_occurs`.
    pub fn can_add_occurrence(&self) -> bool {
        self.max_occurs.allows(self.occurrence_count() + 1)
    }

    /// True if one less occurrence stays within `min_occurs`.
    pub fn can_remove_occurrence(&self) -> bool {
        self.occurrence_count() > self.min_occurs as usize
    }

    /// Appends a freshly parsed occurrence to a group, returning the new occurrence count.
    ///
    /// Bounds are not enforced here, see [Parameter::can_add_occurrence].
    pub fn add_occurrence(&mut self) -> Result<usize, TreeError> {
        let id = self.id.clone();
        let prefix = id.occurrence(self.occurrence_count());
        let group = self.as_group_mut().ok_or(TreeError::NotAGroup(id))?;
        let occurrence = build(&group.template, Some(&prefix));
        group.occurrences.push(occurrence);
        Ok(group.occurrences.len())
    }

    /// Removes the occurrence at `index` from a group, if present. Later occurrences are
    /// renumbered so ids keep matching tree positions.
    ///
    /// Removal below `min_occurs` is allowed; validation reports it.
    pub fn remove_occurrence(&mut self, index: usize) -> Result<Option<Occurrence>, TreeError> {
        let id = self.id.clone();
        let group = self
            .as_group_mut()
            .ok_or_else(|| TreeError::NotAGroup(id.clone()))?;
        if index >= group.occurrences.len() {
            return Ok(None);
        }
        let removed = group.occurrences.remove(index);
        for (position, occurrence) in group.occurrences.iter_mut().enumerate().skip(index) {
            reprefix(occurrence, &id.occurrence(position));
        }
        Ok(Some(removed))
    }

    /// Drops trailing occurrences of a group until at most `count` remain.
    pub(crate) fn truncate_occurrences(&mut self, count: usize) {
        if let Some(group) = self.as_group_mut() {
            group.occurrences.truncate(count);
        }
    }

    fn set_id(&mut self, id: ParamId) {
        if let ParameterKind::Group(group) = &mut self.kind {
            for (position, occurrence) in group.occurrences.iter_mut().enumerate() {
                reprefix(occurrence, &id.occurrence(position));
            }
        }
        self.id = id;
    }
}

fn reprefix(occurrence: &mut Occurrence, prefix: &ParamId) {
    for param in occurrence {
        let id = prefix.child(&param.name);
        param.set_id(id);
    }
}

/// A parameter whose binding has no editor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Unmanageable {
    pub id: ParamId,
    pub binding: String,
    pub mandatory: bool,
}

/// Complete set of parameters for a process.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterTree {
    parameters: Vec<Parameter>,
}

impl ParameterTree {
    pub fn build(descriptor: &descriptor::ProcessDescriptor) -> Self {
        Self {
            parameters: build(&descriptor.descriptors, None),
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut [Parameter] {
        &mut self.parameters
    }

    /// Finds a parameter anywhere in the tree by id.
    pub fn find(&self, id: &ParamId) -> Option<&Parameter> {
        find_in(&self.parameters, id)
    }

    /// Finds a parameter anywhere in the tree by id.
    pub fn find_mut(&mut self, id: &ParamId) -> Option<&mut Parameter> {
        find_in_mut(&mut self.parameters, id)
    }

    /// Looks up a parameter, failing with [TreeError::UnknownParameter].
    pub fn get_mut(&mut self, id: &ParamId) -> Result<&mut Parameter, TreeError> {
        self.find_mut(id)
            .ok_or_else(|| TreeError::UnknownParameter(id.clone()))
    }

    /// Replaces the value at `index` of a simple parameter.
    pub fn set_value(&mut self, id: &ParamId, index: usize, value: Value) -> Result<(), TreeError> {
        let param = self.get_mut(id)?;
        let simple = param
            .as_simple_mut()
            .ok_or_else(|| TreeError::NotASimple(id.clone()))?;
        let slot = simple
            .save
            .get_mut(index)
            .ok_or_else(|| TreeError::IndexOutOfRange {
                id: id.clone(),
                index,
            })?;
        *slot = value;
        Ok(())
    }

    /// Appends a value to a simple parameter, returning its new value count.
    pub fn push_value(&mut self, id: &ParamId, value: Value) -> Result<usize, TreeError> {
        let simple = self.simple_mut(id)?;
        simple.save.push(value);
        Ok(simple.save.len())
    }

    /// Removes the value at `index` of a simple parameter, if present.
    pub fn remove_value(&mut self, id: &ParamId, index: usize) -> Result<Option<Value>, TreeError> {
        let simple = self.simple_mut(id)?;
        if index >= simple.save.len() {
            return Ok(None);
        }
        Ok(Some(simple.save.remove(index)))
    }

    /// The value at `index` of a simple parameter.
    pub fn value(&self, id: &ParamId, index: usize) -> Result<&Value, TreeError> {
        let param = self
            .find(id)
            .ok_or_else(|| TreeError::UnknownParameter(id.clone()))?;
        let simple = param
            .as_simple()
            .ok_or_else(|| TreeError::NotASimple(id.clone()))?;
        simple
            .save
            .get(index)
            .ok_or_else(|| TreeError::IndexOutOfRange {
                id: id.clone(),
                index,
            })
    }

    fn simple_mut(&mut self, id: &ParamId) -> Result<&mut SimpleParameter, TreeError> {
        self.get_mut(id)?
            .as_simple_mut()
            .ok_or_else(|| TreeError::NotASimple(id.clone()))
    }

    /// Visits every parameter, depth first, in tree order.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Parameter)) {
        walk_in(&self.parameters, visit);
    }

    /// Lists simple parameters whose binding has no editor in `editors`.
    pub fn unmanageable(&self, editors: &dyn registry::EditorLookup) -> Vec<Unmanageable> {
        let mut found = Vec::new();
        self.walk(&mut |param| {
            if let Some(simple) = param.as_simple() {
                if !editors.has_editor(simple.binding.type_id()) {
                    found.push(Unmanageable {
                        id: param.id.clone(),
                        binding: simple.binding.type_id().to_owned(),
                        mandatory: param.mandatory(),
                    });
                }
            }
        });
        found
    }
}

fn find_in<'a>(params: &'a [Parameter], id: &ParamId) -> Option<&'a Parameter> {
    for param in params {
        if &param.id == id {
            return Some(param);
        }
        if !id.is_within(&param.id) {
            continue;
        }
        if let Some(group) = param.as_group() {
            for occurrence in &group.occurrences {
                if let Some(found) = find_in(occurrence, id) {
                    return Some(found);
                }
            }
        }
    }
    None
}

fn find_in_mut<'a>(params: &'a mut [Parameter], id: &ParamId) -> Option<&'a mut Parameter> {
    for param in params {
        if &param.id == id {
            return Some(param);
        }
        if !id.is_within(&param.id) {
            continue;
        }
        if let ParameterKind::Group(group) = &mut param.kind {
            for occurrence in &mut group.occurrences {
                if let Some(found) = find_in_mut(occurrence, id) {
                    return Some(found);
                }
            }
        }
    }
    None
}

fn walk_in<'a>(params: &'a [Parameter], visit: &mut dyn FnMut(&'a Parameter)) {
    for param in params {
        visit(param);
        if let Some(group) = param.as_group() {
            for occurrence in &group.occurrences {
                walk_in(occurrence, visit);
            }
        }
    }
}
