//! Choices offered by reference editors.

use paramtree::{Parameter, Value};

use super::{FilterMode, ReferenceSource};
use crate::reference::{ReferenceItem, filter};

/// CRS selected for a mandatory parameter without a default.
pub const DEFAULT_CRS: &str = "EPSG:3857";

/// One entry of a reference editor's drop-down.
#[derive(Clone, Debug, PartialEq)]
pub enum Choice {
    /// Leaves an optional parameter without a value.
    Unset,
    Item(ReferenceItem),
}

impl Choice {
    pub fn to_value(&self) -> Value {
        match self {
            Choice::Unset => Value::Null,
            Choice::Item(item) => item.to_value(),
        }
    }
}

/// The choices of one reference editor, and the value it starts from.
#[derive(Clone, Debug, PartialEq)]
pub struct Choices {
    pub source: ReferenceSource,
    pub choices: Vec<Choice>,
    /// Value given to a slot that has none yet.
    pub initial: Value,
}

impl Choices {
    /// Derives the choices for `param` from the full reference list `items`.
    pub fn build(source: ReferenceSource, items: &[ReferenceItem], param: &Parameter) -> Self {
        let simple = param.as_simple();

        let mut items: Vec<ReferenceItem> = match source {
            ReferenceSource::Services => items
                .iter()
                .filter(|item| item.name().is_some_and(|name| !name.is_empty()))
                .cloned()
                .collect(),
            ReferenceSource::Datas(kind) => items
                .iter()
                .filter(|item| kind.accepts(item.data_type()))
                .cloned()
                .collect(),
            _ => items.to_vec(),
        };

        let pattern = simple
            .and_then(|simple| simple.ext.as_ref())
            .and_then(|ext| ext.get("filter"))
            .filter(|pattern| !pattern.is_null());
        if let Some(pattern) = pattern {
            items = match source.filter_mode() {
                FilterMode::None => items,
                FilterMode::All => filter::filter_all(&items, pattern),
                FilterMode::Any => filter::filter_any(&items, pattern),
            };
        }

        let mut choices = Vec::with_capacity(items.len() + 1);
        if !param.mandatory() && source.offers_unset() {
            choices.push(Choice::Unset);
        }
        choices.extend(items.into_iter().map(Choice::Item));

        let initial = if !param.mandatory() {
            Value::Null
        } else if source == ReferenceSource::CrsCodes {
            match simple.map(|simple| &simple.default) {
                Some(default) if !default.is_null() => default.clone(),
                _ => Value::from(DEFAULT_CRS),
            }
        } else {
            choices.first().map(Choice::to_value).unwrap_or_default()
        };

        Self {
            source,
            choices,
            initial,
        }
    }

    /// Gives `slot` the initial value if it has no value yet. Returns true if it did.
    pub fn fill_unset(&self, slot: &mut Value) -> bool {
        if slot.is_null() && !self.initial.is_null() {
            *slot = self.initial.clone();
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}
