//! Read-only process descriptors, as served by a process-description service.
//!
//! The wire format does not tag parameter kinds: a descriptor with a `class` is a simple
//! parameter, anything else is a group of nested `descriptors`. That distinction is made once
//! here, while deserializing, into [DescriptorKind].


use serde::{Deserialize, Serialize};

/// Describes the invocable parameters of a process.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ProcessDescriptor {
    #[serde(default, with = "one_or_many")]
    pub descriptors: Vec<ParameterDescriptor>,
}

/// Describes a single parameter of a process, or of an enclosing group.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(from = "RawParameterDescriptor", into = "RawParameterDescriptor")]
pub struct ParameterDescriptor {
    pub name: String,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub description: Option<String>,
    pub kind: DescriptorKind,
}

impl ParameterDescriptor {
    pub const DEFAULT_MIN_OCCURS: u32 = 1;
    pub const DEFAULT_MAX_OCCURS: MaxOccurs = MaxOccurs::Bounded(1);

    /// Creates a mandatory, single-occurrence simple parameter descriptor.
    pub fn simple(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_occurs: Self::DEFAULT_MIN_OCCURS,
            max_occurs: Self::DEFAULT_MAX_OCCURS,
            description: None,
            kind: DescriptorKind::Simple(SimpleDescriptor {
                class: class.into(),
                ..Default::default()
            }),
        }
    }

    /// Creates a mandatory, single-occurrence group descriptor.
    pub fn group(name: impl Into<String>, descriptors: Vec<ParameterDescriptor>) -> Self {
        Self {
            name: name.into(),
            min_occurs: Self::DEFAULT_MIN_OCCURS,
            max_occurs: Self::DEFAULT_MAX_OCCURS,
            description: None,
            kind: DescriptorKind::Group(GroupDescriptor { descriptors }),
        }
    }

    pub fn with_occurs(mut self, min_occurs: u32, max_occurs: MaxOccurs) -> Self {
        self.min_occurs = min_occurs;
        self.max_occurs = max_occurs;
        self
    }

    /// Sets the default value. Has no effect on group descriptors.
    pub fn with_default(mut self, default_value: serde_json::Value) -> Self {
        if let DescriptorKind::Simple(simple) = &mut self.kind {
            simple.default_value = Some(default_value).filter(|v| !v.is_null());
        }
        self
    }

    /// Sets the restriction. Has no effect on group descriptors.
    pub fn with_restriction(mut self, restriction: RestrictionDescriptor) -> Self {
        if let DescriptorKind::Simple(simple) = &mut self.kind {
            simple.restriction = Some(restriction);
        }
        self
    }

    /// Sets the extension metadata. Has no effect on group descriptors.
    pub fn with_ext(mut self, ext: serde_json::Value) -> Self {
        if let DescriptorKind::Simple(simple) = &mut self.kind {
            simple.ext = Some(ext);
        }
        self
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, DescriptorKind::Group(_))
    }
}

/// Simple parameter or group of parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum DescriptorKind {
    Simple(SimpleDescriptor),
    Group(GroupDescriptor),
}

/// Declaration of a single-valued (or array-valued) parameter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimpleDescriptor {
    /// Type binding identifier, possibly carrying the
    /// [crate::binding::ARRAY_MARKER].
    pub class: String,
    pub default_value: Option<serde_json::Value>,
    pub restriction: Option<RestrictionDescriptor>,
    pub unit: Option<String>,
    /// Opaque extension metadata, e.g. a filter applied to reference lists.
    pub ext: Option<serde_json::Value>,
}

/// Declaration of a repeatable block of parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupDescriptor {
    pub descriptors: Vec<ParameterDescriptor>,
}

/// Constraints on the values of a simple parameter.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictionDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_values: Option<Vec<serde_json::Value>>,
}

/// Upper bound on the number of occurrences of a parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    const UNBOUNDED: &str = "unbounded";

    /// True if `count` occurrences are allowed by this bound.
    pub fn allows(self, count: usize) -> bool {
        match self {
            MaxOccurs::Bounded(max) => count <= max as usize,
            MaxOccurs::Unbounded => true,
        }
    }
}

impl std::fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaxOccurs::Bounded(max) => write!(f, "{max}"),
            MaxOccurs::Unbounded => f.write_str(Self::UNBOUNDED),
        }
    }
}

impl Serialize for MaxOccurs {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            MaxOccurs::Bounded(max) => serializer.serialize_u32(*max),
            MaxOccurs::Unbounded => serializer.serialize_str(Self::UNBOUNDED),
        }
    }
}

impl<'de> Deserialize<'de> for MaxOccurs {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawMaxOccurs {
            Number(u64),
            Text(String),
        }

        match RawMaxOccurs::deserialize(deserializer)? {
            // Services written in Java report "unbounded" as Integer.MAX_VALUE.
            RawMaxOccurs::Number(n) if n >= i32::MAX as u64 => Ok(MaxOccurs::Unbounded),
            RawMaxOccurs::Number(n) => Ok(MaxOccurs::Bounded(n as u32)),
            RawMaxOccurs::Text(s) if s.eq_ignore_ascii_case(Self::UNBOUNDED) => {
                Ok(MaxOccurs::Unbounded)
            }
            RawMaxOccurs::Text(s) => Err(serde::de::Error::invalid_value(
                serde::de::Unexpected::Str(&s),
                &"a non-negative integer or \"unbounded\"",
            )),
        }
    }
}

/// Wire form of [ParameterDescriptor].
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RawParameterDescriptor {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_occurs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_occurs: Option<MaxOccurs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    restriction: Option<RestrictionDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ext: Option<serde_json::Value>,
    #[serde(
        default,
        with = "one_or_many_opt",
        skip_serializing_if = "Option::is_none"
    )]
    descriptors: Option<Vec<ParameterDescriptor>>,
}

impl From<RawParameterDescriptor> for ParameterDescriptor {
    fn from(raw: RawParameterDescriptor) -> Self {
        let kind = match raw.class {
            Some(class) => DescriptorKind::Simple(SimpleDescriptor {
                class,
                // An explicit JSON null default is the same as no default.
                default_value: raw.default_value.filter(|v| !v.is_null()),
                restriction: raw.restriction,
                unit: raw.unit,
                ext: raw.ext,
            }),
            None => DescriptorKind::Group(GroupDescriptor {
                descriptors: raw.descriptors.unwrap_or_default(),
            }),
        };
        Self {
            name: raw.name,
            min_occurs: raw.min_occurs.unwrap_or(Self::DEFAULT_MIN_OCCURS),
            max_occurs: raw.max_occurs.unwrap_or(Self::DEFAULT_MAX_OCCURS),
            description: raw.description,
            kind,
        }
    }
}

impl From<ParameterDescriptor> for RawParameterDescriptor {
    fn from(desc: ParameterDescriptor) -> Self {
        let mut raw = RawParameterDescriptor {
            name: desc.name,
            min_occurs: Some(desc.min_occurs),
            max_occurs: Some(desc.max_occurs),
            description: desc.description,
            ..Default::default()
        };
        match desc.kind {
            DescriptorKind::Simple(simple) => {
                raw.class = Some(simple.class);
                raw.default_value = simple.default_value;
                raw.restriction = simple.restriction;
                raw.unit = simple.unit;
                raw.ext = simple.ext;
            }
            DescriptorKind::Group(group) => {
                raw.descriptors = Some(group.descriptors);
            }
        }
        raw
    }
}

/// Nested descriptors are usually a list, but a lone descriptor object is also accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::Many(many) => many,
            OneOrMany::One(one) => vec![one],
        }
    }
}

mod one_or_many {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::OneOrMany;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<T, S>(value: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Ok(OneOrMany::<T>::deserialize(deserializer)?.into())
    }
}

mod one_or_many_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::OneOrMany;

    pub fn serialize<T, S>(value: &Option<Vec<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Ok(Option::<OneOrMany<T>>::deserialize(deserializer)?.map(Vec::from))
    }
}
