//! Declared value types of simple parameters.
//!
//! A binding is resolved once, when a parameter is built. The type id string is kept only to
//! look up an editor in a [crate::registry::EditorRegistry]; conversion and validation use the
//! [BindingKind].

/// Suffix marking an array-typed binding, e.g. `java.lang.String[]`.
pub const ARRAY_MARKER: &str = "[]";

/// Value family of a binding, which decides conversion and validation rules.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BindingKind {
    Integer,
    Float,
    Boolean,
    /// File or path, possibly filled by an upload.
    File,
    /// Anything else, passed through unchanged.
    Opaque,
}

impl BindingKind {
    /// Classifies an element type id (without [ARRAY_MARKER]).
    pub fn classify(type_id: &str) -> Self {
        use BindingKind::*;
        match type_id {
            "java.lang.Integer" | "int" | "java.lang.Long" | "long" => Integer,
            "java.lang.Double" | "double" | "java.lang.Float" | "float" => Float,
            "java.lang.Boolean" | "boolean" => Boolean,
            "java.io.File" | "java.nio.file.Path" => File,
            _ => Opaque,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, BindingKind::Integer | BindingKind::Float)
    }
}

/// Resolved element type of a simple parameter.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Binding {
    type_id: String,
    kind: BindingKind,
}

impl Binding {
    /// Creates a binding for an element type id.
    pub fn new(type_id: impl Into<String>) -> Self {
        let type_id = type_id.into();
        let kind = BindingKind::classify(&type_id);
        Self { type_id, kind }
    }

    /// Parses a descriptor `class`, returning the element binding and whether the class carried
    /// the array marker.
    pub fn from_class(class: &str) -> (Self, bool) {
        match class.strip_suffix(ARRAY_MARKER) {
            Some(element) => (Self::new(element), true),
            None => (Self::new(class), false),
        }
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }
}

impl std::fmt::Display for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.type_id)
    }
}
