use lazy_regex::regex;

/// Tree-unique identifier of a [super::Parameter].
///
/// Top level parameters are identified by their name. Parameters inside occurrence `k` of group
/// `g` are identified as `<g>_<k>_<name>`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ParamId(String);

impl ParamId {
    const SEPARATOR: char = '_';

    /// Identifier of a top level parameter.
    pub fn root(name: &str) -> Self {
        Self(name.to_owned())
    }

    /// Identifier of a parameter named `name` directly under this prefix.
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}{}{}", self.0, Self::SEPARATOR, name))
    }

    /// Prefix for the children of occurrence `index` of this group.
    pub fn occurrence(&self, index: usize) -> Self {
        Self(format!("{}{}{}", self.0, Self::SEPARATOR, index))
    }

    /// True if this id lies strictly below `ancestor`.
    pub fn is_within(&self, ancestor: &ParamId) -> bool {
        self.0
            .strip_prefix(ancestor.0.as_str())
            .is_some_and(|rest| rest.starts_with(Self::SEPARATOR))
    }

    /// Form of the id safe for use as a UI control identifier.
    pub fn control_id(&self) -> String {
        regex!(r"[:.]").replace_all(&self.0, "_").into_owned()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParamId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ParamId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
