//! Process identifiers and the catalogue of processes offered for selection.

use std::str::FromStr;

/// A process name without the `authority:code` separator.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("process name {0:?} is not of the form authority:code")]
pub struct InvalidProcessName(pub String);

/// Identifies a process by its authority and code.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ProcessId {
    pub authority: String,
    pub code: String,
}

impl ProcessId {
    const SEPARATOR: char = ':';

    pub fn new(authority: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            code: code.into(),
        }
    }

    /// Parses `authority:code`, splitting at the first separator. The code may itself contain
    /// separators.
    pub fn parse(name: &str) -> Result<Self, InvalidProcessName> {
        name.split_once(Self::SEPARATOR)
            .map(|(authority, code)| Self::new(authority, code))
            .ok_or_else(|| InvalidProcessName(name.to_owned()))
    }
}

impl FromStr for ProcessId {
    type Err = InvalidProcessName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.authority, Self::SEPARATOR, self.code)
    }
}

/// Processes of one authority.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuthorityProcesses {
    pub authority: String,
    pub codes: Vec<String>,
}

/// Processes grouped by authority, in the order they were first listed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProcessCatalog {
    pub authorities: Vec<AuthorityProcesses>,
}

impl ProcessCatalog {
    /// Groups `authority:code` names. Names without a separator are skipped with a warning.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Self::default();
        for name in names {
            match ProcessId::parse(name.as_ref()) {
                Ok(id) => catalog.insert(id),
                Err(err) => log::warn!("Skipping process: {err}"),
            }
        }
        catalog
    }

    fn insert(&mut self, id: ProcessId) {
        match self
            .authorities
            .iter_mut()
            .find(|group| group.authority == id.authority)
        {
            Some(group) => group.codes.push(id.code),
            None => self.authorities.push(AuthorityProcesses {
                authority: id.authority,
                codes: vec![id.code],
            }),
        }
    }

    pub fn contains(&self, id: &ProcessId) -> bool {
        self.authorities
            .iter()
            .any(|group| group.authority == id.authority && group.codes.contains(&id.code))
    }

    /// All processes, in catalogue order.
    pub fn process_ids(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.authorities.iter().flat_map(|group| {
            group
                .codes
                .iter()
                .map(|code| ProcessId::new(&group.authority, code))
        })
    }
}

/// Short display form of a qualified name: the text after its last `:`.
pub fn simplify_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, last)| last).unwrap_or(name)
}
