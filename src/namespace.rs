use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    #[error("A namespace must consist of at least one name part")]
    Empty,
}

/// Fully qualified, dot-delimited name of a type or script.
///
/// Empty parts are dropped while parsing, so `"A..B."` and `"A.B"` name the same thing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace {
    parts: Vec<String>,
}

impl Namespace {
    pub fn new<I, S>(parts: I) -> Result<Self, NamespaceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts: Vec<String> = parts
            .into_iter()
            .map(Into::into)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            return Err(NamespaceError::Empty);
        }
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Last name part, e.g. `Dog` for `{Animals.Dog}`.
    pub fn short_name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or_default()
    }

    /// Appends dot-delimited parts to this namespace.
    pub fn join(&self, added: &str) -> Self {
        let mut parts = self.parts.clone();
        parts.extend(
            added
                .split('.')
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        );
        Self { parts }
    }

    pub fn dotted(&self) -> String {
        self.parts.join(".")
    }
}

impl FromStr for Namespace {
    type Err = NamespaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.split('.'))
    }
}

impl TryFrom<&str> for Namespace {
    type Error = NamespaceError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for Namespace {
    type Error = NamespaceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Namespace> for String {
    fn from(value: Namespace) -> Self {
        value.dotted()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.dotted())
    }
}
