use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::StandoffError;

/// A qualified identifier: an optional namespace URI plus a local name.
/// This is the name of an annotation layer and of XML elements and attributes
/// encountered during conversion.
///
/// The string form is `{namespace}localname`, or the bare local name when there
/// is no namespace, and round-trips through [`FromStr`] and [`fmt::Display`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    namespace: Option<String>,
    local_name: String,
}

impl Name {
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|ns| ns.into()),
            local_name: local_name.into(),
        }
    }

    /// Shortcut constructor for a name without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }
}

impl Ord for Name {
    /// Names with a namespace sort by namespace and then local name;
    /// names without a namespace sort after all namespaced ones, by local name.
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.namespace, &other.namespace) {
            (Some(ns), Some(other_ns)) => ns
                .cmp(other_ns)
                .then_with(|| self.local_name.cmp(&other.local_name)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.local_name.cmp(&other.local_name),
        }
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            write!(f, "{{{}}}{}", namespace, self.local_name)
        } else {
            write!(f, "{}", self.local_name)
        }
    }
}

impl FromStr for Name {
    type Err = StandoffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(remainder) = s.strip_prefix('{') {
            if let Some((namespace, local_name)) = remainder.split_once('}') {
                if local_name.is_empty() {
                    return Err(StandoffError::NameError(
                        s.to_string(),
                        "local name must not be empty",
                    ));
                }
                Ok(Self::new(Some(namespace), local_name))
            } else {
                Err(StandoffError::NameError(
                    s.to_string(),
                    "unterminated namespace (missing '}')",
                ))
            }
        } else if s.is_empty() {
            Err(StandoffError::NameError(
                s.to_string(),
                "local name must not be empty",
            ))
        } else {
            Ok(Self::local(s))
        }
    }
}

impl Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NameVisitor;

        impl<'de> Visitor<'de> for NameVisitor {
            type Value = Name;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a name in `{namespace}localname` or `localname` form")
            }

            fn visit_str<E>(self, value: &str) -> Result<Name, E>
            where
                E: de::Error,
            {
                Name::from_str(value).map_err(|e| E::custom(String::from(&e)))
            }
        }

        deserializer.deserialize_str(NameVisitor)
    }
}
