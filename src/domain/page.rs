use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// What the fetcher extracted from a page: everything the heuristics look at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: String,
    pub forms: Vec<FormDescriptor>,
}

impl PageMetadata {
    pub fn new(title: impl Into<String>, forms: Vec<FormDescriptor>) -> Self {
        Self {
            title: title.into(),
            forms,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDescriptor {
    pub fields: BTreeSet<FieldKind>,
}

impl FormDescriptor {
    pub fn from_kinds(kinds: impl IntoIterator<Item = FieldKind>) -> Self {
        Self {
            fields: kinds.into_iter().collect(),
        }
    }

    pub fn contains(&self, kind: &FieldKind) -> bool {
        self.fields.contains(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Password,
    Email,
    Hidden,
    Submit,
    /// `<input>` without a `type` attribute.
    Unspecified,
    Other(String),
}

impl FieldKind {
    /// Maps the value of an `<input type=...>` attribute.
    pub fn from_type_attr(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::Unspecified;
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "password" => Self::Password,
            "email" => Self::Email,
            "hidden" => Self::Hidden,
            "submit" => Self::Submit,
            other => Self::Other(other.to_string()),
        }
    }
}
