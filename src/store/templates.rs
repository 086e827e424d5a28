//! Saved presets for the name-change and group-join operations

use std::{fmt, str::FromStr, sync::Arc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use super::indexed::IndexedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Name,
    Group,
}

impl TemplateKind {
    /// Name of the backing list in the indexed store
    pub fn list_name(self) -> &'static str {
        match self {
            Self::Name => "templates-name",
            Self::Group => "templates-group",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Group => f.write_str("group"),
        }
    }
}

impl FromStr for TemplateKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "name" => Ok(Self::Name),
            "group" => Ok(Self::Group),
            other => Err(Error::Validation(format!("unknown template type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameTemplate {
    pub name: String,
    /// Countdown seconds, 0 for none
    pub time: u64,
    /// Append `name` to the current persona name instead of replacing it
    pub plus: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTemplate {
    pub group_name: String,
    pub url: String,
    pub time: u64,
}

/// A stored preset. Serialized as its bare payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Template {
    Name(NameTemplate),
    Group(GroupTemplate),
}

impl Template {
    pub fn kind(&self) -> TemplateKind {
        match self {
            Self::Name(_) => TemplateKind::Name,
            Self::Group(_) => TemplateKind::Group,
        }
    }

    pub fn time(&self) -> u64 {
        match self {
            Self::Name(tpl) => tpl.time,
            Self::Group(tpl) => tpl.time,
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(match self {
            Self::Name(tpl) => serde_json::to_value(tpl)?,
            Self::Group(tpl) => serde_json::to_value(tpl)?,
        })
    }

    pub fn from_value(kind: TemplateKind, value: Value) -> Result<Self> {
        Ok(match kind {
            TemplateKind::Name => Self::Name(serde_json::from_value(value)?),
            TemplateKind::Group => Self::Group(serde_json::from_value(value)?),
        })
    }
}

/// Typed save/recall/remove over the indexed store, one list per kind.
///
/// Indices are positions, not identities: removing an entry shifts every
/// later one down. Use [`TemplateRepository::remove_checked`] when the index
/// came from a list the user was looking at.
#[derive(Clone)]
pub struct TemplateRepository {
    store: Arc<IndexedStore>,
}

impl TemplateRepository {
    pub fn new(store: Arc<IndexedStore>) -> Self {
        Self { store }
    }

    /// Append a template to its list; returns its index
    pub async fn save(&self, template: &Template) -> Result<usize> {
        self.store
            .push(template.kind().list_name(), template.to_value()?)
            .await
    }

    pub async fn recall(&self, kind: TemplateKind, index: usize) -> Result<Template> {
        let value = self.store.get(kind.list_name(), index).await?;
        Template::from_value(kind, value)
    }

    pub async fn list(&self, kind: TemplateKind) -> Result<Vec<Template>> {
        let values = self.store.list(kind.list_name()).await?;
        decode_all(kind, values)
    }

    /// Remove by position; returns the remaining list
    pub async fn remove(&self, kind: TemplateKind, index: usize) -> Result<Vec<Template>> {
        let values = self.store.remove(kind.list_name(), index).await?;
        decode_all(kind, values)
    }

    /// Remove by position only if the entry still equals what the caller saw
    pub async fn remove_checked(
        &self,
        kind: TemplateKind,
        index: usize,
        expected: &Template,
    ) -> Result<Vec<Template>> {
        if expected.kind() != kind {
            return Err(Error::Validation(format!(
                "expected a {} template, got a {} template",
                kind,
                expected.kind()
            )));
        }
        let values = self
            .store
            .remove_if(kind.list_name(), index, &expected.to_value()?)
            .await?;
        decode_all(kind, values)
    }
}

fn decode_all(kind: TemplateKind, values: Vec<Value>) -> Result<Vec<Template>> {
    values
        .into_iter()
        .map(|value| Template::from_value(kind, value))
        .collect()
}

/// Drop a leading "<persona> " so only the added part of a name is stored
pub fn strip_present_name<'a>(value: &'a str, persona: &str) -> &'a str {
    if persona.is_empty() {
        return value;
    }
    match value.strip_prefix(persona) {
        Some(rest) if rest.is_empty() => rest,
        Some(rest) => rest.strip_prefix(' ').unwrap_or(value),
        None => value,
    }
}

/// Name a template asks for, given the current persona name
pub fn compose_name(template: &NameTemplate, persona: &str) -> String {
    if template.plus {
        format!("{} {}", persona, template.name)
    } else {
        template.name.clone()
    }
}
