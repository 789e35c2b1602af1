//! User-declared property schema.
//!
//! Each entity type carries a list of [`PropertyDefinition`]s; the values
//! live next to the core fields in the entity's [`Properties`] map. Values
//! written through [`Properties::set_validated`] are checked against the
//! definition's type and keyed by definition id. Documents written by older
//! clients key values by property *name* and hold plain strings, so lookups
//! accept either key.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use super::serde_util::serialize_compact_f64;
use crate::{Error, Result};

/// Date format for `date` properties and event dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Entity types that support user-declared properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyEntity {
    Courses,
    CalendarEvents,
    MindSpaceItems,
    Files,
    Grades,
}

impl PropertyEntity {
    pub const ALL: [PropertyEntity; 5] = [
        PropertyEntity::Courses,
        PropertyEntity::CalendarEvents,
        PropertyEntity::MindSpaceItems,
        PropertyEntity::Files,
        PropertyEntity::Grades,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyEntity::Courses => "courses",
            PropertyEntity::CalendarEvents => "calendar_events",
            PropertyEntity::MindSpaceItems => "mind_space_items",
            PropertyEntity::Files => "files",
            PropertyEntity::Grades => "grades",
        }
    }
}

impl fmt::Display for PropertyEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    Text,
    Number,
    Date,
}

/// One user-declared extra field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: PropertyType,
    #[serde(default)]
    pub order: u32,
}

/// Property definitions for every entity type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinitions {
    #[serde(default)]
    pub courses: Vec<PropertyDefinition>,
    #[serde(default)]
    pub calendar_events: Vec<PropertyDefinition>,
    #[serde(default)]
    pub mind_space_items: Vec<PropertyDefinition>,
    #[serde(default)]
    pub files: Vec<PropertyDefinition>,
    #[serde(default)]
    pub grades: Vec<PropertyDefinition>,
}

impl PropertyDefinitions {
    pub fn get(&self, entity: PropertyEntity) -> &[PropertyDefinition] {
        match entity {
            PropertyEntity::Courses => &self.courses,
            PropertyEntity::CalendarEvents => &self.calendar_events,
            PropertyEntity::MindSpaceItems => &self.mind_space_items,
            PropertyEntity::Files => &self.files,
            PropertyEntity::Grades => &self.grades,
        }
    }

    pub fn get_mut(&mut self, entity: PropertyEntity) -> &mut Vec<PropertyDefinition> {
        match entity {
            PropertyEntity::Courses => &mut self.courses,
            PropertyEntity::CalendarEvents => &mut self.calendar_events,
            PropertyEntity::MindSpaceItems => &mut self.mind_space_items,
            PropertyEntity::Files => &mut self.files,
            PropertyEntity::Grades => &mut self.grades,
        }
    }

    /// Definitions for `entity`, sorted by `order`.
    pub fn sorted(&self, entity: PropertyEntity) -> Vec<&PropertyDefinition> {
        let mut defs: Vec<_> = self.get(entity).iter().collect();
        defs.sort_by_key(|d| d.order);
        defs
    }

    /// Find a definition by id, falling back to a case-insensitive name match.
    pub fn find(&self, entity: PropertyEntity, key: &str) -> Option<&PropertyDefinition> {
        let defs = self.get(entity);
        defs.iter()
            .find(|d| d.id == key)
            .or_else(|| defs.iter().find(|d| d.name.eq_ignore_ascii_case(key)))
    }

    pub fn is_empty(&self) -> bool {
        PropertyEntity::ALL.iter().all(|e| self.get(*e).is_empty())
    }
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl PropertyValue {
    /// Parse raw form input against a declared type.
    ///
    /// Returns `Ok(None)` for blank input, which means "unset".
    pub fn parse(kind: PropertyType, raw: &str) -> Result<Option<Self>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let value = match kind {
            PropertyType::Text => PropertyValue::Text(raw.to_string()),
            PropertyType::Number => {
                let n: f64 = trimmed.parse().map_err(|_| {
                    Error::InvalidInput(format!("'{}' is not a number", trimmed))
                })?;
                if !n.is_finite() {
                    return Err(Error::InvalidInput(format!("'{}' is not a number", trimmed)));
                }
                PropertyValue::Number(n)
            }
            PropertyType::Date => {
                let d = NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| {
                    Error::InvalidInput(format!("'{}' is not a date (YYYY-MM-DD)", trimmed))
                })?;
                PropertyValue::Date(d)
            }
        };
        Ok(Some(value))
    }

    /// Re-interpret a stored value as `kind`. Legacy documents hold every
    /// value as a string.
    pub fn coerce(&self, kind: PropertyType) -> Option<PropertyValue> {
        match (self, kind) {
            (PropertyValue::Text(s), PropertyType::Text) => Some(PropertyValue::Text(s.clone())),
            (v, PropertyType::Text) => Some(PropertyValue::Text(v.to_string())),
            (PropertyValue::Number(n), PropertyType::Number) => Some(PropertyValue::Number(*n)),
            (PropertyValue::Date(d), PropertyType::Date) => Some(PropertyValue::Date(*d)),
            (v, kind) => PropertyValue::parse(kind, &v.to_string()).ok().flatten(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::Text(s) => s.trim().parse().ok(),
            PropertyValue::Date(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            PropertyValue::Number(n) => write!(f, "{}", n),
            PropertyValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PropertyValue::Text(t) => s.serialize_str(t),
            PropertyValue::Number(n) => serialize_compact_f64(n, s),
            PropertyValue::Date(d) => s.collect_str(&d.format(DATE_FORMAT)),
        }
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        match JsonValue::deserialize(d)? {
            JsonValue::String(s) => Ok(PropertyValue::Text(s)),
            JsonValue::Number(n) => n
                .as_f64()
                .map(PropertyValue::Number)
                .ok_or_else(|| serde::de::Error::custom("property number out of range")),
            JsonValue::Bool(b) => Ok(PropertyValue::Text(b.to_string())),
            JsonValue::Null => Ok(PropertyValue::Text(String::new())),
            other => Err(serde::de::Error::custom(format!(
                "property values must be scalars, found {}",
                other
            ))),
        }
    }
}

/// Property values of one entity, keyed by definition id (or legacy name).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, PropertyValue>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    /// Raw lookup by exact key.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    /// Look up the value for `def`, by id first and then by name.
    pub fn resolve(&self, def: &PropertyDefinition) -> Option<&PropertyValue> {
        self.0.get(&def.id).or_else(|| self.0.get(&def.name))
    }

    /// Look up by definition id or property name, with definitions when
    /// available and a raw key match otherwise.
    pub fn lookup(&self, defs: &[PropertyDefinition], key: &str) -> Option<&PropertyValue> {
        let def = defs
            .iter()
            .find(|d| d.id == key)
            .or_else(|| defs.iter().find(|d| d.name.eq_ignore_ascii_case(key)));
        match def {
            Some(def) => self.resolve(def),
            None => self.0.get(key),
        }
    }

    /// Store an already-typed value under `def.id`, dropping any legacy
    /// name-keyed copy.
    pub fn insert(&mut self, def: &PropertyDefinition, value: PropertyValue) {
        if def.name != def.id {
            self.0.remove(&def.name);
        }
        self.0.insert(def.id.clone(), value);
    }

    /// Parse `raw` against the definition that `key` resolves to and store
    /// it under the definition id. Blank input removes the value.
    pub fn set_validated(&mut self, defs: &[PropertyDefinition], key: &str, raw: &str) -> Result<()> {
        let def = defs
            .iter()
            .find(|d| d.id == key)
            .or_else(|| defs.iter().find(|d| d.name.eq_ignore_ascii_case(key)))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown property '{}'", key)))?;

        match PropertyValue::parse(def.kind, raw)
            .map_err(|e| Error::InvalidInput(format!("{}: {}", def.name, strip_prefix(&e))))?
        {
            Some(value) => self.insert(def, value),
            None => {
                self.0.remove(&def.id);
                self.0.remove(&def.name);
            }
        }
        Ok(())
    }

    /// Build a validated map from raw form input.
    pub fn from_input<'a, I>(defs: &[PropertyDefinition], input: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut props = Properties::new();
        for (key, raw) in input {
            props.set_validated(defs, key, raw)?;
        }
        Ok(props)
    }

    /// Drop every value belonging to `def`.
    pub fn remove_definition(&mut self, def: &PropertyDefinition) -> bool {
        let by_id = self.0.remove(&def.id).is_some();
        let by_name = self.0.remove(&def.name).is_some();
        by_id || by_name
    }
}

impl FromIterator<(String, PropertyValue)> for Properties {
    fn from_iter<T: IntoIterator<Item = (String, PropertyValue)>>(iter: T) -> Self {
        Properties(iter.into_iter().collect())
    }
}

fn strip_prefix(err: &Error) -> String {
    match err {
        Error::InvalidInput(msg) => msg.clone(),
        other => other.to_string(),
    }
}
