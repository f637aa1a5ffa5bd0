use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::NormalizeError;
use crate::links::RawLinks;

/// A notice as delivered by the listing feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNotice {
    /// Surname.
    pub name: String,
    /// Given name.
    pub forename: String,
    /// Loosely formatted, e.g. `1986/02/10` or `1986/2/10`. Never validated.
    pub date_of_birth: String,
    /// `<year>/<serial>`, one per underlying subject.
    pub entity_id: String,
    pub nationalities: Vec<String>,
    #[serde(rename = "_links", alias = "links")]
    pub links: RawLinks,
}

const LINKS_FIELD: &str = "_links";
const LINKS_ALIAS: &str = "links";

impl RawNotice {
    /// Reads a notice out of an untyped JSON object, reporting the first
    /// absent or mistyped field.
    pub fn from_value(index: usize, value: &Value) -> Result<Self, NormalizeError> {
        let object = value
            .as_object()
            .ok_or(NormalizeError::NotAnObject { index })?;

        let name = string_field(index, object, "name")?;
        let forename = string_field(index, object, "forename")?;
        let date_of_birth = string_field(index, object, "date_of_birth")?;
        let entity_id = string_field(index, object, "entity_id")?;
        let nationalities = string_list_field(index, object, "nationalities")?;

        let links_value = present(object, LINKS_FIELD)
            .or_else(|| present(object, LINKS_ALIAS))
            .ok_or(NormalizeError::MissingField {
                index,
                field: LINKS_FIELD,
            })?;
        // Only the outer shape is checked here; lookups happen during
        // image extraction.
        let links = RawLinks::from_value(links_value).map_err(|source| {
            NormalizeError::MalformedLinks {
                index,
                entity_id: entity_id.clone(),
                source,
            }
        })?;

        Ok(RawNotice {
            name,
            forename,
            date_of_birth,
            entity_id,
            nationalities,
            links,
        })
    }
}

fn present<'a>(object: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    object.get(field).filter(|v| !v.is_null())
}

fn string_field(
    index: usize,
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<String, NormalizeError> {
    let value = present(object, field).ok_or(NormalizeError::MissingField { index, field })?;
    value
        .as_str()
        .map(str::to_owned)
        .ok_or(NormalizeError::InvalidField {
            index,
            field,
            expected: "a string",
        })
}

fn string_list_field(
    index: usize,
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Vec<String>, NormalizeError> {
    let invalid = NormalizeError::InvalidField {
        index,
        field,
        expected: "an array of strings",
    };
    let value = present(object, field).ok_or(NormalizeError::MissingField { index, field })?;
    let Some(items) = value.as_array() else {
        return Err(invalid);
    };
    items
        .iter()
        .map(|item| item.as_str().map(str::to_owned))
        .collect::<Option<Vec<_>>>()
        .ok_or(invalid)
}

/// Flat output record. Every field except `image` is copied verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub name: String,
    /// Holds the notice's `forename`; the downstream consumers expect it
    /// under this key.
    pub lastname: String,
    pub nationalities: Vec<String>,
    pub entity_id: String,
    pub date_of_birth: String,
    pub image: String,
}

impl NormalizedRecord {
    pub fn from_notice(notice: &RawNotice, image: impl Into<String>) -> Self {
        NormalizedRecord {
            name: notice.name.clone(),
            lastname: notice.forename.clone(),
            nationalities: notice.nationalities.clone(),
            entity_id: notice.entity_id.clone(),
            date_of_birth: notice.date_of_birth.clone(),
            image: image.into(),
        }
    }
}

pub type NormalizedCollection = BTreeMap<usize, NormalizedRecord>;
