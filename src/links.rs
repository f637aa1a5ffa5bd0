//! The `_links` block of a notice.
//!
//! The feed sometimes hands it over as a real mapping and sometimes as a
//! single-quoted textual dump of that mapping. Both shapes resolve to the
//! same [`LinkSet`] before any lookup happens.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const IMAGES_RELATION: &str = "images";

#[derive(Debug, thiserror::Error)]
pub enum LinksError {
    #[error("links text is not valid JSON after quote normalization: {0}")]
    Unparsable(#[from] serde_json::Error),

    #[error("links must be a mapping or its textual form, got {0}")]
    NotAMapping(&'static str),

    #[error("no `{0}` relation")]
    MissingRelation(String),

    #[error("relation `{0}` has no string `href`")]
    MissingHref(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLinks {
    Structured(Map<String, Value>),
    Serialized(String),
}

impl RawLinks {
    /// Builds a `RawLinks` from whatever JSON value sat in the record.
    pub fn from_value(value: &Value) -> Result<Self, LinksError> {
        match value {
            Value::Object(map) => Ok(RawLinks::Structured(map.clone())),
            Value::String(text) => Ok(RawLinks::Serialized(text.clone())),
            other => Err(LinksError::NotAMapping(json_kind(other))),
        }
    }

    pub fn resolve(&self) -> Result<LinkSet, LinksError> {
        match self {
            RawLinks::Structured(map) => Ok(LinkSet(map.clone())),
            RawLinks::Serialized(text) => {
                // Single quotes are swapped wholesale, so an apostrophe inside
                // a value makes the text unparsable.
                let normalized = text.replace('\'', "\"");
                match serde_json::from_str::<Value>(&normalized)? {
                    Value::Object(map) => Ok(LinkSet(map)),
                    other => Err(LinksError::NotAMapping(json_kind(&other))),
                }
            }
        }
    }
}

/// Link relations (`self`, `images`, `thumbnail`, ...) resolved to a mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSet(Map<String, Value>);

impl LinkSet {
    pub fn href(&self, relation: &str) -> Result<&str, LinksError> {
        let target = self
            .0
            .get(relation)
            .ok_or_else(|| LinksError::MissingRelation(relation.to_string()))?;
        target
            .get("href")
            .and_then(Value::as_str)
            .ok_or_else(|| LinksError::MissingHref(relation.to_string()))
    }

    pub fn image(&self) -> Result<&str, LinksError> {
        self.href(IMAGES_RELATION)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_links_resolve_image() {
        let raw = RawLinks::from_value(&json!({
            "self": {"href": "http://x/self"},
            "images": {"href": "http://x/img1"},
            "thumbnail": {"href": "http://x/thumb"}
        }))
        .unwrap();
        let links = raw.resolve().unwrap();
        assert_eq!(links.image().unwrap(), "http://x/img1");
        assert_eq!(links.href("thumbnail").unwrap(), "http://x/thumb");
    }

    #[test]
    fn single_quoted_text_resolves_image() {
        let raw = RawLinks::from_value(&json!("{'images': {'href': 'http://x/img2'}}")).unwrap();
        assert_eq!(raw.resolve().unwrap().image().unwrap(), "http://x/img2");
    }

    #[test]
    fn both_shapes_resolve_to_same_link_set() {
        let structured = RawLinks::from_value(&json!({"images": {"href": "http://x/a"}})).unwrap();
        let text = RawLinks::Serialized("{'images': {'href': 'http://x/a'}}".into());
        assert_eq!(structured.resolve().unwrap(), text.resolve().unwrap());
    }

    #[test]
    fn garbage_text_is_unparsable() {
        let raw = RawLinks::Serialized("{'images': ".into());
        assert!(matches!(raw.resolve(), Err(LinksError::Unparsable(_))));
    }

    #[test]
    fn apostrophe_in_value_breaks_parsing() {
        let raw = RawLinks::Serialized("{'images': {'href': 'http://x/o'neil'}}".into());
        assert!(matches!(raw.resolve(), Err(LinksError::Unparsable(_))));
    }

    #[test]
    fn text_that_is_not_a_mapping_is_rejected() {
        let raw = RawLinks::Serialized("['images']".into());
        assert!(matches!(raw.resolve(), Err(LinksError::NotAMapping("an array"))));
    }

    #[test]
    fn non_mapping_value_is_rejected() {
        assert!(matches!(
            RawLinks::from_value(&json!(42)),
            Err(LinksError::NotAMapping("a number"))
        ));
    }

    #[test]
    fn missing_images_and_href_are_reported() {
        let links = RawLinks::from_value(&json!({
            "self": {"href": "http://x/self"},
            "thumbnail": {"url": "http://x/thumb"}
        }))
        .unwrap()
        .resolve()
        .unwrap();

        assert!(matches!(links.image(), Err(LinksError::MissingRelation(r)) if r == "images"));
        assert!(matches!(links.href("thumbnail"), Err(LinksError::MissingHref(r)) if r == "thumbnail"));
    }
}
