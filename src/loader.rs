//! Reads notices from disk into untyped JSON records.
//!
//! Accepted shapes: a JSON array of notices, a feed page envelope
//! (`{"_embedded": {"notices": [...]}}`), a single notice object, or JSON
//! Lines with one notice per line.

use anyhow::{Context, Result, anyhow};
use memchr::memchr_iter;
use memmap2::Mmap;
use serde_json::Value;
use std::fs::File;
use std::path::Path;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    JsonLines,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("ndjson") => Some(InputFormat::JsonLines),
            Some("json") => Some(InputFormat::Json),
            _ => None,
        }
    }
}

pub fn load_notices(path: &Path) -> Result<Vec<Value>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    if file.metadata()?.len() == 0 {
        return Ok(Vec::new());
    }

    // mmap the file
    let mmap = unsafe { Mmap::map(&file)? };
    parse_notices(&mmap, InputFormat::from_path(path))
        .with_context(|| format!("reading notices from {}", path.display()))
}

pub fn parse_notices(bytes: &[u8], format: Option<InputFormat>) -> Result<Vec<Value>> {
    let Some(&first) = bytes.iter().find(|b| !b.is_ascii_whitespace()) else {
        return Ok(Vec::new());
    };

    match (format, first) {
        (Some(InputFormat::JsonLines), _) => parse_lines(bytes),
        (_, b'[') => match serde_json::from_slice(bytes)? {
            Value::Array(items) => Ok(items),
            _ => Err(anyhow!("expected a JSON array")),
        },
        (Some(InputFormat::Json), _) => unwrap_document(serde_json::from_slice(bytes)?),
        // an object-led file is either one document or JSON Lines
        _ => match serde_json::from_slice::<Value>(bytes) {
            Ok(doc) => unwrap_document(doc),
            Err(_) => parse_lines(bytes),
        },
    }
}

/// Pulls notices out of a page envelope, or treats the document as one
/// notice.
fn unwrap_document(doc: Value) -> Result<Vec<Value>> {
    match doc {
        Value::Array(items) => Ok(items),
        Value::Object(mut page) => match page
            .get_mut("_embedded")
            .map(|e| e.get_mut("notices").map(Value::take).unwrap_or(Value::Null))
        {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Object(single)) => Ok(vec![Value::Object(single)]),
            Some(Value::Null) => Err(anyhow!("page envelope has no `notices`")),
            Some(_) => Err(anyhow!("`_embedded.notices` must be an array")),
            None => Ok(vec![Value::Object(page)]),
        },
        _ => Err(anyhow!("expected a JSON object or array")),
    }
}

fn split_lines(bytes: &[u8]) -> Vec<(usize, &[u8])> {
    let mut lines = Vec::new();
    let mut start = 0usize;
    for (lineno, nl) in memchr_iter(b'\n', bytes).enumerate() {
        lines.push((lineno + 1, &bytes[start..nl]));
        start = nl + 1;
    }
    if start < bytes.len() {
        lines.push((lines.len() + 1, &bytes[start..]));
    }
    lines.retain(|(_, line)| line.iter().any(|b| !b.is_ascii_whitespace()));
    lines
}

fn parse_line((lineno, line): &(usize, &[u8])) -> Result<Value> {
    serde_json::from_slice(line).with_context(|| format!("line {lineno}"))
}

#[cfg(feature = "parallel")]
fn parse_lines(bytes: &[u8]) -> Result<Vec<Value>> {
    split_lines(bytes).par_iter().map(parse_line).collect()
}

#[cfg(not(feature = "parallel"))]
fn parse_lines(bytes: &[u8]) -> Result<Vec<Value>> {
    split_lines(bytes).iter().map(parse_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const NOTICE: &str = r#"{"name":"RIFFI","forename":"RABIE","date_of_birth":"1986/02/10","entity_id":"2023/40891","nationalities":["DZ"],"_links":{"images":{"href":"http://x/img1"}}}"#;

    #[test]
    fn reads_array() {
        let input = format!("[{NOTICE},{NOTICE}]");
        assert_eq!(parse_notices(input.as_bytes(), None).unwrap().len(), 2);
    }

    #[test]
    fn reads_page_envelope() {
        let input = format!(
            r#"{{"total":2,"query":{{"page":1}},"_embedded":{{"notices":[{NOTICE},{NOTICE}]}},"_links":{{}}}}"#
        );
        let notices = parse_notices(input.as_bytes(), None).unwrap();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0]["entity_id"], "2023/40891");
    }

    #[test]
    fn reads_single_notice_document() {
        assert_eq!(parse_notices(NOTICE.as_bytes(), Some(InputFormat::Json)).unwrap().len(), 1);
    }

    #[test]
    fn reads_json_lines_with_blank_lines() {
        let input = format!("{NOTICE}\n\n{NOTICE}\n   \n{NOTICE}");
        assert_eq!(parse_notices(input.as_bytes(), None).unwrap().len(), 3);
    }

    #[test]
    fn json_lines_error_names_the_line() {
        let input = format!("{NOTICE}\n{{broken\n");
        let err = parse_notices(input.as_bytes(), Some(InputFormat::JsonLines)).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert!(parse_notices(b" \n\t", None).unwrap().is_empty());
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notices.jsonl");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{NOTICE}").unwrap();
        writeln!(file, "{NOTICE}").unwrap();
        drop(file);

        assert_eq!(load_notices(&path).unwrap().len(), 2);

        let empty = dir.path().join("empty.json");
        File::create(&empty).unwrap();
        assert!(load_notices(&empty).unwrap().is_empty());
    }
}
