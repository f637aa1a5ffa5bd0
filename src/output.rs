use crate::model::NormalizedRecord;
use anyhow::{Result, anyhow};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// One collection entry: output key and record.
pub type Entry = (usize, NormalizedRecord);

const COLUMNS: [&str; 7] = [
    "key",
    "name",
    "lastname",
    "nationalities",
    "entity_id",
    "date_of_birth",
    "image",
];

pub enum Writer {
    Json(Box<dyn Write + Send>, bool), // bool tracks if the opening brace is still pending
    JsonLines(Box<dyn Write + Send>),
    Csv(Box<dyn Write + Send>, bool), // bool tracks if we've written headers
    Tsv(Box<dyn Write + Send>, bool),
}

impl Writer {
    pub fn write_batch(&mut self, entries: &[Entry]) -> Result<()> {
        match self {
            Writer::Json(writer, is_first) => {
                for (key, record) in entries {
                    if *is_first {
                        write!(writer, "{{")?;
                        *is_first = false;
                    } else {
                        write!(writer, ",")?;
                    }
                    let serialized = serde_json::to_string_pretty(record)?;
                    write!(writer, "\n\"{}\": {}", key, serialized)?;
                }
            }
            Writer::JsonLines(writer) => {
                for (key, record) in entries {
                    let line = serde_json::json!({ "key": key, "record": record });
                    writeln!(writer, "{}", serde_json::to_string(&line)?)?;
                }
            }
            Writer::Csv(writer, headers_written) => {
                if !*headers_written {
                    writeln!(writer, "{}", COLUMNS.join(","))?;
                    *headers_written = true;
                }
                for entry in entries {
                    let row: Vec<String> = row(entry).iter().map(|f| escape_csv_field(f)).collect();
                    writeln!(writer, "{}", row.join(","))?;
                }
            }
            Writer::Tsv(writer, headers_written) => {
                if !*headers_written {
                    writeln!(writer, "{}", COLUMNS.join("\t"))?;
                    *headers_written = true;
                }
                for entry in entries {
                    let row: Vec<String> = row(entry).iter().map(|f| escape_tsv_field(f)).collect();
                    writeln!(writer, "{}", row.join("\t"))?;
                }
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Result<()> {
        match self {
            Writer::Json(mut writer, is_first) => {
                if is_first {
                    writeln!(writer, "{{}}")?;
                } else {
                    writeln!(writer, "\n}}")?;
                }
                writer.flush()?;
            }
            // an empty collection still gets its header row
            Writer::Csv(mut writer, headers_written) => {
                if !headers_written {
                    writeln!(writer, "{}", COLUMNS.join(","))?;
                }
                writer.flush()?;
            }
            Writer::Tsv(mut writer, headers_written) => {
                if !headers_written {
                    writeln!(writer, "{}", COLUMNS.join("\t"))?;
                }
                writer.flush()?;
            }
            Writer::JsonLines(mut writer) => {
                writer.flush()?;
            }
        }
        Ok(())
    }
}

fn row((key, record): &Entry) -> [String; 7] {
    [
        key.to_string(),
        record.name.clone(),
        record.lastname.clone(),
        record.nationalities.join(";"),
        record.entity_id.clone(),
        record.date_of_birth.clone(),
        record.image.clone(),
    ]
}

pub fn create_writer(output_arg: &str) -> Result<Writer> {
    match output_arg {
        "stdout" | "json" => Ok(Writer::Json(Box::new(io::stdout()), true)),
        path if path.ends_with(".json") => Ok(Writer::Json(open(path)?, true)),
        path if path.ends_with(".jsonl") || path.ends_with(".ndjson") => {
            Ok(Writer::JsonLines(open(path)?))
        }
        path if path.ends_with(".csv") => Ok(Writer::Csv(open(path)?, false)),
        path if path.ends_with(".tsv") => Ok(Writer::Tsv(open(path)?, false)),
        path => {
            // Default to JSON file if it looks like a path
            if path.contains('/') || path.contains('\\') || path.contains('.') {
                Ok(Writer::Json(open(path)?, true))
            } else {
                Err(anyhow!(
                    "Unknown output format: {}. Use 'stdout', 'json', or a file path",
                    output_arg
                ))
            }
        }
    }
}

fn open(path: &str) -> Result<Box<dyn Write + Send>> {
    create_parent_dirs(path)?;
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

fn create_parent_dirs(file_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(file_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn escape_tsv_field(field: &str) -> String {
    field
        .replace('\t', " ")
        .replace('\n', " ")
        .replace('\r', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(entity_id: &str, name: &str) -> NormalizedRecord {
        NormalizedRecord {
            name: name.into(),
            lastname: "RABIE".into(),
            nationalities: vec!["DZ".into(), "FR".into()],
            entity_id: entity_id.into(),
            date_of_birth: "1986/02/10".into(),
            image: "http://x/img1".into(),
        }
    }

    fn write_to(output: &Path, batches: &[Vec<Entry>]) -> String {
        let mut writer = create_writer(output.to_str().unwrap()).unwrap();
        for batch in batches {
            writer.write_batch(batch).unwrap();
        }
        writer.finish().unwrap();
        std::fs::read_to_string(output).unwrap()
    }

    #[test]
    fn json_file_round_trips_across_batches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/records.json");
        let text = write_to(
            &path,
            &[vec![(0, record("2023/1", "A"))], vec![(2, record("2023/2", "B"))]],
        );

        let parsed: BTreeMap<usize, NormalizedRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(parsed[&2].name, "B");
    }

    #[test]
    fn empty_json_file_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let text = write_to(&dir.path().join("empty.json"), &[]);
        assert_eq!(text.trim(), "{}");
    }

    #[test]
    fn jsonl_carries_key() {
        let dir = tempfile::tempdir().unwrap();
        let text = write_to(&dir.path().join("r.jsonl"), &[vec![(7, record("2023/1", "A"))]]);
        let line: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(line["key"], 7);
        assert_eq!(line["record"]["entity_id"], "2023/1");
    }

    #[test]
    fn csv_escapes_and_joins_nationalities() {
        let dir = tempfile::tempdir().unwrap();
        let text = write_to(&dir.path().join("r.csv"), &[vec![(0, record("2023/1", "O,\"X\""))]]);
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "key,name,lastname,nationalities,entity_id,date_of_birth,image"
        );
        assert_eq!(
            lines.next().unwrap(),
            "0,\"O,\"\"X\"\"\",RABIE,DZ;FR,2023/1,1986/02/10,http://x/img1"
        );
    }

    #[test]
    fn empty_tsv_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let text = write_to(&dir.path().join("r.tsv"), &[]);
        assert!(text.starts_with("key\tname\t"));
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(create_writer("yaml").is_err());
    }
}
