use crate::domain::model::{FileType, Record, RowPolicy};
use crate::utils::error::{CadetError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// A record plus the progress units its read consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub record: Record,
    pub units: u64,
}

/// Lazy record stream over one input, selected by the declared file type.
pub enum RecordSource<R: Read> {
    Delimited(DelimitedRecords<R>),
    Structured(StructuredRecords),
}

impl RecordSource<File> {
    /// Opens `path`; a missing or unreadable file is reported with its path.
    pub fn from_path(path: &Path, file_type: FileType, row_policy: RowPolicy) -> Result<Self> {
        let not_found = |source: std::io::Error| CadetError::NotFoundError {
            path: path.display().to_string(),
            source,
        };
        let file = File::open(path).map_err(not_found)?;
        let byte_len = file.metadata().map_err(not_found)?.len();
        Self::open(file, file_type, byte_len, row_policy)
    }
}

impl<R: Read> RecordSource<R> {
    /// `byte_len` scales progress for delimited input; JSON counts elements instead.
    pub fn open(reader: R, file_type: FileType, byte_len: u64, row_policy: RowPolicy) -> Result<Self> {
        match file_type.delimiter() {
            Some(delimiter) => Ok(RecordSource::Delimited(DelimitedRecords::new(
                reader, delimiter, byte_len, row_policy,
            )?)),
            None => Ok(RecordSource::Structured(StructuredRecords::new(reader)?)),
        }
    }

    /// Total progress units for this source.
    pub fn total(&self) -> u64 {
        match self {
            RecordSource::Delimited(records) => records.byte_len,
            RecordSource::Structured(records) => records.total,
        }
    }
}

impl<R: Read> Iterator for RecordSource<R> {
    type Item = Result<SourceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            RecordSource::Delimited(records) => records.next(),
            RecordSource::Structured(records) => records.next(),
        }
    }
}

pub struct DelimitedRecords<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    row: csv::StringRecord,
    consumed: u64,
    byte_len: u64,
    row_policy: RowPolicy,
}

impl<R: Read> DelimitedRecords<R> {
    fn new(reader: R, delimiter: u8, byte_len: u64, row_policy: RowPolicy) -> Result<Self> {
        // Width checks are ours, so the reader itself must accept ragged rows.
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut header_row = csv::StringRecord::new();
        let headers = if reader.read_record(&mut header_row)? {
            header_row.iter().map(str::to_string).collect()
        } else {
            Vec::new()
        };
        tracing::debug!("Header columns: {:?}", headers);

        Ok(Self {
            reader,
            headers,
            row: csv::StringRecord::new(),
            consumed: 0,
            byte_len,
            row_policy,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn build_record(&self) -> Result<Record> {
        if self.row_policy == RowPolicy::Strict && self.row.len() != self.headers.len() {
            let line = self.row.position().map(|p| p.line()).unwrap_or_default();
            return Err(CadetError::parse(format!(
                "line {}: expected {} columns to match the header, found {}",
                line,
                self.headers.len(),
                self.row.len()
            )));
        }

        let data: HashMap<String, serde_json::Value> = self
            .headers
            .iter()
            .zip(self.row.iter())
            .map(|(name, value)| (name.clone(), serde_json::Value::String(value.to_string())))
            .collect();
        Ok(Record::new(data))
    }
}

impl<R: Read> Iterator for DelimitedRecords<R> {
    type Item = Result<SourceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.row) {
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
            Ok(true) => {
                // The first row's units also cover the header line.
                let offset = self.reader.position().byte();
                let units = offset.saturating_sub(self.consumed);
                self.consumed = offset;
                Some(self.build_record().map(|record| SourceRecord { record, units }))
            }
        }
    }
}

/// A JSON array parsed up front; iteration cannot fail once opened.
pub struct StructuredRecords {
    items: std::vec::IntoIter<Record>,
    total: u64,
}

impl StructuredRecords {
    fn new<R: Read>(reader: R) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_reader(BufReader::new(reader))?;

        let items = match value {
            serde_json::Value::Array(items) => items,
            other => {
                return Err(CadetError::parse(format!(
                    "expected a top-level array of objects, found {}",
                    json_type_name(&other)
                )))
            }
        };

        let records = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                serde_json::Value::Object(obj) => Ok(Record::from(obj)),
                other => Err(CadetError::parse(format!(
                    "array element {} is {}, expected an object",
                    index,
                    json_type_name(&other)
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            total: records.len() as u64,
            items: records.into_iter(),
        })
    }
}

impl Iterator for StructuredRecords {
    type Item = Result<SourceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.items
            .next()
            .map(|record| Ok(SourceRecord { record, units: 1 }))
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorKind;
    use serde_json::json;

    fn open(input: &str, file_type: FileType, policy: RowPolicy) -> Result<RecordSource<&[u8]>> {
        RecordSource::open(input.as_bytes(), file_type, input.len() as u64, policy)
    }

    fn collect(source: RecordSource<&[u8]>) -> Vec<Record> {
        source.map(|item| item.unwrap().record).collect()
    }

    #[test]
    fn test_csv_rows_zip_against_header() {
        let source = open("a,b\n1,2\n3,4\n", FileType::Csv, RowPolicy::Strict).unwrap();
        assert_eq!(source.total(), 12);
        match &source {
            RecordSource::Delimited(rows) => assert_eq!(rows.headers(), ["a", "b"]),
            RecordSource::Structured(_) => panic!("csv should open as delimited"),
        }

        let records = collect(source);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("a"), Some(&json!("1")));
        assert_eq!(records[0].get("b"), Some(&json!("2")));
        assert_eq!(records[1].get("a"), Some(&json!("3")));
    }

    #[test]
    fn test_tsv_uses_tab_delimiter() {
        let source = open("name\tcity\nAda\tLondon, UK\n", FileType::Tsv, RowPolicy::Strict).unwrap();
        let records = collect(source);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("city"), Some(&json!("London, UK")));
    }

    #[test]
    fn test_header_only_yields_nothing() {
        let source = open("a,b\n", FileType::Csv, RowPolicy::Strict).unwrap();
        assert_eq!(collect(source).len(), 0);

        let empty = open("", FileType::Csv, RowPolicy::Strict).unwrap();
        assert_eq!(collect(empty).len(), 0);
    }

    #[test]
    fn test_delimited_units_sum_to_byte_length() {
        let input = "a,b\n1,2\n3,4\n";
        let source = open(input, FileType::Csv, RowPolicy::Strict).unwrap();
        let units: u64 = source.map(|item| item.unwrap().units).sum();
        assert_eq!(units, input.len() as u64);
    }

    #[test]
    fn test_strict_policy_rejects_ragged_row() {
        let mut source = open("a,b,c\n1,2\n", FileType::Csv, RowPolicy::Strict).unwrap();
        let err = source.next().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_lenient_policy_zips_by_index() {
        let source = open("a,b,c\n1,2\n4,5,6,7\n", FileType::Csv, RowPolicy::Lenient).unwrap();
        let records = collect(source);

        assert_eq!(records[0].len(), 2);
        assert!(records[0].get("c").is_none());
        assert_eq!(records[1].len(), 3);
        assert_eq!(records[1].get("c"), Some(&json!("6")));
    }

    #[test]
    fn test_json_array_of_objects() {
        let source = open(r#"[{"a":1},{"b":[true,null]}]"#, FileType::Json, RowPolicy::Strict).unwrap();
        assert_eq!(source.total(), 2);

        let items: Vec<SourceRecord> = source.map(|item| item.unwrap()).collect();
        assert_eq!(items[0].record.get("a"), Some(&json!(1)));
        assert_eq!(items[1].record.get("b"), Some(&json!([true, null])));
        assert!(items.iter().all(|item| item.units == 1));
    }

    #[test]
    fn test_json_must_be_array_of_objects() {
        let err = open(r#"{"a":1}"#, FileType::Json, RowPolicy::Strict).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = open(r#"[{"a":1}, 2]"#, FileType::Json, RowPolicy::Strict).err().unwrap();
        assert!(err.to_string().contains("element 1"));

        let err = open("[{\"a\":", FileType::Json, RowPolicy::Strict).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_from_path_missing_file_names_path() {
        let err = RecordSource::from_path(
            Path::new("does/not/exist.csv"),
            FileType::Csv,
            RowPolicy::Strict,
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("does/not/exist.csv"));
    }
}
