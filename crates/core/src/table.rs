use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, WriterBuilder};
use indexmap::IndexMap;
use tempfile::NamedTempFile;

use crate::error::{QrError, Result};

/// Field separator of a participant table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Delimiter::Comma => "comma",
            Delimiter::Tab => "tab",
        }
    }

    /// Picks the delimiter from the first non-empty line: tab when it holds
    /// more unquoted tabs than unquoted commas, comma otherwise.
    pub fn sniff(contents: &str) -> Self {
        let header = contents
            .lines()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("");
        let mut in_quotes = false;
        let (mut tabs, mut commas) = (0usize, 0usize);
        for ch in header.chars() {
            match ch {
                '"' => in_quotes = !in_quotes,
                '\t' if !in_quotes => tabs += 1,
                ',' if !in_quotes => commas += 1,
                _ => {}
            }
        }
        if tabs > commas {
            Delimiter::Tab
        } else {
            Delimiter::Comma
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the delimiter of an input file is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelimiterMode {
    #[default]
    Auto,
    Fixed(Delimiter),
}

impl DelimiterMode {
    pub fn resolve(self, contents: &str) -> Delimiter {
        match self {
            DelimiterMode::Auto => Delimiter::sniff(contents),
            DelimiterMode::Fixed(delimiter) => delimiter,
        }
    }
}

impl FromStr for DelimiterMode {
    type Err = QrError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "auto" => Ok(DelimiterMode::Auto),
            "comma" | "," | "csv" => Ok(DelimiterMode::Fixed(Delimiter::Comma)),
            "tab" | "\\t" | "tsv" => Ok(DelimiterMode::Fixed(Delimiter::Tab)),
            other => Err(QrError::InvalidOption {
                name: "delimiter",
                value: other.to_string(),
            }),
        }
    }
}

pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One data line of the table keyed by normalized column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRow {
    /// Source line number, counting the header as line 1.
    pub line: usize,
    pub fields: IndexMap<String, String>,
}

impl ParticipantRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// A delimited table as read from disk: raw header text plus raw cells, so
/// that it can be written back without reshaping.
#[derive(Debug, Clone)]
pub struct Table {
    delimiter: Delimiter,
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl Table {
    pub fn load(path: &Path, mode: DelimiterMode) -> Result<Self> {
        if !path.exists() {
            return Err(QrError::InputNotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        let table = Self::parse(&raw, mode)?;
        tracing::debug!(
            path = %path.display(),
            delimiter = %table.delimiter,
            rows = table.records.len(),
            "loaded participant table"
        );
        Ok(table)
    }

    pub fn parse(raw: &str, mode: DelimiterMode) -> Result<Self> {
        let contents = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let delimiter = mode.resolve(contents);
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter.as_byte())
            .flexible(true)
            .from_reader(contents.as_bytes());
        let headers = reader
            .headers()?
            .iter()
            .map(|cell| cell.to_string())
            .collect::<Vec<_>>();
        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            records.push(record.iter().map(|cell| cell.to_string()).collect());
        }
        Ok(Self {
            delimiter,
            headers,
            records,
        })
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> Vec<String> {
        self.headers.iter().map(|h| normalize_column(h)).collect()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        let wanted = normalize_column(column);
        self.headers
            .iter()
            .position(|header| normalize_column(header) == wanted)
    }

    /// Fails with every required column that is absent, in the order given.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let columns = self.columns();
        let missing = required
            .iter()
            .filter(|column| !columns.iter().any(|c| c == *column))
            .map(|column| column.to_string())
            .collect::<Vec<_>>();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(QrError::MissingColumns(missing))
        }
    }

    pub fn rows(&self) -> Vec<ParticipantRow> {
        let columns = self.columns();
        self.records
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                let mut fields = IndexMap::with_capacity(columns.len());
                for (pos, column) in columns.iter().enumerate() {
                    if fields.contains_key(column) {
                        continue;
                    }
                    let value = record.get(pos).map(|cell| cell.trim()).unwrap_or("");
                    fields.insert(column.clone(), value.to_string());
                }
                ParticipantRow {
                    line: idx + 2,
                    fields,
                }
            })
            .collect()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.records
            .get(row)
            .and_then(|record| record.get(column))
            .map(String::as_str)
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: String) {
        let width = self.headers.len();
        if let Some(record) = self.records.get_mut(row) {
            if record.len() < width {
                record.resize(width, String::new());
            }
            if let Some(cell) = record.get_mut(column) {
                *cell = value;
            }
        }
    }

    /// Replaces `path` with this table: header first, rows in order, same
    /// delimiter. The content goes to a sibling temp file, synced and given
    /// the target's permissions, which is then renamed over the target.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = WriterBuilder::new()
                .delimiter(self.delimiter.as_byte())
                .flexible(true)
                .from_writer(tmp.as_file_mut());
            writer.write_record(&self.headers)?;
            for record in &self.records {
                let mut padded = record.clone();
                if padded.len() < self.headers.len() {
                    padded.resize(self.headers.len(), String::new());
                }
                writer.write_record(&padded)?;
            }
            writer.flush()?;
        }
        tmp.as_file_mut().flush()?;
        if let Ok(meta) = fs::metadata(path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|err| QrError::Io(err.error))?;
        Ok(())
    }
}
