//! Per image calibration tables exported by photogrammetry tools.
//!
//! Tables are delimited text with a header row after `offset` preamble rows.
//! Records are keyed by their first column.

use crate::georef::{GeoPoint, RotationMatrix};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::*;

pub type TableResult<T> = Result<T, TableError>;

#[derive(Debug)]
pub enum TableError {
    UnsupportedExtension(String),
    ReadError(io::Error),
    CsvError(csv::Error),
    MissingHeader(usize),
    MissingColumn { id: String, column: String },
    BadValue { id: String, column: String, value: String },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for TableError {}

impl From<io::Error> for TableError {
    fn from(e: io::Error) -> Self {
        TableError::ReadError(e)
    }
}

impl From<csv::Error> for TableError {
    fn from(e: csv::Error) -> Self {
        TableError::CsvError(e)
    }
}

/// Entries in file order with lookup by id. Later duplicates replace earlier ones.
#[derive(Debug, Clone)]
pub struct Lookup<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> Default for Lookup<T> {
    fn default() -> Self {
        Self {
            entries: vec![],
            index: HashMap::new(),
        }
    }
}

impl<T> Lookup<T> {
    pub fn insert(&mut self, id: String, value: T) {
        match self.index.get(&id) {
            Some(i) => self.entries[*i].1 = value,
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, value));
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|i| &self.entries[*i].1)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(id, value)| (id.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    fields: HashMap<String, String>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Case insensitive column lookup
    pub fn get_ignore_case(&self, column: &str) -> Option<&str> {
        self.get(column).or_else(|| {
            self.fields
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(column))
                .map(|(_, value)| value.as_str())
        })
    }

    pub fn get_f64(&self, column: &str) -> TableResult<f64> {
        let value = self
            .get_ignore_case(column)
            .ok_or_else(|| TableError::MissingColumn {
                id: self.id.clone(),
                column: column.to_string(),
            })?;
        value.trim().parse().map_err(|_| TableError::BadValue {
            id: self.id.clone(),
            column: column.to_string(),
            value: value.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    records: Lookup<Record>,
}

impl Table {
    /// `.csv` is comma separated, `.txt` tab separated
    pub fn from_path<P: AsRef<Path>>(path: P, offset: usize) -> TableResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let delimiter = match extension.as_str() {
            "csv" => b',',
            "txt" => b'\t',
            _ => return Err(TableError::UnsupportedExtension(extension)),
        };
        let table = Self::from_reader(File::open(path)?, delimiter, offset)?;
        debug!("Parsed {} records from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8, offset: usize) -> TableResult<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(b'|')
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut headers: Option<Vec<String>> = None;
        let mut records = Lookup::default();
        for (row, result) in reader.records().enumerate() {
            let row_values = result?;
            if row < offset {
                continue;
            }
            if headers.is_none() {
                headers = Some(row_values.iter().map(|h| h.trim().to_string()).collect());
                continue;
            }
            let Some(columns) = &headers else {
                continue;
            };
            let id = row_values.get(0).unwrap_or("").trim().to_string();
            if id.is_empty() {
                continue;
            }
            let fields = columns
                .iter()
                .cloned()
                .zip(row_values.iter().map(|v| v.trim().to_string()))
                .collect();
            records.insert(id.clone(), Record { id, fields });
        }

        let headers = headers.ok_or(TableError::MissingHeader(offset))?;
        Ok(Self { headers, records })
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub const COEFFICIENT_COLUMNS: [&str; 9] = [
    "r11", "r12", "r13", "r21", "r22", "r23", "r31", "r32", "r33",
];

/// Rotation matrices keyed by image id
#[derive(Debug, Clone, Default)]
pub struct RotationTable(pub Lookup<RotationMatrix>);

impl RotationTable {
    /// Exports carry one preamble row before the header
    pub const DEFAULT_OFFSET: usize = 1;

    pub fn from_path<P: AsRef<Path>>(path: P, offset: usize) -> TableResult<Self> {
        Self::from_table(&Table::from_path(path, offset)?)
    }

    /// Uses the `r11..r33` coefficients when present, otherwise omega/phi/kappa
    /// angles in degrees.
    pub fn from_table(table: &Table) -> TableResult<Self> {
        let mut rotations = Lookup::default();
        for record in table.iter() {
            let has_coefficients = COEFFICIENT_COLUMNS
                .iter()
                .all(|c| record.get_ignore_case(c).is_some());
            let rotation = if has_coefficients {
                let mut elements = [0.0; 9];
                for (element, column) in elements.iter_mut().zip(COEFFICIENT_COLUMNS) {
                    *element = record.get_f64(column)?;
                }
                RotationMatrix::from_elements(elements)
            } else {
                RotationMatrix::from_opk_degrees(
                    record.get_f64("omega")?,
                    record.get_f64("phi")?,
                    record.get_f64("kappa")?,
                )
            };
            rotations.insert(record.id.clone(), rotation);
        }
        Ok(Self(rotations))
    }

    pub fn get(&self, id: &str) -> Option<&RotationMatrix> {
        self.0.get(id)
    }
}

/// Image center positions keyed by image id, from `X` (longitude),
/// `Y` (latitude) and `Z` (altitude) columns
#[derive(Debug, Clone, Default)]
pub struct LocationTable(pub Lookup<GeoPoint>);

impl LocationTable {
    pub fn from_path<P: AsRef<Path>>(path: P, offset: usize) -> TableResult<Self> {
        Self::from_table(&Table::from_path(path, offset)?)
    }

    pub fn from_table(table: &Table) -> TableResult<Self> {
        let mut locations = Lookup::default();
        for record in table.iter() {
            let point = GeoPoint::new(
                record.get_f64("Y")?,
                record.get_f64("X")?,
                record.get_f64("Z")?,
            );
            locations.insert(record.id.clone(), point);
        }
        Ok(Self(locations))
    }

    pub fn get(&self, id: &str) -> Option<&GeoPoint> {
        self.0.get(id)
    }
}
