//! Per-title metadata joined from the anime dataset.
//!
//! The index is built once at startup and only read afterwards. Titles are
//! matched by exact string equality, first against the `title` column and then
//! against `title_english`. No case or punctuation folding is applied, so a
//! label spelled differently from the dataset gets no metadata.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use log::{error, info, warn};
use serde::Serialize;

/// Primary join column
pub const TITLE_COLUMN: &str = "title";
/// Secondary join column, tried when no row matches on `title`
pub const ENGLISH_TITLE_COLUMN: &str = "title_english";

/// The descriptive fields captured for each title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataField {
    Identifier,
    Synonyms,
    MediaType,
    Year,
    Source,
    Episodes,
    Status,
    Rating,
    Score,
    Studio,
    Genre,
}

impl MetadataField {
    pub const ALL: [MetadataField; 11] = [
        Self::Identifier,
        Self::Synonyms,
        Self::MediaType,
        Self::Year,
        Self::Source,
        Self::Episodes,
        Self::Status,
        Self::Rating,
        Self::Score,
        Self::Studio,
        Self::Genre,
    ];

    /// Dataset column holding this field
    pub fn column(self) -> &'static str {
        match self {
            Self::Identifier => "anime_id",
            Self::Synonyms => "title_synonyms",
            Self::MediaType => "type",
            Self::Year => "year",
            Self::Source => "source",
            Self::Episodes => "episodes",
            Self::Status => "status",
            Self::Rating => "rating",
            Self::Score => "score",
            Self::Studio => "studio",
            Self::Genre => "genre",
        }
    }

    /// Human-readable name for result pages
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Identifier => "Anime ID",
            Self::Synonyms => "Synonyms",
            Self::MediaType => "Type",
            Self::Year => "Year",
            Self::Source => "Source",
            Self::Episodes => "Episodes",
            Self::Status => "Status",
            Self::Rating => "Rating",
            Self::Score => "Score",
            Self::Studio => "Studio",
            Self::Genre => "Genre",
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Field values of one dataset row, kept exactly as they appear in the file.
///
/// An empty record means the title had no matching row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MetadataRecord {
    fields: BTreeMap<MetadataField, String>,
}

static EMPTY_RECORD: MetadataRecord = MetadataRecord {
    fields: BTreeMap::new(),
};

impl MetadataRecord {
    pub fn empty() -> &'static MetadataRecord {
        &EMPTY_RECORD
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: MetadataField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Fields in their fixed display order
    pub fn iter(&self) -> impl Iterator<Item = (MetadataField, &str)> {
        self.fields.iter().map(|(field, value)| (*field, value.as_str()))
    }

    fn from_row(row: &StringRecord, columns: &[(MetadataField, usize)]) -> Self {
        let fields = columns
            .iter()
            .filter_map(|&(field, index)| row.get(index).map(|value| (field, value.to_string())))
            .collect();
        Self { fields }
    }
}

impl FromIterator<(MetadataField, String)> for MetadataRecord {
    fn from_iter<I: IntoIterator<Item = (MetadataField, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Lookup from class label to its metadata record.
#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    records: HashMap<String, MetadataRecord>,
}

impl MetadataIndex {
    /// Builds the index for `known_labels` from a CSV dataset.
    ///
    /// Never fails: a missing or unreadable file yields an empty index, and
    /// labels without a matching row are logged and left without metadata.
    pub fn build<P: AsRef<Path>, S: AsRef<str>>(dataset_path: P, known_labels: &[S]) -> Self {
        let path = dataset_path.as_ref();
        if !path.exists() {
            warn!("Dataset not found at {:?}, serving predictions without metadata", path);
            return Self::default();
        }

        match ReaderBuilder::new().flexible(true).from_path(path) {
            Ok(reader) => {
                let index = Self::from_csv(reader, known_labels);
                info!(
                    "Loaded metadata for {} of {} titles from {:?}",
                    index.len(),
                    known_labels.len(),
                    path
                );
                index
            }
            Err(e) => {
                error!("Failed to open dataset {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Builds the index from CSV data held in any reader.
    pub fn from_reader<R: io::Read, S: AsRef<str>>(data: R, known_labels: &[S]) -> Self {
        Self::from_csv(ReaderBuilder::new().flexible(true).from_reader(data), known_labels)
    }

    fn from_csv<R: io::Read, S: AsRef<str>>(
        mut reader: csv::Reader<R>,
        known_labels: &[S],
    ) -> Self {
        let headers = match reader.headers() {
            Ok(headers) => headers.clone(),
            Err(e) => {
                error!("Failed to read dataset header: {}", e);
                return Self::default();
            }
        };

        let column = |name: &str| headers.iter().position(|header| header == name);
        let title_column = column(TITLE_COLUMN);
        let english_column = column(ENGLISH_TITLE_COLUMN);
        if title_column.is_none() && english_column.is_none() {
            warn!(
                "Dataset has neither a '{}' nor a '{}' column, no metadata available",
                TITLE_COLUMN, ENGLISH_TITLE_COLUMN
            );
        }

        let field_columns: Vec<(MetadataField, usize)> = MetadataField::ALL
            .iter()
            .filter_map(|&field| column(field.column()).map(|index| (field, index)))
            .collect();

        let mut rows = Vec::new();
        for (line, row) in reader.records().enumerate() {
            match row {
                Ok(row) => rows.push(row),
                Err(e) => warn!("Skipping malformed dataset row {}: {}", line + 2, e),
            }
        }

        let find_row = |column: Option<usize>, label: &str| {
            column.and_then(|index| rows.iter().find(|row| row.get(index) == Some(label)))
        };

        let mut records = HashMap::new();
        for label in known_labels {
            let label = label.as_ref();
            match find_row(title_column, label).or_else(|| find_row(english_column, label)) {
                Some(row) => {
                    let record = MetadataRecord::from_row(row, &field_columns);
                    records.insert(label.to_string(), record);
                }
                None => warn!("No metadata found for '{}'", label),
            }
        }

        Self { records }
    }

    /// Metadata for `label`, or an empty record when the dataset has none.
    pub fn lookup(&self, label: &str) -> &MetadataRecord {
        self.records.get(label).unwrap_or(MetadataRecord::empty())
    }

    /// Number of labels with metadata
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Labels that have metadata, in no particular order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}
