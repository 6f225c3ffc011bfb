//! Reference drug catalog.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column holding canonical names in catalog spreadsheets exported to CSV.
pub const DEFAULT_NAME_COLUMN: &str = "Name";

/// Catalog loading errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Catalog source contains no drug names")]
    Empty,
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// A single canonical drug name with the forms the matcher compares against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    /// Canonical name as supplied by the catalog source
    pub name: String,
    /// Lower-cased name for substring checks
    pub folded: String,
    /// Lower-cased tokens sorted and joined by single spaces
    pub sorted_tokens: String,
}

impl CatalogEntry {
    /// Create an entry, precomputing its comparison forms.
    pub fn new(name: String) -> Self {
        let folded = name.to_lowercase();
        let sorted_tokens = sort_tokens(&folded);
        Self {
            name,
            folded,
            sorted_tokens,
        }
    }
}

/// Split on whitespace, sort, and rejoin with single spaces.
pub fn sort_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Ordered, immutable list of canonical drug names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DrugCatalog {
    entries: Vec<CatalogEntry>,
}

impl DrugCatalog {
    /// Build a catalog from canonical names, keeping their order.
    ///
    /// Names are trimmed and blank names are dropped.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = names
            .into_iter()
            .map(Into::into)
            .filter_map(|name| {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(CatalogEntry::new(trimmed.to_string()))
                }
            })
            .collect();
        Self { entries }
    }

    /// Read one name per line.
    pub fn from_lines_reader<R: Read>(reader: R) -> CatalogResult<Self> {
        let mut names = Vec::new();
        for line in BufReader::new(reader).lines() {
            names.push(line?);
        }
        Self::non_empty(Self::new(names))
    }

    /// Read names from the given column of a CSV source with a header row.
    pub fn from_csv_reader<R: Read>(reader: R, column: &str) -> CatalogResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let index = csv_reader
            .headers()?
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| CatalogError::MissingColumn(column.to_string()))?;

        let mut names = Vec::new();
        for row in csv_reader.records() {
            let row = row?;
            if let Some(value) = row.get(index) {
                names.push(value.to_string());
            }
        }
        Self::non_empty(Self::new(names))
    }

    /// Parse a JSON array of names.
    pub fn from_json_str(json: &str) -> CatalogResult<Self> {
        let names: Vec<String> = serde_json::from_str(json)?;
        Self::non_empty(Self::new(names))
    }

    /// Load a newline-delimited catalog file.
    pub fn load_lines<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        Self::from_lines_reader(File::open(path)?)
    }

    /// Load a CSV catalog file.
    pub fn load_csv<P: AsRef<Path>>(path: P, column: &str) -> CatalogResult<Self> {
        Self::from_csv_reader(File::open(path)?, column)
    }

    /// Load a JSON catalog file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    fn non_empty(catalog: Self) -> CatalogResult<Self> {
        if catalog.is_empty() {
            Err(CatalogError::Empty)
        } else {
            Ok(catalog)
        }
    }

    /// All entries in catalog order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Canonical names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_forms() {
        let entry = CatalogEntry::new("Paracetamol 500mg Tablets".into());
        assert_eq!(entry.folded, "paracetamol 500mg tablets");
        assert_eq!(entry.sorted_tokens, "500mg paracetamol tablets");
    }

    #[test]
    fn test_new_trims_and_skips_blank() {
        let catalog = DrugCatalog::new(vec!["  Ibuprofen 400mg ", "", "   ", "Amoxil"]);
        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["Ibuprofen 400mg", "Amoxil"]);
    }

    #[test]
    fn test_lines_reader() {
        let source = "Paracetamol 500mg\n\nAmoxicillin 250mg\n";
        let catalog = DrugCatalog::from_lines_reader(source.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_csv_reader_named_column() {
        let source = "Id,Name,Price\n1,Panadol Extra,20\n2,Brufen 400,35\n";
        let catalog = DrugCatalog::from_csv_reader(source.as_bytes(), DEFAULT_NAME_COLUMN).unwrap();
        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["Panadol Extra", "Brufen 400"]);
    }

    #[test]
    fn test_csv_missing_column() {
        let source = "Id,Title\n1,Panadol\n";
        let result = DrugCatalog::from_csv_reader(source.as_bytes(), "Name");
        assert!(matches!(result, Err(CatalogError::MissingColumn(c)) if c == "Name"));
    }

    #[test]
    fn test_json_source() {
        let catalog = DrugCatalog::from_json_str(r#"["Augmentin 1g", "كونكور 5"]"#).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[1].name, "كونكور 5");
    }

    #[test]
    fn test_empty_source_is_error() {
        assert!(matches!(
            DrugCatalog::from_lines_reader("\n \n".as_bytes()),
            Err(CatalogError::Empty)
        ));
        assert!(matches!(
            DrugCatalog::from_json_str("not json"),
            Err(CatalogError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = DrugCatalog::load_lines("/definitely/not/here/catalog.txt");
        assert!(matches!(result, Err(CatalogError::Io(_))));
    }
}
