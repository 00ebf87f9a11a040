use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::models::listing::{ListingEvent, DISPLAY_COLUMNS, KEY_COLUMN};
use crate::services::database::quote_identifier;
use crate::services::{DatabaseError, DatabaseService};

const LISTINGS_TABLE: &str = "listings";

#[derive(Debug)]
pub enum DatasetError {
    FsError(String),
    ParseError(String),
    DatabaseError(String),
    MissingColumns(Vec<String>),
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::FsError(msg) => write!(f, "File system error: {}", msg),
            DatasetError::ParseError(msg) => write!(f, "CSV parse error: {}", msg),
            DatasetError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            DatasetError::MissingColumns(columns) => write!(f, "Missing columns in CSV: {}", columns.join(", ")),
        }
    }
}

impl std::error::Error for DatasetError {}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        DatasetError::FsError(err.to_string())
    }
}

impl From<csv::Error> for DatasetError {
    fn from(err: csv::Error) -> Self {
        DatasetError::ParseError(err.to_string())
    }
}

impl From<DatabaseError> for DatasetError {
    fn from(err: DatabaseError) -> Self {
        DatasetError::DatabaseError(err.to_string())
    }
}

/// Read-only listing dataset, loaded once per session.
#[derive(Clone)]
pub struct DatasetService {
    pub db: DatabaseService,
    columns: Vec<String>,
}

impl DatasetService {
    pub fn from_csv_path(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path)
            .map_err(|e| DatasetError::FsError(format!("Failed to open {}: {}", path.display(), e)))?;
        let dataset = Self::from_reader(file)?;

        tracing::info!(path = %path.display(), rows = dataset.row_count()?, "dataset loaded");

        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, header)| if i == 0 { header.trim_start_matches('\u{feff}') } else { header })
            .map(|header| header.to_string())
            .collect();

        let Some(key_index) = columns.iter().position(|c| c == KEY_COLUMN) else {
            return Err(DatasetError::MissingColumns(vec![KEY_COLUMN.to_string()]));
        };

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let row = (0..columns.len())
                .map(|i| {
                    // key cells are matched against trimmed ids
                    let cell = record.get(i).map(|cell| if i == key_index { cell.trim() } else { cell });
                    cell.filter(|cell| !cell.is_empty()).map(|cell| cell.to_string())
                })
                .collect::<Vec<_>>();
            rows.push(row);
        }

        let db = DatabaseService::in_memory()?;
        db.create_text_table(LISTINGS_TABLE, &columns)?;
        db.insert_rows(LISTINGS_TABLE, &columns, &rows)?;

        tracing::debug!(columns = columns.len(), rows = rows.len(), "dataset imported");

        Ok(Self { db, columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> Result<i64, DatasetError> {
        Ok(self.db.count_rows(LISTINGS_TABLE)?)
    }

    /// Names from `required` the dataset does not have, in the order given.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.columns.iter().any(|c| c == *name))
            .map(|name| name.to_string())
            .collect()
    }

    pub fn check_display_columns(&self) -> Result<(), DatasetError> {
        let missing = self.missing_columns(&DISPLAY_COLUMNS);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DatasetError::MissingColumns(missing))
        }
    }

    /// Every row whose key equals `listing_id` exactly, in file order.
    pub fn find_by_listing_id(&self, listing_id: &str) -> Result<Vec<ListingEvent>, DatasetError> {
        let select_list = self
            .columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 ORDER BY rowid",
            select_list,
            LISTINGS_TABLE,
            quote_identifier(KEY_COLUMN)
        );

        let column_count = self.columns.len();
        let records = self.db.query(&sql, [listing_id], |row| {
            let mut record = HashMap::with_capacity(column_count);
            for (i, column) in self.columns.iter().enumerate() {
                record.insert(column.clone(), row.get::<_, Option<String>>(i)?);
            }
            Ok(record)
        })?;

        Ok(records.iter().map(ListingEvent::from_record).collect())
    }
}
