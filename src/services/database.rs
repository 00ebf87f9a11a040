use rusqlite::{params_from_iter, Connection, Error as SqliteError, Row};
use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub enum DatabaseError {
    SqliteError(String),
    InvalidQuery(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::SqliteError(msg) => write!(f, "SQLite error: {}", msg),
            DatabaseError::InvalidQuery(msg) => write!(f, "Invalid query: {}", msg),
        }
    }
}

impl std::error::Error for DatabaseError {}

impl From<SqliteError> for DatabaseError {
    fn from(err: SqliteError) -> Self {
        DatabaseError::SqliteError(err.to_string())
    }
}

/// Session-scoped SQLite database. Nothing is written to disk.
#[derive(Clone)]
pub struct DatabaseService {
    pub conn: Arc<Mutex<Connection>>,
}

impl DatabaseService {
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch(
            "
            PRAGMA synchronous = OFF;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Creates `table` with one nullable TEXT column per name, in order.
    pub fn create_text_table(&self, table: &str, columns: &[String]) -> Result<(), DatabaseError> {
        self.validate_table_name(table)?;
        if columns.is_empty() {
            return Err(DatabaseError::InvalidQuery(format!("Table {} needs at least one column", table)));
        }

        let definitions = columns
            .iter()
            .map(|column| format!("{} TEXT", quote_identifier(column)))
            .collect::<Vec<_>>();

        let sql = format!(
            "CREATE TABLE {} (\n                {}\n            )",
            table,
            definitions.join(",\n                ")
        );

        let conn = self.lock()?;
        conn.execute(&sql, [])?;

        Ok(())
    }

    /// Inserts every row in a single transaction. Each row must hold one value per column.
    pub fn insert_rows(&self, table: &str, columns: &[String], rows: &[Vec<Option<String>>]) -> Result<usize, DatabaseError> {
        self.validate_table_name(table)?;

        let placeholders = (1..=columns.len()).map(|i| format!("?{}", i)).collect::<Vec<_>>();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.iter().map(|c| quote_identifier(c)).collect::<Vec<_>>().join(", "),
            placeholders.join(", ")
        );

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                if row.len() != columns.len() {
                    return Err(DatabaseError::InvalidQuery(format!(
                        "Expected {} values per row, got {}",
                        columns.len(),
                        row.len()
                    )));
                }
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }

        tx.commit()?;

        Ok(rows.len())
    }

    pub fn query<P, F, T>(&self, query: &str, params: P, mut mapper: F) -> Result<Vec<T>, DatabaseError>
    where
        P: rusqlite::Params,
        F: FnMut(&Row) -> Result<T, DatabaseError>,
    {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(query)
            .map_err(|e| DatabaseError::SqliteError(e.to_string()))?;

        let rows = stmt.query_map(params, |row| mapper(row).map_err(|_| SqliteError::InvalidQuery))?;

        let mut results = Vec::new();
        for row in rows {
            let value = row.map_err(|e| DatabaseError::SqliteError(e.to_string()))?;
            results.push(value);
        }

        Ok(results)
    }

    pub fn count_rows(&self, table: &str) -> Result<i64, DatabaseError> {
        self.validate_table_name(table)?;

        let conn = self.lock()?;
        let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;

        Ok(count)
    }

    fn validate_table_name(&self, table: &str) -> Result<(), DatabaseError> {
        if table.is_empty() || table.len() > 64 {
            return Err(DatabaseError::InvalidQuery(
                "Table name must be between 1-64 characters".to_string(),
            ));
        }

        if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(DatabaseError::InvalidQuery(format!(
                "Table name can only contain alphanumeric characters and underscores for {}",
                table
            )));
        }

        if table.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(DatabaseError::InvalidQuery(
                "Table name cannot start with a number".to_string(),
            ));
        }

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DatabaseError> {
        self.conn
            .lock()
            .map_err(|_| DatabaseError::SqliteError("Failed to acquire mutex lock".to_string()))
    }
}

/// Quotes a column name taken from a CSV header so it can be used verbatim in SQL.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    mod creation {
        use super::*;

        #[test]
        fn test_in_memory_database() {
            let db = DatabaseService::in_memory();
            assert!(db.is_ok(), "Failed to create in-memory database");
        }

        #[test]
        fn test_create_text_table() {
            let db = DatabaseService::in_memory().expect("Failed to create database");
            db.create_text_table("listings", &columns(&["listing_id", "event name", "odd\"col"]))
                .expect("Failed to create table");

            assert_eq!(db.count_rows("listings").expect("Failed to count"), 0);
        }

        #[test]
        fn test_create_text_table_rejects_empty_columns() {
            let db = DatabaseService::in_memory().expect("Failed to create database");
            assert!(db.create_text_table("listings", &[]).is_err());
        }

        #[test]
        fn test_create_text_table_rejects_duplicate_columns() {
            let db = DatabaseService::in_memory().expect("Failed to create database");
            let result = db.create_text_table("listings", &columns(&["a", "a"]));
            assert!(matches!(result, Err(DatabaseError::SqliteError(_))));
        }
    }

    mod execution {
        use super::*;

        #[test]
        fn test_insert_and_query_rows() {
            let db = DatabaseService::in_memory().expect("Failed to create database");
            let cols = columns(&["listing_id", "event name"]);
            db.create_text_table("listings", &cols).expect("Failed to create table");

            let inserted = db
                .insert_rows(
                    "listings",
                    &cols,
                    &[
                        vec![Some("1".to_string()), Some("Derby".to_string())],
                        vec![Some("2".to_string()), None],
                        vec![Some("1".to_string()), Some("Regatta".to_string())],
                    ],
                )
                .expect("Failed to insert rows");
            assert_eq!(inserted, 3);
            assert_eq!(db.count_rows("listings").expect("Failed to count"), 3);

            let names = db
                .query(
                    "SELECT \"event name\" FROM listings WHERE \"listing_id\" = ?1 ORDER BY rowid",
                    ["1"],
                    |row| Ok(row.get::<_, Option<String>>(0)?),
                )
                .expect("Failed to query");
            assert_eq!(names, vec![Some("Derby".to_string()), Some("Regatta".to_string())]);

            let missing = db
                .query(
                    "SELECT \"event name\" FROM listings WHERE \"listing_id\" = ?1",
                    ["2"],
                    |row| Ok(row.get::<_, Option<String>>(0)?),
                )
                .expect("Failed to query");
            assert_eq!(missing, vec![None]);
        }

        #[test]
        fn test_insert_rows_rejects_ragged_row() {
            let db = DatabaseService::in_memory().expect("Failed to create database");
            let cols = columns(&["a", "b"]);
            db.create_text_table("listings", &cols).expect("Failed to create table");

            let result = db.insert_rows("listings", &cols, &[vec![Some("only one".to_string())]]);
            assert!(matches!(result, Err(DatabaseError::InvalidQuery(_))));
            assert_eq!(db.count_rows("listings").expect("Failed to count"), 0);
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn test_validate_table_name() {
            let db = DatabaseService::in_memory().expect("Failed to create database");
            assert!(db.validate_table_name("listings").is_ok());
            assert!(db.validate_table_name("").is_err());
            assert!(db.validate_table_name("1listings").is_err());
            assert!(db.validate_table_name("list;ings").is_err());
            assert!(db.validate_table_name(&"a".repeat(65)).is_err());
        }

        #[test]
        fn test_quote_identifier() {
            assert_eq!(quote_identifier("event_name"), "\"event_name\"");
            assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
        }
    }
}
