//! Relational sink.
//!
//! [`TableSink`] is the minimal adapter the pipeline needs: append a [`Table`] to a
//! named relational table. [`SqliteSink`] implements it on SQLite. Every column is
//! stored as `TEXT`, empty cells become `NULL`, and all rows of one append share a
//! single transaction.
//!
//! The target table is created on first use. Appending to an existing table whose
//! columns do not cover the new header fails with [`SinkError::SchemaMismatch`];
//! the sink never alters an existing schema. Column names are matched ignoring
//! ASCII case, as SQLite does, so a header holding both `IP` and `ip` is a
//! [`SinkError::SchemaMismatch`] too.

use crate::error::SinkError;
use crate::table::Table;
use rusqlite::{Connection, params_from_iter};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Destination that accepts whole tables.
pub trait TableSink {
    /// Append every row of `table` to `table_name`, returning the rows written.
    ///
    /// # Errors
    /// Implementations report connectivity and schema problems as [`SinkError`].
    fn append(&mut self, table_name: &str, table: &Table) -> Result<usize, SinkError>;
}

/// SQLite-backed [`TableSink`].
pub struct SqliteSink {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteSink {
    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// [`SinkError::Open`] if SQLite cannot open the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| SinkError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Private in-memory database.
    ///
    /// # Errors
    /// [`SinkError::Open`] if SQLite cannot allocate the database.
    pub fn in_memory() -> Result<Self, SinkError> {
        let conn = Connection::open_in_memory().map_err(|e| SinkError::Open {
            path: PathBuf::from(":memory:"),
            reason: e.to_string(),
        })?;
        Ok(Self { conn, path: None })
    }

    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Columns of `table_name`, or an empty list when the table does not exist.
    ///
    /// # Errors
    /// [`SinkError::Sql`] if the catalog cannot be queried.
    pub fn columns(&self, table_name: &str) -> Result<Vec<String>, SinkError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1)")?;
        let cols = stmt
            .query_map([table_name], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cols)
    }

    /// Number of rows currently in `table_name`.
    ///
    /// # Errors
    /// [`SinkError::Sql`] if the table does not exist.
    pub fn row_count(&self, table_name: &str) -> Result<usize, SinkError> {
        let n: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table_name)),
            [],
            |r| r.get(0),
        )?;
        Ok(usize::try_from(n).unwrap_or_default())
    }

    fn ensure_table(&self, table_name: &str, header: &[String]) -> Result<(), SinkError> {
        // SQLite column names are ASCII case-insensitive
        let mut seen = HashSet::new();
        let clashing: Vec<String> = header
            .iter()
            .filter(|c| !seen.insert(c.to_ascii_lowercase()))
            .cloned()
            .collect();
        if !clashing.is_empty() {
            return Err(SinkError::SchemaMismatch {
                table: table_name.to_string(),
                missing: clashing,
            });
        }

        let existing = self.columns(table_name)?;
        if existing.is_empty() {
            let cols = header
                .iter()
                .map(|c| format!("{} TEXT", quote_ident(c)))
                .collect::<Vec<_>>()
                .join(", ");
            let ddl = format!("CREATE TABLE {} ({cols})", quote_ident(table_name));
            debug!(%ddl, "creating sink table");
            self.conn.execute_batch(&ddl)?;
            return Ok(());
        }
        let existing: HashSet<String> = existing.iter().map(|c| c.to_ascii_lowercase()).collect();
        let missing: Vec<String> = header
            .iter()
            .filter(|c| !existing.contains(&c.to_ascii_lowercase()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(SinkError::SchemaMismatch {
                table: table_name.to_string(),
                missing,
            });
        }
        Ok(())
    }
}

impl TableSink for SqliteSink {
    fn append(&mut self, table_name: &str, table: &Table) -> Result<usize, SinkError> {
        if table.header.is_empty() {
            if !table.is_empty() {
                warn!(rows = table.len(), "table has no columns; nothing to append");
            }
            return Ok(0);
        }
        self.ensure_table(table_name, &table.header)?;

        let columns = table
            .header
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=table.header.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders})",
            quote_ident(table_name)
        );

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(&sql)?;
            for row in &table.rows {
                let cells = row.iter().map(|c| (!c.is_empty()).then_some(c.as_str()));
                stmt.execute(params_from_iter(cells))?;
            }
        }
        tx.commit()?;

        info!(
            table = table_name,
            rows = table.len(),
            database = %self.path.as_deref().map_or_else(|| ":memory:".into(), |p| p.display().to_string()),
            "appended rows"
        );
        Ok(table.len())
    }
}

/// Quote an SQL identifier, doubling embedded quotes.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
