use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{QrError, Result};
use crate::table::{normalize_column, DelimiterMode, Table};

pub const DEFAULT_UUID_COLUMN: &str = "uuid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackfillReport {
    pub rows: usize,
    pub assigned: usize,
}

/// A loaded table whose identifier column has been found, ready to fill.
#[derive(Debug, Clone)]
pub struct PendingBackfill {
    path: PathBuf,
    table: Table,
    col: usize,
}

impl PendingBackfill {
    /// Loads the table at `path` and locates `column` by its normalized
    /// name. Nothing is written.
    pub fn open(path: &Path, column: &str, mode: DelimiterMode) -> Result<Self> {
        let table = Table::load(path, mode)?;
        let col = table
            .column_index(column)
            .ok_or_else(|| QrError::MissingColumns(vec![normalize_column(column)]))?;
        Ok(Self {
            path: path.to_path_buf(),
            table,
            col,
        })
    }

    pub fn rows(&self) -> usize {
        self.table.len()
    }

    pub fn fill(self) -> Result<BackfillReport> {
        self.fill_with(|| Uuid::new_v4().to_string())
    }

    /// Puts a generated value into every blank cell and rewrites the file
    /// in place. The file is not touched when nothing was blank.
    pub fn fill_with<F>(mut self, mut generate: F) -> Result<BackfillReport>
    where
        F: FnMut() -> String,
    {
        let mut report = BackfillReport {
            rows: self.table.len(),
            assigned: 0,
        };
        for row in 0..self.table.len() {
            let blank = self
                .table
                .cell(row, self.col)
                .map(|value| value.trim().is_empty())
                .unwrap_or(true);
            if blank {
                self.table.set_cell(row, self.col, generate());
                report.assigned += 1;
            }
        }
        if report.assigned == 0 {
            tracing::debug!(path = %self.path.display(), "every row already has an identifier");
            return Ok(report);
        }
        self.table.write_atomic(&self.path)?;
        tracing::debug!(
            path = %self.path.display(),
            assigned = report.assigned,
            rows = report.rows,
            "rewrote table with new identifiers"
        );
        Ok(report)
    }
}

/// Fills every blank cell of `column` in the table at `path` with a fresh
/// v4 UUID and rewrites the file in place. Rows that already carry a value
/// are left alone, and the file is not touched when nothing was blank.
///
/// Must not run while another pass is reading `path`.
pub fn backfill_uuids(path: &Path, column: &str, mode: DelimiterMode) -> Result<BackfillReport> {
    PendingBackfill::open(path, column, mode)?.fill()
}

pub fn backfill_with<F>(
    path: &Path,
    column: &str,
    mode: DelimiterMode,
    generate: F,
) -> Result<BackfillReport>
where
    F: FnMut() -> String,
{
    PendingBackfill::open(path, column, mode)?.fill_with(generate)
}
