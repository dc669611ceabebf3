//! # Batch Record Extraction
//!
//! Reads a spreadsheet of participants into issued [`Record`]s.
//!
//! ## Sheet layout
//!
//! The first worksheet in workbook order is read, whichever sheet was
//! active when the file was saved. Row 1 is a header and is always skipped.
//! Data rows are read positionally through a [`ColumnMap`]:
//!
//! | Column | Field | Required |
//! |--------|-------|----------|
//! | A | participant name | yes (row skipped when empty) |
//! | B | document id | |
//! | C | certifier name | |
//! | D | primary representative | |
//! | E | secondary representative | optional |
//! | F | tertiary representative | optional |
//!
//! ## Failure policy
//!
//! A file that cannot be opened as a workbook fails the whole call with
//! [`SelloError::Sheet`]. A row with an empty first column is skipped and
//! counted, never an error. Cells are trimmed first, so a first column of
//! only spaces counts as empty. Short rows read their missing cells as empty.

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::io::Cursor;

use crate::error::{Result, SelloError};
use crate::model::{Record, RecordFields, SharedFields};

/// Column index for each record field.
///
/// Positional by default. Optional columns hold `None` when the field is
/// not read from the sheet at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub participant_name: usize,
    pub document_id: usize,
    pub certifier_name: usize,
    pub representative_name: usize,
    pub representative_name_2: Option<usize>,
    pub representative_name_3: Option<usize>,
}

impl ColumnMap {
    /// Columns A–F in the documented order.
    pub const POSITIONAL: ColumnMap = ColumnMap {
        participant_name: 0,
        document_id: 1,
        certifier_name: 2,
        representative_name: 3,
        representative_name_2: Some(4),
        representative_name_3: Some(5),
    };

    /// Map one data row to record fields, or `None` if the row is blank.
    fn read_row(&self, row: &[Option<String>]) -> Option<RecordFields> {
        let cell = |idx: usize| row.get(idx).cloned().flatten().unwrap_or_default();
        let optional = |idx: Option<usize>| idx.and_then(|i| row.get(i).cloned().flatten());

        let participant_name = cell(self.participant_name);
        if participant_name.is_empty() {
            return None;
        }

        Some(RecordFields {
            participant_name,
            document_id: cell(self.document_id),
            certifier_name: cell(self.certifier_name),
            representative_name: cell(self.representative_name),
            representative_name_2: optional(self.representative_name_2),
            representative_name_3: optional(self.representative_name_3),
            ..Default::default()
        })
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::POSITIONAL
    }
}

/// A parsed worksheet: rows of optional cell text, addressed from A1.
///
/// Empty cells are `None`; non-empty cells are trimmed text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub rows: Vec<Vec<Option<String>>>,
}

impl Sheet {
    /// Parse the first worksheet of an xlsx / xls / xlsb / ods workbook.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| SelloError::Sheet(format!("Failed to open workbook: {}", e)))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| SelloError::Sheet("Workbook has no worksheets".to_string()))?
            .map_err(|e| SelloError::Sheet(format!("Failed to read worksheet: {}", e)))?;

        // The range starts at the first used cell, not necessarily A1.
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows = vec![Vec::new(); row_offset];
        for range_row in range.rows() {
            let mut row = vec![None; col_offset];
            row.extend(range_row.iter().map(cell_text));
            rows.push(row);
        }

        Ok(Self { rows })
    }
}

/// Text of one cell, or `None` when it is empty.
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.clone(),
        // Spreadsheets store integers as floats; "1042" not "1042.0".
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Result of extracting a batch.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Accepted records in sheet order
    pub records: Vec<Record>,
    /// Data rows turned into records
    pub accepted: usize,
    /// Data rows skipped because the first column was empty
    pub skipped: usize,
}

/// Parse spreadsheet bytes and issue one record per non-blank data row.
pub fn extract(bytes: &[u8], shared: &SharedFields) -> Result<Extraction> {
    let sheet = Sheet::parse(bytes)?;
    Ok(extract_rows(&sheet, shared, &ColumnMap::default()))
}

/// Issue records from an already parsed sheet.
///
/// Every accepted row gets its own unique code and integrity hash; shared
/// batch fields are copied onto each record.
pub fn extract_rows(sheet: &Sheet, shared: &SharedFields, columns: &ColumnMap) -> Extraction {
    let mut records = Vec::new();
    let mut skipped = 0;

    for (idx, row) in sheet.rows.iter().enumerate().skip(1) {
        match columns.read_row(row) {
            Some(mut fields) => {
                shared.apply(&mut fields);
                records.push(Record::issue(fields));
            }
            None => {
                log::debug!("Skipping row {}: first column is empty", idx + 1);
                skipped += 1;
            }
        }
    }

    log::info!(
        "Extracted {} records ({} blank rows skipped)",
        records.len(),
        skipped
    );

    Extraction {
        accepted: records.len(),
        records,
        skipped,
    }
}
