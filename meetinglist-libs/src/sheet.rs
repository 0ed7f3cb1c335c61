use crate::cell::CellValue;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("{name} sheet not found")]
    SheetNotFound { name: String },
    #[error("Could not read workbook: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid workbook contents: {0}")]
    Json(#[from] serde_json::Error),
}

/// Narrow access to the sheet holding the meeting list.
///
/// Rows and columns are 0-based and row 0 is the header row.
///
/// There is no locking here. Implementations backed by a whole-document file
/// lose every concurrent change but one unless callers replay their own
/// edits onto a fresh copy (see [`SheetChanges`]). Even then two callers that
/// write the same row both succeed and the last write wins.
pub trait SheetStore {
    /// The full data range, every row padded to [`SheetStore::last_column`].
    fn load_rows(&self) -> Vec<Vec<CellValue>>;

    /// Number of columns in use.
    fn last_column(&self) -> usize;

    /// Number of rows in use, header included.
    fn last_row(&self) -> usize;

    fn write_cell(&mut self, row: usize, col: usize, value: CellValue);

    fn set_bold(&mut self, row: usize, col: usize);

    /// Paints a whole row, or clears its fill when `color` is `None`.
    fn set_row_background(&mut self, row: usize, color: Option<&str>);
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MemorySheet {
    pub rows: Vec<Vec<CellValue>>,
    pub bold: BTreeSet<(usize, usize)>,
    pub backgrounds: BTreeMap<usize, String>,
}

impl MemorySheet {
    pub fn new(rows: Vec<Vec<CellValue>>) -> MemorySheet {
        MemorySheet {
            rows,
            ..MemorySheet::default()
        }
    }

    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;

        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn background(&self, row: usize) -> Option<&str> {
        self.backgrounds.get(&row).map(String::as_str)
    }

    pub fn is_bold(&self, row: usize, col: usize) -> bool {
        self.bold.contains(&(row, col))
    }
}

impl SheetStore for MemorySheet {
    fn load_rows(&self) -> Vec<Vec<CellValue>> {
        let width = self.last_column();

        self.rows
            .iter()
            .take(self.last_row())
            .map(|cells| {
                let mut cells = cells.clone();
                cells.resize(width, CellValue::Empty);
                cells
            })
            .collect()
    }

    fn last_column(&self) -> usize {
        self.rows
            .iter()
            .filter_map(|cells| cells.iter().rposition(|cell| !cell.is_blank()))
            .max()
            .map_or(0, |col| col + 1)
    }

    fn last_row(&self) -> usize {
        self.rows
            .iter()
            .rposition(|cells| cells.iter().any(|cell| !cell.is_blank()))
            .map_or(0, |row| row + 1)
    }

    fn write_cell(&mut self, row: usize, col: usize, value: CellValue) {
        trace!("write ({}, {}) = {:?}", row, col, value);

        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
    }

    fn set_bold(&mut self, row: usize, col: usize) {
        self.bold.insert((row, col));
    }

    fn set_row_background(&mut self, row: usize, color: Option<&str>) {
        match color {
            Some(color) => {
                self.backgrounds.insert(row, color.to_string());
            }
            None => {
                self.backgrounds.remove(&row);
            }
        }
    }
}

/// A spreadsheet of named tabs, persisted as one JSON document.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub id: String,
    pub sheets: BTreeMap<String, MemorySheet>,
}

impl Workbook {
    pub fn new<S: Into<String>>(id: S) -> Workbook {
        Workbook {
            id: id.into(),
            sheets: BTreeMap::new(),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Workbook, SheetError> {
        let path = path.as_ref();
        debug!("opening workbook {}", path.display());

        let contents = fs::read(path)?;
        Ok(serde_json::from_slice(&contents)?)
    }

    /// Writes the workbook next to `path` and renames it into place, so readers
    /// see either the old contents or the new, never a partial file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SheetError> {
        let path = path.as_ref();
        debug!("saving workbook {} to {}", self.id, path.display());

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|err| err.error)?;
        Ok(())
    }

    pub fn with_sheet<S: Into<String>>(mut self, name: S, sheet: MemorySheet) -> Workbook {
        self.sheets.insert(name.into(), sheet);
        self
    }

    pub fn sheet(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets.get(name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut MemorySheet> {
        self.sheets.get_mut(name)
    }

    pub fn require_sheet_mut(&mut self, name: &str) -> Result<&mut MemorySheet, SheetError> {
        self.sheets
            .get_mut(name)
            .ok_or_else(|| SheetError::SheetNotFound {
                name: name.to_string(),
            })
    }
}

/// The edits one request made to a sheet, replayable onto a later copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetChanges {
    cells: Vec<(usize, usize, CellValue)>,
    bold: Vec<(usize, usize)>,
    backgrounds: Vec<(usize, Option<String>)>,
}

impl SheetChanges {
    /// Every cell, bold mark and row fill that differs from `before` in `after`.
    /// Bold marks are only ever added.
    pub fn between(before: &MemorySheet, after: &MemorySheet) -> SheetChanges {
        let height = before.rows.len().max(after.rows.len());
        let cells = (0..height)
            .flat_map(|row| {
                let width = before
                    .rows
                    .get(row)
                    .map_or(0, Vec::len)
                    .max(after.rows.get(row).map_or(0, Vec::len));
                (0..width).map(move |col| (row, col))
            })
            .filter(|&(row, col)| before.value(row, col) != after.value(row, col))
            .map(|(row, col)| (row, col, after.value(row, col).clone()))
            .collect();

        let bold = after.bold.difference(&before.bold).copied().collect();

        let backgrounds = before
            .backgrounds
            .keys()
            .chain(after.backgrounds.keys())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|row| before.background(**row) != after.background(**row))
            .map(|row| (*row, after.background(*row).map(str::to_string)))
            .collect();

        SheetChanges {
            cells,
            bold,
            backgrounds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.bold.is_empty() && self.backgrounds.is_empty()
    }

    pub fn apply_to<S: SheetStore + ?Sized>(&self, sheet: &mut S) {
        trace!(
            "replaying {} cells, {} bold, {} fills",
            self.cells.len(),
            self.bold.len(),
            self.backgrounds.len()
        );

        for (row, col, value) in &self.cells {
            sheet.write_cell(*row, *col, value.clone());
        }
        for (row, col) in &self.bold {
            sheet.set_bold(*row, *col);
        }
        for (row, color) in &self.backgrounds {
            sheet.set_row_background(*row, color.as_deref());
        }
    }
}
