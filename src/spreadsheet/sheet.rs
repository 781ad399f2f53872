use crate::spreadsheet::cell::CellValue;

/// One worksheet row; `None` marks an absent cell. Rows may be ragged.
pub type Row = Vec<Option<CellValue>>;

/// A worksheet as a row-major grid.
///
/// Row 0 is the first physical row of the worksheet, so leading blank rows are kept as
/// empty rows. Trailing rows without any cell are not represented.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    /// Sheet (tab) name
    pub name: String,
    /// Row-major cell grid
    pub rows: Vec<Row>,
}

impl Sheet {
    /// Creates an empty sheet.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            rows: Vec::new(),
        }
    }

    /// Creates a sheet from an existing grid.
    pub fn from_rows(name: &str, rows: Vec<Row>) -> Self {
        Self {
            name: name.to_owned(),
            rows,
        }
    }

    /// Returns true if the sheet has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows in the grid, including blank rows before the last populated one.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Gets the cell at (row, col); `None` when absent or out of bounds.
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row)?.get(col)?.as_ref()
    }

    /// Gets the trimmed text of the cell at (row, col); `None` when absent or blank.
    pub(crate) fn text(&self, row: usize, col: usize) -> Option<String> {
        self.cell(row, col)
            .map(|value| value.as_text().trim().to_owned())
            .filter(|text| !text.is_empty())
    }

    /// Counts cells in a row that are present and not blank after trimming.
    pub(crate) fn filled_count(&self, row: usize) -> usize {
        self.rows
            .get(row)
            .map(|cells| {
                cells
                    .iter()
                    .flatten()
                    .filter(|value| !value.is_blank())
                    .count()
            })
            .unwrap_or(0)
    }

    /// Places a value, growing the grid as needed. Later writes to the same position win.
    pub(crate) fn push(&mut self, row: usize, col: usize, value: CellValue) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, None);
        }
        cells[col] = Some(value);
    }
}
