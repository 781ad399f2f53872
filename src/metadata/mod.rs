//! # Structure Metadata Extraction
//!
//! Sniffs the layout of a well-log spreadsheet: picks the sheet that most looks like
//! log data, finds its header row, infers column types, and collects the wells,
//! intervals and summary statistics of the known log curves.
//!
//! ```no_run
//! let bytes = std::fs::read("ABAB.xlsx")?;
//! let metadata = well_sheet::extract(&bytes)?;
//! println!("{} wells in {} rows", metadata.wells.len(), metadata.total_records);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub(crate) mod column;
pub(crate) mod header;
pub(crate) mod options;
pub(crate) mod statistics;

pub use column::ColumnType;
pub use header::canonicalize;
pub use options::ExtractOptions;
pub use statistics::ColumnStatistics;

use crate::error::WellSheetError;
use crate::metadata::column::data_rows;
use crate::metadata::column::find_interval_column;
use crate::metadata::column::find_well_column;
use crate::metadata::header::header_labels;
use crate::metadata::header::refine;
use crate::metadata::header::select_sheet;
use crate::metadata::statistics::STATISTIC_COLUMNS;
use crate::spreadsheet::Workbook;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashSet;

/// Layout summary of the log sheet of a structure file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureMetadata {
    /// Name of the selected sheet
    pub sheet_name: String,
    /// 0-based index of the header row
    pub header_row: usize,
    /// Non-blank header labels in column order
    pub columns: Vec<String>,
    pub data_types: BTreeMap<String, ColumnType>,
    /// Distinct well identifiers in first-seen order
    pub wells: Vec<String>,
    pub intervals: BTreeSet<String>,
    /// Rows below the header
    pub total_records: usize,
    pub statistics: BTreeMap<String, ColumnStatistics>,
}

/// Extracts structure metadata from spreadsheet bytes with the default options.
pub fn extract(bytes: &[u8]) -> Result<StructureMetadata, WellSheetError> {
    extract_with(bytes, &ExtractOptions::default())
}

/// Extracts structure metadata from spreadsheet bytes.
///
/// Fails with `UnreadableWorkbookError` when the bytes are not a readable xlsx or
/// ods package and with `EmptyWorkbookError` when there is no sheet to analyze.
pub fn extract_with(bytes: &[u8], options: &ExtractOptions) -> Result<StructureMetadata, WellSheetError> {
    let workbook = Workbook::from_bytes(bytes).map_err(WellSheetError::into_unreadable)?;
    extract_workbook(&workbook, options)
}

/// Extracts structure metadata from an already decoded workbook.
pub fn extract_workbook(workbook: &Workbook, options: &ExtractOptions) -> Result<StructureMetadata, WellSheetError> {
    if workbook.sheets.is_empty() {
        Err(WellSheetError::EmptyWorkbookError("workbook has no sheets".to_owned()))?
    }
    let criteria = options.sheet_criteria();
    let (sheet, score) = select_sheet(&workbook.sheets, options, |sheet| criteria.accept(&sheet.name))
        .ok_or_else(|| WellSheetError::EmptyWorkbookError("no sheet matches the sheet name patterns".to_owned()))?;
    let candidate = score
        .header
        .ok_or_else(|| WellSheetError::EmptyWorkbookError(format!("sheet '{}' has no rows", sheet.name)))?;

    let header_row = refine(sheet, candidate.row);
    let labels = header_labels(sheet, header_row);
    let columns: Vec<String> = labels.iter().filter(|label| !label.is_empty()).cloned().collect();
    let data_types: BTreeMap<String, ColumnType> = labels
        .iter()
        .enumerate()
        .filter(|(_, label)| !label.is_empty())
        .map(|(col, label)| (label.to_owned(), ColumnType::infer(sheet, header_row, col, options.type_sample_rows)))
        .collect();

    let well_col = find_well_column(sheet, header_row, &labels, options);
    let interval_col = find_interval_column(&labels);
    let mut wells = Vec::<String>::new();
    let mut seen = HashSet::<String>::new();
    let mut intervals = BTreeSet::<String>::new();
    let rows = data_rows(sheet, header_row);
    let total_records = rows.len();
    for row in rows {
        if let Some(well) = well_col.and_then(|col| sheet.text(row, col)) {
            if seen.insert(well.clone()) {
                wells.push(well);
            }
        }
        if let Some(interval) = interval_col.and_then(|col| sheet.text(row, col)) {
            intervals.insert(interval);
        }
    }

    let statistics: BTreeMap<String, ColumnStatistics> = STATISTIC_COLUMNS
        .iter()
        .filter_map(|name| {
            let col = labels.iter().position(|label| label == name)?;
            Some((name.to_string(), ColumnStatistics::collect(sheet, header_row, col)))
        })
        .collect();

    tracing::info!(
        sheet = %sheet.name,
        sheet_index = score.index,
        score = score.score,
        header_row,
        columns = columns.len(),
        wells = wells.len(),
        intervals = intervals.len(),
        total_records,
        "Extracted structure metadata"
    );
    Ok(StructureMetadata {
        sheet_name: sheet.name.to_owned(),
        header_row,
        columns,
        data_types,
        wells,
        intervals,
        total_records,
        statistics,
    })
}
