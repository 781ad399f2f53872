//! Header row detection and sheet ranking.

use crate::metadata::options::ExtractOptions;
use crate::spreadsheet::Sheet;

/// Canonical labels of a well identifier column.
pub(crate) const WELL_LABELS: &[&str] = &[
    "well",
    "wellname",
    "wellid",
    "wellno",
    "sumur",
    "namasumur",
    "wellborename",
];

/// Canonical labels of a depth column.
pub(crate) const DEPTH_LABELS: &[&str] = &["depth", "md", "tvd"];

/// Size bonus cap, reached at 2000 data rows.
const MAX_SIZE_BONUS: usize = 20;
const WELL_BONUS: usize = 10;
const DEPTH_BONUS: usize = 4;

/// Lowercases a header label and strips everything but ASCII letters and digits,
/// so `"Well Name"`, `"WELL_NAME"` and `"well-name"` all become `wellname`.
pub fn canonicalize(label: &str) -> String {
    label
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// The best header row among the first rows of a sheet.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct HeaderCandidate {
    /// 0-based row index
    pub(crate) row: usize,
    /// Non-blank cells in the row
    pub(crate) filled: usize,
    /// Canonical forms of the non-blank labels, in column order
    pub(crate) labels: Vec<String>,
    pub(crate) has_well: bool,
    pub(crate) has_depth: bool,
}

impl HeaderCandidate {
    /// Picks the row with most non-blank cells among the first `scan_rows` rows, the
    /// earliest row winning ties. `None` for a sheet without rows.
    pub(crate) fn detect(sheet: &Sheet, scan_rows: usize) -> Option<Self> {
        let mut best = None::<(usize, usize)>;
        for row in 0..sheet.row_count().min(scan_rows.max(1)) {
            let filled = sheet.filled_count(row);
            if best.map(|(_, count)| filled > count).unwrap_or(true) {
                best = Some((row, filled));
            }
        }
        let (row, filled) = best?;
        let labels: Vec<String> = (0..sheet.rows[row].len())
            .filter_map(|col| sheet.text(row, col))
            .map(|text| canonicalize(&text))
            .collect();
        let has_well = labels.iter().any(|label| WELL_LABELS.contains(&label.as_str()));
        let has_depth = labels.iter().any(|label| DEPTH_LABELS.contains(&label.as_str()));
        Some(Self {
            row,
            filled,
            labels,
            has_well,
            has_depth,
        })
    }
}

/// Ranking of one sheet for selection.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SheetScore {
    /// Position of the sheet in the workbook
    pub(crate) index: usize,
    pub(crate) score: usize,
    /// `None` when the sheet has no rows
    pub(crate) header: Option<HeaderCandidate>,
}

impl SheetScore {
    pub(crate) fn compute(index: usize, sheet: &Sheet, options: &ExtractOptions) -> Self {
        let header = HeaderCandidate::detect(sheet, options.header_scan_rows);
        let score = header
            .as_ref()
            .map(|header| {
                let data_rows = sheet.row_count().saturating_sub(header.row + 1);
                header.filled
                    + if header.has_well { WELL_BONUS } else { 0 }
                    + if header.has_depth { DEPTH_BONUS } else { 0 }
                    + (data_rows / 100).min(MAX_SIZE_BONUS)
            })
            .unwrap_or(0);
        Self { index, score, header }
    }
}

/// Scores the accepted sheets and returns the best one; the first sheet wins ties.
/// `None` when no sheet is accepted.
pub(crate) fn select_sheet<'a, F>(sheets: &'a [Sheet], options: &ExtractOptions, accept: F) -> Option<(&'a Sheet, SheetScore)>
where
    F: Fn(&Sheet) -> bool,
{
    let mut best = None::<(&Sheet, SheetScore)>;
    for (index, sheet) in sheets.iter().enumerate().filter(|(_, sheet)| accept(sheet)) {
        let score = SheetScore::compute(index, sheet, options);
        tracing::debug!(
            sheet = %sheet.name,
            score = score.score,
            header_row = score.header.as_ref().map(|header| header.row),
            labels = ?score.header.as_ref().map(|header| &header.labels),
            "Scored sheet"
        );
        if best.as_ref().map(|(_, current)| score.score > current.score).unwrap_or(true) {
            best = Some((sheet, score));
        }
    }
    best
}

/// Settles the header row of the selected sheet. A candidate other than row 0 stands;
/// for row 0 the first row with at least two non-blank cells is taken, falling back to 0.
pub(crate) fn refine(sheet: &Sheet, candidate: usize) -> usize {
    if candidate != 0 {
        return candidate;
    }
    (0..sheet.row_count())
        .find(|row| sheet.filled_count(*row) >= 2)
        .unwrap_or(0)
}

/// Positional header labels of a row: trimmed text, empty for blank or absent cells.
pub(crate) fn header_labels(sheet: &Sheet, row: usize) -> Vec<String> {
    let width = sheet.rows.get(row).map(Vec::len).unwrap_or(0);
    (0..width)
        .map(|col| sheet.text(row, col).unwrap_or_default())
        .collect()
}
