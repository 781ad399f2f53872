use crate::metadata::header::canonicalize;
use crate::metadata::header::WELL_LABELS;
use crate::metadata::options::ExtractOptions;
use crate::spreadsheet::Sheet;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use std::sync::LazyLock;

/// Extra canonical labels of a well identifier column, beyond the scoring list.
const WELL_SYNONYMS: &[&str] = &["wellcode", "sumur", "namasumur"];

/// Canonical labels of an interval (marker, zone) column.
pub(crate) const INTERVAL_LABELS: &[&str] = &[
    "marker",
    "interval",
    "zone",
    "zonename",
    "layer",
    "formation",
    "formasi",
    "zona",
];

/// Short alphabetic prefix and a number, e.g. `ABB-035`, `KTB_12`, `PND 7`.
static WELL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{2,6}[-_ ]?\d{1,4}$").expect("Hardcode regex pattern")
});

/// Inferred data type of a column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Number,
    String,
}

impl ColumnType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Number => "number",
            ColumnType::String => "string",
        }
    }

    /// A column is a number column if any sampled data row holds a finite number.
    pub(crate) fn infer(sheet: &Sheet, header_row: usize, col: usize, sample_rows: usize) -> Self {
        let numeric = data_rows(sheet, header_row)
            .take(sample_rows)
            .filter_map(|row| sheet.cell(row, col))
            .any(|value| !value.is_blank() && value.as_number().is_some());
        if numeric {
            ColumnType::Number
        } else {
            ColumnType::String
        }
    }
}

/// Indexes of the rows strictly below the header.
pub(crate) fn data_rows(sheet: &Sheet, header_row: usize) -> std::ops::Range<usize> {
    (header_row + 1).min(sheet.row_count())..sheet.row_count()
}

/// Finds the first column whose canonical label is one of `candidates`.
pub(crate) fn find_by_label(labels: &[String], candidates: &[&str]) -> Option<usize> {
    labels
        .iter()
        .position(|label| !label.is_empty() && candidates.contains(&canonicalize(label).as_str()))
}

/// Resolves the well identifier column, by label first and by value pattern second.
pub(crate) fn find_well_column(sheet: &Sheet, header_row: usize, labels: &[String], options: &ExtractOptions) -> Option<usize> {
    let candidates: Vec<&str> = WELL_LABELS.iter().chain(WELL_SYNONYMS).copied().collect();
    if let Some(col) = find_by_label(labels, &candidates) {
        tracing::debug!(column = %labels[col], "Well column resolved by label");
        return Some(col);
    }
    let col = find_by_pattern(sheet, header_row, labels.len(), options);
    if let Some(col) = col {
        tracing::debug!(column = col, "Well column resolved by value pattern");
    }
    col
}

/// Resolves the interval column by label.
pub(crate) fn find_interval_column(labels: &[String]) -> Option<usize> {
    find_by_label(labels, INTERVAL_LABELS)
}

/// Scores every column by how many sampled values look like well codes. The score is
/// matches + 10 * ratio; a column needs enough matches and a high enough ratio to qualify.
fn find_by_pattern(sheet: &Sheet, header_row: usize, width: usize, options: &ExtractOptions) -> Option<usize> {
    let mut best = None::<(usize, f64)>;
    for col in 0..width {
        let mut total = 0usize;
        let mut matches = 0usize;
        for text in data_rows(sheet, header_row)
            .take(options.pattern_sample_rows)
            .filter_map(|row| sheet.text(row, col))
        {
            total += 1;
            if WELL_CODE.is_match(&text) {
                matches += 1;
            }
        }
        if total == 0 {
            continue;
        }
        let ratio = matches as f64 / total as f64;
        if matches < options.pattern_min_matches || ratio < options.pattern_min_ratio {
            continue;
        }
        let score = matches as f64 + 10.0 * ratio;
        if best.map(|(_, current)| score > current).unwrap_or(true) {
            best = Some((col, score));
        }
    }
    best.map(|(col, _)| col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::CellValue;
    use crate::spreadsheet::Row;

    fn text_row(cells: &[&str]) -> Row {
        cells
            .iter()
            .map(|cell| (!cell.is_empty()).then(|| CellValue::from(*cell)))
            .collect()
    }

    fn labels(sheet: &Sheet) -> Vec<String> {
        crate::metadata::header::header_labels(sheet, 0)
    }

    #[test]
    fn column_type_names() {
        assert_eq!(ColumnType::Number.as_str(), "number");
        assert_eq!(ColumnType::String.as_str(), "string");
        assert_eq!(serde_json::to_string(&ColumnType::Number).unwrap(), r#""number""#);
    }

    #[test]
    fn infer_types() {
        let sheet = Sheet::from_rows("S", vec![
            text_row(&["WELL", "DEPTH", "NOTE", "MIXED"]),
            vec![Some(CellValue::from("A-1")), Some(CellValue::from(3000)), Some(CellValue::from("n/a")), Some(CellValue::from("x"))],
            vec![Some(CellValue::from("A-2")), None, Some(CellValue::from(" ")), Some(CellValue::from(" 12.5 "))],
        ]);
        assert_eq!(ColumnType::infer(&sheet, 0, 0, 200), ColumnType::String);
        assert_eq!(ColumnType::infer(&sheet, 0, 1, 200), ColumnType::Number);
        assert_eq!(ColumnType::infer(&sheet, 0, 2, 200), ColumnType::String);
        assert_eq!(ColumnType::infer(&sheet, 0, 3, 200), ColumnType::Number);
        assert_eq!(ColumnType::infer(&sheet, 0, 9, 200), ColumnType::String);
    }

    #[test]
    fn infer_respects_sample_limit() {
        let mut rows = vec![text_row(&["VALUE"])];
        rows.extend((0..5).map(|_| text_row(&["text"])));
        rows.push(vec![Some(CellValue::from(1))]);
        let sheet = Sheet::from_rows("S", rows);
        assert_eq!(ColumnType::infer(&sheet, 0, 0, 5), ColumnType::String);
        assert_eq!(ColumnType::infer(&sheet, 0, 0, 6), ColumnType::Number);
    }

    #[test]
    fn header_row_at_end() {
        let sheet = Sheet::from_rows("S", vec![text_row(&["WELL"])]);
        assert!(data_rows(&sheet, 0).is_empty());
        assert!(data_rows(&sheet, 5).is_empty());
    }

    #[test]
    fn well_column_by_label() {
        let sheet = Sheet::from_rows("S", vec![text_row(&["DEPTH", "Well Code", "Nama Sumur"])]);
        let labels = labels(&sheet);
        assert_eq!(find_well_column(&sheet, 0, &labels, &ExtractOptions::default()), Some(1));
    }

    #[test]
    fn well_column_by_pattern() {
        let sheet = Sheet::from_rows("S", vec![
            text_row(&["ID", "CODE"]),
            text_row(&["1", "ABB-001"]),
            text_row(&["2", "ABB-002"]),
            text_row(&["3", "ABB-003"]),
            text_row(&["4", "ABB-004"]),
        ]);
        let labels = labels(&sheet);
        assert_eq!(find_well_column(&sheet, 0, &labels, &ExtractOptions::default()), Some(1));
    }

    #[test]
    fn pattern_needs_matches_and_ratio() {
        let few = Sheet::from_rows("S", vec![
            text_row(&["CODE"]),
            text_row(&["ABB-001"]),
            text_row(&["ABB-002"]),
        ]);
        assert_eq!(find_well_column(&few, 0, &labels(&few), &ExtractOptions::default()), None);

        let mut rows = vec![text_row(&["CODE"])];
        rows.extend(["ABB-1", "ABB-2", "ABB-3", "x", "y", "z", "w", "v"].iter().map(|text| text_row(&[*text])));
        let sparse = Sheet::from_rows("S", rows);
        // 3 of 8 is below the 0.4 ratio
        assert_eq!(find_well_column(&sparse, 0, &labels(&sparse), &ExtractOptions::default()), None);
    }

    #[test]
    fn pattern_prefers_higher_score() {
        let sheet = Sheet::from_rows("S", vec![
            text_row(&["A", "B"]),
            text_row(&["KTB 1", "PND_01"]),
            text_row(&["KTB 2", "PND_02"]),
            text_row(&["KTB 3", "PND_03"]),
            text_row(&["note", "PND_04"]),
        ]);
        assert_eq!(find_well_column(&sheet, 0, &labels(&sheet), &ExtractOptions::default()), Some(1));
    }

    #[test]
    fn well_code_shapes() {
        for code in ["ABB-035", "KTB_12", "PND 7", "abcdef1234", "AB1"] {
            assert!(WELL_CODE.is_match(code), "{code}");
        }
        for code in ["A-1", "ABCDEFG-1", "ABB-12345", "ABB--1", "3000", ""] {
            assert!(!WELL_CODE.is_match(code), "{code}");
        }
    }

    #[test]
    fn interval_column() {
        let labels = vec!["WELL".to_owned(), "".to_owned(), "Zone Name".to_owned(), "MARKER".to_owned()];
        assert_eq!(find_interval_column(&labels), Some(2));
        assert_eq!(find_interval_column(&["GR".to_owned()]), None);
    }
}
