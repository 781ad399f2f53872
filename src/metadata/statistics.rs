use crate::metadata::column::data_rows;
use crate::spreadsheet::Sheet;
use serde::Deserialize;
use serde::Serialize;

/// Log curves that get summary statistics. Header labels must match exactly.
pub(crate) const STATISTIC_COLUMNS: &[&str] = &["GR", "RT", "NPHI", "RHOB"];

/// Summary of the numeric values of one column; the bounds and mean are `None`
/// when the column holds no numbers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl ColumnStatistics {
    /// Accumulates every data row of a column, skipping cells that are not numbers.
    pub(crate) fn collect(sheet: &Sheet, header_row: usize, col: usize) -> Self {
        let mut count = 0usize;
        let mut sum = 0f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for number in data_rows(sheet, header_row).filter_map(|row| sheet.cell(row, col)?.as_number()) {
            count += 1;
            sum += number;
            min = min.min(number);
            max = max.max(number);
        }
        if count == 0 {
            return Self::default();
        }
        Self {
            count,
            min: Some(min),
            max: Some(max),
            mean: Some(sum / count as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::CellValue;

    fn column(values: Vec<Option<CellValue>>) -> Sheet {
        let mut rows = vec![vec![Some(CellValue::from("GR"))]];
        rows.extend(values.into_iter().map(|value| vec![value]));
        Sheet::from_rows("S", rows)
    }

    #[test]
    fn numeric_column() {
        let sheet = column(vec![
            Some(CellValue::from(50)),
            Some(CellValue::from("55")),
            None,
            Some(CellValue::from("bad")),
            Some(CellValue::from(60)),
        ]);
        let statistics = ColumnStatistics::collect(&sheet, 0, 0);
        assert_eq!(statistics.count, 3);
        assert_eq!(statistics.min, Some(50.0));
        assert_eq!(statistics.max, Some(60.0));
        assert_eq!(statistics.mean, Some(55.0));
    }

    #[test]
    fn column_without_numbers() {
        let sheet = column(vec![Some(CellValue::from("-")), None]);
        let statistics = ColumnStatistics::collect(&sheet, 0, 0);
        assert_eq!(statistics, ColumnStatistics::default());
        assert_eq!(
            serde_json::to_string(&statistics).unwrap(),
            r#"{"count":0,"min":null,"max":null,"mean":null}"#
        );
    }
}
