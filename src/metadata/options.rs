use crate::error::WellSheetError;
use glob::Pattern;
use serde::Deserialize;
use serde::Serialize;

/// Sampling limits and sheet filters for structure metadata extraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Rows scanned per sheet when looking for the header candidate.
    pub header_scan_rows: usize,

    /// Data rows sampled when inferring column types.
    pub type_sample_rows: usize,

    /// Data rows sampled by the well-code pattern fallback.
    pub pattern_sample_rows: usize,

    /// Minimum number of well-code matches for the pattern fallback.
    pub pattern_min_matches: usize,

    /// Minimum ratio of well-code matches to non-blank values.
    pub pattern_min_ratio: f64,

    /// Glob patterns restricting which sheets take part in selection; empty means all.
    pub sheet_name_patterns: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            header_scan_rows: 10,
            type_sample_rows: 200,
            pattern_sample_rows: 2000,
            pattern_min_matches: 3,
            pattern_min_ratio: 0.4,
            sheet_name_patterns: Vec::new(),
        }
    }
}

impl ExtractOptions {
    /// Compiles the sheet name patterns, failing on the first invalid one.
    pub fn validate(&self) -> Result<Vec<Pattern>, WellSheetError> {
        Ok(self
            .sheet_name_patterns
            .iter()
            .map(|pattern| Pattern::new(pattern))
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Compiles the sheet name patterns for selection. Invalid patterns are skipped
    /// so a bad filter never turns into a decoding error.
    pub(crate) fn sheet_criteria(&self) -> SheetCriteria {
        let patterns = self
            .sheet_name_patterns
            .iter()
            .filter_map(|pattern| match Pattern::new(pattern) {
                Ok(pattern) => Some(pattern),
                Err(error) => {
                    tracing::warn!(pattern = %pattern, error = %error, "Ignoring invalid sheet name pattern");
                    None
                }
            })
            .collect::<Vec<_>>();
        SheetCriteria {
            patterns: (!self.sheet_name_patterns.is_empty()).then_some(patterns),
        }
    }
}

/// Compiled sheet filter.
#[derive(Clone, Debug)]
pub(crate) struct SheetCriteria {
    patterns: Option<Vec<Pattern>>,
}

impl SheetCriteria {
    /// Returns true if no patterns are configured or the name matches any of them.
    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        match &self.patterns {
            Some(patterns) => patterns.iter().any(|pattern| pattern.matches(sheet_name)),
            None => true,
        }
    }
}
