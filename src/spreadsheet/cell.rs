use crate::spreadsheet::reference::index_to_reference;
use std::borrow::Cow;
use std::fmt::Display;

/// Types of raw cell data as stored by the container formats.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as `1`/`0` or `true`/`false`
    Boolean,
    /// Numeric values
    Number,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// ISO 8601 duration strings
    IsoDuration,
    /// Inline string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values such as `#N/A`
    Error,
}

/// A decoded cell value. Absent cells are represented by `None` in a sheet row.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Returns the value as text. Numbers use the shortest decimal form that
    /// round-trips, so `3000.0` renders as `3000`.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text.as_str()),
            Self::Number(number) => Cow::Owned(number.to_string()),
        }
    }

    /// Returns the value as a finite number. Text is trimmed and parsed; anything
    /// that does not parse, or parses to infinity or NaN, is not a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(text) => text.trim().parse::<f64>().ok(),
        }
        .filter(|number| number.is_finite())
    }

    /// Returns true for text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(_) => false,
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

/// A raw cell read from a worksheet part, before shared strings are resolved.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Cell value as stored
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Resolves the stored value. Errors, empty values and dangling shared string
    /// indexes yield `None`; numbers that fail to parse are kept as text.
    pub(crate) fn into_value(self, shared_strings: &[String]) -> Option<CellValue> {
        if self.value.is_empty() {
            return None;
        }
        match self.kind {
            CellType::Empty | CellType::Error => None,
            CellType::SharedString => {
                let text = self
                    .value
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| shared_strings.get(index));
                if text.is_none() {
                    tracing::debug!(cell = %self.reference(), index = %self.value, "Dangling shared string");
                }
                text.filter(|text| !text.is_empty())
                    .map(|text| CellValue::Text(text.to_owned()))
            }
            CellType::Boolean => {
                let value = if self.value == "1" || self.value.eq_ignore_ascii_case("true") {
                    "true"
                } else {
                    "false"
                };
                Some(CellValue::from(value))
            }
            CellType::Number => match self.value.trim().parse::<f64>() {
                Ok(number) if number.is_finite() => Some(CellValue::Number(number)),
                _ => Some(CellValue::Text(self.value)),
            },
            CellType::IsoDateTime | CellType::IsoDuration | CellType::InlineString => {
                Some(CellValue::Text(self.value))
            }
        }
    }
}
