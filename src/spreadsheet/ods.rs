use crate::error::WellSheetError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::reference::MAX_COLUMNS;
use crate::spreadsheet::reference::MAX_ROWS;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::ByteReader;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::io::Read;
use thiserror::Error;
use zip::ZipArchive;

/// ODS file MIME type identifier
const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
/// XML element name for table (sheet)
const TABLE: QName = QName(b"table:table");
/// XML element name for table row
const TABLE_ROW: QName = QName(b"table:table-row");
/// XML element name for table cell
const TABLE_CELL: QName = QName(b"table:table-cell");
/// XML element name for covered table cell (merged cells)
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
/// XML element name for annotations (comments)
const ANNOTATION: QName = QName(b"office:annotation");
/// XML element name for paragraph text
const PARAGRAPH: QName = QName(b"text:p");
/// XML element name for string (space) text
const STRING: QName = QName(b"text:s");

/// Copies a table may gain from repeated valued cells
const MAX_REPEATED_CELLS: usize = 1 << 20;
/// Longest space run kept from `text:s`, the cell text limit
const MAX_SPACE_RUN: usize = 32_767;

/// Error types specific to ODS spreadsheet processing
#[derive(Error, Debug)]
pub enum OdsError {
    /// Invalid ODS MIME type detected in file
    #[error("Invalid ODS MIME type")]
    MimeTypeError,

    /// A repeat count of zero
    #[error("Invalid repeat count in '{0}'")]
    RepeatCountError(String),

    /// Repeated rows or columns run past the addressable positions
    #[error("Repeated rows or columns overflow the table")]
    RepeatOverflowError,

    /// Repeated valued cells expand past the table limit
    #[error("Repeated cells in table '{0}' expand past the table limit")]
    RepeatLimitError(String),
}

/// An OpenDocument spreadsheet package
pub(crate) struct OdsSpreadsheet<'a> {
    zip: ZipArchive<ByteReader<'a>>,
}

impl<'a> OdsSpreadsheet<'a> {
    /// Validates the package MIME type and rejects encrypted documents.
    pub(crate) fn open(mut zip: ZipArchive<ByteReader<'a>>) -> Result<OdsSpreadsheet<'a>, WellSheetError> {
        check_mime(&mut zip)?;
        if is_password_protected(&mut zip)? {
            Err(SpreadsheetError::PasswordProtected)?;
        }
        Ok(OdsSpreadsheet { zip })
    }
}

impl Spreadsheet for OdsSpreadsheet<'_> {
    /// ODS stores strings inline, so the table is always empty.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, WellSheetError> {
        Ok(Vec::new())
    }

    fn read_sheets(&mut self, shared_strings: &[String]) -> Result<Vec<Sheet>, WellSheetError> {
        let mut sheets = Vec::<Sheet>::new();
        let mut reader = self.zip
            .xml_reader("content.xml")?
            .ok_or_else(|| SpreadsheetError::MissingPart("content.xml".to_owned()))?;

        let mut sheet = None::<Sheet>;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut row_count = 1usize;
        let mut col_count = 1usize;
        let mut repeated = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut text_context = false;
        let mut comment_context = false;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TABLE => {
                let name = event.get_attribute_value("table:name")?.unwrap_or_default();
                sheet = Some(Sheet::new(&name));
                row = 0;
                repeated = 0;
            }
            Event::End(event) if event.name() == TABLE => {
                if let Some(sheet) = sheet.take() {
                    tracing::debug!(sheet = %sheet.name, rows = sheet.row_count(), "Read ods table");
                    sheets.push(sheet);
                }
            }
            Event::Start(event) if event.name() == TABLE_ROW => {
                row_count = repeat_count(&event, "table:number-rows-repeated")?;
                col = 0;
            }
            Event::End(event) if event.name() == TABLE_ROW => row = advance(row, row_count)?,
            Event::Start(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                value.clear();
                col_count = repeat_count(&event, "table:number-columns-repeated")?;
                kind = CellType::Empty;
                if let Some(value_type) = event.get_attribute_value("office:value-type")? {
                    match value_type.as_ref() {
                        "string" => {
                            let is_error = event.get_attribute_value("calcext:value-type")?
                                .map(|it| it == "error")
                                .unwrap_or(false);
                            kind = if is_error { CellType::Error } else { CellType::InlineString };
                            text_context = true;
                        }
                        "boolean" => {
                            kind = CellType::Boolean;
                            let truth = event.get_attribute_value("office:boolean-value")?
                                .map(|it| it != "false" && it != "0")
                                .unwrap_or(false);
                            value.push_str(if truth { "1" } else { "0" });
                        }
                        "date" => {
                            kind = CellType::IsoDateTime;
                            if let Some(data) = event.get_attribute_value("office:date-value")? {
                                value.push_str(&data);
                            }
                        }
                        "time" => {
                            kind = CellType::IsoDuration;
                            if let Some(data) = event.get_attribute_value("office:time-value")? {
                                value.push_str(&data);
                            }
                        }
                        _ => {
                            kind = CellType::Number;
                            if let Some(data) = event.get_attribute_value("office:value")? {
                                value.push_str(&data);
                            }
                        }
                    }
                }
            }
            Event::End(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                if let Some(sheet) = sheet.as_mut() {
                    if kind != CellType::Empty && !value.is_empty() {
                        let end_row = advance(row, row_count)?;
                        let end_col = advance(col, col_count)?;
                        if end_row > MAX_ROWS || end_col > MAX_COLUMNS {
                            Err(SpreadsheetError::CellOutOfRange(format!("row {end_row}, column {end_col}")))?;
                        }
                        repeated = repeated.saturating_add(row_count.saturating_mul(col_count) - 1);
                        if repeated > MAX_REPEATED_CELLS {
                            Err(OdsError::RepeatLimitError(sheet.name.to_owned()))?;
                        }
                        let cell = Cell {
                            row,
                            col,
                            kind,
                            value: std::mem::take(&mut value),
                        };
                        if let Some(cell_value) = cell.into_value(shared_strings) {
                            for cell_row in row..end_row {
                                for cell_col in col..end_col {
                                    sheet.push(cell_row, cell_col, cell_value.clone());
                                }
                            }
                        }
                    }
                }
                col = advance(col, col_count)?;
                text_context = false;
                comment_context = false;
            }
            Event::Start(event) if text_context && event.name() == ANNOTATION => comment_context = true,
            Event::End(event) if text_context && event.name() == ANNOTATION => comment_context = false,
            Event::Start(event) if text_context && !comment_context && event.name() == PARAGRAPH => {
                if !value.is_empty() {
                    value.push('\n');
                }
            }
            Event::Start(event) if text_context && !comment_context && event.name() == STRING => {
                let count = event.parse_attribute_value("text:c")?.unwrap_or(1usize).min(MAX_SPACE_RUN);
                value.extend(std::iter::repeat_n(' ', count));
            }
            Event::Text(event) if text_context && !comment_context => value.push_bytes_text(&event)?,
            Event::GeneralRef(event) if text_context && !comment_context => value.push_bytes_ref(&event)?,
        });
        Ok(sheets)
    }
}

/// Reads a `number-*-repeated` attribute, 1 when absent.
fn repeat_count(event: &BytesStart<'_>, name: &str) -> Result<usize, WellSheetError> {
    match event.parse_attribute_value::<usize>(name)? {
        None => Ok(1),
        Some(0) => Err(OdsError::RepeatCountError(name.to_owned()).into()),
        Some(count) => Ok(count),
    }
}

/// Moves a row or column position past `count` repeats.
fn advance(position: usize, count: usize) -> Result<usize, WellSheetError> {
    Ok(position.checked_add(count).ok_or(OdsError::RepeatOverflowError)?)
}

/// Validates the `mimetype` entry when the package carries one.
fn check_mime(zip: &mut ZipArchive<ByteReader<'_>>) -> Result<(), WellSheetError> {
    if let Some(file) = &mut zip.file("mimetype")? {
        let mut buffer = Vec::with_capacity(MIME_TYPE.len());
        file.read_to_end(&mut buffer)?;
        if buffer.trim_ascii() != MIME_TYPE {
            Err(OdsError::MimeTypeError)?;
        }
    }
    Ok(())
}

/// Checks the manifest for encryption data; a package without a manifest is not encrypted.
fn is_password_protected(zip: &mut ZipArchive<ByteReader<'_>>) -> Result<bool, WellSheetError> {
    let mut reader = match zip.xml_reader("META-INF/manifest.xml")? {
        Some(reader) => reader,
        None => return Ok(false),
    };
    let mut in_file_entry = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = true,
        Event::End(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = false,
        Event::Start(event) if in_file_entry && event.name() == QName(b"manifest:encryption-data") => {
            return Ok(true);
        }
    });
    Ok(false)
}
