//! # Spreadsheet Decoding Module
//!
//! Turns raw spreadsheet bytes into an in-memory [`Workbook`]: an ordered list of
//! sheets, each a row-major grid of optional [`CellValue`]s. Office Open XML
//! (`.xlsx`, `.xlsm`, `.xlam`) and OpenDocument (`.ods`) packages are supported;
//! the container is detected from its content, not from a file name.
pub(crate) mod cell;
pub(crate) mod ods;
pub mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

pub use cell::CellValue;
pub use ods::OdsError;
pub use sheet::Row;
pub use sheet::Sheet;

use crate::error::WellSheetError;
use crate::helpers::zip::ZipHelper;
use crate::spreadsheet::ods::OdsSpreadsheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::io::Cursor;
use thiserror::Error;
use zip::ZipArchive;

/// Leading bytes of a ZIP local file header
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// Leading bytes of a Compound File Binary container (legacy `.xls`, encrypted OOXML)
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Errors raised while decoding a spreadsheet container.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// Bytes are neither an Office Open XML nor an OpenDocument package
    #[error("Cannot detect spreadsheet format")]
    UnknownFormat,

    /// Compound File containers hold encrypted or legacy binary workbooks
    #[error("Password protected or legacy binary spreadsheets are not supported")]
    CompoundFileContainer,

    /// The package declares encryption
    #[error("Spreadsheet is password protected")]
    PasswordProtected,

    /// A part the package refers to is missing
    #[error("Missing package part '{0}'")]
    MissingPart(String),

    /// A cell lies past row 1048576 or column `XFD`
    #[error("Cell position '{0}' is outside the worksheet limits")]
    CellOutOfRange(String),
}

/// In-memory reader over the caller's bytes
pub(crate) type ByteReader<'a> = Cursor<&'a [u8]>;

/// Common interface of the container decoders.
pub(crate) trait Spreadsheet {
    /// Loads the shared string table; formats that store strings inline return an empty table.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, WellSheetError>;

    /// Reads every worksheet in workbook order.
    fn read_sheets(&mut self, shared_strings: &[String]) -> Result<Vec<Sheet>, WellSheetError>;

    /// Reads the complete workbook.
    fn read_workbook(&mut self) -> Result<Workbook, WellSheetError> {
        let shared_strings = self.load_shared_strings()?;
        let sheets = self.read_sheets(&shared_strings)?;
        Ok(Workbook { sheets })
    }
}

/// Detects the container format and opens the matching decoder.
pub(crate) fn open_spreadsheet(bytes: &[u8]) -> Result<Box<dyn Spreadsheet + '_>, WellSheetError> {
    if bytes.starts_with(CFB_MAGIC) {
        Err(SpreadsheetError::CompoundFileContainer)?
    }
    if !bytes.starts_with(ZIP_MAGIC) {
        Err(SpreadsheetError::UnknownFormat)?
    }

    let zip = ZipArchive::new(Cursor::new(bytes))?;
    if zip.contains("xl/workbook.xml") {
        Ok(Box::new(XlsxSpreadsheet::open(zip)?))
    } else if zip.contains("content.xml") {
        Ok(Box::new(OdsSpreadsheet::open(zip)?))
    } else {
        Err(SpreadsheetError::UnknownFormat)?
    }
}

/// An ordered sequence of sheets decoded from one spreadsheet file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Decodes a workbook from raw file bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Workbook, WellSheetError> {
        let workbook = open_spreadsheet(bytes)?.read_workbook()?;
        tracing::debug!(
            sheets = workbook.sheets.len(),
            bytes = bytes.len(),
            "Decoded workbook"
        );
        Ok(workbook)
    }

    /// Builds a workbook from already decoded sheets.
    pub fn from_sheets(sheets: Vec<Sheet>) -> Workbook {
        Workbook { sheets }
    }

    /// Returns the sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }
}
