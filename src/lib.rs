//! # Well Sheet
//!
//! Structure metadata for well-log spreadsheets.
//!
//! A structure is a spreadsheet of log curves for the wells of one geological
//! structure, grouped with its siblings by field. This crate reads such files and
//! works out what is in them, without assuming a fixed layout.
//!
//! ## Features
//!
//! - **Multi-format support**: Office Open XML (`.xlsx`, `.xlsm`, `.xlam`) and
//!   OpenDocument (`.ods`) workbooks, decoded in memory from raw bytes
//! - **Sheet selection**: Ranks every sheet by its header row, well and depth columns
//!   and size, and picks the one holding the log data
//! - **Header detection**: Finds the header row below titles and blank rows
//! - **Column inference**: Number or string types, the well identifier column (by label
//!   or by well-code values) and the interval column
//! - **Statistics**: Count, min, max and mean of the GR, RT, NPHI and RHOB curves
//! - **Catalog**: Scans a structures folder or loads its `index.json`, and keeps the
//!   records in a keyed store
//! - **Calculations**: The calculations a structure can feed, their required curves
//!   and parameters, and typed service requests and responses
//!
//! ## Example
//!
//! ```no_run
//! use well_sheet::CalculationType;
//!
//! let bytes = std::fs::read("structures/adera/ABAB.xlsx")?;
//! let metadata = well_sheet::extract(&bytes)?;
//! for well in &metadata.wells {
//!     println!("{well}");
//! }
//! CalculationType::Vsh.validate_requirements(&metadata.columns)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod calculation;
pub mod catalog;
pub mod error;
mod helpers;
pub mod metadata;
pub mod spreadsheet;

pub use calculation::BackendResponse;
pub use calculation::CalculationError;
pub use calculation::CalculationRequest;
pub use calculation::CalculationType;
pub use catalog::Catalog;
pub use catalog::CatalogStore;
pub use catalog::StructureKey;
pub use catalog::StructureRecord;
pub use error::WellSheetError;
pub use metadata::extract;
pub use metadata::extract_with;
pub use metadata::extract_workbook;
pub use metadata::ExtractOptions;
pub use metadata::StructureMetadata;
pub use spreadsheet::CellValue;
pub use spreadsheet::Sheet;
pub use spreadsheet::Workbook;
