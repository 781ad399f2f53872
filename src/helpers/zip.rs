//! ZIP archive helper utilities for Office Open XML (.xlsx) and OpenDocument (.ods) packages
//! Provides tolerant part lookup and XML reader creation

use crate::error::WellSheetError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

/// Helper trait for ZIP archive operations
pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Returns true if the archive holds a part with this name
    fn contains(&self, name: &str) -> bool;

    /// Gets a part by name (case-insensitive, path separator agnostic)
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, WellSheetError>;

    /// Creates an XML reader over a part
    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, WellSheetError>;
}

/// Normalizes a part name for lookup: backslashes become slashes and a leading slash is dropped.
fn normalize(name: &str) -> String {
    name.replace('\\', "/").trim_start_matches('/').to_owned()
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn contains(&self, name: &str) -> bool {
        let pattern = normalize(name);
        self.file_names()
            .any(|file_name| pattern.eq_ignore_ascii_case(&normalize(file_name)))
    }

    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, WellSheetError> {
        let pattern = normalize(name);
        let path = self
            .file_names()
            .find(|file_name| pattern.eq_ignore_ascii_case(&normalize(file_name)))
            .map(|file_name| file_name.to_owned());
        match path.map(|file_name| self.by_name(&file_name)).transpose() {
            Ok(file) => Ok(file),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, WellSheetError> {
        let reader = self
            .file(name)?
            .map(|file| XmlReader::new(BufReader::new(file)));
        Ok(reader)
    }
}
