use crate::error::WellSheetError;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::reference::in_bounds;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::reference::MAX_ROWS;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::ByteReader;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_RELATIONSHIP: &[u8] = b"Relationship";        // Package relationship
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");     // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");         // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                    // Text content within strings
const TAG_SHEET: QName = QName(b"sheet");               // Worksheet definition
const TAG_ROW: QName = QName(b"row");                   // Row in worksheet
const TAG_CELL: QName = QName(b"c");                    // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");          // Inline string value
const TAG_VALUE: QName = QName(b"v");                   // Cell value content

/// An Office Open XML workbook package
pub(crate) struct XlsxSpreadsheet<'a> {
    /// Package contents
    zip: ZipArchive<ByteReader<'a>>,
    /// Worksheets in workbook order as (name, zip_path) pairs
    sheets: Vec<(String, String)>,
}

impl<'a> XlsxSpreadsheet<'a> {
    /// Reads the workbook part and resolves worksheet locations.
    pub(crate) fn open(mut zip: ZipArchive<ByteReader<'a>>) -> Result<XlsxSpreadsheet<'a>, WellSheetError> {
        let sheets = load_workbook(&mut zip)?;
        Ok(XlsxSpreadsheet { zip, sheets })
    }
}

impl Spreadsheet for XlsxSpreadsheet<'_> {
    fn load_shared_strings(&mut self) -> Result<Vec<String>, WellSheetError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_reader("xl/sharedStrings.xml")? {
            Some(reader) => reader,
            None => return Ok(shared_strings),
        };
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
            }
        });
        Ok(shared_strings)
    }

    /// Reads every worksheet part. Cell positions come from the `r` references, falling
    /// back to document order when a row or cell omits them.
    fn read_sheets(&mut self, shared_strings: &[String]) -> Result<Vec<Sheet>, WellSheetError> {
        let mut sheets = Vec::<Sheet>::new();
        for (sheet_name, zip_path) in &self.sheets {
            let mut sheet = Sheet::new(sheet_name);
            let mut row_count = 0usize;
            let mut col_count = 0usize;
            let mut row = 0usize;
            let mut col = 0usize;
            let mut kind = CellType::default();
            let mut value = String::new();
            let mut reader = self.zip
                .xml_reader(zip_path)?
                .ok_or_else(|| SpreadsheetError::MissingPart(zip_path.to_owned()))?;
            match_xml_events!(reader => {
                Event::Start(event) if event.name() == TAG_ROW => {
                    if let Some(number) = event.get_attribute_value("r")? {
                        row_count = number
                            .parse::<usize>()
                            .ok()
                            .filter(|row| *row <= MAX_ROWS)
                            .ok_or_else(|| SpreadsheetError::CellOutOfRange(format!("row {number}")))?
                            .saturating_sub(1);
                    }
                    col_count = 0;
                }
                Event::End(event) if event.name() == TAG_ROW => {
                    row_count += 1;
                    col_count = 0;
                }
                Event::Start(event) if event.name() == TAG_CELL => {
                    (row, col) = match event.get_attribute_value("r")? {
                        Some(reference) => reference_to_index(&reference)
                            .ok_or_else(|| SpreadsheetError::CellOutOfRange(reference.to_string()))?,
                        None if in_bounds(row_count, col_count) => (row_count, col_count),
                        None => Err(SpreadsheetError::CellOutOfRange(index_to_reference(row_count, col_count)))?,
                    };
                    col_count = col + 1;
                    kind = event.get_attribute_value("t")?.map(|t| {
                        match t.as_ref() {
                            "inlineStr" | "str" => CellType::InlineString,
                            "s" => CellType::SharedString,
                            "d" => CellType::IsoDateTime,
                            "b" => CellType::Boolean,
                            "e" => CellType::Error,
                            _ => CellType::Number,
                        }
                    }).unwrap_or(CellType::Number);
                    value.clear();
                }
                Event::Start(event) if kind != CellType::Empty && event.name() == TAG_INLINE_STRING => {
                    value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
                }
                Event::Start(event) if kind != CellType::Empty && event.name() == TAG_VALUE => {
                    value = read_string_value(&mut reader, TAG_VALUE, true)?;
                }
                Event::End(event) if event.name() == TAG_CELL => {
                    let cell = Cell {
                        row,
                        col,
                        kind,
                        value: std::mem::take(&mut value),
                    };
                    if let Some(cell_value) = cell.into_value(shared_strings) {
                        sheet.push(row, col, cell_value);
                    }
                    kind = CellType::Empty;
                }
            });
            tracing::debug!(sheet = %sheet.name, rows = sheet.row_count(), "Read xlsx worksheet");
            sheets.push(sheet);
        }
        Ok(sheets)
    }
}

/// Loads worksheet names and part paths from `xl/workbook.xml`, in tab order.
fn load_workbook(zip: &mut ZipArchive<ByteReader<'_>>) -> Result<Vec<(String, String)>, WellSheetError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::MissingPart("xl/workbook.xml".to_owned()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                match relationships.get(id.as_ref()) {
                    Some(path) => sheets.push((name.to_string(), path.to_owned())),
                    None => tracing::warn!(sheet = %name, id = %id, "Worksheet relationship not found"),
                }
            }
        }
    });
    Ok(sheets)
}

/// Loads worksheet relationships, mapping relationship ids to part paths.
fn load_relationships(zip: &mut ZipArchive<ByteReader<'_>>, path: &str) -> Result<HashMap<String, String>, WellSheetError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::MissingPart(path.to_owned()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            // Chartsheets and dialog sheets carry no cell grid
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(&target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Resolves a relationship target against the `xl/` folder.
fn to_zip_path(path: &str) -> String {
    if let Some(absolute) = path.strip_prefix('/') {
        absolute.to_owned()
    } else if path.starts_with("xl/") {
        path.to_owned()
    } else {
        format!("xl/{path}")
    }
}

/// Reads string content up to `end_tag`, concatenating rich-text runs and skipping
/// phonetic annotations.
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, WellSheetError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_bytes_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&String::from_utf8_lossy(&event)),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::error::WellSheetError;
    use crate::spreadsheet::tests::package;
    use crate::spreadsheet::CellValue;
    use crate::spreadsheet::SpreadsheetError;
    use crate::spreadsheet::Workbook;

    const RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet2.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

    /// Builds an xlsx package from (sheet name, worksheet `sheetData` body) pairs and a
    /// shared string table.
    pub(crate) fn xlsx(sheets: &[(&str, &str)], shared_strings: &[&str]) -> Vec<u8> {
        let mut workbook = String::from(
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
        );
        let mut relationships = String::from(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
        let mut parts = Vec::<(String, String)>::new();
        for (index, (name, data)) in sheets.iter().enumerate() {
            let number = index + 1;
            workbook.push_str(&format!(r#"<sheet name="{name}" sheetId="{number}" r:id="rId{number}"/>"#));
            relationships.push_str(&format!(
                r#"<Relationship Id="rId{number}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{number}.xml"/>"#
            ));
            parts.push((
                format!("xl/worksheets/sheet{number}.xml"),
                format!(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{data}</sheetData></worksheet>"#),
            ));
        }
        workbook.push_str("</sheets></workbook>");
        relationships.push_str("</Relationships>");
        let strings: String = shared_strings.iter().map(|text| format!("<si><t>{text}</t></si>")).collect();
        parts.push(("xl/workbook.xml".to_owned(), workbook));
        parts.push(("xl/_rels/workbook.xml.rels".to_owned(), relationships));
        parts.push(("xl/sharedStrings.xml".to_owned(), format!("<sst>{strings}</sst>")));
        let borrowed: Vec<(&str, &str)> = parts.iter().map(|(name, content)| (name.as_str(), content.as_str())).collect();
        package(&borrowed)
    }

    #[test]
    fn read_cells_and_shared_strings() {
        let data = r#"
            <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="inlineStr"><is><t>GR</t></is></c></row>
            <row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>3000</v></c><c r="C2"><v>50.5</v></c></row>
            <row r="4"><c r="A4" t="b"><v>1</v></c><c r="C4" t="e"><v>#N/A</v></c><c r="D4" t="str"><v>x</v></c></row>
        "#;
        let bytes = xlsx(&[("Logs", data)], &["WELL_NAME", "DEPTH", "ABB-001"]);
        let workbook = Workbook::from_bytes(&bytes).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Logs"]);

        let sheet = &workbook.sheets[0];
        assert_eq!(sheet.row_count(), 4);
        assert_eq!(sheet.cell(0, 0), Some(&CellValue::from("WELL_NAME")));
        assert_eq!(sheet.cell(0, 2), Some(&CellValue::from("GR")));
        assert_eq!(sheet.cell(1, 0), Some(&CellValue::from("ABB-001")));
        assert_eq!(sheet.cell(1, 1), Some(&CellValue::from(3000)));
        assert_eq!(sheet.cell(1, 2), Some(&CellValue::from(50.5)));
        assert!(sheet.rows[2].is_empty());
        assert_eq!(sheet.cell(3, 0), Some(&CellValue::from("true")));
        assert_eq!(sheet.cell(3, 2), None);
        assert_eq!(sheet.cell(3, 3), Some(&CellValue::from("x")));
    }

    #[test]
    fn positions_without_references() {
        let data = r#"<row><c t="inlineStr"><is><t>a</t></is></c><c><v>1</v></c></row><row><c><v>2</v></c></row>"#;
        let workbook = Workbook::from_bytes(&xlsx(&[("S", data)], &[])).unwrap();
        let sheet = &workbook.sheets[0];
        assert_eq!(sheet.cell(0, 0), Some(&CellValue::from("a")));
        assert_eq!(sheet.cell(0, 1), Some(&CellValue::from(1)));
        assert_eq!(sheet.cell(1, 0), Some(&CellValue::from(2)));
    }

    #[test]
    fn rich_text_and_phonetic_runs() {
        let workbook = r#"<workbook xmlns:r="r"><sheets><sheet name="S" sheetId="1" r:id="rId1"/></sheets></workbook>"#;
        let relationships = r#"<Relationships><Relationship Id="rId1" Type="x/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;
        let sheet = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c></row></sheetData></worksheet>"#;
        let strings = r#"<sst><si><r><t>Nama </t></r><r><t>Sumur</t></r><rPh><t>x</t></rPh></si></sst>"#;
        let bytes = package(&[
            ("xl/workbook.xml", workbook),
            ("xl/_rels/workbook.xml.rels", relationships),
            ("xl/worksheets/sheet1.xml", sheet),
            ("xl/sharedStrings.xml", strings),
        ]);
        let workbook = Workbook::from_bytes(&bytes).unwrap();
        assert_eq!(workbook.sheets[0].cell(0, 0), Some(&CellValue::from("Nama Sumur")));
    }

    #[test]
    fn sheet_order_and_absolute_targets() {
        let sheet = "<worksheet><sheetData><row r=\"1\"><c r=\"A1\"><v>1</v></c></row></sheetData></worksheet>";
        let workbook = r#"<workbook xmlns:r="r"><sheets><sheet name="Second" sheetId="2" r:id="rId2"/><sheet name="First" sheetId="1" r:id="rId1"/><sheet name="Chart" sheetId="3" r:id="rId3"/></sheets></workbook>"#;
        let bytes = package(&[
            ("xl/workbook.xml", workbook),
            ("xl/_rels/workbook.xml.rels", RELATIONSHIPS),
            ("xl/worksheets/sheet1.xml", sheet),
            ("xl/worksheets/sheet2.xml", sheet),
        ]);
        let workbook = Workbook::from_bytes(&bytes).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Second", "First"]);
    }

    #[test]
    fn missing_worksheet_part() {
        let workbook = r#"<workbook xmlns:r="r"><sheets><sheet name="S" sheetId="1" r:id="rId1"/></sheets></workbook>"#;
        let bytes = package(&[
            ("xl/workbook.xml", workbook),
            ("xl/_rels/workbook.xml.rels", RELATIONSHIPS),
        ]);
        assert!(Workbook::from_bytes(&bytes).is_err());
    }

    #[test]
    fn cells_past_worksheet_limits() {
        for data in [
            r#"<row r="1"><c r="A1"><v>1</v></c><c r="AAAAAAAAAAAAAAA1"><v>1</v></c></row>"#,
            r#"<row r="1"><c r="A18446744073709551615"><v>1</v></c></row>"#,
            r#"<row r="1"><c r="A1000000000"><v>1</v></c></row>"#,
            r#"<row r="1"><c r="XFE1"><v>1</v></c></row>"#,
            r#"<row r="1048577"><c><v>1</v></c></row>"#,
            r#"<row r="99999999999999999999999"><c><v>1</v></c></row>"#,
        ] {
            let error = Workbook::from_bytes(&xlsx(&[("S", data)], &[])).unwrap_err();
            assert!(
                matches!(error, WellSheetError::SpreadsheetError(SpreadsheetError::CellOutOfRange(_))),
                "{data}: {error:?}"
            );
        }
    }

    #[test]
    fn cells_at_worksheet_limits() {
        let data = r#"<row r="1048576"><c r="XFD1048576"><v>7</v></c></row>"#;
        let workbook = Workbook::from_bytes(&xlsx(&[("S", data)], &[])).unwrap();
        let sheet = &workbook.sheets[0];
        assert_eq!(sheet.row_count(), 1 << 20);
        assert_eq!(sheet.cell((1 << 20) - 1, (1 << 14) - 1), Some(&CellValue::from(7)));
    }

    #[test]
    fn zip_paths() {
        assert_eq!(super::to_zip_path("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(super::to_zip_path("/xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(super::to_zip_path("xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
    }
}
