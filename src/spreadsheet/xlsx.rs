use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufReader;
use tracing::debug;
use zip::read::ZipFile;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_VALUE: QName = QName(b"v");                 // Cell value content

/// An opened `.xlsx` workbook
pub(crate) struct XlsxWorkbook {
    /// ZIP archive containing the workbook parts
    zip: ZipArchive<UnifiedReader>,
    /// Parsed number formats for cell type detection
    number_formats: Vec<CellType>,
    /// List of worksheets with (name, zip_path) pairs, in workbook order
    sheets: Vec<(String, String)>,
}

impl XlsxWorkbook {
    /// Opens a workbook and parses its structure
    pub(crate) fn open(reader: UnifiedReader) -> Result<XlsxWorkbook, SpreadsheetError> {
        let mut zip = ZipArchive::new(reader)?;
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError)?
        }
        let number_formats = load_number_formats(&mut zip, is_1904)?;
        Ok(XlsxWorkbook {
            zip,
            number_formats,
            sheets,
        })
    }

    /// Worksheet names in workbook order
    pub(crate) fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Loads the shared string table
    pub(crate) fn load_shared_strings(&mut self) -> Result<Vec<String>, SpreadsheetError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_reader("xl/sharedStrings.xml")? {
            Some(reader) => reader,
            None => return Ok(shared_strings),
        };
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
                shared_strings.push(string);
            }
        });
        Ok(shared_strings)
    }

    /// Reads the first worksheet. Other worksheets are never opened.
    pub(crate) fn read_first_sheet(&mut self) -> Result<Sheet, SpreadsheetError> {
        let (sheet_name, zip_path) = self.sheets
            .first()
            .cloned()
            .ok_or(SpreadsheetError::SpreadsheetEmptyError)?;
        if self.sheets.len() > 1 {
            debug!("workbook sheets {:?}, reading only '{}'", self.sheet_names(), sheet_name);
        }

        let mut sheet = Sheet::new(&sheet_name);
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut reader = self.zip
            .xml_reader(&zip_path)?
            .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                if let Some(number) = event.get_attribute_value("r")? {
                    row_count = number.parse::<usize>()?.saturating_sub(1);
                }
                col_count = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => {
                row_count += 1;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row_count, col_count));
                col_count = col + 1;
                value.clear();
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
                if let Some(format_id) = event.get_attribute_value("s")? {
                    if kind == CellType::Number && !format_id.is_empty() {
                        let index = format_id.parse::<usize>()?;
                        kind = self.number_formats.get(index).copied().unwrap_or(CellType::Number);
                    }
                }
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if event.name() == TAG_CELL => {
                if !value.is_empty() && kind != CellType::Error {
                    sheet.push(Cell {
                        row,
                        col,
                        kind,
                        value: std::mem::take(&mut value),
                    });
                }
                kind = CellType::default();
            }
        });
        Ok(sheet)
    }
}

/// Loads workbook structure and worksheet information
///
/// Parses `xl/workbook.xml` for worksheet names and their part paths, and
/// determines the date system (1900 vs 1904) used in the file.
fn load_workbook(zip: &mut ZipArchive<UnifiedReader>) -> Result<(Vec<(String, String)>, bool), SpreadsheetError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.unescape_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.unescape_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads number formats and cell styles from `xl/styles.xml`
///
/// Returns the cell type for each style index, so numeric cells carrying a
/// date or time format can be rendered as such.
fn load_number_formats(zip: &mut ZipArchive<UnifiedReader>, is_1904: bool) -> Result<Vec<CellType>, SpreadsheetError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();

    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                let style = CellType::parse_custom_number_format(&format, is_1904);
                custom_formats.insert(id.to_string(), style);
            }
        }

        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = false,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?;
            format_indexes.push(id.map(|id| id.to_string()).unwrap_or_else(|| "0".to_owned()));
        }
    });

    Ok(excel::load_number_formats(format_indexes, custom_formats, is_1904))
}

/// Reads string value from XML content, handling text and CDATA sections
///
/// Skips phonetic text annotations. When `is_text_content` is set the element
/// body itself is the text (as in `<v>`), otherwise only `<t>` children count.
fn read_string_value(
    reader: &mut XmlReader<BufReader<ZipFile<'_, UnifiedReader>>>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, SpreadsheetError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="First" sheetId="1" r:id="rId1"/><sheet name="Second" sheetId="2" r:id="rId2"/></sheets>
</workbook>"#;

    const RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="1"><numFmt numFmtId="164" formatCode="dd/mm/yyyy"/></numFmts>
<cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="164"/></cellXfs>
</styleSheet>"#;

    const SHARED_STRINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<si><t>Code</t></si><si><t>Date</t></si><si><r><t>Na</t></r><r><t>me</t></r><rPh><t>ignored</t></rPh></si><si><t>Caf&amp;e</t></si>
</sst>"#;

    const SHEET1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c></row>
<row r="2"><c r="A2"><v>7</v></c><c r="B2" s="1"><v>45000</v></c><c r="C2" t="s"><v>3</v></c></row>
<row r="3"><c r="A3" t="e"><v>#N/A</v></c><c r="C3" t="inlineStr"><is><t>x</t></is></c></row>
</sheetData></worksheet>"#;

    const SHEET2: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>Other</t></is></c></row>
</sheetData></worksheet>"#;

    fn workbook_bytes(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn sample() -> Vec<u8> {
        workbook_bytes(&[
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", RELATIONSHIPS),
            ("xl/styles.xml", STYLES),
            ("xl/sharedStrings.xml", SHARED_STRINGS),
            ("xl/worksheets/sheet1.xml", SHEET1),
            ("xl/worksheets/sheet2.xml", SHEET2),
        ])
    }

    #[test]
    fn workbook_structure() {
        let mut workbook = XlsxWorkbook::open(UnifiedReader::from_bytes(sample())).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["First", "Second"]);
        assert_eq!(workbook.number_formats, vec![CellType::Number, CellType::NumberDate1900]);
        assert_eq!(workbook.load_shared_strings().unwrap(), vec!["Code", "Date", "Name", "Caf&e"]);
    }

    #[test]
    fn reads_only_first_sheet() {
        let mut workbook = XlsxWorkbook::open(UnifiedReader::from_bytes(sample())).unwrap();
        let shared_strings = workbook.load_shared_strings().unwrap();
        let table = workbook.read_first_sheet().unwrap().into_table(&shared_strings).unwrap();
        assert_eq!(table.column_names(), vec!["Code", "Date", "Name"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("Code").unwrap().cells, vec![CellValue::Number(7.0), CellValue::Null]);
        assert_eq!(table.column("Date").unwrap().cells, vec![CellValue::from("2023-03-15"), CellValue::Null]);
        assert_eq!(table.column("Name").unwrap().cells, vec![CellValue::from("Caf&e"), CellValue::from("x")]);
    }

    #[test]
    fn missing_workbook_part() {
        let bytes = workbook_bytes(&[("xl/_rels/workbook.xml.rels", RELATIONSHIPS)]);
        let result = XlsxWorkbook::open(UnifiedReader::from_bytes(bytes));
        assert!(matches!(result, Err(SpreadsheetError::FileError(_))));
    }
}
