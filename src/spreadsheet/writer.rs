//! Minimal `.xlsx` writer: one worksheet, header row, inline strings.
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::SpreadsheetError;
use crate::table::CellValue;
use crate::table::Table;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Writer;
use std::io::Cursor;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

const NAMESPACE: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Serializes a table as a single-sheet `.xlsx` workbook.
///
/// Row 1 holds the column names, null cells are omitted. Non-finite numbers
/// have no representation in the format and are rejected.
pub fn write_workbook(table: &Table) -> Result<Vec<u8>, SpreadsheetError> {
    let sheet = write_sheet(table)?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELATIONSHIPS.as_bytes()),
        ("xl/workbook.xml", WORKBOOK.as_bytes()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELATIONSHIPS.as_bytes()),
        ("xl/worksheets/sheet1.xml", sheet.as_slice()),
    ] {
        zip.start_file(name, options)?;
        zip.write_all(content)?;
    }
    Ok(zip.finish()?.into_inner())
}

fn write_sheet(table: &Table) -> Result<Vec<u8>, SpreadsheetError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(BytesStart::new("worksheet").with_attributes([("xmlns", NAMESPACE)])))?;
    writer.write_event(Event::Start(BytesStart::new("sheetData")))?;

    let header: Vec<CellValue> = table.column_names().into_iter().map(CellValue::from).collect();
    write_row(&mut writer, table, 0, header.iter())?;
    for (index, row) in table.rows().enumerate() {
        write_row(&mut writer, table, index + 1, row.into_iter())?;
    }

    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
    writer.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(writer.into_inner())
}

fn write_row<'a>(
    writer: &mut Writer<Vec<u8>>,
    table: &Table,
    row: usize,
    cells: impl Iterator<Item = &'a CellValue>,
) -> Result<(), SpreadsheetError> {
    let number = (row + 1).to_string();
    writer.write_event(Event::Start(BytesStart::new("row").with_attributes([("r", number.as_str())])))?;
    for (col, value) in cells.enumerate() {
        let reference = index_to_reference(row, col);
        let mut cell = BytesStart::new("c");
        cell.push_attribute(("r", reference.as_str()));
        match value {
            CellValue::Null => continue,
            CellValue::Boolean(flag) => {
                cell.push_attribute(("t", "b"));
                write_value(writer, cell, "v", if *flag { "1" } else { "0" })?;
            }
            CellValue::Number(number) if number.is_finite() => {
                write_value(writer, cell, "v", &number.to_string())?;
            }
            CellValue::Number(number) => {
                let name = table.columns().get(col).map(|column| column.name.as_str()).unwrap_or_default();
                Err(SpreadsheetError::UnsupportedValueError(name.to_owned(), format!("number {number} at {reference}")))?
            }
            CellValue::Text(text) => {
                cell.push_attribute(("t", "inlineStr"));
                writer.write_event(Event::Start(cell))?;
                writer.write_event(Event::Start(BytesStart::new("is")))?;
                let tag = BytesStart::new("t").with_attributes([("xml:space", "preserve")]);
                write_value_tag(writer, tag, "t", text)?;
                writer.write_event(Event::End(BytesEnd::new("is")))?;
                writer.write_event(Event::End(BytesEnd::new("c")))?;
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new("row")))?;
    Ok(())
}

/// Writes `<c ...><tag>text</tag></c>`.
fn write_value(writer: &mut Writer<Vec<u8>>, cell: BytesStart, tag: &str, text: &str) -> Result<(), SpreadsheetError> {
    writer.write_event(Event::Start(cell))?;
    write_value_tag(writer, BytesStart::new(tag), tag, text)?;
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

fn write_value_tag(writer: &mut Writer<Vec<u8>>, start: BytesStart, tag: &str, text: &str) -> Result<(), SpreadsheetError> {
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use zip::ZipArchive;
    use std::io::Read;

    fn sheet_xml(bytes: Vec<u8>) -> String {
        let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        zip.by_name("xl/worksheets/sheet1.xml").unwrap().read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn sheet_markup() {
        let table = Table::new(vec![
            Column::new("N", vec![CellValue::Number(3.0), CellValue::Null]),
            Column::new("S", vec![CellValue::from("a<b"), CellValue::Boolean(true)]),
        ]).unwrap();
        let xml = sheet_xml(write_workbook(&table).unwrap());
        assert!(xml.contains(r#"<c r="A1" t="inlineStr"><is><t xml:space="preserve">N</t></is></c>"#));
        assert!(xml.contains(r#"<c r="A2"><v>3</v></c>"#));
        assert!(xml.contains(r#"<t xml:space="preserve">a&lt;b</t>"#));
        assert!(xml.contains(r#"<c r="B3" t="b"><v>1</v></c>"#));
        assert!(!xml.contains(r#"r="A3""#));
    }

    #[test]
    fn package_parts() {
        let table = Table::new(vec![Column::new("X", vec![])]).unwrap();
        let zip = ZipArchive::new(Cursor::new(write_workbook(&table).unwrap())).unwrap();
        let mut names: Vec<&str> = zip.file_names().collect();
        names.sort();
        assert_eq!(names, vec![
            "[Content_Types].xml",
            "_rels/.rels",
            "xl/_rels/workbook.xml.rels",
            "xl/workbook.xml",
            "xl/worksheets/sheet1.xml",
        ]);
    }

    #[test]
    fn non_finite_numbers_rejected() {
        let table = Table::new(vec![Column::new("Ratio", vec![CellValue::Number(f64::NAN)])]).unwrap();
        let result = write_workbook(&table);
        assert!(matches!(result, Err(SpreadsheetError::UnsupportedValueError(name, _)) if name == "Ratio"));
    }
}
