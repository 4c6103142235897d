//! Microsoft Office Excel Helpers
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::collections::HashMap;
use zip::ZipArchive;

/// XML tag name for relationship elements in Excel files
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Loads worksheet relationships from an Excel file
///
/// # Arguments
/// * `zip` - Zip archive handle
/// * `path` - Path to the relationships XML file within the archive
///
/// # Returns
/// Mapping of relationship IDs to worksheet paths
pub(super) fn load_relationships(zip: &mut ZipArchive<UnifiedReader>, path: &str) -> Result<HashMap<String, String>, SpreadsheetError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            // Only worksheet relationships matter
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Maps format indexes to cell types using custom and built-in formats
pub(super) fn load_number_formats(format_indexes: Vec<String>, custom_formats: HashMap<String, CellType>, is_1904: bool) -> Vec<CellType> {
    format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect()
}

/// Normalizes a relationship target to a path inside the workbook archive
pub(crate) fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(stripped) = path.strip_prefix("/xl/") {
        format!("xl/{stripped}")
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_paths() {
        assert_eq!(to_zip_path(Cow::from("worksheets/sheet1.xml")), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path(Cow::from("/xl/worksheets/sheet1.xml")), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path(Cow::from("xl/worksheets/sheet1.xml")), "xl/worksheets/sheet1.xml");
    }

    #[test]
    fn number_format_lookup() {
        let mut custom = HashMap::new();
        custom.insert("164".to_owned(), CellType::NumberDate1900);
        let formats = load_number_formats(
            vec!["0".to_owned(), "164".to_owned(), "22".to_owned()],
            custom,
            false,
        );
        assert_eq!(formats, vec![CellType::Number, CellType::NumberDate1900, CellType::NumberDateTime1900]);
    }
}
