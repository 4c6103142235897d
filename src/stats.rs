//! Numeric column previews used to draw bar charts.
use crate::table::Table;
use std::fmt::Write;

/// How many numeric columns a preview shows.
pub const PREVIEW_COLUMNS: usize = 2;

/// Raw values of one numeric column, nulls kept in place.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericSeries<'a> {
    pub name: &'a str,
    pub values: Vec<Option<f64>>,
}

/// The first two numeric columns of the table, in table order.
pub fn preview(table: &Table) -> Vec<NumericSeries<'_>> {
    table
        .columns()
        .iter()
        .filter(|column| column.is_numeric())
        .take(PREVIEW_COLUMNS)
        .map(|column| NumericSeries {
            name: column.name.as_str(),
            values: column.cells.iter().map(|cell| cell.as_number()).collect(),
        })
        .collect()
}

/// Renders a series as horizontal text bars scaled to `width` characters.
pub fn render_bars(series: &NumericSeries<'_>, width: usize) -> String {
    let maximum = series.values
        .iter()
        .flatten()
        .fold(0f64, |maximum, value| maximum.max(value.abs()));
    let mut text = String::new();
    let _ = writeln!(text, "{}", series.name);
    for (index, value) in series.values.iter().enumerate() {
        match value {
            Some(value) => {
                let length = if maximum > 0.0 {
                    (value.abs() / maximum * width as f64).round() as usize
                } else {
                    0
                };
                let _ = writeln!(text, "{:>5} | {} {}", index, "#".repeat(length), value);
            }
            None => {
                let _ = writeln!(text, "{:>5} |", index);
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;
    use crate::table::Column;

    #[test]
    fn first_two_numeric_columns() {
        let table = Table::new(vec![
            Column::new("Name", vec!["a".into(), "b".into()]),
            Column::new("Qty", vec![3.0.into(), CellValue::Null]),
            Column::new("Flag", vec![true.into(), false.into()]),
            Column::new("Price", vec![1.5.into(), 2.0.into()]),
            Column::new("Cost", vec![1.0.into(), 1.0.into()]),
        ]).unwrap();
        let series = preview(&table);
        assert_eq!(series, vec![
            NumericSeries { name: "Qty", values: vec![Some(3.0), None] },
            NumericSeries { name: "Price", values: vec![Some(1.5), Some(2.0)] },
        ]);
    }

    #[test]
    fn no_numeric_columns() {
        let table = Table::new(vec![Column::new("Name", vec!["a".into()])]).unwrap();
        assert!(preview(&table).is_empty());
        assert!(preview(&Table::default()).is_empty());
    }

    #[test]
    fn bars() {
        let series = NumericSeries { name: "Qty", values: vec![Some(4.0), None, Some(2.0)] };
        assert_eq!(render_bars(&series, 4), "Qty\n    0 | #### 4\n    1 |\n    2 | ## 2\n");
    }
}
