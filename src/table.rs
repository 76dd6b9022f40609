use std::borrow::Cow;
use std::fmt::Write as _;

use crate::dataset::TabularDataset;

const NULL_MARKER: &str = "<null>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Renders an aligned text table: header, dashed separator, then rows.
/// Cells wider than their column are never truncated.
pub fn render_table(headers: &[String], rows: &[Vec<String>], aligns: &[Align]) -> String {
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, &[]));
    let separators = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separators, &widths, &[]));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, aligns));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>], aligns: &[Align]) {
    print!("{}", render_table(headers, rows, aligns));
}

/// Renders up to `limit` rows of a dataset; headers carry the column type
/// and numeric columns are right-aligned.
pub fn render_dataset(dataset: &TabularDataset, limit: usize) -> String {
    let headers = dataset
        .columns()
        .iter()
        .map(|c| format!("{} ({})", c.name, c.datatype))
        .collect::<Vec<_>>();
    let aligns = dataset
        .columns()
        .iter()
        .map(|c| {
            if c.datatype.is_numeric() {
                Align::Right
            } else {
                Align::Left
            }
        })
        .collect::<Vec<_>>();
    let rows = dataset
        .rows()
        .iter()
        .take(limit)
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Some(value) => value.as_display(),
                    None => NULL_MARKER.to_string(),
                })
                .collect()
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows, &aligns)
}

fn format_row(values: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (value, width))| {
            let sanitized = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
            match aligns.get(idx).copied().unwrap_or(Align::Left) {
                Align::Left => format!("{sanitized}{padding}"),
                Align::Right => format!("{padding}{sanitized}"),
            }
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    #[test]
    fn right_alignment_pads_on_the_left() {
        let headers = vec!["n".to_string(), "name".to_string()];
        let rows = vec![
            vec!["5".to_string(), "Al".to_string()],
            vec!["100".to_string(), "Bo".to_string()],
        ];
        let rendered = render_table(&headers, &rows, &[Align::Right, Align::Left]);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines, vec!["n    name", "---  ----", "  5  Al", "100  Bo"]);
    }

    #[test]
    fn dataset_rendering_marks_nulls_and_types() {
        let ds = TabularDataset::from_typed_rows(
            vec!["id".into(), "note".into()],
            vec![
                vec![Some(Value::Integer(1)), None],
                vec![Some(Value::Integer(2)), Some(Value::String("x\ny".into()))],
            ],
        )
        .expect("dataset");
        let rendered = render_dataset(&ds, 1);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id (integer)"));
        assert!(lines[2].ends_with("<null>"));
    }
}
