//! CSV export of the filtered result set.

use std::fmt::Write;

use super::columns::Column;
use super::resolve::CellValue;

/// Quote a value containing a comma, quote or newline, doubling embedded quotes.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Render a header of column names followed by one line per row.
///
/// `cell` resolves the value of one column for one row.
pub fn export_csv<'a, R, F>(columns: &[&Column], rows: impl IntoIterator<Item = &'a R>, cell: F) -> String
where
    R: 'a,
    F: Fn(&R, &Column) -> CellValue,
{
    let mut output = columns
        .iter()
        .map(|c| escape_csv(&c.name))
        .collect::<Vec<_>>()
        .join(",");

    for row in rows {
        let line = columns
            .iter()
            .map(|c| escape_csv(&cell(row, c).to_string()))
            .collect::<Vec<_>>()
            .join(",");
        write!(output, "\n{}", line).ok();
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_export_rows() {
        let id = Column::standard("Id", "Document ID");
        let title = Column::standard("Title", "Title");
        let rows = vec![(1.0, "Plain"), (2.0, "Smith, J.")];
        let csv = export_csv(&[&id, &title], &rows, |row, col| match col.name.as_str() {
            "Id" => CellValue::Number(row.0),
            _ => CellValue::Text(row.1.to_string()),
        });
        assert_eq!(csv, "Id,Title\n1,Plain\n2,\"Smith, J.\"");
    }
}
