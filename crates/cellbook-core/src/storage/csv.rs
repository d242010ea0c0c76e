//! CSV import/export functionality

use crate::error::Result;
use crate::sheet::Sheet;
use cellbook_engine::engine::CellRef;
use std::io::Write;
use std::path::Path;

/// Read a CSV file into records of fields.
pub fn parse_csv(path: &Path) -> Result<Vec<Vec<String>>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_csv_records(&content))
}

/// Split CSV text into records. Quoted fields may contain commas, doubled
/// quotes and line breaks; unquoted fields are trimmed.
pub fn parse_csv_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut chars = content.chars().peekable();

    let finish_field = |current: &mut String, quoted: bool, fields: &mut Vec<String>| {
        if quoted {
            fields.push(std::mem::take(current));
        } else {
            fields.push(current.trim().to_string());
            current.clear();
        }
    };

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                // Check for escaped quote
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                field_was_quoted = true;
            }
            ',' => {
                finish_field(&mut current, field_was_quoted, &mut fields);
                field_was_quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                finish_field(&mut current, field_was_quoted, &mut fields);
                field_was_quoted = false;
                records.push(std::mem::take(&mut fields));
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() || field_was_quoted || !fields.is_empty() {
        finish_field(&mut current, field_was_quoted, &mut fields);
        records.push(fields);
    }
    records
}

/// Escape a field for CSV output
pub(crate) fn escape_csv_field(field: &str) -> String {
    let needs_quotes = field.contains([',', '"', '\n', '\r'])
        || field.trim() != field;
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render the used area of a sheet (from A1) as CSV, one line per row.
/// `field` picks the text written for each cell.
fn render_csv<F>(sheet: &Sheet, rows: Option<&[usize]>, field: F) -> String
where
    F: Fn(&CellRef) -> String,
{
    let Some(used) = sheet.used_range() else {
        return String::new();
    };
    let all_rows: Vec<usize> = (0..=used.end.row).collect();
    let rows = rows.unwrap_or(&all_rows);

    let mut out = String::new();
    for &row in rows.iter().filter(|row| **row <= used.end.row) {
        let fields: Vec<String> = (0..=used.end.col)
            .map(|col| escape_csv_field(&field(&CellRef::new(col, row))))
            .collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Export raw input (formulas included) so the CSV re-imports losslessly.
pub fn sheet_to_csv(sheet: &Sheet) -> String {
    render_csv(sheet, None, |cell_ref| {
        sheet
            .read(cell_ref)
            .map(|cell| cell.raw_input)
            .unwrap_or_default()
    })
}

/// Export what the user sees: computed values, only the rows that pass the
/// column filters.
pub fn visible_values_to_csv(sheet: &Sheet) -> String {
    let rows = sheet.visible_rows();
    render_csv(sheet, Some(&rows), |cell_ref| sheet.visible_value(cell_ref))
}

/// Write a sheet's raw input to a CSV file.
pub fn write_csv(path: &Path, sheet: &Sheet) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(sheet_to_csv(sheet).as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn line(text: &str) -> Vec<String> {
        let mut records = parse_csv_records(text);
        assert_eq!(records.len(), 1);
        records.remove(0)
    }

    #[test]
    fn test_parse_csv_line_simple() {
        assert_eq!(line("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_csv_line_quoted() {
        assert_eq!(line(r#"a,"hello, world",c"#), vec!["a", "hello, world", "c"]);
    }

    #[test]
    fn test_parse_csv_line_quoted_preserves_whitespace() {
        assert_eq!(line(r#""  keep me  ",x"#), vec!["  keep me  ", "x"]);
    }

    #[test]
    fn test_parse_csv_line_escaped_quotes() {
        assert_eq!(
            line(r#"a,"say ""hello""",c"#),
            vec!["a", r#"say "hello""#, "c"]
        );
    }

    #[test]
    fn test_parse_csv_records_multiline_and_crlf() {
        let records = parse_csv_records("a,\"two\nlines\"\r\n,x\r\n");
        assert_eq!(
            records,
            vec![
                vec!["a".to_string(), "two\nlines".to_string()],
                vec![String::new(), "x".to_string()],
            ]
        );
        assert!(parse_csv_records("").is_empty());
    }

    #[test]
    fn test_escape_csv_field() {
        assert_eq!(escape_csv_field("simple"), "simple");
        assert_eq!(escape_csv_field("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv_field("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv_field("two\nlines"), "\"two\nlines\"");
        assert_eq!(escape_csv_field(" padded"), "\" padded\"");
        assert_eq!(escape_csv_field("=SUM(A1:A2)"), "=SUM(A1:A2)");
    }

    #[test]
    fn test_sheet_to_csv_exports_raw_input_from_a1() {
        let mut sheet = Sheet::new(1, "Sheet1", 10, 10);
        sheet.write(CellRef::new(1, 1), "=1+2").unwrap();
        sheet.write(CellRef::new(0, 2), "a,b").unwrap();
        sheet.recalculate();
        assert_eq!(sheet_to_csv(&sheet), ",\n,=1+2\n\"a,b\",\n");
        assert_eq!(visible_values_to_csv(&sheet), ",\n,3\n\"a,b\",\n");
    }

    #[test]
    fn test_visible_values_skip_filtered_rows() {
        let mut sheet = Sheet::new(1, "Sheet1", 2, 5);
        sheet.write(CellRef::new(0, 0), "keep").unwrap();
        sheet.write(CellRef::new(0, 1), "hide").unwrap();
        sheet.write(CellRef::new(1, 2), "keep too").unwrap();
        sheet
            .set_column_filter(0, BTreeSet::from(["keep".to_string(), String::new()]))
            .unwrap();
        assert_eq!(visible_values_to_csv(&sheet), "keep,\n,keep too\n");
    }

    #[test]
    fn test_empty_sheet_exports_nothing() {
        let sheet = Sheet::new(1, "Sheet1", 2, 2);
        assert_eq!(sheet_to_csv(&sheet), "");
    }

    #[test]
    fn test_write_csv_file() {
        let mut sheet = Sheet::new(1, "Sheet1", 3, 3);
        sheet.write(CellRef::new(0, 0), "=1+2").unwrap();
        sheet.write(CellRef::new(1, 0), "text").unwrap();

        let output_path = std::env::temp_dir().join(format!(
            "cellbook_export_{}_{}_{:?}.csv",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            std::thread::current().id(),
        ));

        struct Cleanup(std::path::PathBuf);
        impl Drop for Cleanup {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.0);
            }
        }
        let _cleanup = Cleanup(output_path.clone());

        write_csv(&output_path, &sheet).unwrap();
        let records = parse_csv(&output_path).unwrap();
        assert_eq!(records, vec![vec!["=1+2".to_string(), "text".to_string()]]);
    }
}
