//! Storage module for JSON workbooks and CSV import/export

mod csv;
mod json;

pub use csv::{parse_csv, parse_csv_records, sheet_to_csv, visible_values_to_csv, write_csv};
pub use json::{parse_json, workbook_from_json, workbook_to_json, write_json};
