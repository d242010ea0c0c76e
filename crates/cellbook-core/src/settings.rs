//! Tunable limits and defaults.
//!
//! The binary fills this from `cellbook.toml`; missing keys keep their
//! defaults.

use serde::{Deserialize, Serialize};

/// Workbook limits and defaults shared by every editing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Undo records kept before the oldest are dropped
    pub history_capacity: usize,
    /// Size of new sheets
    pub default_columns: usize,
    pub default_rows: usize,
    /// Largest sheet a resize may produce
    pub max_columns: usize,
    pub max_rows: usize,
    /// Column width / row height clamp, in pixels
    pub min_column_width: f64,
    pub min_row_height: f64,
    pub max_dimension_size: f64,
    /// `error`, `warn`, `info`, `debug` or `trace`
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_capacity: 500,
            default_columns: 10,
            default_rows: 40,
            max_columns: 26,
            max_rows: 1000,
            min_column_width: 36.0,
            min_row_height: 18.0,
            max_dimension_size: 2000.0,
            log_level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Whether a sheet of this size is allowed.
    pub fn dimensions_allowed(&self, columns: usize, rows: usize) -> bool {
        (1..=self.max_columns).contains(&columns) && (1..=self.max_rows).contains(&rows)
    }

    pub fn clamp_column_width(&self, width: f64) -> f64 {
        width.clamp(self.min_column_width, self.max_dimension_size)
    }

    pub fn clamp_row_height(&self, height: f64) -> f64 {
        height.clamp(self.min_row_height, self.max_dimension_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_limits() {
        let settings = Settings::default();
        assert!(settings.dimensions_allowed(1, 1));
        assert!(settings.dimensions_allowed(26, 1000));
        assert!(!settings.dimensions_allowed(0, 10));
        assert!(!settings.dimensions_allowed(27, 10));
        assert!(!settings.dimensions_allowed(10, 1001));
    }

    #[test]
    fn test_size_clamps() {
        let settings = Settings::default();
        assert_eq!(settings.clamp_column_width(10.0), 36.0);
        assert_eq!(settings.clamp_column_width(120.0), 120.0);
        assert_eq!(settings.clamp_row_height(5000.0), 2000.0);
        assert_eq!(settings.clamp_row_height(2.0), 18.0);
    }
}
