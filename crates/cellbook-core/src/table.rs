//! Formatted table regions.

use cellbook_engine::engine::CellRange;

/// A named colour preset for "insert table".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStyle {
    pub name: &'static str,
    pub header_color: &'static str,
    pub body_color: &'static str,
}

/// Built-in table presets.
pub const TABLE_STYLES: &[TableStyle] = &[
    TableStyle {
        name: "Blue",
        header_color: "#4472c4",
        body_color: "#d0e2ff",
    },
    TableStyle {
        name: "Green",
        header_color: "#70ad47",
        body_color: "#e2f0d9",
    },
    TableStyle {
        name: "Orange",
        header_color: "#ed7d31",
        body_color: "#fce4d6",
    },
    TableStyle {
        name: "Gray",
        header_color: "#5b9bd5",
        body_color: "#d9e2f3",
    },
    TableStyle {
        name: "Purple",
        header_color: "#7030a0",
        body_color: "#e3d9f3",
    },
    TableStyle {
        name: "Red",
        header_color: "#c00000",
        body_color: "#f4cccc",
    },
];

impl TableStyle {
    /// Look up a preset by (case-insensitive) name.
    pub fn by_name(name: &str) -> Option<TableStyle> {
        TABLE_STYLES
            .iter()
            .find(|style| style.name.eq_ignore_ascii_case(name))
            .copied()
    }
}

/// A rectangular region created by "insert table". The first row of `range`
/// is the header.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRegion {
    pub id: u64,
    pub range: CellRange,
    pub header_color: String,
    pub body_color: String,
    pub zebra: bool,
}

impl TableRegion {
    /// Whether `row` is a shaded body row (every other row below the header).
    pub fn is_banded_row(&self, row: usize) -> bool {
        self.zebra
            && row > self.range.start.row
            && row <= self.range.end.row
            && (row - self.range.start.row) % 2 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellbook_engine::engine::CellRef;

    #[test]
    fn test_preset_lookup() {
        let green = TableStyle::by_name("green").unwrap();
        assert_eq!(green.header_color, "#70ad47");
        assert_eq!(TABLE_STYLES.len(), 6);
        assert!(TableStyle::by_name("Teal").is_none());
    }

    #[test]
    fn test_banded_rows() {
        let table = TableRegion {
            id: 1,
            range: CellRange::from_corners(CellRef::new(0, 2), CellRef::new(3, 7)),
            header_color: "#4472c4".into(),
            body_color: "#d0e2ff".into(),
            zebra: true,
        };
        assert!(!table.is_banded_row(2));
        assert!(!table.is_banded_row(3));
        assert!(table.is_banded_row(4));
        assert!(table.is_banded_row(6));
        assert!(!table.is_banded_row(8));
    }
}
