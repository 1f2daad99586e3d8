//! Worksheet sink abstraction and an in-memory implementation

use std::collections::BTreeMap;

use crate::column::{CellRange, MAX_COLUMNS, MAX_ROWS};
use crate::error::{ExportError, Result};
use crate::style::CellStyle;
use crate::types::{Cell, CellType, CellValue};

/// Maximum sheet title length in characters
pub const MAX_TITLE_LEN: usize = 31;
const INVALID_TITLE_CHARS: &[char] = &['*', ':', '?', '/', '\\', '[', ']'];

/// Check a sheet title against the spreadsheet naming rules
pub fn validate_sheet_title(title: &str) -> Result<()> {
    let invalid = |reason: &str| ExportError::InvalidSheetTitle {
        title: title.to_string(),
        reason: reason.to_string(),
    };

    if title.trim().is_empty() {
        return Err(invalid("title is empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(invalid("title is longer than 31 characters"));
    }
    if let Some(c) = title.chars().find(|c| INVALID_TITLE_CHARS.contains(c)) {
        return Err(invalid(&format!("character '{}' is not allowed", c)));
    }
    if title.starts_with('\'') || title.ends_with('\'') {
        return Err(invalid("title can not start or end with an apostrophe"));
    }
    Ok(())
}

pub(crate) fn check_bounds(column: u32, row: u32) -> Result<()> {
    if row == 0 || row > MAX_ROWS || column >= MAX_COLUMNS {
        return Err(ExportError::CellOutOfBounds { column, row });
    }
    Ok(())
}

/// Target of sheet rendering
///
/// Columns are 0-based, rows 1-based.
pub trait Worksheet {
    fn title(&self) -> &str;

    fn set_title(&mut self, title: &str) -> Result<()>;

    /// Cell at the given position, created empty on first access
    fn cell_mut(&mut self, column: u32, row: u32) -> Result<&mut Cell>;

    /// Style every cell in `range`; later calls win per property
    fn apply_style(&mut self, range: &CellRange, style: &CellStyle) -> Result<()>;

    /// Store a value through detection
    fn set_cell_value(&mut self, column: u32, row: u32, value: CellValue) -> Result<&mut Cell> {
        let cell = self.cell_mut(column, row)?;
        cell.set_value(value);
        Ok(cell)
    }

    /// Store a value coerced to an explicit type
    fn set_cell_value_explicit(
        &mut self,
        column: u32,
        row: u32,
        value: CellValue,
        ty: CellType,
    ) -> Result<&mut Cell> {
        let cell = self.cell_mut(column, row)?;
        cell.set_value_explicit(value, ty)?;
        Ok(cell)
    }

    fn set_number_format(&mut self, column: u32, row: u32, code: &str) -> Result<()> {
        self.cell_mut(column, row)?.set_number_format(code);
        Ok(())
    }
}

/// Whole-grid worksheet kept in memory
#[derive(Debug, Clone)]
pub struct MemoryWorksheet {
    title: String,
    /// Keyed by (row, column) so iteration is row-major
    cells: BTreeMap<(u32, u32), Cell>,
    styles: Vec<(CellRange, CellStyle)>,
}

impl Default for MemoryWorksheet {
    fn default() -> Self {
        MemoryWorksheet::new("Sheet1")
    }
}

impl MemoryWorksheet {
    pub fn new(title: impl Into<String>) -> Self {
        MemoryWorksheet {
            title: title.into(),
            cells: BTreeMap::new(),
            styles: Vec::new(),
        }
    }

    pub fn cell(&self, column: u32, row: u32) -> Option<&Cell> {
        self.cells.get(&(row, column))
    }

    /// Cell by coordinate such as `"B3"`
    pub fn cell_at(&self, coordinate: &str) -> Option<&Cell> {
        let (column, row) = crate::column::parse_coordinate(coordinate).ok()?;
        self.cell(column, row)
    }

    pub fn value(&self, column: u32, row: u32) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.cell(column, row).map_or(EMPTY, Cell::value)
    }

    /// Cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Values of one row from column 0 up to its last populated column
    pub fn row_values(&self, row: u32) -> Vec<CellValue> {
        let Some(last) = self
            .cells
            .range((row, 0)..=(row, u32::MAX))
            .map(|(&(_, column), _)| column)
            .last()
        else {
            return Vec::new();
        };
        (0..=last)
            .map(|column| self.value(column, row).clone())
            .collect()
    }

    /// Highest row holding a cell, 0 for an empty sheet
    pub fn highest_row(&self) -> u32 {
        self.cells.keys().next_back().map_or(0, |&(row, _)| row)
    }

    /// Highest column holding a cell
    pub fn highest_column(&self) -> Option<u32> {
        self.cells.keys().map(|&(_, column)| column).max()
    }

    /// Style rules in the order they were applied
    pub fn style_rules(&self) -> &[(CellRange, CellStyle)] {
        &self.styles
    }

    /// Range styles covering the cell merged in order, then the cell's own.
    pub fn effective_style(&self, column: u32, row: u32) -> CellStyle {
        let mut style = range_style(&self.styles, column, row);
        if let Some(cell) = self.cell(column, row) {
            style.merge(&cell.own_style());
        }
        style
    }
}

/// Merge every rule covering the cell, in rule order
pub(crate) fn range_style(rules: &[(CellRange, CellStyle)], column: u32, row: u32) -> CellStyle {
    rules
        .iter()
        .filter(|(range, _)| range.contains(column, row))
        .fold(CellStyle::default(), |acc, (_, style)| acc.merged(style))
}

impl Worksheet for MemoryWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        validate_sheet_title(title)?;
        self.title = title.to_string();
        Ok(())
    }

    fn cell_mut(&mut self, column: u32, row: u32) -> Result<&mut Cell> {
        check_bounds(column, row)?;
        Ok(self
            .cells
            .entry((row, column))
            .or_insert_with(|| Cell::new(column, row)))
    }

    fn apply_style(&mut self, range: &CellRange, style: &CellStyle) -> Result<()> {
        check_bounds(range.last_column, range.last_row)?;
        style.validate()?;
        self.styles.push((*range, style.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sheet_title() {
        assert!(validate_sheet_title("Users 2024").is_ok());
        assert!(validate_sheet_title(&"x".repeat(31)).is_ok());
        assert!(validate_sheet_title(&"x".repeat(32)).is_err());
        assert!(validate_sheet_title("").is_err());
        assert!(validate_sheet_title("'quoted'").is_err());
        for bad in ["a*b", "a:b", "a?b", "a/b", "a\\b", "a[b", "a]b"] {
            assert!(
                matches!(
                    validate_sheet_title(bad),
                    Err(ExportError::InvalidSheetTitle { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_set_and_read_values() {
        let mut ws = MemoryWorksheet::new("Data");
        ws.set_cell_value(1, 2, CellValue::from("15")).unwrap();
        ws.set_cell_value_explicit(2, 2, CellValue::from("15"), CellType::String)
            .unwrap();

        assert_eq!(ws.value(1, 2), &CellValue::Int(15));
        assert_eq!(ws.value(2, 2), &CellValue::from("15"));
        assert_eq!(ws.cell_at("B2").map(Cell::value), Some(&CellValue::Int(15)));
        assert_eq!(ws.value(0, 2), &CellValue::Empty);
        assert_eq!(
            ws.row_values(2),
            vec![CellValue::Empty, CellValue::Int(15), CellValue::from("15")]
        );
        assert_eq!(ws.highest_row(), 2);
        assert_eq!(ws.highest_column(), Some(2));
    }

    #[test]
    fn test_bounds() {
        let mut ws = MemoryWorksheet::default();
        assert!(matches!(
            ws.cell_mut(0, 0),
            Err(ExportError::CellOutOfBounds { column: 0, row: 0 })
        ));
        assert!(ws.cell_mut(MAX_COLUMNS, 1).is_err());
        assert!(ws.cell_mut(MAX_COLUMNS - 1, MAX_ROWS).is_ok());
    }

    #[test]
    fn test_effective_style_order() {
        let mut ws = MemoryWorksheet::default();
        ws.apply_style(
            &CellRange::parse("A1:C3").unwrap(),
            &CellStyle::new().bold(true).font_size(10),
        )
        .unwrap();
        ws.apply_style(
            &CellRange::parse("B2").unwrap(),
            &CellStyle::new().font_size(16),
        )
        .unwrap();
        ws.set_number_format(1, 2, "0.00").unwrap();

        let style = ws.effective_style(1, 2);
        assert_eq!(style.bold, Some(true));
        assert_eq!(style.font_size, Some(16));
        assert_eq!(style.number_format.as_deref(), Some("0.00"));

        assert_eq!(ws.effective_style(0, 1).font_size, Some(10));
        assert!(ws.effective_style(4, 4).is_default());
    }

    #[test]
    fn test_set_title() {
        let mut ws = MemoryWorksheet::default();
        ws.set_title("Report").unwrap();
        assert_eq!(ws.title(), "Report");
        assert!(ws.set_title("bad/title").is_err());
        assert_eq!(ws.title(), "Report");
    }
}
