//! # excelexport
//!
//! Render row streams and query results into styled Excel worksheets.
//!
//! ## Features
//!
//! - **Column configuration**: titles, explicit cell types, number formats,
//!   value formatters and post-write callbacks, keyed by letter (`"B"`) or
//!   by offset from a configurable start column
//! - **Derived defaults**: query-bound sheets take titles, formats and
//!   date conversions from model metadata; explicit settings merge over them
//! - **Streaming**: rows are pulled lazily and written straight into the
//!   compressed XLSX archive, query results are fetched in batches
//! - **Styles**: range-based style rules with deduplicated style records
//! - **Type detection**: numbers, formulas, error literals and dates are
//!   recognized; leading-zero codes stay text
//!
//! ## Quick Start
//!
//! ### Rendering rows into a worksheet
//!
//! ```rust
//! use excelexport::sheet::{ExcelSheet, Sheet};
//! use excelexport::style::CellStyle;
//! use excelexport::types::CellValue;
//! use excelexport::worksheet::MemoryWorksheet;
//!
//! # fn main() -> excelexport::Result<()> {
//! let rows = vec![
//!     vec![CellValue::from("Alice"), CellValue::from("00123"), CellValue::from(1200.5)],
//!     vec![CellValue::from("Bob"), CellValue::from("00456"), CellValue::from(980.0)],
//! ];
//! let mut sheet = ExcelSheet::with_rows(rows);
//! sheet
//!     .config_mut()
//!     .set_start_column("B")
//!     .set_titles(vec!["Name", "Code", "Salary"])
//!     .set_formats(excelexport::column::column_map::<_, _, String, _>([("D", "#,##0.00")]))
//!     .add_style("B1:D1", CellStyle::header_bold());
//!
//! let mut worksheet = MemoryWorksheet::new("People");
//! let summary = sheet.render(&mut worksheet)?;
//!
//! assert_eq!(summary.data_rows, 2);
//! assert_eq!(worksheet.value(1, 1).as_string(), "Name");
//! assert_eq!(worksheet.value(2, 2).as_string(), "00123");
//! # Ok(())
//! # }
//! ```
//!
//! ### Writing a file
//!
//! ```rust,no_run
//! use excelexport::file::ExcelFile;
//! use excelexport::sheet::ExcelSheet;
//! use excelexport::types::CellValue;
//!
//! # fn main() -> excelexport::Result<()> {
//! let rows = (1..=1000).map(|i| vec![CellValue::from(i), CellValue::from(format!("row {}", i))]);
//!
//! let mut file = ExcelFile::new();
//! file.add_sheet("Data", ExcelSheet::with_rows(rows));
//! file.save_as("data.xlsx")?;
//! # Ok(())
//! # }
//! ```

pub mod active;
pub mod column;
pub mod date;
pub mod error;
pub mod file;
pub mod property;
pub mod row;
pub mod sheet;
pub mod style;
pub mod types;
pub mod worksheet;
pub mod xlsx;

pub use active::{ActiveSheet, ActiveSheetOptions, RecordQuery};
pub use column::{CellRange, ColumnRef};
pub use error::{ErrorKind, ExportError, Result};
pub use file::{DownloadOptions, ExcelFile, FileOptions};
pub use sheet::{ExcelSheet, RenderSheet, RenderSummary, Sheet, SheetConfig, SheetOptions};
pub use style::CellStyle;
pub use types::{Cell, CellType, CellValue};
pub use worksheet::{MemoryWorksheet, Worksheet};
pub use xlsx::XlsxWorkbook;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_through_root_exports() {
        let mut sheet = ExcelSheet::with_rows(vec![vec![CellValue::from("42")]]);
        sheet.config_mut().set_start_column(ColumnRef::from("B"));

        let mut ws = MemoryWorksheet::default();
        let summary = Sheet::render(&mut sheet, &mut ws).unwrap();
        assert_eq!(summary.data_rows, 1);
        assert_eq!(ws.value(1, 1), &CellValue::Int(42));

        let err = sheet.render(&mut ws).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_send_file_through_root_exports() {
        let mut file = ExcelFile::new();
        file.push_sheet(ExcelSheet::with_rows(vec![vec![CellValue::from("x")]]));

        let mut bytes = Vec::new();
        let written = file.send(&mut bytes).unwrap();
        assert_eq!(written as usize, bytes.len());
        assert_eq!(&bytes[..2], b"PK");
        assert_eq!(file.sheet_titles(), vec!["Sheet1"]);
    }
}
