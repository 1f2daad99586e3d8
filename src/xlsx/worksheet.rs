//! Row-window worksheet stream
//!
//! Only the row currently being written is kept in memory. Moving to a later
//! row serializes the open row (plus any styled rows skipped on the way) into
//! `pending`, which the workbook hands to the compressor right away.

use std::collections::{BTreeMap, BTreeSet};

use super::styles::StyleTable;
use super::xml_writer::escape_into;
use crate::column::{push_column_label, CellRange};
use crate::date::{date_serial, excel_serial};
use crate::error::{ExportError, Result};
use crate::style::CellStyle;
use crate::types::{Cell, CellValue};
use crate::worksheet::{check_bounds, range_style};

pub(crate) const SHEET_HEADER: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheetData>"#;

pub(crate) const SHEET_FOOTER: &[u8] = b"</sheetData></worksheet>";

struct OpenRow {
    row: u32,
    cells: BTreeMap<u32, Cell>,
}

/// Streaming state of one worksheet
pub(crate) struct SheetStream {
    pub(crate) title: String,
    open: Option<OpenRow>,
    /// Last row serialized, 0 before the first
    flushed: u32,
    rules: Vec<(CellRange, CellStyle)>,
    pub(crate) pending: Vec<u8>,
    rows_written: u32,
}

impl SheetStream {
    pub(crate) fn new(title: String) -> Self {
        SheetStream {
            title,
            open: None,
            flushed: 0,
            rules: Vec::new(),
            pending: Vec::with_capacity(4096),
            rows_written: 0,
        }
    }

    /// Number of `<row>` elements serialized so far
    pub(crate) fn rows_written(&self) -> u32 {
        self.rows_written
    }

    pub(crate) fn add_rule(&mut self, range: &CellRange, style: &CellStyle) -> Result<()> {
        check_bounds(range.last_column, range.last_row)?;
        style.validate()?;
        let earliest_open = self.open.as_ref().map_or(self.flushed + 1, |open| open.row);
        if range.first_row < earliest_open {
            return Err(ExportError::RowFlushed {
                row: range.first_row,
            });
        }
        self.rules.push((*range, style.clone()));
        Ok(())
    }

    /// Make `row` the open row, serializing everything before it
    pub(crate) fn advance_to(&mut self, row: u32, styles: &mut StyleTable) -> Result<()> {
        match &self.open {
            Some(open) if open.row == row => return Ok(()),
            Some(open) if row < open.row => return Err(ExportError::RowFlushed { row }),
            None if row <= self.flushed => return Err(ExportError::RowFlushed { row }),
            _ => {}
        }

        self.flush_open(styles)?;
        self.flush_styled_gap(row, styles)?;
        self.open = Some(OpenRow {
            row,
            cells: BTreeMap::new(),
        });
        Ok(())
    }

    /// Cell in the open row; call [`advance_to`](Self::advance_to) first
    pub(crate) fn open_cell(&mut self, column: u32, row: u32) -> Result<&mut Cell> {
        match &mut self.open {
            Some(open) if open.row == row => Ok(open
                .cells
                .entry(column)
                .or_insert_with(|| Cell::new(column, row))),
            _ => Err(ExportError::RowFlushed { row }),
        }
    }

    /// Serialize the open row, the styled rows below it and close the sheet
    pub(crate) fn finish(&mut self, styles: &mut StyleTable) -> Result<()> {
        self.flush_open(styles)?;
        let last_styled = self
            .rules
            .iter()
            .map(|(range, _)| range.last_row)
            .max()
            .unwrap_or(0);
        if last_styled > self.flushed {
            self.flush_styled_gap(last_styled + 1, styles)?;
            self.flushed = last_styled;
        }
        self.pending.extend_from_slice(SHEET_FOOTER);
        Ok(())
    }

    fn flush_open(&mut self, styles: &mut StyleTable) -> Result<()> {
        if let Some(open) = self.open.take() {
            self.write_row(open.row, &open.cells, styles)?;
            self.flushed = open.row;
        }
        Ok(())
    }

    /// Rows between the last flushed row and `row` that only carry styles
    fn flush_styled_gap(&mut self, row: u32, styles: &mut StyleTable) -> Result<()> {
        let empty = BTreeMap::new();
        for gap in (self.flushed + 1)..row {
            if self.rules.iter().any(|(range, _)| range.covers_row(gap)) {
                self.write_row(gap, &empty, styles)?;
            }
        }
        Ok(())
    }

    fn write_row(
        &mut self,
        row: u32,
        cells: &BTreeMap<u32, Cell>,
        styles: &mut StyleTable,
    ) -> Result<()> {
        let mut columns: BTreeSet<u32> = cells.keys().copied().collect();
        for (range, _) in self.rules.iter().filter(|(range, _)| range.covers_row(row)) {
            columns.extend(range.first_column..=range.last_column);
        }
        if columns.is_empty() {
            return Ok(());
        }

        let mut num = itoa::Buffer::new();
        let buf = &mut self.pending;
        buf.extend_from_slice(b"<row r=\"");
        buf.extend_from_slice(num.format(row).as_bytes());
        buf.extend_from_slice(b"\">");

        for column in columns {
            let mut style = range_style(&self.rules, column, row);
            let cell = cells.get(&column);
            if let Some(cell) = cell {
                style.merge(&cell.own_style());
            }
            let xf = styles.xf_id(&style)?;
            let value = cell.map_or(&CellValue::Empty, Cell::value);
            write_cell(buf, column, row, xf, value);
        }

        buf.extend_from_slice(b"</row>");
        self.rows_written += 1;
        Ok(())
    }
}

fn write_cell(buf: &mut Vec<u8>, column: u32, row: u32, xf: u32, value: &CellValue) {
    let mut num = itoa::Buffer::new();
    buf.extend_from_slice(b"<c r=\"");
    push_column_label(buf, column);
    buf.extend_from_slice(num.format(row).as_bytes());
    buf.push(b'"');

    if xf > 0 {
        buf.extend_from_slice(b" s=\"");
        buf.extend_from_slice(num.format(xf).as_bytes());
        buf.push(b'"');
    }

    match value {
        CellValue::Empty => buf.extend_from_slice(b"/>"),
        CellValue::Int(i) => {
            buf.extend_from_slice(b" t=\"n\"><v>");
            buf.extend_from_slice(num.format(*i).as_bytes());
            buf.extend_from_slice(b"</v></c>");
        }
        CellValue::Float(f) => write_number(buf, *f),
        CellValue::Date(d) => write_number(buf, date_serial(*d)),
        CellValue::DateTime(dt) => write_number(buf, excel_serial(*dt)),
        CellValue::Bool(b) => {
            buf.extend_from_slice(b" t=\"b\"><v>");
            buf.push(if *b { b'1' } else { b'0' });
            buf.extend_from_slice(b"</v></c>");
        }
        CellValue::String(s) => {
            buf.extend_from_slice(b" t=\"inlineStr\"><is><t");
            if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
                buf.extend_from_slice(b" xml:space=\"preserve\"");
            }
            buf.push(b'>');
            escape_into(buf, s);
            buf.extend_from_slice(b"</t></is></c>");
        }
        CellValue::Formula(f) => {
            buf.extend_from_slice(b"><f>");
            escape_into(buf, f.strip_prefix('=').unwrap_or(f));
            buf.extend_from_slice(b"</f></c>");
        }
        CellValue::Error(e) => {
            buf.extend_from_slice(b" t=\"e\"><v>");
            escape_into(buf, e);
            buf.extend_from_slice(b"</v></c>");
        }
    }
}

fn write_number(buf: &mut Vec<u8>, value: f64) {
    buf.extend_from_slice(b" t=\"n\"><v>");
    buf.extend_from_slice(value.to_string().as_bytes());
    buf.extend_from_slice(b"</v></c>");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(sheet: &mut SheetStream) -> String {
        String::from_utf8(std::mem::take(&mut sheet.pending)).unwrap()
    }

    fn write(sheet: &mut SheetStream, styles: &mut StyleTable, col: u32, row: u32, v: CellValue) {
        sheet.advance_to(row, styles).unwrap();
        sheet.open_cell(col, row).unwrap().set_value(v);
    }

    #[test]
    fn test_rows_flush_on_advance() {
        let mut styles = StyleTable::new();
        let mut sheet = SheetStream::new("Data".to_string());

        write(&mut sheet, &mut styles, 0, 1, CellValue::from("Name"));
        write(&mut sheet, &mut styles, 1, 1, CellValue::from("42"));
        assert!(sheet.pending.is_empty());

        write(&mut sheet, &mut styles, 0, 2, CellValue::Bool(true));
        assert_eq!(
            pending(&mut sheet),
            r#"<row r="1"><c r="A1" t="inlineStr"><is><t>Name</t></is></c><c r="B1" t="n"><v>42</v></c></row>"#
        );

        sheet.finish(&mut styles).unwrap();
        assert_eq!(
            pending(&mut sheet),
            r#"<row r="2"><c r="A2" t="b"><v>1</v></c></row></sheetData></worksheet>"#
        );
        assert_eq!(sheet.rows_written(), 2);
    }

    #[test]
    fn test_write_above_open_row_fails() {
        let mut styles = StyleTable::new();
        let mut sheet = SheetStream::new("Data".to_string());

        write(&mut sheet, &mut styles, 0, 3, CellValue::Int(1));
        assert!(matches!(
            sheet.advance_to(2, &mut styles),
            Err(ExportError::RowFlushed { row: 2 })
        ));
        write(&mut sheet, &mut styles, 0, 4, CellValue::Int(2));
        assert!(matches!(
            sheet.advance_to(3, &mut styles),
            Err(ExportError::RowFlushed { row: 3 })
        ));
        assert!(matches!(
            sheet.add_rule(&CellRange::parse("A3").unwrap(), &CellStyle::new().bold(true)),
            Err(ExportError::RowFlushed { row: 3 })
        ));
    }

    #[test]
    fn test_styled_blanks_and_gaps() {
        let mut styles = StyleTable::new();
        let mut sheet = SheetStream::new("Data".to_string());
        sheet
            .add_rule(
                &CellRange::parse("A1:B2").unwrap(),
                &CellStyle::new().bold(true),
            )
            .unwrap();

        write(&mut sheet, &mut styles, 0, 1, CellValue::from("x"));
        write(&mut sheet, &mut styles, 0, 3, CellValue::Int(7));
        sheet.finish(&mut styles).unwrap();

        let xml = pending(&mut sheet);
        assert!(xml.starts_with(
            r#"<row r="1"><c r="A1" s="1" t="inlineStr"><is><t>x</t></is></c><c r="B1" s="1"/></row>"#
        ));
        assert!(xml.contains(r#"<row r="2"><c r="A2" s="1"/><c r="B2" s="1"/></row>"#));
        assert!(xml.contains(r#"<row r="3"><c r="A3" t="n"><v>7</v></c></row>"#));
    }

    #[test]
    fn test_rules_below_last_row_are_written() {
        let mut styles = StyleTable::new();
        let mut sheet = SheetStream::new("Data".to_string());
        sheet
            .add_rule(
                &CellRange::parse("A1:B5").unwrap(),
                &CellStyle::new().bold(true),
            )
            .unwrap();

        write(&mut sheet, &mut styles, 0, 1, CellValue::from("only"));
        sheet.finish(&mut styles).unwrap();

        let xml = pending(&mut sheet);
        assert!(xml.contains(r#"<row r="2"><c r="A2" s="1"/><c r="B2" s="1"/></row>"#));
        assert!(xml.contains(r#"<row r="5"><c r="A5" s="1"/><c r="B5" s="1"/></row>"#));
        assert!(!xml.contains(r#"<row r="6""#));
        assert!(xml.ends_with("</row></sheetData></worksheet>"));
        assert_eq!(sheet.rows_written(), 5);
    }

    #[test]
    fn test_rules_without_rows() {
        let mut styles = StyleTable::new();
        let mut sheet = SheetStream::new("Data".to_string());
        sheet
            .add_rule(&CellRange::parse("C2").unwrap(), &CellStyle::new().italic(true))
            .unwrap();
        sheet.finish(&mut styles).unwrap();

        assert_eq!(
            pending(&mut sheet),
            r#"<row r="2"><c r="C2" s="1"/></row></sheetData></worksheet>"#
        );
    }

    #[test]
    fn test_cell_value_encoding() {
        let mut buf = Vec::new();
        write_cell(&mut buf, 2, 5, 0, &CellValue::Formula("=SUM(A1:A4)".to_string()));
        write_cell(&mut buf, 0, 1, 0, &CellValue::from(" a<b "));
        write_cell(&mut buf, 0, 2, 3, &CellValue::Error("#N/A".to_string()));
        write_cell(&mut buf, 0, 3, 0, &CellValue::Float(1.5));
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            concat!(
                r#"<c r="C5"><f>SUM(A1:A4)</f></c>"#,
                r#"<c r="A1" t="inlineStr"><is><t xml:space="preserve"> a&lt;b </t></is></c>"#,
                r#"<c r="A2" s="3" t="e"><v>#N/A</v></c>"#,
                r#"<c r="A3" t="n"><v>1.5</v></c>"#,
            )
        );
    }
}
