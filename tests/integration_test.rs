//! Integration tests for excelexport

use std::sync::Arc;

use excelexport::active::{
    ActiveSheet, ActiveSheetOptions, DataKind, MemoryQuery, ModelSchema, Record, SchemaRegistry,
    SortOrder, TimeZones,
};
use excelexport::column::column_map;
use excelexport::file::{ExcelFile, FileOptions};
use excelexport::sheet::{ExcelSheet, Sheet, SheetOptions};
use excelexport::style::CellStyle;
use excelexport::types::{CellType, CellValue};
use excelexport::worksheet::{MemoryWorksheet, Worksheet};
use excelexport::ExportError;
use tempfile::TempDir;

fn people() -> Vec<Vec<CellValue>> {
    vec![
        vec!["Alice".into(), "00123".into(), "30".into(), "=B2*2".into()],
        vec!["Bob".into(), "456".into(), "#N/A".into(), CellValue::Empty],
    ]
}

#[test]
fn test_render_with_start_column_and_titles() {
    let mut sheet = ExcelSheet::with_rows(people());
    sheet
        .config_mut()
        .set_start_column("C")
        .set_start_row(3)
        .set_titles(vec!["Name", "Code", "Age", "Double"])
        .set_types(column_map::<_, _, CellType, _>([(1u32, CellType::String)]))
        .add_style("C3:F3", CellStyle::header_bold());

    let mut ws = MemoryWorksheet::new("People");
    let summary = sheet.render(&mut ws).unwrap();

    assert_eq!(summary.title_row, Some(3));
    assert_eq!(summary.data_rows, 2);
    assert_eq!(summary.next_row, 6);

    assert_eq!(ws.value(2, 3), &CellValue::from("Name"));
    assert_eq!(ws.value(3, 4), &CellValue::from("00123"));
    // explicit String type keeps numeric text as text
    assert_eq!(ws.value(3, 5), &CellValue::from("456"));
    assert_eq!(ws.value(4, 4), &CellValue::Int(30));
    assert_eq!(ws.value(4, 5), &CellValue::Error("#N/A".to_string()));
    assert_eq!(ws.value(5, 4), &CellValue::Formula("=B2*2".to_string()));
    assert_eq!(ws.effective_style(2, 3).bold, Some(true));
    assert_eq!(ws.effective_style(2, 4).bold, None);
}

#[test]
fn test_suppressed_titles_start_at_first_row() {
    let mut sheet = ExcelSheet::with_rows(people());
    sheet.config_mut().set_titles(vec!["Name"]).set_titles(false);

    let mut ws = MemoryWorksheet::default();
    let summary = sheet.render(&mut ws).unwrap();
    assert_eq!(summary.title_row, None);
    assert_eq!(ws.value(0, 1), &CellValue::from("Alice"));
}

#[test]
fn test_second_render_needs_data() {
    let mut sheet = ExcelSheet::with_rows(people());
    let mut ws = MemoryWorksheet::default();
    sheet.render(&mut ws).unwrap();
    assert!(matches!(
        sheet.render(&mut ws),
        Err(ExportError::NoDataSource)
    ));
}

#[test]
fn test_formatter_and_callback_order() {
    let mut sheet = ExcelSheet::with_rows(people());
    sheet
        .config_mut()
        .add_formatter("A", |value: CellValue, row: u32, _: &Vec<CellValue>| {
            Ok(CellValue::from(format!("{} ({})", value, row)))
        })
        .add_callback("A", |cell: &mut excelexport::Cell, _: u32, row: u32| {
            if row == 1 {
                cell.style_mut().italic = Some(true);
            }
            Ok(())
        });

    let mut ws = MemoryWorksheet::default();
    sheet.render(&mut ws).unwrap();
    assert_eq!(ws.value(0, 1), &CellValue::from("Alice (1)"));
    assert_eq!(ws.value(0, 2), &CellValue::from("Bob (2)"));
    assert_eq!(ws.effective_style(0, 1).italic, Some(true));
    assert_eq!(ws.effective_style(0, 2).italic, None);
}

#[test]
fn test_hooks_see_the_worksheet() {
    let mut sheet = ExcelSheet::with_rows(people());
    sheet
        .config_mut()
        .on_before_render(|ws: &mut dyn Worksheet| ws.set_title("Renamed"))
        .on_after_render(|ws: &mut dyn Worksheet| {
            ws.set_cell_value(0, 10, CellValue::from("footer"))?;
            Ok(())
        });

    let mut ws = MemoryWorksheet::new("Original");
    sheet.render(&mut ws).unwrap();
    assert_eq!(ws.title(), "Renamed");
    assert_eq!(ws.value(0, 10), &CellValue::from("footer"));
}

#[test]
fn test_invalid_style_range_writes_nothing() {
    let mut sheet = ExcelSheet::with_rows(people());
    sheet.config_mut().add_style("A1:?", CellStyle::border_thin());

    let mut ws = MemoryWorksheet::default();
    assert!(matches!(
        sheet.render(&mut ws),
        Err(ExportError::InvalidRange(_))
    ));
    assert_eq!(ws.cells().count(), 0);
}

#[test]
fn test_sheet_options_apply() {
    let options = SheetOptions {
        start_column: Some("B".into()),
        start_row: Some(2),
        ..Default::default()
    };
    let mut sheet = ExcelSheet::with_rows(people());
    options.apply(sheet.config_mut()).unwrap();

    let mut ws = MemoryWorksheet::default();
    sheet.render(&mut ws).unwrap();
    assert_eq!(ws.value(1, 2), &CellValue::from("Alice"));
}

fn registry() -> Arc<SchemaRegistry> {
    Arc::new(
        SchemaRegistry::new()
            .with_model(
                ModelSchema::new("invoice")
                    .column("number", DataKind::Plain)
                    .column("issued", DataKind::Date)
                    .column("paid_at", DataKind::DateTime)
                    .column("amount", DataKind::Decimal { scale: 2 })
                    .relation("client", "client"),
            )
            .with_model(
                ModelSchema::new("client")
                    .column("name", DataKind::Plain)
                    .label("name", "Client"),
            ),
    )
}

fn invoices() -> MemoryQuery {
    let records = vec![
        Record::new()
            .with("number", "INV-2")
            .with("issued", "2017-12-05")
            .with("paid_at", CellValue::Empty)
            .with("amount", 99.5)
            .with_relation("client", Some(Record::new().with("name", "Acme"))),
        Record::new()
            .with("number", "INV-1")
            .with("issued", "2017-12-04")
            .with("paid_at", "2017-12-05 00:00:00")
            .with("amount", 1250.0)
            .with_relation("client", None),
    ];
    MemoryQuery::new("invoice", records).order_by("number", SortOrder::Asc)
}

#[test]
fn test_active_sheet_end_to_end() {
    let options = ActiveSheetOptions {
        batch_size: 1,
        time_zones: TimeZones::new(chrono_tz::Tz::UTC, chrono_tz::Tz::UTC),
        ..Default::default()
    };
    let mut sheet = ActiveSheet::with_options(invoices(), registry(), options);
    sheet.set_attributes(["number", "client.name", "issued", "paid_at", "amount"]);

    let mut ws = MemoryWorksheet::default();
    let summary = sheet.render(&mut ws).unwrap();
    assert_eq!(summary.data_rows, 2);
    assert_eq!(sheet.query().fetch_count(), 3);

    assert_eq!(
        ws.row_values(1),
        vec![
            CellValue::from("Number"),
            CellValue::from("Client"),
            CellValue::from("Issued"),
            CellValue::from("Paid At"),
            CellValue::from("Amount"),
        ]
    );
    // ordered by number
    assert_eq!(ws.value(0, 2), &CellValue::from("INV-1"));
    assert_eq!(ws.value(1, 2), &CellValue::Empty);
    assert_eq!(ws.value(2, 2), &CellValue::Float(43073.0));
    assert_eq!(ws.value(3, 2), &CellValue::Float(43074.0));
    assert_eq!(ws.cell(4, 2).unwrap().number_format(), Some("#,##0.00"));
    assert_eq!(ws.value(3, 3), &CellValue::Empty);
    assert_eq!(ws.value(1, 3), &CellValue::from("Acme"));
}

#[test]
fn test_file_with_mixed_sheets() {
    let dir = TempDir::new().unwrap();
    let options = FileOptions {
        directory: Some(dir.path().to_path_buf()),
        compression_level: 0,
        ..Default::default()
    };

    let mut active = ActiveSheet::new(invoices(), registry());
    active.set_attributes(["number", "client.name"]);

    let mut plain = ExcelSheet::with_rows(people());
    plain.config_mut().set_titles(vec!["Name", "Code"]);

    let mut file = ExcelFile::with_options(options);
    file.add_sheet("Invoices", active).push_sheet(plain);
    assert_eq!(file.sheet_titles(), vec!["Invoices", "Sheet2"]);

    let target = dir.path().join("report.xlsx");
    file.save_as(&target).unwrap();

    let bytes = std::fs::read(&target).unwrap();
    assert_eq!(&bytes[..2], b"PK");
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("<t>INV-1</t>"));
    assert!(text.contains("<t>00123</t>"));
    assert!(text.contains(r#"name="Sheet2""#));
}

#[test]
fn test_style_rule_reaches_past_last_data_row() {
    let dir = TempDir::new().unwrap();
    let options = FileOptions {
        directory: Some(dir.path().to_path_buf()),
        compression_level: 0,
        ..Default::default()
    };

    let mut sheet = ExcelSheet::with_rows(vec![vec![CellValue::from("only")]]);
    sheet
        .config_mut()
        .add_style("A1:B5", CellStyle::new().bold(true));

    let mut file = ExcelFile::with_options(options);
    file.add_sheet("Styled", sheet);
    let target = dir.path().join("styled.xlsx");
    file.save_as(&target).unwrap();

    let bytes = std::fs::read(&target).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains(r#"<row r="1">"#));
    assert!(text.contains(r#"<row r="2">"#));
    assert!(text.contains(r#"<row r="5"><c r="A5" s="1"/><c r="B5" s="1"/></row>"#));
}
