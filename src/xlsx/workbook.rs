//! Streaming XLSX workbook
//!
//! Sheet XML goes straight into the ZIP compressor as rows complete; the
//! package parts that depend on the full sheet list (workbook, rels, content
//! types, styles) are written on [`close`](XlsxWorkbook::close).

use std::fs::File;
use std::path::Path;

use s_zip::StreamingZipWriter;

use super::styles::StyleTable;
use super::worksheet::{SheetStream, SHEET_HEADER};
use super::xml_writer::XmlWriter;
use crate::column::CellRange;
use crate::error::{ExportError, Result};
use crate::style::CellStyle;
use crate::types::Cell;
use crate::worksheet::{check_bounds, validate_sheet_title, Worksheet};

/// Default deflate level
pub const DEFAULT_COMPRESSION: u32 = 6;

fn zip_error(err: impl std::fmt::Display) -> ExportError {
    ExportError::WriteError(err.to_string())
}

/// Workbook that streams each worksheet into the archive as it is written
pub struct XlsxWorkbook {
    zip: Option<StreamingZipWriter<File>>,
    sheets: Vec<String>,
    current: Option<SheetStream>,
    styles: StyleTable,
}

impl XlsxWorkbook {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_compression(path, DEFAULT_COMPRESSION)
    }

    /// Create with a deflate level between 0 and 9
    pub fn with_compression<P: AsRef<Path>>(path: P, compression_level: u32) -> Result<Self> {
        if compression_level > 9 {
            return Err(ExportError::InvalidConfig(format!(
                "compression level {} is not between 0 and 9",
                compression_level
            )));
        }
        let zip = StreamingZipWriter::with_compression(path.as_ref(), compression_level)
            .map_err(zip_error)?;

        Ok(XlsxWorkbook {
            zip: Some(zip),
            sheets: Vec::new(),
            current: None,
            styles: StyleTable::new(),
        })
    }

    fn zip(&mut self) -> Result<&mut StreamingZipWriter<File>> {
        self.zip
            .as_mut()
            .ok_or_else(|| ExportError::WriteError("Workbook already closed".to_string()))
    }

    /// Finish the current sheet and start a new one, which becomes current
    pub fn add_worksheet(&mut self, name: &str) -> Result<()> {
        validate_sheet_title(name)?;
        if self.sheets.iter().any(|s| s.eq_ignore_ascii_case(name)) {
            return Err(ExportError::InvalidSheetTitle {
                title: name.to_string(),
                reason: "a sheet with this title already exists".to_string(),
            });
        }

        self.finish_current_worksheet()?;
        self.sheets.push(name.to_string());

        let entry_name = format!("xl/worksheets/sheet{}.xml", self.sheets.len());
        let zip = self.zip()?;
        zip.start_entry(&entry_name).map_err(zip_error)?;
        zip.write_data(SHEET_HEADER).map_err(zip_error)?;

        self.current = Some(SheetStream::new(name.to_string()));
        log::debug!("started worksheet '{}' as {}", name, entry_name);
        Ok(())
    }

    pub fn worksheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheets
    }

    fn current(&mut self) -> Result<&mut SheetStream> {
        self.current
            .as_mut()
            .ok_or_else(|| ExportError::WriteError("No worksheet started".to_string()))
    }

    fn finish_current_worksheet(&mut self) -> Result<()> {
        if let Some(mut sheet) = self.current.take() {
            sheet.finish(&mut self.styles)?;
            self.zip()?.write_data(&sheet.pending).map_err(zip_error)?;
            log::debug!(
                "finished worksheet '{}' with {} rows",
                sheet.title,
                sheet.rows_written()
            );
        }
        Ok(())
    }

    /// Write the remaining package parts and finish the archive
    pub fn close(mut self) -> Result<()> {
        if self.sheets.is_empty() {
            return Err(ExportError::WriteError(
                "Workbook has no worksheets".to_string(),
            ));
        }
        self.finish_current_worksheet()?;

        let content_types = self.content_types();
        let workbook = self.workbook_xml()?;
        let workbook_rels = self.workbook_rels();
        let styles = self.styles.to_xml()?;

        let parts: [(&str, &[u8]); 7] = [
            ("[Content_Types].xml", content_types.as_bytes()),
            ("_rels/.rels", ROOT_RELS.as_bytes()),
            ("docProps/app.xml", APP_PROPS.as_bytes()),
            ("docProps/core.xml", CORE_PROPS.as_bytes()),
            ("xl/workbook.xml", &workbook),
            ("xl/_rels/workbook.xml.rels", workbook_rels.as_bytes()),
            ("xl/styles.xml", &styles),
        ];

        let mut zip = self
            .zip
            .take()
            .ok_or_else(|| ExportError::WriteError("Workbook already closed".to_string()))?;
        for (name, data) in parts {
            zip.start_entry(name).map_err(zip_error)?;
            zip.write_data(data).map_err(zip_error)?;
        }
        zip.finish().map_err(zip_error)?;
        Ok(())
    }

    fn content_types(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
        );

        for i in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"
<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i
            ));
        }

        xml.push_str("\n</Types>");
        xml
    }

    fn workbook_xml(&self) -> Result<Vec<u8>> {
        let mut xml = XmlWriter::new(Vec::new());
        xml.write_str(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<bookViews><workbookView activeTab="0"/></bookViews>
<sheets>"#,
        )?;

        for (i, name) in self.sheets.iter().enumerate() {
            let id = i as u32 + 1;
            xml.write_str("\n")?;
            xml.start_element("sheet")?;
            xml.attribute("name", name)?;
            xml.attribute_int("sheetId", id)?;
            xml.write_str(" r:id=\"rId")?;
            xml.write_str(itoa::Buffer::new().format(id))?;
            xml.write_str("\"")?;
            xml.close_empty()?;
        }

        xml.write_str("\n</sheets>\n</workbook>")?;
        xml.into_inner()
    }

    fn workbook_rels(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"
<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i, i
            ));
        }

        xml.push_str(&format!(
            r#"
<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#,
            self.sheets.len() + 1
        ));
        xml
    }
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

const APP_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>excelexport</Application>
</Properties>"#;

const CORE_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:creator>excelexport</dc:creator>
</cp:coreProperties>"#;

/// The current (last added) sheet is the render target
impl Worksheet for XlsxWorkbook {
    fn title(&self) -> &str {
        self.current.as_ref().map_or("", |sheet| sheet.title.as_str())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        validate_sheet_title(title)?;
        let index = self
            .sheets
            .len()
            .checked_sub(1)
            .ok_or_else(|| ExportError::WriteError("No worksheet started".to_string()))?;
        if self
            .sheets
            .iter()
            .enumerate()
            .any(|(i, s)| i != index && s.eq_ignore_ascii_case(title))
        {
            return Err(ExportError::InvalidSheetTitle {
                title: title.to_string(),
                reason: "a sheet with this title already exists".to_string(),
            });
        }

        self.current()?.title = title.to_string();
        self.sheets[index] = title.to_string();
        Ok(())
    }

    fn cell_mut(&mut self, column: u32, row: u32) -> Result<&mut Cell> {
        check_bounds(column, row)?;
        let sheet = self
            .current
            .as_mut()
            .ok_or_else(|| ExportError::WriteError("No worksheet started".to_string()))?;

        sheet.advance_to(row, &mut self.styles)?;
        if !sheet.pending.is_empty() {
            let zip = self
                .zip
                .as_mut()
                .ok_or_else(|| ExportError::WriteError("Workbook already closed".to_string()))?;
            zip.write_data(&sheet.pending).map_err(zip_error)?;
            sheet.pending.clear();
        }
        sheet.open_cell(column, row)
    }

    fn apply_style(&mut self, range: &CellRange, style: &CellStyle) -> Result<()> {
        self.current()?.add_rule(range, style)
    }
}
