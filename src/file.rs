//! Multi-sheet XLSX file assembly and delivery
//!
//! [`ExcelFile`] renders its sheets in order into one streaming workbook
//! backed by a temporary file. The file is produced once, on the first
//! [`save_as`](ExcelFile::save_as) or [`send`](ExcelFile::send), and copied
//! out from there.
//!
//! ```rust,no_run
//! use excelexport::file::ExcelFile;
//! use excelexport::sheet::{ExcelSheet, Sheet};
//! use excelexport::types::CellValue;
//!
//! # fn main() -> excelexport::Result<()> {
//! let rows = vec![vec![CellValue::from("Alice"), CellValue::from(30)]];
//! let mut sheet = ExcelSheet::with_rows(rows);
//! sheet.config_mut().set_titles(vec!["Name", "Age"]);
//!
//! let mut file = ExcelFile::builder().sheet("People", sheet).build();
//! file.save_as("people.xlsx")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{ExportError, Result};
use crate::sheet::{RenderSheet, RenderSummary};
use crate::worksheet::validate_sheet_title;
use crate::xlsx::{XlsxWorkbook, DEFAULT_COMPRESSION};

/// MIME type of XLSX documents
pub const CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Temporary file placement and archive settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FileOptions {
    pub prefix: String,
    pub suffix: String,
    /// Directory of the temporary file; the system temp dir when unset
    pub directory: Option<PathBuf>,
    /// Deflate level, 0 to 9
    pub compression_level: u32,
}

impl Default for FileOptions {
    fn default() -> Self {
        FileOptions {
            prefix: "excelexport-".to_string(),
            suffix: ".xlsx".to_string(),
            directory: None,
            compression_level: DEFAULT_COMPRESSION,
        }
    }
}

/// Header values for delivering a file over HTTP
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DownloadOptions {
    pub filename: String,
    /// Ask the client to display rather than save the file
    pub inline: bool,
    /// Overrides [`CONTENT_TYPE`]
    pub content_type: Option<String>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        DownloadOptions {
            filename: "export.xlsx".to_string(),
            inline: false,
            content_type: None,
        }
    }
}

impl DownloadOptions {
    pub fn new(filename: impl Into<String>) -> Self {
        DownloadOptions {
            filename: filename.into(),
            ..Default::default()
        }
    }

    pub fn inline(mut self, inline: bool) -> Self {
        self.inline = inline;
        self
    }

    pub fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(CONTENT_TYPE)
    }

    /// `Content-Disposition` value with a quoted filename
    pub fn content_disposition(&self) -> String {
        let disposition = if self.inline { "inline" } else { "attachment" };
        let mut quoted = String::with_capacity(self.filename.len());
        for ch in self.filename.chars() {
            match ch {
                '"' | '\\' => {
                    quoted.push('\\');
                    quoted.push(ch);
                }
                c if c.is_control() => {}
                c => quoted.push(c),
            }
        }
        format!("{}; filename=\"{}\"", disposition, quoted)
    }

    /// `Content-Type` and `Content-Disposition` header pairs
    pub fn headers(&self) -> [(&'static str, String); 2] {
        [
            ("Content-Type", self.content_type().to_string()),
            ("Content-Disposition", self.content_disposition()),
        ]
    }
}

struct SheetEntry {
    title: Option<String>,
    sheet: Box<dyn RenderSheet>,
}

/// Ordered set of sheets written to one XLSX file
pub struct ExcelFile {
    sheets: Vec<SheetEntry>,
    options: FileOptions,
    file: Option<NamedTempFile>,
    summaries: Vec<RenderSummary>,
}

impl Default for ExcelFile {
    fn default() -> Self {
        Self::with_options(FileOptions::default())
    }
}

impl ExcelFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: FileOptions) -> Self {
        ExcelFile {
            sheets: Vec::new(),
            options,
            file: None,
            summaries: Vec::new(),
        }
    }

    pub fn builder() -> ExcelFileBuilder {
        ExcelFileBuilder::default()
    }

    pub fn options(&self) -> &FileOptions {
        &self.options
    }

    /// Append a sheet with an explicit title
    pub fn add_sheet<S>(&mut self, title: impl Into<String>, sheet: S) -> &mut Self
    where
        S: RenderSheet + 'static,
    {
        self.sheets.push(SheetEntry {
            title: Some(title.into()),
            sheet: Box::new(sheet),
        });
        self
    }

    /// Append a sheet titled `Sheet<n>` by its position
    pub fn push_sheet<S>(&mut self, sheet: S) -> &mut Self
    where
        S: RenderSheet + 'static,
    {
        self.sheets.push(SheetEntry {
            title: None,
            sheet: Box::new(sheet),
        });
        self
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Final sheet titles in order
    pub fn sheet_titles(&self) -> Vec<String> {
        self.sheets
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                entry
                    .title
                    .clone()
                    .unwrap_or_else(|| format!("Sheet{}", i + 1))
            })
            .collect()
    }

    /// Check every title against the naming rules and for duplicates
    pub fn validate_titles(&self) -> Result<()> {
        if self.sheets.is_empty() {
            return Err(ExportError::InvalidConfig(
                "file has no sheets".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for title in self.sheet_titles() {
            validate_sheet_title(&title)?;
            if !seen.insert(title.to_lowercase()) {
                return Err(ExportError::InvalidSheetTitle {
                    title,
                    reason: "a sheet with this title already exists".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Render every sheet, in order, into `workbook`
    pub fn create_sheets(&mut self, workbook: &mut XlsxWorkbook) -> Result<Vec<RenderSummary>> {
        self.validate_titles()?;
        let titles = self.sheet_titles();
        let mut summaries = Vec::with_capacity(self.sheets.len());
        for (entry, title) in self.sheets.iter_mut().zip(titles) {
            workbook.add_worksheet(&title)?;
            summaries.push(entry.sheet.render_into(workbook)?);
        }
        Ok(summaries)
    }

    /// Path of the rendered temporary file, rendering it on first call
    pub fn create_file(&mut self) -> Result<&Path> {
        if self.file.is_none() {
            let temp = self.render_to_temp()?;
            self.file = Some(temp);
        }
        self.path()
            .ok_or_else(|| ExportError::WriteError("temporary file missing".to_string()))
    }

    /// Path of the temporary file, if it was created
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(NamedTempFile::path)
    }

    /// Per-sheet render summaries of the created file
    pub fn summaries(&self) -> &[RenderSummary] {
        &self.summaries
    }

    fn render_to_temp(&mut self) -> Result<NamedTempFile> {
        self.validate_titles()?;

        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.options.prefix).suffix(&self.options.suffix);
        let temp = match &self.options.directory {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        let mut workbook =
            XlsxWorkbook::with_compression(temp.path(), self.options.compression_level)?;
        self.summaries = self.create_sheets(&mut workbook)?;
        workbook.close()?;

        log::debug!(
            "wrote {} sheets to {}",
            self.sheets.len(),
            temp.path().display()
        );
        Ok(temp)
    }

    /// Copy the file to `path`, returning the number of bytes written
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<u64> {
        let source = self.create_file()?;
        Ok(std::fs::copy(source, path.as_ref())?)
    }

    /// Stream the file into `writer`, returning the number of bytes written
    pub fn send<W: Write + ?Sized>(&mut self, writer: &mut W) -> Result<u64> {
        let source = self.create_file()?;
        let mut file = File::open(source)?;
        let written = io::copy(&mut file, writer)?;
        writer.flush()?;
        Ok(written)
    }
}

/// Builder for [`ExcelFile`]
#[derive(Default)]
pub struct ExcelFileBuilder {
    options: FileOptions,
    sheets: Vec<SheetEntry>,
}

impl ExcelFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: FileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.prefix = prefix.into();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.options.suffix = suffix.into();
        self
    }

    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.options.directory = Some(directory.into());
        self
    }

    pub fn compression_level(mut self, level: u32) -> Self {
        self.options.compression_level = level;
        self
    }

    pub fn sheet<S>(mut self, title: impl Into<String>, sheet: S) -> Self
    where
        S: RenderSheet + 'static,
    {
        self.sheets.push(SheetEntry {
            title: Some(title.into()),
            sheet: Box::new(sheet),
        });
        self
    }

    pub fn untitled_sheet<S>(mut self, sheet: S) -> Self
    where
        S: RenderSheet + 'static,
    {
        self.sheets.push(SheetEntry {
            title: None,
            sheet: Box::new(sheet),
        });
        self
    }

    pub fn build(self) -> ExcelFile {
        let mut file = ExcelFile::with_options(self.options);
        file.sheets = self.sheets;
        file
    }
}
