//! Sheet rendering
//!
//! A sheet renders in a fixed sequence: before-render hooks, style rules, an
//! optional title row, the data rows, after-render hooks. All column
//! configuration is resolved up front so malformed configuration fails before
//! the renderer writes anything.

use indexmap::IndexMap;

use crate::column::{CellRange, ColumnMap, ColumnRef, ColumnResolver};
use crate::error::{ExportError, Result};
use crate::property::{Callback, ColumnProperty, Formatter, Setting};
use crate::row::{render_row, ResolvedColumns};
use crate::style::CellStyle;
use crate::types::{CellType, CellValue, RowData};
use crate::worksheet::Worksheet;

/// Hook run with the target worksheet before or after rendering
pub type RenderHook = Box<dyn FnMut(&mut dyn Worksheet) -> Result<()>>;

/// Row source of a sheet
pub type RowSource<R> = Box<dyn Iterator<Item = Result<R>>>;

/// Progress of the last render
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RenderStage {
    Created,
    StylesApplied,
    TitleRendered,
    RowsStreamed,
    Done,
}

/// Rows touched by a render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    /// Configured start row
    pub first_row: u32,
    /// Row holding the titles, if a title row was written
    pub title_row: Option<u32>,
    pub data_rows: u32,
    /// Row after the last one written
    pub next_row: u32,
}

/// Provider of derived per-column defaults, keyed by column reference
pub trait ColumnDefaults<R> {
    fn titles(&mut self) -> Result<ColumnMap<String>> {
        Ok(ColumnMap::new())
    }

    fn types(&mut self) -> Result<ColumnMap<CellType>> {
        Ok(ColumnMap::new())
    }

    fn formats(&mut self) -> Result<ColumnMap<String>> {
        Ok(ColumnMap::new())
    }

    fn formatters(&mut self) -> Result<ColumnMap<Formatter<R>>> {
        Ok(ColumnMap::new())
    }
}

/// Plain sheets derive nothing
pub struct NoDefaults;

impl<R> ColumnDefaults<R> for NoDefaults {}

/// Column configuration, styles and hooks of one sheet
pub struct SheetConfig<R> {
    start_column: ColumnRef,
    start_row: u32,
    titles: ColumnProperty<String>,
    types: ColumnProperty<CellType>,
    formats: ColumnProperty<String>,
    formatters: ColumnProperty<Formatter<R>>,
    callbacks: ColumnProperty<Callback>,
    styles: IndexMap<String, CellStyle>,
    before_render: Vec<RenderHook>,
    after_render: Vec<RenderHook>,
    stage: RenderStage,
}

impl<R> Default for SheetConfig<R> {
    fn default() -> Self {
        SheetConfig {
            start_column: ColumnRef::default(),
            start_row: 1,
            titles: ColumnProperty::default(),
            types: ColumnProperty::default(),
            formats: ColumnProperty::default(),
            formatters: ColumnProperty::default(),
            callbacks: ColumnProperty::default(),
            styles: IndexMap::new(),
            before_render: Vec::new(),
            after_render: Vec::new(),
            stage: RenderStage::Created,
        }
    }
}

impl<R> std::fmt::Debug for SheetConfig<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetConfig")
            .field("start_column", &self.start_column)
            .field("start_row", &self.start_row)
            .field("titles", &self.titles)
            .field("types", &self.types)
            .field("formats", &self.formats)
            .field("formatters", &self.formatters)
            .field("callbacks", &self.callbacks)
            .field("styles", &self.styles)
            .field("stage", &self.stage)
            .finish()
    }
}

impl<R> SheetConfig<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_column(&self) -> &ColumnRef {
        &self.start_column
    }

    /// Column that offset 0 maps to. Default is `A`.
    pub fn set_start_column(&mut self, column: impl Into<ColumnRef>) -> &mut Self {
        self.start_column = column.into();
        self
    }

    pub fn start_row(&self) -> u32 {
        self.start_row
    }

    /// First row written, 1-based. Default is 1.
    pub fn set_start_row(&mut self, row: u32) -> &mut Self {
        self.start_row = row;
        self
    }

    pub fn titles(&self) -> &ColumnProperty<String> {
        &self.titles
    }

    /// Titles are written as text, each at its own resolved column. Sparse
    /// keys such as `A` and `D` leave the columns in between without a title.
    pub fn set_titles(&mut self, titles: impl Into<Setting<String>>) -> &mut Self {
        self.titles.set(titles);
        self
    }

    pub fn types(&self) -> &ColumnProperty<CellType> {
        &self.types
    }

    pub fn set_types(&mut self, types: impl Into<Setting<CellType>>) -> &mut Self {
        self.types.set(types);
        self
    }

    pub fn formats(&self) -> &ColumnProperty<String> {
        &self.formats
    }

    pub fn set_formats(&mut self, formats: impl Into<Setting<String>>) -> &mut Self {
        self.formats.set(formats);
        self
    }

    pub fn formatters(&self) -> &ColumnProperty<Formatter<R>> {
        &self.formatters
    }

    pub fn set_formatters(&mut self, formatters: impl Into<Setting<Formatter<R>>>) -> &mut Self {
        self.formatters.set(formatters);
        self
    }

    /// Add a formatter for one column
    pub fn add_formatter<F>(&mut self, column: impl Into<ColumnRef>, formatter: F) -> &mut Self
    where
        F: Fn(CellValue, u32, &R) -> Result<CellValue> + 'static,
    {
        let formatter: Formatter<R> = std::sync::Arc::new(formatter);
        let mut map = ColumnMap::new();
        map.insert(column.into(), formatter);
        self.formatters.set(map);
        self
    }

    pub fn callbacks(&self) -> &ColumnProperty<Callback> {
        &self.callbacks
    }

    pub fn set_callbacks(&mut self, callbacks: impl Into<Setting<Callback>>) -> &mut Self {
        self.callbacks.set(callbacks);
        self
    }

    /// Add a callback for one column
    pub fn add_callback<F>(&mut self, column: impl Into<ColumnRef>, callback: F) -> &mut Self
    where
        F: Fn(&mut crate::types::Cell, u32, u32) -> Result<()> + 'static,
    {
        let callback: Callback = std::sync::Arc::new(callback);
        let mut map = ColumnMap::new();
        map.insert(column.into(), callback);
        self.callbacks.set(map);
        self
    }

    /// Style rules keyed by coordinate or range, applied in order
    pub fn styles(&self) -> &IndexMap<String, CellStyle> {
        &self.styles
    }

    pub fn set_styles(&mut self, styles: IndexMap<String, CellStyle>) -> &mut Self {
        self.styles = styles;
        self
    }

    /// Append a style rule; re-adding a range keeps its original position
    pub fn add_style(&mut self, range: impl Into<String>, style: CellStyle) -> &mut Self {
        self.styles.insert(range.into(), style);
        self
    }

    pub fn on_before_render<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnMut(&mut dyn Worksheet) -> Result<()> + 'static,
    {
        self.before_render.push(Box::new(hook));
        self
    }

    pub fn on_after_render<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnMut(&mut dyn Worksheet) -> Result<()> + 'static,
    {
        self.after_render.push(Box::new(hook));
        self
    }

    /// Stage reached by the last render
    pub fn stage(&self) -> RenderStage {
        self.stage
    }

    pub fn resolver(&self) -> Result<ColumnResolver> {
        ColumnResolver::new(&self.start_column)
    }

    /// Forget every cached default so the next render derives them again
    pub fn clear_defaults(&mut self) {
        self.titles.clear_defaults();
        self.types.clear_defaults();
        self.formats.clear_defaults();
        self.formatters.clear_defaults();
        self.callbacks.clear_defaults();
    }

    /// Render `rows` into `worksheet`.
    ///
    /// `defaults` supplies derived column defaults on first use; `project`
    /// turns each record into its positional cell values.
    pub fn render_with<D, I, P>(
        &mut self,
        worksheet: &mut dyn Worksheet,
        defaults: &mut D,
        rows: I,
        mut project: P,
    ) -> Result<RenderSummary>
    where
        D: ColumnDefaults<R>,
        I: IntoIterator<Item = Result<R>>,
        P: FnMut(&R) -> Vec<CellValue>,
    {
        self.stage = RenderStage::Created;
        log::debug!(
            "rendering sheet '{}' from {}{}",
            worksheet.title(),
            self.start_column,
            self.start_row
        );

        for hook in &mut self.before_render {
            hook(worksheet)?;
        }

        if self.start_row == 0 {
            return Err(ExportError::InvalidConfig(
                "start row must be 1 or greater".to_string(),
            ));
        }
        let resolver = self.resolver()?;

        let styles = self
            .styles
            .iter()
            .map(|(key, style)| Ok((key.as_str(), CellRange::parse(key)?, style)))
            .collect::<Result<Vec<_>>>()?;
        let titles = self.titles.resolve(&resolver, || defaults.titles())?;
        let columns = ResolvedColumns {
            formats: self
                .formats
                .resolve(&resolver, || defaults.formats())?
                .unwrap_or_default(),
            formatters: self
                .formatters
                .resolve(&resolver, || defaults.formatters())?
                .unwrap_or_default(),
            callbacks: self
                .callbacks
                .resolve(&resolver, || Ok(ColumnMap::new()))?
                .unwrap_or_default(),
            types: self
                .types
                .resolve(&resolver, || defaults.types())?
                .unwrap_or_default(),
        };

        let mut cursor = self.start_row;

        for (key, range, style) in styles {
            worksheet
                .apply_style(&range, style)
                .map_err(|e| ExportError::StyleRule {
                    range: key.to_string(),
                    source: Box::new(e),
                })?;
        }
        self.stage = RenderStage::StylesApplied;

        let mut title_row = None;
        if let Some(titles) = titles.filter(|t| !t.is_empty()) {
            for (column, title) in titles {
                worksheet
                    .set_cell_value_explicit(column, cursor, title.into(), CellType::String)
                    .map_err(|e| e.at_cell(column, cursor))?;
            }
            title_row = Some(cursor);
            cursor += 1;
            self.stage = RenderStage::TitleRendered;
        }

        let first_column = resolver.start();
        let mut data_rows = 0;
        for record in rows {
            let record = record?;
            let values = project(&record);
            render_row(worksheet, values, &record, cursor, first_column, &columns)?;
            cursor += 1;
            data_rows += 1;
        }
        self.stage = RenderStage::RowsStreamed;

        for hook in &mut self.after_render {
            hook(worksheet)?;
        }
        self.stage = RenderStage::Done;

        log::debug!(
            "rendered sheet '{}': {} data rows, next row {}",
            worksheet.title(),
            data_rows,
            cursor
        );
        Ok(RenderSummary {
            first_row: self.start_row,
            title_row,
            data_rows,
            next_row: cursor,
        })
    }
}

/// A renderable sheet with typed records
pub trait Sheet {
    type Record;

    fn config(&self) -> &SheetConfig<Self::Record>;

    fn config_mut(&mut self) -> &mut SheetConfig<Self::Record>;

    /// Replace the row source
    fn set_data(&mut self, rows: RowSource<Self::Record>) -> Result<()>;

    fn render(&mut self, worksheet: &mut dyn Worksheet) -> Result<RenderSummary>;
}

/// Object-safe rendering entry point, used to mix sheet types in one file
pub trait RenderSheet {
    fn render_into(&mut self, worksheet: &mut dyn Worksheet) -> Result<RenderSummary>;
}

impl<S: Sheet> RenderSheet for S {
    fn render_into(&mut self, worksheet: &mut dyn Worksheet) -> Result<RenderSummary> {
        self.render(worksheet)
    }
}

/// Sheet rendering any positional row source
pub struct ExcelSheet<R = Vec<CellValue>> {
    config: SheetConfig<R>,
    data: Option<RowSource<R>>,
}

impl<R> Default for ExcelSheet<R> {
    fn default() -> Self {
        ExcelSheet {
            config: SheetConfig::default(),
            data: None,
        }
    }
}

impl<R: RowData + 'static> ExcelSheet<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sheet over infallible rows
    pub fn with_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        I::IntoIter: 'static,
    {
        let mut sheet = Self::new();
        sheet.set_rows(rows);
        sheet
    }

    pub fn set_rows<I>(&mut self, rows: I) -> &mut Self
    where
        I: IntoIterator<Item = R>,
        I::IntoIter: 'static,
    {
        self.data = Some(Box::new(rows.into_iter().map(Ok)));
        self
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

impl<R: RowData + 'static> Sheet for ExcelSheet<R> {
    type Record = R;

    fn config(&self) -> &SheetConfig<R> {
        &self.config
    }

    fn config_mut(&mut self) -> &mut SheetConfig<R> {
        &mut self.config
    }

    fn set_data(&mut self, rows: RowSource<R>) -> Result<()> {
        self.data = Some(rows);
        Ok(())
    }

    /// Consumes the row source; rendering again needs new data.
    fn render(&mut self, worksheet: &mut dyn Worksheet) -> Result<RenderSummary> {
        let rows = self.data.take().ok_or(ExportError::NoDataSource)?;
        self.config
            .render_with(worksheet, &mut NoDefaults, rows, RowData::cells)
    }
}

/// Declarative sheet configuration
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SheetOptions {
    pub start_column: Option<ColumnRef>,
    pub start_row: Option<u32>,
    pub titles: Option<ColumnOption<String>>,
    pub types: Option<ColumnOption<CellType>>,
    pub formats: Option<ColumnOption<String>>,
    pub styles: IndexMap<String, CellStyle>,
}

/// `false` suppresses a property, `true` restores defaults, a mapping
/// overrides single columns.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ColumnOption<T> {
    Enabled(bool),
    Columns(IndexMap<ColumnRef, T>),
}

impl<T> From<ColumnOption<T>> for Setting<T> {
    fn from(option: ColumnOption<T>) -> Self {
        match option {
            ColumnOption::Enabled(enabled) => enabled.into(),
            ColumnOption::Columns(map) => Setting::Resolved(map),
        }
    }
}

impl SheetOptions {
    /// Apply every set option onto `config`; styles are appended.
    pub fn apply<R>(&self, config: &mut SheetConfig<R>) -> Result<()> {
        for range in self.styles.keys() {
            CellRange::parse(range)?;
        }
        if let Some(column) = &self.start_column {
            ColumnResolver::new(column)?;
            config.set_start_column(column.clone());
        }
        if let Some(row) = self.start_row {
            config.set_start_row(row);
        }
        if let Some(titles) = &self.titles {
            config.set_titles(titles.clone());
        }
        if let Some(types) = &self.types {
            config.set_types(types.clone());
        }
        if let Some(formats) = &self.formats {
            config.set_formats(formats.clone());
        }
        for (range, style) in &self.styles {
            config.add_style(range.clone(), style.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::column_map;
    use crate::worksheet::MemoryWorksheet;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Row = Vec<CellValue>;

    fn rows() -> Vec<Row> {
        vec![
            vec!["1".into(), "Alice".into(), "12.5".into()],
            vec!["2".into(), "Bob".into(), "7".into()],
        ]
    }

    #[test]
    fn test_titles_and_rows() {
        let mut sheet = ExcelSheet::with_rows(rows());
        sheet
            .config_mut()
            .set_titles(vec!["Id", "Name", "Score"]);

        let mut ws = MemoryWorksheet::new("Data");
        let summary = sheet.render(&mut ws).unwrap();

        assert_eq!(
            summary,
            RenderSummary {
                first_row: 1,
                title_row: Some(1),
                data_rows: 2,
                next_row: 4
            }
        );
        assert_eq!(ws.value(1, 1), &CellValue::from("Name"));
        assert_eq!(ws.value(0, 2), &CellValue::Int(1));
        assert_eq!(ws.value(2, 2), &CellValue::Float(12.5));
        assert_eq!(ws.value(1, 3), &CellValue::from("Bob"));
        assert_eq!(sheet.config().stage(), RenderStage::Done);
    }

    #[test]
    fn test_start_column_and_row_shift() {
        let mut sheet = ExcelSheet::with_rows(rows());
        sheet
            .config_mut()
            .set_start_column("B")
            .set_start_row(3)
            .set_titles(column_map::<_, _, String, _>([
                (ColumnRef::Offset(0), "Id"),
                (ColumnRef::from("D"), "Score"),
            ]));

        let mut ws = MemoryWorksheet::default();
        sheet.render(&mut ws).unwrap();

        assert_eq!(ws.value(1, 3), &CellValue::from("Id"));
        assert_eq!(ws.value(2, 3), &CellValue::Empty);
        assert_eq!(ws.value(3, 3), &CellValue::from("Score"));
        assert_eq!(ws.value(0, 4), &CellValue::Empty);
        assert_eq!(ws.value(1, 4), &CellValue::Int(1));
        assert_eq!(ws.value(2, 4), &CellValue::from("Alice"));
        assert_eq!(ws.highest_row(), 5);
    }

    #[test]
    fn test_empty_source_with_titles_writes_title_row_only() {
        let mut sheet = ExcelSheet::<Row>::with_rows(Vec::new());
        sheet.config_mut().set_titles(vec!["A", "B"]);

        let mut ws = MemoryWorksheet::default();
        let summary = sheet.render(&mut ws).unwrap();
        assert_eq!(summary.title_row, Some(1));
        assert_eq!(summary.data_rows, 0);
        assert_eq!(ws.highest_row(), 1);
    }

    #[test]
    fn test_suppressed_titles_write_no_title_row() {
        let mut sheet = ExcelSheet::with_rows(rows());
        sheet.config_mut().set_titles(vec!["A"]).set_titles(false);

        let mut ws = MemoryWorksheet::default();
        let summary = sheet.render(&mut ws).unwrap();
        assert_eq!(summary.title_row, None);
        assert_eq!(ws.value(0, 1), &CellValue::Int(1));
    }

    #[test]
    fn test_titles_are_text() {
        let mut sheet = ExcelSheet::<Row>::with_rows(Vec::new());
        sheet.config_mut().set_titles(vec!["2024", "=A1"]);

        let mut ws = MemoryWorksheet::default();
        sheet.render(&mut ws).unwrap();
        assert_eq!(ws.value(0, 1), &CellValue::from("2024"));
        assert_eq!(ws.value(1, 1), &CellValue::from("=A1"));
    }

    #[test]
    fn test_no_data_source() {
        let mut sheet = ExcelSheet::<Row>::new();
        let mut ws = MemoryWorksheet::default();
        assert!(matches!(
            sheet.render(&mut ws),
            Err(ExportError::NoDataSource)
        ));
    }

    #[test]
    fn test_start_row_zero_rejected() {
        let mut sheet = ExcelSheet::with_rows(rows());
        sheet.config_mut().set_start_row(0);
        let mut ws = MemoryWorksheet::default();
        assert!(matches!(
            sheet.render(&mut ws),
            Err(ExportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_malformed_config_writes_nothing() {
        let mut sheet = ExcelSheet::with_rows(rows());
        sheet
            .config_mut()
            .set_titles(vec!["Id"])
            .set_formats(column_map::<_, _, String, _>([
                (ColumnRef::from("A"), "0"),
                (ColumnRef::Offset(0), "0.00"),
            ]));

        let mut ws = MemoryWorksheet::default();
        let err = sheet.render(&mut ws).unwrap_err();
        assert!(matches!(err, ExportError::ConflictingColumnMapping { .. }));
        assert_eq!(ws.cells().count(), 0);
    }

    #[test]
    fn test_styles_applied_in_order() {
        let mut sheet = ExcelSheet::with_rows(rows());
        sheet
            .config_mut()
            .add_style("A1:C3", CellStyle::new().bold(true).font_size(9))
            .add_style("B2", CellStyle::new().font_size(20));

        let mut ws = MemoryWorksheet::default();
        sheet.render(&mut ws).unwrap();
        assert_eq!(ws.style_rules().len(), 2);
        assert_eq!(ws.effective_style(1, 2).font_size, Some(20));
        assert_eq!(ws.effective_style(0, 1).font_size, Some(9));
    }

    #[test]
    fn test_bad_style_range() {
        let mut sheet = ExcelSheet::with_rows(rows());
        sheet.config_mut().add_style("A1:", CellStyle::new());
        let mut ws = MemoryWorksheet::default();
        assert!(matches!(
            sheet.render(&mut ws),
            Err(ExportError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_hooks_run_around_render() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sheet = ExcelSheet::with_rows(rows());
        let before = Rc::clone(&log);
        let after = Rc::clone(&log);
        sheet
            .config_mut()
            .on_before_render(move |ws| {
                before.borrow_mut().push(format!("before {}", ws.title()));
                Ok(())
            })
            .on_after_render(move |ws| {
                after.borrow_mut().push("after".to_string());
                ws.set_cell_value(0, 10, CellValue::from("footer"))?;
                Ok(())
            });

        let mut ws = MemoryWorksheet::new("Hooks");
        sheet.render(&mut ws).unwrap();
        assert_eq!(*log.borrow(), vec!["before Hooks", "after"]);
        assert_eq!(ws.value(0, 10), &CellValue::from("footer"));
    }

    #[test]
    fn test_before_hook_failure_aborts() {
        let mut sheet = ExcelSheet::with_rows(rows());
        sheet
            .config_mut()
            .on_before_render(|_| Err(ExportError::Callback("stop".to_string())));

        let mut ws = MemoryWorksheet::default();
        assert!(sheet.render(&mut ws).is_err());
        assert_eq!(ws.cells().count(), 0);
        assert_eq!(sheet.config().stage(), RenderStage::Created);
    }

    #[test]
    fn test_row_source_error_propagates() {
        let mut sheet = ExcelSheet::<Row>::new();
        sheet
            .set_data(Box::new(
                vec![
                    Ok(vec![CellValue::Int(1)]),
                    Err(ExportError::Query("connection lost".to_string())),
                ]
                .into_iter(),
            ))
            .unwrap();

        let mut ws = MemoryWorksheet::default();
        assert!(matches!(
            sheet.render(&mut ws),
            Err(ExportError::Query(_))
        ));
        assert_eq!(sheet.config().stage(), RenderStage::StylesApplied);
    }

    #[test]
    fn test_formatter_and_callback_helpers() {
        let mut sheet = ExcelSheet::with_rows(rows());
        sheet
            .config_mut()
            .add_formatter(1u32, |v, _, _| Ok(CellValue::from(v.as_string().to_uppercase())))
            .add_callback("C", |cell, _, _| {
                cell.style_mut().italic = Some(true);
                Ok(())
            });

        let mut ws = MemoryWorksheet::default();
        sheet.render(&mut ws).unwrap();
        assert_eq!(ws.value(1, 1), &CellValue::from("ALICE"));
        assert_eq!(ws.effective_style(2, 2).italic, Some(true));
    }

    #[test]
    fn test_sheet_options_apply() {
        let options = SheetOptions {
            start_column: Some(ColumnRef::from("C")),
            start_row: Some(2),
            titles: Some(ColumnOption::Enabled(false)),
            formats: Some(ColumnOption::Columns(column_map([(0u32, "0.00")]))),
            styles: IndexMap::from([("C2".to_string(), CellStyle::new().bold(true))]),
            ..Default::default()
        };

        let mut sheet = ExcelSheet::with_rows(rows());
        options.apply(sheet.config_mut()).unwrap();
        assert!(sheet.config().titles().is_suppressed());

        let mut ws = MemoryWorksheet::default();
        sheet.render(&mut ws).unwrap();
        assert_eq!(ws.value(2, 2), &CellValue::Int(1));
        assert_eq!(
            ws.cell(2, 2).and_then(|c| c.number_format()),
            Some("0.00")
        );
        assert_eq!(ws.effective_style(2, 2).bold, Some(true));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_sheet_options_from_json() {
        let options: SheetOptions = serde_json::from_str(
            r#"{
                "start_column": "B",
                "titles": {"0": "Id", "C": "Name"},
                "types": {"1": "string"},
                "formats": false,
                "styles": {"A1:C1": {"bold": true, "fill_color": "FFFF00"}}
            }"#,
        )
        .unwrap();

        assert_eq!(options.start_column, Some(ColumnRef::from("B")));
        assert_eq!(options.formats, Some(ColumnOption::Enabled(false)));
        match &options.titles {
            Some(ColumnOption::Columns(map)) => {
                assert_eq!(map.get(&ColumnRef::Offset(0)).map(String::as_str), Some("Id"));
                assert_eq!(map.get(&ColumnRef::from("C")).map(String::as_str), Some("Name"));
            }
            other => panic!("unexpected titles: {other:?}"),
        }
        assert_eq!(options.styles["A1:C1"].bold, Some(true));
    }
}
