//! Query-bound sheets
//!
//! [`ActiveSheet`] renders the records of a [`RecordQuery`], fetched in
//! batches. Titles come from model attribute labels and date, datetime and
//! decimal columns get number formats and value formatters derived from the
//! model's column metadata. Anything set explicitly on the sheet config is
//! merged over these defaults.
//!
//! ```rust
//! use std::sync::Arc;
//! use excelexport::active::{ActiveSheet, DataKind, MemoryQuery, ModelSchema, Record, SchemaRegistry};
//! use excelexport::sheet::Sheet;
//! use excelexport::worksheet::MemoryWorksheet;
//!
//! # fn main() -> excelexport::Result<()> {
//! let registry = SchemaRegistry::new().with_model(
//!     ModelSchema::new("user")
//!         .column("name", DataKind::Plain)
//!         .column("joined", DataKind::Date),
//! );
//! let query = MemoryQuery::new("user", vec![Record::new().with("name", "Ada").with("joined", "2017-12-05")]);
//!
//! let mut sheet = ActiveSheet::new(query, Arc::new(registry));
//! let mut worksheet = MemoryWorksheet::new("Users");
//! sheet.render(&mut worksheet)?;
//!
//! assert_eq!(worksheet.value(0, 1).as_string(), "Name");
//! assert_eq!(worksheet.value(1, 2).as_f64(), Some(43074.0));
//! # Ok(())
//! # }
//! ```

pub mod record;
pub mod schema;
pub mod timezone;

use std::sync::Arc;

use crate::column::{ColumnMap, ColumnRef};
use crate::date::{excel_serial, parse_datetime};
use crate::error::{ExportError, Result};
use crate::property::Formatter;
use crate::sheet::{ColumnDefaults, RenderSummary, RowSource, Sheet, SheetConfig};
use crate::types::{start_of_day, CellValue};
use crate::worksheet::Worksheet;

pub use record::{BatchRows, Field, MemoryQuery, Record, RecordQuery, SortOrder};
pub use schema::{
    attribute_label, generate_label, resolve_schema, ColumnSchema, DataKind, FieldMeta,
    ModelMetadata, ModelSchema, SchemaRegistry,
};
pub use timezone::{TimeZoneCorrection, TimeZones};

/// Options of query-bound sheets
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ActiveSheetOptions {
    /// Number format of date columns
    pub date_format: String,
    /// Number format of datetime columns
    pub datetime_format: String,
    /// Records fetched per query
    pub batch_size: usize,
    pub time_zones: TimeZones,
}

impl Default for ActiveSheetOptions {
    fn default() -> Self {
        ActiveSheetOptions {
            date_format: "dd/mm/yyyy".to_string(),
            datetime_format: "dd/mm/yyyy hh:mm:ss".to_string(),
            batch_size: 100,
            time_zones: TimeZones::default(),
        }
    }
}

/// Number format with thousands grouping and `scale` decimal places
pub fn decimal_format(scale: u32) -> String {
    let mut code = String::from("#,##0");
    if scale > 0 {
        code.push('.');
        code.extend(std::iter::repeat('0').take(scale as usize));
    }
    code
}

/// Convert a stored date value to a serial number, leaving the time zone
/// alone. Blank values stay empty and numbers pass through.
fn date_value(value: CellValue) -> Result<CellValue> {
    let datetime = match value {
        CellValue::Empty => return Ok(CellValue::Empty),
        CellValue::String(s) if s.trim().is_empty() => return Ok(CellValue::Empty),
        CellValue::String(s) => parse_datetime(&s)?,
        CellValue::Date(d) => start_of_day(d),
        CellValue::DateTime(dt) => dt,
        other => return Ok(other),
    };
    Ok(CellValue::Float(excel_serial(datetime)))
}

/// Formatter turning stored dates into serial numbers
pub fn date_formatter() -> Formatter<Record> {
    Arc::new(|value: CellValue, _row: u32, _record: &Record| date_value(value))
}

/// Formatter turning stored datetimes into display zone serial numbers
pub fn datetime_formatter(correction: TimeZoneCorrection) -> Formatter<Record> {
    Arc::new(move |value: CellValue, _row: u32, _record: &Record| {
        let datetime = match value {
            CellValue::String(s) if !s.trim().is_empty() => parse_datetime(&s)?,
            CellValue::Date(d) => start_of_day(d),
            CellValue::DateTime(dt) => dt,
            other => return date_value(other),
        };
        Ok(CellValue::Float(excel_serial(correction.correct(datetime)?)))
    })
}

/// Column defaults derived from model metadata
struct DerivedColumns<'a> {
    metadata: &'a dyn ModelMetadata,
    model: &'a str,
    attributes: &'a [String],
    schemas: &'a [Option<ColumnSchema>],
    options: &'a ActiveSheetOptions,
}

impl DerivedColumns<'_> {
    fn kinds(&self) -> impl Iterator<Item = (ColumnRef, DataKind)> + '_ {
        self.schemas
            .iter()
            .enumerate()
            .filter_map(|(i, schema)| schema.as_ref().map(|s| (ColumnRef::from(i), s.kind)))
    }
}

impl ColumnDefaults<Record> for DerivedColumns<'_> {
    fn titles(&mut self) -> Result<ColumnMap<String>> {
        Ok(self
            .attributes
            .iter()
            .enumerate()
            .map(|(i, attribute)| {
                (
                    ColumnRef::from(i),
                    attribute_label(self.metadata, self.model, attribute),
                )
            })
            .collect())
    }

    fn formats(&mut self) -> Result<ColumnMap<String>> {
        Ok(self
            .kinds()
            .filter_map(|(column, kind)| {
                let code = match kind {
                    DataKind::Date => self.options.date_format.clone(),
                    DataKind::DateTime => self.options.datetime_format.clone(),
                    DataKind::Decimal { scale } => decimal_format(scale),
                    DataKind::Plain | DataKind::Other => return None,
                };
                Some((column, code))
            })
            .collect())
    }

    fn formatters(&mut self) -> Result<ColumnMap<Formatter<Record>>> {
        let correction = TimeZoneCorrection::new(self.options.time_zones);
        Ok(self
            .kinds()
            .filter_map(|(column, kind)| match kind {
                DataKind::Date => Some((column, date_formatter())),
                DataKind::DateTime => Some((column, datetime_formatter(correction))),
                _ => None,
            })
            .collect())
    }
}

/// Sheet rendering the records of a query
pub struct ActiveSheet<Q> {
    config: SheetConfig<Record>,
    options: ActiveSheetOptions,
    query: Q,
    metadata: Arc<dyn ModelMetadata>,
    model: Option<String>,
    attributes: Option<Vec<String>>,
    column_schemas: Option<Vec<Option<ColumnSchema>>>,
}

impl<Q: RecordQuery> ActiveSheet<Q> {
    pub fn new(query: Q, metadata: Arc<dyn ModelMetadata>) -> Self {
        Self::with_options(query, metadata, ActiveSheetOptions::default())
    }

    pub fn with_options(
        query: Q,
        metadata: Arc<dyn ModelMetadata>,
        options: ActiveSheetOptions,
    ) -> Self {
        ActiveSheet {
            config: SheetConfig::default(),
            options,
            query,
            metadata,
            model: None,
            attributes: None,
            column_schemas: None,
        }
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut Q {
        &mut self.query
    }

    pub fn options(&self) -> &ActiveSheetOptions {
        &self.options
    }

    /// Changing options resets derived defaults
    pub fn set_options(&mut self, options: ActiveSheetOptions) -> &mut Self {
        self.options = options;
        self.config.clear_defaults();
        self
    }

    /// Model used for metadata lookups; the query's model unless overridden
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or_else(|| self.query.model())
    }

    pub fn set_model(&mut self, model: impl Into<String>) -> &mut Self {
        self.model = Some(model.into());
        self.reset_columns();
        self
    }

    /// Exported attributes; all model columns unless set
    pub fn attributes(&mut self) -> Result<&[String]> {
        if self.attributes.is_none() {
            let attributes = self.metadata.attributes(self.model())?;
            self.attributes = Some(attributes);
        }
        Ok(self.attributes.as_deref().unwrap_or_default())
    }

    /// Set the exported attributes; dotted paths follow relations
    pub fn set_attributes<I, S>(&mut self, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = Some(attributes.into_iter().map(Into::into).collect());
        self.reset_columns();
        self
    }

    /// Column metadata per exported attribute, `None` for attributes that
    /// are not model columns
    pub fn column_schemas(&mut self) -> Result<&[Option<ColumnSchema>]> {
        if self.column_schemas.is_none() {
            let attributes = self.attributes()?.to_vec();
            let model = self.model().to_string();
            let mut schemas = Vec::with_capacity(attributes.len());
            for attribute in &attributes {
                let schema = resolve_schema(&*self.metadata, &model, attribute)?;
                if schema.is_none() {
                    log::debug!(
                        "no column metadata for '{}' on '{}', skipping derived defaults",
                        attribute,
                        model
                    );
                }
                schemas.push(schema);
            }
            self.column_schemas = Some(schemas);
        }
        Ok(self.column_schemas.as_deref().unwrap_or_default())
    }

    fn reset_columns(&mut self) {
        self.column_schemas = None;
        self.config.clear_defaults();
    }
}

impl<Q: RecordQuery> Sheet for ActiveSheet<Q> {
    type Record = Record;

    fn config(&self) -> &SheetConfig<Record> {
        &self.config
    }

    fn config_mut(&mut self) -> &mut SheetConfig<Record> {
        &mut self.config
    }

    /// Rows always come from the query
    fn set_data(&mut self, _rows: RowSource<Record>) -> Result<()> {
        Err(ExportError::ReadOnlyData)
    }

    fn render(&mut self, worksheet: &mut dyn Worksheet) -> Result<RenderSummary> {
        let schemas = self.column_schemas()?.to_vec();
        let attributes = self.attributes()?.to_vec();
        let model = self.model().to_string();

        let rows = BatchRows::new(&mut self.query, self.options.batch_size)?;
        let mut defaults = DerivedColumns {
            metadata: &*self.metadata,
            model: &model,
            attributes: &attributes,
            schemas: &schemas,
            options: &self.options,
        };
        self.config.render_with(worksheet, &mut defaults, rows, |record| {
            attributes.iter().map(|a| record.value(a)).collect()
        })
    }
}
