//! Single-row rendering over resolved column configuration

use std::collections::BTreeMap;

use crate::error::Result;
use crate::property::{Callback, Formatter};
use crate::types::{CellType, CellValue};
use crate::worksheet::Worksheet;

/// Column configuration for the streaming phase, keyed by absolute column
pub struct ResolvedColumns<R> {
    pub formats: BTreeMap<u32, String>,
    pub formatters: BTreeMap<u32, Formatter<R>>,
    pub callbacks: BTreeMap<u32, Callback>,
    pub types: BTreeMap<u32, CellType>,
}

impl<R> Default for ResolvedColumns<R> {
    fn default() -> Self {
        ResolvedColumns {
            formats: BTreeMap::new(),
            formatters: BTreeMap::new(),
            callbacks: BTreeMap::new(),
            types: BTreeMap::new(),
        }
    }
}

/// Write one record's values starting at `first_column`.
///
/// Per cell: formatter, then the value write (explicit type or detection),
/// then the number format, then the callback. Failures carry the cell
/// position.
pub fn render_row<W, R>(
    worksheet: &mut W,
    values: Vec<CellValue>,
    record: &R,
    row: u32,
    first_column: u32,
    columns: &ResolvedColumns<R>,
) -> Result<()>
where
    W: Worksheet + ?Sized,
{
    for (i, value) in values.into_iter().enumerate() {
        let column = first_column + i as u32;
        render_cell(worksheet, value, record, column, row, columns)
            .map_err(|e| e.at_cell(column, row))?;
    }
    Ok(())
}

fn render_cell<W, R>(
    worksheet: &mut W,
    mut value: CellValue,
    record: &R,
    column: u32,
    row: u32,
    columns: &ResolvedColumns<R>,
) -> Result<()>
where
    W: Worksheet + ?Sized,
{
    if let Some(formatter) = columns.formatters.get(&column) {
        value = formatter(value, row, record)?;
    }

    let cell = match columns.types.get(&column) {
        Some(&ty) => worksheet.set_cell_value_explicit(column, row, value, ty)?,
        None => worksheet.set_cell_value(column, row, value)?,
    };

    if let Some(code) = columns.formats.get(&column) {
        cell.set_number_format(code.as_str());
    }

    if let Some(callback) = columns.callbacks.get(&column) {
        callback(cell, column, row)?;
    }
    Ok(())
}
