//! Type definitions for cell data

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;

use crate::column::column_label;
use crate::date::{date_serial, excel_serial};
use crate::error::{ExportError, Result};
use crate::style::CellStyle;

/// Spreadsheet error literals recognized by value detection
pub const ERROR_CODES: &[&str] = &[
    "#NULL!", "#DIV/0!", "#VALUE!", "#REF!", "#NAME?", "#NUM!", "#N/A",
];

/// Represents a single cell value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell
    #[default]
    Empty,
    /// String value
    String(String),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Calendar date, written as a serial day number
    Date(NaiveDate),
    /// Date and time, written as a serial number
    DateTime(NaiveDateTime),
    /// Formula value (e.g., "=SUM(A1:A10)")
    Formula(String),
    /// Error value such as `#N/A`
    Error(String),
}

impl CellValue {
    /// Convert cell value to string
    pub fn as_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::String(s) => s.clone(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            CellValue::Formula(f) => f.clone(),
            CellValue::Error(e) => e.clone(),
        }
    }

    /// Check if cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Empty cell or empty string
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Try to convert to integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Float(f) => Some(*f as i64),
            CellValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to convert to float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(f) => Some(*f),
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Date(d) => Some(date_serial(*d)),
            CellValue::DateTime(dt) => Some(excel_serial(*dt)),
            CellValue::String(s) => parse_number(s).and_then(|v| v.as_f64()),
            _ => None,
        }
    }

    /// Try to convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            CellValue::Int(i) => Some(*i != 0),
            CellValue::String(s) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Bind a value to its stored form by inspecting it.
    ///
    /// - strings starting with `=` become formulas
    /// - numeric strings become numbers, unless they have a leading zero
    /// - error literals such as `#N/A` become errors
    /// - dates become serial numbers
    pub fn detect(self) -> CellValue {
        match self {
            CellValue::String(s) => detect_str(s),
            CellValue::Date(d) => CellValue::Float(date_serial(d)),
            CellValue::DateTime(dt) => CellValue::Float(excel_serial(dt)),
            CellValue::Float(f) if !f.is_finite() => CellValue::Error("#NUM!".to_string()),
            other => other,
        }
    }

    /// Coerce a value to an explicit cell type, skipping detection.
    pub fn coerce(self, target: CellType) -> Result<CellValue> {
        let fail = |value: &CellValue| ExportError::TypeCoercion {
            value: value.as_string(),
            target,
        };

        match target {
            CellType::Null => Ok(CellValue::Empty),
            CellType::String => Ok(match self {
                CellValue::Empty => CellValue::Empty,
                v => CellValue::String(v.as_string()),
            }),
            CellType::Numeric => match self {
                CellValue::Empty => Ok(CellValue::Empty),
                CellValue::Int(_) => Ok(self),
                CellValue::Float(f) if f.is_finite() => Ok(self),
                CellValue::Bool(b) => Ok(CellValue::Int(b as i64)),
                CellValue::Date(_) | CellValue::DateTime(_) => Ok(self.detect()),
                CellValue::String(ref s) => parse_number(s).ok_or_else(|| fail(&self)),
                ref v => Err(fail(v)),
            },
            CellType::Bool => match self {
                CellValue::Empty => Ok(CellValue::Bool(false)),
                ref v => v.as_bool().map(CellValue::Bool).ok_or_else(|| fail(v)),
            },
            CellType::Formula => match self {
                CellValue::Empty => Ok(CellValue::Empty),
                v => Ok(CellValue::Formula(v.as_string())),
            },
            CellType::Error => {
                let code = self.as_string();
                if ERROR_CODES.contains(&code.as_str()) {
                    Ok(CellValue::Error(code))
                } else {
                    Err(fail(&self))
                }
            }
        }
    }

    /// Type tag of a bound value
    pub fn cell_type(&self) -> CellType {
        match self {
            CellValue::Empty => CellType::Null,
            CellValue::String(_) => CellType::String,
            CellValue::Int(_)
            | CellValue::Float(_)
            | CellValue::Date(_)
            | CellValue::DateTime(_) => CellType::Numeric,
            CellValue::Bool(_) => CellType::Bool,
            CellValue::Formula(_) => CellType::Formula,
            CellValue::Error(_) => CellType::Error,
        }
    }
}

fn detect_str(s: String) -> CellValue {
    if s.len() > 1 && s.starts_with('=') {
        return CellValue::Formula(s);
    }
    if ERROR_CODES.contains(&s.as_str()) {
        return CellValue::Error(s);
    }
    if has_leading_zero(&s) {
        return CellValue::String(s);
    }
    match parse_number(&s) {
        Some(number) => number,
        None => CellValue::String(s),
    }
}

/// `"0123"` keeps its zero, `"0"` and `"0.5"` are plain numbers
fn has_leading_zero(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    let bytes = digits.as_bytes();
    bytes.len() > 1 && bytes[0] == b'0' && bytes[1] != b'.'
}

/// Parse a plain decimal number; rejects `inf`, `NaN` and hex forms.
fn parse_number(s: &str) -> Option<CellValue> {
    let bytes = s.as_bytes();
    if bytes.is_empty()
        || !bytes.iter().any(|b| b.is_ascii_digit())
        || !bytes
            .iter()
            .all(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(CellValue::Int(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(CellValue::Float)
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i as i64)
    }
}

impl From<u32> for CellValue {
    fn from(i: u32) -> Self {
        CellValue::Int(i as i64)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Empty, Into::into)
    }
}

/// Explicit cell data type, bypassing value detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CellType {
    String,
    Numeric,
    Bool,
    Formula,
    Null,
    Error,
}

/// A worksheet cell: position, bound value, number format and style
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Column index (0-based)
    pub column: u32,
    /// Row index (1-based)
    pub row: u32,
    value: CellValue,
    number_format: Option<String>,
    style: CellStyle,
}

impl Cell {
    /// Create an empty cell
    pub fn new(column: u32, row: u32) -> Self {
        Cell {
            column,
            row,
            value: CellValue::Empty,
            number_format: None,
            style: CellStyle::default(),
        }
    }

    /// Get Excel-style cell reference (e.g., "A1", "B2")
    pub fn coordinate(&self) -> String {
        format!("{}{}", column_label(self.column), self.row)
    }

    pub fn value(&self) -> &CellValue {
        &self.value
    }

    /// Store a value through detection
    pub fn set_value(&mut self, value: impl Into<CellValue>) {
        self.value = value.into().detect();
    }

    /// Store a value coerced to an explicit type
    pub fn set_value_explicit(&mut self, value: impl Into<CellValue>, ty: CellType) -> Result<()> {
        self.value = value.into().coerce(ty)?;
        Ok(())
    }

    pub fn number_format(&self) -> Option<&str> {
        self.number_format.as_deref()
    }

    pub fn set_number_format(&mut self, code: impl Into<String>) {
        self.number_format = Some(code.into());
    }

    /// Style set directly on this cell
    pub fn style(&self) -> &CellStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut CellStyle {
        &mut self.style
    }

    /// Merge `style` over the cell's own style
    pub fn apply_style(&mut self, style: &CellStyle) {
        self.style.merge(style);
    }

    /// Own style with the number format folded in
    pub fn own_style(&self) -> CellStyle {
        let mut style = self.style.clone();
        if let Some(code) = &self.number_format {
            style.number_format = Some(code.clone());
        }
        style
    }

    /// Reset to an empty cell at the same position
    pub fn clear(&mut self) {
        *self = Cell::new(self.column, self.row);
    }
}

/// A source record that yields positional cell values
pub trait RowData {
    fn cells(&self) -> Vec<CellValue>;
}

impl RowData for Vec<CellValue> {
    fn cells(&self) -> Vec<CellValue> {
        self.clone()
    }
}

impl<const N: usize> RowData for [CellValue; N] {
    fn cells(&self) -> Vec<CellValue> {
        self.to_vec()
    }
}

impl RowData for IndexMap<String, CellValue> {
    fn cells(&self) -> Vec<CellValue> {
        self.values().cloned().collect()
    }
}

/// Midnight of `date`
pub(crate) fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}
