//! Column addressing: letter labels, 0-based offsets and the start-column shift
//!
//! A column can be referenced in two ways:
//!
//! - by label (`"A"`, `"B"`, ..., `"AA"`), an absolute position that is never
//!   shifted, or
//! - by 0-based offset, which is relative to the sheet's start column.
//!
//! [`ColumnResolver`] turns both into one absolute 0-based column index.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::{ExportError, Result};

/// Excel worksheet maximum row count.
pub const MAX_ROWS: u32 = 1_048_576;
/// Excel worksheet maximum column count.
pub const MAX_COLUMNS: u32 = 16_384;

/// Labels longer than this can not address a valid column (`XFD` is the last).
const MAX_LABEL_LEN: usize = 3;

/// Column referenced either by 0-based offset or by letter label
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnRef {
    /// 0-based offset, shifted by the start column
    Offset(u32),
    /// Letter label (`"A"`, `"AB"`), absolute
    Label(String),
}

impl ColumnRef {
    /// Whether this reference is an absolute letter label
    pub fn is_label(&self) -> bool {
        matches!(self, ColumnRef::Label(_))
    }
}

impl Default for ColumnRef {
    fn default() -> Self {
        ColumnRef::Label("A".to_string())
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Offset(n) => write!(f, "{}", n),
            ColumnRef::Label(s) => write!(f, "{}", s),
        }
    }
}

impl From<u32> for ColumnRef {
    fn from(n: u32) -> Self {
        ColumnRef::Offset(n)
    }
}

impl From<usize> for ColumnRef {
    fn from(n: usize) -> Self {
        ColumnRef::Offset(n as u32)
    }
}

impl From<&str> for ColumnRef {
    fn from(s: &str) -> Self {
        ColumnRef::Label(s.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(s: String) -> Self {
        ColumnRef::Label(s)
    }
}

impl From<&ColumnRef> for ColumnRef {
    fn from(r: &ColumnRef) -> Self {
        r.clone()
    }
}

/// Parses config keys: all-digit strings are offsets, anything else a label.
impl FromStr for ColumnRef {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse::<u32>()
                .map(ColumnRef::Offset)
                .map_err(|_| ExportError::InvalidColumnReference(s.to_string()));
        }
        label_to_index(s)?;
        Ok(ColumnRef::Label(s.to_string()))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ColumnRef {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ColumnRef::Offset(n) => serializer.serialize_u32(*n),
            ColumnRef::Label(s) => serializer.serialize_str(s),
        }
    }
}

/// Accepts integers and strings; map keys such as `"2"` become offsets.
#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ColumnRef {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;

        impl serde::de::Visitor<'_> for Visitor {
            type Value = ColumnRef;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a column offset or letter label")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<ColumnRef, E> {
                u32::try_from(v)
                    .map(ColumnRef::Offset)
                    .map_err(|_| E::custom(format!("column offset {} is too large", v)))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<ColumnRef, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("column offset {} is negative", v)))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<ColumnRef, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

/// Convert a letter label to its 0-based column index (`A` -> 0, `AA` -> 26).
pub fn label_to_index(label: &str) -> Result<u32> {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return Err(ExportError::InvalidColumnReference(label.to_string()));
    }

    let mut n: u32 = 0;
    for b in label.bytes() {
        if !b.is_ascii_alphabetic() {
            return Err(ExportError::InvalidColumnReference(label.to_string()));
        }
        n = n * 26 + (b.to_ascii_uppercase() - b'A') as u32 + 1;
    }

    if n > MAX_COLUMNS {
        return Err(ExportError::InvalidColumnReference(label.to_string()));
    }
    Ok(n - 1)
}

/// Convert a 0-based column index to its letter label (0 -> `A`, 26 -> `AA`).
pub fn column_label(index: u32) -> String {
    let mut buf = Vec::with_capacity(MAX_LABEL_LEN);
    push_column_label(&mut buf, index);
    // Only ASCII letters are pushed
    String::from_utf8(buf).unwrap_or_default()
}

/// Append the letter label of a 0-based column index to `buffer`.
pub fn push_column_label(buffer: &mut Vec<u8>, index: u32) {
    let mut tmp = [0u8; 8];
    let mut len = 0;
    let mut n = index as u64 + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        tmp[len] = b'A' + rem as u8;
        len += 1;
        n = (n - 1) / 26;
    }
    for i in (0..len).rev() {
        buffer.push(tmp[i]);
    }
}

/// Resolves column references relative to a fixed start column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnResolver {
    start: u32,
}

impl ColumnResolver {
    /// Create a resolver for the given start column.
    ///
    /// A label start column resolves by the label rule, a numeric one is taken
    /// as its literal absolute offset.
    pub fn new(start_column: &ColumnRef) -> Result<Self> {
        let start = match start_column {
            ColumnRef::Label(label) => label_to_index(label)?,
            ColumnRef::Offset(n) => *n,
        };
        Ok(ColumnResolver { start })
    }

    /// Absolute 0-based index of the start column
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Resolve a reference to its absolute 0-based column index
    pub fn resolve(&self, column: &ColumnRef) -> Result<u32> {
        match column {
            ColumnRef::Label(label) => label_to_index(label),
            ColumnRef::Offset(n) => n.checked_add(self.start).ok_or_else(|| {
                ExportError::InvalidColumnReference(column.to_string())
            }),
        }
    }

    /// Rewrite every key of a column mapping to its absolute column index.
    ///
    /// Fails if two keys of the mapping land on the same column.
    pub fn normalize_map<T, I>(&self, mapping: I) -> Result<BTreeMap<u32, T>>
    where
        I: IntoIterator<Item = (ColumnRef, T)>,
    {
        let mut seen: BTreeMap<u32, ColumnRef> = BTreeMap::new();
        let mut result = BTreeMap::new();
        for (key, value) in mapping {
            let column = self.resolve(&key)?;
            if let Some(first) = seen.get(&column) {
                return Err(ExportError::ConflictingColumnMapping {
                    first: first.to_string(),
                    second: key.to_string(),
                    column,
                });
            }
            seen.insert(column, key);
            result.insert(column, value);
        }
        Ok(result)
    }
}

/// Column-indexed configuration mapping, in declaration order
pub type ColumnMap<T> = IndexMap<ColumnRef, T>;

/// Build a [`ColumnMap`] from any `(key, value)` pairs.
pub fn column_map<K, V, T, I>(entries: I) -> ColumnMap<T>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<ColumnRef>,
    V: Into<T>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Parse a cell coordinate such as `"B3"` into `(column, row)`.
///
/// Columns are 0-based, rows are 1-based as displayed in spreadsheets.
pub fn parse_coordinate(coordinate: &str) -> Result<(u32, u32)> {
    let coordinate = coordinate.trim();
    let split = coordinate
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| ExportError::InvalidRange(coordinate.to_string()))?;
    let (letters, digits) = coordinate.split_at(split);

    let column =
        label_to_index(letters).map_err(|_| ExportError::InvalidRange(coordinate.to_string()))?;
    let row = digits
        .parse::<u32>()
        .ok()
        .filter(|r| (1..=MAX_ROWS).contains(r))
        .ok_or_else(|| ExportError::InvalidRange(coordinate.to_string()))?;

    Ok((column, row))
}

/// Rectangular block of cells, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub first_column: u32,
    pub first_row: u32,
    pub last_column: u32,
    pub last_row: u32,
}

impl CellRange {
    /// Range covering a single cell
    pub fn cell(column: u32, row: u32) -> Self {
        CellRange {
            first_column: column,
            first_row: row,
            last_column: column,
            last_row: row,
        }
    }

    /// Parse `"A1"` or `"A1:C10"`; reversed corners are normalized.
    pub fn parse(range: &str) -> Result<Self> {
        let (from, to) = match range.split_once(':') {
            Some((from, to)) => (parse_coordinate(from)?, parse_coordinate(to)?),
            None => {
                let cell = parse_coordinate(range)?;
                (cell, cell)
            }
        };

        Ok(CellRange {
            first_column: from.0.min(to.0),
            first_row: from.1.min(to.1),
            last_column: from.0.max(to.0),
            last_row: from.1.max(to.1),
        })
    }

    pub fn contains(&self, column: u32, row: u32) -> bool {
        self.covers_row(row) && (self.first_column..=self.last_column).contains(&column)
    }

    pub fn covers_row(&self, row: u32) -> bool {
        (self.first_row..=self.last_row).contains(&row)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            column_label(self.first_column),
            self.first_row
        )?;
        if self.first_column != self.last_column || self.first_row != self.last_row {
            write!(f, ":{}{}", column_label(self.last_column), self.last_row)?;
        }
        Ok(())
    }
}

impl FromStr for CellRange {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        CellRange::parse(s)
    }
}
