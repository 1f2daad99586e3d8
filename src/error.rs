//! Error types for sheet rendering and workbook export

use thiserror::Error;

use crate::types::CellType;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Broad category of an [`ExportError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing data source, invalid option values, read-only data
    Configuration,
    /// Malformed column labels, ranges or ambiguous column mappings
    ColumnResolution,
    /// Unknown attribute or relation path segment
    AttributeResolution,
    /// Failure while writing styles, titles or rows
    Render,
    /// File system, archive or query backend failure
    Io,
}

/// Main error type for all export operations
#[derive(Error, Debug)]
pub enum ExportError {
    /// The sheet has no row source (or query) to render
    #[error("No data source set for sheet")]
    NoDataSource,

    /// A sheet, file or adapter option has an unusable value
    #[error("Invalid sheet configuration: {0}")]
    InvalidConfig(String),

    /// Rows were assigned to a sheet whose data always comes from its query
    #[error("Data can not be set on a query-bound sheet")]
    ReadOnlyData,

    /// Sheet title violates the spreadsheet naming rules
    #[error("Invalid sheet title '{title}': {reason}")]
    InvalidSheetTitle { title: String, reason: String },

    /// Column label is not a valid letter label
    #[error("Invalid column reference '{0}'")]
    InvalidColumnReference(String),

    /// Two keys of one column mapping point at the same column
    #[error("Column keys '{first}' and '{second}' both resolve to column {column}")]
    ConflictingColumnMapping {
        first: String,
        second: String,
        column: u32,
    },

    /// Cell coordinate or range string could not be parsed
    #[error("Invalid cell range '{0}'")]
    InvalidRange(String),

    /// An attribute path segment does not resolve on its model
    #[error("Unknown attribute '{attribute}': '{segment}' is not a relation of '{model}'")]
    UnknownAttribute {
        attribute: String,
        segment: String,
        model: String,
    },

    /// Failure while rendering a cell, tagged with its position
    #[error("Failed to render cell {cell} (column {column}, row {row}): {source}")]
    Render {
        row: u32,
        column: u32,
        cell: String,
        #[source]
        source: Box<ExportError>,
    },

    /// Failure while applying a style rule
    #[error("Failed to apply style '{range}': {source}")]
    StyleRule {
        range: String,
        #[source]
        source: Box<ExportError>,
    },

    /// A value formatter reported an error
    #[error("Formatter failed: {0}")]
    Formatter(String),

    /// A cell callback reported an error
    #[error("Callback failed: {0}")]
    Callback(String),

    /// Value can not be stored under an explicit cell type
    #[error("Can not store '{value}' as {target:?}")]
    TypeCoercion { value: String, target: CellType },

    /// Value is not usable for the requested conversion
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Streaming worksheet already wrote this row out
    #[error("Row {row} was already written and can not be modified")]
    RowFlushed { row: u32 },

    /// Coordinate beyond the worksheet limits
    #[error("Cell (column {column}, row {row}) is outside the worksheet bounds")]
    CellOutOfBounds { column: u32, row: u32 },

    /// Row source or query backend failure
    #[error("Query failed: {0}")]
    Query(String),

    /// Error occurred while writing the Excel file
    #[error("Failed to write Excel file: {0}")]
    WriteError(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ExportError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::NoDataSource
            | ExportError::InvalidConfig(_)
            | ExportError::ReadOnlyData
            | ExportError::InvalidSheetTitle { .. } => ErrorKind::Configuration,
            ExportError::InvalidColumnReference(_)
            | ExportError::ConflictingColumnMapping { .. }
            | ExportError::InvalidRange(_) => ErrorKind::ColumnResolution,
            ExportError::UnknownAttribute { .. } => ErrorKind::AttributeResolution,
            ExportError::Render { .. }
            | ExportError::StyleRule { .. }
            | ExportError::Formatter(_)
            | ExportError::Callback(_)
            | ExportError::TypeCoercion { .. }
            | ExportError::InvalidValue(_)
            | ExportError::RowFlushed { .. }
            | ExportError::CellOutOfBounds { .. } => ErrorKind::Render,
            ExportError::Query(_) | ExportError::WriteError(_) | ExportError::IoError(_) => {
                ErrorKind::Io
            }
        }
    }

    /// Tag this error with the cell it occurred at.
    ///
    /// Errors that already carry a cell position are returned unchanged.
    pub fn at_cell(self, column: u32, row: u32) -> ExportError {
        match self {
            err @ ExportError::Render { .. } => err,
            err => ExportError::Render {
                row,
                column,
                cell: format!("{}{}", crate::column::column_label(column), row),
                source: Box::new(err),
            },
        }
    }

    /// Innermost error, skipping position wrappers
    pub fn root(&self) -> &ExportError {
        match self {
            ExportError::Render { source, .. } | ExportError::StyleRule { source, .. } => {
                source.root()
            }
            err => err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_cell_wraps_once() {
        let err = ExportError::Formatter("boom".to_string()).at_cell(1, 4);
        match &err {
            ExportError::Render {
                row, column, cell, ..
            } => {
                assert_eq!((*row, *column), (4, 1));
                assert_eq!(cell, "B4");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = err.at_cell(7, 9);
        assert!(matches!(err, ExportError::Render { row: 4, column: 1, .. }));
        assert!(matches!(err.root(), ExportError::Formatter(_)));
        assert_eq!(err.kind(), ErrorKind::Render);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ExportError::ReadOnlyData.kind(), ErrorKind::Configuration);
        assert_eq!(
            ExportError::InvalidColumnReference("A1".to_string()).kind(),
            ErrorKind::ColumnResolution
        );
        assert_eq!(
            ExportError::UnknownAttribute {
                attribute: "a.b".to_string(),
                segment: "a".to_string(),
                model: "m".to_string(),
            }
            .kind(),
            ErrorKind::AttributeResolution
        );
    }
}
