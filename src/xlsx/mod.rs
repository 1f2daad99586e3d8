//! Streaming XLSX writer
//!
//! This module provides the workbook backend for file export:
//! - Direct XML generation with inline strings
//! - Deduplicated style table
//! - Row-window worksheets streamed into the ZIP compressor

pub mod styles;
pub mod workbook;
mod worksheet;
pub mod xml_writer;

pub use styles::StyleTable;
pub use workbook::{XlsxWorkbook, DEFAULT_COMPRESSION};
pub use xml_writer::XmlWriter;
