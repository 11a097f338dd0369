//! Excel-backed row source
//!
//! Reads the mapping sheets and data rows the import driver consumes. The
//! core pipeline only ever sees the resulting `ImportInput`; nothing else
//! in the crate touches workbook parsing.

pub mod reader;

pub use reader::{WorkbookOptions, read_workbook};
