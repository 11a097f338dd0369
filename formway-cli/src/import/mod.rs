//! Resumable row-import pipeline
//!
//! The driver walks an ordered row set, skipping rows the status ledger
//! already marks as imported, building one element-creation request per
//! remaining row and recording each outcome back to the ledger so an
//! interrupted run can resume where it left off.

pub mod classify;
pub mod coerce;
pub mod driver;
pub mod ledger;
pub mod mapping;
pub mod payload;
pub mod progress;
pub mod row;

pub use classify::{FieldKind, classify};
pub use coerce::{Coerced, coerce};
pub use driver::{ImportDriver, ImportOutcome, RowError};
pub use ledger::{Ledger, LedgerEntry, LedgerSummary, RowStatus};
pub use mapping::{DetailColumnMapping, FieldMapping, MappingFlags};
pub use payload::{ImportTarget, ItemListTarget, PayloadBuilder};
pub use progress::{ImportTotals, ProgressObserver, RowOutcome, SilentProgress};
pub use row::{CellValue, ImportInput, Row};
