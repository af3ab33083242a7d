//! Expense ingestion: turns whatever CSV the export produced into
//! canonical [`ExpenseRecord`]s.
//!
//! Column names vary with export settings, so every canonical field is
//! resolved through the static [`aliases::COLUMN_ALIASES`] table, and
//! every value is coerced leniently: a bad cell degrades to a default,
//! never fails its row.

pub mod aliases;
pub mod normalize;
pub mod record;
pub mod summary;

pub use aliases::{Field, COLUMN_ALIASES};
pub use normalize::{parse, parse_reader};
pub use record::ExpenseRecord;
pub use summary::ExpenseSummary;
