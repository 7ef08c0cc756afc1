//! Validation stages of the cleaning pipeline.
//!
//! [`FieldValidator`] checks and coerces single cells, [`RowNormalizer`]
//! applies it across a row, and [`UniquenessIndex`] enforces row-key and
//! per-column uniqueness over the normalized rows.

pub mod field;
pub mod row;
pub mod uniqueness;

pub use field::{CellVerdict, FieldValidator, parse_boolean, parse_date, parse_integer};
pub use row::{NormalizedRow, RowNormalizer};
pub use uniqueness::UniquenessIndex;
