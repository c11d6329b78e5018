//! Export to the fixed-column spreadsheet schema.

pub mod columns;
mod rows;
mod table;

pub use rows::*;
pub use table::*;
