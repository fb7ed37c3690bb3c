//! Dynamic result sets for callers that have no target type to decode into.

mod result_set;
mod row;

pub use result_set::ResultSet;
pub use row::CustomDbRow;
