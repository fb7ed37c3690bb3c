//! Row decoding capabilities.
//!
//! Struct-shaped targets implement [`FromRow`] and are matched by column name, usually through
//! [`impl_from_row!`](crate::impl_from_row). Scalar targets use the driver's own
//! [`FromSqlOwned`] and are matched by position.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSqlOwned, Type};

use crate::error::PgMiddlewareError;
use crate::results::ResultSet;
use crate::types::{JsonMap, RowValues};

/// Build a value from one result row.
pub trait FromRow: Sized {
    /// # Errors
    /// Returns an error if the row's shape or column types don't match `Self`.
    fn from_row(row: &Row) -> Result<Self, PgMiddlewareError>;
}

/// Implement [`FromRow`] for a struct by matching each field to the column of the same name.
///
/// A field written `field = "column"` reads from `column` instead, for aliased or quoted
/// column names. The row must have exactly one column per listed field, no more and no fewer.
///
/// ```rust
/// use pg_middleware::impl_from_row;
///
/// struct Account {
///     id: i32,
///     name: String,
///     created_by: String,
/// }
///
/// impl_from_row!(Account { id, name, created_by = "Created By" });
/// ```
#[macro_export]
macro_rules! impl_from_row {
    ($ty:ident { $($field:ident $(= $column:literal)?),+ $(,)? }) => {
        impl $crate::FromRow for $ty {
            fn from_row(
                row: &$crate::Row,
            ) -> ::std::result::Result<Self, $crate::PgMiddlewareError> {
                $crate::decode::check_columns(
                    row,
                    stringify!($ty),
                    &[$($crate::__from_row_column!($field $(, $column)?)),+],
                )?;
                Ok(Self {
                    $($field: row.try_get($crate::__from_row_column!($field $(, $column)?))?,)+
                })
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __from_row_column {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $column:literal) => {
        $column
    };
}

/// Verify the row carries exactly the named columns.
///
/// # Errors
/// Returns `PgMiddlewareError::DecodeError` naming the first missing or unexpected column.
#[doc(hidden)]
pub fn check_columns(row: &Row, target: &str, fields: &[&str]) -> Result<(), PgMiddlewareError> {
    let columns = row.columns();
    if let Some(missing) = fields
        .iter()
        .find(|f| !columns.iter().any(|c| c.name() == **f))
    {
        return Err(PgMiddlewareError::DecodeError(format!(
            "no column named {missing} for {target}"
        )));
    }
    if let Some(extra) = columns.iter().find(|c| !fields.contains(&c.name())) {
        return Err(PgMiddlewareError::DecodeError(format!(
            "column {} has no matching field in {target}",
            extra.name()
        )));
    }
    if columns.len() != fields.len() {
        return Err(PgMiddlewareError::DecodeError(format!(
            "{target} has {} fields but the row has {} columns",
            fields.len(),
            columns.len()
        )));
    }
    Ok(())
}

// Tuples decode positionally, handy for two- or three-column projections.
macro_rules! tuple_from_row {
    ($len:expr => $($name:ident : $idx:tt),+) => {
        impl<$($name: FromSqlOwned),+> FromRow for ($($name,)+) {
            fn from_row(row: &Row) -> Result<Self, PgMiddlewareError> {
                expect_columns(row, $len)?;
                Ok(($(row.try_get::<usize, $name>($idx)?,)+))
            }
        }
    };
}

tuple_from_row!(1 => A: 0);
tuple_from_row!(2 => A: 0, B: 1);
tuple_from_row!(3 => A: 0, B: 1, C: 2);
tuple_from_row!(4 => A: 0, B: 1, C: 2, D: 3);

fn expect_columns(row: &Row, expected: usize) -> Result<(), PgMiddlewareError> {
    if row.len() == expected {
        Ok(())
    } else {
        Err(PgMiddlewareError::DecodeError(format!(
            "expected {expected} column(s), row has {}",
            row.len()
        )))
    }
}

/// Decode a single-column row positionally.
///
/// # Errors
/// Returns `DecodeError` when the row has more or fewer than one column, or the driver's
/// error when the column type doesn't convert to `T`.
pub fn decode_scalar<T: FromSqlOwned>(row: &Row) -> Result<T, PgMiddlewareError> {
    expect_columns(row, 1)?;
    Ok(row.try_get(0_usize)?)
}

/// Decode a single `json`/`jsonb` column holding an object.
///
/// # Errors
/// Returns `DecodeError` for NULL or non-object JSON.
pub fn decode_json_object(row: &Row) -> Result<JsonMap, PgMiddlewareError> {
    match decode_scalar::<Option<Value>>(row)? {
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(PgMiddlewareError::DecodeError(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        None => Err(PgMiddlewareError::DecodeError(
            "expected a JSON object, got NULL".to_string(),
        )),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Take the only row out of `rows`.
///
/// # Errors
/// `NoRows` for an empty set, `TooManyRows` for more than one.
pub fn exactly_one(mut rows: Vec<Row>) -> Result<Row, PgMiddlewareError> {
    match rows.len() {
        0 => Err(PgMiddlewareError::NoRows),
        1 => rows.pop().ok_or(PgMiddlewareError::NoRows),
        n => Err(PgMiddlewareError::TooManyRows(n)),
    }
}

/// Extracts a `RowValues` from a row at the given index.
///
/// # Errors
/// Returns the driver's error if the column cannot be read, or `DecodeError` for column
/// types `RowValues` has no variant for.
pub fn extract_value(row: &Row, idx: usize) -> Result<RowValues, PgMiddlewareError> {
    let column = &row.columns()[idx];
    let value = match *column.type_() {
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|v| RowValues::Int(i64::from(v))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|v| RowValues::Int(i64::from(v))),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(RowValues::Int),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| RowValues::Float(f64::from(v))),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.map(RowValues::Float),
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.map(RowValues::Bool),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(RowValues::Timestamp),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(|v| RowValues::Timestamp(v.naive_utc())),
        Type::JSON | Type::JSONB => row.try_get::<_, Option<Value>>(idx)?.map(RowValues::JSON),
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(RowValues::Blob),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            row.try_get::<_, Option<String>>(idx)?.map(RowValues::Text)
        }
        ref other => {
            return Err(PgMiddlewareError::DecodeError(format!(
                "column {} has unsupported type {other}",
                column.name()
            )));
        }
    };
    Ok(value.unwrap_or(RowValues::Null))
}

/// Build a dynamic result set; column names come from the statement so an empty result
/// still reports them.
///
/// # Errors
/// Returns errors from [`extract_value`].
pub fn build_result_set(
    column_names: Vec<String>,
    rows: &[Row],
) -> Result<ResultSet, PgMiddlewareError> {
    let column_count = column_names.len();
    let mut result_set = ResultSet::with_capacity(column_names, rows.len());
    for row in rows {
        let mut row_values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            row_values.push(extract_value(row, idx)?);
        }
        result_set.add_row_values(row_values);
    }
    Ok(result_set)
}
