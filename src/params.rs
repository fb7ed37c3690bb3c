use std::error::Error;

use chrono::{DateTime, Utc};
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_util::bytes;

use crate::types::RowValues;

/// Borrowed view of a parameter slice in the form `tokio_postgres` expects.
pub struct Params<'a> {
    references: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Params<'a> {
    pub fn convert(params: &'a [RowValues]) -> Params<'a> {
        let mut references = Vec::with_capacity(params.len());
        for p in params {
            references.push(p as &(dyn ToSql + Sync));
        }
        Params { references }
    }

    #[must_use]
    pub fn as_refs(&self) -> &[&(dyn ToSql + Sync)] {
        &self.references
    }
}

fn narrow<T, U>(value: T, ty: &Type) -> Result<U, Box<dyn Error + Sync + Send>>
where
    T: Copy + std::fmt::Display,
    U: TryFrom<T>,
{
    U::try_from(value)
        .map_err(|_| format!("value {value} out of range for postgres type {ty}").into())
}

/// Largest magnitude an `f64` holds without losing integer precision.
const F64_EXACT_INT: i64 = 1 << 53;

#[allow(clippy::cast_precision_loss)]
fn int_to_f64(value: i64, ty: &Type) -> Result<f64, Box<dyn Error + Sync + Send>> {
    if value.unsigned_abs() > F64_EXACT_INT.unsigned_abs() {
        return Err(
            format!("value {value} cannot be represented exactly as postgres type {ty}").into(),
        );
    }
    Ok(value as f64)
}

#[allow(clippy::cast_possible_truncation)]
fn float_to_f32(value: f64, ty: &Type) -> Result<f32, Box<dyn Error + Sync + Send>> {
    if value.is_finite() && value.abs() > f64::from(f32::MAX) {
        return Err(format!("value {value} out of range for postgres type {ty}").into());
    }
    Ok(value as f32)
}

impl ToSql for RowValues {
    // The server infers one type per placeholder; RowValues is widened, so
    // narrow to whatever it asked for instead of sending the wrong width.
    // Anything else goes through the inner value's checked encoder, which
    // rejects a variant that doesn't match the placeholder type.
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            RowValues::Int(i) => match *ty {
                Type::INT2 => narrow::<i64, i16>(*i, ty)?.to_sql(ty, out),
                Type::INT4 => narrow::<i64, i32>(*i, ty)?.to_sql(ty, out),
                Type::FLOAT8 => int_to_f64(*i, ty)?.to_sql(ty, out),
                _ => i.to_sql_checked(ty, out),
            },
            RowValues::Float(f) => match *ty {
                Type::FLOAT4 => float_to_f32(*f, ty)?.to_sql(ty, out),
                _ => f.to_sql_checked(ty, out),
            },
            RowValues::Text(s) => s.to_sql_checked(ty, out),
            RowValues::Bool(b) => b.to_sql_checked(ty, out),
            RowValues::Timestamp(dt) => match *ty {
                Type::TIMESTAMPTZ => {
                    DateTime::<Utc>::from_naive_utc_and_offset(*dt, Utc).to_sql(ty, out)
                }
                Type::DATE => dt.date().to_sql(ty, out),
                _ => dt.to_sql_checked(ty, out),
            },
            RowValues::Null => Ok(IsNull::Yes),
            RowValues::JSON(jsval) => jsval.to_sql_checked(ty, out),
            RowValues::Blob(bytes) => bytes.to_sql_checked(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::BOOL
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::DATE
                | Type::JSON
                | Type::JSONB
                | Type::BYTEA
        )
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_is_narrowed_for_int4() {
        let mut buf = bytes::BytesMut::new();
        RowValues::Int(42).to_sql(&Type::INT4, &mut buf).unwrap();
        assert_eq!(&buf[..], &42_i32.to_be_bytes());
    }

    #[test]
    fn out_of_range_int_is_rejected() {
        let mut buf = bytes::BytesMut::new();
        match RowValues::Int(i64::from(i32::MAX) + 1).to_sql(&Type::INT4, &mut buf) {
            Err(err) => assert!(err.to_string().contains("out of range")),
            Ok(_) => panic!("oversized int4 should be rejected"),
        }
    }

    fn rejected(value: RowValues, ty: &Type) -> String {
        let mut buf = bytes::BytesMut::new();
        match value.to_sql(ty, &mut buf) {
            Err(err) => {
                assert!(buf.is_empty(), "{value:?} wrote bytes for {ty}");
                err.to_string()
            }
            Ok(_) => panic!("{value:?} should not encode as {ty}"),
        }
    }

    #[test]
    fn mismatched_variants_are_rejected() {
        rejected(RowValues::Text("1234".into()), &Type::INT4);
        rejected(RowValues::Int(7), &Type::TEXT);
        rejected(RowValues::Int(7), &Type::BYTEA);
        rejected(RowValues::Float(1.5), &Type::INT4);
        rejected(RowValues::Bool(true), &Type::TEXT);
        rejected(RowValues::Blob(vec![1, 2]), &Type::TEXT);
        rejected(RowValues::JSON(serde_json::json!({"a": 1})), &Type::INT8);
    }

    #[test]
    fn int_to_float8_keeps_precision() {
        let mut buf = bytes::BytesMut::new();
        RowValues::Int(1 << 53).to_sql(&Type::FLOAT8, &mut buf).unwrap();
        assert_eq!(&buf[..], &9_007_199_254_740_992_f64.to_be_bytes());

        let err = rejected(RowValues::Int((1 << 53) + 1), &Type::FLOAT8);
        assert!(err.contains("exactly"), "{err}");
        rejected(RowValues::Int(i64::MIN), &Type::FLOAT8);
    }

    #[test]
    fn float_to_float4_rejects_overflow() {
        let mut buf = bytes::BytesMut::new();
        RowValues::Float(0.5).to_sql(&Type::FLOAT4, &mut buf).unwrap();
        assert_eq!(&buf[..], &0.5_f32.to_be_bytes());

        let err = rejected(RowValues::Float(1e300), &Type::FLOAT4);
        assert!(err.contains("out of range"), "{err}");
    }

    #[test]
    fn matching_variants_still_encode() {
        let mut buf = bytes::BytesMut::new();
        RowValues::Text("hi".into()).to_sql(&Type::VARCHAR, &mut buf).unwrap();
        assert_eq!(&buf[..], b"hi");

        buf.clear();
        RowValues::Int(9).to_sql(&Type::INT8, &mut buf).unwrap();
        assert_eq!(&buf[..], &9_i64.to_be_bytes());
    }

    #[test]
    fn null_writes_nothing() {
        let mut buf = bytes::BytesMut::new();
        let is_null = RowValues::Null.to_sql(&Type::TEXT, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
        assert!(buf.is_empty());
    }

    #[test]
    fn params_preserve_order() {
        let values = vec![RowValues::Int(1), RowValues::Text("a".into())];
        let params = Params::convert(&values);
        assert_eq!(params.as_refs().len(), 2);
    }

    #[test]
    fn unknown_types_are_not_accepted() {
        assert!(!<RowValues as ToSql>::accepts(&Type::UUID));
        assert!(<RowValues as ToSql>::accepts(&Type::JSONB));
    }
}
