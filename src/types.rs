use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

/// String-keyed JSON object, the shape used for `json`/`jsonb` columns.
pub type JsonMap = serde_json::Map<String, JsonValue>;

/// Values that can be stored in a database row or used as query parameters.
///
/// ```rust
/// use pg_middleware::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_json(&self) -> Option<&JsonValue> {
        if let RowValues::JSON(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

macro_rules! row_values_from {
    ($($ty:ty => $variant:ident via $conv:expr),* $(,)?) => {
        $(
            impl From<$ty> for RowValues {
                fn from(v: $ty) -> Self {
                    RowValues::$variant($conv(v))
                }
            }
        )*
    };
}

row_values_from! {
    i16 => Int via i64::from,
    i32 => Int via i64::from,
    i64 => Int via std::convert::identity,
    f32 => Float via f64::from,
    f64 => Float via std::convert::identity,
    bool => Bool via std::convert::identity,
    String => Text via std::convert::identity,
    &str => Text via str::to_string,
    NaiveDateTime => Timestamp via std::convert::identity,
    JsonValue => JSON via std::convert::identity,
    Vec<u8> => Blob via std::convert::identity,
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(v: Option<T>) -> Self {
        v.map_or(RowValues::Null, Into::into)
    }
}

/// A SQL string with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAndParams {
    pub query: String,
    pub params: Vec<RowValues>,
}

impl QueryAndParams {
    pub fn new(query: impl Into<String>, params: Vec<RowValues>) -> Self {
        Self {
            query: query.into(),
            params,
        }
    }

    /// A statement without parameters.
    pub fn new_without_params(query: impl Into<String>) -> Self {
        Self::new(query, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_pick_expected_variant() {
        assert_eq!(RowValues::from(7_i32), RowValues::Int(7));
        assert_eq!(RowValues::from("a"), RowValues::Text("a".into()));
        assert_eq!(RowValues::from(None::<i64>), RowValues::Null);
        assert_eq!(RowValues::from(Some(1.5_f64)), RowValues::Float(1.5));
        assert_eq!(
            RowValues::from(serde_json::json!({"k": "v"})).as_json(),
            Some(&serde_json::json!({"k": "v"}))
        );
    }

    #[test]
    fn accessors_do_not_coerce() {
        assert_eq!(RowValues::Int(1).as_bool(), None);
        assert_eq!(RowValues::Text("1".into()).as_int(), None);
        assert!(RowValues::Null.is_null());
        assert_eq!(RowValues::Blob(vec![1, 2]).as_blob(), Some(&[1_u8, 2][..]));
    }
}
