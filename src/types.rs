use serde::{Deserialize, Serialize};

/// A numeric transport value. Integers never pass through floating point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
}

impl Number {
    #[must_use]
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Number::Int(i) => Some(i),
            Number::Float(_) => None,
        }
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

/// Values that cross the bridge boundary, both as column values and as statement
/// parameters.
///
/// Every driver-native column type lands in exactly one of these variants, so nothing
/// driver specific ever reaches a caller:
/// ```rust
/// use mssql_bridge::prelude::*;
///
/// let params: Vec<TransportValue> = vec!["shipped".into(), 42.into(), TransportValue::Null];
/// assert_eq!(params[1].as_int(), Some(42));
/// ```
///
/// Serialized untagged: `null`, `true`, `42`, `"19.99"`, `[1, 2, 3]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransportValue {
    /// NULL value
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer or floating point value
    Number(Number),
    /// Text value; also carries temporal and decimal columns in their text rendering
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
}

impl TransportValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let TransportValue::Number(n) = self {
            n.as_i64()
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let TransportValue::Number(n) = self {
            Some(n.as_f64())
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let TransportValue::String(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        if let TransportValue::Boolean(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let TransportValue::Bytes(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Short tag used in log lines and error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            TransportValue::Null => "null",
            TransportValue::Boolean(_) => "boolean",
            TransportValue::Number(_) => "number",
            TransportValue::String(_) => "string",
            TransportValue::Bytes(_) => "bytes",
        }
    }
}

impl From<bool> for TransportValue {
    fn from(value: bool) -> Self {
        TransportValue::Boolean(value)
    }
}

impl From<i32> for TransportValue {
    fn from(value: i32) -> Self {
        TransportValue::Number(Number::Int(i64::from(value)))
    }
}

impl From<i64> for TransportValue {
    fn from(value: i64) -> Self {
        TransportValue::Number(Number::Int(value))
    }
}

impl From<f64> for TransportValue {
    fn from(value: f64) -> Self {
        TransportValue::Number(Number::Float(value))
    }
}

impl From<&str> for TransportValue {
    fn from(value: &str) -> Self {
        TransportValue::String(value.to_string())
    }
}

impl From<String> for TransportValue {
    fn from(value: String) -> Self {
        TransportValue::String(value)
    }
}

impl From<Vec<u8>> for TransportValue {
    fn from(value: Vec<u8>) -> Self {
        TransportValue::Bytes(value)
    }
}

impl<T: Into<TransportValue>> From<Option<T>> for TransportValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(TransportValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_untagged_params() {
        let params: Vec<TransportValue> =
            serde_json::from_str(r#"["shipped", 42, 1.5, true, null, [1, 2]]"#).unwrap();
        assert_eq!(
            params,
            vec![
                TransportValue::String("shipped".into()),
                TransportValue::Number(Number::Int(42)),
                TransportValue::Number(Number::Float(1.5)),
                TransportValue::Boolean(true),
                TransportValue::Null,
                TransportValue::Bytes(vec![1, 2]),
            ]
        );
    }

    #[test]
    fn large_integers_stay_integers() {
        let value = TransportValue::from(i64::MAX);
        assert_eq!(value.as_int(), Some(i64::MAX));
        assert_eq!(serde_json::to_string(&value).unwrap(), i64::MAX.to_string());
    }

    #[test]
    fn option_maps_none_to_null() {
        assert!(TransportValue::from(None::<i64>).is_null());
        assert_eq!(TransportValue::from(Some("x")).as_text(), Some("x"));
    }
}
