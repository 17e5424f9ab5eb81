//! Conversion of driver-native column values into [`TransportValue`]s.
//!
//! Drivers translate their own column representation into a [`NativeValue`] once; everything
//! after that point (row materialization, serialization, callers) only sees the five transport
//! kinds. Temporal values become their canonical text, exact decimals become plain-form strings,
//! and large objects are read eagerly so no handle outlives the cursor.

use std::fmt;
use std::io;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::SqlBridgeError;
use crate::types::{Number, TransportValue};

/// Handle to a binary large object whose content has not been fetched yet.
pub trait LargeObject: Send {
    /// Read the complete content. Called at most once, while the cursor is still open.
    ///
    /// # Errors
    /// Returns the I/O error reported by the underlying stream.
    fn read_all(self: Box<Self>) -> io::Result<Vec<u8>>;
}

/// An exact decimal: `mantissa * 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal {
    mantissa: i128,
    scale: u8,
}

impl Decimal {
    #[must_use]
    pub fn new(mantissa: i128, scale: u8) -> Self {
        Self { mantissa, scale }
    }

    #[must_use]
    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    #[must_use]
    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Drop trailing fractional zeros; the value is unchanged.
    #[must_use]
    pub fn normalized(self) -> Self {
        let Decimal {
            mut mantissa,
            mut scale,
        } = self;
        if mantissa == 0 {
            return Decimal::new(0, 0);
        }
        while scale > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }
        Decimal::new(mantissa, scale)
    }

    /// Plain-form rendering with trailing zeros stripped and no exponent:
    /// `19.990` -> `19.99`, `100.00` -> `100`, `-0.0500` -> `-0.05`.
    #[must_use]
    pub fn to_plain_string(&self) -> String {
        let Decimal { mantissa, scale } = self.normalized();
        let digits = mantissa.unsigned_abs().to_string();
        let scale = usize::from(scale);
        let sign = if mantissa < 0 { "-" } else { "" };

        if scale == 0 {
            return format!("{sign}{digits}");
        }

        let padded = if digits.len() <= scale {
            format!("{}{digits}", "0".repeat(scale + 1 - digits.len()))
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        format!("{sign}{int_part}.{frac_part}")
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plain_string())
    }
}

/// A column value as the driver hands it over, before coercion.
pub enum NativeValue {
    Null,
    Bit(bool),
    TinyInt(u8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Real(f32),
    Float(f64),
    Decimal(Decimal),
    Timestamp(NaiveDateTime),
    TimestampWithOffset(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
    Text(String),
    Binary(Vec<u8>),
    LargeBinary(Box<dyn LargeObject>),
    /// Any other driver type (GUIDs, XML, ...), rendered through `Display`.
    Other(Box<dyn fmt::Display + Send + Sync>),
}

// Manual Debug because the boxed variants do not expose `Debug`
impl fmt::Debug for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bit(v) => f.debug_tuple("Bit").field(v).finish(),
            Self::TinyInt(v) => f.debug_tuple("TinyInt").field(v).finish(),
            Self::SmallInt(v) => f.debug_tuple("SmallInt").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::BigInt(v) => f.debug_tuple("BigInt").field(v).finish(),
            Self::Real(v) => f.debug_tuple("Real").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Decimal(v) => f.debug_tuple("Decimal").field(v).finish(),
            Self::Timestamp(v) => f.debug_tuple("Timestamp").field(v).finish(),
            Self::TimestampWithOffset(v) => f.debug_tuple("TimestampWithOffset").field(v).finish(),
            Self::Date(v) => f.debug_tuple("Date").field(v).finish(),
            Self::Time(v) => f.debug_tuple("Time").field(v).finish(),
            Self::Text(v) => f.debug_tuple("Text").field(v).finish(),
            Self::Binary(v) => f.debug_tuple("Binary").field(&v.len()).finish(),
            Self::LargeBinary(_) => f.debug_tuple("LargeBinary").field(&"<lob>").finish(),
            Self::Other(v) => f.debug_tuple("Other").field(&v.to_string()).finish(),
        }
    }
}

/// Coerce one column value. The arms follow the precedence null, temporal, decimal,
/// other numerics, boolean, binary, text, fallback.
///
/// # Errors
/// Returns `SqlBridgeError::ConversionFailure` if a large object cannot be read.
pub fn coerce(value: NativeValue) -> Result<TransportValue, SqlBridgeError> {
    let coerced = match value {
        NativeValue::Null => TransportValue::Null,

        NativeValue::Timestamp(ts) => TransportValue::String(ts.to_string()),
        NativeValue::TimestampWithOffset(ts) => TransportValue::String(ts.to_string()),
        NativeValue::Date(date) => TransportValue::String(date.to_string()),
        NativeValue::Time(time) => TransportValue::String(time.to_string()),

        NativeValue::Decimal(dec) => TransportValue::String(dec.to_plain_string()),

        NativeValue::TinyInt(v) => TransportValue::Number(Number::Int(i64::from(v))),
        NativeValue::SmallInt(v) => TransportValue::Number(Number::Int(i64::from(v))),
        NativeValue::Int(v) => TransportValue::Number(Number::Int(i64::from(v))),
        NativeValue::BigInt(v) => TransportValue::Number(Number::Int(v)),
        NativeValue::Real(v) => TransportValue::Number(Number::Float(f64::from(v))),
        NativeValue::Float(v) => TransportValue::Number(Number::Float(v)),

        NativeValue::Bit(v) => TransportValue::Boolean(v),

        NativeValue::Binary(bytes) => TransportValue::Bytes(bytes),
        NativeValue::LargeBinary(lob) => TransportValue::Bytes(lob.read_all().map_err(|e| {
            SqlBridgeError::ConversionFailure(format!("failed to read binary large object: {e}"))
        })?),

        NativeValue::Text(text) => TransportValue::String(text),

        NativeValue::Other(other) => TransportValue::String(other.to_string()),
    };
    Ok(coerced)
}
