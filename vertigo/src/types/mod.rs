//! Column value conversion.
//!
//! Every result column is requested in text format, [`convert`] turns a text
//! cell into a [`Value`] according to the column data type.
//!
//! | Data type | Value |
//! | --- | --- |
//! | `boolean` | [`Value::Bool`] |
//! | `integer` | [`Value::Integer`] |
//! | `float` | [`Value::Float`] |
//! | `numeric` | [`Value::Numeric`], the exact decimal text |
//! | `date` | [`Value::Date`] |
//! | `timestamp` | [`Value::Timestamp`] |
//! | `timestamptz` | [`Value::TimestampTz`] |
//! | `varbinary` | [`Value::Binary`] |
//! | anything else known | [`Value::Text`] |
use bytes::Bytes;
use std::{fmt, str::FromStr};
use ::time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::{protocol::Oid, row::DecodeError};

mod time;

pub(crate) use self::time::{format_date, format_timestamp, format_timestamptz};

/// Data types known by the server, identified by their type [`Oid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Unspecified,
    Tuple,
    Pos,
    Record,
    Unknown,
    Bool,
    Integer,
    Float,
    Char,
    Varchar,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Interval,
    TimeTz,
    Numeric,
    Varbinary,
    RleTuple,
}

impl DataType {
    /// Returns [`None`] for unsupported type [`Oid`].
    pub fn from_oid(oid: Oid) -> Option<DataType> {
        let ty = match oid {
            0 => Self::Unspecified,
            1 => Self::Tuple,
            2 => Self::Pos,
            3 => Self::Record,
            4 => Self::Unknown,
            5 => Self::Bool,
            6 => Self::Integer,
            7 => Self::Float,
            8 => Self::Char,
            9 => Self::Varchar,
            10 => Self::Date,
            11 => Self::Time,
            12 => Self::Timestamp,
            13 => Self::TimestampTz,
            14 => Self::Interval,
            15 => Self::TimeTz,
            16 => Self::Numeric,
            17 => Self::Varbinary,
            18 => Self::RleTuple,
            _ => return None,
        };
        Some(ty)
    }

    pub fn oid(&self) -> Oid {
        *self as Oid
    }

    /// Type name as used in sql.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Tuple => "tuple",
            Self::Pos => "pos",
            Self::Record => "record",
            Self::Unknown => "unknown",
            Self::Bool => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Char => "char",
            Self::Varchar => "varchar",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::TimestampTz => "timestamptz",
            Self::Interval => "interval",
            Self::TimeTz => "timetz",
            Self::Numeric => "numeric",
            Self::Varbinary => "varbinary",
            Self::RleTuple => "rle_tuple",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded column value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    /// Exact decimal text.
    Numeric(String),
    Text(String),
    Binary(Bytes),
    Date(Date),
    Timestamp(PrimitiveDateTime),
    TimestampTz(OffsetDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(f) => Some(f),
            Value::Integer(i) => Some(i as f64),
            _ => None,
        }
    }

    /// Borrow text and numeric values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Numeric(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            Value::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => f.write_str(if *b { "t" } else { "f" }),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Numeric(s) | Value::Text(s) => f.write_str(s),
            Value::Binary(b) => {
                use crate::ext::FmtExt;
                write!(f, "{}", b.lossy())
            }
            Value::Date(d) => f.write_str(&format_date(*d)),
            Value::Timestamp(t) => f.write_str(&format_timestamp(*t)),
            Value::TimestampTz(t) => f.write_str(&format_timestamptz(*t)),
        }
    }
}

/// Convert a text format cell of type `oid`.
///
/// `None` is SQL NULL and converts to [`Value::Null`] for every type.
pub fn convert(oid: Oid, raw: Option<&Bytes>) -> Result<Value, DecodeError> {
    let Some(ty) = DataType::from_oid(oid) else {
        return Err(DecodeError::UnsupportedType(oid));
    };
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };

    if let DataType::Varbinary = ty {
        return Ok(Value::Binary(unescape_binary(raw)));
    }

    let text = std::str::from_utf8(raw)?;

    let value = match ty {
        DataType::Bool => Value::Bool(text == "t"),
        DataType::Integer => Value::Integer(parse(ty, text)?),
        DataType::Float => Value::Float(parse(ty, text)?),
        DataType::Numeric => Value::Numeric(text.to_owned()),
        DataType::Date => Value::Date(time::parse_date(text)?),
        DataType::Timestamp => Value::Timestamp(time::parse_timestamp(text)?),
        DataType::TimestampTz => Value::TimestampTz(time::parse_timestamptz(text)?),
        _ => Value::Text(text.to_owned()),
    };

    Ok(value)
}

fn parse<T: FromStr>(ty: DataType, text: &str) -> Result<T, DecodeError> {
    text.parse().map_err(|_| DecodeError::parse(ty, text))
}

/// Varbinary text output escapes backslash as `\\` and non printable bytes as
/// three octal digits `\ooo`.
fn unescape_binary(raw: &Bytes) -> Bytes {
    if !raw.contains(&b'\\') {
        return raw.clone();
    }

    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        match raw[i..] {
            [b'\\', b'\\', ..] => {
                out.push(b'\\');
                i += 2;
            }
            [b'\\', a @ b'0'..=b'3', b @ b'0'..=b'7', c @ b'0'..=b'7', ..] => {
                out.push(((a - b'0') << 6) | ((b - b'0') << 3) | (c - b'0'));
                i += 4;
            }
            [b, ..] => {
                out.push(b);
                i += 1;
            }
            [] => break,
        }
    }
    Bytes::from(out)
}
