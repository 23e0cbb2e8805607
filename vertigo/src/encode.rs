//! Parameter encoding.
use bytes::Bytes;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::types::{self, Value};

/// Value that can be bound to a prepared statement parameter.
///
/// Parameters are always sent in text format.
pub trait Encode {
    fn encode(&self) -> Encoded;
}

/// Text encoded parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    value: Option<Bytes>,
}

impl Encoded {
    /// SQL NULL.
    pub const fn null() -> Self {
        Self { value: None }
    }

    pub fn owned(value: impl Into<String>) -> Self {
        Self { value: Some(Bytes::from(value.into())) }
    }

    pub fn copy_from_slice(value: &[u8]) -> Self {
        Self { value: Some(Bytes::copy_from_slice(value)) }
    }

    pub const fn from_static(value: &'static str) -> Self {
        Self { value: Some(Bytes::from_static(value.as_bytes())) }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub(crate) fn into_value(self) -> Option<Bytes> {
        self.value
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self) -> Encoded {
        T::encode(self)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self) -> Encoded {
        match self {
            Some(value) => value.encode(),
            None => Encoded::null(),
        }
    }
}

impl Encode for bool {
    fn encode(&self) -> Encoded {
        Encoded::from_static(if *self { "t" } else { "f" })
    }
}

macro_rules! encode_int {
    ($($ty:ty),*) => {$(
        impl Encode for $ty {
            fn encode(&self) -> Encoded {
                Encoded::copy_from_slice(itoa::Buffer::new().format(*self).as_bytes())
            }
        }
    )*};
}

encode_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! encode_float {
    ($($ty:ty),*) => {$(
        impl Encode for $ty {
            fn encode(&self) -> Encoded {
                match *self {
                    f if f.is_nan() => Encoded::from_static("NaN"),
                    f if f == <$ty>::INFINITY => Encoded::from_static("Infinity"),
                    f if f == <$ty>::NEG_INFINITY => Encoded::from_static("-Infinity"),
                    f => Encoded::owned(f.to_string()),
                }
            }
        }
    )*};
}

encode_float!(f32, f64);

impl Encode for str {
    fn encode(&self) -> Encoded {
        Encoded::copy_from_slice(self.as_bytes())
    }
}

impl Encode for String {
    fn encode(&self) -> Encoded {
        self.as_str().encode()
    }
}

impl Encode for [u8] {
    fn encode(&self) -> Encoded {
        Encoded::copy_from_slice(self)
    }
}

impl Encode for Bytes {
    fn encode(&self) -> Encoded {
        Encoded { value: Some(self.clone()) }
    }
}

impl Encode for Date {
    fn encode(&self) -> Encoded {
        Encoded::owned(types::format_date(*self))
    }
}

impl Encode for PrimitiveDateTime {
    fn encode(&self) -> Encoded {
        Encoded::owned(types::format_timestamp(*self))
    }
}

impl Encode for OffsetDateTime {
    fn encode(&self) -> Encoded {
        Encoded::owned(types::format_timestamptz(*self))
    }
}

impl Encode for Value {
    fn encode(&self) -> Encoded {
        match self {
            Value::Null => Encoded::null(),
            Value::Bool(b) => b.encode(),
            Value::Integer(i) => i.encode(),
            Value::Float(f) => f.encode(),
            Value::Numeric(s) | Value::Text(s) => s.encode(),
            Value::Binary(b) => b.encode(),
            Value::Date(d) => d.encode(),
            Value::Timestamp(t) => t.encode(),
            Value::TimestampTz(t) => t.encode(),
        }
    }
}
