//! Result row operation.
//!
//! - [`Row`]
//! - [`Column`]
//! - [`Index`]
//! - [`DecodeError`]
use std::{borrow::Cow, fmt, str::Utf8Error, sync::Arc, string::FromUtf8Error};

use crate::{
    common::ByteStr,
    protocol::{Oid, backend::FieldDescription},
    types::{DataType, Value},
};

/// Result column descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: ByteStr,
    table_oid: u32,
    attribute_number: u16,
    type_oid: Oid,
    type_size: i16,
    type_modifier: i32,
    format_code: u16,
}

impl Column {
    pub(crate) fn new(field: &FieldDescription) -> Self {
        Self {
            name: field.name.clone(),
            table_oid: field.table_oid,
            attribute_number: field.attribute_number,
            type_oid: field.type_oid,
            type_size: field.type_size,
            type_modifier: field.type_modifier,
            format_code: field.format_code,
        }
    }

    /// Returns column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Object ID of the source table, zero if the column is not a table column.
    pub fn table_oid(&self) -> u32 {
        self.table_oid
    }

    /// Attribute number of the column in its table, zero if not a table column.
    pub fn attribute_number(&self) -> u16 {
        self.attribute_number
    }

    /// Returns column type [`Oid`].
    pub fn type_oid(&self) -> Oid {
        self.type_oid
    }

    /// Returns column [`DataType`], [`None`] if the server sent an unsupported type.
    pub fn data_type(&self) -> Option<DataType> {
        DataType::from_oid(self.type_oid)
    }

    /// Data type size, negative for variable-width types.
    pub fn type_size(&self) -> i16 {
        self.type_size
    }

    pub fn type_modifier(&self) -> i32 {
        self.type_modifier
    }

    pub fn format_code(&self) -> u16 {
        self.format_code
    }
}

/// A decoded result row.
#[derive(Clone)]
pub struct Row {
    columns: Arc<[Column]>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[Column]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if row contains no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column descriptors of this row.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get value by position or by column name.
    pub fn get<I: Index>(&self, idx: I) -> Option<&Value> {
        self.try_get(idx).ok()
    }

    /// Get value by position or by column name.
    pub fn try_get<I: Index>(&self, idx: I) -> Result<&Value, DecodeError> {
        let nth = idx.position(&self.columns)?;
        Ok(&self.values[nth])
    }

    /// Iterate values in column order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Borrow all values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume self into values in column order.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Value;

    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.columns.iter().map(Column::name).zip(&self.values))
            .finish()
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

/// Type that can be used for indexing column.
pub trait Index: Sized + sealed::Sealed {
    /// Returns nth column.
    fn position(self, columns: &[Column]) -> Result<usize, DecodeError>;
}

impl Index for usize {
    fn position(self, columns: &[Column]) -> Result<usize, DecodeError> {
        match self < columns.len() {
            true => Ok(self),
            false => Err(DecodeError::IndexOutOfBounds(self)),
        }
    }
}

impl Index for &str {
    fn position(self, columns: &[Column]) -> Result<usize, DecodeError> {
        columns
            .iter()
            .position(|c| c.name() == self)
            .ok_or_else(|| DecodeError::ColumnNotFound(String::from(self).into()))
    }
}

mod sealed {
    pub trait Sealed { }
    impl Sealed for usize { }
    impl Sealed for &str { }
}

macro_rules! from {
    (<$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for DecodeError {
            fn from($pat: $ty) -> Self {
                $body
            }
        }
    };
}

/// An error when decoding row value.
#[derive(Clone)]
pub enum DecodeError {
    /// Server returned non utf8 string.
    Utf8(Utf8Error),
    /// Column requested not found.
    ColumnNotFound(Cow<'static, str>),
    /// Index requested is out of bounds.
    IndexOutOfBounds(usize),
    /// Column type [`Oid`] is not supported.
    UnsupportedType(Oid),
    /// Text value is not valid for its data type.
    Parse {
        data_type: DataType,
        text: String,
    },
}

impl DecodeError {
    pub(crate) fn parse(data_type: DataType, text: &str) -> DecodeError {
        Self::Parse { data_type, text: text.to_owned() }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failed to decode value, ")?;
        match self {
            Self::Utf8(e) => write!(f, "{e}"),
            Self::ColumnNotFound(name) => write!(f, "column not found: {name:?}"),
            Self::IndexOutOfBounds(u) => write!(f, "index out of bounds: {u:?}"),
            Self::UnsupportedType(oid) => {
                write!(f, "unsupported data type oid: {}", itoa::Buffer::new().format(*oid))
            }
            Self::Parse { data_type, text } => write!(f, "invalid {data_type}: {text:?}"),
        }
    }
}

from!(<Utf8Error>e => Self::Utf8(e));
from!(<FromUtf8Error>e => Self::Utf8(e.utf8_error()));

impl std::error::Error for DecodeError { }

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
