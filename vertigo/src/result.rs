//! Query result.
use bytes::Bytes;
use std::{cell::OnceCell, fmt, sync::Arc};

use crate::{
    common::ByteStr,
    protocol::{Oid, backend::FieldDescription},
    row::{Column, DecodeError, Index, Row},
    types::{self, Value},
};

/// Function converting one text cell, see [`types::convert`].
pub(crate) type Converter = fn(Oid, Option<&Bytes>) -> Result<Value, DecodeError>;

/// Rows returned by a single query.
///
/// Cells are kept as received and decoded lazily, the first access to any row
/// decodes all of them once. Decoding failure is also remembered.
pub struct QueryResult {
    fields: Vec<FieldDescription>,
    raw: Vec<Vec<Option<Bytes>>>,
    tag: Option<ByteStr>,
    converter: Converter,
    columns: OnceCell<Arc<[Column]>>,
    rows: OnceCell<Result<Vec<Row>, DecodeError>>,
}

impl QueryResult {
    pub(crate) fn new(
        fields: Vec<FieldDescription>,
        raw: Vec<Vec<Option<Bytes>>>,
        tag: Option<ByteStr>,
    ) -> Self {
        Self::with_converter(fields, raw, tag, types::convert)
    }

    pub(crate) fn with_converter(
        fields: Vec<FieldDescription>,
        raw: Vec<Vec<Option<Bytes>>>,
        tag: Option<ByteStr>,
        converter: Converter,
    ) -> Self {
        Self {
            fields,
            raw,
            tag,
            converter,
            columns: OnceCell::new(),
            rows: OnceCell::new(),
        }
    }

    /// Column descriptors, in query order.
    pub fn columns(&self) -> &[Column] {
        self.shared_columns()
    }

    fn shared_columns(&self) -> &Arc<[Column]> {
        self.columns.get_or_init(|| self.fields.iter().map(Column::new).collect())
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if query returns no rows.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The command tag, e.g. `SELECT 2`.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Rows affected as reported by the command tag.
    pub fn rows_affected(&self) -> Option<u64> {
        self.tag()?.rsplit(' ').next()?.parse().ok()
    }

    /// All decoded rows.
    pub fn rows(&self) -> Result<&[Row], DecodeError> {
        match self.rows.get_or_init(|| self.decode()) {
            Ok(rows) => Ok(rows),
            Err(err) => Err(err.clone()),
        }
    }

    /// Get row at `index`.
    pub fn get(&self, index: usize) -> Result<Option<&Row>, DecodeError> {
        Ok(self.rows()?.get(index))
    }

    pub fn first(&self) -> Result<Option<&Row>, DecodeError> {
        Ok(self.rows()?.first())
    }

    pub fn last(&self) -> Result<Option<&Row>, DecodeError> {
        Ok(self.rows()?.last())
    }

    /// Get a single value by row position and column position or name.
    pub fn value<I: Index>(&self, row: usize, column: I) -> Result<&Value, DecodeError> {
        self.rows()?
            .get(row)
            .ok_or(DecodeError::IndexOutOfBounds(row))?
            .try_get(column)
    }

    /// Iterate rows in arrival order.
    pub fn iter(&self) -> Iter<'_> {
        match self.rows() {
            Ok(rows) => Iter { rows: rows.iter(), error: None },
            Err(err) => Iter { rows: Default::default(), error: Some(err) },
        }
    }

    fn decode(&self) -> Result<Vec<Row>, DecodeError> {
        let columns = self.shared_columns();
        self.raw
            .iter()
            .map(|cells| {
                let values = columns
                    .iter()
                    .zip(cells)
                    .map(|(col, cell)| (self.converter)(col.type_oid(), cell.as_ref()))
                    .collect::<Result<_, _>>()?;
                Ok(Row::new(columns.clone(), values))
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = Result<&'a Row, DecodeError>;

    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator of [`QueryResult`] rows.
///
/// When decoding failed, yield the error once.
#[derive(Debug)]
pub struct Iter<'a> {
    rows: std::slice::Iter<'a, Row>,
    error: Option<DecodeError>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<&'a Row, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.error.take() {
            return Some(Err(err));
        }
        self.rows.next().map(Ok)
    }
}

impl fmt::Debug for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResult")
            .field("tag", &self.tag)
            .field("columns", &self.columns())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use super::*;

    thread_local! {
        static CALLS: Cell<usize> = const { Cell::new(0) };
    }

    fn counting(oid: Oid, raw: Option<&Bytes>) -> Result<Value, DecodeError> {
        CALLS.with(|c| c.set(c.get() + 1));
        types::convert(oid, raw)
    }

    fn field(name: &'static str, type_oid: Oid) -> FieldDescription {
        FieldDescription {
            name: ByteStr::from_static(name),
            table_oid: 0,
            attribute_number: 0,
            type_oid,
            type_size: -1,
            type_modifier: -1,
            format_code: 0,
        }
    }

    fn cell(s: &'static str) -> Option<Bytes> {
        Some(Bytes::from_static(s.as_bytes()))
    }

    fn sample(converter: Converter) -> QueryResult {
        QueryResult::with_converter(
            vec![field("id", 6), field("name", 9)],
            vec![vec![cell("1"), cell("matt")], vec![cell("2"), None]],
            Some(ByteStr::from_static("SELECT 2")),
            converter,
        )
    }

    #[test]
    fn decode_at_most_once() {
        CALLS.with(|c| c.set(0));
        let result = sample(counting);

        assert_eq!(result.len(), 2);
        let first = result.rows().unwrap().to_vec();
        let second = result.rows().unwrap().to_vec();
        assert_eq!(first, second);
        result.first().unwrap();
        result.last().unwrap();
        result.iter().count();
        result.value(1, "name").unwrap();

        assert_eq!(CALLS.with(Cell::get), 4);
    }

    #[test]
    fn typed_access() {
        let result = sample(types::convert);
        assert_eq!(result.columns().len(), 2);
        assert_eq!(result.columns()[1].name(), "name");
        assert_eq!(result.rows_affected(), Some(2));
        assert_eq!(result.value(0, 0).unwrap(), &Value::Integer(1));
        assert_eq!(result.value(0, "name").unwrap(), &Value::Text("matt".into()));
        assert_eq!(result.value(1, "name").unwrap(), &Value::Null);
        assert!(matches!(result.value(2, 0), Err(DecodeError::IndexOutOfBounds(2))));
        assert_eq!(result.get(5).unwrap(), None);

        for row in &result {
            assert_eq!(row.unwrap().len(), 2);
        }
    }

    #[test]
    fn decode_error_is_cached() {
        CALLS.with(|c| c.set(0));
        let result = QueryResult::with_converter(
            vec![field("n", 6)],
            vec![vec![cell("one")], vec![cell("2")]],
            None,
            counting,
        );
        assert!(result.rows().is_err());
        assert!(result.first().is_err());
        let mut iter = result.iter();
        assert!(matches!(iter.next(), Some(Err(DecodeError::Parse { .. }))));
        assert!(iter.next().is_none());
        assert_eq!(CALLS.with(Cell::get), 1);
    }

    #[test]
    fn empty_result() {
        let result = QueryResult::new(vec![], vec![], Some(ByteStr::from_static("CREATE TABLE")));
        assert!(result.is_empty());
        assert_eq!(result.first().unwrap(), None);
        assert_eq!(result.rows_affected(), None);
    }
}
