use std::{collections::VecDeque, sync::Arc};

use crate::{ColumnNameMatching, Error, Value};

/// A single row of a result set. Column numbers start at `1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Shared between all rows of the same result set.
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Row with one value for each column of its result set.
    ///
    /// # Panics
    ///
    /// If the number of values does not match the number of columns.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        if columns.len() != values.len() {
            panic!(
                "Row has {} values, but its result set has {} columns.",
                values.len(),
                columns.len()
            )
        }
        Self { columns, values }
    }

    pub fn num_cols(&self) -> u16 {
        self.values.len() as u16
    }

    /// Name of the column as reported by the driver. `None` if `col` is out of bounds.
    pub fn col_name(&self, col: u16) -> Option<&str> {
        let index = usize::from(col).checked_sub(1)?;
        self.columns.get(index).map(String::as_str)
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Value of the column with number `col`. Column numbers start at `1`.
    pub fn get(&self, col: u16) -> Result<&Value, Error> {
        usize::from(col)
            .checked_sub(1)
            .and_then(|index| self.values.get(index))
            .ok_or(Error::ColumnOutOfBounds {
                col,
                num_cols: self.num_cols(),
            })
    }

    /// Column number of the first column matching `name`.
    pub fn find_column(&self, name: &str, matching: ColumnNameMatching) -> Result<u16, Error> {
        self.columns
            .iter()
            .position(|column| matching.matches(column, name))
            .map(|index| (index + 1) as u16)
            .ok_or_else(|| Error::UnknownColumn {
                name: name.to_owned(),
            })
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// A result set as delivered by a [`crate::Driver`]. Rows are consumed one by one.
pub trait ResultSet {
    /// Names of the columns of the result set, in order.
    fn column_names(&self) -> &[String];

    /// Advances to the next row. `None` once the result set is exhausted.
    fn next_row(&mut self) -> Result<Option<Row>, Error>;
}

/// A result set fully held in memory.
///
/// ```
/// use dbmap::{ResultSet, RowVec, Value};
///
/// let mut rows = RowVec::new(["id", "name"]);
/// rows.push(vec![Value::Integer(1), Value::Text("Marvin".to_owned())]);
///
/// let row = rows.next_row().unwrap().unwrap();
/// assert_eq!(Some("name"), row.col_name(2));
/// assert!(rows.next_row().unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RowVec {
    columns: Arc<[String]>,
    rows: VecDeque<Vec<Value>>,
}

impl RowVec {
    pub fn new<I>(columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: VecDeque::new(),
        }
    }

    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows not yet consumed.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Appends a row, which is consumed after all rows appended before it.
    ///
    /// # Panics
    ///
    /// If the number of values does not match the number of columns.
    pub fn push(&mut self, values: Vec<Value>) {
        if values.len() != self.columns.len() {
            panic!(
                "Row has {} values, but the result set has {} columns.",
                values.len(),
                self.columns.len()
            )
        }
        self.rows.push_back(values);
    }
}

impl ResultSet for RowVec {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Row>, Error> {
        Ok(self
            .rows
            .pop_front()
            .map(|values| Row::new(self.columns.clone(), values)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{ColumnNameMatching, Error, Value};

    use super::{ResultSet, Row, RowVec};

    fn given_row() -> Row {
        let mut rows = RowVec::new(["ID", "Name"]);
        rows.push(vec![Value::Integer(7), Value::Null]);
        rows.next_row().unwrap().unwrap()
    }

    #[test]
    fn column_numbers_start_at_one() {
        let row = given_row();

        assert_eq!(&Value::Integer(7), row.get(1).unwrap());
        assert!(matches!(
            row.get(0),
            Err(Error::ColumnOutOfBounds {
                col: 0,
                num_cols: 2
            })
        ));
        assert!(matches!(row.get(3), Err(Error::ColumnOutOfBounds { .. })));
        assert_eq!(None, row.col_name(0));
    }

    #[test]
    fn find_column_by_name() {
        let row = given_row();

        assert_eq!(1, row.find_column("id", ColumnNameMatching::CaseInsensitive).unwrap());
        assert!(matches!(
            row.find_column("id", ColumnNameMatching::Exact),
            Err(Error::UnknownColumn { .. })
        ));
    }

    #[test]
    #[should_panic]
    fn push_should_panic_on_wrong_number_of_values() {
        let mut rows = RowVec::new(["a", "b"]);
        rows.push(vec![Value::Null]);
    }

    #[test]
    #[should_panic]
    fn new_row_should_panic_on_wrong_number_of_values() {
        Row::new(Arc::from(vec!["a".to_owned()]), Vec::new());
    }
}
