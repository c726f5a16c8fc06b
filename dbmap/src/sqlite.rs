//! [`Driver`] implementation for SQLite, based on `rusqlite`.

use std::path::Path;

use log::debug;
use rusqlite::{
    Connection, ToSql, params_from_iter,
    types::{ToSqlOutput, ValueRef},
};

use crate::{Driver, Error, ResultSet, RowVec, Value};

/// Executes statements against an SQLite database.
///
/// Result sets are fetched completely before they are returned, so the statement is finalized by
/// the time the first row is mapped.
///
/// ```
/// use dbmap::{Handle, sqlite::SqliteDriver};
///
/// let handle = Handle::new(SqliteDriver::open_in_memory()?);
/// handle.execute("CREATE TABLE answer (value INTEGER)", ())?;
/// handle.execute("INSERT INTO answer VALUES (?)", (42,))?;
///
/// let answer: i32 = handle.create_query("SELECT value FROM answer").map_to().one()?;
/// assert_eq!(42, answer);
/// # Ok::<(), dbmap::Error>(())
/// ```
pub struct SqliteDriver {
    connection: Connection,
}

impl SqliteDriver {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        debug!("Opening SQLite database at {}", path.display());
        let connection = Connection::open(path).map_err(Error::driver)?;
        Ok(Self::from_connection(connection))
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        debug!("Opening in-memory SQLite database");
        let connection = Connection::open_in_memory().map_err(Error::driver)?;
        Ok(Self::from_connection(connection))
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    /// Access to the underlying connection, e.g. to run statements this crate does not cover.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn into_connection(self) -> Connection {
        self.connection
    }
}

impl Driver for SqliteDriver {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Box<dyn ResultSet + '_>, Error> {
        let mut statement = self.connection.prepare(sql).map_err(Error::driver)?;
        let mut result_set = RowVec::new(statement.column_names());
        let num_cols = result_set.num_cols();
        let mut rows = statement
            .query(params_from_iter(params.iter()))
            .map_err(Error::driver)?;
        while let Some(row) = rows.next().map_err(Error::driver)? {
            let values = (0..num_cols)
                .map(|index| {
                    let field = row.get_ref(index).map_err(Error::driver)?;
                    from_sqlite(field)
                })
                .collect::<Result<Vec<_>, _>>()?;
            result_set.push(values);
        }
        Ok(Box::new(result_set))
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<usize, Error> {
        self.connection
            .execute(sql, params_from_iter(params.iter()))
            .map_err(Error::driver)
    }
}

fn from_sqlite(field: ValueRef<'_>) -> Result<Value, Error> {
    let value = match field {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(integer) => Value::Integer(integer),
        ValueRef::Real(real) => Value::Real(real),
        ValueRef::Text(text) => Value::Text(
            std::str::from_utf8(text)
                .map_err(Error::driver)?
                .to_owned(),
        ),
        ValueRef::Blob(blob) => Value::Blob(blob.to_vec()),
    };
    Ok(value)
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Value::Null => ValueRef::Null,
            Value::Integer(integer) => ValueRef::Integer(*integer),
            Value::Real(real) => ValueRef::Real(*real),
            Value::Text(text) => ValueRef::Text(text.as_bytes()),
            Value::Blob(blob) => ValueRef::Blob(blob),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}
