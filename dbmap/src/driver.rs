use crate::{Error, ResultSet, Value};

/// Seam to the underlying database driver. Executing statements is entirely up to the driver;
/// this crate only prepares the statement text and arguments and maps the results.
///
/// Statement text passed to a driver only ever contains positional (`?`) placeholders. `params`
/// holds exactly one value for each of them, in order.
pub trait Driver {
    /// Executes a statement producing a result set.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Box<dyn ResultSet + '_>, Error>;

    /// Executes a statement not producing a result set and returns the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<usize, Error>;
}

impl<D> Driver for &D
where
    D: Driver + ?Sized,
{
    fn query(&self, sql: &str, params: &[Value]) -> Result<Box<dyn ResultSet + '_>, Error> {
        (**self).query(sql, params)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<usize, Error> {
        (**self).execute(sql, params)
    }
}
