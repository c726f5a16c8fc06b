use crate::{Driver, Handle};

/// Implements the traits annotated with `#[sql_object]` by executing the statements declared on
/// their methods. Obtained through [`Handle::attach`].
///
/// ```
/// use dbmap::{Error, Handle, sql_object, sqlite::SqliteDriver};
///
/// #[sql_object]
/// trait Counter {
///     #[sql_update("CREATE TABLE counter (value INTEGER)")]
///     fn create(&self) -> Result<(), Error>;
///
///     #[sql_update("INSERT INTO counter VALUES (:value)")]
///     fn insert(&self, value: i64) -> Result<usize, Error>;
///
///     #[sql_query("SELECT SUM(value) FROM counter")]
///     fn sum(&self) -> Result<Option<i64>, Error>;
/// }
///
/// let handle = Handle::new(SqliteDriver::open_in_memory()?);
/// let counter = handle.attach();
/// counter.create()?;
/// assert_eq!(None, counter.sum()?);
/// counter.insert(40)?;
/// counter.insert(2)?;
///
/// assert_eq!(Some(42), counter.sum()?);
/// # Ok::<(), dbmap::Error>(())
/// ```
pub struct SqlObject<'h, D> {
    handle: &'h Handle<D>,
}

impl<'h, D> SqlObject<'h, D>
where
    D: Driver,
{
    pub(crate) fn new(handle: &'h Handle<D>) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &'h Handle<D> {
        self.handle
    }
}

impl<D> Clone for SqlObject<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for SqlObject<'_, D> {}

/// Return types of methods annotated with `#[sql_update]`, created from the number of affected
/// rows.
pub trait UpdateResult {
    fn from_row_count(count: usize) -> Self;
}

impl UpdateResult for () {
    fn from_row_count(_count: usize) -> Self {}
}

impl UpdateResult for usize {
    fn from_row_count(count: usize) -> Self {
        count
    }
}

impl UpdateResult for u64 {
    fn from_row_count(count: usize) -> Self {
        count as u64
    }
}

impl UpdateResult for i64 {
    fn from_row_count(count: usize) -> Self {
        count as i64
    }
}

/// `true` if at least one row has been affected.
impl UpdateResult for bool {
    fn from_row_count(count: usize) -> Self {
        count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::UpdateResult;

    #[test]
    fn row_counts() {
        assert!(!bool::from_row_count(0));
        assert!(bool::from_row_count(3));
        assert_eq!(3i64, i64::from_row_count(3));
    }
}
