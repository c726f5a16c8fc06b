use std::any::Any;

use log::debug;

use crate::{
    ColumnMapper, ColumnMapperFactory, Driver, Error, Mappers, MappingOptions, Query, RowMapper,
    RowMapperFactory, SqlObject, Update,
    sql::{IntoArguments, ParsedSql},
};

/// Entry point for executing statements. Owns the [`Driver`] used to talk to the database and the
/// [`Mappers`] used to convert results into Rust values.
///
/// ```
/// use dbmap::{Handle, sqlite::SqliteDriver};
///
/// let handle = Handle::new(SqliteDriver::open_in_memory()?);
/// handle.execute("CREATE TABLE planets (name TEXT, moons INTEGER)", ())?;
/// handle
///     .create_update("INSERT INTO planets VALUES (:name, :moons)")
///     .bind_named("name", "Mars")
///     .bind_named("moons", 2)
///     .execute()?;
///
/// let planets: Vec<(String, u32)> = handle
///     .create_query("SELECT name, moons FROM planets")
///     .map_to()
///     .list()?;
/// assert_eq!(vec![("Mars".to_owned(), 2)], planets);
/// # Ok::<(), dbmap::Error>(())
/// ```
pub struct Handle<D> {
    driver: D,
    mappers: Mappers,
}

impl<D> Handle<D>
where
    D: Driver,
{
    /// Handle with the built-in mappers and default [`MappingOptions`].
    pub fn new(driver: D) -> Self {
        Self::with_mappers(driver, Mappers::default())
    }

    pub fn with_options(driver: D, options: MappingOptions) -> Self {
        Self::with_mappers(driver, Mappers::new(options))
    }

    pub fn with_mappers(driver: D, mappers: Mappers) -> Self {
        Self { driver, mappers }
    }

    pub fn mappers(&self) -> &Mappers {
        &self.mappers
    }

    /// Changes to the registry only affect statements created afterwards.
    pub fn mappers_mut(&mut self) -> &mut Mappers {
        &mut self.mappers
    }

    /// See [`Mappers::register_column_mapper`].
    pub fn register_column_mapper<T, M>(&mut self, mapper: M) -> &mut Self
    where
        T: Any + Send,
        M: ColumnMapper<T> + Send + Sync + 'static,
    {
        self.mappers.register_column_mapper::<T, M>(mapper);
        self
    }

    pub fn register_column_mapper_factory(
        &mut self,
        factory: impl ColumnMapperFactory + 'static,
    ) -> &mut Self {
        self.mappers.register_column_mapper_factory(factory);
        self
    }

    /// See [`Mappers::register_row_mapper`].
    pub fn register_row_mapper<T, M>(&mut self, mapper: M) -> &mut Self
    where
        T: Any + Send,
        M: RowMapper<T> + Send + Sync + 'static,
    {
        self.mappers.register_row_mapper::<T, M>(mapper);
        self
    }

    pub fn register_row_mapper_factory(
        &mut self,
        factory: impl RowMapperFactory + 'static,
    ) -> &mut Self {
        self.mappers.register_row_mapper_factory(factory);
        self
    }

    /// Starts building a statement which produces a result set.
    ///
    /// # Parameters
    ///
    /// * `sql`: The text representation of the SQL statement. Either `?` or `:name` may be used as
    ///   placeholders for arguments, but not both in the same statement.
    pub fn create_query(&self, sql: impl Into<String>) -> Query<'_, D> {
        Query::new(self, sql.into())
    }

    /// Starts building a statement which does not produce a result set, e.g. an `INSERT`.
    pub fn create_update(&self, sql: impl Into<String>) -> Update<'_, D> {
        Update::new(self, sql.into())
    }

    /// Executes a statement with positional arguments and returns the number of affected rows.
    /// Use `()` for statements without arguments.
    pub fn execute(&self, sql: &str, arguments: impl IntoArguments) -> Result<usize, Error> {
        let parsed = ParsedSql::parse(sql)?;
        let values = arguments.into_arguments().resolve(&parsed)?;
        debug!(
            "Executing update with {} parameters: {}",
            values.len(),
            parsed.rendered()
        );
        self.driver.execute(parsed.rendered(), &values)
    }

    /// Object implementing traits annotated with `#[sql_object]` by executing their statements
    /// through this handle.
    pub fn attach(&self) -> SqlObject<'_, D> {
        SqlObject::new(self)
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }
}
