use log::{debug, warn};

use crate::{
    Collector, Driver, Error, Handle, Reflect, ResultSet, RowMapper, StatementContext, ToValue,
    Value,
    collector::collect_results,
    sql::{Arguments, ParsedSql},
};

/// Parses the statement text and resolves the bound arguments against its placeholders.
fn prepare<D>(
    handle: &Handle<D>,
    sql: String,
    arguments: &Arguments,
) -> Result<(StatementContext, Vec<Value>), Error>
where
    D: Driver,
{
    let parsed = ParsedSql::parse(&sql)?;
    let values = arguments.resolve(&parsed)?;
    let ctx = StatementContext::new(sql, parsed.rendered().to_owned(), handle.mappers().clone());
    Ok((ctx, values))
}

/// A statement producing a result set, created by [`Handle::create_query`].
pub struct Query<'h, D> {
    handle: &'h Handle<D>,
    sql: String,
    arguments: Arguments,
}

impl<'h, D> Query<'h, D>
where
    D: Driver,
{
    pub(crate) fn new(handle: &'h Handle<D>, sql: String) -> Self {
        Self {
            handle,
            sql,
            arguments: Arguments::new(),
        }
    }

    /// Binds the next positional (`?`) parameter.
    pub fn bind(mut self, value: impl ToValue) -> Self {
        self.arguments.push(value);
        self
    }

    /// Binds the `:name` parameter.
    pub fn bind_named(mut self, name: impl Into<String>, value: impl ToValue) -> Self {
        self.arguments.push_named(name, value);
        self
    }

    /// Binds `value` both as the next positional parameter and as the parameter called `name`.
    /// Whichever placeholder style the statement uses picks it up.
    pub fn bind_argument(mut self, name: impl Into<String>, value: impl ToValue) -> Self {
        let value = value.to_value();
        self.arguments.push_named(name, value.clone());
        self.arguments.push(value);
        self
    }

    /// Maps each row to `T` using the row mapper the registry chooses for `T`.
    pub fn map_to<T>(self) -> ResultIterable<'h, D, T>
    where
        T: Reflect,
    {
        let mapper = self
            .handle
            .mappers()
            .row_mapper::<T>()
            .map(|mapper| Box::new(mapper) as Box<dyn RowMapper<T> + 'h>);
        ResultIterable {
            query: self,
            mapper,
        }
    }

    /// Maps each row to `T` using `mapper`, bypassing the registry.
    pub fn map<T, M>(self, mapper: M) -> ResultIterable<'h, D, T>
    where
        M: RowMapper<T> + 'h,
    {
        ResultIterable {
            query: self,
            mapper: Ok(Box::new(mapper) as Box<dyn RowMapper<T> + 'h>),
        }
    }
}

/// A query together with the row mapper for its results. Nothing is executed until one of the
/// consuming methods is called.
pub struct ResultIterable<'h, D, T> {
    query: Query<'h, D>,
    /// Failing to find a row mapper is only reported once the statement is executed.
    mapper: Result<Box<dyn RowMapper<T> + 'h>, Error>,
}

impl<'h, D, T> ResultIterable<'h, D, T>
where
    D: Driver,
{
    /// Executes the statement and returns an iterator mapping the rows on demand.
    pub fn iter(self) -> Result<MappedRows<'h, T>, Error> {
        let mapper = self.mapper?;
        let Query {
            handle,
            sql,
            arguments,
        } = self.query;
        let (ctx, values) = prepare(handle, sql, &arguments)?;
        debug!(
            "Executing query with {} parameters: {}",
            values.len(),
            ctx.rendered_sql()
        );
        let result_set = handle.driver().query(ctx.rendered_sql(), &values)?;
        Ok(MappedRows {
            result_set,
            mapper,
            ctx,
            exhausted: false,
        })
    }

    /// All rows.
    pub fn list(self) -> Result<Vec<T>, Error> {
        self.iter()?.collect()
    }

    /// The first row, or `None` if the result set is empty. Any further rows are ignored.
    pub fn first(self) -> Result<Option<T>, Error> {
        self.iter()?.next().transpose()
    }

    /// The one and only row of the result set.
    ///
    /// # Errors
    ///
    /// [`Error::NoResults`] if the result set is empty, [`Error::TooManyResults`] if it contains
    /// more than one row.
    pub fn one(self) -> Result<T, Error> {
        let mut rows = self.iter()?;
        let value = rows.next().ok_or(Error::NoResults)??;
        if rows.next().is_some() {
            warn!(
                "Statement expected to return one row returned more: {}",
                rows.ctx.raw_sql()
            );
            return Err(Error::TooManyResults);
        }
        Ok(value)
    }

    /// Collects all rows into any container implementing [`FromIterator`].
    pub fn collect<C>(self) -> Result<C, Error>
    where
        C: FromIterator<T>,
    {
        self.iter()?.collect()
    }

    /// Feeds the rows to `collector`. The first error encountered is returned instead of the output
    /// of the collector.
    pub fn collect_with<C>(self, collector: &C) -> Result<C::Output, Error>
    where
        C: Collector<Item = T>,
    {
        collect_results(collector, self.iter()?)
    }
}

/// Iterator over the mapped rows of an executed statement. Stops after the first error.
pub struct MappedRows<'h, T> {
    result_set: Box<dyn ResultSet + 'h>,
    mapper: Box<dyn RowMapper<T> + 'h>,
    ctx: StatementContext,
    exhausted: bool,
}

impl<T> MappedRows<'_, T> {
    /// Context the rows are mapped in.
    pub fn context(&self) -> &StatementContext {
        &self.ctx
    }

    pub fn column_names(&self) -> &[String] {
        self.result_set.column_names()
    }
}

impl<T> Iterator for MappedRows<'_, T> {
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let result = match self.result_set.next_row() {
            Ok(Some(row)) => self.mapper.map(&row, &self.ctx),
            Ok(None) => {
                self.exhausted = true;
                return None;
            }
            Err(e) => Err(e),
        };
        if result.is_err() {
            self.exhausted = true;
        }
        Some(result)
    }
}

/// A statement not producing a result set, created by [`Handle::create_update`].
pub struct Update<'h, D> {
    handle: &'h Handle<D>,
    sql: String,
    arguments: Arguments,
}

impl<'h, D> Update<'h, D>
where
    D: Driver,
{
    pub(crate) fn new(handle: &'h Handle<D>, sql: String) -> Self {
        Self {
            handle,
            sql,
            arguments: Arguments::new(),
        }
    }

    /// Binds the next positional (`?`) parameter.
    pub fn bind(mut self, value: impl ToValue) -> Self {
        self.arguments.push(value);
        self
    }

    /// Binds the `:name` parameter.
    pub fn bind_named(mut self, name: impl Into<String>, value: impl ToValue) -> Self {
        self.arguments.push_named(name, value);
        self
    }

    /// See [`Query::bind_argument`].
    pub fn bind_argument(mut self, name: impl Into<String>, value: impl ToValue) -> Self {
        let value = value.to_value();
        self.arguments.push_named(name, value.clone());
        self.arguments.push(value);
        self
    }

    /// Executes the statement and returns the number of affected rows.
    pub fn execute(self) -> Result<usize, Error> {
        let (ctx, values) = prepare(self.handle, self.sql, &self.arguments)?;
        debug!(
            "Executing update with {} parameters: {}",
            values.len(),
            ctx.rendered_sql()
        );
        self.handle.driver().execute(ctx.rendered_sql(), &values)
    }
}
