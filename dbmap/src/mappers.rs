use std::{any::Any, fmt, sync::Arc};

use log::debug;

use crate::{
    ColumnMapper, ColumnMapperFactory, EnumColumnMapperFactory, ErasedColumnMapper,
    ErasedRowMapper, Error, ExactTypeColumnMapperFactory, ExactTypeRowMapperFactory,
    FromRowMapperFactory, MappingOptions, OptionalColumnMapperFactory, OptionalRowMapperFactory,
    PrimitivesColumnMapperFactory, Reflect, RowMapper, RowMapperFactory,
    SingleColumnMapperFactory, TypedColumnMapper, TypedRowMapper, reflect::TypeInfo,
};

/// Registry of column and row mapper factories.
///
/// Factories form a chain. Lookups walk the chain starting with the most recently registered
/// factory, and the first factory accepting the requested type produces the mapper. This way
/// mappers registered by the application take precedence over the built-in ones, which are
/// registered first:
///
/// * Column mappers: primitives, enums (see [`crate::EnumStrategy`]), `Option<T>`.
/// * Row mappers: `Option<T>` of any row mapped type, single column (any type with a column
///   mapper), [`crate::FromRow`] types.
///
/// Cloning is cheap, factories are shared.
///
/// ```
/// use dbmap::{Error, Mappers, Row, StatementContext, Value};
///
/// struct Celsius(f64);
/// impl dbmap::Reflect for Celsius {}
///
/// let mut mappers = Mappers::default();
/// mappers.register_column_mapper::<Celsius, _>(|row: &Row, col: u16, ctx: &StatementContext| {
///     Ok::<_, Error>(Celsius(ctx.map_column::<f64>(row, col)?))
/// });
///
/// assert!(mappers.column_mapper::<Celsius>().is_ok());
/// ```
#[derive(Clone)]
pub struct Mappers {
    options: MappingOptions,
    column_factories: Vec<Arc<dyn ColumnMapperFactory>>,
    row_factories: Vec<Arc<dyn RowMapperFactory>>,
}

impl Default for Mappers {
    fn default() -> Self {
        Self::new(MappingOptions::default())
    }
}

impl fmt::Debug for Mappers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mappers")
            .field("options", &self.options)
            .field("num_column_factories", &self.column_factories.len())
            .field("num_row_factories", &self.row_factories.len())
            .finish()
    }
}

impl Mappers {
    /// Registry holding the built-in factories.
    pub fn new(options: MappingOptions) -> Self {
        let mut mappers = Self::empty(options);
        mappers
            .register_column_mapper_factory(PrimitivesColumnMapperFactory)
            .register_column_mapper_factory(EnumColumnMapperFactory)
            .register_column_mapper_factory(OptionalColumnMapperFactory)
            .register_row_mapper_factory(OptionalRowMapperFactory)
            .register_row_mapper_factory(SingleColumnMapperFactory)
            .register_row_mapper_factory(FromRowMapperFactory);
        mappers
    }

    /// Registry without any factories, not even the built-in ones.
    pub fn empty(options: MappingOptions) -> Self {
        Self {
            options,
            column_factories: Vec::new(),
            row_factories: Vec::new(),
        }
    }

    pub fn options(&self) -> &MappingOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: MappingOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Registers `mapper` for columns mapped to exactly the type `T`.
    pub fn register_column_mapper<T, M>(&mut self, mapper: M) -> &mut Self
    where
        T: Any + Send,
        M: ColumnMapper<T> + Send + Sync + 'static,
    {
        self.register_column_mapper_factory(ExactTypeColumnMapperFactory::new::<T, M>(mapper))
    }

    pub fn register_column_mapper_factory(
        &mut self,
        factory: impl ColumnMapperFactory + 'static,
    ) -> &mut Self {
        self.column_factories.push(Arc::new(factory));
        self
    }

    /// Registers `mapper` for rows mapped to exactly the type `T`.
    pub fn register_row_mapper<T, M>(&mut self, mapper: M) -> &mut Self
    where
        T: Any + Send,
        M: RowMapper<T> + Send + Sync + 'static,
    {
        self.register_row_mapper_factory(ExactTypeRowMapperFactory::new::<T, M>(mapper))
    }

    pub fn register_row_mapper_factory(
        &mut self,
        factory: impl RowMapperFactory + 'static,
    ) -> &mut Self {
        self.row_factories.push(Arc::new(factory));
        self
    }

    fn column_factory_for(&self, target: &TypeInfo) -> Option<&dyn ColumnMapperFactory> {
        self.column_factories
            .iter()
            .rev()
            .find(|factory| factory.accepts(target, self))
            .map(|factory| &**factory)
    }

    /// `true` if any factory in the chain accepts `target`.
    pub fn has_column_mapper(&self, target: &TypeInfo) -> bool {
        self.column_factory_for(target).is_some()
    }

    /// Column mapper of the most recently registered factory accepting `target`.
    pub fn find_column_mapper(
        &self,
        target: &TypeInfo,
    ) -> Result<Arc<dyn ErasedColumnMapper>, Error> {
        let factory = self.column_factory_for(target).ok_or(Error::NoColumnMapper {
            type_name: target.name(),
        })?;
        debug!("Resolving column mapper for '{}'.", target.name());
        factory.column_mapper_for(target, self)
    }

    fn row_factory_for(&self, target: &TypeInfo) -> Option<&dyn RowMapperFactory> {
        self.row_factories
            .iter()
            .rev()
            .find(|factory| factory.accepts(target, self))
            .map(|factory| &**factory)
    }

    /// `true` if any row mapper factory in the chain accepts `target`.
    pub fn has_row_mapper(&self, target: &TypeInfo) -> bool {
        self.row_factory_for(target).is_some()
    }

    /// Row mapper of the most recently registered factory accepting `target`.
    pub fn find_row_mapper(&self, target: &TypeInfo) -> Result<Arc<dyn ErasedRowMapper>, Error> {
        let factory = self.row_factory_for(target).ok_or(Error::NoRowMapper {
            type_name: target.name(),
        })?;
        debug!("Resolving row mapper for '{}'.", target.name());
        factory.row_mapper_for(target, self)
    }

    pub fn column_mapper<T: Reflect>(&self) -> Result<TypedColumnMapper<T>, Error> {
        self.find_column_mapper(&T::type_info())
            .map(TypedColumnMapper::new)
    }

    pub fn row_mapper<T: Reflect>(&self) -> Result<TypedRowMapper<T>, Error> {
        self.find_row_mapper(&T::type_info()).map(TypedRowMapper::new)
    }
}
