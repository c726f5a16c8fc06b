use std::{
    any::{Any, TypeId},
    marker::PhantomData,
    sync::Arc,
};

use crate::{
    Error, ErasedColumnMapper, Mappers, Reflect, Row, StatementContext, Value,
    reflect::{AnyValue, RowInfo, TypeInfo, TypeKind, downcast},
};

/// Converts an entire row of a result set into a value of type `T`.
///
/// Closures taking a row and the statement context are row mappers, too.
pub trait RowMapper<T> {
    fn map(&self, row: &Row, ctx: &StatementContext) -> Result<T, Error>;
}

impl<T, F> RowMapper<T> for F
where
    F: Fn(&Row, &StatementContext) -> Result<T, Error>,
{
    fn map(&self, row: &Row, ctx: &StatementContext) -> Result<T, Error> {
        self(row, ctx)
    }
}

/// Types which can be constructed from a row. Derive it for structs with `#[derive(FromRow)]`,
/// which maps each field from the column with the same name.
///
/// Tuples implement `FromRow` by mapping their elements from the columns in order.
pub trait FromRow: Sized + 'static {
    fn from_row(row: &Row, ctx: &StatementContext) -> Result<Self, Error>;
}

/// A row mapper with its target type erased, as produced by [`RowMapperFactory`]s.
pub trait ErasedRowMapper: Send + Sync {
    fn map_erased(&self, row: &Row, ctx: &StatementContext) -> Result<AnyValue, Error>;
}

/// Typed view on an erased row mapper chosen by the [`Mappers`] registry.
pub struct TypedRowMapper<T> {
    erased: Arc<dyn ErasedRowMapper>,
    _target: PhantomData<fn() -> T>,
}

impl<T> TypedRowMapper<T> {
    pub(crate) fn new(erased: Arc<dyn ErasedRowMapper>) -> Self {
        Self {
            erased,
            _target: PhantomData,
        }
    }
}

impl<T> RowMapper<T> for TypedRowMapper<T>
where
    T: Any,
{
    fn map(&self, row: &Row, ctx: &StatementContext) -> Result<T, Error> {
        downcast(self.erased.map_erased(row, ctx)?)
    }
}

struct ErasedRow<M, T> {
    mapper: M,
    _target: PhantomData<fn() -> T>,
}

impl<M, T> ErasedRowMapper for ErasedRow<M, T>
where
    M: RowMapper<T> + Send + Sync,
    T: Any + Send,
{
    fn map_erased(&self, row: &Row, ctx: &StatementContext) -> Result<AnyValue, Error> {
        let value = self.mapper.map(row, ctx)?;
        Ok(Box::new(value))
    }
}

/// Decides whether, and how, a row can be mapped to a type. Consulted by [`Mappers`] in reverse
/// order of registration.
pub trait RowMapperFactory: Send + Sync {
    fn accepts(&self, target: &TypeInfo, mappers: &Mappers) -> bool;

    /// Only called if [`Self::accepts`] returned `true` for `target`.
    fn row_mapper_for(
        &self,
        target: &TypeInfo,
        mappers: &Mappers,
    ) -> Result<Arc<dyn ErasedRowMapper>, Error>;
}

/// Factory for a row mapper registered for exactly one type. Created by
/// [`Mappers::register_row_mapper`].
pub struct ExactTypeRowMapperFactory {
    id: TypeId,
    mapper: Arc<dyn ErasedRowMapper>,
}

impl ExactTypeRowMapperFactory {
    pub fn new<T, M>(mapper: M) -> Self
    where
        T: Any + Send,
        M: RowMapper<T> + Send + Sync + 'static,
    {
        Self {
            id: TypeId::of::<T>(),
            mapper: Arc::new(ErasedRow {
                mapper,
                _target: PhantomData,
            }),
        }
    }
}

impl RowMapperFactory for ExactTypeRowMapperFactory {
    fn accepts(&self, target: &TypeInfo, _mappers: &Mappers) -> bool {
        target.id() == self.id
    }

    fn row_mapper_for(
        &self,
        _target: &TypeInfo,
        _mappers: &Mappers,
    ) -> Result<Arc<dyn ErasedRowMapper>, Error> {
        Ok(self.mapper.clone())
    }
}

/// Maps the first column of each row, using the column mapper chosen for the target type.
pub struct SingleColumnMapper {
    column_mapper: Arc<dyn ErasedColumnMapper>,
}

impl SingleColumnMapper {
    pub fn new(column_mapper: Arc<dyn ErasedColumnMapper>) -> Self {
        Self { column_mapper }
    }
}

impl ErasedRowMapper for SingleColumnMapper {
    fn map_erased(&self, row: &Row, ctx: &StatementContext) -> Result<AnyValue, Error> {
        self.column_mapper.map_erased(row, 1, ctx)
    }
}

/// Accepts every type a column mapper is available for and maps it from the first column.
pub struct SingleColumnMapperFactory;

impl RowMapperFactory for SingleColumnMapperFactory {
    fn accepts(&self, target: &TypeInfo, mappers: &Mappers) -> bool {
        mappers.has_column_mapper(target)
    }

    fn row_mapper_for(
        &self,
        target: &TypeInfo,
        mappers: &Mappers,
    ) -> Result<Arc<dyn ErasedRowMapper>, Error> {
        let column_mapper = mappers.find_column_mapper(target)?;
        Ok(Arc::new(SingleColumnMapper::new(column_mapper)))
    }
}

struct FromRowMapper {
    info: RowInfo,
}

impl ErasedRowMapper for FromRowMapper {
    fn map_erased(&self, row: &Row, ctx: &StatementContext) -> Result<AnyValue, Error> {
        self.info.from_row(row, ctx)
    }
}

/// Accepts types implementing [`FromRow`] (as announced by their [`TypeInfo`]).
pub struct FromRowMapperFactory;

impl RowMapperFactory for FromRowMapperFactory {
    fn accepts(&self, target: &TypeInfo, _mappers: &Mappers) -> bool {
        matches!(target.kind(), TypeKind::Row(_))
    }

    fn row_mapper_for(
        &self,
        target: &TypeInfo,
        _mappers: &Mappers,
    ) -> Result<Arc<dyn ErasedRowMapper>, Error> {
        match target.kind() {
            TypeKind::Row(info) => Ok(Arc::new(FromRowMapper { info: *info })),
            _ => Err(Error::NoRowMapper {
                type_name: target.name(),
            }),
        }
    }
}

/// Maps a row with only `NULL` values to `None` and any other row using the row mapper of the inner
/// type.
pub struct OptionalRowMapper {
    target: TypeInfo,
    inner: Arc<dyn ErasedRowMapper>,
}

impl ErasedRowMapper for OptionalRowMapper {
    fn map_erased(&self, row: &Row, ctx: &StatementContext) -> Result<AnyValue, Error> {
        let TypeKind::Optional(optional) = self.target.kind() else {
            unreachable!("OptionalRowMapper is only constructed for optional types")
        };
        if row.values().iter().all(Value::is_null) {
            return Ok(optional.none());
        }
        let value = self.inner.map_erased(row, ctx)?;
        optional.wrap_some(value).ok_or(Error::MapperTypeMismatch {
            type_name: optional.inner().name(),
        })
    }
}

/// Accepts `Option<T>` for every `T` another row mapper factory in the chain accepts. Registered
/// before [`SingleColumnMapperFactory`], so optional column types keep using their column mapper.
pub struct OptionalRowMapperFactory;

impl RowMapperFactory for OptionalRowMapperFactory {
    fn accepts(&self, target: &TypeInfo, mappers: &Mappers) -> bool {
        match target.kind() {
            TypeKind::Optional(optional) => mappers.has_row_mapper(optional.inner()),
            _ => false,
        }
    }

    fn row_mapper_for(
        &self,
        target: &TypeInfo,
        mappers: &Mappers,
    ) -> Result<Arc<dyn ErasedRowMapper>, Error> {
        let TypeKind::Optional(optional) = target.kind() else {
            return Err(Error::NoRowMapper {
                type_name: target.name(),
            });
        };
        let inner = mappers.find_row_mapper(optional.inner())?;
        Ok(Arc::new(OptionalRowMapper {
            target: target.clone(),
            inner,
        }))
    }
}

macro_rules! impl_from_row_for_tuple {
    ($($t:ident $col:literal)*) => (
        impl<$($t: Reflect,)*> FromRow for ($($t,)*) {
            fn from_row(row: &Row, ctx: &StatementContext) -> Result<Self, Error> {
                Ok(($(ctx.map_column::<$t>(row, $col)?,)*))
            }
        }

        impl<$($t: Reflect,)*> Reflect for ($($t,)*) {
            fn type_info() -> TypeInfo {
                TypeInfo::row::<Self>()
            }
        }
    );
}

impl_from_row_for_tuple! { A 1 B 2 }
impl_from_row_for_tuple! { A 1 B 2 C 3 }
impl_from_row_for_tuple! { A 1 B 2 C 3 D 4 }
impl_from_row_for_tuple! { A 1 B 2 C 3 D 4 E 5 }
impl_from_row_for_tuple! { A 1 B 2 C 3 D 4 E 5 F 6 }
impl_from_row_for_tuple! { A 1 B 2 C 3 D 4 E 5 F 6 G 7 }
impl_from_row_for_tuple! { A 1 B 2 C 3 D 4 E 5 F 6 G 7 H 8 }
