use std::sync::Arc;

use crate::{
    ColumnMapperFactory, EnumStrategy, Error, ErasedColumnMapper, Mappers, Row, StatementContext,
    Value,
    column_mapper::incompatible,
    reflect::{AnyValue, EnumInfo, TypeInfo, TypeKind},
};

/// A fieldless enum those variants can be identified by name and by position. Derive it with
/// `#[derive(SqlEnum)]`, which also implements [`crate::Reflect`] and [`crate::ToValue`] (binding
/// the variant name).
pub trait NamedEnum: Sized + 'static {
    /// Names of all variants, in declaration order.
    const VARIANTS: &'static [&'static str];

    /// The variant at position `ordinal` in declaration order.
    fn from_ordinal(ordinal: usize) -> Option<Self>;

    /// Position of `self` in declaration order.
    fn ordinal(&self) -> usize;

    fn name(&self) -> &'static str {
        Self::VARIANTS[self.ordinal()]
    }

    /// The variant with exactly this name. Comparison is case sensitive.
    fn from_name(name: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .position(|variant| *variant == name)
            .and_then(Self::from_ordinal)
    }
}

/// Maps enums from text columns holding the exact name of a variant.
pub struct EnumByNameMapper {
    type_name: &'static str,
    info: EnumInfo,
}

impl EnumByNameMapper {
    pub fn new(type_name: &'static str, info: EnumInfo) -> Self {
        Self { type_name, info }
    }
}

impl ErasedColumnMapper for EnumByNameMapper {
    fn map_erased(&self, row: &Row, col: u16, _ctx: &StatementContext) -> Result<AnyValue, Error> {
        let name = match row.get(col)? {
            Value::Text(name) => name,
            other => return Err(incompatible(row, col, self.type_name, other)),
        };
        self.info
            .ordinal_of(name)
            .and_then(|ordinal| self.info.instantiate(ordinal))
            .ok_or_else(|| Error::UnknownEnumName {
                type_name: self.type_name,
                value: name.clone(),
            })
    }
}

/// Maps enums from integer columns holding the zero based position of a variant in declaration
/// order.
pub struct EnumByOrdinalMapper {
    type_name: &'static str,
    info: EnumInfo,
}

impl EnumByOrdinalMapper {
    pub fn new(type_name: &'static str, info: EnumInfo) -> Self {
        Self { type_name, info }
    }
}

impl ErasedColumnMapper for EnumByOrdinalMapper {
    fn map_erased(&self, row: &Row, col: u16, _ctx: &StatementContext) -> Result<AnyValue, Error> {
        let ordinal = match row.get(col)? {
            Value::Integer(ordinal) => *ordinal,
            other => return Err(incompatible(row, col, self.type_name, other)),
        };
        usize::try_from(ordinal)
            .ok()
            .and_then(|index| self.info.instantiate(index))
            .ok_or(Error::EnumOrdinalOutOfRange {
                type_name: self.type_name,
                ordinal,
            })
    }
}

fn enum_info(target: &TypeInfo) -> Option<EnumInfo> {
    match target.kind() {
        TypeKind::Enum(info) => Some(*info),
        _ => None,
    }
}

fn not_an_enum(target: &TypeInfo) -> Error {
    Error::NoColumnMapper {
        type_name: target.name(),
    }
}

/// Produces [`EnumByNameMapper`]s for every enum type.
pub struct EnumByNameColumnMapperFactory;

impl ColumnMapperFactory for EnumByNameColumnMapperFactory {
    fn accepts(&self, target: &TypeInfo, _mappers: &Mappers) -> bool {
        enum_info(target).is_some()
    }

    fn column_mapper_for(
        &self,
        target: &TypeInfo,
        _mappers: &Mappers,
    ) -> Result<Arc<dyn ErasedColumnMapper>, Error> {
        let info = enum_info(target).ok_or_else(|| not_an_enum(target))?;
        Ok(Arc::new(EnumByNameMapper::new(target.name(), info)))
    }
}

/// Produces [`EnumByOrdinalMapper`]s for every enum type.
pub struct EnumByOrdinalColumnMapperFactory;

impl ColumnMapperFactory for EnumByOrdinalColumnMapperFactory {
    fn accepts(&self, target: &TypeInfo, _mappers: &Mappers) -> bool {
        enum_info(target).is_some()
    }

    fn column_mapper_for(
        &self,
        target: &TypeInfo,
        _mappers: &Mappers,
    ) -> Result<Arc<dyn ErasedColumnMapper>, Error> {
        let info = enum_info(target).ok_or_else(|| not_an_enum(target))?;
        Ok(Arc::new(EnumByOrdinalMapper::new(target.name(), info)))
    }
}

/// Part of the default factory chain. Maps enums by name or by ordinal, depending on the
/// [`EnumStrategy`] configured in the [`crate::MappingOptions`].
pub struct EnumColumnMapperFactory;

impl ColumnMapperFactory for EnumColumnMapperFactory {
    fn accepts(&self, target: &TypeInfo, _mappers: &Mappers) -> bool {
        enum_info(target).is_some()
    }

    fn column_mapper_for(
        &self,
        target: &TypeInfo,
        mappers: &Mappers,
    ) -> Result<Arc<dyn ErasedColumnMapper>, Error> {
        match mappers.options().enums() {
            EnumStrategy::ByName => EnumByNameColumnMapperFactory.column_mapper_for(target, mappers),
            EnumStrategy::ByOrdinal => {
                EnumByOrdinalColumnMapperFactory.column_mapper_for(target, mappers)
            }
        }
    }
}
