use std::{
    any::{Any, TypeId, type_name},
    marker::PhantomData,
    sync::Arc,
};

use atoi::FromRadix10SignedChecked;

use crate::{
    Error, Mappers, Row, StatementContext, Value,
    reflect::{AnyValue, TypeInfo, TypeKind, downcast},
};

/// Converts the value of a single column into a value of type `T`.
///
/// Closures with a matching signature are column mappers, too.
///
/// ```
/// use dbmap::{ColumnMapper, Error, Row, StatementContext, Value};
///
/// // Interprets a text column as a comma separated list.
/// let mapper = |row: &Row, col: u16, _ctx: &StatementContext| -> Result<Vec<String>, Error> {
///     match row.get(col)? {
///         Value::Text(text) => Ok(text.split(',').map(str::to_owned).collect()),
///         other => Err(Error::custom(format!("Expected text, got {}", other.kind()))),
///     }
/// };
/// # let _ = mapper;
/// ```
pub trait ColumnMapper<T> {
    /// Maps column `col` (starting at `1`) of `row`.
    fn map(&self, row: &Row, col: u16, ctx: &StatementContext) -> Result<T, Error>;
}

impl<T, F> ColumnMapper<T> for F
where
    F: Fn(&Row, u16, &StatementContext) -> Result<T, Error>,
{
    fn map(&self, row: &Row, col: u16, ctx: &StatementContext) -> Result<T, Error> {
        self(row, col, ctx)
    }
}

/// A column mapper with its target type erased. This is what column mapper factories produce, since
/// the type they are asked for is only known at runtime in the form of a [`TypeInfo`].
pub trait ErasedColumnMapper: Send + Sync {
    fn map_erased(&self, row: &Row, col: u16, ctx: &StatementContext) -> Result<AnyValue, Error>;
}

/// Adapts a typed [`ColumnMapper`] to [`ErasedColumnMapper`].
pub struct Erased<M, T> {
    mapper: M,
    _target: PhantomData<fn() -> T>,
}

impl<M, T> Erased<M, T> {
    pub fn new(mapper: M) -> Self {
        Self {
            mapper,
            _target: PhantomData,
        }
    }
}

impl<M, T> ErasedColumnMapper for Erased<M, T>
where
    M: ColumnMapper<T> + Send + Sync,
    T: Any + Send,
{
    fn map_erased(&self, row: &Row, col: u16, ctx: &StatementContext) -> Result<AnyValue, Error> {
        let value = self.mapper.map(row, col, ctx)?;
        Ok(Box::new(value))
    }
}

/// Typed view on an erased column mapper chosen by the [`Mappers`] registry.
pub struct TypedColumnMapper<T> {
    erased: Arc<dyn ErasedColumnMapper>,
    _target: PhantomData<fn() -> T>,
}

impl<T> TypedColumnMapper<T> {
    pub(crate) fn new(erased: Arc<dyn ErasedColumnMapper>) -> Self {
        Self {
            erased,
            _target: PhantomData,
        }
    }
}

impl<T> ColumnMapper<T> for TypedColumnMapper<T>
where
    T: Any,
{
    fn map(&self, row: &Row, col: u16, ctx: &StatementContext) -> Result<T, Error> {
        downcast(self.erased.map_erased(row, col, ctx)?)
    }
}

/// Decides whether, and how, a column can be mapped to a type.
///
/// Factories are consulted by [`Mappers`] in reverse order of registration. The first factory
/// accepting a type is asked to produce the mapper.
pub trait ColumnMapperFactory: Send + Sync {
    /// `true` if this factory is able to produce a column mapper for `target`.
    fn accepts(&self, target: &TypeInfo, mappers: &Mappers) -> bool;

    /// Only called if [`Self::accepts`] returned `true` for `target`.
    fn column_mapper_for(
        &self,
        target: &TypeInfo,
        mappers: &Mappers,
    ) -> Result<Arc<dyn ErasedColumnMapper>, Error>;
}

/// Factory for a mapper registered for exactly one type. Created by
/// [`Mappers::register_column_mapper`].
pub struct ExactTypeColumnMapperFactory {
    id: TypeId,
    mapper: Arc<dyn ErasedColumnMapper>,
}

impl ExactTypeColumnMapperFactory {
    pub fn new<T, M>(mapper: M) -> Self
    where
        T: Any + Send,
        M: ColumnMapper<T> + Send + Sync + 'static,
    {
        Self {
            id: TypeId::of::<T>(),
            mapper: Arc::new(Erased::new(mapper)),
        }
    }
}

impl ColumnMapperFactory for ExactTypeColumnMapperFactory {
    fn accepts(&self, target: &TypeInfo, _mappers: &Mappers) -> bool {
        target.id() == self.id
    }

    fn column_mapper_for(
        &self,
        _target: &TypeInfo,
        _mappers: &Mappers,
    ) -> Result<Arc<dyn ErasedColumnMapper>, Error> {
        Ok(self.mapper.clone())
    }
}

/// Maps `NULL` to `None` and any other value using the mapper of the inner type.
pub struct OptionalColumnMapper {
    target: TypeInfo,
    inner: Arc<dyn ErasedColumnMapper>,
}

impl ErasedColumnMapper for OptionalColumnMapper {
    fn map_erased(&self, row: &Row, col: u16, ctx: &StatementContext) -> Result<AnyValue, Error> {
        let TypeKind::Optional(optional) = self.target.kind() else {
            unreachable!("OptionalColumnMapper is only constructed for optional types")
        };
        if row.get(col)?.is_null() {
            return Ok(optional.none());
        }
        let value = self.inner.map_erased(row, col, ctx)?;
        optional.wrap_some(value).ok_or(Error::MapperTypeMismatch {
            type_name: optional.inner().name(),
        })
    }
}

/// Accepts `Option<T>` for every `T` another factory in the chain accepts.
pub struct OptionalColumnMapperFactory;

impl ColumnMapperFactory for OptionalColumnMapperFactory {
    fn accepts(&self, target: &TypeInfo, mappers: &Mappers) -> bool {
        match target.kind() {
            TypeKind::Optional(optional) => mappers.has_column_mapper(optional.inner()),
            _ => false,
        }
    }

    fn column_mapper_for(
        &self,
        target: &TypeInfo,
        mappers: &Mappers,
    ) -> Result<Arc<dyn ErasedColumnMapper>, Error> {
        let TypeKind::Optional(optional) = target.kind() else {
            return Err(Error::NoColumnMapper {
                type_name: target.name(),
            });
        };
        let inner = mappers.find_column_mapper(optional.inner())?;
        Ok(Arc::new(OptionalColumnMapper {
            target: target.clone(),
            inner,
        }))
    }
}

/// Maps integers, floats, booleans, text, binary data and raw [`Value`]s.
pub struct PrimitivesColumnMapperFactory;

macro_rules! primitive_column_mapper {
    ($target:expr, $($t:ty => $mapper:expr),* $(,)?) => (
        $(
            if $target.is::<$t>() {
                return Some(Arc::new(Erased::<_, $t>::new($mapper)));
            }
        )*
    );
}

impl PrimitivesColumnMapperFactory {
    fn mapper_for(target: &TypeInfo) -> Option<Arc<dyn ErasedColumnMapper>> {
        primitive_column_mapper!(
            target,
            i8 => map_integer::<i8>,
            i16 => map_integer::<i16>,
            i32 => map_integer::<i32>,
            i64 => map_integer::<i64>,
            u8 => map_integer::<u8>,
            u16 => map_integer::<u16>,
            u32 => map_integer::<u32>,
            u64 => map_integer::<u64>,
            usize => map_integer::<usize>,
            f32 => map_f32,
            f64 => map_f64,
            bool => map_bool,
            String => map_string,
            Vec<u8> => map_bytes,
            Value => map_value,
        );
        None
    }
}

impl ColumnMapperFactory for PrimitivesColumnMapperFactory {
    fn accepts(&self, target: &TypeInfo, _mappers: &Mappers) -> bool {
        Self::mapper_for(target).is_some()
    }

    fn column_mapper_for(
        &self,
        target: &TypeInfo,
        _mappers: &Mappers,
    ) -> Result<Arc<dyn ErasedColumnMapper>, Error> {
        Self::mapper_for(target).ok_or(Error::NoColumnMapper {
            type_name: target.name(),
        })
    }
}

fn column_name(row: &Row, col: u16) -> String {
    row.col_name(col).unwrap_or_default().to_owned()
}

/// `found` can not be mapped to `type_name`. `NULL` is reported separately, since it usually means
/// the target should have been an `Option`.
pub(crate) fn incompatible(row: &Row, col: u16, type_name: &'static str, found: &Value) -> Error {
    if found.is_null() {
        return Error::UnexpectedNull {
            col,
            name: column_name(row, col),
            type_name,
        };
    }
    Error::IncompatibleValue {
        col,
        name: column_name(row, col),
        type_name,
        found: found.kind(),
    }
}

fn out_of_range<T>(row: &Row, col: u16) -> Error {
    Error::ValueOutOfRange {
        col,
        name: column_name(row, col),
        type_name: type_name::<T>(),
    }
}

/// Parses the entire text as a decimal integer. `None` if the text contains anything else, or
/// does not fit into 64 Bit.
fn parse_integer(text: &str) -> Option<i64> {
    let bytes = text.as_bytes();
    if !bytes.iter().any(u8::is_ascii_digit) {
        return None;
    }
    match i64::from_radix_10_signed_checked(bytes) {
        (Some(value), used) if used == bytes.len() => Some(value),
        _ => None,
    }
}

fn map_integer<T>(row: &Row, col: u16, _ctx: &StatementContext) -> Result<T, Error>
where
    T: TryFrom<i64>,
{
    let value = row.get(col)?;
    let wide = match value {
        Value::Integer(integer) => *integer,
        Value::Text(text) => {
            parse_integer(text).ok_or_else(|| incompatible(row, col, type_name::<T>(), value))?
        }
        other => return Err(incompatible(row, col, type_name::<T>(), other)),
    };
    T::try_from(wide).map_err(|_| out_of_range::<T>(row, col))
}

fn map_f64(row: &Row, col: u16, _ctx: &StatementContext) -> Result<f64, Error> {
    let value = row.get(col)?;
    match value {
        Value::Real(real) => Ok(*real),
        Value::Integer(integer) => Ok(*integer as f64),
        Value::Text(text) => text
            .parse()
            .map_err(|_| incompatible(row, col, "f64", value)),
        other => Err(incompatible(row, col, "f64", other)),
    }
}

fn map_f32(row: &Row, col: u16, ctx: &StatementContext) -> Result<f32, Error> {
    let wide = map_f64(row, col, ctx).map_err(|error| match error {
        // Report the type which has actually been requested.
        Error::IncompatibleValue { col, name, found, .. } => Error::IncompatibleValue {
            col,
            name,
            type_name: "f32",
            found,
        },
        Error::UnexpectedNull { col, name, .. } => Error::UnexpectedNull {
            col,
            name,
            type_name: "f32",
        },
        other => other,
    })?;
    let narrow = wide as f32;
    if wide.is_finite() && !narrow.is_finite() {
        return Err(out_of_range::<f32>(row, col));
    }
    Ok(narrow)
}

fn map_bool(row: &Row, col: u16, _ctx: &StatementContext) -> Result<bool, Error> {
    match row.get(col)? {
        Value::Integer(integer) => Ok(*integer != 0),
        other => Err(incompatible(row, col, "bool", other)),
    }
}

fn map_string(row: &Row, col: u16, _ctx: &StatementContext) -> Result<String, Error> {
    match row.get(col)? {
        Value::Text(text) => Ok(text.clone()),
        Value::Integer(integer) => Ok(integer.to_string()),
        Value::Real(real) => Ok(real.to_string()),
        other => Err(incompatible(row, col, type_name::<String>(), other)),
    }
}

fn map_bytes(row: &Row, col: u16, _ctx: &StatementContext) -> Result<Vec<u8>, Error> {
    match row.get(col)? {
        Value::Blob(blob) => Ok(blob.clone()),
        Value::Text(text) => Ok(text.as_bytes().to_vec()),
        other => Err(incompatible(row, col, type_name::<Vec<u8>>(), other)),
    }
}

fn map_value(row: &Row, col: u16, _ctx: &StatementContext) -> Result<Value, Error> {
    row.get(col).cloned()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use test_case::test_case;

    use crate::{Error, Mappers, Reflect, Row, StatementContext, Value};

    use super::parse_integer;

    fn single(value: Value) -> Row {
        Row::new(Arc::from(vec!["value".to_owned()]), vec![value])
    }

    fn map<T: Reflect>(value: Value) -> Result<T, Error> {
        let ctx = StatementContext::for_mappers(Mappers::default());
        ctx.map_column::<T>(&single(value), 1)
    }

    #[test_case("42", Some(42); "plain")]
    #[test_case("-42", Some(-42); "negative")]
    #[test_case("+7", Some(7); "explicit plus")]
    #[test_case("4.2", None; "fraction")]
    #[test_case("", None; "empty")]
    #[test_case("-", None; "only sign")]
    #[test_case("99999999999999999999", None; "overflow")]
    fn parse_integer_text(text: &str, expected: Option<i64>) {
        assert_eq!(expected, parse_integer(text));
    }

    #[test]
    fn integer_from_integer_and_text() {
        assert_eq!(5i32, map::<i32>(Value::Integer(5)).unwrap());
        assert_eq!(5i32, map::<i32>(Value::Text("5".to_owned())).unwrap());
    }

    #[test]
    fn integer_out_of_range() {
        let result = map::<u8>(Value::Integer(256));
        assert!(matches!(
            result,
            Err(Error::ValueOutOfRange { type_name: "u8", .. })
        ));
        assert!(matches!(
            map::<u32>(Value::Integer(-1)),
            Err(Error::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn null_into_non_optional_is_an_error() {
        assert!(matches!(
            map::<i64>(Value::Null),
            Err(Error::UnexpectedNull { col: 1, .. })
        ));
        assert!(matches!(
            map::<String>(Value::Null),
            Err(Error::UnexpectedNull { .. })
        ));
    }

    #[test]
    fn null_into_optional_is_none() {
        assert_eq!(None, map::<Option<i64>>(Value::Null).unwrap());
        assert_eq!(Some(3), map::<Option<i64>>(Value::Integer(3)).unwrap());
    }

    #[test]
    fn incompatible_value_names_found_kind() {
        let result = map::<i32>(Value::Blob(vec![1]));
        assert!(matches!(
            result,
            Err(Error::IncompatibleValue { found: "BLOB", .. })
        ));
    }

    #[test]
    fn floats() {
        assert_eq!(1.5, map::<f64>(Value::Real(1.5)).unwrap());
        assert_eq!(2.0, map::<f64>(Value::Integer(2)).unwrap());
        assert_eq!(0.25f32, map::<f32>(Value::Text("0.25".to_owned())).unwrap());
        assert!(matches!(
            map::<f32>(Value::Real(1e300)),
            Err(Error::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            map::<f32>(Value::Null),
            Err(Error::UnexpectedNull { type_name: "f32", .. })
        ));
    }

    #[test]
    fn text_and_binary() {
        assert_eq!("12", map::<String>(Value::Integer(12)).unwrap());
        assert_eq!(b"ab".to_vec(), map::<Vec<u8>>(Value::Text("ab".to_owned())).unwrap());
        assert!(map::<bool>(Value::Integer(2)).unwrap());
        assert_eq!(Value::Null, map::<Value>(Value::Null).unwrap());
    }

    #[test]
    fn opaque_type_without_mapper() {
        struct Money;
        impl Reflect for Money {}

        let result = map::<Money>(Value::Integer(1));

        assert!(matches!(result, Err(Error::NoColumnMapper { .. })));
    }
}
