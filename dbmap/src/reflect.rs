//! Type metadata used by mapper factories to decide how a type is mapped.
//!
//! Rust offers no runtime reflection, so types describe themselves by implementing [`Reflect`].
//! The derive macros `SqlEnum` and `FromRow` generate these implementations.

use std::any::{Any, TypeId, type_name};

use crate::{Error, FromRow, NamedEnum, Row, StatementContext};

/// A type erased value produced by a type erased mapper. Downcast to the type the mapper has been
/// chosen for.
pub type AnyValue = Box<dyn Any + Send>;

/// Describes a type for the purpose of choosing a mapper for it.
///
/// The default implementation describes the type as opaque. This is sufficient for types which
/// are only ever mapped by mappers registered explicitly for them.
///
/// ```
/// use dbmap::{Reflect, TypeKind};
///
/// struct Money(i64);
///
/// impl Reflect for Money {}
///
/// assert!(matches!(Money::type_info().kind(), TypeKind::Opaque));
/// ```
pub trait Reflect: Any + Send + Sized {
    fn type_info() -> TypeInfo {
        TypeInfo::opaque::<Self>()
    }
}

/// Metadata about a type, see [`Reflect`].
#[derive(Debug, Clone)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    kind: TypeKind,
}

/// Shape of a type as far as mapper factories are concerned.
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// Nothing is known about the type, besides its identity.
    Opaque,
    /// A fieldless enum.
    Enum(EnumInfo),
    /// `Option<T>`.
    Optional(OptionalInfo),
    /// The type can be constructed from an entire row (see [`FromRow`]).
    Row(RowInfo),
}

impl TypeInfo {
    pub fn opaque<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind: TypeKind::Opaque,
        }
    }

    pub fn enumeration<T: NamedEnum + Send>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind: TypeKind::Enum(EnumInfo {
                variants: T::VARIANTS,
                from_ordinal: erased_from_ordinal::<T>,
            }),
        }
    }

    pub fn optional<T: Reflect>() -> Self {
        Self {
            id: TypeId::of::<Option<T>>(),
            name: type_name::<Option<T>>(),
            kind: TypeKind::Optional(OptionalInfo {
                inner: Box::new(T::type_info()),
                some: erased_some::<T>,
                none: erased_none::<T>,
            }),
        }
    }

    pub fn row<T: FromRow + Send>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind: TypeKind::Row(RowInfo {
                from_row: erased_from_row::<T>,
            }),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

/// Variant names and constructor of a fieldless enum.
#[derive(Debug, Clone, Copy)]
pub struct EnumInfo {
    variants: &'static [&'static str],
    from_ordinal: fn(usize) -> Option<AnyValue>,
}

impl EnumInfo {
    /// Names of the variants in declaration order.
    pub fn variants(&self) -> &'static [&'static str] {
        self.variants
    }

    /// Position of the variant with exactly this name.
    pub fn ordinal_of(&self, name: &str) -> Option<usize> {
        self.variants.iter().position(|variant| *variant == name)
    }

    /// Instantiates the variant at position `ordinal` in declaration order.
    pub fn instantiate(&self, ordinal: usize) -> Option<AnyValue> {
        (self.from_ordinal)(ordinal)
    }
}

/// Describes `Option<T>`.
#[derive(Debug, Clone)]
pub struct OptionalInfo {
    inner: Box<TypeInfo>,
    some: fn(AnyValue) -> Option<AnyValue>,
    none: fn() -> AnyValue,
}

impl OptionalInfo {
    pub fn inner(&self) -> &TypeInfo {
        &self.inner
    }

    /// Wraps a value of the inner type into `Some`. Returns `None` if `value` is not of the inner
    /// type.
    pub fn wrap_some(&self, value: AnyValue) -> Option<AnyValue> {
        (self.some)(value)
    }

    pub fn none(&self) -> AnyValue {
        (self.none)()
    }
}

/// Erased constructor of a type implementing [`FromRow`].
#[derive(Debug, Clone, Copy)]
pub struct RowInfo {
    from_row: fn(&Row, &StatementContext) -> Result<AnyValue, Error>,
}

impl RowInfo {
    pub fn from_row(&self, row: &Row, ctx: &StatementContext) -> Result<AnyValue, Error> {
        (self.from_row)(row, ctx)
    }
}

fn erased_from_ordinal<T: NamedEnum + Send>(ordinal: usize) -> Option<AnyValue> {
    T::from_ordinal(ordinal).map(|value| Box::new(value) as AnyValue)
}

fn erased_some<T: Reflect>(value: AnyValue) -> Option<AnyValue> {
    let value = value.downcast::<T>().ok()?;
    Some(Box::new(Some(*value)) as AnyValue)
}

fn erased_none<T: Reflect>() -> AnyValue {
    Box::new(None::<T>)
}

fn erased_from_row<T: FromRow + Send>(
    row: &Row,
    ctx: &StatementContext,
) -> Result<AnyValue, Error> {
    T::from_row(row, ctx).map(|value| Box::new(value) as AnyValue)
}

/// Recovers the concrete type of a value produced by a type erased mapper.
pub(crate) fn downcast<T: Any>(value: AnyValue) -> Result<T, Error> {
    value
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| Error::MapperTypeMismatch {
            type_name: type_name::<T>(),
        })
}

impl<T> Reflect for Option<T>
where
    T: Reflect,
{
    fn type_info() -> TypeInfo {
        TypeInfo::optional::<T>()
    }
}

macro_rules! impl_opaque_reflect {
    ($($t:ty)*) => (
        $(
            impl Reflect for $t {}
        )*
    );
}

impl_opaque_reflect! { i8 i16 i32 i64 u8 u16 u32 u64 usize f32 f64 bool String crate::Value }
impl Reflect for Vec<u8> {}
