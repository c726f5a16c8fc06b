/// A single value as it is exchanged with the database driver. Used both for the fields of a
/// [`crate::Row`] and for the arguments bound to statement parameters.
///
/// The variants follow the storage classes most drivers are able to represent without loss. More
/// specific types (e.g. timestamps or decimals) are transported as text and mapped by column
/// mappers.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `NULL`
    Null,
    /// Any integer type, widened to 64 Bit.
    Integer(i64),
    /// Any floating point type, widened to 64 Bit.
    Real(f64),
    /// Character data. Always UTF-8.
    Text(String),
    /// Binary data.
    Blob(Vec<u8>),
}

impl Value {
    /// `true` if the value is `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the variant. Used to describe the value in error messages without printing
    /// potentially large or sensitive payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
            Value::Blob(_) => "BLOB",
        }
    }

    /// Text content, if the value is of variant `Text`.
    pub fn as_text(&self) -> Option<&str> {
        if let Value::Text(text) = self {
            Some(text)
        } else {
            None
        }
    }
}

/// Types which can be bound as arguments to the parameters of a statement.
///
/// ```
/// use dbmap::{ToValue, Value};
///
/// assert_eq!(Value::Integer(42), 42i32.to_value());
/// assert_eq!(Value::Null, None::<&str>.to_value());
/// ```
pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T> ToValue for &T
where
    T: ToValue + ?Sized,
{
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T> ToValue for Option<T>
where
    T: ToValue,
{
    fn to_value(&self) -> Value {
        match self {
            Some(value) => value.to_value(),
            None => Value::Null,
        }
    }
}

macro_rules! impl_to_value_for_integer {
    ($($t:ty)*) => (
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    Value::Integer(i64::from(*self))
                }
            }
        )*
    );
}

impl_to_value_for_integer! { i8 i16 i32 i64 u8 u16 u32 }

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Real(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Real(*self)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Integer(if *self { 1 } else { 0 })
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_owned())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for [u8] {
    fn to_value(&self) -> Value {
        Value::Blob(self.to_vec())
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Blob(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{ToValue, Value};

    #[test]
    fn bool_is_bound_as_integer() {
        assert_eq!(Value::Integer(1), true.to_value());
        assert_eq!(Value::Integer(0), false.to_value());
    }

    #[test]
    fn references_bind_like_their_target() {
        let text = String::from("Hello");
        let reference = &&text;
        assert_eq!(Value::Text("Hello".to_owned()), reference.to_value());
    }

    #[test]
    fn kind_names_variant() {
        assert_eq!("BLOB", Value::Blob(vec![1, 2]).kind());
        assert_eq!("NULL", Value::Null.kind());
    }
}
