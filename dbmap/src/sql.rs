//! Handling of parameter placeholders in statement text.

use crate::{Error, ToValue, Value};

/// Placeholders found in the statement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholders {
    /// Positional (`?`) placeholders. Also used for statements without any placeholders.
    Positional(usize),
    /// Names of the `:name` placeholders in order of appearance. A name may appear more than once.
    Named(Vec<String>),
}

/// Statement text with named placeholders replaced by positional ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSql {
    rendered: String,
    placeholders: Placeholders,
}

impl ParsedSql {
    /// Replaces `:name` placeholders with `?`. String literals (`'...'`), quoted identifiers
    /// (`"..."`) and comments are left untouched. A double colon (`::`, e.g. a PostgreSQL cast) is
    /// not a placeholder.
    ///
    /// ```
    /// use dbmap::sql::{ParsedSql, Placeholders};
    ///
    /// let parsed = ParsedSql::parse("SELECT * FROM t WHERE a = :a AND b = ':b'").unwrap();
    ///
    /// assert_eq!("SELECT * FROM t WHERE a = ? AND b = ':b'", parsed.rendered());
    /// assert_eq!(&Placeholders::Named(vec!["a".to_owned()]), parsed.placeholders());
    /// ```
    pub fn parse(sql: &str) -> Result<Self, Error> {
        let mut rendered = String::with_capacity(sql.len());
        let mut names = Vec::new();
        let mut num_positional = 0;
        let mut chars = sql.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            match c {
                '\'' | '"' => {
                    rendered.push(c);
                    let construct = if c == '\'' {
                        "string literal"
                    } else {
                        "quoted identifier"
                    };
                    // Doubled quotes are an escaped quote. Both halves are copied by passing
                    // through this loop twice.
                    loop {
                        let (_, next) = chars.next().ok_or(Error::UnterminatedSql { construct })?;
                        rendered.push(next);
                        if next == c {
                            break;
                        }
                    }
                }
                '-' if matches!(chars.peek(), Some((_, '-'))) => {
                    rendered.push(c);
                    for (_, next) in chars.by_ref() {
                        rendered.push(next);
                        if next == '\n' {
                            break;
                        }
                    }
                }
                '/' if matches!(chars.peek(), Some((_, '*'))) => {
                    rendered.push(c);
                    let mut previous = ' ';
                    // Skip the opening `*`, so `/*/` is not mistaken for a complete comment.
                    if let Some((_, star)) = chars.next() {
                        rendered.push(star);
                    }
                    loop {
                        let (_, next) = chars.next().ok_or(Error::UnterminatedSql {
                            construct: "block comment",
                        })?;
                        rendered.push(next);
                        if previous == '*' && next == '/' {
                            break;
                        }
                        previous = next;
                    }
                }
                ':' if matches!(chars.peek(), Some((_, ':'))) => {
                    rendered.push_str("::");
                    chars.next();
                }
                ':' if matches!(chars.peek(), Some((_, n)) if is_name_start(*n)) => {
                    let mut name = String::new();
                    while let Some((_, n)) = chars.next_if(|(_, n)| is_name_part(*n)) {
                        name.push(n);
                    }
                    names.push(name);
                    rendered.push('?');
                }
                '?' => {
                    num_positional += 1;
                    rendered.push(c);
                }
                _ => rendered.push(c),
            }
        }

        let placeholders = match (num_positional, names.is_empty()) {
            (n, true) => Placeholders::Positional(n),
            (0, false) => Placeholders::Named(names),
            _ => return Err(Error::MixedParameterStyles),
        };
        Ok(Self {
            rendered,
            placeholders,
        })
    }

    /// Statement text passed to the driver.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    pub fn placeholders(&self) -> &Placeholders {
        &self.placeholders
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Arguments bound to a statement, by position and by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the next positional parameter.
    pub fn push(&mut self, value: impl ToValue) {
        self.positional.push(value.to_value());
    }

    /// Binds a named parameter. Binding the same name again replaces the previous value.
    pub fn push_named(&mut self, name: impl Into<String>, value: impl ToValue) {
        self.named.push((name.into(), value.to_value()));
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    fn named(&self, name: &str) -> Option<&Value> {
        self.named
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// Values for the placeholders of `parsed`, in the order they appear in the rendered
    /// statement.
    pub fn resolve(&self, parsed: &ParsedSql) -> Result<Vec<Value>, Error> {
        match parsed.placeholders() {
            Placeholders::Positional(expected) => {
                if *expected != self.positional.len() {
                    return Err(Error::ParameterCountMismatch {
                        expected: *expected,
                        bound: self.positional.len(),
                    });
                }
                Ok(self.positional.clone())
            }
            Placeholders::Named(names) => names
                .iter()
                .map(|name| {
                    self.named(name)
                        .cloned()
                        .ok_or_else(|| Error::MissingNamedParameter { name: name.clone() })
                })
                .collect(),
        }
    }
}

/// Collections of values which can be bound to the positional parameters of a statement. The unit
/// type `()` represents no arguments. Tuples bind their elements in order.
pub trait IntoArguments {
    fn into_arguments(self) -> Arguments;
}

impl IntoArguments for Arguments {
    fn into_arguments(self) -> Arguments {
        self
    }
}

impl IntoArguments for Vec<Value> {
    fn into_arguments(self) -> Arguments {
        Arguments {
            positional: self,
            named: Vec::new(),
        }
    }
}

impl IntoArguments for &[Value] {
    fn into_arguments(self) -> Arguments {
        self.to_vec().into_arguments()
    }
}

macro_rules! impl_into_arguments_for_tuple {
    ($($t:ident)*) => (
        #[allow(unused_mut)]
        #[allow(non_snake_case)]
        impl<$($t: ToValue,)*> IntoArguments for ($($t,)*) {
            fn into_arguments(self) -> Arguments {
                let ($($t,)*) = self;
                let mut arguments = Arguments::new();
                $(arguments.push($t);)*
                arguments
            }
        }
    );
}

// The unit type is used to signal no arguments.
impl_into_arguments_for_tuple! {}
impl_into_arguments_for_tuple! { A }
impl_into_arguments_for_tuple! { A B }
impl_into_arguments_for_tuple! { A B C }
impl_into_arguments_for_tuple! { A B C D }
impl_into_arguments_for_tuple! { A B C D E }
impl_into_arguments_for_tuple! { A B C D E F }
impl_into_arguments_for_tuple! { A B C D E F G }
impl_into_arguments_for_tuple! { A B C D E F G H }
impl_into_arguments_for_tuple! { A B C D E F G H I }
impl_into_arguments_for_tuple! { A B C D E F G H I J }

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use crate::{Error, Value};

    use super::{Arguments, IntoArguments, ParsedSql, Placeholders};

    #[test_case("SELECT 1", "SELECT 1", Placeholders::Positional(0); "no placeholders")]
    #[test_case(
        "SELECT * FROM t WHERE a = ? AND b = ?",
        "SELECT * FROM t WHERE a = ? AND b = ?",
        Placeholders::Positional(2);
        "positional"
    )]
    #[test_case(
        "INSERT INTO kv VALUES(:key, :value)",
        "INSERT INTO kv VALUES(?, ?)",
        Placeholders::Named(vec!["key".to_owned(), "value".to_owned()]);
        "named"
    )]
    #[test_case(
        "SELECT ':no' || \"col:umn\" FROM t -- :comment\nWHERE x = :x",
        "SELECT ':no' || \"col:umn\" FROM t -- :comment\nWHERE x = ?",
        Placeholders::Named(vec!["x".to_owned()]);
        "quotes and line comments"
    )]
    #[test_case(
        "SELECT /* :a ? */ x::int FROM t WHERE y = :y_2",
        "SELECT /* :a ? */ x::int FROM t WHERE y = ?",
        Placeholders::Named(vec!["y_2".to_owned()]);
        "block comments and casts"
    )]
    #[test_case(
        "SELECT 'It''s ?' FROM t",
        "SELECT 'It''s ?' FROM t",
        Placeholders::Positional(0);
        "escaped quote"
    )]
    #[test_case("SELECT a:1", "SELECT a:1", Placeholders::Positional(0); "colon before digit")]
    fn parse(sql: &str, rendered: &str, placeholders: Placeholders) {
        let parsed = ParsedSql::parse(sql).unwrap();

        assert_eq!(rendered, parsed.rendered());
        assert_eq!(&placeholders, parsed.placeholders());
    }

    #[test]
    fn mixed_placeholders_are_rejected() {
        let result = ParsedSql::parse("SELECT * FROM t WHERE a = ? AND b = :b");
        assert!(matches!(result, Err(Error::MixedParameterStyles)));
    }

    #[test_case("SELECT 'open", "string literal")]
    #[test_case("SELECT \"open", "quoted identifier")]
    #[test_case("SELECT /* open", "block comment")]
    #[test_case("SELECT /*/", "block comment")]
    fn unterminated(sql: &str, expected: &str) {
        let result = ParsedSql::parse(sql);
        assert!(matches!(
            result,
            Err(Error::UnterminatedSql { construct }) if construct == expected
        ));
    }

    #[test]
    fn resolve_named_arguments_in_order_of_appearance() {
        let parsed = ParsedSql::parse("SELECT :b, :a, :b").unwrap();
        let mut arguments = Arguments::new();
        arguments.push_named("a", 1);
        arguments.push_named("b", "two");
        arguments.push_named("b", "three");

        let values = arguments.resolve(&parsed).unwrap();

        assert_eq!(
            vec![
                Value::Text("three".to_owned()),
                Value::Integer(1),
                Value::Text("three".to_owned())
            ],
            values
        );
    }

    #[test]
    fn tuples_bind_positionally() {
        let parsed = ParsedSql::parse("SELECT ?, ?").unwrap();

        let values = (1, Some("x")).into_arguments().resolve(&parsed).unwrap();

        assert_eq!(vec![Value::Integer(1), Value::Text("x".to_owned())], values);
    }

    #[test]
    fn missing_named_argument() {
        let parsed = ParsedSql::parse("SELECT :a").unwrap();

        let result = Arguments::new().resolve(&parsed);

        assert!(matches!(result, Err(Error::MissingNamedParameter { name }) if name == "a"));
    }

    #[test]
    fn positional_count_must_match() {
        let parsed = ParsedSql::parse("SELECT ?, ?").unwrap();
        let mut arguments = Arguments::new();
        arguments.push(1);

        let result = arguments.resolve(&parsed);

        assert!(matches!(
            result,
            Err(Error::ParameterCountMismatch {
                expected: 2,
                bound: 1
            })
        ));
    }
}
