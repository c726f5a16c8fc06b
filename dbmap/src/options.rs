/// Decides how enums are represented in the database, if no mapper has been registered for the
/// specific enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumStrategy {
    /// Enums are stored as text holding the exact name of the variant.
    #[default]
    ByName,
    /// Enums are stored as integers holding the zero based index of the variant in declaration
    /// order.
    ByOrdinal,
}

/// Decides how column names of the result set are compared with the names requested by mappers
/// (e.g. the field names of a type deriving `FromRow`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnNameMatching {
    /// Many databases report column names in upper case, regardless of how they have been
    /// written in the statement text. So by default names are compared ignoring ASCII case.
    #[default]
    CaseInsensitive,
    Exact,
}

impl ColumnNameMatching {
    pub fn matches(self, column: &str, requested: &str) -> bool {
        match self {
            ColumnNameMatching::CaseInsensitive => column.eq_ignore_ascii_case(requested),
            ColumnNameMatching::Exact => column == requested,
        }
    }
}

/// Options controlling the behaviour of the built-in mappers. Passed to
/// [`crate::Handle::with_options`].
///
/// ```
/// use dbmap::{EnumStrategy, MappingOptions};
///
/// let options = MappingOptions::default().enum_strategy(EnumStrategy::ByOrdinal);
/// assert_eq!(EnumStrategy::ByOrdinal, options.enums());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MappingOptions {
    enum_strategy: EnumStrategy,
    column_name_matching: ColumnNameMatching,
}

impl MappingOptions {
    pub fn enum_strategy(self, enum_strategy: EnumStrategy) -> Self {
        Self {
            enum_strategy,
            ..self
        }
    }

    pub fn column_name_matching(self, column_name_matching: ColumnNameMatching) -> Self {
        Self {
            column_name_matching,
            ..self
        }
    }

    /// Strategy used by the default enum column mapper factory.
    pub fn enums(&self) -> EnumStrategy {
        self.enum_strategy
    }

    pub fn column_names(&self) -> ColumnNameMatching {
        self.column_name_matching
    }
}
