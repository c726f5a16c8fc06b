use proc_macro::TokenStream;
use syn::{DeriveInput, ItemTrait, parse_macro_input};

mod from_row;
mod sql_enum;
mod sql_object;

/// Derives `dbmap::FromRow` and `dbmap::Reflect` for structs. Named fields are mapped from the
/// column with the same name, unless renamed with `#[column(name = "...")]`. Fields of tuple
/// structs are mapped from the columns in order.
#[proc_macro_derive(FromRow, attributes(column))]
pub fn derive_from_row(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derives `dbmap::NamedEnum`, `dbmap::Reflect` and `dbmap::ToValue` for fieldless enums. Values
/// are bound as the name of the variant.
#[proc_macro_derive(SqlEnum)]
pub fn derive_sql_enum(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    sql_enum::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Implements the annotated trait for `dbmap::SqlObject`. Each method without a default body must
/// declare its statement with either `#[sql_query("...")]` or `#[sql_update("...")]`. Queries may
/// additionally name a row mapper with `#[mapper(Type)]` and a collector with `#[collector(Type)]`.
/// Both are instantiated using `Default`.
///
/// Method arguments are bound to the statement both in order and by their name, so statements may
/// use either `?` or `:name` placeholders.
#[proc_macro_attribute]
pub fn sql_object(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "sql_object does not take any arguments",
        )
        .into_compile_error()
        .into();
    }
    let input = parse_macro_input!(item as ItemTrait);
    sql_object::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
