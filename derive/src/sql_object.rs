use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, Error, FnArg, GenericArgument, ItemTrait, LitStr, Pat, PathArguments, PathSegment,
    Result, ReturnType, TraitItem, TraitItemFn, Type, ext::IdentExt, parse_quote,
};

/// Containers a query result is collected into, if a method returns them.
const COLLECTIONS: &[&str] = &[
    "Vec",
    "VecDeque",
    "LinkedList",
    "HashSet",
    "BTreeSet",
    "HashMap",
    "BTreeMap",
];

/// Statement declared on a trait method.
enum Statement {
    Query {
        sql: LitStr,
        mapper: Option<Type>,
        collector: Option<Type>,
    },
    Update {
        sql: LitStr,
    },
}

pub fn expand(mut input: ItemTrait) -> Result<TokenStream> {
    let mut methods = Vec::new();
    for item in &mut input.items {
        match item {
            TraitItem::Fn(method) => {
                let statement = take_statement(method)?;
                match (statement, &method.default) {
                    (Some(statement), None) => methods.push(expand_method(method, statement)?),
                    (Some(_), Some(_)) => {
                        return Err(Error::new_spanned(
                            &method.sig,
                            "Methods with a default implementation can not declare a statement",
                        ));
                    }
                    (None, Some(_)) => (),
                    (None, None) => {
                        return Err(Error::new_spanned(
                            &method.sig,
                            "Method requires either a `#[sql_query(...)]` or a \
                            `#[sql_update(...)]` attribute",
                        ));
                    }
                }
            }
            TraitItem::Const(item) if item.default.is_none() => {
                return Err(Error::new_spanned(
                    item,
                    "Associated constants require a default in traits annotated with sql_object",
                ));
            }
            TraitItem::Type(item) if item.default.is_none() => {
                return Err(Error::new_spanned(
                    item,
                    "Associated types are not supported in traits annotated with sql_object",
                ));
            }
            _ => (),
        }
    }

    let trait_name = &input.ident;
    let mut impl_generics = input.generics.clone();
    impl_generics
        .params
        .push(parse_quote!(D: dbmap::Driver));
    let (impl_generics, _, _) = impl_generics.split_for_impl();
    let (_, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        #input

        impl #impl_generics #trait_name #ty_generics for dbmap::SqlObject<'_, D> #where_clause {
            #(#methods)*
        }
    };
    Ok(expanded)
}

/// Removes the statement attributes from `method` and returns the statement they declare.
fn take_statement(method: &mut TraitItemFn) -> Result<Option<Statement>> {
    let mut sql_query = None;
    let mut sql_update = None;
    let mut mapper = None;
    let mut collector = None;
    let mut remaining = Vec::new();
    for attr in method.attrs.drain(..) {
        if attr.path().is_ident("sql_query") {
            set_once(&mut sql_query, &attr, attr.parse_args::<LitStr>()?)?;
        } else if attr.path().is_ident("sql_update") {
            set_once(&mut sql_update, &attr, attr.parse_args::<LitStr>()?)?;
        } else if attr.path().is_ident("mapper") {
            set_once(&mut mapper, &attr, attr.parse_args::<Type>()?)?;
        } else if attr.path().is_ident("collector") {
            set_once(&mut collector, &attr, attr.parse_args::<Type>()?)?;
        } else {
            remaining.push(attr);
        }
    }
    method.attrs = remaining;

    let statement = match (sql_query, sql_update) {
        (Some(sql), None) => Some(Statement::Query {
            sql,
            mapper,
            collector,
        }),
        (None, Some(sql)) => {
            if mapper.is_some() || collector.is_some() {
                return Err(Error::new_spanned(
                    &method.sig,
                    "Updates do not produce rows, so they can not have a mapper or collector",
                ));
            }
            Some(Statement::Update { sql })
        }
        (Some(_), Some(_)) => {
            return Err(Error::new_spanned(
                &method.sig,
                "A method can not declare both a query and an update",
            ));
        }
        (None, None) => {
            if mapper.is_some() || collector.is_some() {
                return Err(Error::new_spanned(
                    &method.sig,
                    "`#[mapper]` and `#[collector]` require a `#[sql_query(...)]` attribute",
                ));
            }
            None
        }
    };
    Ok(statement)
}

fn set_once<T>(slot: &mut Option<T>, attr: &Attribute, value: T) -> Result<()> {
    if slot.is_some() {
        return Err(Error::new_spanned(attr, "Attribute may only be specified once"));
    }
    *slot = Some(value);
    Ok(())
}

fn expand_method(method: &TraitItemFn, statement: Statement) -> Result<TokenStream> {
    let sig = &method.sig;
    if let Some(asyncness) = &sig.asyncness {
        return Err(Error::new_spanned(asyncness, "Async methods are not supported"));
    }

    let mut bindings = Vec::new();
    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(Error::new_spanned(sig, "Methods must take `&self` as receiver"));
        }
    }
    for input in inputs {
        let FnArg::Typed(arg) = input else {
            return Err(Error::new_spanned(input, "Unexpected receiver"));
        };
        let Pat::Ident(pat) = arg.pat.as_ref() else {
            return Err(Error::new_spanned(
                &arg.pat,
                "Arguments must be plain identifiers, so they can be bound by name",
            ));
        };
        let ident = &pat.ident;
        let name = ident.unraw().to_string();
        bindings.push(quote! { .bind_argument(#name, &#ident) });
    }

    let value = return_value_type(&sig.output)?;

    let body = match statement {
        Statement::Update { sql } => quote! {
            let count = dbmap::SqlObject::handle(self)
                .create_update(#sql)
                #(#bindings)*
                .execute()?;
            Ok(<#value as dbmap::UpdateResult>::from_row_count(count))
        },
        Statement::Query {
            sql,
            mapper,
            collector,
        } => {
            let (item, consume) = match &collector {
                Some(collector) => (
                    quote! { <#collector as dbmap::Collector>::Item },
                    quote! { .collect_with(&<#collector as std::default::Default>::default())? },
                ),
                None => match shape(value) {
                    Shape::Collection(item) => (quote! { #item }, quote! { .collect::<#value>()? }),
                    // Without an explicit mapper the row maps to `Option<T>`, so a `NULL`
                    // result (e.g. an aggregate over no rows) yields `None`, too.
                    Shape::Optional(item) if mapper.is_none() => (
                        quote! { std::option::Option<#item> },
                        quote! { .first()?.flatten() },
                    ),
                    Shape::Optional(item) => (quote! { #item }, quote! { .first()? }),
                    Shape::One => (quote! { #value }, quote! { .one()? }),
                },
            };
            let map = match &mapper {
                Some(mapper) => quote! {
                    .map::<#item, #mapper>(<#mapper as std::default::Default>::default())
                },
                None => quote! { .map_to::<#item>() },
            };
            quote! {
                Ok(dbmap::SqlObject::handle(self)
                    .create_query(#sql)
                    #(#bindings)*
                    #map
                    #consume)
            }
        }
    };

    Ok(quote! {
        #sig {
            #body
        }
    })
}

/// The success type `T` of a method returning `Result<T, E>`.
fn return_value_type(output: &ReturnType) -> Result<&Type> {
    let error = || {
        Error::new_spanned(
            output,
            "Methods must return a `Result` whose error type implements `From<dbmap::Error>`",
        )
    };
    let ReturnType::Type(_, ty) = output else {
        return Err(error());
    };
    let Type::Path(path) = ty.as_ref() else {
        return Err(error());
    };
    let segment = path.path.segments.last().ok_or_else(error)?;
    if segment.ident != "Result" {
        return Err(error());
    }
    first_type_argument(&segment.arguments).ok_or_else(error)
}

enum Shape<'a> {
    /// Rows are collected into the container. Holds the type each row is mapped to.
    Collection(TokenStream),
    /// The first row, if any.
    Optional(&'a Type),
    /// Exactly one row.
    One,
}

fn shape(value: &Type) -> Shape<'_> {
    let Type::Path(path) = value else {
        return Shape::One;
    };
    let Some(segment) = path.path.segments.last() else {
        return Shape::One;
    };
    let container = segment.ident.to_string();
    if container == "Option" {
        if let Some(item) = first_type_argument(&segment.arguments) {
            return Shape::Optional(item);
        }
    } else if is_blob(segment) {
        return Shape::One;
    } else if COLLECTIONS.contains(&container.as_str()) {
        let PathArguments::AngleBracketed(args) = &segment.arguments else {
            return Shape::One;
        };
        let types: Vec<_> = args
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect();
        return match (container.ends_with("Map"), types.as_slice()) {
            // Maps are built from key value pairs. Further arguments are hashers.
            (true, [key, value, ..]) => Shape::Collection(quote! { (#key, #value) }),
            (false, [item, ..]) => Shape::Collection(quote! { #item }),
            _ => Shape::One,
        };
    }
    Shape::One
}

/// `Vec<u8>` is mapped from a single binary column, rather than collected from rows.
fn is_blob(segment: &PathSegment) -> bool {
    if segment.ident != "Vec" {
        return false;
    }
    matches!(
        first_type_argument(&segment.arguments),
        Some(Type::Path(item)) if item.path.is_ident("u8")
    )
}

fn first_type_argument(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}
