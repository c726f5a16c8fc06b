use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Fields, LitStr, Result, ext::IdentExt};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let struct_data = match &input.data {
        Data::Struct(struct_data) => struct_data,
        _ => {
            return Err(Error::new_spanned(
                struct_name,
                "FromRow can only be derived for structs",
            ));
        }
    };

    let construction = match &struct_data.fields {
        Fields::Named(fields) => {
            let members = fields
                .named
                .iter()
                .map(|field| {
                    let field_name = field
                        .ident
                        .as_ref()
                        .expect("Named fields always have an identifier");
                    let column = column_name(field)?
                        .unwrap_or_else(|| field_name.unraw().to_string());
                    let ty = &field.ty;
                    Ok(quote! {
                        #field_name: ctx.map_column_by_name::<#ty>(row, #column)?
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            quote! { Self { #(#members,)* } }
        }
        Fields::Unnamed(fields) => {
            let members = fields
                .unnamed
                .iter()
                .enumerate()
                .map(|(index, field)| {
                    if let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("column")) {
                        return Err(Error::new_spanned(
                            attr,
                            "Fields of tuple structs are mapped by position and can not be renamed",
                        ));
                    }
                    let col_index = (index + 1) as u16;
                    let ty = &field.ty;
                    Ok(quote! { ctx.map_column::<#ty>(row, #col_index)? })
                })
                .collect::<Result<Vec<_>>>()?;
            quote! { Self ( #(#members,)* ) }
        }
        Fields::Unit => {
            return Err(Error::new_spanned(
                struct_name,
                "FromRow can not be derived for unit structs",
            ));
        }
    };

    let expanded = quote! {
        impl #impl_generics dbmap::FromRow for #struct_name #ty_generics #where_clause {
            fn from_row(
                row: &dbmap::Row,
                ctx: &dbmap::StatementContext
            ) -> std::result::Result<Self, dbmap::Error> {
                Ok(#construction)
            }
        }

        impl #impl_generics dbmap::Reflect for #struct_name #ty_generics #where_clause {
            fn type_info() -> dbmap::TypeInfo {
                dbmap::TypeInfo::row::<Self>()
            }
        }
    };

    Ok(expanded)
}

/// Value of `#[column(name = "...")]`, if present.
fn column_name(field: &syn::Field) -> Result<Option<String>> {
    let mut name = None;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("column")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported column attribute, expected `name = \"...\"`"))
            }
        })?;
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use proc_macro2::TokenStream;
    use quote::quote;
    use syn::{DeriveInput, parse2};

    use super::expand;

    #[test]
    fn derive_from_row_for_named_fields() {
        let input = given(quote! {
            struct Entry {
                key: String,
                #[column(name = "val")]
                value: Option<i64>,
            }
        });

        let output = expand(input).unwrap();

        let expected = quote! {
            impl dbmap::FromRow for Entry {
                fn from_row(
                    row: &dbmap::Row,
                    ctx: &dbmap::StatementContext
                ) -> std::result::Result<Self, dbmap::Error> {
                    Ok(Self {
                        key: ctx.map_column_by_name::<String>(row, "key")?,
                        value: ctx.map_column_by_name::<Option<i64> >(row, "val")?,
                    })
                }
            }

            impl dbmap::Reflect for Entry {
                fn type_info() -> dbmap::TypeInfo {
                    dbmap::TypeInfo::row::<Self>()
                }
            }
        };
        assert_eq!(expected.to_string(), output.to_string());
    }

    #[test]
    fn derive_from_row_for_tuple_struct() {
        let input = given(quote! {
            struct Pair(String, i32);
        });

        let output = expand(input).unwrap();

        let expected = quote! {
            impl dbmap::FromRow for Pair {
                fn from_row(
                    row: &dbmap::Row,
                    ctx: &dbmap::StatementContext
                ) -> std::result::Result<Self, dbmap::Error> {
                    Ok(Self (
                        ctx.map_column::<String>(row, 1u16)?,
                        ctx.map_column::<i32>(row, 2u16)?,
                    ))
                }
            }

            impl dbmap::Reflect for Pair {
                fn type_info() -> dbmap::TypeInfo {
                    dbmap::TypeInfo::row::<Self>()
                }
            }
        };
        assert_eq!(expected.to_string(), output.to_string());
    }

    #[test]
    fn raw_identifiers_map_to_plain_column_names() {
        let input = given(quote! {
            struct Item {
                r#type: String,
            }
        });

        let output = expand(input).unwrap().to_string();

        assert!(output.contains("\"type\""));
    }

    #[test]
    fn enums_are_rejected() {
        let input = given(quote! {
            enum NotARow { A }
        });

        let error = expand(input).unwrap_err();

        assert_eq!("FromRow can only be derived for structs", error.to_string());
    }

    #[test]
    fn unknown_column_attribute_is_rejected() {
        let input = given(quote! {
            struct Entry {
                #[column(rename = "k")]
                key: String,
            }
        });

        assert!(expand(input).is_err());
    }

    fn given(input: TokenStream) -> DeriveInput {
        parse2(input).unwrap()
    }
}
