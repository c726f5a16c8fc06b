use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Fields, Result, ext::IdentExt};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let enum_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let enum_data = match &input.data {
        Data::Enum(enum_data) => enum_data,
        _ => {
            return Err(Error::new_spanned(
                enum_name,
                "SqlEnum can only be derived for enums",
            ));
        }
    };
    if enum_data.variants.is_empty() {
        return Err(Error::new_spanned(
            enum_name,
            "SqlEnum can not be derived for enums without variants",
        ));
    }
    if let Some(variant) = enum_data
        .variants
        .iter()
        .find(|variant| !matches!(variant.fields, Fields::Unit))
    {
        return Err(Error::new_spanned(
            variant,
            "SqlEnum can only be derived for enums without fields",
        ));
    }

    let idents: Vec<_> = enum_data.variants.iter().map(|variant| &variant.ident).collect();
    let names = idents.iter().map(|ident| ident.unraw().to_string());
    let ordinals: Vec<_> = (0..idents.len()).collect();

    let expanded = quote! {
        impl #impl_generics dbmap::NamedEnum for #enum_name #ty_generics #where_clause {
            const VARIANTS: &'static [&'static str] = &[#(#names),*];

            fn from_ordinal(ordinal: usize) -> std::option::Option<Self> {
                match ordinal {
                    #(#ordinals => Some(Self::#idents),)*
                    _ => None,
                }
            }

            fn ordinal(&self) -> usize {
                match self {
                    #(Self::#idents => #ordinals,)*
                }
            }
        }

        impl #impl_generics dbmap::Reflect for #enum_name #ty_generics #where_clause {
            fn type_info() -> dbmap::TypeInfo {
                dbmap::TypeInfo::enumeration::<Self>()
            }
        }

        impl #impl_generics dbmap::ToValue for #enum_name #ty_generics #where_clause {
            fn to_value(&self) -> dbmap::Value {
                dbmap::Value::Text(dbmap::NamedEnum::name(self).to_owned())
            }
        }
    };

    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use proc_macro2::TokenStream;
    use quote::quote;
    use syn::{DeriveInput, parse2};

    use super::expand;

    #[test]
    fn derive_sql_enum() {
        let input = given(quote! {
            enum Color {
                Red,
                Green,
            }
        });

        let output = expand(input).unwrap();

        let expected = quote! {
            impl dbmap::NamedEnum for Color {
                const VARIANTS: &'static [&'static str] = &["Red", "Green"];

                fn from_ordinal(ordinal: usize) -> std::option::Option<Self> {
                    match ordinal {
                        0usize => Some(Self::Red),
                        1usize => Some(Self::Green),
                        _ => None,
                    }
                }

                fn ordinal(&self) -> usize {
                    match self {
                        Self::Red => 0usize,
                        Self::Green => 1usize,
                    }
                }
            }

            impl dbmap::Reflect for Color {
                fn type_info() -> dbmap::TypeInfo {
                    dbmap::TypeInfo::enumeration::<Self>()
                }
            }

            impl dbmap::ToValue for Color {
                fn to_value(&self) -> dbmap::Value {
                    dbmap::Value::Text(dbmap::NamedEnum::name(self).to_owned())
                }
            }
        };
        assert_eq!(expected.to_string(), output.to_string());
    }

    #[test]
    fn raw_identifiers_are_named_without_prefix() {
        let input = given(quote! {
            enum Keyword {
                r#Type,
                r#Match,
            }
        });

        let output = expand(input).unwrap().to_string();

        let expected = quote! {
            const VARIANTS: &'static [&'static str] = &["Type", "Match"];
        };
        assert!(output.contains(&expected.to_string()));
        assert!(output.contains(&quote! { Some(Self::r#Type) }.to_string()));
    }

    #[test]
    fn variants_with_fields_are_rejected() {
        let input = given(quote! {
            enum Shape {
                Point,
                Circle(f64),
            }
        });

        let error = expand(input).unwrap_err();

        assert_eq!(
            "SqlEnum can only be derived for enums without fields",
            error.to_string()
        );
    }

    #[test]
    fn structs_are_rejected() {
        let input = given(quote! {
            struct NotAnEnum;
        });

        assert!(expand(input).is_err());
    }

    fn given(input: TokenStream) -> DeriveInput {
        parse2(input).unwrap()
    }
}
