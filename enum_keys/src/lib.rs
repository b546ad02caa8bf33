use std::fmt;

use proc_macro::TokenStream;
use quote::quote;

enum Visibility {
    Public(proc_macro2::Span),
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public(..) => "public",
            Self::Private => "private",
        }
        .fmt(f)
    }
}

impl syn::parse::Parse for Visibility {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let identifier = input.parse::<syn::Ident>()?;
        match identifier.to_string().as_str() {
            "public" => Ok(Self::Public(identifier.span())),
            "private" => Ok(Self::Private),
            _ => Err(syn::Error::new_spanned(
                identifier,
                "Unexpected visibility: expected `public` or `private`",
            )),
        }
    }
}

struct EnumKeysArgs {
    visibility: Visibility,
}

impl syn::parse::Parse for EnumKeysArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let visibility = input.parse()?;

        if !input.is_empty() {
            return Err(syn::Error::new(
                input.span(),
                format!("Unexpected tokens after `{}` visibility", visibility),
            ));
        }

        Ok(Self { visibility })
    }
}

/// Converts a `CamelCase` variant name into its `SCREAMING_SNAKE_CASE` key.
/// Digits stay attached to the word before them, so `Operand1` becomes
/// `OPERAND1`.
fn screaming_snake_case(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + 8);
    let mut previous: Option<char> = None;
    for c in name.chars() {
        if c.is_ascii_uppercase()
            && previous.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
        {
            key.push('_');
        }
        key.push(c.to_ascii_uppercase());
        previous = Some(c);
    }
    key
}

/// Finds a `#[key = "..."]` override on a variant and removes it, since the
/// attribute is not meaningful to the compiler.
fn take_key_override(variant: &mut syn::Variant) -> syn::Result<Option<String>> {
    let mut key = None;
    let mut error = None;
    variant.attrs.retain(|attribute| {
        if !attribute.path().is_ident("key") {
            return true;
        }
        match &attribute.meta {
            syn::Meta::NameValue(syn::MetaNameValue {
                value:
                    syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(literal),
                        ..
                    }),
                ..
            }) => key = Some(literal.value()),
            other => {
                error = Some(syn::Error::new_spanned(
                    other,
                    "Expected `#[key = \"...\"]`",
                ))
            }
        }
        false
    });
    match error {
        Some(error) => Err(error),
        None => Ok(key),
    }
}

fn impl_enum_keys(
    enum_visibility: syn::Visibility,
    enum_name: syn::Ident,
    variants: impl Iterator<Item = (syn::Variant, String)>,
) -> proc_macro2::TokenStream {
    let mut keys = vec![];
    let mut match_cases = vec![];

    for (variant, key) in variants {
        let variant_name = variant.ident;

        match variant.fields {
            syn::Fields::Named(_) => {
                match_cases.push(quote! {
                    Self::#variant_name { .. } => #key
                });
            }
            syn::Fields::Unnamed(_) => {
                match_cases.push(quote! {
                    Self::#variant_name(..) => #key
                });
            }
            syn::Fields::Unit => {
                match_cases.push(quote! {
                    Self::#variant_name => #key
                });
            }
        }

        keys.push(key);
    }

    let key_count = keys.len();

    quote! {
        impl #enum_name {
            #[doc = "`#[enum_keys]`-generated list of every variant's key, in declaration order."]
            #enum_visibility const KEYS: [&'static str; #key_count] = [#(#keys),*];

            #[doc = "`#[enum_keys]`-generated getter for this variant's message key."]
            #enum_visibility const fn key(&self) -> &'static str {
                match self {
                    #(#match_cases),*
                }
            }
        }
    }
}

/// Constructs an `impl` for the given `enum` with a `key()` getter returning
/// each variant's name in `SCREAMING_SNAKE_CASE` and a `KEYS` table listing
/// all of them. A variant can pick its own key with `#[key = "..."]`.
///
/// Usage examples:
///
/// * `#[enum_keys(public)]`
/// * `#[enum_keys(private)]`
#[proc_macro_attribute]
pub fn enum_keys(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = syn::parse_macro_input!(args as EnumKeysArgs);

    let mut input_item = syn::parse_macro_input!(input as syn::DeriveInput);

    let data_enum = match &mut input_item.data {
        syn::Data::Enum(data_enum) => data_enum,
        syn::Data::Struct(syn::DataStruct {
            struct_token: syn::token::Struct { span },
            ..
        })
        | syn::Data::Union(syn::DataUnion {
            union_token: syn::token::Union { span },
            ..
        }) => {
            return syn::Error::new(*span, "Item must be an `enum`")
                .into_compile_error()
                .into();
        }
    };

    let mut keyed_variants = vec![];
    for variant in data_enum.variants.iter_mut() {
        let key = match take_key_override(variant) {
            Ok(Some(key)) => key,
            Ok(None) => screaming_snake_case(&variant.ident.to_string()),
            Err(error) => return error.into_compile_error().into(),
        };
        keyed_variants.push((variant.clone(), key));
    }

    let visibility = match args.visibility {
        Visibility::Public(span) => {
            syn::Visibility::Public(syn::token::Pub { span })
        }
        Visibility::Private => syn::Visibility::Inherited,
    };

    let keys_impl = impl_enum_keys(
        visibility,
        input_item.ident.clone(),
        keyed_variants.into_iter(),
    );

    quote! {
        #input_item

        #keys_impl
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::screaming_snake_case;

    #[test]
    fn converts_camel_case() {
        assert_eq!("STACK_OVERFLOW", screaming_snake_case("StackOverflow"));
        assert_eq!("EXITED_NORMALLY", screaming_snake_case("ExitedNormally"));
        assert_eq!("ARG_ILLEGAL", screaming_snake_case("ArgIllegal"));
    }

    #[test]
    fn keeps_digits_with_their_word() {
        assert_eq!(
            "IF_ILLEGAL_COND_OPERAND1",
            screaming_snake_case("IfIllegalCondOperand1")
        );
        assert_eq!(
            "ASSIGN_RIGHT_OPERAND2_IMM_TOO_LARGE",
            screaming_snake_case("AssignRightOperand2ImmTooLarge")
        );
    }
}
