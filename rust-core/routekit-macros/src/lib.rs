//! # Routekit Macros
//!
//! Procedural macros for routekit route contracts.
//!
//! ## Provided
//!
//! - `#[derive(ContractFields)]` - registers every field of a contract struct
//!   as a parameter descriptor or response variant, in declaration order.
//!   Fields that are neither are excluded with `#[contract(skip)]`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

/// Derive `routekit_core::ContractFields` for a struct with named fields
///
/// # Usage
///
/// ```ignore
/// #[derive(ContractFields)]
/// struct Hello {
///     echo: QueryParam<i64>,
///     success: ResponseVariant<String>,
///     #[contract(skip)]
///     greeting: &'static str,
/// }
/// ```
#[proc_macro_derive(ContractFields, attributes(contract))]
pub fn derive_contract_fields(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input).unwrap_or_else(syn::Error::into_compile_error).into()
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "ContractFields needs a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "ContractFields can only be derived for structs",
            ))
        }
    };

    let mut registered = Vec::new();
    for field in fields {
        if !is_skipped(field)? {
            registered.extend(field.ident.as_ref());
        }
    }

    Ok(quote! {
        impl #impl_generics ::routekit_core::ContractFields for #name #ty_generics #where_clause {
            fn fields(&self) -> ::std::vec::Vec<::routekit_core::ContractField<'_>> {
                ::std::vec![
                    #( ::routekit_core::ContractField::from(&self.#registered), )*
                ]
            }
        }
    })
}

/// Whether the field carries `#[contract(skip)]`
fn is_skipped(field: &syn::Field) -> syn::Result<bool> {
    let mut skip = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("contract") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported contract attribute, expected `skip`"))
            }
        })?;
    }
    Ok(skip)
}
