use darling::{FromAttributes, FromMeta};
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, DeriveInput};

mod common;

/// Demo attribute options
#[derive(Debug, Default, FromMeta)]
struct DemoOptions {
    /// Name the demo is registered under; defaults to the type name
    #[darling(default)]
    name: Option<String>,
    /// Declared demo version
    #[darling(default)]
    version: Option<f64>,
}

#[derive(Debug, FromAttributes)]
#[darling(attributes(demo))]
struct DemoArgs {
    #[darling(flatten)]
    opts: DemoOptions,
}

/// Parse demo attributes to extract options
fn parse_demo_attrs(attrs: &[Attribute]) -> darling::Result<DemoOptions> {
    DemoArgs::from_attributes(attrs).map(|a| a.opts)
}

/// Derives the `DemoClass` trait for a type.
///
/// # Attributes
///
/// ```ignore
/// # use applied_api::DemoClass;
/// #[derive(DemoClass)]
/// #[demo(
///     name = "keyed-executor",   // Registry name, defaults to the type name
///     version = 1.1              // Declared version, defaults to 0.0
/// )]
/// struct KeyedExecutorDemo;
/// ```
///
/// # Generated Items
///
/// - `demo_name() -> &'static str`
/// - `demo_version() -> f64`
#[proc_macro_derive(DemoClass, attributes(demo))]
pub fn derive_demo_class(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if let syn::Data::Union(_) = input.data {
        return common::to_compile_error(syn::Error::new_spanned(
            &input.ident,
            "DemoClass can only be derived for structs and enums",
        ));
    }

    let options = match parse_demo_attrs(&input.attrs) {
        Ok(options) => options,
        Err(err) => return TokenStream::from(err.write_errors()),
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let demo_name = options.name.unwrap_or_else(|| name.to_string());
    if demo_name.trim().is_empty() {
        return common::to_compile_error(syn::Error::new_spanned(
            name,
            "demo name must not be empty",
        ));
    }
    let version = options.version.unwrap_or(0.0);

    let expanded = quote! {
        impl #impl_generics applied_api::DemoClass for #name #ty_generics #where_clause {
            fn demo_name() -> &'static str {
                #demo_name
            }

            fn demo_version() -> f64 {
                #version
            }
        }
    };

    TokenStream::from(expanded)
}
