//! 配置绑定派生宏实现

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

use crate::utils::{find_attr, named_fields, parse_tags};

fn tag_tokens(tags: &[(String, String)]) -> TokenStream {
    let pairs = tags.iter().map(|(tag, path)| quote! { (#tag, #path) });
    quote! { &[#(#pairs),*] }
}

/// 实现 #[derive(ValueBind)]
///
/// 结构体上的 `#[value_prefix(...)]` 给出路径前缀，
/// 字段上的 `#[value(...)]` 给出路径；字段类型必须是 `ConfigValue<T>`。
pub fn derive_value_bind_impl(input: &DeriveInput) -> Result<TokenStream> {
    let fields = named_fields(input, "ValueBind")?;
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let prefixes = match find_attr(&input.attrs, "value_prefix") {
        Some(attr) => parse_tags(attr)?,
        None => Vec::new(),
    };
    let prefixes = tag_tokens(&prefixes);

    let mut bindings = Vec::new();
    for field in &fields.named {
        let Some(attr) = find_attr(&field.attrs, "value") else {
            continue;
        };
        let tags = tag_tokens(&parse_tags(attr)?);
        let Some(ident) = &field.ident else {
            continue;
        };
        bindings.push(quote! {
            binder.bind(&self.#ident, PREFIXES, #tags)?;
        });
    }

    Ok(quote! {
        impl #impl_generics ::config_abstractions::ValueBindable for #struct_name #ty_generics #where_clause {
            fn bind_values(
                &self,
                binder: &::config_abstractions::ValueBinder<'_>,
            ) -> ::std::result::Result<(), ::config_abstractions::ConfigError> {
                const PREFIXES: &[(&str, &str)] = #prefixes;
                #(#bindings)*
                let _ = binder;
                ::std::result::Result::Ok(())
            }
        }
    })
}
