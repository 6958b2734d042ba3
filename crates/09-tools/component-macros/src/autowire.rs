//! 字段注入派生宏实现

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

use crate::utils::{find_attr, named_fields, optional_string_arg};

/// 实现 #[derive(Autowire)]
///
/// 只处理带 `#[inject]` 的字段，字段类型必须是 `Autowired<X>`。
pub fn derive_autowire_impl(input: &DeriveInput) -> Result<TokenStream> {
    let fields = named_fields(input, "Autowire")?;
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut wiring = Vec::new();
    for field in &fields.named {
        let Some(attr) = find_attr(&field.attrs, "inject") else {
            continue;
        };
        let tag = optional_string_arg(attr)?;
        let Some(ident) = &field.ident else {
            continue;
        };
        let name = ident.to_string();
        wiring.push(quote! {
            wiring.field(#name, #tag, &self.#ident)?;
        });
    }

    Ok(quote! {
        impl #impl_generics ::di_abstractions::Autowire for #struct_name #ty_generics #where_clause {
            fn autowire(
                &self,
                wiring: &mut ::di_abstractions::FieldWiring<'_>,
            ) -> ::std::result::Result<(), ::di_abstractions::DependencyError> {
                #(#wiring)*
                let _ = wiring;
                ::std::result::Result::Ok(())
            }
        }
    })
}
