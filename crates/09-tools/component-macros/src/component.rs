//! 组件派生宏实现

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    DeriveInput, Ident, Path, Result, Token, Type,
};

use crate::utils::find_attr;

/// `#[component(...)]` 参数
#[derive(Default)]
pub struct ComponentArgs {
    /// 可直接赋值的能力
    pub provides: Vec<Type>,
    /// 能力与转换函数
    pub converts: Vec<(Type, Path)>,
}

enum ComponentArg {
    Provides(Vec<Type>),
    Converts(Vec<(Type, Path)>),
    Flag(Type),
}

struct Conversion {
    target: Type,
    convert: Path,
}

impl Parse for Conversion {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        let target: Type = input.parse()?;
        input.parse::<Token![=]>()?;
        let convert: Path = input.parse()?;
        Ok(Self { target, convert })
    }
}

impl Parse for ComponentArg {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        let ident: Ident = input.parse()?;
        let flag = |ty: TokenStream| syn::parse2::<Type>(ty).map(ComponentArg::Flag);
        match ident.to_string().as_str() {
            "provides" => {
                let content;
                syn::parenthesized!(content in input);
                let types = Punctuated::<Type, Token![,]>::parse_terminated(&content)?;
                Ok(Self::Provides(types.into_iter().collect()))
            }
            "converts" => {
                let content;
                syn::parenthesized!(content in input);
                let conversions = Punctuated::<Conversion, Token![,]>::parse_terminated(&content)?;
                Ok(Self::Converts(
                    conversions
                        .into_iter()
                        .map(|c| (c.target, c.convert))
                        .collect(),
                ))
            }
            "autowire" => flag(quote!(dyn ::di_abstractions::Autowire)),
            "value_bind" => flag(quote!(dyn ::config_abstractions::ValueBindable)),
            "initializing" => flag(quote!(dyn ::di_abstractions::Initializing)),
            "disposable" => flag(quote!(dyn ::di_abstractions::Disposable)),
            "processor" => flag(quote!(dyn ::di_abstractions::Processor)),
            "context_aware" => flag(quote!(dyn ::di_abstractions::ApplicationContextAware)),
            "inject_function" => flag(quote!(dyn ::di_abstractions::InjectFunction)),
            other => Err(syn::Error::new(
                ident.span(),
                format!("未知的 component 参数: {other}"),
            )),
        }
    }
}

impl Parse for ComponentArgs {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        let mut args = Self::default();
        for arg in Punctuated::<ComponentArg, Token![,]>::parse_terminated(input)? {
            match arg {
                ComponentArg::Provides(types) => args.provides.extend(types),
                ComponentArg::Converts(conversions) => args.converts.extend(conversions),
                ComponentArg::Flag(ty) => args.provides.push(ty),
            }
        }
        Ok(args)
    }
}

/// 实现 #[derive(Component)]
pub fn derive_component_impl(input: &DeriveInput) -> Result<TokenStream> {
    let args = match find_attr(&input.attrs, "component") {
        Some(attr) => attr.parse_args::<ComponentArgs>()?,
        None => ComponentArgs::default(),
    };

    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    if args.provides.is_empty() && args.converts.is_empty() {
        return Ok(quote! {
            impl #impl_generics ::di_abstractions::Component for #struct_name #ty_generics #where_clause {}
        });
    }

    let provides = args.provides.iter().map(|capability| {
        quote! { .provides::<#capability>(|value| value) }
    });
    let converts = args.converts.iter().map(|(capability, convert)| {
        quote! { .converts_to::<#capability, _>(#convert) }
    });

    Ok(quote! {
        impl #impl_generics ::di_abstractions::Component for #struct_name #ty_generics #where_clause {
            fn capabilities() -> ::std::sync::Arc<::di_abstractions::Capabilities> {
                ::di_abstractions::Capabilities::builder::<Self>()
                    #(#provides)*
                    #(#converts)*
                    .build()
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_parse_component_args() {
        let args: ComponentArgs =
            syn::parse2(quote!(provides(dyn Greeter, dyn Named), autowire, converts(dyn Label = to_label)))
                .unwrap();
        assert_eq!(args.provides.len(), 3);
        assert_eq!(args.converts.len(), 1);
    }

    #[test]
    fn test_unknown_argument_is_rejected() {
        assert!(syn::parse2::<ComponentArgs>(quote!(singleton)).is_err());
    }

    #[test]
    fn test_bare_component_has_no_capabilities() {
        let input: DeriveInput = parse_quote!(
            struct Plain;
        );
        let output = derive_component_impl(&input).unwrap().to_string();
        assert!(output.contains("Component for Plain"));
        assert!(!output.contains("capabilities"));
    }
}
