//! 宏工具函数

use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    Attribute, Data, DeriveInput, Error, Fields, FieldsNamed, Ident, LitStr, Meta, Result, Token,
};

/// 配置绑定的默认标签名
pub const DEFAULT_TAG: &str = "value";

/// 只接受具名字段的结构体
pub fn named_fields<'a>(input: &'a DeriveInput, derive: &str) -> Result<&'a FieldsNamed> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(fields),
            _ => Err(Error::new_spanned(
                &input.ident,
                format!("#[derive({derive})] 只支持具名字段的结构体"),
            )),
        },
        _ => Err(Error::new_spanned(
            &input.ident,
            format!("#[derive({derive})] 只支持结构体"),
        )),
    }
}

/// 查找指定名称的属性
pub fn find_attr<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|attr| attr.path().is_ident(name))
}

/// 读取可省略参数的字符串属性：`#[inject]` 或 `#[inject("name,omiterror")]`
pub fn optional_string_arg(attr: &Attribute) -> Result<String> {
    match &attr.meta {
        Meta::Path(_) => Ok(String::new()),
        _ => Ok(attr.parse_args::<LitStr>()?.value()),
    }
}

/// 单个标签：`"path"` 使用默认标签名，`yaml = "path"` 指定标签名
struct TagArg {
    tag: String,
    path: String,
}

impl Parse for TagArg {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        if input.peek(LitStr) {
            let path: LitStr = input.parse()?;
            return Ok(Self {
                tag: DEFAULT_TAG.to_string(),
                path: path.value(),
            });
        }
        let tag: Ident = input.parse()?;
        input.parse::<Token![=]>()?;
        let path: LitStr = input.parse()?;
        Ok(Self {
            tag: tag.to_string(),
            path: path.value(),
        })
    }
}

/// 解析标签列表，例如 `#[value("port", yaml = "listen_port")]`
pub fn parse_tags(attr: &Attribute) -> Result<Vec<(String, String)>> {
    let args = attr.parse_args_with(Punctuated::<TagArg, Token![,]>::parse_terminated)?;
    Ok(args.into_iter().map(|arg| (arg.tag, arg.path)).collect())
}
