//! # Component Macros
//!
//! 为组件生成能力表、字段注入与配置绑定的派生宏。
//!
//! ## 核心宏
//!
//! - [`Component`](derive@Component) - 生成 `Component` 实现与能力表
//! - [`Autowire`](derive@Autowire) - 为 `#[inject]` 字段生成注入代码
//! - [`ValueBind`](derive@ValueBind) - 为 `#[value]` 字段生成配置绑定代码
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use component_macros::{Autowire, Component, ValueBind};
//! use config_abstractions::ConfigValue;
//! use di_abstractions::Autowired;
//!
//! #[derive(Default, Component, Autowire, ValueBind)]
//! #[component(provides(dyn Greeter), autowire, value_bind)]
//! #[value_prefix("greeter")]
//! pub struct Service {
//!     #[inject("db")]
//!     db: Autowired<Arc<Database>>,
//!     #[value("prefix")]
//!     prefix: ConfigValue<String>,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod autowire;
mod component;
mod utils;
mod value_bind;

/// 组件派生宏
///
/// 生成 `di_abstractions::Component` 实现。能力通过 `#[component(...)]` 声明：
///
/// - `provides(dyn A, dyn B)` - 可直接赋值的能力
/// - `converts(dyn C = path::to_fn)` - 需要转换函数的能力，函数签名为 `Fn(Arc<Self>) -> Arc<dyn C>`
/// - `autowire` / `value_bind` / `initializing` / `disposable` / `processor` /
///   `context_aware` / `inject_function` - 容器自带的能力
///
/// # 示例
///
/// ```rust,ignore
/// #[derive(Component)]
/// #[component(provides(dyn Greeter), initializing)]
/// pub struct English;
/// ```
#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    component::derive_component_impl(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// 字段注入派生宏
///
/// 字段注解语法为 `name[,modifier]*`，修饰符 `required`（默认）与 `omiterror`。
/// 没有注解的字段不会被注入。
///
/// # 示例
///
/// ```rust,ignore
/// #[derive(Default, Autowire)]
/// pub struct Controller {
///     #[inject("db")]
///     db: Autowired<Arc<Database>>,
///     #[inject(",omiterror")]
///     cache: Autowired<Option<Arc<dyn Cache>>>,
/// }
/// ```
#[proc_macro_derive(Autowire, attributes(inject))]
pub fn derive_autowire(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    autowire::derive_autowire_impl(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// 配置绑定派生宏
///
/// `"path"` 使用默认标签 `value`，`tag = "path"` 指定标签名。
///
/// # 示例
///
/// ```rust,ignore
/// #[derive(Default, ValueBind)]
/// #[value_prefix("server", yaml = "listener")]
/// pub struct ServerConfig {
///     #[value("port")]
///     port: ConfigValue<u16>,
/// }
/// ```
#[proc_macro_derive(ValueBind, attributes(value_prefix, value))]
pub fn derive_value_bind(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    value_bind::derive_value_bind_impl(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
