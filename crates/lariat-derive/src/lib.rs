//! # Lariat Derive Macros
//!
//! Procedural macros that turn ordinary Rust traits and impl blocks into
//! remotely callable surfaces.
//!
//! - `#[rpc_interface]` - service contract traits: descriptors, server
//!   exports, and a client proxy type from one trait definition
//! - `#[rpc_methods]` - module-declared methods on an inherent impl block
//! - `#[rpc(...)]` - helper attribute for exposed-name overrides and
//!   parameter defaults
//!
//! Generated code refers to everything through `::lariat::...`, so the
//! facade crate must be in scope wherever the macros are used.

use proc_macro::TokenStream;
use syn::{ItemImpl, ItemTrait, parse_macro_input};

mod interface;
mod methods;
mod utils;

/// Attribute macro for service contract traits.
///
/// Re-emits the trait (under `async_trait` when it has async methods) and
/// generates, for a trait named `IFoo`:
///
/// - `i_foo_interface_def()` - the interface's descriptor surface
/// - `i_foo_method_defs(instance)` - interface-declared exports for any
///   implementor, for use inside `RpcModule::method_defs`
/// - `IFooProxy` - a client-side implementation of the trait that forwards
///   each call as named arguments through an `RpcClient`
///
/// Every method must take `&self` and return `lariat::Result<T>`. Optional
/// parameters are declared with `#[rpc(optional)]` or `#[rpc(default = ...)]`
/// (or by taking `Option<T>`); these defaults form the canonical signature
/// the server binds against.
///
/// # Example
///
/// ```rust,ignore
/// use lariat::rpc_interface;
///
/// #[rpc_interface]
/// pub trait IGreeter {
///     async fn greet(
///         &self,
///         name: String,
///         #[rpc(default = "hello")] greeting: String,
///     ) -> lariat::Result<String>;
/// }
/// ```
#[proc_macro_attribute]
pub fn rpc_interface(_args: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as ItemTrait);
    interface::rpc_interface_impl(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

/// Attribute macro for a module's own (non-interface) methods.
///
/// Applied to an inherent impl block, every `pub` method taking `&self` and
/// returning `lariat::Result<T>` becomes a module-declared export. The
/// block gains a `rpc_method_defs(self: &Arc<Self>)` method to call from
/// `RpcModule::method_defs`.
///
/// # Example
///
/// ```rust,ignore
/// use lariat::rpc_methods;
///
/// struct Calculator;
///
/// #[rpc_methods]
/// impl Calculator {
///     pub async fn add(&self, a: i64, b: i64) -> lariat::Result<i64> {
///         Ok(a + b)
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn rpc_methods(_args: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as ItemImpl);
    methods::rpc_methods_impl(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
