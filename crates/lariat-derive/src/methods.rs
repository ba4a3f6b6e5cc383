//! Implementation of the #[rpc_methods] attribute macro.
//!
//! Applied to an inherent impl block, every public method becomes a
//! module-declared export; private helpers in the same block are left
//! alone. The generated `rpc_method_defs` feeds `RpcModule::method_defs`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{ImplItem, ItemImpl, Result, Visibility};

use crate::utils::{RpcMethod, analyze_method, method_def_tokens, strip_rpc_attrs};

pub fn rpc_methods_impl(input: ItemImpl) -> Result<TokenStream> {
    if input.trait_.is_some() {
        return Err(syn::Error::new_spanned(
            &input.self_ty,
            "#[rpc_methods] applies to inherent impl blocks, not trait impls",
        ));
    }
    let self_ty = &input.self_ty;

    let mut methods: Vec<RpcMethod> = Vec::new();
    for item in &input.items {
        let ImplItem::Fn(method) = item else { continue };
        if !matches!(method.vis, Visibility::Public(_)) {
            continue;
        }
        methods.push(analyze_method(&method.sig, &method.attrs)?);
    }
    if methods.is_empty() {
        return Err(syn::Error::new_spanned(
            self_ty,
            "#[rpc_methods] found no public &self methods to export",
        ));
    }

    let mut clean_impl = input.clone();
    for item in &mut clean_impl.items {
        if let ImplItem::Fn(method) = item {
            method.attrs.retain(|attr| !attr.path().is_ident("rpc"));
            strip_rpc_attrs(&mut method.sig);
        }
    }

    let pushes = methods.iter().map(|m| method_def_tokens(m, None));

    Ok(quote! {
        #clean_impl

        impl #self_ty {
            /// Module-declared method exports for the registry merge.
            pub fn rpc_method_defs(
                self: &::std::sync::Arc<Self>,
            ) -> ::std::vec::Vec<::lariat::server::MethodDef> {
                let instance = ::std::sync::Arc::clone(self);
                let mut defs = ::std::vec::Vec::new();
                #(#pushes)*
                defs
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn exports_public_methods_only() {
        let input: ItemImpl = parse_quote! {
            impl Calculator {
                pub async fn add(&self, a: i64, b: i64) -> Result<i64> {
                    Ok(a + b)
                }

                fn carry(&self) -> i64 {
                    0
                }
            }
        };
        let expanded = rpc_methods_impl(input).unwrap().to_string();
        assert!(expanded.contains("rpc_method_defs"));
        assert!(expanded.contains("module_declared"));
    }

    #[test]
    fn rejects_trait_impl_blocks() {
        let input: ItemImpl = parse_quote! {
            impl ICalculator for Calculator {
                async fn add(&self, a: i64, b: i64) -> Result<i64> {
                    Ok(a + b)
                }
            }
        };
        assert!(rpc_methods_impl(input).is_err());
    }

    #[test]
    fn rejects_blocks_with_no_exports() {
        let input: ItemImpl = parse_quote! {
            impl Calculator {
                fn private_helper(&self) -> i64 { 0 }
            }
        };
        assert!(rpc_methods_impl(input).is_err());
    }
}
