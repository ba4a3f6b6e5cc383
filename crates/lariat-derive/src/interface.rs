//! Implementation of the #[rpc_interface] attribute macro.
//!
//! One trait yields three artifacts: a descriptor-only `InterfaceDef` for
//! the registry merge, a generic exporter turning any implementor into
//! interface-declared `MethodDef`s, and a `{Trait}Proxy` client type that
//! implements the trait by forwarding named arguments over the wire.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{ItemTrait, Result, TraitItem};

use crate::utils::{
    analyze_method, descriptor_tokens, method_def_tokens, strip_rpc_attrs, to_snake_case,
};

pub fn rpc_interface_impl(input: ItemTrait) -> Result<TokenStream> {
    let trait_ident = &input.ident;
    let vis = &input.vis;
    let interface_name = trait_ident.to_string();
    let snake = to_snake_case(&interface_name);

    let mut methods = Vec::new();
    for item in &input.items {
        if let TraitItem::Fn(method) = item {
            methods.push(analyze_method(&method.sig, &method.attrs)?);
        }
    }
    if methods.is_empty() {
        return Err(syn::Error::new_spanned(
            trait_ident,
            "an rpc interface must declare at least one method",
        ));
    }
    let has_async = methods.iter().any(|m| m.is_async);

    // Re-emit the trait with the helper attributes stripped; async methods
    // need the async_trait rewrite so implementors produce Send futures.
    let mut clean_trait = input.clone();
    for item in &mut clean_trait.items {
        if let TraitItem::Fn(method) = item {
            method.attrs.retain(|attr| !attr.path().is_ident("rpc"));
            strip_rpc_attrs(&mut method.sig);
        }
    }
    let trait_attr = has_async.then(|| quote! { #[::lariat::async_trait] });

    let def_fn = format_ident!("{}_interface_def", snake);
    let defs_fn = format_ident!("{}_method_defs", snake);
    let descriptors = methods.iter().map(descriptor_tokens);
    let pushes = methods
        .iter()
        .map(|m| method_def_tokens(m, Some(&interface_name)));

    let proxy_ident = format_ident!("{}Proxy", trait_ident);
    let fn_items = input.items.iter().filter_map(|item| match item {
        TraitItem::Fn(trait_fn) => Some(trait_fn),
        _ => None,
    });
    let proxy_methods = methods.iter().zip(fn_items).map(|(method, trait_fn)| {
        let mut sig = trait_fn.sig.clone();
        strip_rpc_attrs(&mut sig);
        let exposed = &method.exposed;
        let inserts = method.params.iter().map(|param| {
            let name = &param.exposed;
            let ident = &param.ident;
            quote! {
                __args.insert(
                    #name.to_string(),
                    ::lariat::serde_json::to_value(&#ident).map_err(::lariat::Error::from)?,
                );
            }
        });
        let dispatch = if method.is_async {
            quote! { self.handle.invoke(#exposed, __args).await }
        } else {
            quote! { ::lariat::client::wait_for(self.handle.invoke(#exposed, __args)) }
        };
        quote! {
            #sig {
                let mut __args = ::lariat::serde_json::Map::new();
                #(#inserts)*
                #dispatch
            }
        }
    });

    Ok(quote! {
        #trait_attr
        #clean_trait

        /// Descriptor surface of the interface for the registry merge.
        #vis fn #def_fn() -> ::lariat::server::InterfaceDef {
            ::lariat::server::InterfaceDef::new(#interface_name, vec![#(#descriptors),*])
        }

        /// Interface-declared method exports for one implementor.
        #vis fn #defs_fn<T>(
            instance: ::std::sync::Arc<T>,
        ) -> ::std::vec::Vec<::lariat::server::MethodDef>
        where
            T: #trait_ident + Send + Sync + 'static,
        {
            let mut defs = ::std::vec::Vec::new();
            #(#pushes)*
            defs
        }

        /// Client-side adapter: implements the trait over the call pipeline.
        #vis struct #proxy_ident {
            handle: ::lariat::client::ProxyHandle,
        }

        impl ::lariat::client::RpcProxy for #proxy_ident {
            const INTERFACE_NAME: &'static str = #interface_name;

            fn bind(handle: ::lariat::client::ProxyHandle) -> Self {
                Self { handle }
            }
        }

        #trait_attr
        impl #trait_ident for #proxy_ident {
            #(#proxy_methods)*
        }
    })
}
