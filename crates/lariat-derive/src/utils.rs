//! Shared signature analysis for the attribute macros.
//!
//! Both macros walk function signatures the same way: every typed argument
//! becomes a named parameter, `#[rpc(...)]` attributes refine the exposed
//! name and optionality, and the return type must be `Result<T>`-shaped so
//! invocation failures surface as errors rather than panics.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, FnArg, Lit, Pat, Result, Signature, Type};

/// Metadata parsed from `#[rpc(...)]` on a method or parameter.
#[derive(Default)]
pub struct RpcMeta {
    pub name: Option<String>,
    pub optional: bool,
    pub default: Option<Lit>,
}

pub fn extract_rpc_meta(attrs: &[Attribute]) -> Result<RpcMeta> {
    let mut meta = RpcMeta::default();
    for attr in attrs {
        if !attr.path().is_ident("rpc") {
            continue;
        }
        attr.parse_nested_meta(|nested| {
            if nested.path.is_ident("name") {
                let lit: Lit = nested.value()?.parse()?;
                match lit {
                    Lit::Str(s) => meta.name = Some(s.value()),
                    other => return Err(syn::Error::new_spanned(other, "name must be a string")),
                }
            } else if nested.path.is_ident("optional") {
                meta.optional = true;
            } else if nested.path.is_ident("default") {
                meta.optional = true;
                meta.default = Some(nested.value()?.parse()?);
            } else {
                return Err(nested.error("expected name, optional, or default"));
            }
            Ok(())
        })?;
    }
    Ok(meta)
}

/// One formal parameter of a remote method.
pub struct RpcParam {
    pub ident: syn::Ident,
    pub ty: Box<Type>,
    pub exposed: String,
    pub optional: bool,
    pub default: Option<Lit>,
}

/// One remote method, analyzed once at expansion time.
pub struct RpcMethod {
    pub ident: syn::Ident,
    pub exposed: String,
    pub is_async: bool,
    pub params: Vec<RpcParam>,
}

/// Analyze a method signature. Rejects methods that take anything other
/// than `&self` or whose return type is not `Result<T>`-shaped.
pub fn analyze_method(sig: &Signature, attrs: &[Attribute]) -> Result<RpcMethod> {
    match sig.receiver() {
        Some(receiver) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                &sig.ident,
                "remote methods must take &self",
            ));
        }
    }

    if result_ok_type(&sig.output).is_none() {
        return Err(syn::Error::new_spanned(
            &sig.output,
            "remote methods must return lariat::Result<T>",
        ));
    }

    let meta = extract_rpc_meta(attrs)?;
    let exposed = meta.name.unwrap_or_else(|| sig.ident.to_string());

    let mut params = Vec::new();
    for input in &sig.inputs {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "remote method parameters must be plain identifiers",
            ));
        };
        let param_meta = extract_rpc_meta(&pat_type.attrs)?;
        let ident = pat_ident.ident.clone();
        params.push(RpcParam {
            exposed: param_meta.name.unwrap_or_else(|| ident.to_string()),
            optional: param_meta.optional || is_option_type(&pat_type.ty),
            default: param_meta.default,
            ty: pat_type.ty.clone(),
            ident,
        });
    }

    Ok(RpcMethod {
        ident: sig.ident.clone(),
        exposed,
        is_async: sig.asyncness.is_some(),
        params,
    })
}

/// Extract T from a `Result<T>` / `Result<T, E>`-shaped return type.
pub fn result_ok_type(output: &syn::ReturnType) -> Option<&Type> {
    let syn::ReturnType::Type(_, ty) = output else {
        return None;
    };
    let Type::Path(type_path) = ty.as_ref() else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        syn::GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

pub fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        type_path.path.segments.len() == 1 && type_path.path.segments[0].ident == "Option"
    } else {
        false
    }
}

/// Remove `#[rpc(...)]` from a signature's parameters so the re-emitted
/// item compiles without the helper attribute.
pub fn strip_rpc_attrs(sig: &mut Signature) {
    for input in &mut sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            pat_type.attrs.retain(|attr| !attr.path().is_ident("rpc"));
        }
    }
}

/// `::lariat::server::ParamSpec::...` construction for one parameter.
pub fn param_spec_tokens(param: &RpcParam) -> TokenStream {
    let name = &param.exposed;
    match (&param.default, param.optional) {
        (Some(default), _) => quote! {
            ::lariat::server::ParamSpec::with_default(#name, ::lariat::serde_json::json!(#default))
        },
        (None, true) => quote! { ::lariat::server::ParamSpec::optional(#name) },
        (None, false) => quote! { ::lariat::server::ParamSpec::required(#name) },
    }
}

/// `::lariat::server::MethodDescriptor::new(...)` for one method.
pub fn descriptor_tokens(method: &RpcMethod) -> TokenStream {
    let name = &method.exposed;
    let specs = method.params.iter().map(param_spec_tokens);
    quote! {
        ::lariat::server::MethodDescriptor::new(#name, vec![#(#specs),*])
    }
}

/// Body of a compiled invoker: extract each bound argument by position,
/// call the typed method on the captured instance, serialize the value.
pub fn invoker_body_tokens(method: &RpcMethod) -> TokenStream {
    let extractions = method.params.iter().map(|param| {
        let ident = &param.ident;
        let ty = &param.ty;
        let name = &param.exposed;
        quote! {
            let #ident: #ty = ::lariat::server::from_arg(__args.next(), #name)?;
        }
    });
    let ident = &method.ident;
    let args = method.params.iter().map(|param| &param.ident);
    let call = if method.is_async {
        quote! { __instance.#ident(#(#args),*).await? }
    } else {
        quote! { __instance.#ident(#(#args),*)? }
    };
    quote! {
        let mut __args = __args.into_iter();
        #(#extractions)*
        let __value = #call;
        ::lariat::serde_json::to_value(__value).map_err(::lariat::Error::from)
    }
}

/// A full `MethodDef` push, capturing a clone of the instance. Interface
/// exports carry the declaring interface name; module methods do not.
pub fn method_def_tokens(method: &RpcMethod, interface: Option<&str>) -> TokenStream {
    let descriptor = descriptor_tokens(method);
    let body = invoker_body_tokens(method);
    let def = match interface {
        Some(name) => quote! {
            ::lariat::server::MethodDef::interface_declared(#descriptor, #name, invoker)
        },
        None => quote! {
            ::lariat::server::MethodDef::module_declared(#descriptor, invoker)
        },
    };
    quote! {
        {
            let __instance = ::std::sync::Arc::clone(&instance);
            let invoker: ::lariat::server::Invoker = ::std::sync::Arc::new(move |__args| {
                let __instance = ::std::sync::Arc::clone(&__instance);
                ::std::boxed::Box::pin(async move { #body })
            });
            defs.push(#def);
        }
    }
}

/// PascalCase (with an optional leading `I`) to snake_case.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn snake_case_conversion() {
        assert_eq!(to_snake_case("ICalculator"), "i_calculator");
        assert_eq!(to_snake_case("Greeter"), "greeter");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    fn analyze(item: syn::TraitItemFn) -> Result<RpcMethod> {
        analyze_method(&item.sig, &item.attrs)
    }

    #[test]
    fn analyzes_params_and_defaults() {
        let method = analyze(parse_quote! {
            async fn greet(&self, name: String, #[rpc(default = "hello")] greeting: String) -> Result<String>;
        })
        .unwrap();
        assert_eq!(method.exposed, "greet");
        assert!(method.is_async);
        assert_eq!(method.params.len(), 2);
        assert!(!method.params[0].optional);
        assert!(method.params[1].optional);
        assert!(method.params[1].default.is_some());
    }

    #[test]
    fn option_params_are_optional() {
        let method = analyze(parse_quote! {
            fn find(&self, id: Option<u64>) -> Result<bool>;
        })
        .unwrap();
        assert!(method.params[0].optional);
    }

    #[test]
    fn rejects_non_result_returns() {
        assert!(analyze(parse_quote! {
            async fn broken(&self, a: i64) -> i64;
        })
        .is_err());
    }

    #[test]
    fn rejects_owned_receivers() {
        assert!(analyze(parse_quote! {
            fn broken(self, a: i64) -> Result<i64>;
        })
        .is_err());
    }
}
