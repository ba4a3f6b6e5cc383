//! Parameter binder: maps a request's argument payload onto the ordered
//! argument list required by a canonical signature.

use serde_json::Value;

use lariat_core::{Error, Params, Result};

use crate::method::ParamSpec;

/// Bind `params` against `specs`, producing one value per formal parameter
/// in declaration order.
///
/// Named payloads are looked up by parameter name, positional ones by
/// index. An absent optional parameter binds to the default declared on the
/// canonical signature (null if it declares none); an absent required
/// parameter is a binding error naming the parameter.
pub fn bind(specs: &[ParamSpec], params: Option<&Params>) -> Result<Vec<Value>> {
    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let supplied =
                params.and_then(|p| p.by_name(&spec.name).or_else(|| p.by_index(index)));
            match supplied {
                Some(value) => Ok(value.clone()),
                None if spec.optional => Ok(spec.default.clone().unwrap_or(Value::Null)),
                None => Err(Error::binding(format!(
                    "missing required parameter {}",
                    spec.name
                ))),
            }
        })
        .collect()
}
