//! Method registry: merges a module's own methods with the methods declared
//! by its interfaces into one immutable `name -> MethodHandle` map.
//!
//! Rust has no runtime reflection, so methods arrive as data: the derive
//! macros (or hand-written code) emit a [`MethodDef`] per method and an
//! [`InterfaceDef`] per implemented interface. The merge itself follows the
//! same rules the registry would apply when reflecting over a class:
//! duplicate surfaces are rejected at construction, interface-declared
//! signatures govern binding, module-declared methods shadow
//! interface-declared ones under the same exposed name.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use lariat_core::{Error, Result};

use crate::method::{Declaration, MethodDef, MethodDescriptor, MethodHandle, ParamSpec};

/// Descriptor-only surface of one implemented interface: the method names
/// and parameter specs it declares, with no invocation logic of its own.
#[derive(Debug, Clone)]
pub struct InterfaceDef {
    pub name: &'static str,
    pub methods: Vec<MethodDescriptor>,
}

impl InterfaceDef {
    pub fn new(name: &'static str, methods: Vec<MethodDescriptor>) -> Self {
        Self { name, methods }
    }
}

/// A unit exposing remotely callable methods under a single service name.
pub trait RpcModule: Send + Sync {
    /// Logical service name; also the HTTP path segment the module answers on.
    fn module_name(&self) -> &str;

    /// Every method the module contributes: its own methods first, then the
    /// exports of each implemented interface, in declaration order.
    fn method_defs(self: Arc<Self>) -> Vec<MethodDef>;

    /// Descriptor surfaces of the implemented interfaces.
    fn interface_defs(&self) -> Vec<InterfaceDef> {
        Vec::new()
    }
}

/// The immutable dispatch table built once per module. Construction fails
/// fast on an ambiguous method surface; a module that fails to build is
/// unusable and the service will not start with it.
pub struct ModuleRegistration {
    module_name: String,
    handlers: HashMap<String, MethodHandle>,
    built_at: DateTime<Utc>,
    binding_url: RwLock<Option<String>>,
}

impl ModuleRegistration {
    /// Run the merge over the module's declared surface.
    pub fn build(module: Arc<dyn RpcModule>) -> Result<Self> {
        let module_name = module.module_name().to_owned();
        let interfaces = module.interface_defs();
        let defs = module.method_defs();

        // Two methods under the same name and declaring site: overload
        // resolution by argument count or type is unsupported.
        let mut seen: HashSet<(String, Declaration)> = HashSet::new();
        for def in &defs {
            let key = (
                def.descriptor.name.to_lowercase(),
                def.declaration.clone(),
            );
            if !seen.insert(key) {
                return Err(Error::DuplicateMethod {
                    module: module_name,
                    method: def.descriptor.name.clone(),
                });
            }
        }

        // Interface surface, grouped by case-folded name. A name declared
        // twice across the implemented interfaces is ambiguous and rejected
        // here rather than resolved at call time.
        let mut interface_specs: HashMap<String, Vec<ParamSpec>> = HashMap::new();
        for interface in &interfaces {
            for descriptor in &interface.methods {
                let key = descriptor.name.to_lowercase();
                if interface_specs
                    .insert(key, descriptor.params.clone())
                    .is_some()
                {
                    return Err(Error::DuplicateMethod {
                        module: module_name,
                        method: descriptor.name.clone(),
                    });
                }
            }
        }

        // Module-declared methods are visited first; the first registration
        // of an exposed name wins, so an interface export never displaces a
        // module-declared method. The canonical signature bound for
        // parameter purposes is the interface-declared one when the name
        // appears on an interface, else the method's own.
        let mut ordered = defs;
        ordered.sort_by_key(|def| matches!(def.declaration, Declaration::Interface(_)));

        let mut handlers = HashMap::new();
        for def in ordered {
            let exposed = def.descriptor.name.to_lowercase();
            if handlers.contains_key(&exposed) {
                if def.declaration == Declaration::Module {
                    return Err(Error::DuplicateMethod {
                        module: module_name,
                        method: def.descriptor.name,
                    });
                }
                continue;
            }
            let specs = interface_specs
                .get(&exposed)
                .cloned()
                .unwrap_or_else(|| def.descriptor.params.clone());
            handlers.insert(exposed, MethodHandle::new(specs, def.invoker));
        }

        Ok(Self {
            module_name,
            handlers,
            built_at: Utc::now(),
            binding_url: RwLock::new(None),
        })
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Case-insensitive handler lookup; callers pass the lowercased name.
    pub fn handler(&self, canonical_name: &str) -> Option<&MethodHandle> {
        self.handlers.get(canonical_name)
    }

    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn set_binding_url(&self, url: impl Into<String>) {
        *self.binding_url.write() = Some(url.into());
    }

    /// Human-readable module descriptor, served for non-POST requests.
    pub fn module_info(&self) -> String {
        format!(
            "Module [{}] built at {} bindingUrl at {}",
            self.module_name,
            self.built_at.format("%Y-%m-%d %H:%M:%S"),
            self.binding_url.read().as_deref().unwrap_or("<unbound>"),
        )
    }
}

/// The `all_services` contract consumed by the service runner. How modules
/// are assembled (DI container, static list) is the caller's concern.
pub trait ModulesRegistry: Send + Sync {
    fn all_services(&self) -> HashMap<String, Arc<dyn RpcModule>>;
}

/// Static module list keyed by module name.
#[derive(Default)]
pub struct StaticModulesRegistry {
    modules: HashMap<String, Arc<dyn RpcModule>>,
}

impl StaticModulesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, module: Arc<dyn RpcModule>) {
        self.modules.insert(module.module_name().to_owned(), module);
    }

    pub fn with(mut self, module: Arc<dyn RpcModule>) -> Self {
        self.add(module);
        self
    }
}

impl ModulesRegistry for StaticModulesRegistry {
    fn all_services(&self) -> HashMap<String, Arc<dyn RpcModule>> {
        self.modules.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::{Invoker, from_arg};
    use serde_json::{Value, json};

    fn constant_invoker(value: Value) -> Invoker {
        Arc::new(move |_args| {
            let value = value.clone();
            Box::pin(async move { Ok(value) })
        })
    }

    struct TestModule {
        name: &'static str,
        defs: parking_lot::Mutex<Vec<MethodDef>>,
        interfaces: Vec<InterfaceDef>,
    }

    impl TestModule {
        fn new(
            name: &'static str,
            defs: Vec<MethodDef>,
            interfaces: Vec<InterfaceDef>,
        ) -> Arc<Self> {
            Arc::new(Self {
                name,
                defs: parking_lot::Mutex::new(defs),
                interfaces,
            })
        }
    }

    impl RpcModule for TestModule {
        fn module_name(&self) -> &str {
            self.name
        }

        fn method_defs(self: Arc<Self>) -> Vec<MethodDef> {
            std::mem::take(&mut *self.defs.lock())
        }

        fn interface_defs(&self) -> Vec<InterfaceDef> {
            self.interfaces.clone()
        }
    }

    #[test]
    fn builds_flat_handler_map() {
        let module = TestModule::new(
            "Calc",
            vec![
                MethodDef::module_declared(
                    MethodDescriptor::new("Add", vec![]),
                    constant_invoker(json!(0)),
                ),
                MethodDef::module_declared(
                    MethodDescriptor::new("Sub", vec![]),
                    constant_invoker(json!(0)),
                ),
            ],
            vec![],
        );
        let registration = ModuleRegistration::build(module).unwrap();
        assert_eq!(registration.method_names(), vec!["add", "sub"]);
        assert!(registration.handler("add").is_some());
        assert!(registration.handler("Add").is_none(), "lookup is pre-lowercased");
    }

    #[test]
    fn rejects_same_name_overloads() {
        let module = TestModule::new(
            "Calc",
            vec![
                MethodDef::module_declared(
                    MethodDescriptor::new("Add", vec![ParamSpec::required("a")]),
                    constant_invoker(json!(0)),
                ),
                MethodDef::module_declared(
                    MethodDescriptor::new("add", vec![]),
                    constant_invoker(json!(0)),
                ),
            ],
            vec![],
        );
        match ModuleRegistration::build(module) {
            Err(Error::DuplicateMethod { module, .. }) => assert_eq!(module, "Calc"),
            other => panic!("expected duplicate method error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn rejects_ambiguous_interface_surface() {
        let module = TestModule::new(
            "Calc",
            vec![],
            vec![
                InterfaceDef::new("Adder", vec![MethodDescriptor::new("Compute", vec![])]),
                InterfaceDef::new("Multiplier", vec![MethodDescriptor::new("compute", vec![])]),
            ],
        );
        assert!(matches!(
            ModuleRegistration::build(module),
            Err(Error::DuplicateMethod { .. })
        ));
    }

    #[tokio::test]
    async fn module_declared_method_shadows_interface_export() {
        let module = TestModule::new(
            "Greeter",
            vec![
                MethodDef::module_declared(
                    MethodDescriptor::new("Greet", vec![]),
                    constant_invoker(json!("from module")),
                ),
                MethodDef::interface_declared(
                    MethodDescriptor::new("Greet", vec![]),
                    "IGreeter",
                    constant_invoker(json!("from interface")),
                ),
            ],
            vec![InterfaceDef::new(
                "IGreeter",
                vec![MethodDescriptor::new("Greet", vec![])],
            )],
        );
        let registration = ModuleRegistration::build(module).unwrap();
        let result = registration.handler("greet").unwrap().invoke(None).await.unwrap();
        assert_eq!(result, json!("from module"));
    }

    #[tokio::test]
    async fn interface_signature_governs_binding() {
        // The module's own signature declares no default; the interface it
        // implements declares greeting = "hello". The interface-selected
        // signature must govern what an omitting caller gets.
        let invoker: Invoker = Arc::new(|args| {
            Box::pin(async move {
                let mut args = args.into_iter();
                let _name: String = from_arg(args.next(), "name")?;
                let greeting: String = from_arg(args.next(), "greeting")?;
                Ok(json!(greeting))
            })
        });
        let module = TestModule::new(
            "Greeter",
            vec![MethodDef::interface_declared(
                MethodDescriptor::new(
                    "Greet",
                    vec![ParamSpec::required("name"), ParamSpec::required("greeting")],
                ),
                "IGreeter",
                invoker,
            )],
            vec![InterfaceDef::new(
                "IGreeter",
                vec![MethodDescriptor::new(
                    "Greet",
                    vec![
                        ParamSpec::required("name"),
                        ParamSpec::with_default("greeting", json!("hello")),
                    ],
                )],
            )],
        );
        let registration = ModuleRegistration::build(module).unwrap();
        let params = serde_json::from_str(r#"{"name":"bob"}"#).unwrap();
        let result = registration
            .handler("greet")
            .unwrap()
            .invoke(Some(&params))
            .await
            .unwrap();
        assert_eq!(result, json!("hello"));
    }

    #[test]
    fn module_info_names_the_module() {
        let module = TestModule::new("Calc", vec![], vec![]);
        let registration = ModuleRegistration::build(module).unwrap();
        registration.set_binding_url("http://10.0.0.1:5678/Calc");
        let info = registration.module_info();
        assert!(info.starts_with("Module [Calc] built at "));
        assert!(info.ends_with("bindingUrl at http://10.0.0.1:5678/Calc"));
    }
}
