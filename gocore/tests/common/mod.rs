#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use gocore::prelude::*;

/// Receiver function on `Greeter` returning `"{greeting}, {name}"`.
pub fn greeting_method(method: &str, greeting: &'static str) -> FunctionRef {
    Function::builder(method)
        .receiver("g", "Greeter")
        .body(move |_, args| {
            let name = args[0].field("name")?;
            Ok(Object::from(format!("{}, {}", greeting, name)))
        })
}

pub fn enum_consts() -> ConstSet {
    const_group! {
        Enum {
            One = iota + 1,
            Two,
            Three,
        }
    }
    .expect("enum constants should evaluate")
}

/// `Greeter { name: str }` with `Hello` and `Goodbye` methods and the `Enum`
/// constants `One`, `Two`, `Three`.
pub fn greeter_module(name: &str) -> ModuleDecl {
    ModuleDecl::new(name)
        .record("Greeter", [("name", FieldType::Str)])
        .function(greeting_method("Hello", "Hello"))
        .function(greeting_method("Goodbye", "Goodbye"))
        .consts(enum_consts())
}

pub fn activated_greeter() -> GoContext {
    let mut ctx = GoContext::default();
    let activation = ctx
        .activate(greeter_module("greeter"))
        .expect("greeter module should activate");
    assert_eq!(activation, Activation::Loaded);
    ctx
}

pub type Trace = Arc<Mutex<Vec<String>>>;

pub fn trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

/// Deferred callback appending `label` to `trace`.
pub fn push(trace: &Trace, label: &str) -> impl FnOnce(&mut GoContext) -> GoResult<()> + 'static {
    let trace = Arc::clone(trace);
    let label = label.to_string();
    move |_| {
        trace.lock().push(label);
        Ok(())
    }
}

pub fn entries(trace: &Trace) -> Vec<String> {
    trace.lock().clone()
}
