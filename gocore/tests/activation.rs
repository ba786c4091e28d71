mod common;

use common::{activated_greeter, enum_consts, greeter_module, greeting_method};
use gocore::prelude::*;

#[test]
fn greeter_module_end_to_end() {
    let mut ctx = activated_greeter();

    let hello = ctx.function("Hello").unwrap();
    assert!(hello.is_scoped(), "declared functions should be wrapped");
    assert_eq!(hello.receiver(), Some("Greeter"));

    assert_eq!(ctx.constant("Enum", "One").unwrap(), 1);
    assert_eq!(ctx.constant("Enum", "Two").unwrap(), 2);
    assert_eq!(ctx.constant("Enum", "Three").unwrap(), 3);

    let greeter = ctx.construct("Greeter", Vec::<(String, Object)>::new()).unwrap();
    assert_eq!(greeter.field("name").unwrap(), Object::from(""));

    let ada = ctx.construct("Greeter", [("name", "Ada")]).unwrap();
    assert!(ctx.has_method(&ada, "Hello"));
    assert!(ctx.has_method(&ada, "Goodbye"));
    assert_eq!(
        ctx.call_method(&ada, "Hello", &[]).unwrap(),
        Object::from("Hello, Ada")
    );
    assert_eq!(
        ctx.call_method(&ada, "Goodbye", &[]).unwrap(),
        Object::from("Goodbye, Ada")
    );

    // The wrapped free function is still callable directly with the receiver.
    assert_eq!(
        ctx.call_named("Hello", &[ada.clone()]).unwrap(),
        Object::from("Hello, Ada")
    );
}

#[test]
fn activation_is_idempotent_per_module_name() {
    let mut ctx = activated_greeter();
    let hello = ctx.function("Hello").unwrap();
    let methods = ctx.methods().len();

    let again = ctx.activate(greeter_module("greeter")).unwrap();
    assert_eq!(again, Activation::AlreadyActive);
    assert_eq!(ctx.modules().len(), 1);
    assert_eq!(ctx.methods().len(), methods);
    assert!(FunctionRef::ptr_eq(&ctx.function("Hello").unwrap(), &hello));
}

#[test]
fn module_context_records_its_declarations() {
    let ctx = activated_greeter();
    let module = ctx.module("greeter").unwrap();

    assert!(ctx.is_active("greeter"));
    assert!(!ctx.is_active("main"));
    assert_eq!(module.records.len(), 1);
    assert_eq!(module.records[0].name(), "Greeter");
    assert!(module.records[0].has_initializer());
    assert_eq!(
        module.functions.iter().map(|f| f.name()).collect::<Vec<_>>(),
        ["Hello", "Goodbye"]
    );
    assert!(module.functions.iter().all(|f| f.is_scoped()));
    assert_eq!(module.consts, ["Enum"]);
}

#[test]
fn modules_get_distinct_identifiers() {
    let mut ctx = activated_greeter();
    ctx.activate(ModuleDecl::new("other").value("answer", 42))
        .unwrap();

    let ids: Vec<_> = ctx.modules().iter().map(|module| module.uuid).collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(ctx.value("answer").unwrap(), Object::from(42));
}

#[test]
fn entry_module_runs_its_entry_function() {
    let mut ctx = GoContext::default();
    let module = greeter_module("main").function(Function::builder("main").body(|ctx, _| {
        let greeter = ctx.construct("Greeter", [("name", "Gopher")])?;
        match ctx.call_method(&greeter, "Hello", &[])? {
            Object::Str(greeting) if greeting == "Hello, Gopher" => Ok(Object::from(3)),
            _ => Ok(Object::from(1)),
        }
    }));

    let activation = ctx.activate(module).unwrap();
    assert_eq!(activation, Activation::Exited(3));
    assert_eq!(activation.exit_code(), Some(3));
}

#[test]
fn entry_module_without_result_exits_cleanly() {
    let mut ctx = GoContext::default();
    let module = ModuleDecl::new("main").function(Function::builder("main").body(|_, _| Ok(Object::Nil)));
    assert_eq!(ctx.activate(module).unwrap(), Activation::Exited(0));
}

#[test]
fn entry_names_come_from_configuration() {
    let config = GoConfig::from_toml_str(
        r#"
        entry_module = "app"
        entry_function = "run"
        "#,
        "inline",
    )
    .unwrap();
    let mut ctx = GoContext::new(config);

    let main = ModuleDecl::new("main").function(Function::builder("main").body(|_, _| Ok(Object::from(9))));
    assert_eq!(ctx.activate(main).unwrap(), Activation::Loaded);

    let app = ModuleDecl::new("app").function(Function::builder("run").body(|_, _| Ok(Object::from(true))));
    assert_eq!(ctx.activate(app).unwrap(), Activation::Exited(1));
}

#[test]
fn missing_entry_function_is_reported() {
    let mut ctx = GoContext::default();
    let err = ctx.activate(greeter_module("main")).unwrap_err();
    assert!(matches!(err, GoError::UndefinedName(name) if name == "main"));

    assert!(!ctx.is_active("main"));
    assert!(ctx.modules().is_empty());
    assert!(ctx.function("Hello").unwrap_err().is_undefined_name());
    assert!(ctx.methods().is_empty());

    // Nothing was committed, so the corrected module activates normally.
    let entry = Function::builder("main").body(|_, _| Ok(Object::from(0)));
    let activation = ctx.activate(greeter_module("main").function(entry)).unwrap();
    assert_eq!(activation, Activation::Exited(0));
}

#[test]
fn undefined_receiver_fails_activation() {
    let mut ctx = GoContext::default();
    let module = ModuleDecl::new("broken").function(greeting_method("Hello", "Hello"));

    let err = ctx.activate(module).unwrap_err();
    assert!(matches!(
        err,
        GoError::UndefinedReceiver { ref function, ref receiver }
            if function == "Hello" && receiver == "Greeter"
    ));
    assert!(!ctx.is_active("broken"));
}

#[test]
fn failed_activation_leaves_the_scope_untouched() {
    let mut ctx = GoContext::default();
    let module = ModuleDecl::new("broken")
        .record("Other", [("x", FieldType::Int)])
        .function(greeting_method("Hello", "Hello"));

    assert!(ctx.activate(module).unwrap_err().is_undefined_receiver());
    assert!(ctx.function("Hello").unwrap_err().is_undefined_name());
    assert!(ctx.construct("Other", [("x", 1)]).unwrap_err().is_undefined_name());
    assert!(ctx.methods().is_empty());
    assert!(ctx.modules().is_empty());
}

#[test]
fn failed_activation_keeps_earlier_modules_intact() {
    let mut ctx = activated_greeter();
    let hello = ctx.function("Hello").unwrap();
    let methods = ctx.methods().len();

    // Rebinds `Greeter` to a plain value, so `Hello` has no receiver type.
    let module = ModuleDecl::new("shadowing")
        .value("Greeter", 1)
        .function(greeting_method("Hello", "Hi"));
    assert!(ctx.activate(module).unwrap_err().is_undefined_receiver());

    assert!(FunctionRef::ptr_eq(&ctx.function("Hello").unwrap(), &hello));
    assert_eq!(ctx.methods().len(), methods);
    assert_eq!(ctx.modules().len(), 1);

    let greeter = ctx.construct("Greeter", [("name", "Ada")]).unwrap();
    assert_eq!(
        ctx.call_method(&greeter, "Hello", &[]).unwrap(),
        Object::from("Hello, Ada")
    );
}

#[test]
fn receiver_must_name_a_record_type() {
    let mut ctx = GoContext::default();
    let module = ModuleDecl::new("broken")
        .consts(enum_consts())
        .function(
            Function::builder("Describe")
                .receiver("e", "Enum")
                .body(|_, _| Ok(Object::Nil)),
        );

    assert!(ctx.activate(module).unwrap_err().is_undefined_receiver());
}

#[test]
fn lookups_report_the_kind_they_found() {
    let ctx = activated_greeter();

    assert!(ctx.lookup("Nobody").unwrap_err().is_undefined_name());
    assert!(matches!(
        ctx.function("Greeter").unwrap_err(),
        GoError::WrongKind { expected: "function", found: "record type", .. }
    ));
    assert!(ctx.record_type("Enum").unwrap_err().is_wrong_kind());
    assert!(ctx.consts("Hello").unwrap_err().is_wrong_kind());

    let err = ctx.constant("Enum", "Four").unwrap_err();
    assert!(matches!(
        err,
        GoError::Const(goconst::Error::UndefinedMember { .. })
    ));
}

#[test]
fn calls_check_their_arity() {
    let mut ctx = activated_greeter();
    let err = ctx.call_named("Hello", &[]).unwrap_err();
    assert!(matches!(
        err,
        GoError::ArityMismatch { expected: 1, found: 0, .. }
    ));
}

#[test]
fn declared_values_are_bound_untouched() {
    let mut ctx = GoContext::default();
    let blob = Object::from(vec![0xde_u8, 0xad, 0xbe, 0xef]);
    ctx.activate(ModuleDecl::new("assets").value("logo", blob.clone()))
        .unwrap();

    assert_eq!(ctx.value("logo").unwrap(), blob);
    assert!(ctx.module("assets").unwrap().functions.is_empty());
}
