mod common;

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use common::{Trace, entries, push, trace};
use gocore::prelude::*;

/// Function deferring one callback per label, in order, then returning `result`.
fn deferring(name: &str, trace: &Trace, labels: &'static [&'static str]) -> FunctionRef {
    let trace = Arc::clone(trace);
    Function::builder(name).body(move |ctx, _| {
        for label in labels {
            ctx.defer(push(&trace, label))?;
        }
        Ok(Object::Nil)
    })
}

fn activate(module: ModuleDecl) -> GoContext {
    let mut ctx = GoContext::default();
    ctx.activate(module).expect("module should activate");
    ctx
}

#[test]
fn deferred_calls_run_in_reverse_order() {
    let log = trace();
    let mut ctx = activate(ModuleDecl::new("cleanup").function(deferring(
        "Work",
        &log,
        &["A", "B", "C"],
    )));

    ctx.call_named("Work", &[]).unwrap();
    assert_eq!(entries(&log), ["C", "B", "A"]);
    assert_eq!(ctx.cleanup_depth(), 0);

    ctx.call_named("Work", &[]).unwrap();
    assert_eq!(entries(&log), ["C", "B", "A", "C", "B", "A"]);
}

#[test]
fn deferred_calls_run_when_the_body_fails() {
    let log = trace();
    let inner = Arc::clone(&log);
    let failing = Function::builder("Fail").body(move |ctx, _| {
        ctx.defer(push(&inner, "A"))?;
        ctx.defer(push(&inner, "B"))?;
        Err(GoError::Raised("boom".into()))
    });
    let mut ctx = activate(ModuleDecl::new("cleanup").function(failing));

    let err = ctx.call_named("Fail", &[]).unwrap_err();
    assert!(matches!(err, GoError::Raised(message) if message == "boom"));
    assert_eq!(entries(&log), ["B", "A"]);
    assert_eq!(ctx.cleanup_depth(), 0);
}

#[test]
fn deferred_calls_run_when_the_body_panics() {
    let log = trace();
    let inner = Arc::clone(&log);
    let panicking = Function::builder("Panic").body(move |ctx, _| {
        ctx.defer(push(&inner, "A"))?;
        ctx.defer(push(&inner, "B"))?;
        panic!("body panicked");
    });
    let mut ctx = activate(ModuleDecl::new("cleanup").function(panicking));

    let result = panic::catch_unwind(AssertUnwindSafe(|| ctx.call_named("Panic", &[])));
    let payload = result.expect_err("the panic should propagate");
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"body panicked"));
    assert_eq!(entries(&log), ["B", "A"]);
    assert_eq!(ctx.cleanup_depth(), 0);
}

#[test]
fn failing_callback_does_not_stop_the_drain() {
    let log = trace();
    let inner = Arc::clone(&log);
    let work = Function::builder("Work").body(move |ctx, _| {
        ctx.defer(push(&inner, "A"))?;
        ctx.defer(|_| Err(GoError::Raised("cleanup failed".into())))?;
        ctx.defer(push(&inner, "C"))?;
        Ok(Object::from(1))
    });
    let mut ctx = activate(ModuleDecl::new("cleanup").function(work));

    let err = ctx.call_named("Work", &[]).unwrap_err();
    assert!(matches!(err, GoError::Raised(message) if message == "cleanup failed"));
    assert_eq!(entries(&log), ["C", "A"]);
}

#[test]
fn panicking_callback_does_not_stop_the_drain() {
    let log = trace();
    let inner = Arc::clone(&log);
    let work = Function::builder("Work").body(move |ctx, _| {
        ctx.defer(push(&inner, "A"))?;
        ctx.defer(|_| panic!("cleanup panicked"))?;
        ctx.defer(push(&inner, "C"))?;
        Ok(Object::Nil)
    });
    let mut ctx = activate(ModuleDecl::new("cleanup").function(work));

    let result = panic::catch_unwind(AssertUnwindSafe(|| ctx.call_named("Work", &[])));
    assert!(result.is_err());
    assert_eq!(entries(&log), ["C", "A"]);
    assert_eq!(ctx.cleanup_depth(), 0);
}

#[test]
fn defer_outside_a_wrapped_call_is_a_usage_error() {
    let mut ctx = GoContext::default();
    let err = ctx.defer(|_| Ok(())).unwrap_err();
    assert!(err.is_no_active_scope());
}

#[test]
fn nested_calls_drain_their_own_scope() {
    let log = trace();
    let outer_log = Arc::clone(&log);
    let outer = Function::builder("Outer").body(move |ctx, _| {
        ctx.defer(push(&outer_log, "outer deferred"))?;
        ctx.call_named("Inner", &[])?;
        outer_log.lock().push("outer body done".to_string());
        Ok(Object::Nil)
    });

    let mut ctx = activate(
        ModuleDecl::new("cleanup")
            .function(outer)
            .function(deferring("Inner", &log, &["inner deferred"])),
    );

    ctx.call_named("Outer", &[]).unwrap();
    assert_eq!(
        entries(&log),
        ["inner deferred", "outer body done", "outer deferred"]
    );
}

#[test]
fn depth_follows_the_call_stack() {
    let depth = Function::builder("Depth").body(|ctx, _| Ok(Object::from(ctx.cleanup_depth())));
    let nested = Function::builder("Nested").body(|ctx, _| ctx.call_named("Depth", &[]));
    let mut ctx = activate(ModuleDecl::new("cleanup").function(depth).function(nested));

    assert_eq!(ctx.call_named("Depth", &[]).unwrap(), Object::from(1));
    assert_eq!(ctx.call_named("Nested", &[]).unwrap(), Object::from(2));
    assert_eq!(ctx.cleanup_depth(), 0);
}

#[test]
fn methods_run_inside_their_own_scope() {
    let log = trace();
    let inner = Arc::clone(&log);
    let close = Function::builder("Close")
        .receiver("f", "File")
        .body(move |ctx, args| {
            let path = args[0].field("path")?.to_string();
            ctx.defer(push(&inner, &format!("closed {}", path)))?;
            inner.lock().push(format!("closing {}", path));
            Ok(Object::Nil)
        });

    let mut ctx = activate(
        ModuleDecl::new("files")
            .record("File", [("path", FieldType::Str)])
            .function(close),
    );
    let file = ctx.construct("File", [("path", "/tmp/data")]).unwrap();
    ctx.call_method(&file, "Close", &[]).unwrap();

    assert_eq!(entries(&log), ["closing /tmp/data", "closed /tmp/data"]);
}

#[test]
fn deferred_calls_see_state_left_by_the_body() {
    let counter = Function::builder("Counter")
        .receiver("c", "Tally")
        .body(|ctx, args| {
            let tally = args[0].clone();
            let deferred = tally.clone();
            ctx.defer(move |_| deferred.set_field("closed", true))?;
            tally.set_field("count", 10)?;
            Ok(Object::Nil)
        });

    let mut ctx = activate(
        ModuleDecl::new("tally")
            .record("Tally", [("count", FieldType::Int), ("closed", FieldType::Bool)])
            .function(counter),
    );
    let tally = ctx.construct("Tally", Vec::<(String, Object)>::new()).unwrap();
    ctx.call_method(&tally, "Counter", &[]).unwrap();

    assert_eq!(tally.field("count").unwrap(), Object::from(10));
    assert_eq!(tally.field("closed").unwrap(), Object::from(true));
}
