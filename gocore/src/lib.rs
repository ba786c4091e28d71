//! Receiver methods, record initializers and deferred cleanup resolved when a
//! module is activated.
//!
//! A module is handed to [`base::GoContext::activate`] as an explicit list of
//! declarations. Activation merges them into the context scope, gives every
//! record type a keyword-only initializer, attaches the functions whose first
//! parameter is a receiver to that receiver's record type, and wraps every
//! declared function so the callbacks it defers run when it returns.
//!
//! ```
//! use gocore::prelude::*;
//!
//! let hello = Function::builder("Hello")
//!     .receiver("g", "Greeter")
//!     .body(|_, args| {
//!         let name = args[0].field("name")?;
//!         Ok(Object::from(format!("Hello, {}!", name)))
//!     });
//!
//! let module = ModuleDecl::new("greeting")
//!     .record("Greeter", [("name", FieldType::Str)])
//!     .function(hello);
//!
//! let mut ctx = GoContext::default();
//! ctx.activate(module).unwrap();
//!
//! let greeter = ctx.construct("Greeter", [("name", "Ada")]).unwrap();
//! let greeting = ctx.call_method(&greeter, "Hello", &[]).unwrap();
//! assert_eq!(greeting, Object::from("Hello, Ada!"));
//! ```

pub mod base;
pub mod magic;
pub mod utils;

pub extern crate goconst;

/// Declaration vocabulary, for glob import by module authors.
pub mod prelude {
    pub use crate::{
        base::{
            Activation, GoContext,
            function::{Annotation, Function, FunctionRef},
            meta::GoConfig,
            module::{ModuleDecl, Symbol},
            object::Object,
            record::FieldType,
        },
        utils::error::{GoError, GoResult},
    };
    pub use goconst::{ConstGroup, ConstSet, Value, const_group, iota};
}
