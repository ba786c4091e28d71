//! Free functions and their parameter annotations.
//!
//! A function whose first parameter is annotated [`Annotation::Receiver`]
//! becomes a method of that record type once its module is activated.
use std::sync::Arc;

use crate::{
    base::{GoContext, object::Object, record::FieldType},
    utils::error::GoResult,
};

/// Host implementation of a function body. Methods receive their receiver as
/// the first argument.
pub type NativeFn = dyn Fn(&mut GoContext, &[Object]) -> GoResult<Object> + Send + Sync;

/// Declared annotation of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// The parameter is the receiver of the named record type.
    Receiver(String),
    Typed(FieldType),
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub annotation: Annotation,
}

pub(crate) enum Body {
    Native(Arc<NativeFn>),
    /// Runs the inner function inside a fresh cleanup scope.
    Scoped(FunctionRef),
}

pub struct Function {
    name: String,
    params: Vec<Param>,
    pub(crate) body: Body,
}

pub type FunctionRef = Arc<Function>;

impl Function {
    pub fn builder(name: impl Into<String>) -> FunctionBuilder {
        FunctionBuilder {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Record type named by the first parameter's receiver annotation.
    pub fn receiver(&self) -> Option<&str> {
        match self.params.first() {
            Some(Param {
                annotation: Annotation::Receiver(ty),
                ..
            }) => Some(ty),
            _ => None,
        }
    }

    /// Returns true if calls run inside their own cleanup scope.
    pub fn is_scoped(&self) -> bool {
        matches!(self.body, Body::Scoped(_))
    }

    /// The function this one wraps, or itself.
    pub fn original(&self) -> &Function {
        match &self.body {
            Body::Scoped(inner) => inner.original(),
            Body::Native(_) => self,
        }
    }

    /// Wraps `inner` so every call pushes and drains a cleanup scope.
    pub(crate) fn scoped(inner: &FunctionRef) -> FunctionRef {
        Arc::new(Function {
            name: inner.name.clone(),
            params: inner.params.clone(),
            body: Body::Scoped(Arc::clone(inner)),
        })
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("scoped", &self.is_scoped())
            .finish()
    }
}

pub struct FunctionBuilder {
    name: String,
    params: Vec<Param>,
}

impl FunctionBuilder {
    /// Declares a receiver parameter. Only the first parameter makes the
    /// function a method.
    pub fn receiver(self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.param(name, Annotation::Receiver(ty.into()))
    }

    pub fn param(mut self, name: impl Into<String>, annotation: Annotation) -> Self {
        self.params.push(Param {
            name: name.into(),
            annotation,
        });
        self
    }

    pub fn body(
        self,
        body: impl Fn(&mut GoContext, &[Object]) -> GoResult<Object> + Send + Sync + 'static,
    ) -> FunctionRef {
        Arc::new(Function {
            name: self.name,
            params: self.params,
            body: Body::Native(Arc::new(body)),
        })
    }
}

/// A method looked up on a record value, ready to be called.
#[derive(Debug, Clone)]
pub struct BoundMethod {
    pub receiver: Object,
    pub function: FunctionRef,
}

impl BoundMethod {
    pub fn call(&self, ctx: &mut GoContext, args: &[Object]) -> GoResult<Object> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(self.receiver.clone());
        full.extend_from_slice(args);
        ctx.call(&self.function, &full)
    }
}
