use std::sync::Arc;

use goconst::ConstSet;
use strum::EnumIs;
use uuid::Uuid;

use crate::base::{
    function::FunctionRef,
    object::Object,
    record::{Field, RecordTypeRef},
};

/// A name bound in the context scope.
#[derive(Debug, Clone, EnumIs)]
pub enum Symbol {
    Function(FunctionRef),
    Record(RecordTypeRef),
    Consts(Arc<ConstSet>),
    Value(Object),
}

impl Symbol {
    /// Name of the symbol kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Symbol::Function(_) => "function",
            Symbol::Record(_) => "record type",
            Symbol::Consts(_) => "constant group",
            Symbol::Value(_) => "value",
        }
    }

    pub fn as_function(&self) -> Option<&FunctionRef> {
        match self {
            Symbol::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordTypeRef> {
        match self {
            Symbol::Record(ty) => Some(ty),
            _ => None,
        }
    }
}

/// A single top-level declaration of a module.
#[derive(Debug, Clone)]
pub enum Declaration {
    /// A record type made of typed fields.
    Record { name: String, fields: Vec<Field> },
    Function(FunctionRef),
    Consts(ConstSet),
    /// An opaque value, bound untouched.
    Value { name: String, value: Object },
    /// A symbol brought in from elsewhere. Bound in scope, but never treated
    /// as declared by this module.
    Imported { name: String, symbol: Symbol },
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Record { name, .. } => name,
            Declaration::Function(function) => function.name(),
            Declaration::Consts(consts) => consts.name(),
            Declaration::Value { name, .. } => name,
            Declaration::Imported { name, .. } => name,
        }
    }
}

/// Ordered list of a module's declarations, as handed to
/// [`GoContext::activate`](crate::base::GoContext::activate).
#[derive(Debug, Clone)]
pub struct ModuleDecl {
    name: String,
    items: Vec<Declaration>,
}

impl ModuleDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn record(
        mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<Field>>,
    ) -> Self {
        self.items.push(Declaration::Record {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn function(mut self, function: FunctionRef) -> Self {
        self.items.push(Declaration::Function(function));
        self
    }

    pub fn consts(mut self, consts: ConstSet) -> Self {
        self.items.push(Declaration::Consts(consts));
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<Object>) -> Self {
        self.items.push(Declaration::Value {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn import(mut self, name: impl Into<String>, symbol: Symbol) -> Self {
        self.items.push(Declaration::Imported {
            name: name.into(),
            symbol,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[Declaration] {
        &self.items
    }
}

/// What an activated module contributed to its context.
#[derive(Debug)]
pub struct ModuleContext {
    /// Unique identifier of this activation.
    pub uuid: Uuid,

    pub name: String,

    /// Record types declared by the module.
    pub records: Vec<RecordTypeRef>,

    /// Functions declared by the module, already wrapped for scoped cleanup.
    pub functions: Vec<FunctionRef>,

    /// Names of the constant groups declared by the module.
    pub consts: Vec<String>,
}

impl ModuleContext {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            records: Vec::new(),
            functions: Vec::new(),
            consts: Vec::new(),
        }
    }
}
