//! Dynamic values flowing through functions, methods and record fields.
use std::collections::BTreeMap;

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use strum::EnumIs;

use crate::{
    base::record::RecordRef,
    utils::error::{GoError, GoResult},
};

/// A runtime value.
#[derive(Debug, Clone, Default, EnumIs)]
pub enum Object {
    /// Absence of a value. Passing `Nil` for a record field selects its default.
    #[default]
    Nil,
    Bool(bool),
    Int(BigInt),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Object>),
    Dict(BTreeMap<String, Object>),
    Record(RecordRef),
}

impl Object {
    /// Name of the value kind, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Nil => "nil",
            Object::Bool(_) => "bool",
            Object::Int(_) => "int",
            Object::Float(_) => "float",
            Object::Str(_) => "str",
            Object::Bytes(_) => "bytes",
            Object::List(_) => "list",
            Object::Dict(_) => "dict",
            Object::Record(_) => "record",
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Object::Int(value) => Some(value),
            _ => None,
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.as_int().and_then(ToPrimitive::to_i64)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Object::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordRef> {
        match self {
            Object::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the record behind this value, or [`GoError::NotARecord`].
    pub fn record(&self) -> GoResult<&RecordRef> {
        self.as_record()
            .ok_or_else(|| GoError::NotARecord(self.type_name()))
    }

    /// Reads a field of a record value.
    pub fn field(&self, name: &str) -> GoResult<Object> {
        self.record()?.read().get(name).cloned()
    }

    /// Overwrites a declared field of a record value.
    pub fn set_field(&self, name: &str, value: impl Into<Object>) -> GoResult<()> {
        self.record()?.write().set(name, value.into())
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Nil, Object::Nil) => true,
            (Object::Bool(a), Object::Bool(b)) => a == b,
            (Object::Int(a), Object::Int(b)) => a == b,
            (Object::Float(a), Object::Float(b)) => a == b,
            (Object::Int(a), Object::Float(b)) | (Object::Float(b), Object::Int(a)) => {
                a.to_f64().is_some_and(|a| a == *b)
            }
            (Object::Str(a), Object::Str(b)) => a == b,
            (Object::Bytes(a), Object::Bytes(b)) => a == b,
            (Object::List(a), Object::List(b)) => a == b,
            (Object::Dict(a), Object::Dict(b)) => a == b,
            // Records compare by identity.
            (Object::Record(a), Object::Record(b)) => std::sync::Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::Nil => write!(f, "<nil>"),
            Object::Bool(value) => write!(f, "{}", value),
            Object::Int(value) => write!(f, "{}", value),
            Object::Float(value) => write!(f, "{:?}", value),
            Object::Str(value) => write!(f, "{}", value),
            Object::Bytes(value) => write!(f, "{:?}", value),
            Object::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Object::Dict(entries) => {
                write!(f, "map[")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}:{}", key, value)?;
                }
                write!(f, "]")
            }
            Object::Record(record) => write!(f, "{}", record.read()),
        }
    }
}

impl From<goconst::Value> for Object {
    fn from(value: goconst::Value) -> Self {
        match value {
            goconst::Value::Int(value) => Object::Int(value),
            goconst::Value::Float(value) => Object::Float(value),
            goconst::Value::Str(value) => Object::Str(value),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Object {
                fn from(value: $ty) -> Self {
                    Object::Int(BigInt::from(value))
                }
            }
        )+
    };
}

impl_from_int!(i32, i64, u32, u64, usize);

impl From<BigInt> for Object {
    fn from(value: BigInt) -> Self {
        Object::Int(value)
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Bool(value)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Object::Float(value)
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Object::Str(value.to_string())
    }
}

impl From<String> for Object {
    fn from(value: String) -> Self {
        Object::Str(value)
    }
}

impl From<Vec<u8>> for Object {
    fn from(value: Vec<u8>) -> Self {
        Object::Bytes(value)
    }
}

impl From<Vec<Object>> for Object {
    fn from(value: Vec<Object>) -> Self {
        Object::List(value)
    }
}

impl From<BTreeMap<String, Object>> for Object {
    fn from(value: BTreeMap<String, Object>) -> Self {
        Object::Dict(value)
    }
}

impl From<RecordRef> for Object {
    fn from(value: RecordRef) -> Self {
        Object::Record(value)
    }
}

impl From<()> for Object {
    fn from(_: ()) -> Self {
        Object::Nil
    }
}
