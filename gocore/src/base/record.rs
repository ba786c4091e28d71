//! Record types
//!
//! A record type is declared as a list of named, typed fields and nothing
//! else. Activation synthesizes a keyword-only [`Initializer`] for it; fields
//! left out at construction get the zero value of their declared type.
use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;

use crate::{
    base::object::Object,
    utils::error::{GoError, GoResult},
};

/// Declared type of a record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    List,
    Dict,
    /// Another record type, referenced by name.
    Record(String),
}

impl FieldType {
    /// Zero value of a builtin field type. Record fields have no zero value
    /// without a scope to resolve them in.
    pub fn zero(&self) -> Option<Object> {
        let value = match self {
            FieldType::Bool => Object::Bool(false),
            FieldType::Int => Object::from(0),
            FieldType::Float => Object::Float(0.0),
            FieldType::Str => Object::Str(String::new()),
            FieldType::Bytes => Object::Bytes(Vec::new()),
            FieldType::List => Object::List(Vec::new()),
            FieldType::Dict => Object::Dict(BTreeMap::new()),
            FieldType::Record(_) => return None,
        };

        Some(value)
    }

    pub fn name(&self) -> &str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Str => "str",
            FieldType::Bytes => "bytes",
            FieldType::List => "list",
            FieldType::Dict => "dict",
            FieldType::Record(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
}

impl<S: Into<String>> From<(S, FieldType)> for Field {
    fn from((name, ty): (S, FieldType)) -> Self {
        Field {
            name: name.into(),
            ty,
        }
    }
}

/// Keyword-only constructor synthesized from a record declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initializer {
    params: Vec<Field>,
}

impl Initializer {
    /// One optional keyword parameter per declared field.
    pub fn synthesize(ty: &RecordType) -> Self {
        Self {
            params: ty.fields.clone(),
        }
    }

    pub fn params(&self) -> &[Field] {
        &self.params
    }

    pub fn accepts(&self, name: &str) -> bool {
        self.params.iter().any(|param| param.name == name)
    }
}

/// A record type declared by a module.
#[derive(Debug)]
pub struct RecordType {
    name: String,
    fields: Vec<Field>,
    initializer: RwLock<Option<Initializer>>,
}

pub type RecordTypeRef = Arc<RecordType>;

impl RecordType {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            name: name.into(),
            fields: fields.into_iter().collect(),
            initializer: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn initializer(&self) -> Option<Initializer> {
        self.initializer.read().clone()
    }

    pub fn has_initializer(&self) -> bool {
        self.initializer.read().is_some()
    }

    /// Replaces any previous initializer.
    pub(crate) fn install_initializer(&self, initializer: Initializer) {
        *self.initializer.write() = Some(initializer);
    }
}

/// An instance of a record type.
#[derive(Debug)]
pub struct Record {
    ty: RecordTypeRef,
    values: BTreeMap<String, Object>,
}

pub type RecordRef = Arc<RwLock<Record>>;

impl Record {
    pub(crate) fn new(ty: RecordTypeRef, values: BTreeMap<String, Object>) -> Self {
        Self { ty, values }
    }

    pub fn ty(&self) -> &RecordTypeRef {
        &self.ty
    }

    pub fn get(&self, name: &str) -> GoResult<&Object> {
        self.values.get(name).ok_or_else(|| GoError::UndefinedField {
            ty: self.ty.name().to_string(),
            field: name.to_string(),
        })
    }

    /// Overwrites a declared field.
    pub fn set(&mut self, name: &str, value: Object) -> GoResult<()> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(GoError::UndefinedField {
                ty: self.ty.name().to_string(),
                field: name.to_string(),
            }),
        }
    }

    /// Field values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Object)> {
        self.ty.fields().iter().filter_map(|field| {
            self.values
                .get(&field.name)
                .map(|value| (field.name.as_str(), value))
        })
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{", self.ty.name())?;
        for (i, (name, value)) in self.values().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}:{}", name, value)?;
        }
        write!(f, "}}")
    }
}
