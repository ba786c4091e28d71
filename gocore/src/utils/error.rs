use strum::EnumIs;
use thiserror::Error;

#[derive(Debug, Error, EnumIs)]
pub enum GoError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParseError {
        source: toml::de::Error,
        file: String,
    },

    #[error(transparent)]
    Const(#[from] goconst::Error),

    #[error("A deferred call was registered outside of any cleanup scope")]
    NoActiveScope,

    #[error("Name `{0}` is not defined")]
    UndefinedName(String),

    #[error("`{name}` is a {found}, expected a {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error(
        "Function `{function}` declares receiver `{receiver}`, which is not a record type in scope"
    )]
    UndefinedReceiver { function: String, receiver: String },

    #[error("Record type `{0}` has no initializer; its module was never activated")]
    NoInitializer(String),

    #[error("`{ty}` got an unexpected keyword argument `{field}`")]
    UnexpectedField { ty: String, field: String },

    #[error("`{ty}` has no field `{field}`")]
    UndefinedField { ty: String, field: String },

    #[error("`{ty}` has no method `{method}`")]
    UndefinedMethod { ty: String, method: String },

    #[error("Expected a record, found a value of type `{0}`")]
    NotARecord(&'static str),

    #[error("`{function}` takes {expected} argument(s) but {found} were given")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("The default value of `{0}` requires constructing `{0}` itself")]
    RecursiveDefault(String),

    #[error("The representation hook of `{ty}` returned a `{found}` instead of a string")]
    InvalidRepr { ty: String, found: &'static str },

    /// Error raised by user code.
    #[error("{0}")]
    Raised(String),
}

pub type GoResult<T> = Result<T, GoError>;
