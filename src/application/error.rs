//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

/// Boxed error returned by factories and collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A type name could not be mapped to a loaded type.
#[derive(Error, Debug)]
pub enum TypeResolutionError {
    #[error("the '{0}' type resolve failed")]
    TypeNotFound(String),

    #[error("module '{module}' for type '{type_name}' is not loaded and could not be loaded")]
    ModuleNotFound { module: String, type_name: String },

    #[error("invalid qualified type name '{name}': {reason}")]
    InvalidTypeName { name: String, reason: String },
}

/// Building a builtin's value failed.
#[derive(Error, Debug)]
pub enum ConstructionError {
    #[error("unable to determine the target type of the '{builtin}' builtin")]
    UnknownTargetType { builtin: String },

    #[error("type '{type_name}' of the '{builtin}' builtin cannot be instantiated")]
    NotConstructible { type_name: String, builtin: String },

    #[error(
        "can not build instance of '{type_name}' type, no constructor matched the available parameters in '{builtin}' builtin"
    )]
    NoMatchingConstructor { type_name: String, builtin: String },

    #[error("create object of '{type_name}' type failed, the parameters count of constructor is {arity}")]
    Instantiate {
        type_name: String,
        arity: usize,
        #[source]
        source: BoxError,
    },

    #[error(
        "occurred an error on set '{property}' property of '{builtin}' builtin, its raw value is \"{raw}\", the target type of builtin is '{target_type}'"
    )]
    Property {
        builtin: String,
        property: String,
        raw: String,
        target_type: String,
        #[source]
        source: BoxError,
    },

    #[error("cannot inject member '{member}' of '{target_type}': no service for {key}")]
    Injection {
        member: String,
        target_type: String,
        key: String,
    },
}

/// Application errors wrap domain errors and add resolution context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error(transparent)]
    TypeResolution(#[from] TypeResolutionError),

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error("not found the plugin tree node with '{0}' path")]
    PathNotFound(String),

    #[error("member '{member}' is not readable on '{type_name}'")]
    MemberNotFound { member: String, type_name: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("resolve target error from '{path}' path in '{file}' plugin file")]
    PathResolution {
        path: String,
        file: String,
        #[source]
        source: Box<ApplicationError>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

/// Factory argument access failed.
#[derive(Error, Debug)]
pub enum ArgumentError {
    #[error("missing constructor argument {0}")]
    Missing(usize),

    #[error("constructor argument {index} is not a {expected}")]
    Mismatch { index: usize, expected: &'static str },
}
