use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors caused by a malformed interface library.
///
/// These are fatal to the generation of the affected interface or constant
/// only; callers decide whether the rest of the library keeps compiling.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Two interfaces share a name, which breaks the lookup index.
    #[error("Duplicate interface: `{name}` is declared more than once")]
    #[diagnostic(
        code(idlbridge_model::duplicate_interface),
        help("Interface names must be unique within a library")
    )]
    DuplicateInterface { name: String },

    /// An interface extends a parent that the library does not declare.
    #[error("Unknown parent: `{interface}` extends `{parent}`, which is not declared")]
    #[diagnostic(
        code(idlbridge_model::dangling_extends),
        help("Declare the parent interface in the library or fix the `extends` reference")
    )]
    DanglingExtends { interface: String, parent: String },

    /// Following `extends` from an interface leads back to an interface
    /// already visited.
    #[error("Inheritance cycle: `{interface}` is its own ancestor ({})", .chain.join(" -> "))]
    #[diagnostic(code(idlbridge_model::inheritance_cycle))]
    InheritanceCycle {
        interface: String,
        /// The interfaces visited, ending with the repeated one.
        chain: Vec<String>,
    },

    /// A method that may throw has no first parameter to bind the status
    /// carrier to.
    #[error("Method `{interface}#{method}` may throw but declares no parameters")]
    #[diagnostic(
        code(idlbridge_model::missing_error_receiver),
        help("The first parameter of a throwing method receives the per-call status carrier")
    )]
    MissingErrorReceiver { interface: String, method: String },

    /// The first parameter of a throwing method is not an interface object,
    /// so the status carrier cannot be built from it.
    #[error("Method `{interface}#{method}` may throw but its first parameter `{parameter}` has type `{ty}`")]
    #[diagnostic(
        code(idlbridge_model::invalid_error_receiver),
        help("The first parameter of a throwing method must be a status interface")
    )]
    InvalidErrorReceiver {
        interface: String,
        method: String,
        parameter: String,
        ty: String,
    },

    /// An expression node with an unknown tag or the wrong operand count.
    #[error("Malformed expression `{tag}`: {reason}")]
    #[diagnostic(code(idlbridge_model::malformed_expression))]
    MalformedExpression { tag: String, reason: String },

    /// The library document is not valid JSON or does not have the library shape.
    #[error("Invalid library document: {0}")]
    #[diagnostic(
        code(idlbridge_model::parse),
        help("The document must be a JSON object with an `interfaces` array")
    )]
    Parse(String),

    /// The library file could not be read.
    #[error("Failed to read library {}: {message}", .path.display())]
    #[diagnostic(code(idlbridge_model::io))]
    Io { path: PathBuf, message: String },
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Parse(err.to_string())
    }
}

/// Result type for model operations
pub type ModelResult<T> = std::result::Result<T, ModelError>;
