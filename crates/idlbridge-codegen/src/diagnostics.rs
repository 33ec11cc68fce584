use std::fmt;

use idlbridge_model::{ModelError, Type};
use thiserror::Error;

/// The place in a member where an unmappable type was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Site {
    Parameter(String),
    Return,
    Constant,
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Site::Parameter(name) => write!(f, "parameter `{name}`"),
            Site::Return => write!(f, "return value"),
            Site::Constant => write!(f, "constant value"),
        }
    }
}

/// A problem found while generating one artifact.
///
/// Diagnostics never stop generation: the offending member is skipped and
/// its siblings are still emitted.
#[derive(Debug, Error, miette::Diagnostic, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A type the backend has no mapping for.
    #[error("Unhandled type `{ty}` for {site} of `{interface}#{member}`")]
    #[diagnostic(
        code(idlbridge_codegen::unhandled_type),
        severity(Warning),
        help("The member was left out of the generated output")
    )]
    UnhandledType {
        interface: String,
        member: String,
        site: Site,
        ty: Type,
    },

    /// A malformed model entry, confined to `scope` (an interface or a
    /// `Interface#member` pair).
    #[error("Skipped `{scope}`: {source}")]
    #[diagnostic(code(idlbridge_codegen::model))]
    Model {
        scope: String,
        #[source]
        source: ModelError,
    },
}

impl Diagnostic {
    pub fn unhandled(interface: &str, member: &str, site: Site, ty: &Type) -> Self {
        Diagnostic::UnhandledType {
            interface: interface.to_string(),
            member: member.to_string(),
            site,
            ty: ty.clone(),
        }
    }

    pub fn model(scope: impl Into<String>, source: ModelError) -> Self {
        Diagnostic::Model {
            scope: scope.into(),
            source,
        }
    }
}

/// Diagnostics accumulated while emitting one artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
        self.items.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// The text produced by one backend together with what it had to skip.
#[derive(Debug, Clone, Default)]
pub struct Artifact {
    pub text: String,
    pub diagnostics: Diagnostics,
}
