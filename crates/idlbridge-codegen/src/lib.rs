//! Code generation for idlbridge.
//!
//! Given an indexed [`idlbridge_model::Library`], this crate emits one
//! textual artifact per output target:
//!
//! - `typescript`: declarations of every interface and namespaces of typed
//!   constants
//! - `nan`, `napi`, `jsi`: C++ marshalling glue for three native binding
//!   runtimes
//!
//! All C++ targets share a single call-path generator ([`call_path`]) and
//! type classification ([`types`]); each only supplies a [`BindingStyle`].
//!
//! Generation is fail-soft. A member whose types cannot be mapped is left out
//! and reported in the artifact's [`Diagnostics`]; the rest of the library is
//! still emitted. Callers decide whether any diagnostic is fatal.

pub mod backends;
pub mod call_path;
mod diagnostics;
mod expr;
mod style;
pub mod types;

pub use backends::{emit_all, Backend, BackendKind, Options};
pub use diagnostics::{Artifact, Diagnostic, Diagnostics, Site};
pub use expr::render_expr;
pub use style::{BindingStyle, DualPathPolicy, Retention};
