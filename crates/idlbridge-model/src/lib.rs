//! In-memory model of an interface library for the idlbridge compiler.
//!
//! This crate is responsible for:
//! - The data types describing interfaces, methods, parameters, constants and
//!   constant expressions
//! - Loading a library from its JSON description and building the name indices
//! - Linearizing an interface's single-inheritance chain into its effective
//!   method list
//!
//! ## Lifecycle
//!
//! A [`Library`] is built once (either from JSON via [`Library::from_json`] /
//! [`Library::load`] or programmatically via [`Library::new`]), indexed, and
//! then treated as read-only by every code generator.

mod error;
mod expr;
mod library;
mod linearize;
mod ty;

pub use error::{ModelError, ModelResult};
pub use expr::Expr;
pub use library::{Constant, Interface, Library, Method, Parameter};
pub use ty::{NumericKind, Primitive, Type};
