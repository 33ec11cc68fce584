use idlbridge_model::{Library, Method, Type};
use serde::Deserialize;

use crate::call_path::{FinishPlan, PlannedParam};
use crate::types::carrier_type;

/// Which methods get an asynchronous boundary variant next to the
/// synchronous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DualPathPolicy {
    /// Every method gets both variants.
    #[default]
    Always,
    /// Every method gets the synchronous variant; only methods flagged
    /// `async` in the library also get the asynchronous one.
    Flagged,
}

impl DualPathPolicy {
    pub fn has_async(self, method: &Method) -> bool {
        match self {
            DualPathPolicy::Always => true,
            DualPathPolicy::Flagged => method.is_async,
        }
    }
}

/// How a retained buffer argument is kept alive for an asynchronous call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retention {
    /// Declares the (initially empty) holder.
    pub declare: String,
    /// Fills the holder when the call is asynchronous, if decoding does not
    /// already do so.
    pub fill: Option<String>,
    /// How the deferred invocation captures the holder.
    pub capture: String,
}

/// The syntax of one native binding runtime.
///
/// The call-path generator owns the start/finish algorithm; a style only
/// renders the individual pieces. Rendering methods return `None` for a
/// class the runtime cannot express, which the generator reports as an
/// unhandled type.
pub trait BindingStyle {
    fn dual_path(&self) -> DualPathPolicy;

    /// Statement binding `obj` to the native wrapper of the call's `this`.
    fn receiver(&self, interface: &str) -> String;

    /// Statement decoding the boundary argument at `param.slot` into a local
    /// named after the parameter.
    fn decode(&self, param: &PlannedParam<'_>) -> Option<String>;

    fn retain(&self, param: &PlannedParam<'_>) -> Retention;

    /// Expression turning the native `ret` into a boundary value.
    fn encode(&self, finish: &FinishPlan<'_>) -> Option<String>;

    fn carrier(&self, library: &Library, namespace: &str, ty: &Type) -> String {
        carrier_type(library, namespace, ty)
    }
}
