//! Artifact emitters, one per output target.

mod jsi;
mod nan;
mod napi;
mod ts;

use std::fmt;

use idlbridge_model::Library;

use crate::call_path::{generate_method, MethodGlue};
use crate::diagnostics::{Artifact, Diagnostic, Diagnostics};
use crate::style::{BindingStyle, DualPathPolicy};

pub use jsi::JsiBackend;
pub use nan::NanBackend;
pub use napi::NapiBackend;
pub use ts::TypeScriptBackend;

const BANNER: &str = "// Auto-generated file. Do not edit!";

/// Settings shared by every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Native namespace holding the `I<Name>` interface types.
    pub namespace: String,
    /// Which methods get `Async` declarations in the TypeScript output.
    pub typescript_dual_path: DualPathPolicy,
}

impl Options {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            typescript_dual_path: DualPathPolicy::default(),
        }
    }
}

pub trait Backend {
    fn name(&self) -> &'static str;

    /// Emits the whole library. Problems are reported in the artifact's
    /// diagnostics; whatever could be generated is still in its text.
    fn emit(&self, library: &Library, options: &Options) -> Artifact;
}

/// The available output targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    TypeScript,
    Nan,
    Napi,
    Jsi,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::TypeScript,
        BackendKind::Nan,
        BackendKind::Napi,
        BackendKind::Jsi,
    ];

    pub fn backend(self) -> Box<dyn Backend> {
        match self {
            BackendKind::TypeScript => Box::new(TypeScriptBackend),
            BackendKind::Nan => Box::new(NanBackend),
            BackendKind::Napi => Box::new(NapiBackend),
            BackendKind::Jsi => Box::new(JsiBackend),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.backend().name())
    }
}

/// Runs each requested backend over `library`.
pub fn emit_all(
    library: &Library,
    options: &Options,
    kinds: &[BackendKind],
) -> Vec<(BackendKind, Artifact)> {
    kinds
        .iter()
        .map(|&kind| {
            let backend = kind.backend();
            log::debug!("Running {} backend", backend.name());
            let artifact = backend.emit(library, options);
            log::info!(
                "{} backend: {} bytes, {} diagnostics",
                backend.name(),
                artifact.text.len(),
                artifact.diagnostics.len()
            );
            (kind, artifact)
        })
        .collect()
}

/// The glue generated for one interface.
pub(crate) struct InterfaceGlue<'a> {
    pub name: &'a str,
    pub methods: Vec<MethodGlue>,
}

/// Generates the glue of every interface whose inheritance chain resolves.
///
/// Interfaces with a broken chain are reported and left out entirely. Methods
/// with unhandled sites are reported and left out of their interface.
pub(crate) fn generate_interfaces<'a, S: BindingStyle + ?Sized>(
    style: &S,
    library: &'a Library,
    options: &Options,
    diagnostics: &mut Diagnostics,
) -> Vec<InterfaceGlue<'a>> {
    let mut interfaces = Vec::with_capacity(library.interfaces().len());

    for interface in library.interfaces() {
        let methods = match library.effective_methods(interface) {
            Ok(methods) => methods,
            Err(err) => {
                diagnostics.push(Diagnostic::model(&interface.name, err));
                continue;
            }
        };
        log::debug!(
            "Generating `{}` ({} methods)",
            interface.name,
            methods.len()
        );

        let mut glue = Vec::with_capacity(methods.len());
        for method in methods {
            match generate_method(style, library, &options.namespace, &interface.name, method) {
                Ok(method_glue) => glue.push(method_glue),
                Err(errors) => diagnostics.extend(errors),
            }
        }

        interfaces.push(InterfaceGlue {
            name: &interface.name,
            methods: glue,
        });
    }

    interfaces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_path::{FinishPlan, PlannedParam};
    use crate::types::{classify, Direction};
    use idlbridge_model::{Interface, Method, Type};

    fn library() -> Library {
        Library::new(vec![Interface::new("Status")]).unwrap()
    }

    fn decode_types() -> Vec<Type> {
        vec![
            Type::void().pointer(),
            Type::new("int64").pointer(),
            Type::new("ISC_QUAD").pointer(),
            Type::new("Status"),
            Type::new("uint"),
            Type::new("boolean"),
            Type::new("string").constant(),
        ]
    }

    fn encode_types() -> Vec<Type> {
        vec![
            Type::void(),
            Type::void().pointer(),
            Type::new("Status"),
            Type::new("int"),
            Type::new("uint64"),
            Type::new("boolean"),
            Type::new("string"),
        ]
    }

    /// Renders every parameter and result class twice through `style`.
    fn assert_rendering_is_repeatable(style: &dyn BindingStyle, kind: BackendKind) {
        let library = library();

        for (slot, ty) in decode_types().iter().enumerate() {
            let class = classify(&library, ty, Direction::Decode).unwrap();
            let param = PlannedParam {
                name: "value",
                slot,
                ty,
                retained: class.is_buffer(),
                class,
                carrier: style.carrier(&library, "fb", ty),
            };
            assert_eq!(style.decode(&param), style.decode(&param), "{kind}: {ty}");
            if param.retained {
                assert_eq!(style.retain(&param), style.retain(&param), "{kind}: {ty}");
            }
        }

        for ty in &encode_types() {
            let finish = FinishPlan {
                return_type: ty,
                class: classify(&library, ty, Direction::Encode).unwrap(),
                carrier: style.carrier(&library, "fb", ty),
            };
            assert_eq!(style.encode(&finish), style.encode(&finish), "{kind}: {ty}");
        }
    }

    #[test]
    fn native_styles_render_each_class_the_same_way_twice() {
        assert_rendering_is_repeatable(&NanBackend, BackendKind::Nan);
        assert_rendering_is_repeatable(&NapiBackend, BackendKind::Napi);
        assert_rendering_is_repeatable(&JsiBackend, BackendKind::Jsi);
    }

    #[test]
    fn emitting_twice_gives_identical_text() {
        let mut library = library();
        let mut blob = Interface::new("Blob");
        for (index, ty) in decode_types().into_iter().enumerate() {
            blob = blob.with_method(Method::new(format!("put{index}"), Type::void()).param("value", ty));
        }
        for (index, ty) in encode_types().into_iter().enumerate() {
            blob = blob.with_method(Method::new(format!("get{index}"), ty));
        }
        library.push_interface(blob).unwrap();

        let options = Options::new("fb");
        let texts = || -> Vec<String> {
            emit_all(&library, &options, &BackendKind::ALL)
                .into_iter()
                .map(|(_, artifact)| artifact.text)
                .collect()
        };
        assert_eq!(texts(), texts());
    }
}
