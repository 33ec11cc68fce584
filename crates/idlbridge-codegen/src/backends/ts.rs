use std::fmt;

use idlbridge_model::{Constant, Interface, Library, Method, NumericKind, Primitive};

use super::{Backend, Options, BANNER};
use crate::diagnostics::{Artifact, Diagnostic, Diagnostics, Site};
use crate::expr::render_expr;
use crate::style::DualPathPolicy;
use crate::types::{classify, Direction, TypeClass};

/// TypeScript declarations of every interface, plus a namespace of typed
/// constants for each interface that declares any.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptBackend;

impl Backend for TypeScriptBackend {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn emit(&self, library: &Library, options: &Options) -> Artifact {
        let mut diagnostics = Diagnostics::new();
        let mut entries = Vec::with_capacity(library.interfaces().len());

        for interface in library.interfaces() {
            let declaration = match library.effective_methods(interface) {
                Ok(methods) => {
                    log::debug!("Declaring `{}`", interface.name);
                    Some(declare_interface(
                        library,
                        interface,
                        &methods,
                        options.typescript_dual_path,
                        &mut diagnostics,
                    ))
                }
                Err(err) => {
                    diagnostics.push(Diagnostic::model(&interface.name, err));
                    None
                }
            };
            let constants = declare_constants(interface, &mut diagnostics);

            entries.push(Entry {
                name: &interface.name,
                declaration,
                constants,
            });
        }

        Artifact {
            text: TsWriter { entries: &entries }.to_string(),
            diagnostics,
        }
    }
}

struct Entry<'a> {
    name: &'a str,
    declaration: Option<InterfaceDecl<'a>>,
    constants: Vec<ConstantDecl<'a>>,
}

struct InterfaceDecl<'a> {
    extends: Option<&'a str>,
    methods: Vec<MethodDecl<'a>>,
}

struct MethodDecl<'a> {
    name: &'a str,
    params: Vec<(&'a str, String)>,
    result: String,
    has_async: bool,
}

struct ConstantDecl<'a> {
    name: &'a str,
    ty: &'static str,
    value: String,
}

fn declare_interface<'a>(
    library: &Library,
    interface: &'a Interface,
    methods: &[&'a Method],
    policy: DualPathPolicy,
    diagnostics: &mut Diagnostics,
) -> InterfaceDecl<'a> {
    let mut declared = Vec::with_capacity(methods.len());

    for &method in methods {
        match declare_method(library, &interface.name, method, policy) {
            Ok(decl) => declared.push(decl),
            Err(errors) => diagnostics.extend(errors),
        }
    }

    InterfaceDecl {
        extends: interface.extends.as_deref(),
        methods: declared,
    }
}

fn declare_method<'a>(
    library: &Library,
    interface: &str,
    method: &'a Method,
    policy: DualPathPolicy,
) -> Result<MethodDecl<'a>, Vec<Diagnostic>> {
    let mut errors = Vec::new();

    let mut params = Vec::with_capacity(method.parameters.len());
    for param in &method.parameters {
        match classify(library, &param.ty, Direction::Decode).and_then(|class| param_type(&class)) {
            Some(ty) => params.push((param.name.as_str(), ty)),
            None => errors.push(Diagnostic::unhandled(
                interface,
                &method.name,
                Site::Parameter(param.name.clone()),
                &param.ty,
            )),
        }
    }

    let result = classify(library, &method.return_type, Direction::Encode)
        .and_then(|class| result_type(&class));
    match result {
        Some(result) if errors.is_empty() => Ok(MethodDecl {
            name: &method.name,
            params,
            result,
            has_async: policy.has_async(method),
        }),
        Some(_) => Err(errors),
        None => {
            errors.push(Diagnostic::unhandled(
                interface,
                &method.name,
                Site::Return,
                &method.return_type,
            ));
            Err(errors)
        }
    }
}

fn param_type(class: &TypeClass) -> Option<String> {
    Some(match class {
        TypeClass::ByteBuffer | TypeClass::ReinterpretedBuffer(_) => "Uint8Array | Pointer".to_string(),
        TypeClass::NumericBuffer(kind) => match kind {
            NumericKind::Int => "Int32Array",
            NumericKind::UInt => "Uint32Array",
            NumericKind::Int64 => "BigInt64Array",
            NumericKind::UInt64 => "BigUint64Array",
            NumericKind::UChar => "Uint8Array",
        }
        .to_string(),
        TypeClass::Object(name) => name.clone(),
        TypeClass::Number(_) => "number".to_string(),
        TypeClass::Boolean => "boolean".to_string(),
        TypeClass::Str => "string".to_string(),
        TypeClass::Void | TypeClass::OpaquePointer => return None,
    })
}

fn result_type(class: &TypeClass) -> Option<String> {
    Some(match class {
        TypeClass::Void => "void".to_string(),
        TypeClass::OpaquePointer => "Pointer".to_string(),
        TypeClass::Object(name) => format!("{name} | undefined"),
        TypeClass::Number(_) => "number".to_string(),
        TypeClass::Boolean => "boolean".to_string(),
        TypeClass::Str => "string | undefined".to_string(),
        _ => return None,
    })
}

fn declare_constants<'a>(
    interface: &'a Interface,
    diagnostics: &mut Diagnostics,
) -> Vec<ConstantDecl<'a>> {
    interface
        .constants
        .iter()
        .filter_map(|constant| match declare_constant(&interface.name, constant) {
            Ok(decl) => Some(decl),
            Err(diagnostic) => {
                diagnostics.push(diagnostic);
                None
            }
        })
        .collect()
}

fn declare_constant<'a>(interface: &str, constant: &'a Constant) -> Result<ConstantDecl<'a>, Diagnostic> {
    let ty = match constant.ty.primitive() {
        _ if constant.ty.is_pointer => None,
        Some(Primitive::Boolean) => Some("boolean"),
        Some(prim) if prim.numeric().is_some() => Some("number"),
        _ => None,
    }
    .ok_or_else(|| Diagnostic::unhandled(interface, &constant.name, Site::Constant, &constant.ty))?;

    let value = render_expr(&constant.expr)
        .map_err(|err| Diagnostic::model(format!("{interface}#{}", constant.name), err))?;

    Ok(ConstantDecl {
        name: &constant.name,
        ty,
        value,
    })
}

struct TsWriter<'a> {
    entries: &'a [Entry<'a>],
}

impl fmt::Display for TsWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{BANNER}")?;
        writeln!(f)?;
        writeln!(f, "export interface Pointer {{")?;
        writeln!(f, "}}")?;

        for entry in self.entries {
            if entry.declaration.is_none() && entry.constants.is_empty() {
                continue;
            }
            writeln!(f)?;

            if let Some(declaration) = &entry.declaration {
                fmt_interface(f, entry.name, declaration)?;
                if !entry.constants.is_empty() {
                    writeln!(f)?;
                }
            }

            if !entry.constants.is_empty() {
                writeln!(f, "export namespace {} {{", entry.name)?;
                for constant in &entry.constants {
                    writeln!(
                        f,
                        "\texport const {}: {} = {};",
                        constant.name, constant.ty, constant.value
                    )?;
                }
                writeln!(f, "}}")?;
            }
        }

        Ok(())
    }
}

fn fmt_interface(f: &mut fmt::Formatter<'_>, name: &str, declaration: &InterfaceDecl<'_>) -> fmt::Result {
    write!(f, "export interface {name}")?;
    if let Some(parent) = declaration.extends {
        write!(f, " extends {parent}")?;
    }
    writeln!(f, " {{")?;

    for method in &declaration.methods {
        let params = method
            .params
            .iter()
            .map(|(name, ty)| format!("{name}: {ty}"))
            .collect::<Vec<_>>()
            .join(", ");

        writeln!(f, "\t{}Sync({params}): {};", method.name, method.result)?;
        if method.has_async {
            writeln!(f, "\t{}Async({params}): Promise<{}>;", method.name, method.result)?;
        }
    }

    writeln!(f, "}}")
}
