//! Start/finish call-path generation.
//!
//! A method call crosses the boundary in two phases. *Start* decodes every
//! argument in the caller's context and returns a deferred invocation that
//! owns the decoded values. *Finish* encodes the native result. The
//! synchronous variant runs the deferred invocation immediately; the
//! asynchronous variant hands it to a worker and settles a promise with the
//! finished value.
//!
//! Planning ([`plan_method`]) decides what each phase does and is shared by
//! every backend. Rendering ([`generate_method`]) turns the plan into native
//! source through a [`BindingStyle`].

use std::fmt;

use idlbridge_model::{Library, Method, ModelError, Type};

use crate::diagnostics::{Diagnostic, Site};
use crate::style::{BindingStyle, DualPathPolicy};
use crate::types::{classify, Direction, TypeClass};

/// One decoded argument of a planned call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedParam<'a> {
    pub name: &'a str,
    /// Position of the argument in the boundary call.
    pub slot: usize,
    pub ty: &'a Type,
    pub class: TypeClass,
    /// Native type the decoded value is held as.
    pub carrier: String,
    /// Whether the boundary value is kept alive when started asynchronously.
    pub retained: bool,
}

/// How one argument is passed to the underlying native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallArg<'a> {
    /// The per-call status carrier, in place of the declared first parameter.
    StatusCarrier,
    /// The native receiver behind an object argument, or null.
    Receiver(&'a str),
    /// A null-terminated view of a string argument.
    CString(&'a str),
    Plain(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartPlan<'a> {
    pub interface: &'a str,
    pub method: &'a str,
    pub params: Vec<PlannedParam<'a>>,
    /// Parameter whose native receiver hosts the status carrier.
    pub status_receiver: Option<&'a str>,
    pub args: Vec<CallArg<'a>>,
    /// `false` when the native call returns `void`.
    pub yields_value: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishPlan<'a> {
    pub return_type: &'a Type,
    pub class: TypeClass,
    pub carrier: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodPlan<'a> {
    pub start: StartPlan<'a>,
    pub finish: FinishPlan<'a>,
    /// Whether the asynchronous variant is exposed.
    pub has_async: bool,
}

/// Plans the call path of `method` as exposed on `interface`.
///
/// Every unmappable site is reported, not just the first. A throwing method
/// without parameters, or whose first parameter is not an interface, is a
/// model error.
pub fn plan_method<'a>(
    library: &Library,
    interface: &'a str,
    method: &'a Method,
    policy: DualPathPolicy,
    carrier: impl Fn(&Type) -> String,
) -> Result<MethodPlan<'a>, Vec<Diagnostic>> {
    let mut errors = Vec::new();

    let status_receiver = if method.may_throw {
        match method.error_receiver(interface) {
            Ok(param) => Some(param.name.as_str()),
            Err(err) => {
                errors.push(Diagnostic::model(format!("{interface}#{}", method.name), err));
                None
            }
        }
    } else {
        None
    };

    let mut params = Vec::with_capacity(method.parameters.len());
    for (slot, param) in method.parameters.iter().enumerate() {
        match classify(library, &param.ty, Direction::Decode) {
            Some(class) => params.push(PlannedParam {
                name: &param.name,
                slot,
                ty: &param.ty,
                retained: class.is_buffer(),
                class,
                carrier: carrier(&param.ty),
            }),
            None => errors.push(Diagnostic::unhandled(
                interface,
                &method.name,
                Site::Parameter(param.name.clone()),
                &param.ty,
            )),
        }
    }

    if status_receiver.is_some() {
        if let Some(first) = params.first().filter(|p| p.slot == 0) {
            if !matches!(first.class, TypeClass::Object(_)) {
                errors.push(Diagnostic::model(
                    format!("{interface}#{}", method.name),
                    ModelError::InvalidErrorReceiver {
                        interface: interface.to_string(),
                        method: method.name.clone(),
                        parameter: first.name.to_string(),
                        ty: first.ty.to_string(),
                    },
                ));
            }
        }
    }

    let finish = match classify(library, &method.return_type, Direction::Encode) {
        Some(class) => Some(FinishPlan {
            return_type: &method.return_type,
            class,
            carrier: carrier(&method.return_type),
        }),
        None => {
            errors.push(Diagnostic::unhandled(
                interface,
                &method.name,
                Site::Return,
                &method.return_type,
            ));
            None
        }
    };

    let finish = match finish {
        Some(finish) if errors.is_empty() => finish,
        _ => return Err(errors),
    };

    let args = params
        .iter()
        .map(|param| {
            if param.slot == 0 && status_receiver.is_some() {
                CallArg::StatusCarrier
            } else {
                match param.class {
                    TypeClass::Object(_) => CallArg::Receiver(param.name),
                    TypeClass::Str => CallArg::CString(param.name),
                    _ => CallArg::Plain(param.name),
                }
            }
        })
        .collect();

    Ok(MethodPlan {
        start: StartPlan {
            interface,
            method: &method.name,
            params,
            status_receiver,
            args,
            yields_value: !method.return_type.is_void_value(),
        },
        finish,
        has_async: policy.has_async(method),
    })
}

/// Rendered native glue for one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodGlue {
    pub name: String,
    /// Native type flowing from start to finish.
    pub carrier: String,
    pub arity: usize,
    pub has_async: bool,
    /// Body of the start function, one tab deep.
    pub start_body: String,
    /// Body of the finish function, one tab deep.
    pub finish_body: String,
}

/// Plans and renders `method` for `interface` in the given style.
pub fn generate_method<S: BindingStyle + ?Sized>(
    style: &S,
    library: &Library,
    namespace: &str,
    interface: &str,
    method: &Method,
) -> Result<MethodGlue, Vec<Diagnostic>> {
    let plan = plan_method(library, interface, method, style.dual_path(), |ty| {
        style.carrier(library, namespace, ty)
    })?;

    let mut errors = Vec::new();
    let mut decoded = Vec::with_capacity(plan.start.params.len());
    for param in &plan.start.params {
        match style.decode(param) {
            Some(statement) => decoded.push(statement),
            None => errors.push(Diagnostic::unhandled(
                interface,
                &method.name,
                Site::Parameter(param.name.to_string()),
                param.ty,
            )),
        }
    }
    let encoded = style.encode(&plan.finish);
    if encoded.is_none() {
        errors.push(Diagnostic::unhandled(
            interface,
            &method.name,
            Site::Return,
            &method.return_type,
        ));
    }

    let Some(encoded) = encoded.filter(|_| errors.is_empty()) else {
        return Err(errors);
    };

    let start_body = StartBody {
        style,
        namespace,
        plan: &plan.start,
        decoded: &decoded,
    }
    .to_string();

    log::trace!("Generated call path for `{interface}#{}`", method.name);

    Ok(MethodGlue {
        name: method.name.clone(),
        carrier: plan.finish.carrier.clone(),
        arity: method.parameters.len(),
        has_async: plan.has_async,
        start_body,
        finish_body: format!("\treturn {encoded};\n"),
    })
}

struct StartBody<'a, S: ?Sized> {
    style: &'a S,
    namespace: &'a str,
    plan: &'a StartPlan<'a>,
    decoded: &'a [String],
}

impl<S: BindingStyle + ?Sized> fmt::Display for StartBody<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.plan;
        let retained: Vec<_> = plan
            .params
            .iter()
            .filter(|param| param.retained)
            .map(|param| (param, self.style.retain(param)))
            .collect();

        writeln!(f, "\t{}", self.style.receiver(plan.interface))?;
        for (_, retention) in &retained {
            writeln!(f, "\t{}", retention.declare)?;
        }
        for statement in self.decoded {
            writeln!(f, "\t{statement}")?;
        }
        writeln!(f)?;

        let fills: Vec<&str> = retained
            .iter()
            .filter_map(|(_, retention)| retention.fill.as_deref())
            .collect();
        if !fills.is_empty() {
            writeln!(f, "\tif (async)")?;
            writeln!(f, "\t{{")?;
            for fill in fills {
                writeln!(f, "\t\t{fill}")?;
            }
            writeln!(f, "\t}}")?;
            writeln!(f)?;
        }

        write!(f, "\treturn [obj")?;
        for param in &plan.params {
            write!(f, ", {}", param.name)?;
            if let Some((_, retention)) = retained.iter().find(|(p, _)| p.slot == param.slot) {
                write!(f, ", {}", retention.capture)?;
            }
        }
        writeln!(f, "]() {{")?;

        if let Some(receiver) = plan.status_receiver {
            writeln!(
                f,
                "\t\t{}::ThrowStatusWrapper statusWrapper({receiver}->interface);",
                self.namespace
            )?;
        }

        write!(f, "\t\t")?;
        if plan.yields_value {
            write!(f, "return ")?;
        }
        write!(f, "obj->interface->{}(", plan.method)?;
        for (idx, arg) in plan.args.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            match arg {
                CallArg::StatusCarrier => write!(f, "&statusWrapper")?,
                CallArg::Receiver(name) => write!(f, "({name} ? {name}->interface : nullptr)")?,
                CallArg::CString(name) => write!(f, "{name}.c_str()")?,
                CallArg::Plain(name) => write!(f, "{name}")?,
            }
        }
        writeln!(f, ");")?;

        if !plan.yields_value {
            writeln!(f, "\t\treturn nullptr;")?;
        }
        writeln!(f, "\t}};")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Retention;
    use crate::types::carrier_type;
    use expect_test::expect;
    use idlbridge_model::{Interface, NumericKind};

    fn scenario() -> Library {
        Library::new(vec![
            Interface::new("Status"),
            Interface::new("Base").with_method(
                Method::new("open", Type::new("boolean"))
                    .throwing()
                    .param("status", Type::new("Status"))
                    .param("path", Type::new("string").constant())
                    .param("mode", Type::new("int")),
            ),
            Interface::new("Derived")
                .extending("Base")
                .with_method(Method::new("close", Type::void())),
        ])
        .unwrap()
    }

    /// A minimal style that names each piece after its class.
    struct Plain;

    impl BindingStyle for Plain {
        fn dual_path(&self) -> DualPathPolicy {
            DualPathPolicy::Flagged
        }

        fn receiver(&self, interface: &str) -> String {
            format!("auto obj = self<{interface}>();")
        }

        fn decode(&self, param: &PlannedParam<'_>) -> Option<String> {
            let source = match &param.class {
                TypeClass::Object(name) => format!("object<{name}>"),
                TypeClass::Number(_) => "number".to_string(),
                TypeClass::Str => "string".to_string(),
                TypeClass::ByteBuffer => "bytes".to_string(),
                TypeClass::Boolean => return None,
                _ => "other".to_string(),
            };
            Some(format!("auto {} = {source}(arg[{}]);", param.name, param.slot))
        }

        fn retain(&self, param: &PlannedParam<'_>) -> Retention {
            Retention {
                declare: format!("Keep {}Keep;", param.name),
                fill: Some(format!("{0}Keep = keep(arg[{1}]);", param.name, param.slot)),
                capture: format!("{}Keep", param.name),
            }
        }

        fn encode(&self, finish: &FinishPlan<'_>) -> Option<String> {
            match finish.class {
                TypeClass::Void => Some("nothing()".to_string()),
                TypeClass::Boolean => Some("boolean(ret)".to_string()),
                _ => None,
            }
        }
    }

    #[test]
    fn plans_the_throwing_open() {
        let library = scenario();
        let derived = library.interface("Derived").unwrap();
        let methods = library.effective_methods(derived).unwrap();
        let open = methods[0];

        let plan = plan_method(&library, "Derived", open, DualPathPolicy::Always, |ty| {
            carrier_type(&library, "fb", ty)
        })
        .unwrap();

        let classes: Vec<&TypeClass> = plan.start.params.iter().map(|p| &p.class).collect();
        assert_eq!(
            classes,
            [
                &TypeClass::Object("Status".into()),
                &TypeClass::Str,
                &TypeClass::Number(NumericKind::Int)
            ]
        );
        assert_eq!(plan.start.status_receiver, Some("status"));
        assert_eq!(
            plan.start.args,
            [CallArg::StatusCarrier, CallArg::CString("path"), CallArg::Plain("mode")]
        );
        assert!(plan.start.yields_value);
        assert_eq!(plan.finish.class, TypeClass::Boolean);
        assert_eq!(plan.finish.carrier, "FB_BOOLEAN");
        assert!(plan.has_async);
    }

    #[test]
    fn only_buffers_are_retained() {
        let library = scenario();
        let method = Method::new("write", Type::void())
            .param("length", Type::new("uint"))
            .param("buffer", Type::new("uchar").pointer().constant());
        let plan = plan_method(&library, "Blob", &method, DualPathPolicy::Flagged, |ty| {
            ty.to_string()
        })
        .unwrap();

        let retained: Vec<bool> = plan.start.params.iter().map(|p| p.retained).collect();
        assert_eq!(retained, [false, true]);
        assert!(!plan.start.yields_value);
        assert!(!plan.has_async);
    }

    #[test]
    fn reports_every_unhandled_site() {
        let library = scenario();
        let method = Method::new("describe", Type::void().pointer())
            .param("name", Type::new("string"))
            .param("count", Type::new("int"))
            .param("date", Type::new("ISC_DATE"));

        let errors = plan_method(&library, "Util", &method, DualPathPolicy::Always, |ty| {
            ty.to_string()
        })
        .unwrap_err();

        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        expect![[r#"
            [
                "Unhandled type `string` for parameter `name` of `Util#describe`",
                "Unhandled type `ISC_DATE` for parameter `date` of `Util#describe`",
                "Unhandled type `void*` for return value of `Util#describe`",
            ]
        "#]]
        .assert_debug_eq(&messages);
    }

    #[test]
    fn throwing_method_needs_a_receiver() {
        let library = scenario();
        let method = Method::new("ping", Type::void()).throwing();
        let errors = plan_method(&library, "Server", &method, DualPathPolicy::Always, |ty| {
            ty.to_string()
        })
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            Diagnostic::Model { scope, .. } if scope == "Server#ping"
        ));
    }

    #[test]
    fn throwing_method_receiver_must_be_an_interface() {
        let library = scenario();
        let method = Method::new("fetch", Type::new("int"))
            .throwing()
            .param("count", Type::new("int"))
            .param("path", Type::new("string").constant());
        let errors = plan_method(&library, "Cursor", &method, DualPathPolicy::Always, |ty| {
            ty.to_string()
        })
        .unwrap_err();

        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        expect![[r#"
            [
                "Skipped `Cursor#fetch`: Method `Cursor#fetch` may throw but its first parameter `count` has type `int`",
            ]
        "#]]
        .assert_debug_eq(&messages);
    }

    #[test]
    fn renders_start_body() {
        let library = scenario();
        let base = library.interface("Base").unwrap();
        let glue = generate_method(&Plain, &library, "fb", "Base", &base.methods()[0]).unwrap();

        assert_eq!(glue.carrier, "FB_BOOLEAN");
        assert_eq!(glue.arity, 3);
        assert_eq!(glue.finish_body, "\treturn boolean(ret);\n");
        assert_eq!(
            glue.start_body,
            concat!(
                "\tauto obj = self<Base>();\n",
                "\tauto status = object<Status>(arg[0]);\n",
                "\tauto path = string(arg[1]);\n",
                "\tauto mode = number(arg[2]);\n",
                "\n",
                "\treturn [obj, status, path, mode]() {\n",
                "\t\tfb::ThrowStatusWrapper statusWrapper(status->interface);\n",
                "\t\treturn obj->interface->open(&statusWrapper, path.c_str(), mode);\n",
                "\t};\n",
            )
        );
    }

    #[test]
    fn renders_retention_for_buffers() {
        let library = scenario();
        let method = Method::new("write", Type::void())
            .param("peer", Type::new("Status"))
            .param("buffer", Type::new("uchar").pointer());
        let glue = generate_method(&Plain, &library, "fb", "Blob", &method).unwrap();

        assert_eq!(
            glue.start_body,
            concat!(
                "\tauto obj = self<Blob>();\n",
                "\tKeep bufferKeep;\n",
                "\tauto peer = object<Status>(arg[0]);\n",
                "\tauto buffer = bytes(arg[1]);\n",
                "\n",
                "\tif (async)\n",
                "\t{\n",
                "\t\tbufferKeep = keep(arg[1]);\n",
                "\t}\n",
                "\n",
                "\treturn [obj, peer, buffer, bufferKeep]() {\n",
                "\t\tobj->interface->write((peer ? peer->interface : nullptr), buffer);\n",
                "\t\treturn nullptr;\n",
                "\t};\n",
            )
        );
        assert_eq!(glue.finish_body, "\treturn nothing();\n");
    }

    #[test]
    fn style_declines_are_unhandled() {
        let library = scenario();
        let method = Method::new("toggle", Type::new("int")).param("on", Type::new("boolean"));
        let errors = generate_method(&Plain, &library, "fb", "Switch", &method).unwrap_err();

        let sites: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            sites,
            [
                "Unhandled type `boolean` for parameter `on` of `Switch#toggle`",
                "Unhandled type `int` for return value of `Switch#toggle`",
            ]
        );
    }
}
