use std::fmt;

use idlbridge_model::Library;

use super::{generate_interfaces, Backend, InterfaceGlue, Options, BANNER};
use crate::call_path::{FinishPlan, PlannedParam};
use crate::diagnostics::{Artifact, Diagnostics};
use crate::style::{BindingStyle, DualPathPolicy, Retention};
use crate::types::TypeClass;

const JSI: &str = "facebook::jsi";

/// Host objects for engines without add-on infrastructure (`jsi::HostObject`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsiBackend;

impl BindingStyle for JsiBackend {
    fn dual_path(&self) -> DualPathPolicy {
        DualPathPolicy::Always
    }

    fn receiver(&self, interface: &str) -> String {
        format!("const auto obj = thisValue.asObject(rt).asHostObject<{interface}>(rt);")
    }

    fn decode(&self, param: &PlannedParam<'_>) -> Option<String> {
        let (name, slot) = (param.name, param.slot);
        let address = |element: &str| format!("getAddress<{element}>(rt, async, arguments[{slot}])");

        Some(match &param.class {
            TypeClass::ByteBuffer => format!("const auto {name} = {};", address("unsigned char")),
            TypeClass::NumericBuffer(kind) => {
                format!("const auto {name} = {};", address(kind.c_type()))
            }
            TypeClass::ReinterpretedBuffer(_) => format!(
                "const auto {name} = ({}) {};",
                param.carrier,
                address("unsigned char")
            ),
            TypeClass::Object(interface) => format!(
                "const auto {name} = arguments[{slot}].isObject() ? \
                 arguments[{slot}].asObject(rt).asHostObject<{interface}>(rt) : nullptr;"
            ),
            TypeClass::Number(kind) => {
                format!("const auto {name} = ({}) arguments[{slot}].asNumber();", kind.c_type())
            }
            TypeClass::Boolean => format!("const auto {name} = arguments[{slot}].asBool();"),
            TypeClass::Str => format!("auto {name} = arguments[{slot}].asString(rt).utf8(rt);"),
            TypeClass::Void | TypeClass::OpaquePointer => return None,
        })
    }

    fn retain(&self, param: &PlannedParam<'_>) -> Retention {
        let name = param.name;
        Retention {
            declare: format!("std::shared_ptr<{JSI}::Value> {name}Persistent;"),
            fill: Some(format!(
                "{name}Persistent = std::make_shared<{JSI}::Value>(rt, arguments[{}]);",
                param.slot
            )),
            capture: format!("{name}Persistent = std::move({name}Persistent)"),
        }
    }

    fn encode(&self, finish: &FinishPlan<'_>) -> Option<String> {
        Some(match &finish.class {
            TypeClass::Void => format!("{JSI}::Value::undefined()"),
            TypeClass::Object(interface) => format!(
                "ret ? {JSI}::Value(rt, {JSI}::Object::createFromHostObject(rt, std::make_shared<{interface}>(ret))) : \
                 {JSI}::Value::undefined()"
            ),
            TypeClass::Number(_) => format!("{JSI}::Value((double) ret)"),
            TypeClass::Boolean => format!("{JSI}::Value((bool) ret)"),
            TypeClass::Str => format!(
                "!ret.isNull() ? {JSI}::Value(rt, {JSI}::String::createFromUtf8(rt, ret.string())) : \
                 {JSI}::Value::undefined()"
            ),
            // Host objects have no opaque pointer wrapper.
            _ => return None,
        })
    }
}

impl Backend for JsiBackend {
    fn name(&self) -> &'static str {
        "jsi"
    }

    fn emit(&self, library: &Library, options: &Options) -> Artifact {
        let mut diagnostics = Diagnostics::new();
        let interfaces = generate_interfaces(self, library, options, &mut diagnostics);
        let text = JsiWriter {
            namespace: &options.namespace,
            interfaces: &interfaces,
        }
        .to_string();
        Artifact { text, diagnostics }
    }
}

struct JsiWriter<'a> {
    namespace: &'a str,
    interfaces: &'a [InterfaceGlue<'a>],
}

const HOST_FUNCTION_PARAMS: &str =
    "facebook::jsi::Runtime& rt, const facebook::jsi::Value& thisValue, const facebook::jsi::Value* arguments, size_t argumentsCount";

impl fmt::Display for JsiWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{BANNER}")?;
        writeln!(f)?;

        for interface in self.interfaces {
            self.fmt_class(f, interface)?;
        }
        for interface in self.interfaces {
            self.fmt_definitions(f, interface)?;
        }

        writeln!(f, "static std::vector<std::string> classNames()")?;
        writeln!(f, "{{")?;
        writeln!(f, "\treturn {{")?;
        for interface in self.interfaces {
            writeln!(f, "\t\t\"{}\",", interface.name)?;
        }
        writeln!(f, "\t}};")?;
        writeln!(f, "}}")
    }
}

impl JsiWriter<'_> {
    fn fmt_class(&self, f: &mut fmt::Formatter<'_>, interface: &InterfaceGlue<'_>) -> fmt::Result {
        let name = interface.name;
        let ns = self.namespace;

        writeln!(f, "class {name} : public {JSI}::HostObject")?;
        writeln!(f, "{{")?;
        writeln!(f, "public:")?;
        writeln!(f, "\t{name}({ns}::I{name}* interface)")?;
        writeln!(f, "\t\t: interface(interface)")?;
        writeln!(f, "\t{{")?;
        writeln!(f, "\t}}")?;
        writeln!(f)?;

        if !interface.methods.is_empty() {
            writeln!(f, "public:")?;
            writeln!(
                f,
                "\tstd::vector<{JSI}::PropNameID> getPropertyNames({JSI}::Runtime& rt) override"
            )?;
            writeln!(f, "\t{{")?;
            writeln!(f, "\t\treturn {JSI}::PropNameID::names(rt")?;
            for method in &interface.methods {
                if method.has_async {
                    writeln!(f, "\t\t\t, \"{}Async\"", method.name)?;
                }
                writeln!(f, "\t\t\t, \"{}Sync\"", method.name)?;
            }
            writeln!(f, "\t\t);")?;
            writeln!(f, "\t}}")?;
            writeln!(f)?;

            writeln!(
                f,
                "\t{JSI}::Value get({JSI}::Runtime& rt, const {JSI}::PropNameID& propNameID) override"
            )?;
            writeln!(f, "\t{{")?;
            writeln!(f, "\t\tconst auto propName = propNameID.utf8(rt);")?;
            for method in &interface.methods {
                let variants: &[&str] = if method.has_async {
                    &["Async", "Sync"]
                } else {
                    &["Sync"]
                };
                for variant in variants {
                    let exposed = format!("{}{variant}", method.name);
                    writeln!(f)?;
                    writeln!(f, "\t\tif (propName == \"{exposed}\")")?;
                    writeln!(
                        f,
                        "\t\t\treturn {JSI}::Function::createFromHostFunction(rt, \
                         {JSI}::PropNameID::forAscii(rt, \"{exposed}\"), {}, {exposed});",
                        method.arity
                    )?;
                }
            }
            writeln!(f)?;
            writeln!(f, "\t\treturn HostObject::get(rt, propNameID);")?;
            writeln!(f, "\t}}")?;
            writeln!(f)?;

            writeln!(f, "private:")?;
            for method in &interface.methods {
                let m = &method.name;
                let carrier = &method.carrier;
                writeln!(
                    f,
                    "\tstatic MethodStart<{carrier}> {m}Start(bool async, {HOST_FUNCTION_PARAMS});"
                )?;
                writeln!(
                    f,
                    "\tstatic {JSI}::Value {m}Finish({JSI}::Runtime& rt, {carrier} ret);"
                )?;
                if method.has_async {
                    writeln!(f, "\tstatic {JSI}::Value {m}Async({HOST_FUNCTION_PARAMS});")?;
                }
                writeln!(f, "\tstatic {JSI}::Value {m}Sync({HOST_FUNCTION_PARAMS});")?;
            }
        }

        writeln!(f)?;
        writeln!(f, "public:")?;
        writeln!(f, "\t{ns}::I{name}* const interface;")?;
        writeln!(f, "}};")?;
        writeln!(f)?;
        writeln!(f)
    }

    fn fmt_definitions(
        &self,
        f: &mut fmt::Formatter<'_>,
        interface: &InterfaceGlue<'_>,
    ) -> fmt::Result {
        let name = interface.name;

        for method in &interface.methods {
            let m = &method.name;
            let carrier = &method.carrier;

            writeln!(
                f,
                "MethodStart<{carrier}> {name}::{m}Start(bool async, {HOST_FUNCTION_PARAMS})"
            )?;
            writeln!(f, "{{")?;
            write!(f, "{}", method.start_body)?;
            writeln!(f, "}}")?;
            writeln!(f)?;

            writeln!(f, "{JSI}::Value {name}::{m}Finish({JSI}::Runtime& rt, {carrier} ret)")?;
            writeln!(f, "{{")?;
            write!(f, "{}", method.finish_body)?;
            writeln!(f, "}}")?;
            writeln!(f)?;

            if method.has_async {
                writeln!(f, "{JSI}::Value {name}::{m}Async({HOST_FUNCTION_PARAMS})")?;
                writeln!(f, "{{")?;
                writeln!(f, "\treturn runAsPromise<{carrier}>(rt,")?;
                writeln!(f, "\t\t{m}Start(true, rt, thisValue, arguments, argumentsCount),")?;
                writeln!(f, "\t\t&{name}::{m}Finish);")?;
                writeln!(f, "}}")?;
                writeln!(f)?;
            }

            writeln!(f, "{JSI}::Value {name}::{m}Sync({HOST_FUNCTION_PARAMS})")?;
            writeln!(f, "{{")?;
            writeln!(f, "\ttry")?;
            writeln!(f, "\t{{")?;
            writeln!(
                f,
                "\t\tauto ret = {m}Start(false, rt, thisValue, arguments, argumentsCount)();"
            )?;
            writeln!(f, "\t\treturn {m}Finish(rt, ret);")?;
            writeln!(f, "\t}}")?;
            writeln!(f, "\tcatch (...)")?;
            writeln!(f, "\t{{")?;
            writeln!(f, "\t\trethrowException(rt);")?;
            writeln!(f, "\t}}")?;
            writeln!(f, "}}")?;
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostic, Site};
    use idlbridge_model::{Interface, Method, Type};

    #[test]
    fn buffers_are_retained_when_async() {
        let library = Library::new(vec![Interface::new("Blob").with_method(
            Method::new("getSegment", Type::new("uint"))
                .param("length", Type::new("uint"))
                .param("buffer", Type::new("uchar").pointer()),
        )])
        .unwrap();
        let artifact = JsiBackend.emit(&library, &Options::new("fb"));
        assert!(artifact.diagnostics.is_empty());

        let text = &artifact.text;
        assert!(text.contains(concat!(
            "\tconst auto obj = thisValue.asObject(rt).asHostObject<Blob>(rt);\n",
            "\tstd::shared_ptr<facebook::jsi::Value> bufferPersistent;\n",
            "\tconst auto length = (unsigned) arguments[0].asNumber();\n",
            "\tconst auto buffer = getAddress<unsigned char>(rt, async, arguments[1]);\n",
            "\n",
            "\tif (async)\n",
            "\t{\n",
            "\t\tbufferPersistent = std::make_shared<facebook::jsi::Value>(rt, arguments[1]);\n",
            "\t}\n",
            "\n",
            "\treturn [obj, length, buffer, bufferPersistent = std::move(bufferPersistent)]() {\n",
            "\t\treturn obj->interface->getSegment(length, buffer);\n",
            "\t};\n",
        )));
        assert!(text.contains("\treturn facebook::jsi::Value((double) ret);\n"));
        assert!(text.contains("\treturn runAsPromise<unsigned>(rt,\n"));
    }

    #[test]
    fn opaque_pointer_results_are_declined() {
        let library = Library::new(vec![Interface::new("Util")
            .with_method(Method::new("getBuffer", Type::new("uchar").pointer()))
            .with_method(Method::new("getVersion", Type::new("uint")))])
        .unwrap();
        let artifact = JsiBackend.emit(&library, &Options::new("fb"));

        let diagnostics: Vec<&Diagnostic> = artifact.diagnostics.iter().collect();
        assert_eq!(
            diagnostics,
            [&Diagnostic::unhandled(
                "Util",
                "getBuffer",
                Site::Return,
                &Type::new("uchar").pointer()
            )]
        );
        assert!(!artifact.text.contains("getBuffer"));
        assert!(artifact.text.contains("\t\tif (propName == \"getVersionSync\")\n"));
    }

    #[test]
    fn lists_emitted_classes() {
        let library = Library::new(vec![Interface::new("Status"), Interface::new("Util")]).unwrap();
        let text = JsiBackend.emit(&library, &Options::new("fb")).text;
        assert!(text.ends_with(concat!(
            "static std::vector<std::string> classNames()\n",
            "{\n",
            "\treturn {\n",
            "\t\t\"Status\",\n",
            "\t\t\"Util\",\n",
            "\t};\n",
            "}\n",
        )));
        assert!(text.contains("\tfb::IStatus* const interface;\n"));
    }
}
