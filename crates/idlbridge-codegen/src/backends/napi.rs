use std::fmt;

use idlbridge_model::{Library, NumericKind};

use super::{generate_interfaces, Backend, InterfaceGlue, Options, BANNER};
use crate::call_path::{FinishPlan, PlannedParam};
use crate::diagnostics::{Artifact, Diagnostics};
use crate::style::{BindingStyle, DualPathPolicy, Retention};
use crate::types::TypeClass;

/// Reference-counted object wraps with promise workers (`Napi::ObjectWrap`).
#[derive(Debug, Clone, Copy, Default)]
pub struct NapiBackend;

impl BindingStyle for NapiBackend {
    fn dual_path(&self) -> DualPathPolicy {
        DualPathPolicy::Always
    }

    fn receiver(&self, interface: &str) -> String {
        format!("auto* obj = ObjectWrap<{interface}>::Unwrap(info.This().ToObject());")
    }

    fn decode(&self, param: &PlannedParam<'_>) -> Option<String> {
        let (name, slot) = (param.name, param.slot);
        let address = |element: &str| {
            format!("getAddress<{element}>(info.Env(), async, info[{slot}], {name}Persistent)")
        };

        Some(match &param.class {
            TypeClass::ByteBuffer => format!("auto* {name} = {};", address("unsigned char")),
            TypeClass::NumericBuffer(kind) => format!("auto* {name} = {};", address(kind.c_type())),
            TypeClass::ReinterpretedBuffer(_) => format!(
                "auto* {name} = ({}) {};",
                param.carrier,
                address("unsigned char")
            ),
            TypeClass::Object(interface) => format!(
                "auto* {name} = {interface}::CheckedUnwrap(info.Env(), info[{slot}], \"{name} argument\", true);"
            ),
            TypeClass::Number(kind) => {
                let c_type = kind.c_type();
                let narrow = match kind {
                    NumericKind::UChar => ".Uint32Value()",
                    NumericKind::UInt64 => ".Int64Value()",
                    _ => "",
                };
                format!("{c_type} {name} = ({c_type}) info[{slot}].ToNumber(){narrow};")
            }
            TypeClass::Boolean => format!("bool {name} = info[{slot}].ToBoolean();"),
            TypeClass::Str => format!("std::string {name} = info[{slot}].ToString().Utf8Value();"),
            TypeClass::Void | TypeClass::OpaquePointer => return None,
        })
    }

    fn retain(&self, param: &PlannedParam<'_>) -> Retention {
        // getAddress fills the reference itself when `async` is set.
        Retention {
            declare: format!(
                "std::shared_ptr<Napi::Reference<Napi::Value>> {}Persistent;",
                param.name
            ),
            fill: None,
            capture: format!("{}Persistent", param.name),
        }
    }

    fn encode(&self, finish: &FinishPlan<'_>) -> Option<String> {
        Some(match &finish.class {
            TypeClass::Void => "env.Undefined()".to_string(),
            TypeClass::Object(interface) => {
                format!("ret ? {interface}::NewInstance(env, ret) : env.Undefined()")
            }
            TypeClass::Number(kind) if kind.is_wide() => "Napi::Value::From(env, (double) ret)".to_string(),
            TypeClass::Number(_) => "Napi::Value::From(env, ret)".to_string(),
            TypeClass::Boolean => "Napi::Value::From(env, (bool) ret)".to_string(),
            TypeClass::Str => {
                "ret.isNull() ? env.Undefined() : Napi::Value::From(env, ret.string())".to_string()
            }
            TypeClass::OpaquePointer => "Pointer::NewInstance(env, ret)".to_string(),
            _ => return None,
        })
    }
}

impl Backend for NapiBackend {
    fn name(&self) -> &'static str {
        "napi"
    }

    fn emit(&self, library: &Library, options: &Options) -> Artifact {
        let mut diagnostics = Diagnostics::new();
        let interfaces = generate_interfaces(self, library, options, &mut diagnostics);
        let text = NapiWriter {
            namespace: &options.namespace,
            interfaces: &interfaces,
        }
        .to_string();
        Artifact { text, diagnostics }
    }
}

struct NapiWriter<'a> {
    namespace: &'a str,
    interfaces: &'a [InterfaceGlue<'a>],
}

impl fmt::Display for NapiWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{BANNER}")?;
        writeln!(f)?;

        for interface in self.interfaces {
            self.fmt_class(f, interface)?;
        }
        for interface in self.interfaces {
            self.fmt_definitions(f, interface)?;
        }

        writeln!(f, "static void initClasses(Napi::Env env, Napi::Object& exports)")?;
        writeln!(f, "{{")?;
        for interface in self.interfaces {
            writeln!(f, "\t{0}::Init(env, exports, \"{0}\");", interface.name)?;
        }
        writeln!(f, "}}")
    }
}

impl NapiWriter<'_> {
    fn fmt_class(&self, f: &mut fmt::Formatter<'_>, interface: &InterfaceGlue<'_>) -> fmt::Result {
        let name = interface.name;
        let base = format!("BaseClass<{name}, {}::I{name}>", self.namespace);

        writeln!(f, "class {name} : public {base}")?;
        writeln!(f, "{{")?;
        writeln!(f, "friend class {base};")?;
        writeln!(f)?;
        writeln!(f, "public:")?;
        writeln!(f, "\tusing BaseClass::BaseClass;")?;
        writeln!(f)?;
        writeln!(f, "private:")?;
        writeln!(
            f,
            "\tstatic void InitPrototype(std::vector<Napi::ObjectWrap<{name}>::PropertyDescriptor>& properties);"
        )?;
        writeln!(f)?;
        writeln!(f, "private:")?;

        for method in &interface.methods {
            let m = &method.name;
            let carrier = &method.carrier;
            writeln!(
                f,
                "\tstatic MethodStart<{carrier}> {m}Start(bool async, const Napi::CallbackInfo& info);"
            )?;
            writeln!(
                f,
                "\tstatic Napi::Value {m}Finish(const Napi::Env env, {carrier} ret);"
            )?;

            if method.has_async {
                writeln!(f)?;
                writeln!(f, "\tNapi::Value {m}Async(const Napi::CallbackInfo& info)")?;
                writeln!(f, "\t{{")?;
                writeln!(f, "\t\treturn PromiseWorker<{carrier}>::Run(info.Env(),")?;
                writeln!(f, "\t\t\t{m}Start(true, info),")?;
                writeln!(f, "\t\t\t&{name}::{m}Finish);")?;
                writeln!(f, "\t}}")?;
            }

            writeln!(f)?;
            writeln!(f, "\tNapi::Value {m}Sync(const Napi::CallbackInfo& info)")?;
            writeln!(f, "\t{{")?;
            writeln!(f, "\t\ttry")?;
            writeln!(f, "\t\t{{")?;
            writeln!(f, "\t\t\tauto ret = {m}Start(false, info)();")?;
            writeln!(f, "\t\t\treturn {m}Finish(info.Env(), ret);")?;
            writeln!(f, "\t\t}}")?;
            writeln!(f, "\t\tcatch (...)")?;
            writeln!(f, "\t\t{{")?;
            writeln!(f, "\t\t\trethrowException(info.Env());")?;
            writeln!(f, "\t\t}}")?;
            writeln!(f, "\t}}")?;
            writeln!(f)?;
        }

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

        writeln!(
            f,
            "void {name}::InitPrototype(std::vector<Napi::ObjectWrap<{name}>::PropertyDescriptor>& properties)"
        )?;
        writeln!(f, "{{")?;
        for method in &interface.methods {
            let m = &method.name;
            writeln!(
                f,
                "\tproperties.push_back(InstanceMethod(\"{m}Sync\", &{name}::{m}Sync));"
            )?;
            if method.has_async {
                writeln!(
                    f,
                    "\tproperties.push_back(InstanceMethod(\"{m}Async\", &{name}::{m}Async));"
                )?;
            }
        }
        writeln!(f, "}}")?;
        writeln!(f)?;

        for method in &interface.methods {
            let m = &method.name;
            let carrier = &method.carrier;

            writeln!(
                f,
                "MethodStart<{carrier}> {name}::{m}Start(bool async, const Napi::CallbackInfo& info)"
            )?;
            writeln!(f, "{{")?;
            write!(f, "{}", method.start_body)?;
            writeln!(f, "}}")?;
            writeln!(f)?;

            writeln!(
                f,
                "Napi::Value {name}::{m}Finish(const Napi::Env env, {carrier} ret)"
            )?;
            writeln!(f, "{{")?;
            write!(f, "{}", method.finish_body)?;
            writeln!(f, "}}")?;
            writeln!(f)?;
        }

        Ok(())
    }
}
