use std::fmt;

use idlbridge_model::Library;

use super::{generate_interfaces, Backend, InterfaceGlue, Options, BANNER};
use crate::call_path::{FinishPlan, PlannedParam};
use crate::diagnostics::{Artifact, Diagnostics};
use crate::style::{BindingStyle, DualPathPolicy, Retention};
use crate::types::TypeClass;

const UNDEFINED: &str = "v8::Local<v8::Value>(Nan::Undefined())";

/// Legacy direct-handle bindings (`Nan::ObjectWrap`).
///
/// Only methods flagged `async` in the library get an asynchronous variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct NanBackend;

impl BindingStyle for NanBackend {
    fn dual_path(&self) -> DualPathPolicy {
        DualPathPolicy::Flagged
    }

    fn receiver(&self, interface: &str) -> String {
        format!("auto* obj = ObjectWrap::Unwrap<{interface}>(info.This());")
    }

    fn decode(&self, param: &PlannedParam<'_>) -> Option<String> {
        let (name, slot) = (param.name, param.slot);

        Some(match &param.class {
            TypeClass::ByteBuffer => {
                format!("auto* {name} = getAddress<unsigned char>(info[{slot}]);")
            }
            TypeClass::NumericBuffer(kind) => {
                format!("auto* {name} = getAddress<{}>(info[{slot}]);", kind.c_type())
            }
            TypeClass::ReinterpretedBuffer(_) => format!(
                "auto* {name} = ({}) getAddress<unsigned char>(info[{slot}]);",
                param.carrier
            ),
            TypeClass::Object(interface) => format!(
                "auto* {name} = {interface}::CheckedUnwrap(info[{slot}], \"{name} argument\", true);"
            ),
            TypeClass::Number(kind) => {
                let c_type = kind.c_type();
                format!("{c_type} {name} = ({c_type}) info[{slot}]->NumberValue();")
            }
            TypeClass::Boolean => format!("bool {name} = info[{slot}]->BooleanValue();"),
            TypeClass::Str => format!(
                "std::string {name} = *v8::String::Utf8Value(info[{slot}]->ToString());"
            ),
            TypeClass::Void | TypeClass::OpaquePointer => return None,
        })
    }

    fn retain(&self, param: &PlannedParam<'_>) -> Retention {
        let name = param.name;
        Retention {
            declare: format!("std::shared_ptr<Nan::Persistent<v8::Value>> {name}Persistent;"),
            fill: Some(format!(
                "{name}Persistent = std::make_shared<Nan::Persistent<v8::Value>>(info[{}]);",
                param.slot
            )),
            capture: format!("{name}Persistent"),
        }
    }

    fn encode(&self, finish: &FinishPlan<'_>) -> Option<String> {
        Some(match &finish.class {
            TypeClass::Void => UNDEFINED.to_string(),
            TypeClass::Object(interface) => {
                format!("ret ? {interface}::NewInstance(ret) : {UNDEFINED}")
            }
            TypeClass::Number(kind) if kind.is_wide() => "Nan::New((double) ret)".to_string(),
            TypeClass::Number(_) => "Nan::New(ret)".to_string(),
            TypeClass::Boolean => "Nan::New((bool) ret)".to_string(),
            TypeClass::Str => format!(
                "ret.isNull() ? {UNDEFINED} : v8::Local<v8::Value>(Nan::New(ret.string()).ToLocalChecked())"
            ),
            TypeClass::OpaquePointer => "Pointer::NewInstance(ret)".to_string(),
            _ => return None,
        })
    }
}

impl Backend for NanBackend {
    fn name(&self) -> &'static str {
        "nan"
    }

    fn emit(&self, library: &Library, options: &Options) -> Artifact {
        let mut diagnostics = Diagnostics::new();
        let interfaces = generate_interfaces(self, library, options, &mut diagnostics);
        let text = NanWriter {
            namespace: &options.namespace,
            interfaces: &interfaces,
        }
        .to_string();
        Artifact { text, diagnostics }
    }
}

struct NanWriter<'a> {
    namespace: &'a str,
    interfaces: &'a [InterfaceGlue<'a>],
}

impl fmt::Display for NanWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{BANNER}")?;
        writeln!(f)?;

        for interface in self.interfaces {
            let name = interface.name;
            let ns = self.namespace;

            // Native-side implementation shell for callbacks into script.
            writeln!(f, "class {name}Impl : public BaseImpl<{name}Impl, {ns}::I{name}Impl>")?;
            writeln!(f, "{{")?;
            writeln!(f, "public:")?;
            writeln!(f, "\tusing BaseImpl::BaseImpl;")?;
            writeln!(f)?;
            writeln!(f, "public:")?;
            writeln!(f, "}};")?;
            writeln!(f)?;

            writeln!(f, "class {name} : public BaseClass<{name}, {ns}::I{name}>")?;
            writeln!(f, "{{")?;
            writeln!(f, "friend class BaseClass;")?;
            writeln!(f)?;
            writeln!(f, "private:")?;
            writeln!(f, "\tstatic void InitPrototype(v8::Local<v8::FunctionTemplate>& tpl);")?;
            writeln!(f)?;
            writeln!(f, "private:")?;
            for method in &interface.methods {
                let m = &method.name;
                let carrier = &method.carrier;
                writeln!(
                    f,
                    "\tstatic MethodStart<{carrier}> {m}Start(bool async, Nan::NAN_METHOD_ARGS_TYPE info);"
                )?;
                writeln!(f, "\tstatic v8::Local<v8::Value> {m}Finish({carrier} ret);")?;
                writeln!(f, "\tstatic NAN_METHOD({m}Sync);")?;
            }
            writeln!(f, "}};")?;
            writeln!(f)?;
            writeln!(f)?;
        }

        for interface in self.interfaces {
            self.fmt_definitions(f, interface)?;
        }

        writeln!(
            f,
            "static void initClasses(v8::Local<v8::Object> exports, v8::Local<v8::Object> module)"
        )?;
        writeln!(f, "{{")?;
        writeln!(f, "\tNan::HandleScope scope;")?;
        writeln!(f)?;
        for interface in self.interfaces {
            writeln!(f, "\t{0}::Init(exports, \"{0}\");", interface.name)?;
        }
        writeln!(f, "}}")
    }
}

impl NanWriter<'_> {
    fn fmt_definitions(
        &self,
        f: &mut fmt::Formatter<'_>,
        interface: &InterfaceGlue<'_>,
    ) -> fmt::Result {
        let name = interface.name;

        writeln!(f, "void {name}::InitPrototype(v8::Local<v8::FunctionTemplate>& tpl)")?;
        writeln!(f, "{{")?;
        for method in &interface.methods {
            let m = &method.name;
            writeln!(f, "\tDefineSyncMethod<{m}Sync>(tpl, \"{m}Sync\");")?;
            if method.has_async {
                writeln!(
                    f,
                    "\tDefineAsyncMethod<{}, {m}Start, {m}Finish>(tpl, \"{m}Async\");",
                    method.carrier
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
                "MethodStart<{carrier}> {name}::{m}Start(bool async, Nan::NAN_METHOD_ARGS_TYPE info)"
            )?;
            writeln!(f, "{{")?;
            write!(f, "{}", method.start_body)?;
            writeln!(f, "}}")?;
            writeln!(f)?;

            writeln!(f, "v8::Local<v8::Value> {name}::{m}Finish({carrier} ret)")?;
            writeln!(f, "{{")?;
            write!(f, "{}", method.finish_body)?;
            writeln!(f, "}}")?;
            writeln!(f)?;

            writeln!(f, "NAN_METHOD({name}::{m}Sync)")?;
            writeln!(f, "{{")?;
            writeln!(f, "\ttry")?;
            writeln!(f, "\t{{")?;
            writeln!(f, "\t\tauto ret = {m}Start(false, info)();")?;
            writeln!(f, "\t\tinfo.GetReturnValue().Set({m}Finish(ret));")?;
            writeln!(f, "\t}}")?;
            writeln!(f, "\tcatch (...)")?;
            writeln!(f, "\t{{")?;
            writeln!(f, "\t\trethrowException();")?;
            writeln!(f, "\t}}")?;
            writeln!(f, "}}")?;
            writeln!(f)?;
        }

        Ok(())
    }
}
