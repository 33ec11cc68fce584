//! Classification of declared types by how their values cross the boundary.
//!
//! Every backend shares this table; backends only differ in how they render
//! each [`TypeClass`]. Classification is a pure function of the library and
//! the type, so repeated calls always agree.

use idlbridge_model::{Library, NumericKind, Primitive, Type};

/// Which side of a call a value is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// A parameter, decoded from a boundary value into a native one.
    Decode,
    /// A result, encoded from a native value into a boundary value.
    Encode,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeClass {
    /// No value (a `void` result).
    Void,
    /// Address of a caller-owned byte buffer (`void*`, `uchar*`, `boolean*`).
    ByteBuffer,
    /// Address of a caller-owned typed numeric buffer.
    NumericBuffer(NumericKind),
    /// A byte buffer cast to a pointer to the named element type.
    ReinterpretedBuffer(String),
    /// A native pointer handed back as an opaque boundary object.
    OpaquePointer,
    /// A nullable reference to an instance of the named interface.
    Object(String),
    Number(NumericKind),
    Boolean,
    /// A string; "no value" stays distinct from the empty string.
    Str,
}

impl TypeClass {
    /// Buffers alias caller memory and need their owner kept alive across an
    /// asynchronous call.
    pub fn is_buffer(&self) -> bool {
        matches!(
            self,
            TypeClass::ByteBuffer | TypeClass::NumericBuffer(_) | TypeClass::ReinterpretedBuffer(_)
        )
    }
}

/// Classifies `ty`, or returns `None` when the combination is not mappable in
/// this direction.
pub fn classify(library: &Library, ty: &Type, direction: Direction) -> Option<TypeClass> {
    match direction {
        Direction::Decode => classify_param(library, ty),
        Direction::Encode => classify_result(library, ty),
    }
}

fn classify_param(library: &Library, ty: &Type) -> Option<TypeClass> {
    if ty.is_pointer {
        return Some(match ty.primitive() {
            Some(Primitive::Void | Primitive::UChar | Primitive::Boolean) => TypeClass::ByteBuffer,
            Some(prim) => match prim.numeric() {
                Some(kind) => TypeClass::NumericBuffer(kind),
                None => TypeClass::ReinterpretedBuffer(ty.name.clone()),
            },
            None => TypeClass::ReinterpretedBuffer(ty.name.clone()),
        });
    }

    if library.is_interface(&ty.name) {
        return Some(TypeClass::Object(ty.name.clone()));
    }

    match ty.primitive()? {
        Primitive::Boolean => Some(TypeClass::Boolean),
        Primitive::String if ty.is_const => Some(TypeClass::Str),
        Primitive::String | Primitive::Void => None,
        prim => prim.numeric().map(TypeClass::Number),
    }
}

fn classify_result(library: &Library, ty: &Type) -> Option<TypeClass> {
    if ty.is_pointer {
        return (ty.primitive() == Some(Primitive::UChar)).then_some(TypeClass::OpaquePointer);
    }

    if library.is_interface(&ty.name) {
        return Some(TypeClass::Object(ty.name.clone()));
    }

    match ty.primitive()? {
        Primitive::Void => Some(TypeClass::Void),
        Primitive::Boolean => Some(TypeClass::Boolean),
        Primitive::String => Some(TypeClass::Str),
        prim => prim.numeric().map(TypeClass::Number),
    }
}

/// The native type used to hold a value of `ty` between the start and the
/// finish of a call.
///
/// Interface results are raw interface pointers and strings use the
/// `OptString` wrapper, so that both can represent "no value".
pub fn carrier_type(library: &Library, namespace: &str, ty: &Type) -> String {
    if !ty.is_pointer {
        if library.is_interface(&ty.name) {
            return format!("{namespace}::I{}*", ty.name);
        }
        if ty.primitive() == Some(Primitive::Void) {
            return "void*".to_string();
        }
    }

    let element = match ty.primitive() {
        Some(Primitive::Void) => "void".to_string(),
        Some(Primitive::Boolean) => "FB_BOOLEAN".to_string(),
        Some(Primitive::String) => "OptString".to_string(),
        Some(prim) => match prim.numeric() {
            Some(kind) => kind.c_type().to_string(),
            None => prim.tag().to_string(),
        },
        None if library.is_interface(&ty.name) => format!("{namespace}::I{}*", ty.name),
        None => ty.name.clone(),
    };

    if ty.is_pointer {
        let modifier = if ty.is_const { "const " } else { "" };
        format!("{modifier}{element}*")
    } else {
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idlbridge_model::Interface;

    fn library() -> Library {
        Library::new(vec![Interface::new("Status"), Interface::new("Attachment")]).unwrap()
    }

    #[test]
    fn pointer_params_are_buffers() {
        let library = library();
        let decode = |ty: Type| classify(&library, &ty, Direction::Decode);

        assert_eq!(decode(Type::void().pointer()), Some(TypeClass::ByteBuffer));
        assert_eq!(decode(Type::new("uchar").pointer().constant()), Some(TypeClass::ByteBuffer));
        assert_eq!(decode(Type::new("boolean").pointer()), Some(TypeClass::ByteBuffer));
        assert_eq!(
            decode(Type::new("int64").pointer()),
            Some(TypeClass::NumericBuffer(NumericKind::Int64))
        );
        assert_eq!(
            decode(Type::new("ISC_QUAD").pointer()),
            Some(TypeClass::ReinterpretedBuffer("ISC_QUAD".into()))
        );
    }

    #[test]
    fn value_params() {
        let library = library();
        let decode = |ty: Type| classify(&library, &ty, Direction::Decode);

        assert_eq!(decode(Type::new("Status")), Some(TypeClass::Object("Status".into())));
        assert_eq!(decode(Type::new("uchar")), Some(TypeClass::Number(NumericKind::UChar)));
        assert_eq!(decode(Type::new("boolean")), Some(TypeClass::Boolean));
        assert_eq!(decode(Type::new("string").constant()), Some(TypeClass::Str));
    }

    #[test]
    fn unmappable_params() {
        let library = library();
        let decode = |ty: Type| classify(&library, &ty, Direction::Decode);

        assert_eq!(decode(Type::new("string")), None);
        assert_eq!(decode(Type::void()), None);
        assert_eq!(decode(Type::new("ISC_DATE")), None);
    }

    #[test]
    fn results() {
        let library = library();
        let encode = |ty: Type| classify(&library, &ty, Direction::Encode);

        assert_eq!(encode(Type::void()), Some(TypeClass::Void));
        assert_eq!(encode(Type::new("uchar").pointer()), Some(TypeClass::OpaquePointer));
        assert_eq!(encode(Type::new("string")), Some(TypeClass::Str));
        assert_eq!(encode(Type::new("Attachment")), Some(TypeClass::Object("Attachment".into())));
        assert_eq!(encode(Type::new("uint64")), Some(TypeClass::Number(NumericKind::UInt64)));
        assert_eq!(encode(Type::void().pointer()), None);
        assert_eq!(encode(Type::new("int").pointer()), None);
        assert_eq!(encode(Type::new("ISC_TIME")), None);
    }

    #[test]
    fn classification_is_repeatable() {
        let library = library();
        for ty in [
            Type::new("string").constant(),
            Type::new("Status"),
            Type::new("int").pointer(),
            Type::new("ISC_QUAD").pointer().constant(),
        ] {
            for direction in [Direction::Decode, Direction::Encode] {
                assert_eq!(
                    classify(&library, &ty, direction),
                    classify(&library, &ty, direction)
                );
            }
            assert_eq!(
                carrier_type(&library, "fb", &ty),
                carrier_type(&library, "fb", &ty)
            );
        }
    }

    #[test]
    fn carrier_types() {
        let library = library();
        let carrier = |ty: Type| carrier_type(&library, "fb", &ty);

        assert_eq!(carrier(Type::new("Status")), "fb::IStatus*");
        assert_eq!(carrier(Type::void()), "void*");
        assert_eq!(carrier(Type::new("boolean")), "FB_BOOLEAN");
        assert_eq!(carrier(Type::new("string")), "OptString");
        assert_eq!(carrier(Type::new("uint")), "unsigned");
        assert_eq!(carrier(Type::new("uchar").pointer().constant()), "const unsigned char*");
        assert_eq!(carrier(Type::new("ISC_QUAD").pointer()), "ISC_QUAD*");
    }
}
