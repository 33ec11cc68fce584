use std::fmt;

use serde::Deserialize;

/// A declared type: a primitive tag or the name of another interface.
///
/// A name matching a declared interface denotes an object reference to an
/// instance implementing that interface. Pointer-ness is only meaningful for
/// primitives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Type {
    pub name: String,
    #[serde(default)]
    pub is_pointer: bool,
    #[serde(default)]
    pub is_const: bool,
}

impl Type {
    /// A non-pointer, non-const type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_pointer: false,
            is_const: false,
        }
    }

    /// Shorthand for `Type::new("void")`.
    pub fn void() -> Self {
        Self::new(Primitive::Void.tag())
    }

    pub fn pointer(mut self) -> Self {
        self.is_pointer = true;
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_const = true;
        self
    }

    /// The primitive this type names, if its name is a primitive tag.
    pub fn primitive(&self) -> Option<Primitive> {
        Primitive::from_tag(&self.name)
    }

    /// `void` by value: a call returning it yields no value.
    pub fn is_void_value(&self) -> bool {
        !self.is_pointer && self.primitive() == Some(Primitive::Void)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            write!(f, "const ")?;
        }
        write!(f, "{}", self.name)?;
        if self.is_pointer {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// The primitive type tags understood by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Void,
    UChar,
    Int,
    UInt,
    Int64,
    UInt64,
    Boolean,
    String,
}

impl Primitive {
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "void" => Primitive::Void,
            "uchar" => Primitive::UChar,
            "int" => Primitive::Int,
            "uint" => Primitive::UInt,
            "int64" => Primitive::Int64,
            "uint64" => Primitive::UInt64,
            "boolean" => Primitive::Boolean,
            "string" => Primitive::String,
            _ => return None,
        })
    }

    pub fn tag(self) -> &'static str {
        match self {
            Primitive::Void => "void",
            Primitive::UChar => "uchar",
            Primitive::Int => "int",
            Primitive::UInt => "uint",
            Primitive::Int64 => "int64",
            Primitive::UInt64 => "uint64",
            Primitive::Boolean => "boolean",
            Primitive::String => "string",
        }
    }

    /// The numeric kind of this primitive, if it is a number.
    pub fn numeric(self) -> Option<NumericKind> {
        match self {
            Primitive::UChar => Some(NumericKind::UChar),
            Primitive::Int => Some(NumericKind::Int),
            Primitive::UInt => Some(NumericKind::UInt),
            Primitive::Int64 => Some(NumericKind::Int64),
            Primitive::UInt64 => Some(NumericKind::UInt64),
            _ => None,
        }
    }
}

/// The integer primitives, which all cross the boundary as numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    UChar,
    Int,
    UInt,
    Int64,
    UInt64,
}

impl NumericKind {
    /// The native C type of a value of this kind.
    pub fn c_type(self) -> &'static str {
        match self {
            NumericKind::UChar => "unsigned char",
            NumericKind::Int => "int",
            NumericKind::UInt => "unsigned",
            NumericKind::Int64 => "int64_t",
            NumericKind::UInt64 => "uint64_t",
        }
    }

    /// Whether values of this kind may exceed the boundary's exact integer range.
    pub fn is_wide(self) -> bool {
        matches!(self, NumericKind::Int64 | NumericKind::UInt64)
    }
}
