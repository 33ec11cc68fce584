use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{Expr, ModelError, ModelResult, Type};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A named, typed compile-time value scoped to one interface.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Constant {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    pub expr: Expr,
}

impl Constant {
    pub fn new(name: impl Into<String>, ty: Type, expr: Expr) -> Self {
        Self {
            name: name.into(),
            ty,
            expr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub version: u32,
    pub return_type: Type,
    /// The call can fail through the status carrier bound to parameter 0.
    #[serde(default)]
    pub may_throw: bool,
    /// Explicitly flagged as asynchronous in the library.
    #[serde(default, rename = "async")]
    pub is_async: bool,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub not_implemented_expr: Option<Expr>,
}

impl Method {
    pub fn new(name: impl Into<String>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            version: 0,
            return_type,
            may_throw: false,
            is_async: false,
            parameters: Vec::new(),
            not_implemented_expr: None,
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.parameters.push(Parameter::new(name, ty));
        self
    }

    pub fn throwing(mut self) -> Self {
        self.may_throw = true;
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    /// The parameter whose native receiver hosts the status carrier.
    ///
    /// Only meaningful for throwing methods; a throwing method with no
    /// parameters has nowhere to attach the carrier.
    pub fn error_receiver(&self, interface: &str) -> ModelResult<&Parameter> {
        self.parameters
            .first()
            .ok_or_else(|| ModelError::MissingErrorReceiver {
                interface: interface.to_string(),
                method: self.name.clone(),
            })
    }
}

#[derive(Debug, Deserialize)]
struct InterfaceDoc {
    name: String,
    #[serde(default)]
    version: u32,
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    constants: Vec<Constant>,
    #[serde(default)]
    methods: Vec<Method>,
}

/// An interface and its own (non-inherited) members.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "InterfaceDoc")]
pub struct Interface {
    pub name: String,
    pub version: u32,
    pub extends: Option<String>,
    pub constants: Vec<Constant>,
    methods: Vec<Method>,
    methods_by_name: FxHashMap<String, usize>,
}

impl From<InterfaceDoc> for Interface {
    fn from(doc: InterfaceDoc) -> Self {
        let mut interface = Interface::new(doc.name);
        interface.version = doc.version;
        interface.extends = doc.extends;
        interface.constants = doc.constants;
        interface.methods = doc.methods;
        interface.reindex();
        interface
    }
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 0,
            extends: None,
            constants: Vec::new(),
            methods: Vec::new(),
            methods_by_name: FxHashMap::default(),
        }
    }

    pub fn extending(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_constant(mut self, constant: Constant) -> Self {
        self.constants.push(constant);
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.methods_by_name
            .insert(method.name.clone(), self.methods.len());
        self.methods.push(method);
        self
    }

    /// The methods declared by this interface, in declaration order.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Looks up one of this interface's own methods. When a name is declared
    /// twice the later declaration is returned.
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods_by_name.get(name).map(|&idx| &self.methods[idx])
    }

    fn reindex(&mut self) {
        self.methods_by_name = self
            .methods
            .iter()
            .enumerate()
            .map(|(idx, method)| (method.name.clone(), idx))
            .collect();
    }
}

#[derive(Debug, Deserialize)]
struct LibraryDoc {
    interfaces: Vec<Interface>,
}

/// An ordered set of uniquely named interfaces.
#[derive(Debug, Clone, Default)]
pub struct Library {
    interfaces: Vec<Interface>,
    by_name: FxHashMap<String, usize>,
}

impl Library {
    /// Builds and indexes a library, rejecting duplicate interface names.
    pub fn new(interfaces: Vec<Interface>) -> ModelResult<Self> {
        let mut library = Self {
            interfaces,
            by_name: FxHashMap::default(),
        };
        library.reindex()?;
        Ok(library)
    }

    /// Parses a library from its JSON document.
    pub fn from_json(source: &str) -> ModelResult<Self> {
        let doc: LibraryDoc = serde_json::from_str(source)?;
        let library = Self::new(doc.interfaces)?;
        log::debug!(
            "Loaded library with {} interfaces",
            library.interfaces.len()
        );
        Ok(library)
    }

    /// Reads and parses a library file.
    pub fn load(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        log::debug!("Reading library from {}", path.display());
        let source = std::fs::read_to_string(path).map_err(|err| ModelError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_json(&source)
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.by_name.get(name).map(|&idx| &self.interfaces[idx])
    }

    /// Whether `name` denotes a declared interface (and so an object type).
    pub fn is_interface(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Appends an interface and updates the index.
    pub fn push_interface(&mut self, interface: Interface) -> ModelResult<()> {
        if self.by_name.contains_key(&interface.name) {
            return Err(ModelError::DuplicateInterface {
                name: interface.name,
            });
        }
        self.by_name
            .insert(interface.name.clone(), self.interfaces.len());
        self.interfaces.push(interface);
        Ok(())
    }

    fn reindex(&mut self) -> ModelResult<()> {
        self.by_name.clear();
        for (idx, interface) in self.interfaces.iter().enumerate() {
            if self.by_name.insert(interface.name.clone(), idx).is_some() {
                return Err(ModelError::DuplicateInterface {
                    name: interface.name.clone(),
                });
            }
        }
        Ok(())
    }
}
