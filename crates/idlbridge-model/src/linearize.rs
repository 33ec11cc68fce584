//! Single-inheritance linearization.

use rustc_hash::FxHashSet;

use crate::{Interface, Library, Method, ModelError, ModelResult};

impl Library {
    /// The inheritance chain of `interface`, root ancestor first and
    /// `interface` itself last.
    pub fn ancestors<'a>(&'a self, interface: &'a Interface) -> ModelResult<Vec<&'a Interface>> {
        let mut chain = vec![interface];
        let mut seen = FxHashSet::default();
        seen.insert(interface.name.as_str());

        let mut current = interface;
        while let Some(parent_name) = current.extends.as_deref() {
            let parent = self
                .interface(parent_name)
                .ok_or_else(|| ModelError::DanglingExtends {
                    interface: current.name.clone(),
                    parent: parent_name.to_string(),
                })?;

            if !seen.insert(parent.name.as_str()) {
                let mut names: Vec<String> =
                    chain.iter().map(|i| i.name.clone()).collect();
                names.push(parent.name.clone());
                return Err(ModelError::InheritanceCycle {
                    interface: parent.name.clone(),
                    chain: names,
                });
            }

            chain.push(parent);
            current = parent;
        }

        chain.reverse();
        Ok(chain)
    }

    /// Every method callable on `interface`: the root ancestor's methods first,
    /// `interface`'s own methods last.
    ///
    /// Methods are not merged by name. A name declared by an ancestor and a
    /// descendant appears twice, in ancestor-then-descendant order.
    pub fn effective_methods<'a>(&'a self, interface: &'a Interface) -> ModelResult<Vec<&'a Method>> {
        let chain = self.ancestors(interface)?;
        let methods: Vec<&Method> = chain
            .into_iter()
            .flat_map(|ancestor| ancestor.methods().iter())
            .collect();
        log::trace!(
            "Linearized `{}` into {} methods",
            interface.name,
            methods.len()
        );
        Ok(methods)
    }
}
