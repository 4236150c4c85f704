//! Per-function name environment.
//!
//! The rewritten body shares a single flat namespace, so every binding
//! gets a collision-free output name: parameters keep their source
//! names, and later definitions take the smallest `name<k>` suffix that
//! is still free. The discard name `_` maps to itself and never
//! collides.

use fnv::{FnvHashMap, FnvHashSet};

use crate::error::{RewriteError, RewriteResult};
use crate::hir::{Binding, BindingId, BindingScope};

/// Generates `name`, `name1`, `name2`, ... candidates.
struct Namer {
    base: String,
    id: u32,
}

impl Namer {
    fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            id: 0,
        }
    }

    fn bump(&mut self) {
        self.id += 1;
    }

    fn current(&self) -> String {
        if self.id > 0 {
            format!("{}{}", self.base, self.id)
        } else {
            self.base.clone()
        }
    }
}

/// Scoped mapping from bindings to output identifiers.
#[derive(Debug, Default)]
pub struct NameEnv {
    assigned: FnvHashMap<BindingId, String>,
    in_use: FnvHashSet<String>,
}

impl NameEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a parameter under its source name. Parameters are closed
    /// over by the step function and are never renamed.
    pub fn register_parameter(&mut self, id: BindingId, name: &str) -> RewriteResult<()> {
        if self.in_use.contains(name) {
            return Err(RewriteError::invariant(format!(
                "parameter name {name:?} registered twice"
            )));
        }
        self.assigned.insert(id, name.to_string());
        self.in_use.insert(name.to_string());
        Ok(())
    }

    /// Assigns an output name to a defining occurrence. A second call
    /// on the same binding is caller misuse.
    pub fn define_local(&mut self, id: BindingId, source_name: &str) -> RewriteResult<String> {
        if source_name == "_" {
            return Ok("_".to_string());
        }
        if self.assigned.contains_key(&id) {
            return Err(RewriteError::invariant(format!(
                "binding for {source_name:?} defined twice"
            )));
        }
        let mut namer = Namer::new(source_name);
        while self.in_use.contains(&namer.current()) {
            namer.bump();
        }
        let name = namer.current();
        self.in_use.insert(name.clone());
        self.assigned.insert(id, name.clone());
        Ok(name)
    }

    /// Resolves a using occurrence to its output name. Imported package
    /// qualifiers pass through unrenamed.
    pub fn resolve(&self, id: BindingId, binding: &Binding) -> RewriteResult<String> {
        if binding.name == "_" {
            return Ok("_".to_string());
        }
        if let Some(name) = self.assigned.get(&id) {
            return Ok(name.clone());
        }
        if binding.scope == BindingScope::ImportedPackage {
            return Ok(binding.name.clone());
        }
        Err(RewriteError::invariant(format!(
            "no variable for {:?}",
            binding.name
        )))
    }

    /// The output names of every binding defined so far.
    pub fn assigned_names(&self) -> impl Iterator<Item = (&BindingId, &String)> {
        self.assigned.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::{BindingKind, GoType};
    use proptest::prelude::*;

    fn binding(name: &str, scope: BindingScope) -> Binding {
        Binding {
            name: name.to_string(),
            ty: GoType::basic("int"),
            kind: BindingKind::Var,
            scope,
            package: None,
        }
    }

    #[test]
    fn parameters_keep_their_source_names() {
        let mut env = NameEnv::new();
        env.register_parameter(BindingId(0), "stop").unwrap();
        let b = binding("stop", BindingScope::CurrentPackage);
        assert_eq!(env.resolve(BindingId(0), &b).unwrap(), "stop");
    }

    #[test]
    fn duplicate_parameter_is_an_invariant_error() {
        let mut env = NameEnv::new();
        env.register_parameter(BindingId(0), "x").unwrap();
        assert!(env.register_parameter(BindingId(1), "x").is_err());
    }

    #[test]
    fn colliding_locals_take_integer_suffixes() {
        let mut env = NameEnv::new();
        assert_eq!(env.define_local(BindingId(0), "i").unwrap(), "i");
        assert_eq!(env.define_local(BindingId(1), "i").unwrap(), "i1");
        assert_eq!(env.define_local(BindingId(2), "i").unwrap(), "i2");
    }

    #[test]
    fn locals_avoid_parameter_names() {
        let mut env = NameEnv::new();
        env.register_parameter(BindingId(0), "n").unwrap();
        assert_eq!(env.define_local(BindingId(1), "n").unwrap(), "n1");
    }

    #[test]
    fn discard_maps_to_itself_without_side_effects() {
        let mut env = NameEnv::new();
        assert_eq!(env.define_local(BindingId(0), "_").unwrap(), "_");
        assert_eq!(env.define_local(BindingId(1), "_").unwrap(), "_");
        // `_` never enters the in-use set, so a real name is untouched.
        assert_eq!(env.define_local(BindingId(2), "x").unwrap(), "x");
    }

    #[test]
    fn double_definition_is_caller_misuse() {
        let mut env = NameEnv::new();
        env.define_local(BindingId(0), "a").unwrap();
        assert!(env.define_local(BindingId(0), "a").is_err());
    }

    #[test]
    fn package_names_resolve_to_themselves() {
        let env = NameEnv::new();
        let pkg = binding("fmt", BindingScope::ImportedPackage);
        assert_eq!(env.resolve(BindingId(0), &pkg).unwrap(), "fmt");
    }

    #[test]
    fn unresolved_binding_fails() {
        let env = NameEnv::new();
        let b = binding("ghost", BindingScope::CurrentPackage);
        let err = env.resolve(BindingId(9), &b).unwrap_err();
        assert!(err.to_string().contains("no variable for"));
    }

    proptest! {
        /// Every defined binding gets a name no other binding has, and
        /// a second run over the same inputs picks identical names.
        #[test]
        fn defined_names_are_unique_and_stable(
            sources in proptest::collection::vec("[a-c]{1,2}", 1..24),
        ) {
            let run = || -> Vec<String> {
                let mut env = NameEnv::new();
                sources
                    .iter()
                    .enumerate()
                    .map(|(i, s)| {
                        env.define_local(BindingId(i as u32), s).unwrap()
                    })
                    .collect()
            };
            let first = run();
            let second = run();
            prop_assert_eq!(&first, &second);

            let mut seen = std::collections::HashSet::new();
            for name in &first {
                prop_assert!(seen.insert(name.clone()), "duplicate name {}", name);
            }
        }
    }
}
