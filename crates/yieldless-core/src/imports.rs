//! Import-name mapping and output type naming.
//!
//! Emitted code refers to imported types through the local names the
//! source file gave them: an explicit alias when present, the last path
//! segment otherwise. Same-package names print bare; foreign names with
//! no import line fall back to the fully qualified `path.Name` form.

use fnv::FnvHashSet;
use indexmap::IndexMap;

use crate::hir::{GoType, ImportLine};

/// Mapping between package paths and the local names they are imported
/// under, plus the set of all local import names.
#[derive(Debug, Clone, Default)]
pub struct ImportNames {
    mapping: IndexMap<String, String>,
    names: FnvHashSet<String>,
}

impl ImportNames {
    pub fn from_imports(imports: &[ImportLine]) -> Self {
        let mut mapping = IndexMap::new();
        let mut names = FnvHashSet::default();
        for line in imports {
            let name = match &line.alias {
                Some(alias) => alias.clone(),
                None => last_segment(&line.path).to_string(),
            };
            names.insert(name.clone());
            mapping.insert(line.path.clone(), name);
        }
        Self { mapping, names }
    }

    /// The local name a package path is imported under, if any.
    pub fn local_name(&self, path: &str) -> Option<&str> {
        self.mapping.get(path).map(String::as_str)
    }

    /// Whether `name` is one of the file's import names.
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Renders a type the way the rewritten file must spell it.
    pub fn type_name(&self, current_package: &str, ty: &GoType) -> String {
        match ty {
            GoType::Basic(name) => name.clone(),
            GoType::Named {
                package,
                name,
                args,
            } => {
                let base = match package.as_deref() {
                    None => name.clone(),
                    Some(pkg) if pkg == current_package => name.clone(),
                    Some(pkg) => match self.local_name(pkg) {
                        Some(local) => format!("{local}.{name}"),
                        None => format!("{pkg}.{name}"),
                    },
                };
                if args.is_empty() {
                    base
                } else {
                    let args: Vec<String> = args
                        .iter()
                        .map(|a| self.type_name(current_package, a))
                        .collect();
                    format!("{base}[{}]", args.join(", "))
                }
            }
            GoType::Slice(elem) => {
                format!("[]{}", self.type_name(current_package, elem))
            }
            GoType::Array { len, elem } => {
                format!("[{len}]{}", self.type_name(current_package, elem))
            }
            GoType::Map { key, value } => format!(
                "map[{}]{}",
                self.type_name(current_package, key),
                self.type_name(current_package, value)
            ),
            GoType::Pointer(elem) => {
                format!("*{}", self.type_name(current_package, elem))
            }
            GoType::Chan(elem) => {
                format!("chan {}", self.type_name(current_package, elem))
            }
            GoType::Func { params, results } => {
                let params: Vec<String> = params
                    .iter()
                    .map(|p| self.type_name(current_package, p))
                    .collect();
                let mut out = format!("func({})", params.join(", "));
                match results.len() {
                    0 => {}
                    1 => {
                        out.push(' ');
                        out.push_str(&self.type_name(current_package, &results[0]));
                    }
                    _ => {
                        let results: Vec<String> = results
                            .iter()
                            .map(|r| self.type_name(current_package, r))
                            .collect();
                        out.push_str(&format!(" ({})", results.join(", ")));
                    }
                }
                out
            }
        }
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imports() -> ImportNames {
        ImportNames::from_imports(&[
            ImportLine {
                alias: None,
                path: "example.com/lib/colors".to_string(),
            },
            ImportLine {
                alias: Some("xyz".to_string()),
                path: "fmt".to_string(),
            },
        ])
    }

    #[test]
    fn alias_wins_over_path_segment() {
        let names = imports();
        assert_eq!(names.local_name("fmt"), Some("xyz"));
        assert_eq!(names.local_name("example.com/lib/colors"), Some("colors"));
        assert!(names.contains_name("xyz"));
        assert!(names.contains_name("colors"));
        assert!(!names.contains_name("fmt"));
    }

    #[test]
    fn same_package_types_print_bare() {
        let names = imports();
        let ty = GoType::named("example.com/demo", "Book", vec![]);
        assert_eq!(names.type_name("example.com/demo", &ty), "Book");
    }

    #[test]
    fn imported_types_use_the_local_name() {
        let names = imports();
        let ty = GoType::named("example.com/lib/colors", "RGB", vec![]);
        assert_eq!(names.type_name("example.com/demo", &ty), "colors.RGB");
    }

    #[test]
    fn unimported_foreign_types_fall_back_to_full_path() {
        let names = imports();
        let ty = GoType::named("example.com/other", "Thing", vec![]);
        assert_eq!(
            names.type_name("example.com/demo", &ty),
            "example.com/other.Thing"
        );
    }

    #[test]
    fn compound_types_render_structurally() {
        let names = imports();
        let ty = GoType::Map {
            key: Box::new(GoType::basic("string")),
            value: Box::new(GoType::Slice(Box::new(GoType::basic("int")))),
        };
        assert_eq!(names.type_name("p", &ty), "map[string][]int");

        let generic = GoType::named(
            "example.com/lib/colors",
            "Palette",
            vec![GoType::basic("int"), GoType::basic("string")],
        );
        assert_eq!(
            names.type_name("p", &generic),
            "colors.Palette[int, string]"
        );

        let arr = GoType::Array {
            len: 4,
            elem: Box::new(GoType::Pointer(Box::new(GoType::basic("byte")))),
        };
        assert_eq!(names.type_name("p", &arr), "[4]*byte");
    }
}
