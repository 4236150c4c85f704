//! Function assembly.
//!
//! Validates the generator's declared shape, runs the statement lowerer
//! over its body, and composes signature, persistent state, resumption
//! dispatch, and lowered body into the complete replacement function.

use crate::error::{ResultExt, RewriteError, RewriteResult};
use crate::hir::{FuncDecl, GoType, SourceFile};
use crate::imports::ImportNames;
use crate::lower::FuncLowerer;
use crate::templates::{self, FunctionData};
use crate::RewriteConfig;

/// The replacement for one generator function.
#[derive(Debug, Clone)]
pub struct RewrittenFunction {
    pub name: String,
    /// Complete replacement function definition.
    pub source: String,
    pub yield_count: u32,
    /// Summaries of constructs replaced by unsupported-comments.
    pub unsupported: Vec<String>,
}

/// Rewrites a single generator function into its iterator form.
pub(crate) fn rewrite_function(
    file: &SourceFile,
    config: &RewriteConfig,
    imports: &ImportNames,
    func: &FuncDecl,
) -> RewriteResult<RewrittenFunction> {
    let item = item_type(config, func).ctx(format!("in function '{}'", func.name))?;

    let mut lowerer = FuncLowerer::new(file, config, imports);
    for param in &func.params {
        lowerer
            .register_parameter(param)
            .ctx(format!("in function '{}'", func.name))?;
    }

    let body = lowerer
        .lower_body(&func.body)
        .ctx(format!("in function '{}'", func.name))?;

    let signature = render_signature(file, imports, func);
    let item_type = imports.type_name(&file.package_path, item);
    let state = lowerer.state.sorted_slots();
    let source = templates::function(&FunctionData {
        name: &func.name,
        signature: &signature,
        item_type: &item_type,
        state: &state,
        extra_state: lowerer.state.adapter_decls(),
        tags: lowerer.yields.tags().collect(),
        body: &body,
        runtime: &config.runtime_name,
    });

    tracing::debug!(
        function = %func.name,
        yields = lowerer.yields.max(),
        state_slots = state.len(),
        "rewrote generator function"
    );

    Ok(RewrittenFunction {
        name: func.name.clone(),
        source,
        yield_count: lowerer.yields.max(),
        unsupported: lowerer.unsupported_notes().to_vec(),
    })
}

/// The item type `T` of a `Generator[T]` result. The result list must
/// hold exactly one entry of the configured placeholder type.
fn item_type<'f>(config: &RewriteConfig, func: &'f FuncDecl) -> RewriteResult<&'f GoType> {
    if func.results.len() != 1 {
        return Err(RewriteError::malformed(format!(
            "expected a single result, got {}",
            func.results.len()
        )));
    }
    match &func.results[0] {
        GoType::Named {
            package: Some(package),
            name,
            args,
        } if *package == config.generator_type.package
            && *name == config.generator_type.name =>
        {
            args.first().ok_or_else(|| {
                RewriteError::malformed("generator type carries no item type argument")
            })
        }
        _ => Err(RewriteError::malformed(
            "result type is not the generator placeholder",
        )),
    }
}

/// Parameter list and result type, spelled the way the source spelled
/// them. Parameters are never renamed.
fn render_signature(file: &SourceFile, imports: &ImportNames, func: &FuncDecl) -> String {
    let params: Vec<String> = func
        .params
        .iter()
        .map(|p| format!("{} {}", p.name, imports.type_name(&file.package_path, &p.ty)))
        .collect();
    let result = imports.type_name(&file.package_path, &func.results[0]);
    format!("({}) {result}", params.join(", "))
}
