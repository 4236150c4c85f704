//! Emission templates for the rewritten output.
//!
//! Each structured construct has one named template; the statement
//! lowerer fills in lowered fragments and the loop/branch ids. The
//! emitted text is flat on purpose: resumption labels must be legal
//! jump targets, so loops and conditionals become labels and gotos
//! rather than nested blocks. Output is not formatted here; that is
//! the caller's concern.

use crate::frames::LoopFrame;
use crate::state::StateSlot;

/// Joins fragments, dropping the empty ones so optional parts do not
/// leave blank lines behind.
fn join_lines(parts: &[&str]) -> String {
    let mut out = String::new();
    for part in parts {
        let part = part.trim_end_matches('\n');
        if part.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(part);
    }
    out
}

pub(crate) fn package_header(name: &str) -> String {
    format!("package {name}\n")
}

/// Everything the `function` template needs.
pub(crate) struct FunctionData<'a> {
    pub name: &'a str,
    /// Parameter list and result type, rendered, without `func Name`.
    pub signature: &'a str,
    pub item_type: &'a str,
    pub state: &'a [StateSlot],
    pub extra_state: &'a [String],
    pub tags: Vec<u32>,
    pub body: &'a str,
    pub runtime: &'a str,
}

pub(crate) fn function(data: &FunctionData<'_>) -> String {
    let mut out = String::new();
    out.push_str(&format!("func {}{} {{\n", data.name, data.signature));
    out.push_str("\t__next := 0\n");
    for slot in data.state {
        out.push_str(&format!("\tvar {} {}\n", slot.name, slot.ty));
    }
    for decl in data.extra_state {
        out.push_str(&format!("\t{decl}\n"));
    }
    out.push_str(&format!(
        "\treturn {}.NewGenerator(func() (__hasValue bool, __value {}, __err error) {{\n",
        data.runtime, data.item_type
    ));
    out.push_str("\t\tswitch __next {\n");
    for tag in &data.tags {
        out.push_str(&format!("\t\tcase {tag}:\n\t\t\tgoto __Next{tag}\n"));
    }
    out.push_str("\t\t}\n");
    out.push_str("\t__Next0:\n");
    for line in data.body.lines() {
        if line.is_empty() {
            continue;
        }
        out.push_str("\t\t");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("\t\treturn false, __value, __err\n");
    out.push_str("\t})\n");
    out.push_str("}\n");
    out
}

/// Suspend: store the resumption tag, report the value, and leave a
/// label at the point execution continues from.
pub(crate) fn yield_point(value: &str, next: u32) -> String {
    format!("__next = {next}\nreturn true, {value}, nil\n__Next{next}:")
}

/// Terminate: record the error/termination value and leave through the
/// step function's exit.
pub(crate) fn terminating_return(value: &str) -> String {
    format!("__err = {value}\nreturn false, __value, __err")
}

pub(crate) fn cond_if(id: u32, init: &str, cond: &str, then: &str, els: &str) -> String {
    join_lines(&[
        init,
        &format!("if !({cond}) {{\n\tgoto __Else{id}\n}}"),
        then,
        &format!("goto __EndIf{id}"),
        &format!("__Else{id}:"),
        els,
        &format!("__EndIf{id}:"),
    ])
}

/// Loop with no init, condition, or step.
pub(crate) fn forever_loop(frame: &LoopFrame, body: &str) -> String {
    let id = frame.id;
    let after = if frame.has_break {
        format!("__After{id}:")
    } else {
        String::new()
    };
    join_lines(&[
        &format!("__Continue{id}:"),
        body,
        &format!("goto __Continue{id}"),
        &after,
    ])
}

/// C-style loop; any of init/cond/post may be absent.
pub(crate) fn for_loop(
    frame: &LoopFrame,
    init: &str,
    cond: Option<&str>,
    post: &str,
    body: &str,
) -> String {
    let id = frame.id;
    let test = match cond {
        Some(cond) => format!("if !({cond}) {{\n\tgoto __After{id}\n}}"),
        None => String::new(),
    };
    let after = if cond.is_some() || frame.has_break {
        format!("__After{id}:")
    } else {
        String::new()
    };
    join_lines(&[
        init,
        &format!("__Continue{id}:"),
        &test,
        body,
        post,
        &format!("goto __Continue{id}"),
        &after,
    ])
}

/// Range loop over a synthesized adapter. Shared between the keyed
/// mapping and ordered sequence cases; only the constructor differs.
pub(crate) fn range_loop(
    frame: &LoopFrame,
    adapter: &str,
    ctor_call: &str,
    key: &str,
    value: &str,
    body: &str,
) -> String {
    let id = frame.id;
    join_lines(&[
        &format!("{adapter} = {ctor_call}"),
        &format!("__Continue{id}:"),
        &format!("if !{adapter}.Next() {{\n\tgoto __After{id}\n}}"),
        &format!("{key}, {value} = {adapter}.Value()"),
        body,
        &format!("goto __Continue{id}"),
        &format!("__After{id}:"),
    ])
}

/// Bracketed comment standing in for a construct the rewriter does not
/// handle; the dump carries the offending node.
pub(crate) fn unsupported(dump: &str) -> String {
    format!("/* unsupported construct:\n{dump}\n*/")
}
