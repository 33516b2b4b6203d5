use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use paramtree::{Parameter, ParameterTree, tree::ParameterKind};
use taskform::editors::Editors;

/// Lists the parameters a process descriptor builds, and whether each has an editor.
#[derive(Args, Debug)]
pub struct Command {
    /// Path to the process descriptor, as JSON.
    descriptor: PathBuf,
}

/// Runs the subcommand.
pub fn run(cmd: &Command, editors: &Editors, out: &mut dyn Write) -> Result<()> {
    let descriptor = super::load_descriptor(&cmd.descriptor)?;
    let tree = ParameterTree::build(&descriptor);
    render(&tree, editors, out).with_context(|| "writing parameters")
}

fn render(tree: &ParameterTree, editors: &Editors, out: &mut dyn Write) -> std::io::Result<()> {
    render_level(tree.parameters(), 0, editors, out)?;

    let blocking: Vec<String> = tree
        .unmanageable(editors)
        .into_iter()
        .filter(|u| u.mandatory)
        .map(|u| format!("{} ({})", u.id, u.binding))
        .collect();
    if blocking.is_empty() {
        writeln!(out, "manageable: yes")
    } else {
        writeln!(out, "manageable: no, missing editors for {}", blocking.join(", "))
    }
}

fn render_level(
    params: &[Parameter],
    depth: usize,
    editors: &Editors,
    out: &mut dyn Write,
) -> std::io::Result<()> {
    let indent = "  ".repeat(depth);
    for param in params {
        let bounds = format!(
            "{} of [{},{}]",
            param.occurrence_count(),
            param.min_occurs,
            param.max_occurs
        );
        match &param.kind {
            ParameterKind::Simple(simple) => {
                let save = serde_json::Value::Array(
                    simple.save.iter().map(|value| value.to_json()).collect(),
                );
                let editor = match editors.resolve(simple.binding.type_id()) {
                    Ok(spec) => spec.template.to_string(),
                    Err(_) => "none".to_owned(),
                };
                writeln!(
                    out,
                    "{indent}{} simple {}{} {bounds} save={save} editor={editor}",
                    param.id,
                    simple.binding,
                    if simple.is_array { "[]" } else { "" },
                )?;
            }
            ParameterKind::Group(group) => {
                writeln!(out, "{indent}{} group {bounds}", param.id)?;
                for occurrence in group.occurrences() {
                    render_level(occurrence, depth + 1, editors, out)?;
                }
            }
        }
    }
    Ok(())
}
