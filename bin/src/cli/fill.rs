use std::{fs::File, io::Write, path::PathBuf, rc::Rc, str::FromStr};

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use paramtree::{ParamId, convert};
use taskform::{
    SaveBlocked, Task, TaskEditor,
    editors::Editors,
    process::ProcessId,
    session::DescriptorOutcome,
};

/// Fills the form of a process and prints the task that saving it would submit.
#[derive(Args, Debug)]
pub struct Command {
    /// Path to the process descriptor, as JSON.
    descriptor: PathBuf,

    /// Process to fill the form of, as authority:code. Defaults to the process of --task.
    #[arg(long)]
    process: Option<ProcessId>,

    /// Path to a saved task, as JSON. Its inputs are restored into the form when it was saved
    /// with the same process. Without it, a new task is filled.
    #[arg(long)]
    task: Option<PathBuf>,

    /// Adds an occurrence to a group parameter. Applied before any --set.
    #[arg(long)]
    add_occurrence: Vec<String>,

    /// Sets a value, as ID[:INDEX]=VALUE. VALUE is read as JSON, or else as a string, and then
    /// converted to the parameter's binding. Setting the index just past the last value appends
    /// a value.
    #[arg(long)]
    set: Vec<Assignment>,
}

/// Runs the subcommand.
pub fn run(cmd: &Command, editors: Editors, out: &mut dyn Write) -> Result<()> {
    let descriptor = super::load_descriptor(&cmd.descriptor)?;
    let task = match &cmd.task {
        Some(path) => load_task(path)?,
        None => Task::default(),
    };
    let process = cmd
        .process
        .clone()
        .or_else(|| task.process_id())
        .ok_or_else(|| anyhow!("--process must be specified, as the task names no process"))?;

    let mut editor = TaskEditor::new(task, Rc::new(editors));
    let ticket = editor.select_process(process);
    if let DescriptorOutcome::Applied(report) = editor.apply_descriptor(ticket, Ok(descriptor))? {
        for key in &report.unmatched {
            log::warn!("Saved input {key:?} has no parameter in the form.");
        }
    }

    for group in &cmd.add_occurrence {
        editor
            .add_occurrence(&ParamId::from(group.as_str()))
            .with_context(|| format!("adding an occurrence to {group}"))?;
    }
    for assignment in &cmd.set {
        assign(&mut editor, assignment).with_context(|| format!("setting {assignment}"))?;
    }

    match editor.prepare_submission() {
        Ok(task) => {
            serde_json::to_writer_pretty(&mut *out, &task).with_context(|| "writing task")?;
            writeln!(out)?;
            Ok(())
        }
        Err(SaveBlocked::Invalid(report)) => {
            for diagnostic in &report.diagnostics {
                match diagnostic.index {
                    Some(index) => writeln!(out, "{}[{index}]: {diagnostic}", diagnostic.id)?,
                    None => writeln!(out, "{}: {diagnostic}", diagnostic.id)?,
                }
            }
            bail!("the form is not valid")
        }
        Err(blocked) => Err(blocked.into()),
    }
}

fn load_task(path: &std::path::Path) -> Result<Task> {
    let file = File::open(path).with_context(|| format!("opening task {path:?}"))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("parsing task {path:?}"))
}

fn assign(editor: &mut TaskEditor, assignment: &Assignment) -> Result<()> {
    let (binding, count) = {
        let form = editor
            .form()
            .ok_or_else(|| anyhow!("the process has no form"))?;
        let param = form
            .find(&assignment.id)
            .ok_or_else(|| anyhow!("no parameter with id {}", assignment.id))?;
        let simple = param
            .as_simple()
            .ok_or_else(|| anyhow!("{} is not a simple parameter", assignment.id))?;
        (simple.binding.clone(), simple.save.len())
    };

    if assignment.index == count {
        editor.push_value(&assignment.id)?;
    }
    let value = convert::convert(&assignment.raw, &binding);
    editor.set_value(&assignment.id, assignment.index, value)?;
    Ok(())
}

/// `--set` argument that does not have the form ID[:INDEX]=VALUE.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
#[error("{0:?} is not of the form ID[:INDEX]=VALUE")]
pub struct InvalidAssignment(String);

/// A value to put in a slot of a simple parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    id: ParamId,
    index: usize,
    raw: serde_json::Value,
}

impl FromStr for Assignment {
    type Err = InvalidAssignment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidAssignment(s.to_owned());
        let (target, raw) = s.split_once('=').ok_or_else(invalid)?;
        // Ids may themselves contain ':', so only a numeric suffix is an index.
        let (id, index) = target
            .rsplit_once(':')
            .and_then(|(id, index)| Some((id, index.parse::<usize>().ok()?)))
            .unwrap_or((target, 0));
        if id.is_empty() {
            return Err(invalid());
        }
        let raw = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_owned()));
        Ok(Self {
            id: ParamId::from(id),
            index,
            raw,
        })
    }
}

impl std::fmt::Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}={}", self.id, self.index, self.raw)
    }
}
