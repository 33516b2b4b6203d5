//! Editing session of a single task: process selection, the parameter form, uploads and saving.
//!
//! The session is shared as a `RefCell<TaskEditor>` between the operations running on the
//! current thread. Asynchronous operations take that cell and only borrow it between awaits, so
//! other operations (including a new process selection) may run while they are suspended.
//! Responses to a selection that has since been replaced are ignored.

#[cfg(test)]
mod tests;

use std::{cell::RefCell, rc::Rc};

use futures::future::{Abortable, Aborted};
use paramtree::{
    ParamId, ParameterTree, Value,
    descriptor::ProcessDescriptor,
    reconcile::{self, RestoreReport},
    tree::{TreeError, Unmanageable},
    validate::{self, ValidationReport},
};

use crate::{
    editors::{Choices, EditorInstance, Editors},
    error::{SaveBlocked, TaskFormError},
    notification::Notification,
    process::ProcessId,
    reference::ReferenceCaches,
    services::{FileTransfer, ProcessClient, ServiceError, TaskService, UploadFile},
    task::Task,
    upload::{self, UploadTracker},
};

const DESCRIBE_FAILED: &str = "Unable to get the process description";
const UPDATE_FAILED: &str = "Error to save the task";
const CREATE_FAILED: &str = "Error to save the new task";
const UPDATED: &str = "the task was updated successfully.";
const CREATED: &str = "new task created with success.";

/// Identifies one process selection. Only the latest selection may apply its descriptor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectionTicket {
    generation: u64,
    pub process: ProcessId,
}

/// Result of handing a descriptor response to the session.
#[derive(Debug, PartialEq)]
pub enum DescriptorOutcome {
    /// The form was built, and the task's saved inputs restored into it.
    Applied(RestoreReport),
    /// Another process was selected meanwhile; the response was dropped.
    Superseded,
}

/// Result of a file upload into a value slot.
#[derive(Debug, Eq, PartialEq)]
pub enum UploadOutcome {
    /// The slot now holds the stored path.
    Stored(String),
    /// The upload was cancelled and the previous value put back.
    Cancelled,
    /// The upload was replaced by another one, or cancelled by a form change that already put
    /// the previous value back. The slot was left alone.
    Discarded,
}

/// State of one task editing session.
pub struct TaskEditor {
    task: Task,
    editors: Rc<Editors>,
    generation: u64,
    selected: Option<ProcessId>,
    form: Option<ParameterTree>,
    instances: hashbrown::HashMap<(ParamId, usize), Rc<EditorInstance>>,
    uploads: UploadTracker,
    notifications: Vec<Notification>,
}

impl TaskEditor {
    /// Starts editing `task`. A task that names a process starts with that process selected.
    pub fn new(task: Task, editors: Rc<Editors>) -> Self {
        let selected = task.process_id();
        Self {
            task,
            editors,
            generation: 0,
            selected,
            form: None,
            instances: Default::default(),
            uploads: UploadTracker::new(),
            notifications: Vec::new(),
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn selected_process(&self) -> Option<&ProcessId> {
        self.selected.as_ref()
    }

    /// The parameter form, once the selected process's descriptor is applied.
    pub fn form(&self) -> Option<&ParameterTree> {
        self.form.as_ref()
    }

    pub fn uploads(&self) -> &UploadTracker {
        &self.uploads
    }

    /// Selects `process`, discarding the current form and cancelling its uploads. The returned
    /// ticket is needed to apply the process's descriptor.
    pub fn select_process(&mut self, process: ProcessId) -> SelectionTicket {
        self.generation += 1;
        log::debug!("Selecting process {process} (selection {}).", self.generation);
        self.selected = Some(process.clone());
        self.form = None;
        self.instances.clear();
        self.uploads.cancel_all();
        SelectionTicket {
            generation: self.generation,
            process,
        }
    }

    /// Builds the form from a descriptor response to the selection of `ticket`.
    ///
    /// When the task was saved with the same process, its inputs are restored into the new form.
    pub fn apply_descriptor(
        &mut self,
        ticket: SelectionTicket,
        response: Result<ProcessDescriptor, ServiceError>,
    ) -> Result<DescriptorOutcome, TaskFormError> {
        if ticket.generation != self.generation {
            log::warn!(
                "Ignoring descriptor of {} from a replaced selection.",
                ticket.process
            );
            return Ok(DescriptorOutcome::Superseded);
        }

        let descriptor = match response {
            Ok(descriptor) => descriptor,
            Err(err) => {
                log::error!("Failed to describe process {}: {err}", ticket.process);
                self.notify(Notification::error(err.message_or(DESCRIBE_FAILED)));
                return Err(TaskFormError::DescriptorFetchFailed(err));
            }
        };

        let mut form = ParameterTree::build(&descriptor);
        let mut report = RestoreReport::default();
        if self.task.process_id().as_ref() == Some(&ticket.process) {
            match self.task.input_payload() {
                Ok(Some(inputs)) => {
                    report = reconcile::restore(&inputs, form.parameters_mut());
                }
                Ok(None) => {}
                Err(err) => log::warn!("Not restoring inputs of task: {err}"),
            }
        }

        log::info!(
            "Applied descriptor of {} with {} parameter(s).",
            ticket.process,
            form.parameters().len()
        );
        self.form = Some(form);
        Ok(DescriptorOutcome::Applied(report))
    }

    /// Selects `process` and loads its descriptor.
    pub async fn load_process(
        editor: &RefCell<TaskEditor>,
        client: &dyn ProcessClient,
        process: ProcessId,
    ) -> Result<DescriptorOutcome, TaskFormError> {
        let ticket = editor.borrow_mut().select_process(process.clone());
        let response = client.describe_process(&process).await;
        editor.borrow_mut().apply_descriptor(ticket, response)
    }

    /// Starts the session: reference lists are fetched afresh, and the descriptor of the process
    /// the task was saved with, if any, is loaded.
    pub async fn open(
        editor: &RefCell<TaskEditor>,
        caches: &ReferenceCaches,
        client: &dyn ProcessClient,
    ) -> Result<Option<DescriptorOutcome>, TaskFormError> {
        caches.refresh_all();
        let process = editor.borrow().task.process_id();
        match process {
            Some(process) => Self::load_process(editor, client, process)
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    fn form_mut(&mut self) -> Result<&mut ParameterTree, SaveBlocked> {
        self.form.as_mut().ok_or(SaveBlocked::NoForm)
    }

    /// Replaces the value at `index` of a simple parameter.
    pub fn set_value(&mut self, id: &ParamId, index: usize, value: Value) -> Result<(), TaskFormError> {
        self.form_mut()?.set_value(id, index, value)?;
        Ok(())
    }

    /// Adds a value to a simple parameter, starting from its default. Returns the new value
    /// count.
    pub fn push_value(&mut self, id: &ParamId) -> Result<usize, TaskFormError> {
        let form = self.form_mut()?;
        let default = form
            .find(id)
            .and_then(|param| param.as_simple())
            .map(|simple| simple.default.clone())
            .unwrap_or_default();
        Ok(form.push_value(id, default)?)
    }

    /// Removes the value at `index` of a simple parameter. Uploads into the parameter are
    /// cancelled first, and the values they replaced put back, as its slots move.
    pub fn remove_value(&mut self, id: &ParamId, index: usize) -> Result<Option<Value>, TaskFormError> {
        if self.form_mut()?.value(id, index).is_ok() {
            self.cancel_uploads_within(id);
        }
        let removed = self.form_mut()?.remove_value(id, index)?;
        if removed.is_some() {
            self.forget_instances_within(id);
        }
        Ok(removed)
    }

    /// Adds an occurrence to a group. Returns the new occurrence count.
    pub fn add_occurrence(&mut self, group: &ParamId) -> Result<usize, TaskFormError> {
        let count = self.form_mut()?.get_mut(group)?.add_occurrence()?;
        log::debug!("Group {group} now has {count} occurrence(s).");
        Ok(count)
    }

    /// Removes occurrence `index` of a group. Uploads into the group are cancelled first, and
    /// the values they replaced put back, as the ids of later occurrences change.
    pub fn remove_occurrence(&mut self, group: &ParamId, index: usize) -> Result<bool, TaskFormError> {
        let present = self
            .form_mut()?
            .get_mut(group)?
            .as_group()
            .is_some_and(|occurrences| index < occurrences.len());
        if present {
            self.cancel_uploads_within(group);
        }
        let removed = self
            .form_mut()?
            .get_mut(group)?
            .remove_occurrence(index)?
            .is_some();
        if removed {
            self.forget_instances_within(group);
        }
        Ok(removed)
    }

    /// Cancels uploads into `id` or below it, putting back the values they replaced.
    fn cancel_uploads_within(&mut self, id: &ParamId) {
        let restored = self.uploads.cancel_within(id);
        let Some(form) = self.form.as_mut() else {
            return;
        };
        for (slot_id, index, previous) in restored {
            if let Err(err) = form.set_value(&slot_id, index, previous) {
                log::warn!("Cannot restore {slot_id}[{index}] after cancelling its upload: {err}");
            }
        }
    }

    fn forget_instances_within(&mut self, id: &ParamId) {
        self.instances
            .retain(|(slot_id, _), _| !(slot_id == id || slot_id.is_within(id)));
    }

    /// The editor of slot `index` of a simple parameter, created on first use.
    pub fn instance(&mut self, id: &ParamId, index: usize) -> Result<Rc<EditorInstance>, TaskFormError> {
        let key = (id.clone(), index);
        if let Some(instance) = self.instances.get(&key) {
            return Ok(instance.clone());
        }

        let form = self.form.as_ref().ok_or(SaveBlocked::NoForm)?;
        let param = form
            .find(id)
            .ok_or_else(|| TreeError::UnknownParameter(id.clone()))?;
        let simple = param
            .as_simple()
            .ok_or_else(|| TreeError::NotASimple(id.clone()))?;
        let spec = self.editors.resolve(simple.binding.type_id())?;

        let instance = Rc::new(EditorInstance::new(id.clone(), index, spec));
        self.instances.insert(key, instance.clone());
        Ok(instance)
    }

    /// Resolves the choices of the editor of slot `index` of `id`, and gives the slot its
    /// initial value if it has none. Returns `None` for editors without a reference list, and
    /// when the form was replaced while the list was being fetched.
    pub async fn resolve_choices(
        editor: &RefCell<TaskEditor>,
        caches: &ReferenceCaches,
        id: &ParamId,
        index: usize,
    ) -> Result<Option<Choices>, TaskFormError> {
        let (generation, instance) = {
            let mut editor = editor.borrow_mut();
            (editor.generation, editor.instance(id, index)?)
        };

        let items = instance
            .items(caches)
            .await
            .map_err(TaskFormError::ReferenceFetchFailed)?;
        let Some(items) = items else {
            return Ok(None);
        };

        let mut editor = editor.borrow_mut();
        if editor.generation != generation {
            log::warn!("Ignoring choices of {id}[{index}] from a replaced selection.");
            return Ok(None);
        }
        let Some(form) = editor.form.as_mut() else {
            return Ok(None);
        };
        let Some(param) = form.find_mut(id) else {
            log::warn!("Ignoring choices of {id}[{index}], which no longer exists.");
            return Ok(None);
        };
        let Some(choices) = instance.choices(&items, param) else {
            return Ok(None);
        };
        if let Some(slot) = param
            .as_simple_mut()
            .and_then(|simple| simple.save.get_mut(index))
        {
            if choices.fill_unset(slot) {
                log::debug!("Initialised {id}[{index}] to {:?}.", choices.initial);
            }
        }
        Ok(Some(choices))
    }

    /// Makes the editor of slot `index` of `id` fetch its reference list again.
    pub fn refresh_editor(
        &mut self,
        caches: &ReferenceCaches,
        id: &ParamId,
        index: usize,
    ) -> Result<(), TaskFormError> {
        self.instance(id, index)?.refresh(caches);
        Ok(())
    }

    /// Uploads `file` into slot `index` of `id`.
    ///
    /// The slot is cleared, and reported as uploading by validation, until the transfer ends. A
    /// failed transfer puts the previous value back and notifies the user. A cancelled one puts
    /// the previous value back silently.
    pub async fn upload_file(
        editor: &RefCell<TaskEditor>,
        transfer: &dyn FileTransfer,
        id: &ParamId,
        index: usize,
        file: UploadFile,
    ) -> Result<UploadOutcome, TaskFormError> {
        let (ticket, registration) = {
            let mut editor = editor.borrow_mut();
            let form = editor.form_mut()?;
            let previous = form.value(id, index)?.clone();
            form.set_value(id, index, Value::Null)?;
            editor.uploads.begin(id, index, previous)
        };
        log::debug!("Uploading {} into {id}[{index}].", file.name);

        let result = Abortable::new(
            async {
                let channel = transfer.create_channel().await?;
                transfer.transfer(&channel, &file).await
            },
            registration,
        )
        .await;

        let mut editor = editor.borrow_mut();
        let Some(previous) = editor.uploads.finish(&ticket) else {
            log::debug!("Upload into {id}[{index}] was discarded.");
            return Ok(UploadOutcome::Discarded);
        };

        match result {
            Ok(Ok(response)) => {
                let path = upload::stored_path(&response);
                editor.set_value(id, index, Value::from(path.as_str()))?;
                log::info!("Uploaded {} to {path}.", file.name);
                Ok(UploadOutcome::Stored(path))
            }
            Ok(Err(err)) => {
                log::error!("Failed to upload {}: {err}", file.name);
                editor.set_value(id, index, previous)?;
                editor.notify(Notification::error(format!(
                    "Unable to upload data, cause: {err}"
                )));
                Err(TaskFormError::UploadFailed(err))
            }
            Err(Aborted) => {
                log::debug!("Upload of {} was cancelled.", file.name);
                editor.set_value(id, index, previous)?;
                Ok(UploadOutcome::Cancelled)
            }
        }
    }

    /// Cancels the upload into a slot. Returns true if one was running.
    pub fn cancel_upload(&self, id: &ParamId, index: usize) -> bool {
        self.uploads.cancel(id, index)
    }

    /// Ends the session without saving: pending uploads are cancelled.
    pub fn close(&mut self) {
        self.uploads.cancel_all();
    }

    /// Simple parameters of the form without an editor.
    pub fn unmanageable(&self) -> Vec<Unmanageable> {
        self.form
            .as_ref()
            .map(|form| form.unmanageable(self.editors.as_ref()))
            .unwrap_or_default()
    }

    /// True if every mandatory parameter of the form has an editor.
    pub fn can_manage(&self) -> bool {
        self.form.is_some() && self.unmanageable().iter().all(|u| !u.mandatory)
    }

    /// Validates the form as it stands.
    pub fn validate(&self) -> Option<ValidationReport> {
        self.form
            .as_ref()
            .map(|form| validate::validate_tree(form.parameters(), &self.uploads))
    }

    /// The task as it would be saved: the selected process, and the form serialized as its
    /// inputs.
    pub fn prepare_submission(&self) -> Result<Task, SaveBlocked> {
        let process = self.selected.as_ref().ok_or(SaveBlocked::NoProcessSelected)?;
        let form = self.form.as_ref().ok_or(SaveBlocked::NoForm)?;

        let blocking: Vec<ParamId> = form
            .unmanageable(self.editors.as_ref())
            .into_iter()
            .filter(|u| u.mandatory)
            .map(|u| u.id)
            .collect();
        if !blocking.is_empty() {
            return Err(SaveBlocked::Unmanageable(blocking));
        }

        let serialized = reconcile::serialize(form.parameters(), &self.uploads);
        if !serialized.is_valid() {
            return Err(SaveBlocked::Invalid(serialized.report));
        }

        let mut task = self.task.clone();
        task.set_process(process);
        task.set_input_payload(serialized.payload);
        Ok(task)
    }

    /// Saves the task, creating it if it is new.
    ///
    /// The outcome is also reported as a notification. When creating fails, the task forgets its
    /// process so that the next attempt takes the current selection again.
    pub async fn save(
        editor: &RefCell<TaskEditor>,
        service: &dyn TaskService,
    ) -> Result<(), TaskFormError> {
        let task = {
            let mut editor = editor.borrow_mut();
            match editor.prepare_submission() {
                Ok(task) => {
                    editor.task = task.clone();
                    task
                }
                Err(blocked) => {
                    log::warn!("Not saving task: {blocked}");
                    editor.notify(Notification::error(blocked.to_string()));
                    return Err(blocked.into());
                }
            }
        };

        let is_new = task.is_new();
        let result = if is_new {
            service.create(&task).await
        } else {
            service.update(&task).await
        };

        let mut editor = editor.borrow_mut();
        match result {
            Ok(()) => {
                log::info!("Saved task for process {:?}.", task.process_id());
                editor.notify(Notification::success(if is_new { CREATED } else { UPDATED }));
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to save task: {err}");
                let fallback = if is_new { CREATE_FAILED } else { UPDATE_FAILED };
                if is_new {
                    editor.task.clear_process();
                }
                editor.notify(Notification::error(err.message_or(fallback)));
                Err(TaskFormError::SubmissionFailed(err))
            }
        }
    }

    fn notify(&mut self, notification: Notification) {
        log::debug!("Notifying: {notification}");
        self.notifications.push(notification);
    }

    /// Notifications raised since the last call.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}
