use std::{cell::RefCell, rc::Rc};

use futures::{executor::block_on, join};
use googletest::prelude::*;
use map_macro::hashbrown::hash_map;
use paramtree::{ParamId, Value, descriptor::ProcessDescriptor, validate::Invalid};
use serde_json::json;

use super::*;
use crate::{
    notification::Notification,
    reference::{ReferenceCaches, ReferenceList},
    testutil::{
        FakeProcesses, FakeReferences, FakeTasks, FakeTransfer, FakeWps, SaveKind,
        clip_descriptor, count_descriptor, items, process, standard_editors, upload,
        wps_processes,
    },
    wps::WpsSource,
};

fn pid(s: &str) -> ParamId {
    ParamId::from(s)
}

fn new_editor() -> RefCell<TaskEditor> {
    RefCell::new(TaskEditor::new(Task::default(), standard_editors()))
}

/// Editor whose form for [process] is built from `descriptor`.
fn loaded_editor(task: Task, descriptor: ProcessDescriptor) -> RefCell<TaskEditor> {
    let editor = RefCell::new(TaskEditor::new(task, standard_editors()));
    {
        let mut editor = editor.borrow_mut();
        let ticket = editor.select_process(process());
        let _ = editor.apply_descriptor(ticket, Ok(descriptor));
    }
    editor
}

fn value(editor: &RefCell<TaskEditor>, id: &str, index: usize) -> Option<Value> {
    editor
        .borrow()
        .form()
        .and_then(|form| form.value(&pid(id), index).ok().cloned())
}

#[gtest]
#[test_log::test]
fn test_load_process_builds_form() -> Result<()> {
    let editor = new_editor();
    let client = FakeProcesses::default();
    client.responses.push(process(), Ok(clip_descriptor()));

    let outcome = block_on(TaskEditor::load_process(&editor, &client, process()))?;

    expect_that!(outcome, eq(&DescriptorOutcome::Applied(Default::default())));
    expect_that!(editor.borrow().selected_process().cloned(), some(eq(&process())));
    expect_that!(
        editor.borrow().form().map(|form| form.parameters().len()),
        some(eq(4))
    );
    Ok(())
}

#[gtest]
#[test_log::test]
fn test_stale_descriptor_response_is_ignored() -> Result<()> {
    let editor = new_editor();
    let client = FakeProcesses::default();
    let other = ProcessId::new("sis", "resample");

    // GIVEN: the first process's description arrives after the second one was selected.
    let slow = client.responses.push_gate(process());
    client.responses.push(other.clone(), Ok(count_descriptor()));

    // WHEN:
    let (first, second) = block_on(async {
        join!(
            TaskEditor::load_process(&editor, &client, process()),
            async {
                let second = TaskEditor::load_process(&editor, &client, other.clone()).await;
                slow.open(Ok(clip_descriptor()));
                second
            },
        )
    });

    // THEN: the form is the second process's.
    expect_that!(first?, eq(&DescriptorOutcome::Superseded));
    expect_that!(second?, eq(&DescriptorOutcome::Applied(Default::default())));
    let editor = editor.borrow();
    expect_that!(editor.selected_process().cloned(), some(eq(&other)));
    expect_that!(
        editor.form().map(|form| form.parameters()[0].name.clone()),
        some(eq("count"))
    );
    Ok(())
}

#[gtest]
fn test_selecting_process_discards_form() {
    let editor = loaded_editor(Task::default(), clip_descriptor());

    editor.borrow_mut().select_process(ProcessId::new("sis", "resample"));

    expect_that!(editor.borrow().form().is_none(), is_true());
}

#[gtest]
#[test_log::test]
fn test_descriptor_failure_notifies() {
    let editor = new_editor();
    let client = FakeProcesses::default();
    client.responses.push(process(), Err(ServiceError::default()));

    let result = block_on(TaskEditor::load_process(&editor, &client, process()));

    expect_that!(
        result,
        err(displays_as(eq("failed to describe process: service request failed")))
    );
    expect_that!(
        editor.borrow_mut().take_notifications(),
        elements_are![eq(&Notification::error("Unable to get the process description"))]
    );
    expect_that!(editor.borrow_mut().take_notifications(), is_empty());
}

#[gtest]
#[test_log::test]
fn test_open_restores_saved_inputs() -> Result<()> {
    let task: Task = serde_json::from_value(json!({
        "id": 7,
        "processAuthority": "sis",
        "processCode": "clip",
        "inputs": "{\"bands\":[{\"index\":[2]},{\"index\":[3]}],\"gone\":[1]}",
    }))?;
    let editor = RefCell::new(TaskEditor::new(task, standard_editors()));
    let caches = ReferenceCaches::new(Rc::new(FakeReferences::default()));
    let client = FakeProcesses::default();
    client.responses.push(process(), Ok(clip_descriptor()));

    let outcome = block_on(TaskEditor::open(&editor, &caches, &client))?;

    let Some(DescriptorOutcome::Applied(report)) = outcome else {
        return fail!("descriptor should be applied");
    };
    expect_that!(report.unmatched, elements_are![eq(&pid("gone"))]);
    let restored: hashbrown::HashMap<&str, Option<Value>> = ["bands_0_index", "bands_1_index"]
        .into_iter()
        .map(|id| (id, value(&editor, id, 0)))
        .collect();
    expect_that!(
        restored,
        eq(&hash_map! {
            "bands_0_index" => Some(Value::Integer(2)),
            "bands_1_index" => Some(Value::Integer(3)),
        })
    );
    Ok(())
}

#[gtest]
fn test_open_new_task_loads_nothing() -> Result<()> {
    let editor = new_editor();
    let caches = ReferenceCaches::new(Rc::new(FakeReferences::default()));
    let client = FakeProcesses::default();

    expect_that!(block_on(TaskEditor::open(&editor, &caches, &client))?, none());
    expect_that!(client.calls.is_empty(), is_true());
    Ok(())
}

#[gtest]
fn test_open_refetches_reference_lists() -> Result<()> {
    let references = Rc::new(FakeReferences::default());
    let caches = ReferenceCaches::new(references.clone());
    references.responses.push(
        ReferenceList::Styles,
        Ok(items(&[json!({"name": "default"})])),
    );
    block_on(caches.get(ReferenceList::Styles))?;
    references.responses.push(
        ReferenceList::Styles,
        Ok(items(&[json!({"name": "default"}), json!({"name": "heat"})])),
    );

    block_on(TaskEditor::open(&new_editor(), &caches, &FakeProcesses::default()))?;

    expect_that!(caches.cached(ReferenceList::Styles), none());
    let styles = block_on(caches.get(ReferenceList::Styles))?;
    expect_that!(styles.len(), eq(2));
    Ok(())
}

#[gtest]
fn test_occurrence_and_value_edits() -> Result<()> {
    let editor = loaded_editor(Task::default(), clip_descriptor());
    let mut editor = editor.borrow_mut();

    expect_that!(editor.add_occurrence(&pid("bands"))?, eq(2));
    editor.set_value(&pid("bands_1_index"), 0, Value::Integer(9))?;
    expect_that!(editor.push_value(&pid("bands_1_index"))?, eq(2));
    expect_that!(editor.remove_occurrence(&pid("bands"), 0)?, is_true());

    let index = editor.form().and_then(|form| form.value(&pid("bands_0_index"), 1).ok().cloned());
    expect_that!(index, some(eq(&Value::Integer(1))));
    expect_that!(
        editor.remove_value(&pid("bands_0_index"), 0)?,
        some(eq(&Value::Integer(9)))
    );
    expect_that!(
        editor.add_occurrence(&pid("style")),
        err(displays_as(eq("parameter style is not a group")))
    );
    Ok(())
}

#[gtest]
fn test_edits_without_form_fail() {
    let editor = new_editor();
    expect_that!(
        editor.borrow_mut().set_value(&pid("count"), 0, Value::Integer(1)),
        err(displays_as(eq("the process description has not been loaded")))
    );
}

#[gtest]
#[test_log::test]
fn test_resolve_choices_initialises_mandatory_slot() -> Result<()> {
    let editor = loaded_editor(Task::default(), clip_descriptor());
    let references = Rc::new(FakeReferences::default());
    let caches = ReferenceCaches::new(references.clone());
    references.responses.push(
        ReferenceList::Styles,
        Ok(items(&[json!({"name": "default"}), json!({"name": "heat"})])),
    );
    references.responses.push(
        ReferenceList::CrsCodes,
        Ok(items(&[json!({"code": "EPSG:4326"})])),
    );

    let style = block_on(TaskEditor::resolve_choices(&editor, &caches, &pid("style"), 0))?;
    let crs = block_on(TaskEditor::resolve_choices(&editor, &caches, &pid("crs"), 0))?;
    let count = block_on(TaskEditor::resolve_choices(&editor, &caches, &pid("bands_0_index"), 0))?;

    expect_that!(style.map(|c| c.len()), some(eq(2)));
    expect_that!(
        value(&editor, "style", 0),
        some(eq(&Value::Reference(json!({"name": "default"}))))
    );
    // The optional CRS has no value slot to fill.
    expect_that!(crs.map(|c| c.len()), some(eq(2)));
    expect_that!(count, none());
    Ok(())
}

#[gtest]
fn test_resolve_choices_without_editor_fails() {
    let descriptor: ProcessDescriptor = serde_json::from_value(json!({
        "descriptors": [{"name": "when", "class": "java.util.Date"}]
    }))
    .expect("valid descriptor");
    let editor = loaded_editor(Task::default(), descriptor);
    let caches = ReferenceCaches::new(Rc::new(FakeReferences::default()));

    let result = block_on(TaskEditor::resolve_choices(&editor, &caches, &pid("when"), 0));

    expect_that!(
        result,
        err(displays_as(eq("no editor registered for type \"java.util.Date\"")))
    );
}

#[gtest]
#[test_log::test]
fn test_choices_resolved_for_replaced_selection_are_ignored() -> Result<()> {
    let editor = loaded_editor(Task::default(), clip_descriptor());
    let references = Rc::new(FakeReferences::default());
    let caches = ReferenceCaches::new(references.clone());
    let gate = references.responses.push_gate(ReferenceList::Styles);

    let style = pid("style");

    // WHEN: the process is selected again while the styles are being fetched.
    let (choices, ()) = block_on(async {
        join!(
            TaskEditor::resolve_choices(&editor, &caches, &style, 0),
            async {
                editor.borrow_mut().select_process(process());
                gate.open(Ok(items(&[json!({"name": "default"})])));
            },
        )
    });

    // THEN: the result is dropped, but the list is cached for the next form.
    expect_that!(choices?, none());
    expect_that!(caches.cached(ReferenceList::Styles).map(|l| l.len()), some(eq(1)));
    Ok(())
}

#[gtest]
#[test_log::test]
fn test_upload_marks_slot_until_stored() -> Result<()> {
    let editor = loaded_editor(Task::default(), clip_descriptor());
    let transfer = FakeTransfer::default();
    let gate = transfer.responses.push_gate("roads.shp".into());

    let source = pid("source");

    // WHEN: the form is validated while the transfer is running.
    let (outcome, during) = block_on(async {
        join!(
            TaskEditor::upload_file(&editor, &transfer, &source, 0, upload("roads.shp")),
            async {
                let report = editor.borrow().validate();
                gate.open(Ok("\"/data/upload/roads.shp\"".into()));
                report
            },
        )
    });

    // THEN: the slot was reported as uploading, and now holds the stored path.
    let during = during.and_then(|report| report.diagnostic_for(&pid("source")).cloned());
    expect_that!(
        during.map(|d| d.error),
        some(eq(&Invalid::UploadInProgress {
            name: "source".into()
        }))
    );
    expect_that!(outcome?, eq(&UploadOutcome::Stored("/data/upload/roads.shp".into())));
    expect_that!(
        value(&editor, "source", 0),
        some(eq(&Value::from("/data/upload/roads.shp")))
    );
    expect_that!(editor.borrow().uploads().is_empty(), is_true());
    Ok(())
}

#[gtest]
#[test_log::test]
fn test_failed_upload_restores_and_notifies() -> Result<()> {
    let editor = loaded_editor(Task::default(), clip_descriptor());
    editor
        .borrow_mut()
        .set_value(&pid("source"), 0, Value::from("/data/old.shp"))?;
    let transfer = FakeTransfer::default();
    transfer.responses.push(
        "roads.shp".into(),
        Err(ServiceError::new("disk full")),
    );

    let result = block_on(TaskEditor::upload_file(
        &editor,
        &transfer,
        &pid("source"),
        0,
        upload("roads.shp"),
    ));

    expect_that!(result, err(displays_as(eq("failed to upload file: disk full"))));
    expect_that!(value(&editor, "source", 0), some(eq(&Value::from("/data/old.shp"))));
    expect_that!(
        editor.borrow_mut().take_notifications(),
        elements_are![eq(&Notification::error("Unable to upload data, cause: disk full"))]
    );
    Ok(())
}

#[gtest]
#[test_log::test]
fn test_cancelled_upload_restores_silently() -> Result<()> {
    let editor = loaded_editor(Task::default(), clip_descriptor());
    editor
        .borrow_mut()
        .set_value(&pid("source"), 0, Value::from("/data/old.shp"))?;
    let transfer = FakeTransfer::default();
    let _gate = transfer.responses.push_gate("roads.shp".into());

    let source = pid("source");
    let (outcome, cancelled) = block_on(async {
        join!(
            TaskEditor::upload_file(&editor, &transfer, &source, 0, upload("roads.shp")),
            async { editor.borrow().cancel_upload(&pid("source"), 0) },
        )
    });

    expect_that!(cancelled, is_true());
    expect_that!(outcome?, eq(&UploadOutcome::Cancelled));
    expect_that!(value(&editor, "source", 0), some(eq(&Value::from("/data/old.shp"))));
    expect_that!(editor.borrow_mut().take_notifications(), is_empty());
    Ok(())
}

#[gtest]
fn test_removing_earlier_value_keeps_uploading_slot_value() -> Result<()> {
    // GIVEN two source values, the second being replaced by a pending upload.
    let editor = loaded_editor(Task::default(), clip_descriptor());
    {
        let mut editor = editor.borrow_mut();
        editor.set_value(&pid("source"), 0, Value::from("/data/drop.shp"))?;
        let index = editor.push_value(&pid("source"))? - 1;
        editor.set_value(&pid("source"), index, Value::from("/data/keep.shp"))?;
    }
    let transfer = FakeTransfer::default();
    let _gate = transfer.responses.push_gate("roads.shp".into());

    // WHEN the first value is removed while the upload runs.
    let source = pid("source");
    let (outcome, removed) = block_on(async {
        join!(
            TaskEditor::upload_file(&editor, &transfer, &source, 1, upload("roads.shp")),
            async { editor.borrow_mut().remove_value(&pid("source"), 0) },
        )
    });

    // THEN the upload is dropped and the value it replaced survives the shift.
    expect_that!(removed?, some(eq(&Value::from("/data/drop.shp"))));
    expect_that!(outcome?, eq(&UploadOutcome::Discarded));
    expect_that!(value(&editor, "source", 0), some(eq(&Value::from("/data/keep.shp"))));
    expect_that!(value(&editor, "source", 1), none());
    expect_that!(editor.borrow().uploads().is_empty(), is_true());
    Ok(())
}

#[gtest]
fn test_upload_outlived_by_its_form_is_discarded() -> Result<()> {
    let editor = loaded_editor(Task::default(), clip_descriptor());
    let transfer = FakeTransfer::default();
    let gate = transfer.responses.push_gate("roads.shp".into());

    let source = pid("source");
    let (outcome, ()) = block_on(async {
        join!(
            TaskEditor::upload_file(&editor, &transfer, &source, 0, upload("roads.shp")),
            async {
                editor.borrow_mut().select_process(ProcessId::new("sis", "resample"));
                gate.open(Ok("/data/upload/roads.shp".into()));
            },
        )
    });

    expect_that!(outcome?, eq(&UploadOutcome::Discarded));
    expect_that!(editor.borrow().uploads().is_empty(), is_true());
    Ok(())
}

#[gtest]
fn test_submission_blocked_without_process_or_form() {
    let editor = new_editor();
    expect_that!(
        editor.borrow().prepare_submission(),
        err(displays_as(eq("no process selected")))
    );

    editor.borrow_mut().select_process(process());
    expect_that!(
        editor.borrow().prepare_submission(),
        err(displays_as(eq("the process description has not been loaded")))
    );
}

#[gtest]
fn test_submission_blocked_by_unmanageable_mandatory_parameter() {
    let descriptor: ProcessDescriptor = serde_json::from_value(json!({
        "descriptors": [
            {"name": "when", "class": "java.util.Date"},
            {"name": "note", "class": "com.example.Note", "minOccurs": 0},
        ]
    }))
    .expect("valid descriptor");
    let editor = loaded_editor(Task::default(), descriptor);

    expect_that!(editor.borrow().can_manage(), is_false());
    expect_that!(editor.borrow().unmanageable().len(), eq(2));
    expect_that!(
        editor.borrow().prepare_submission(),
        err(displays_as(eq("mandatory parameters without an editor: when")))
    );
}

#[gtest]
#[test_log::test]
fn test_invalid_form_blocks_save_and_notifies() {
    let editor = loaded_editor(Task::default(), clip_descriptor());
    let tasks = FakeTasks::default();

    let result = block_on(TaskEditor::save(&editor, &tasks));

    expect_that!(result, err(displays_as(eq("Parameter style is mandatory"))));
    expect_that!(tasks.calls.is_empty(), is_true());
    expect_that!(
        editor.borrow_mut().take_notifications(),
        elements_are![eq(&Notification::error("Parameter style is mandatory"))]
    );
}

#[gtest]
#[test_log::test]
fn test_create_succeeds() -> Result<()> {
    let editor = loaded_editor(Task::default(), count_descriptor());
    let tasks = FakeTasks::default();
    tasks.responses.push(SaveKind::Create, Ok(()));

    block_on(TaskEditor::save(&editor, &tasks))?;

    let calls = tasks.calls.calls();
    expect_that!(calls.len(), eq(1));
    let (kind, saved) = &calls[0];
    expect_that!(*kind, eq(SaveKind::Create));
    expect_that!(saved.process_id(), some(eq(&process())));
    expect_that!(saved.inputs, some(eq(&json!("{\"count\":[5]}"))));
    expect_that!(
        editor.borrow_mut().take_notifications(),
        elements_are![eq(&Notification::success("new task created with success."))]
    );
    Ok(())
}

#[gtest]
fn test_create_with_wps_process_uses_service_url() -> Result<()> {
    // GIVEN a process chosen from an external WPS service.
    let wps = FakeWps::default();
    let source = RefCell::new(WpsSource::new("http://geo.example/examind/"));
    let url = "http://other.example/wps";
    wps.processes.push(url.into(), Ok(wps_processes(&["vector:buffer"])));
    block_on(WpsSource::search_external(&source, &wps, url))?;
    source.borrow_mut().choose_process("vector:buffer");
    let Some(chosen) = source.borrow().selected_process() else {
        return fail!("a WPS process should be selected");
    };
    let editor = new_editor();
    let processes = FakeProcesses::default();
    processes.responses.push(chosen.clone(), Ok(count_descriptor()));
    block_on(TaskEditor::load_process(&editor, &processes, chosen))?;
    let tasks = FakeTasks::default();
    tasks.responses.push(SaveKind::Create, Ok(()));

    // WHEN the new task is saved.
    block_on(TaskEditor::save(&editor, &tasks))?;

    // THEN the service URL is the process authority.
    let calls = tasks.calls.calls();
    let (_, saved) = &calls[0];
    expect_that!(saved.process_authority, some(eq(url)));
    expect_that!(saved.process_code, some(eq("vector:buffer")));
    Ok(())
}

#[gtest]
#[test_log::test]
fn test_failed_create_forgets_process() {
    let editor = loaded_editor(Task::default(), count_descriptor());
    let tasks = FakeTasks::default();
    tasks
        .responses
        .push(SaveKind::Create, Err(ServiceError::default()));

    let result = block_on(TaskEditor::save(&editor, &tasks));

    expect_that!(result, err(anything()));
    expect_that!(editor.borrow().task().process_id(), none());
    expect_that!(
        editor.borrow_mut().take_notifications(),
        elements_are![eq(&Notification::error("Error to save the new task"))]
    );
}

#[gtest]
#[test_log::test]
fn test_failed_update_reports_service_message() {
    let task = Task {
        id: Some(3),
        process_authority: Some("sis".into()),
        process_code: Some("clip".into()),
        ..Default::default()
    };
    let editor = loaded_editor(task, count_descriptor());
    let tasks = FakeTasks::default();
    tasks
        .responses
        .push(SaveKind::Update, Err(ServiceError::new("task is running")));

    let result = block_on(TaskEditor::save(&editor, &tasks));

    expect_that!(result, err(displays_as(eq("failed to save task: task is running"))));
    expect_that!(editor.borrow().task().process_id(), some(eq(&process())));
    expect_that!(
        editor.borrow_mut().take_notifications(),
        elements_are![eq(&Notification::error("task is running"))]
    );
}

#[gtest]
fn test_successful_update_notifies() -> Result<()> {
    let task = Task {
        id: Some(3),
        process_authority: Some("sis".into()),
        process_code: Some("clip".into()),
        ..Default::default()
    };
    let editor = loaded_editor(task, count_descriptor());
    let tasks = FakeTasks::default();
    tasks.responses.push(SaveKind::Update, Ok(()));

    block_on(TaskEditor::save(&editor, &tasks))?;

    expect_that!(
        editor.borrow_mut().take_notifications(),
        elements_are![eq(&Notification::success("the task was updated successfully."))]
    );
    Ok(())
}
