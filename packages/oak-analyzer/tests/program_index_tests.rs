//! Program index: full rescans, incremental updates, cycles and the
//! rebuild threshold

mod common;

use common::*;
use oak_analyzer::features::program_index::{IndexState, RebuildReason};
use oak_analyzer::{AnalyzerError, UpdateOutcome};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn entities(index: &oak_analyzer::TriggerIndex) -> Vec<String> {
    index.definitions().iter().map(|d| d.entity.clone()).collect()
}

fn standard_project() -> Project {
    let project = Project::new();
    project.write(
        TRIGGERS_ENTRY,
        r#"
import userTriggers from './user';
import { orderTriggers } from './order';

export default [
    ...userTriggers,
    ...(orderTriggers as Trigger[]),
    { entity: 'misc', action: 'create', when: 'after', fn: async () => 0 },
];
"#,
    );
    project.write(
        "src/triggers/user.ts",
        &trigger_file(&[trigger("user", "create", "u1"), trigger("user", "update", "u2")]),
    );
    project.write(
        "src/triggers/order.ts",
        &format!("export const orderTriggers = [{}];\n", trigger("order", "remove", "o1")),
    );
    project
}

#[test]
fn test_init_twice_yields_identical_list() {
    let project = standard_project();
    let mut index = project.trigger_index(30);

    assert_eq!(index.init_program().unwrap(), 4);
    let first = index.definitions().to_vec();
    index.init_program().unwrap();

    assert_eq!(first, index.definitions().to_vec());
    assert_eq!(entities(&index), vec!["user", "user", "order", "misc"]);
    assert_eq!(index.state(), IndexState::Ready);
}

#[test]
fn test_incremental_update_matches_full_rebuild() {
    let project = standard_project();
    let mut index = project.trigger_index(30);
    index.init_program().unwrap();

    let user = project.write(
        "src/triggers/user.ts",
        &trigger_file(&[
            trigger("user", "create", "u1"),
            trigger("user", "remove", "u2"),
            trigger("user", "update", "u3"),
        ]),
    );
    let outcome = index.update_by_path(&user).unwrap();
    assert_eq!(outcome, UpdateOutcome::Patched { removed: 2, added: 3 });
    assert_eq!(index.edit_count(), 1);

    let mut fresh = project.trigger_index(30);
    fresh.init_program().unwrap();
    assert_eq!(index.definitions().to_vec(), fresh.definitions().to_vec());
    assert_eq!(entities(&index), vec!["user", "user", "user", "order", "misc"]);
    assert_eq!(index.definitions()[1].action, vec!["remove".to_string()]);
}

#[test]
fn test_update_of_named_export_file() {
    let project = standard_project();
    let mut index = project.trigger_index(30);
    index.init_program().unwrap();

    let order = project.write(
        "src/triggers/order.ts",
        "export const orderTriggers = [];\n",
    );
    assert_eq!(
        index.update_by_path(&order).unwrap(),
        UpdateOutcome::Patched { removed: 1, added: 0 }
    );
    assert_eq!(entities(&index), vec!["user", "user", "misc"]);
}

#[test]
fn test_mutual_imports_terminate_without_duplicates() {
    let project = Project::new();
    project.write(
        TRIGGERS_ENTRY,
        "import a from './a';\nexport default [...a];\n",
    );
    project.write(
        "src/triggers/a.ts",
        &format!(
            "import b from './b';\nexport default [{}, ...b];\n",
            trigger("a", "create", "a")
        ),
    );
    project.write(
        "src/triggers/b.ts",
        &format!(
            "import a from './a';\nexport default [{}, ...a];\n",
            trigger("b", "create", "b")
        ),
    );

    let mut index = project.trigger_index(30);
    index.init_program().unwrap();
    assert_eq!(entities(&index), vec!["a", "b"]);
    assert_eq!(index.program().unwrap().import_cycles().len(), 1);
}

#[test]
fn test_threshold_forces_full_rebuild() {
    let project = standard_project();
    let mut index = project.trigger_index(2);
    index.init_program().unwrap();

    let user = project.path("src/triggers/user.ts");
    let order = project.path("src/triggers/order.ts");
    let entry = project.path(TRIGGERS_ENTRY);

    assert!(matches!(index.update_by_path(&user).unwrap(), UpdateOutcome::Patched { .. }));
    assert!(matches!(index.update_by_path(&order).unwrap(), UpdateOutcome::Patched { .. }));
    assert_eq!(index.edit_count(), 2);

    assert_eq!(
        index.update_by_path(&entry).unwrap(),
        UpdateOutcome::Rebuilt(RebuildReason::ThresholdExceeded)
    );
    assert_eq!(index.edit_count(), 0);
    assert_eq!(index.stats().total_rebuilds, 2);
    assert_eq!(entities(&index), vec!["user", "user", "order", "misc"]);
}

#[test]
fn test_unknown_file_triggers_rebuild() {
    let project = standard_project();
    let mut index = project.trigger_index(30);
    index.init_program().unwrap();

    let stray = project.write(
        "src/triggers/stray.ts",
        &trigger_file(&[trigger("x", "create", "x")]),
    );
    assert_eq!(
        index.update_by_path(&stray).unwrap(),
        UpdateOutcome::Rebuilt(RebuildReason::MissingBindingMeta)
    );
    assert_eq!(index.definitions().len(), 4);
}

#[test]
fn test_deleted_file_is_dropped_on_rebuild() {
    let project = standard_project();
    let mut index = project.trigger_index(30);
    index.init_program().unwrap();

    let order = project.remove("src/triggers/order.ts");
    assert_eq!(
        index.update_by_path(&order).unwrap(),
        UpdateOutcome::Rebuilt(RebuildReason::FileRemoved)
    );
    assert_eq!(entities(&index), vec!["user", "user", "misc"]);
    assert!(index.definitions().iter().all(|d| d.path != order));
}

#[test]
fn test_uninitialized_index_reports_not_initialized() {
    let project = Project::new();
    let mut index = project.trigger_index(30);

    let missing_entry = index.init_program();
    assert!(matches!(missing_entry, Err(AnalyzerError::Entry { .. })));
    assert_eq!(index.state(), IndexState::Uninitialized);

    let update = index.update_by_path(&project.path("src/triggers/user.ts"));
    assert!(matches!(update, Err(AnalyzerError::NotInitialized { .. })));
    let check = index.check_all_definitions(&Default::default());
    assert!(matches!(check, Err(AnalyzerError::NotInitialized { .. })));
}

#[test]
fn test_binding_meta_follows_re_export_chain() {
    let project = Project::new();
    project.write(
        TRIGGERS_ENTRY,
        "import { triggers as userTriggers } from './user';\nexport default [...userTriggers];\n",
    );
    project.write("src/triggers/user/index.ts", "export { default as triggers } from './list';\n");
    let list = project.write(
        "src/triggers/user/list.ts",
        &trigger_file(&[trigger("user", "create", "u1")]),
    );

    let mut index = project.trigger_index(30);
    index.init_program().unwrap();
    let meta = index.binding_meta(&list).unwrap();
    assert!(meta.iter().any(|m| m.is_default && m.identifier == "triggers"));

    project.write(
        "src/triggers/user/list.ts",
        &trigger_file(&[trigger("user", "create", "u1"), trigger("user", "update", "u2")]),
    );
    assert_eq!(
        index.update_by_path(&list).unwrap(),
        UpdateOutcome::Patched { removed: 1, added: 2 }
    );
}

#[test]
fn test_notifications_are_coalesced() {
    let project = standard_project();
    let mut index = project.trigger_index(30);
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let calls = Arc::clone(&calls);
        index.bus().subscribe(move || {
            calls.fetch_add(1, Ordering::SeqCst);
        });
    }

    index.init_program().unwrap();
    index.update_by_path(&project.path("src/triggers/user.ts")).unwrap();
    index.update_by_path(&project.path("src/triggers/order.ts")).unwrap();
    thread::sleep(Duration::from_millis(400));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dropped_import_removes_orphaned_definitions() {
    let project = standard_project();
    let mut index = project.trigger_index(30);
    index.init_program().unwrap();

    let entry = project.write(
        TRIGGERS_ENTRY,
        "import userTriggers from './user';\nexport default [...userTriggers];\n",
    );
    assert_eq!(
        index.update_by_path(&entry).unwrap(),
        UpdateOutcome::Patched { removed: 4, added: 2 }
    );

    let order = project.path("src/triggers/order.ts");
    assert!(index.binding_meta(&order).is_none());

    let mut fresh = project.trigger_index(30);
    fresh.init_program().unwrap();
    assert_eq!(index.definitions().to_vec(), fresh.definitions().to_vec());
}

#[test]
fn test_constant_file_edit_refolds_values() {
    let project = Project::new();
    project.write(
        TRIGGERS_ENTRY,
        r#"
import { ENTITY } from './consts';

export default [
    { entity: ENTITY, action: 'create', when: 'after', fn: async () => 0 },
];
"#,
    );
    let consts = project.write("src/triggers/consts.ts", "export const ENTITY = 'user';\n");
    let mut index = project.trigger_index(30);
    index.init_program().unwrap();
    assert_eq!(entities(&index), vec!["user"]);
    assert!(index.binding_meta(&consts).is_none());
    assert_eq!(index.value_binding_meta(&consts).unwrap()[0].import_name, "ENTITY");
    assert!(index.owns(&consts));

    project.write("src/triggers/consts.ts", "export const ENTITY = 'order';\n");
    assert_eq!(
        index.update_by_path(&consts).unwrap(),
        UpdateOutcome::Rebuilt(RebuildReason::ValueDependency)
    );
    assert_eq!(index.edit_count(), 0);

    let mut fresh = project.trigger_index(30);
    fresh.init_program().unwrap();
    assert_eq!(entities(&index), vec!["order"]);
    assert_eq!(index.definitions().to_vec(), fresh.definitions().to_vec());
}
