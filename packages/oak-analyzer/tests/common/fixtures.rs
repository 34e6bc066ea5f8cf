//! Project tree fixtures

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use oak_analyzer::features::pubsub::InvalidationBus;
use oak_analyzer::features::workspace::Workspace;
use oak_analyzer::shared::utils::normalize_path;
use oak_analyzer::{AnalyzerConfig, CheckerIndex, ProgramIndex, TriggerIndex};
use tempfile::TempDir;

pub const TRIGGERS_ENTRY: &str = "src/triggers/index.ts";
pub const CHECKERS_ENTRY: &str = "src/checkers/index.ts";
pub const DOMAIN_DIR: &str = "src/oak-app-domain";

pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    pub fn root(&self) -> PathBuf {
        normalize_path(self.dir.path())
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        normalize_path(self.dir.path().join(rel))
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(&path, content).expect("write fixture");
        path
    }

    pub fn remove(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        if path.is_dir() {
            fs::remove_dir_all(&path).expect("remove dir");
        } else {
            fs::remove_file(&path).expect("remove file");
        }
        path
    }

    pub fn trigger_index(&self, max_edits: usize) -> TriggerIndex {
        index_at(&self.path(TRIGGERS_ENTRY), "triggers", max_edits)
    }

    pub fn checker_index(&self, max_edits: usize) -> CheckerIndex {
        index_at(&self.path(CHECKERS_ENTRY), "checkers", max_edits)
    }
}

pub fn index_at<K: oak_analyzer::features::definitions::DefinitionKind>(
    entry: &Path,
    topic: &str,
    max_edits: usize,
) -> ProgramIndex<K> {
    ProgramIndex::new(
        entry,
        Arc::new(Workspace::new()),
        Arc::new(InvalidationBus::new(topic, Duration::from_millis(100))),
        max_edits,
    )
}

/// One trigger object literal with an async handler returning its count
pub fn trigger(entity: &str, action: &str, name: &str) -> String {
    format!(
        r#"{{
        name: '{name}',
        entity: '{entity}',
        action: '{action}',
        when: 'before',
        fn: async ({{ operation }}, context) => {{
            const count = await context.count('{entity}', {{}}, {{}});
            return count;
        }},
    }}"#
    )
}

/// Trigger file exporting `items` as its default array
pub fn trigger_file(items: &[String]) -> String {
    format!("export default [\n    {},\n];\n", items.join(",\n    "))
}

/// Minimal domain: registry plus one description module, schema and
/// optional locales per entity
pub fn write_domain(project: &Project, entities: &[(&str, &str, &[&str])]) {
    let mut imports = String::new();
    let mut members = Vec::new();
    for (name, desc, projection) in entities {
        imports.push_str(&format!("import {{ desc as {name}Desc }} from './{name}/Storage';\n"));
        members.push(format!("{name}: {name}Desc"));
        project.write(
            &format!("{DOMAIN_DIR}/{name}/Storage.ts"),
            &format!("export const desc = {desc};\n"),
        );
        let fields: String = projection.iter().map(|f| format!("    {f}?: any;\n")).collect();
        project.write(
            &format!("{DOMAIN_DIR}/{name}/Schema.ts"),
            &format!("export type Projection = {{\n{fields}}} & Partial<ExprOp>;\n"),
        );
    }
    project.write(
        &format!("{DOMAIN_DIR}/Storage.ts"),
        &format!(
            "{imports}\nexport const storageSchema = {{\n    {},\n}};\n",
            members.join(",\n    ")
        ),
    );
}

pub fn test_config() -> AnalyzerConfig {
    let mut config = AnalyzerConfig::default();
    config.limits.debounce_ms = 100;
    config
}
