//! Wrappers for histories, libraries, datasets, previews, invocations,
//! installed tools and jobs.

use super::{Document, Wrapper};
use crate::client::payloads::{DatasetInput, DatasetSource};
use crate::error::Result;
use serde_json::Value;

/// Shared field access for the entity wrappers.
pub trait Entity {
    fn wrapper(&self) -> &Wrapper;
    fn wrapper_mut(&mut self) -> &mut Wrapper;

    fn get(&self, key: &str) -> Result<&Value> {
        self.wrapper().get(key)
    }

    fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()>
    where
        Self: Sized,
    {
        self.wrapper_mut().set(key, value)
    }

    fn id(&self) -> Option<String> {
        self.wrapper().id()
    }

    fn name(&self) -> Option<&str> {
        self.wrapper().str_field("name")
    }

    fn is_modified(&self) -> bool {
        self.wrapper().is_modified()
    }

    fn to_json(&self) -> String {
        self.wrapper().to_json()
    }
}

fn entity_from(kind: &'static str, document: Document) -> Wrapper {
    Wrapper::of_kind(kind, document)
}

/// A history: the container Galaxy writes run outputs into.
#[derive(Debug, PartialEq)]
pub struct History {
    core: Wrapper,
    contents: Vec<Document>,
}

impl History {
    pub fn new(document: Document, contents: Vec<Document>) -> Self {
        Self {
            core: entity_from("History", document),
            contents,
        }
    }

    pub fn deleted(&self) -> bool {
        self.core.bool_field("deleted")
    }

    /// Content summaries fetched with the history.
    pub fn contents(&self) -> &[Document] {
        &self.contents
    }

    /// Datasets in the history, optionally only those named `name`.
    pub fn datasets(&self, name: Option<&str>) -> Vec<HistoryDataset> {
        self.contents
            .iter()
            .filter(|c| c.get("history_content_type").and_then(Value::as_str) != Some("dataset_collection"))
            .filter(|c| name.is_none() || c.get("name").and_then(Value::as_str) == name)
            .map(|c| HistoryDataset::new(c.clone()))
            .collect()
    }

    pub(crate) fn clear_id(&mut self) {
        self.core.clear_id();
    }
}

impl Entity for History {
    fn wrapper(&self) -> &Wrapper {
        &self.core
    }

    fn wrapper_mut(&mut self) -> &mut Wrapper {
        &mut self.core
    }
}

/// A data library: shared, read-mostly source datasets.
#[derive(Debug, PartialEq)]
pub struct Library {
    core: Wrapper,
    contents: Vec<Document>,
}

impl Library {
    pub fn new(document: Document, contents: Vec<Document>) -> Self {
        Self {
            core: entity_from("Library", document),
            contents,
        }
    }

    pub fn deleted(&self) -> bool {
        self.core.bool_field("deleted")
    }

    pub fn contents(&self) -> &[Document] {
        &self.contents
    }

    /// File entries, optionally only the one at path `name`
    /// (e.g. `/Whole genome - Escherichia coli/reads_R1.fastq`).
    pub fn datasets(&self, name: Option<&str>) -> Vec<LibraryDataset> {
        self.contents
            .iter()
            .filter(|c| c.get("type").and_then(Value::as_str) == Some("file"))
            .filter(|c| name.is_none() || c.get("name").and_then(Value::as_str) == name)
            .map(|c| LibraryDataset::new(c.clone()))
            .collect()
    }

    pub(crate) fn clear_id(&mut self) {
        self.core.clear_id();
    }
}

impl Entity for Library {
    fn wrapper(&self) -> &Wrapper {
        &self.core
    }

    fn wrapper_mut(&mut self) -> &mut Wrapper {
        &mut self.core
    }
}

/// A dataset stored in a library.
#[derive(Debug, PartialEq)]
pub struct LibraryDataset {
    core: Wrapper,
}

impl LibraryDataset {
    pub fn new(document: Document) -> Self {
        Self {
            core: entity_from("LibraryDataset", document),
        }
    }

    /// Reference usable as a workflow input.
    pub fn to_input(&self) -> Option<DatasetInput> {
        self.id().map(|id| DatasetInput::new(id, DatasetSource::Ld))
    }

    /// Owning library, present on replies from `datasets/{id}`.
    pub fn parent_library_id(&self) -> Option<&str> {
        self.core.str_field("parent_library_id")
    }
}

impl Entity for LibraryDataset {
    fn wrapper(&self) -> &Wrapper {
        &self.core
    }

    fn wrapper_mut(&mut self) -> &mut Wrapper {
        &mut self.core
    }
}

/// A dataset inside a history.
#[derive(Debug, PartialEq)]
pub struct HistoryDataset {
    core: Wrapper,
}

impl HistoryDataset {
    pub fn new(document: Document) -> Self {
        Self {
            core: entity_from("HistoryDataset", document),
        }
    }

    pub fn state(&self) -> Option<&str> {
        self.core.str_field("state")
    }

    pub fn to_input(&self) -> Option<DatasetInput> {
        self.id().map(|id| DatasetInput::new(id, DatasetSource::Hda))
    }

    pub fn history_id(&self) -> Option<&str> {
        self.core.str_field("history_id")
    }
}

impl Entity for HistoryDataset {
    fn wrapper(&self) -> &Wrapper {
        &self.core
    }

    fn wrapper_mut(&mut self) -> &mut Wrapper {
        &mut self.core
    }
}

/// Summary row from the workflow listing.
#[derive(Debug, PartialEq)]
pub struct WorkflowPreview {
    core: Wrapper,
}

impl WorkflowPreview {
    pub fn new(document: Document) -> Self {
        Self {
            core: entity_from("WorkflowPreview", document),
        }
    }

    pub fn published(&self) -> bool {
        self.core.bool_field("published")
    }

    pub fn owner(&self) -> Option<&str> {
        self.core.str_field("owner")
    }
}

impl Entity for WorkflowPreview {
    fn wrapper(&self) -> &Wrapper {
        &self.core
    }

    fn wrapper_mut(&mut self) -> &mut Wrapper {
        &mut self.core
    }
}

/// One run of a workflow.
#[derive(Debug, PartialEq)]
pub struct Invocation {
    core: Wrapper,
}

impl Invocation {
    pub fn new(document: Document) -> Self {
        Self {
            core: entity_from("Invocation", document),
        }
    }

    pub fn history_id(&self) -> Option<&str> {
        self.core.str_field("history_id")
    }

    pub fn workflow_id(&self) -> Option<&str> {
        self.core.str_field("workflow_id")
    }

    pub fn state(&self) -> Option<&str> {
        self.core.str_field("state")
    }
}

impl Entity for Invocation {
    fn wrapper(&self) -> &Wrapper {
        &self.core
    }

    fn wrapper_mut(&mut self) -> &mut Wrapper {
        &mut self.core
    }
}

/// A tool installed on the server, as listed under `tools`.
///
/// Distinct from [`Tool`](super::Tool), which is the tool half of a
/// workflow step.
#[derive(Debug, PartialEq)]
pub struct InstalledTool {
    core: Wrapper,
}

impl InstalledTool {
    pub fn new(document: Document) -> Self {
        Self {
            core: entity_from("InstalledTool", document),
        }
    }

    pub fn version(&self) -> Option<&str> {
        self.core.str_field("version")
    }

    pub fn description(&self) -> Option<&str> {
        self.core.str_field("description")
    }

    /// Input definitions; only present when fetched with `io_details`.
    pub fn inputs(&self) -> &[Value] {
        self.core
            .get("inputs")
            .ok()
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Entity for InstalledTool {
    fn wrapper(&self) -> &Wrapper {
        &self.core
    }

    fn wrapper_mut(&mut self) -> &mut Wrapper {
        &mut self.core
    }
}

/// One tool execution.
#[derive(Debug, PartialEq)]
pub struct Job {
    core: Wrapper,
}

impl Job {
    pub fn new(document: Document) -> Self {
        Self {
            core: entity_from("Job", document),
        }
    }

    pub fn tool_id(&self) -> Option<&str> {
        self.core.str_field("tool_id")
    }

    pub fn state(&self) -> Option<&str> {
        self.core.str_field("state")
    }

    pub fn history_id(&self) -> Option<&str> {
        self.core.str_field("history_id")
    }
}

impl Entity for Job {
    fn wrapper(&self) -> &Wrapper {
        &self.core
    }

    fn wrapper_mut(&mut self) -> &mut Wrapper {
        &mut self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_library_datasets_by_path() {
        let library = Library::new(
            doc(json!({"id": "lib1", "name": "Orione SupMat", "deleted": false})),
            vec![
                doc(json!({"id": "f1", "name": "/Whole genome", "type": "folder"})),
                doc(json!({"id": "d1", "name": "/Whole genome/R1.fastq", "type": "file"})),
                doc(json!({"id": "d2", "name": "/Whole genome/R2.fastq", "type": "file"})),
            ],
        );
        assert_eq!(library.name(), Some("Orione SupMat"));
        assert!(!library.deleted());
        assert_eq!(library.datasets(None).len(), 2);

        let r2 = library.datasets(Some("/Whole genome/R2.fastq"));
        assert_eq!(r2.len(), 1);
        assert_eq!(r2[0].id().as_deref(), Some("d2"));
        assert_eq!(
            r2[0].to_input(),
            Some(DatasetInput::new("d2".to_string(), DatasetSource::Ld))
        );
        assert!(library.datasets(Some("/Whole genome")).is_empty());
    }

    #[test]
    fn test_history_datasets_skip_collections() {
        let history = History::new(
            doc(json!({"id": "h1", "name": "out", "deleted": false})),
            vec![
                doc(json!({"id": "a", "name": "R1.fastq", "history_content_type": "dataset"})),
                doc(json!({"id": "b", "name": "pairs", "history_content_type": "dataset_collection"})),
            ],
        );
        let datasets = history.datasets(None);
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].to_input().unwrap().id, "a");
    }

    #[test]
    fn test_entity_field_access() {
        let mut preview = WorkflowPreview::new(doc(json!({
            "id": "w1", "name": "W3", "published": true, "owner": "crs4"
        })));
        assert!(preview.published());
        assert_eq!(preview.owner(), Some("crs4"));
        assert!(preview.get("missing").unwrap_err().is_not_found());
        preview.set("name", "W3 copy").unwrap();
        assert!(preview.is_modified());
        assert_eq!(preview.name(), Some("W3 copy"));
    }

    #[test]
    fn test_invocation_fields() {
        let invocation = Invocation::new(doc(json!({
            "id": "i1", "history_id": "h9", "workflow_id": "w1", "state": "new"
        })));
        assert_eq!(invocation.history_id(), Some("h9"));
        assert_eq!(invocation.workflow_id(), Some("w1"));
        assert_eq!(invocation.state(), Some("new"));
    }

    #[test]
    fn test_installed_tool_inputs() {
        let tool = InstalledTool::new(doc(json!({
            "id": "velvetg", "name": "velvetg", "version": "1.0",
            "inputs": [{"name": "reads", "type": "data"}]
        })));
        assert_eq!(tool.version(), Some("1.0"));
        assert_eq!(tool.description(), None);
        assert_eq!(tool.inputs().len(), 1);

        let summary = InstalledTool::new(doc(json!({"id": "cat1", "name": "Concatenate"})));
        assert!(summary.inputs().is_empty());
    }
}
