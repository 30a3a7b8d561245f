//! Workflow operations: lookup, import, delete and invocation.

use super::payloads::{
    DatasetInput, HistoryTarget, ImportSharedRequest, ImportWorkflowRequest, InputsBy,
    InvocationRequest,
};
use super::{name_matches, reply_id, reply_list, reply_object, select_id, GalaxyInstance, Selector};
use crate::error::{GalaxyError, Result};
use crate::wrappers::{Document, Invocation, Workflow, WorkflowPreview};
use std::collections::BTreeMap;
use tracing::{info, warn};

pub struct WorkflowClient<'a> {
    gi: &'a GalaxyInstance,
}

impl<'a> WorkflowClient<'a> {
    pub(crate) fn new(gi: &'a GalaxyInstance) -> Self {
        Self { gi }
    }

    fn preview_documents(&self, name: Option<&str>, published: bool) -> Result<Vec<Document>> {
        let reply = self
            .gi
            .get("workflows", &[("show_published", published.to_string())])?;
        Ok(reply_list("get_workflows", reply)?
            .into_iter()
            .filter(|doc| name_matches(doc, name))
            .collect())
    }

    /// Workflow summaries; with `published`, also those shared publicly.
    pub fn get_previews(&self, name: Option<&str>, published: bool) -> Result<Vec<WorkflowPreview>> {
        Ok(self
            .preview_documents(name, published)?
            .into_iter()
            .map(WorkflowPreview::new)
            .collect())
    }

    pub fn get(&self, id: &str) -> Result<Workflow> {
        let document = reply_object(
            "show_workflow",
            self.gi.get(&format!("workflows/{}", id), &[])?,
        )?;
        Workflow::build(document, None, Some(id))
    }

    pub fn list(&self, name: Option<&str>, published: bool) -> Result<Vec<Workflow>> {
        let mut workflows = Vec::new();
        for preview in self.preview_documents(name, published)? {
            match reply_id("get_workflows", &preview) {
                Ok(id) => workflows.push(self.get(&id)?),
                Err(_) => warn!(?preview, "skipping workflow preview without id"),
            }
        }
        Ok(workflows)
    }

    /// Copy a workflow shared by another user into the caller's space.
    pub fn import_shared(&self, id: &str) -> Result<Workflow> {
        let reply = reply_object(
            "import_shared_workflow",
            self.gi
                .post("workflows/import", &ImportSharedRequest { workflow_id: id })?,
        )?;
        let new_id = reply_id("import_shared_workflow", &reply)?;
        info!(source = id, id = %new_id, "imported shared workflow");
        self.get(&new_id)
    }

    /// Upload a local workflow document as a new workflow.
    pub fn import_new(&self, workflow: &Workflow, publish: bool) -> Result<Workflow> {
        let request = ImportWorkflowRequest {
            workflow: workflow.to_document(),
            publish,
        };
        let reply = reply_object("import_workflow", self.gi.post("workflows", &request)?)?;
        let id = reply_id("import_workflow", &reply)?;
        info!(%id, publish, "imported workflow");
        self.get(&id)
    }

    /// Delete `workflow` on the server; its id and links are cleared.
    pub fn delete(&self, workflow: &mut Workflow) -> Result<()> {
        let id = workflow
            .id()
            .ok_or(GalaxyError::MissingId { what: "workflow" })?;
        self.delete_selected(Selector::Id(&id))?;
        workflow.clear_identity();
        Ok(())
    }

    pub fn delete_selected(&self, selector: Selector<'_>) -> Result<()> {
        let id = select_id("workflow", selector, |name| {
            self.preview_documents(Some(name), false)
        })?;
        self.gi.delete(&format!("workflows/{}", id), None)?;
        info!(%id, "deleted workflow");
        Ok(())
    }

    /// Run `workflow` on `inputs`, writing outputs to `history`.
    ///
    /// `params` maps a step id or tool id to that step's parameter
    /// overrides; `inputs_by` tells the server how to read the keys of
    /// `inputs`.
    pub fn invoke(
        &self,
        workflow: &Workflow,
        inputs: &BTreeMap<String, DatasetInput>,
        params: &Document,
        history: HistoryTarget,
        inputs_by: InputsBy,
    ) -> Result<Invocation> {
        let id = workflow
            .id()
            .ok_or(GalaxyError::MissingId { what: "workflow" })?;
        let request = InvocationRequest {
            inputs: inputs.clone(),
            inputs_by,
            parameters: params.clone(),
            history: history.as_param(),
        };
        let reply = self
            .gi
            .post(&format!("workflows/{}/invocations", id), &request)?;
        let invocation = Invocation::new(reply_object("invoke_workflow", reply)?);
        info!(
            workflow = %id,
            history = invocation.history_id().unwrap_or_default(),
            "invoked workflow"
        );
        Ok(invocation)
    }
}
