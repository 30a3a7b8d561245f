//! Workflows: an ordered set of steps plus lookup indexes.

use super::entities::Invocation;
use super::step::{Step, StepType};
use super::taint::Taint;
use super::{Document, Wrapper};
use crate::client::payloads::{DatasetInput, HistoryTarget, InputsBy};
use crate::client::GalaxyInstance;
use crate::error::{GalaxyError, Result};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// A workflow document with its steps unpacked.
///
/// The top-level keys except `steps` are the workflow's fields. Steps are
/// kept sorted by numeric id and reached through [`Workflow::steps`] and
/// [`Workflow::step_mut`]; writes to a step or its tool mark the workflow
/// modified.
///
/// `tool_labels_to_ids` and `input_labels_to_ids` are computed once at
/// construction.
#[derive(Debug)]
pub struct Workflow {
    core: Wrapper,
    steps: Vec<Step>,
    tool_labels_to_ids: BTreeMap<String, BTreeSet<u32>>,
    input_labels_to_ids: BTreeMap<String, BTreeSet<u32>>,
    links: BTreeMap<String, String>,
}

impl Workflow {
    pub fn new(document: Document) -> Result<Self> {
        Self::build(document, None, None)
    }

    /// Build from `document`, optionally forcing the id and attaching
    /// invocation links given as `{step_id: {"label": .., "value": ..}}`.
    pub fn build(mut document: Document, links: Option<&Document>, id: Option<&str>) -> Result<Self> {
        let raw_steps = document.remove("steps");
        if let Some(id) = id {
            document.insert("id".to_string(), Value::String(id.to_string()));
        }
        let core = Wrapper::of_kind("Workflow", document);

        let mut steps = Vec::new();
        match raw_steps {
            Some(Value::Object(map)) => {
                for (key, value) in map {
                    let step_id = parse_step_id(&key)?;
                    let Value::Object(step_doc) = value else {
                        return Err(GalaxyError::document(format!(
                            "step {} is not an object",
                            key
                        )));
                    };
                    steps.push(Step::from_document(step_id, step_doc, core.taint())?);
                }
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                return Err(GalaxyError::document(format!(
                    "steps must be an object keyed by step id, got {}",
                    other
                )))
            }
        }
        steps.sort_by_key(Step::id);
        if let Some(pair) = steps.windows(2).find(|w| w[0].id() == w[1].id()) {
            return Err(GalaxyError::document(format!(
                "duplicate step id {}",
                pair[0].id()
            )));
        }

        let links = match links {
            Some(links) => index_links(links)?,
            None => BTreeMap::new(),
        };

        let mut workflow = Self {
            core,
            steps,
            tool_labels_to_ids: BTreeMap::new(),
            input_labels_to_ids: BTreeMap::new(),
            links,
        };
        workflow.rebuild_indexes();
        Ok(workflow)
    }

    /// Parse a serialized workflow (e.g. a `.ga` export).
    pub fn from_json(text: &str) -> Result<Self> {
        let document: Document = serde_json::from_str(text)?;
        Self::new(document)
    }

    fn rebuild_indexes(&mut self) {
        self.tool_labels_to_ids.clear();
        self.input_labels_to_ids.clear();
        for step in &self.steps {
            match step.step_type() {
                StepType::Tool => {
                    if let Some(label) = step.tool().and_then(|t| t.tool_id()) {
                        self.tool_labels_to_ids
                            .entry(label.to_string())
                            .or_default()
                            .insert(step.id());
                    }
                }
                StepType::Input => {
                    if let Some(label) = step.label() {
                        self.input_labels_to_ids
                            .entry(label.to_string())
                            .or_default()
                            .insert(step.id());
                    }
                }
                StepType::Other(_) => {}
            }
        }
    }

    /// Read a top-level field. `steps` is not a field; use [`Workflow::steps`].
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.core.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.core.set(key, value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.core.keys()
    }

    pub fn id(&self) -> Option<String> {
        self.core.id()
    }

    pub fn name(&self) -> Option<&str> {
        self.core.str_field("name")
    }

    pub fn is_modified(&self) -> bool {
        self.core.is_modified()
    }

    pub(crate) fn taint(&self) -> &Taint {
        self.core.taint()
    }

    /// Steps in ascending id order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn steps_mut(&mut self) -> impl Iterator<Item = &mut Step> {
        self.steps.iter_mut()
    }

    pub fn step(&self, id: u32) -> Option<&Step> {
        self.steps
            .binary_search_by_key(&id, Step::id)
            .ok()
            .map(|i| &self.steps[i])
    }

    pub fn step_mut(&mut self, id: u32) -> Option<&mut Step> {
        let i = self.steps.binary_search_by_key(&id, Step::id).ok()?;
        Some(&mut self.steps[i])
    }

    /// Tool id → ids of every step running that tool.
    pub fn tool_labels_to_ids(&self) -> &BTreeMap<String, BTreeSet<u32>> {
        &self.tool_labels_to_ids
    }

    /// Input label → ids of the input steps carrying it.
    pub fn input_labels_to_ids(&self) -> &BTreeMap<String, BTreeSet<u32>> {
        &self.input_labels_to_ids
    }

    /// Label → step id, from the links given at construction.
    pub fn links(&self) -> &BTreeMap<String, String> {
        &self.links
    }

    /// The full document with steps keyed by their string ids.
    pub fn to_document(&self) -> Document {
        let mut document = self.core.document().clone();
        let steps: Document = self
            .steps
            .iter()
            .map(|step| (step.id().to_string(), Value::Object(step.to_document())))
            .collect();
        document.insert("steps".to_string(), Value::Object(steps));
        document
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.to_document()).to_string()
    }

    /// Deep copy for re-import: id unset, step uuids cleared, links
    /// dropped, nothing modified.
    pub fn clone_fresh(&self) -> Self {
        let core = self.core.clone_fresh();
        let steps = self
            .steps
            .iter()
            .map(|step| step.copy_under(core.taint()))
            .collect();
        Self {
            core,
            steps,
            tool_labels_to_ids: self.tool_labels_to_ids.clone(),
            input_labels_to_ids: self.input_labels_to_ids.clone(),
            links: BTreeMap::new(),
        }
    }

    /// Forget server identity after a remote delete.
    pub(crate) fn clear_identity(&mut self) {
        self.core.clear_id();
        self.links.clear();
    }

    /// Step id → ids of the steps consuming its outputs. Every step appears
    /// as a key.
    pub fn dag(&self) -> Result<BTreeMap<u32, BTreeSet<u32>>> {
        let mut dag: BTreeMap<u32, BTreeSet<u32>> =
            self.steps.iter().map(|s| (s.id(), BTreeSet::new())).collect();
        for step in &self.steps {
            for parent in step.input_step_ids()? {
                dag.get_mut(&parent)
                    .ok_or_else(|| {
                        GalaxyError::document(format!(
                            "step {} references missing step {}",
                            step.id(),
                            parent
                        ))
                    })?
                    .insert(step.id());
            }
        }
        Ok(dag)
    }

    /// Steps with no inputs from other steps.
    pub fn source_ids(&self) -> Result<BTreeSet<u32>> {
        let mut ids = BTreeSet::new();
        for step in &self.steps {
            if step.input_step_ids()?.is_empty() {
                ids.insert(step.id());
            }
        }
        Ok(ids)
    }

    /// Steps whose outputs feed no other step.
    pub fn sink_ids(&self) -> Result<BTreeSet<u32>> {
        Ok(self
            .dag()?
            .into_iter()
            .filter(|(_, children)| children.is_empty())
            .map(|(id, _)| id)
            .collect())
    }

    /// Topological order, smallest ready id first.
    pub fn sorted_step_ids(&self) -> Result<Vec<u32>> {
        let dag = self.dag()?;
        let mut in_degree: BTreeMap<u32, usize> = dag.keys().map(|id| (*id, 0)).collect();
        for children in dag.values() {
            for child in children {
                *in_degree.entry(*child).or_default() += 1;
            }
        }

        let mut ready: BTreeSet<u32> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(dag.len());
        while let Some(id) = ready.pop_first() {
            order.push(id);
            for child in &dag[&id] {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(*child);
                    }
                }
            }
        }

        if order.len() != dag.len() {
            return Err(GalaxyError::document("workflow steps contain a cycle"));
        }
        Ok(order)
    }

    /// Run this workflow on the server. See
    /// [`WorkflowClient::invoke`](crate::client::WorkflowClient::invoke).
    pub fn invoke(
        &self,
        gi: &GalaxyInstance,
        inputs: &BTreeMap<String, DatasetInput>,
        params: &Document,
        history: HistoryTarget,
        inputs_by: InputsBy,
    ) -> Result<Invocation> {
        gi.workflows().invoke(self, inputs, params, history, inputs_by)
    }
}

impl PartialEq for Workflow {
    fn eq(&self, other: &Self) -> bool {
        self.core == other.core && self.steps == other.steps
    }
}

fn parse_step_id(key: &str) -> Result<u32> {
    key.parse::<u32>()
        .map_err(|_| GalaxyError::document(format!("invalid step id '{}'", key)))
}

fn index_links(links: &Document) -> Result<BTreeMap<String, String>> {
    let mut index = BTreeMap::new();
    for (step_id, entry) in links {
        let label = entry
            .get("label")
            .and_then(Value::as_str)
            .ok_or_else(|| GalaxyError::document(format!("link for step {} has no label", step_id)))?;
        index.insert(label.to_string(), step_id.clone());
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    fn velvet_workflow() -> Document {
        doc(json!({
            "name": "velvet sweep",
            "annotation": "",
            "steps": {
                "10": {"id": 10, "type": "tool", "tool_id": "velvetg", "tool_inputs": {},
                       "input_steps": {"input": {"source_step": 3, "step_output": "out"}}},
                "0": {"id": 0, "type": "data_input", "label": "reads", "tool_inputs": {}},
                "2": {"id": 2, "type": "tool", "tool_id": "velveth", "tool_inputs": {"hash_length": "21"},
                      "input_steps": {"in": {"source_step": 0, "step_output": "output"}}},
                "1": {"id": 1, "type": "tool", "tool_id": "velveth", "tool_inputs": {"hash_length": "21"},
                      "input_steps": {"in": {"source_step": 0, "step_output": "output"}}},
                "3": {"id": 3, "type": "tool", "tool_id": "velveth", "tool_inputs": {"hash_length": "21"},
                      "input_steps": {"in": {"source_step": 0, "step_output": "output"}}}
            }
        }))
    }

    #[test]
    fn test_steps_sorted_numerically() {
        let wf = Workflow::new(velvet_workflow()).unwrap();
        let ids: Vec<u32> = wf.steps().iter().map(Step::id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 10]);
        assert!(wf.steps().iter().all(|s| s.is_child_of(&wf)));
        assert_eq!(wf.step(10).unwrap().tool().unwrap().tool_id(), Some("velvetg"));
        assert!(wf.step(4).is_none());
    }

    #[test]
    fn test_tool_labels_group_steps() {
        let wf = Workflow::new(velvet_workflow()).unwrap();
        let velveth = &wf.tool_labels_to_ids()["velveth"];
        assert_eq!(velveth.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(wf.tool_labels_to_ids()["velvetg"].len(), 1);
        assert_eq!(wf.input_labels_to_ids()["reads"].len(), 1);
    }

    #[test]
    fn test_steps_is_not_a_field() {
        let wf = Workflow::new(velvet_workflow()).unwrap();
        assert!(wf.get("steps").unwrap_err().is_not_found());
        assert_eq!(wf.name(), Some("velvet sweep"));
    }

    #[test]
    fn test_bad_step_keys() {
        let err = Workflow::new(doc(json!({"steps": {"first": {}}}))).unwrap_err();
        assert!(matches!(err, GalaxyError::Document { .. }));
        let err = Workflow::new(doc(json!({"steps": [1, 2]}))).unwrap_err();
        assert!(matches!(err, GalaxyError::Document { .. }));
        let err = Workflow::new(doc(json!({"steps": {"0": "x"}}))).unwrap_err();
        assert!(matches!(err, GalaxyError::Document { .. }));
    }

    #[test]
    fn test_links_reindexed_by_label() {
        let links = doc(json!({
            "98": {"label": "foo", "value": "bar"},
            "99": {"label": "boo", "value": "far"}
        }));
        let wf = Workflow::build(velvet_workflow(), Some(&links), None).unwrap();
        assert_eq!(wf.links()["foo"], "98");
        assert_eq!(wf.links()["boo"], "99");

        let bad = doc(json!({"98": {"value": "bar"}}));
        assert!(Workflow::build(velvet_workflow(), Some(&bad), None).is_err());
    }

    #[test]
    fn test_step_write_taints_workflow() {
        let mut wf = Workflow::new(velvet_workflow()).unwrap();
        assert!(!wf.is_modified());
        wf.step_mut(2)
            .unwrap()
            .tool_mut()
            .unwrap()
            .set_param("hash_length", "23")
            .unwrap();
        assert!(wf.is_modified());
        assert!(wf.step(2).unwrap().is_modified());
        assert!(!wf.step(1).unwrap().is_modified());
    }

    #[test]
    fn test_dag_and_order() {
        let wf = Workflow::new(velvet_workflow()).unwrap();
        let dag = wf.dag().unwrap();
        assert_eq!(dag[&0].iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(dag[&3].iter().copied().collect::<Vec<_>>(), vec![10]);
        assert_eq!(wf.source_ids().unwrap().into_iter().collect::<Vec<_>>(), vec![0]);
        assert_eq!(
            wf.sink_ids().unwrap().into_iter().collect::<Vec<_>>(),
            vec![1, 2, 10]
        );
        assert_eq!(wf.sorted_step_ids().unwrap(), vec![0, 1, 2, 3, 10]);
    }

    #[test]
    fn test_dag_rejects_cycles_and_dangling_links() {
        let cyclic = doc(json!({"steps": {
            "0": {"type": "tool", "tool_id": "a", "input_steps": {"x": {"source_step": 1}}},
            "1": {"type": "tool", "tool_id": "b", "input_steps": {"x": {"source_step": 0}}}
        }}));
        let wf = Workflow::new(cyclic).unwrap();
        assert!(wf.source_ids().unwrap().is_empty());
        assert!(matches!(
            wf.sorted_step_ids(),
            Err(GalaxyError::Document { .. })
        ));

        let dangling = doc(json!({"steps": {
            "0": {"type": "tool", "tool_id": "a", "input_steps": {"x": {"source_step": 7}}}
        }}));
        assert!(Workflow::new(dangling).unwrap().dag().is_err());
    }
}
