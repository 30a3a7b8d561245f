//! One node of a workflow.

use super::taint::Taint;
use super::tool::Tool;
use super::{Document, Wrapper};
use crate::error::{GalaxyError, Result};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Kind of a workflow step, parsed from its `type` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepType {
    /// Runs a tool; the step carries a [`Tool`]
    Tool,
    /// Dataset, collection or parameter input
    Input,
    /// Anything else (subworkflows, pauses), with the raw type name
    Other(String),
}

impl StepType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "tool" => StepType::Tool,
            "data_input" | "data_collection_input" | "parameter_input" | "input" => {
                StepType::Input
            }
            other => StepType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepType::Tool => write!(f, "tool"),
            StepType::Input => write!(f, "input"),
            StepType::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// A workflow step, owned by its [`Workflow`](super::Workflow).
#[derive(Debug)]
pub struct Step {
    core: Wrapper,
    id: u32,
    step_type: StepType,
    tool: Option<Tool>,
}

impl Step {
    /// Build the step stored under ordinal `id`, propagating taint to `parent`.
    pub(crate) fn from_document(id: u32, mut document: Document, parent: &Taint) -> Result<Self> {
        let step_type = StepType::parse(
            document
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        );

        let taint = Taint::with_parent(parent);
        let tool = if step_type == StepType::Tool {
            Some(Tool::split_from_step(&mut document, &taint)?)
        } else {
            None
        };
        let core = Wrapper::with_taint("Step", document, taint);

        Ok(Self {
            core,
            id,
            step_type,
            tool,
        })
    }

    /// Ordinal id within the workflow.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn step_type(&self) -> &StepType {
        &self.step_type
    }

    pub fn tool(&self) -> Option<&Tool> {
        self.tool.as_ref()
    }

    pub fn tool_mut(&mut self) -> Option<&mut Tool> {
        self.tool.as_mut()
    }

    /// Read a field. Tool-owned keys (`tool_id`, `tool_state`, ...) are
    /// rendered from the current tool, so the value is returned owned.
    pub fn get(&self, key: &str) -> Result<Value> {
        if let Some(tool) = &self.tool {
            if let Some(value) = tool.step_value(key) {
                return Ok(value);
            }
        }
        self.core.get(key).cloned()
    }

    /// Write a field; tool-owned keys are routed to the tool. `id` and
    /// `type` are fixed at construction and cannot be written.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        if key == "id" || key == "type" {
            return Err(GalaxyError::document(format!(
                "step field '{}' is fixed at construction",
                key
            )));
        }
        if let Some(tool) = &mut self.tool {
            if tool.step_keys().iter().any(|k| *k == key) {
                return tool.set_step_value(key, value.into());
            }
        }
        self.core.set(key, value)
    }

    /// All recognized field names, tool-owned ones included.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.core.keys().collect();
        if let Some(tool) = &self.tool {
            keys.extend(tool.step_keys());
        }
        keys
    }

    pub fn is_modified(&self) -> bool {
        self.core.is_modified()
    }

    /// True when this step belongs to `workflow`.
    pub fn is_child_of(&self, workflow: &super::Workflow) -> bool {
        self.core.taint().is_child_of(workflow.taint())
    }

    pub(crate) fn taint(&self) -> &Taint {
        self.core.taint()
    }

    /// Human-facing label: the step's `label`, or for inputs the name of
    /// its first declared input.
    pub fn label(&self) -> Option<&str> {
        if let Some(label) = self.core.str_field("label").filter(|l| !l.is_empty()) {
            return Some(label);
        }
        if self.step_type != StepType::Input {
            return None;
        }
        self.core
            .document()
            .get("inputs")
            .and_then(Value::as_array)
            .and_then(|inputs| inputs.first())
            .and_then(|input| input.get("name"))
            .and_then(Value::as_str)
    }

    /// Ids of the steps feeding this one.
    ///
    /// Reads `input_steps` (API shape) and `input_connections` (export
    /// shape, single connection or list per input).
    pub fn input_step_ids(&self) -> Result<BTreeSet<u32>> {
        let doc = self.core.document();
        let mut ids = BTreeSet::new();
        if let Some(Value::Object(inputs)) = doc.get("input_steps") {
            for link in inputs.values() {
                ids.insert(step_ref(link, "source_step")?);
            }
        }
        if let Some(Value::Object(connections)) = doc.get("input_connections") {
            for connection in connections.values() {
                match connection {
                    Value::Array(links) => {
                        for link in links {
                            ids.insert(step_ref(link, "id")?);
                        }
                    }
                    link => {
                        ids.insert(step_ref(link, "id")?);
                    }
                }
            }
        }
        Ok(ids)
    }

    /// The full step document, tool-owned keys re-rendered.
    pub fn to_document(&self) -> Document {
        let mut doc = self.core.document().clone();
        if let Some(tool) = &self.tool {
            tool.merge_into(&mut doc);
        }
        doc
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.to_document()).to_string()
    }

    /// Deep copy owned by `parent`, with `uuid` cleared and no history.
    pub(crate) fn copy_under(&self, parent: &Taint) -> Self {
        let mut document = self.core.document().clone();
        if let Some(slot) = document.get_mut("uuid") {
            *slot = Value::Null;
        }
        let core = Wrapper::with_taint("Step", document, Taint::with_parent(parent));
        let tool = self.tool.as_ref().map(|tool| tool.copy_under(core.taint()));
        Self {
            core,
            id: self.id,
            step_type: self.step_type.clone(),
            tool,
        }
    }
}

impl PartialEq for Step {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.core == other.core && self.tool == other.tool
    }
}

fn step_ref(link: &Value, field: &str) -> Result<u32> {
    let raw = link
        .get(field)
        .ok_or_else(|| GalaxyError::document(format!("step link without '{}': {}", field, link)))?;
    let id = match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse::<u64>().ok(),
        _ => None,
    };
    id.and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| GalaxyError::document(format!("invalid step reference {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    fn tool_step(parent: &Taint) -> Step {
        Step::from_document(
            2,
            doc(json!({
                "id": 2,
                "type": "tool",
                "tool_id": "cat1",
                "tool_version": "1.0.0",
                "tool_errors": null,
                "tool_state": "{\"input1\": \"null\", \"queries\": \"[]\"}",
                "annotation": "",
                "label": null,
                "uuid": "9a5b5bd6-0f8f-4f5e-8f54-3f62b4c1c7a2",
                "input_connections": {
                    "input1": {"id": 0, "output_name": "output"},
                    "queries_0|input2": [{"id": 1, "output_name": "output"}]
                }
            })),
            parent,
        )
        .unwrap()
    }

    #[test]
    fn test_id_and_type_are_read_only() {
        let parent = Taint::new();
        let mut step = tool_step(&parent);

        let err = step.set("id", 7).unwrap_err();
        assert!(matches!(err, GalaxyError::Document { .. }));
        let err = step.set("type", "data_input").unwrap_err();
        assert!(matches!(err, GalaxyError::Document { .. }));

        assert_eq!(step.id(), 2);
        assert_eq!(step.get("id").unwrap(), json!(2));
        assert_eq!(step.step_type(), &StepType::Tool);
        assert_eq!(step.get("type").unwrap(), json!("tool"));
        assert!(!step.is_modified());
        assert!(!parent.is_modified());
    }

    #[test]
    fn test_step_type_parse() {
        assert_eq!(StepType::parse("tool"), StepType::Tool);
        assert_eq!(StepType::parse("data_input"), StepType::Input);
        assert_eq!(StepType::parse("parameter_input"), StepType::Input);
        assert_eq!(
            StepType::parse("subworkflow"),
            StepType::Other("subworkflow".to_string())
        );
        assert_eq!(StepType::Input.to_string(), "input");
    }

    #[test]
    fn test_tool_keys_served_by_tool() {
        let parent = Taint::new();
        let step = tool_step(&parent);
        assert_eq!(step.get("tool_id").unwrap(), json!("cat1"));
        assert_eq!(step.tool().unwrap().tool_id(), Some("cat1"));
        assert_eq!(step.get("annotation").unwrap(), json!(""));
        assert!(step.keys().contains(&"tool_state"));
        assert!(step.get("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_set_routes_to_tool() {
        let parent = Taint::new();
        let mut step = tool_step(&parent);
        step.set("tool_version", "1.0.1").unwrap();
        assert_eq!(step.tool().unwrap().version(), Some("1.0.1"));
        assert!(step.is_modified());
        assert!(parent.is_modified());
    }

    #[test]
    fn test_tool_param_taints_step() {
        let parent = Taint::new();
        let mut step = tool_step(&parent);
        assert!(step.tool().unwrap().is_child_of(&step));
        step.tool_mut().unwrap().set_param("queries", json!([])).unwrap();
        assert!(step.tool().unwrap().is_modified());
        assert!(step.is_modified());
        assert!(parent.is_modified());
    }

    #[test]
    fn test_input_step_ids() {
        let parent = Taint::new();
        let step = tool_step(&parent);
        let ids: Vec<u32> = step.input_step_ids().unwrap().into_iter().collect();
        assert_eq!(ids, vec![0, 1]);

        let api_step = Step::from_document(
            4,
            doc(json!({
                "id": 4,
                "type": "tool",
                "tool_id": "velvetg",
                "tool_inputs": {},
                "input_steps": {"input": {"source_step": "3", "step_output": "outfile"}}
            })),
            &parent,
        )
        .unwrap();
        let ids: Vec<u32> = api_step.input_step_ids().unwrap().into_iter().collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn test_input_label() {
        let parent = Taint::new();
        let labelled = Step::from_document(
            0,
            doc(json!({"id": 0, "type": "data_input", "label": "Left reads"})),
            &parent,
        )
        .unwrap();
        assert_eq!(labelled.label(), Some("Left reads"));
        assert!(labelled.tool().is_none());

        let legacy = Step::from_document(
            1,
            doc(json!({
                "id": 1,
                "type": "data_input",
                "label": "",
                "inputs": [{"name": "Right reads", "description": ""}]
            })),
            &parent,
        )
        .unwrap();
        assert_eq!(legacy.label(), Some("Right reads"));
    }

    #[test]
    fn test_to_document_round_trip() {
        let parent = Taint::new();
        let step = tool_step(&parent);
        let document = step.to_document();
        let rebuilt = Step::from_document(2, document, &Taint::new()).unwrap();
        assert_eq!(rebuilt, step);
    }

    #[test]
    fn test_copy_under_clears_uuid() {
        let parent = Taint::new();
        let other = Taint::new();
        let step = tool_step(&parent);
        let copy = step.copy_under(&other);
        assert_eq!(copy.get("uuid").unwrap(), Value::Null);
        assert_eq!(copy.id(), 2);
        assert!(copy.tool().unwrap().is_child_of(&copy));
        assert!(!copy.is_modified());
    }
}
