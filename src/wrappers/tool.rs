//! The tool carried by a workflow step.
//!
//! Galaxy stores tool parameters in one of two shapes. Exported workflows
//! (`.ga` files) carry `tool_state`, a JSON-encoded object whose values are
//! themselves JSON-encoded; the API's `show_workflow` carries `tool_inputs`,
//! a plain object. [`Tool`] decodes either into one parameter map and
//! re-encodes it in the source shape when the step is serialized.

use super::taint::Taint;
use super::{Document, Wrapper};
use crate::error::{GalaxyError, Result};
use serde_json::Value;
use std::collections::HashSet;

/// Step keys that move into the tool, with the tool-side field name.
pub(crate) const SIMPLE_TOOL_KEYS: [(&str, &str); 3] = [
    ("tool_id", "id"),
    ("tool_version", "version"),
    ("tool_errors", "errors"),
];

pub(crate) const TOOL_STATE: &str = "tool_state";
pub(crate) const TOOL_INPUTS: &str = "tool_inputs";

#[derive(Debug, Clone, PartialEq)]
enum ParamSource {
    /// Step had neither `tool_state` nor `tool_inputs`
    Absent,
    /// `tool_inputs` object, stored as-is
    Inputs,
    /// `tool_state`, either an encoded string or a bare object; `encoded`
    /// lists the parameters whose values were JSON strings themselves
    State {
        outer_encoded: bool,
        encoded: HashSet<String>,
    },
}

/// Tool metadata plus its parameter map.
#[derive(Debug)]
pub struct Tool {
    core: Wrapper,
    params: Document,
    source: ParamSource,
}

impl Tool {
    /// Move the tool-owned keys out of a tool step's document.
    pub(crate) fn split_from_step(step: &mut Document, parent: &Taint) -> Result<Self> {
        let mut fields = Document::new();
        for (step_key, tool_key) in SIMPLE_TOOL_KEYS {
            if let Some(value) = step.remove(step_key) {
                fields.insert(tool_key.to_string(), value);
            }
        }

        let (params, source) = match (step.remove(TOOL_STATE), step.remove(TOOL_INPUTS)) {
            (Some(state), inputs) => {
                if let Some(inputs) = inputs {
                    // Both present: keep the one we do not decode verbatim.
                    step.insert(TOOL_INPUTS.to_string(), inputs);
                }
                decode_state(state)?
            }
            (None, Some(Value::Object(inputs))) => (inputs, ParamSource::Inputs),
            (None, Some(Value::Null)) | (None, None) => (Document::new(), ParamSource::Absent),
            (None, Some(other)) => {
                return Err(GalaxyError::document(format!(
                    "tool_inputs must be an object, got {}",
                    other
                )))
            }
        };

        let core = Wrapper::with_taint("Tool", fields, Taint::with_parent(parent));
        Ok(Self {
            core,
            params,
            source,
        })
    }

    /// Read a metadata field (`id`, `version`, `errors`).
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.core.get(key)
    }

    /// Overwrite a metadata field.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.core.set(key, value)
    }

    /// The tool id, e.g. `velveth` or a full Tool Shed guid.
    pub fn tool_id(&self) -> Option<&str> {
        self.core.str_field("id")
    }

    pub fn version(&self) -> Option<&str> {
        self.core.str_field("version")
    }

    /// Read one parameter.
    pub fn param(&self, name: &str) -> Result<&Value> {
        self.params
            .get(name)
            .ok_or_else(|| GalaxyError::not_found("Tool parameters", name))
    }

    /// Overwrite one parameter, tainting the tool and its owners.
    pub fn set_param(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        match self.params.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                self.core.taint().mark_modified();
                Ok(())
            }
            None => Err(GalaxyError::not_found("Tool parameters", name)),
        }
    }

    /// All decoded parameters.
    pub fn params(&self) -> &Document {
        &self.params
    }

    pub fn is_modified(&self) -> bool {
        self.core.is_modified()
    }

    /// True when this tool belongs to `step`.
    pub fn is_child_of(&self, step: &super::Step) -> bool {
        self.core.taint().is_child_of(step.taint())
    }

    /// Render a step-document key owned by the tool.
    pub(crate) fn step_value(&self, step_key: &str) -> Option<Value> {
        if let Some((_, tool_key)) = SIMPLE_TOOL_KEYS.iter().find(|(k, _)| *k == step_key) {
            return self.core.document().get(*tool_key).cloned();
        }
        match (&self.source, step_key) {
            (ParamSource::Inputs, TOOL_INPUTS) => Some(Value::Object(self.params.clone())),
            (ParamSource::State { .. }, TOOL_STATE) => Some(self.render_state()),
            _ => None,
        }
    }

    /// Step-document keys this tool answers for.
    pub(crate) fn step_keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = SIMPLE_TOOL_KEYS
            .iter()
            .filter(|(_, tool_key)| self.core.contains_key(tool_key))
            .map(|(step_key, _)| *step_key)
            .collect();
        match self.source {
            ParamSource::Inputs => keys.push(TOOL_INPUTS),
            ParamSource::State { .. } => keys.push(TOOL_STATE),
            ParamSource::Absent => {}
        }
        keys
    }

    /// Route a step-level write of a tool-owned key.
    pub(crate) fn set_step_value(&mut self, step_key: &str, value: Value) -> Result<()> {
        if let Some((_, tool_key)) = SIMPLE_TOOL_KEYS.iter().find(|(k, _)| *k == step_key) {
            return self.core.set(tool_key, value);
        }
        let (params, source) = match (&self.source, step_key) {
            (ParamSource::Inputs, TOOL_INPUTS) => match value {
                Value::Object(map) => (map, ParamSource::Inputs),
                other => {
                    return Err(GalaxyError::document(format!(
                        "tool_inputs must be an object, got {}",
                        other
                    )))
                }
            },
            (ParamSource::State { .. }, TOOL_STATE) => decode_state(value)?,
            _ => return Err(GalaxyError::not_found("Step", step_key)),
        };
        self.params = params;
        self.source = source;
        self.core.taint().mark_modified();
        Ok(())
    }

    /// Write the tool-owned keys back into a step document.
    pub(crate) fn merge_into(&self, step: &mut Document) {
        for key in self.step_keys() {
            if let Some(value) = self.step_value(key) {
                step.insert(key.to_string(), value);
            }
        }
    }

    /// The `tool_state` value in its original encoding.
    pub fn render_state(&self) -> Value {
        let ParamSource::State {
            outer_encoded,
            encoded,
        } = &self.source
        else {
            return Value::Object(self.params.clone());
        };
        let inner: Document = self
            .params
            .iter()
            .map(|(k, v)| {
                let v = if encoded.contains(k) {
                    Value::String(v.to_string())
                } else {
                    v.clone()
                };
                (k.clone(), v)
            })
            .collect();
        if *outer_encoded {
            Value::String(Value::Object(inner).to_string())
        } else {
            Value::Object(inner)
        }
    }

    /// Deep copy owned by `parent`, with no mutation history.
    pub(crate) fn copy_under(&self, parent: &Taint) -> Self {
        let core = Wrapper::with_taint(
            "Tool",
            self.core.document().clone(),
            Taint::with_parent(parent),
        );
        Self {
            core,
            params: self.params.clone(),
            source: self.source.clone(),
        }
    }
}

impl PartialEq for Tool {
    fn eq(&self, other: &Self) -> bool {
        self.core == other.core && self.params == other.params
    }
}

fn decode_state(state: Value) -> Result<(Document, ParamSource)> {
    let (outer, outer_encoded) = match state {
        Value::String(text) => (serde_json::from_str::<Value>(&text)?, true),
        other => (other, false),
    };
    let raw = match outer {
        Value::Object(raw) => raw,
        other => {
            return Err(GalaxyError::document(format!(
                "tool_state must encode an object, got {}",
                other
            )))
        }
    };

    let mut encoded = HashSet::new();
    let mut params = Document::new();
    for (name, value) in raw {
        let decoded = match value {
            Value::String(text) => match serde_json::from_str::<Value>(&text) {
                Ok(inner) => {
                    encoded.insert(name.clone());
                    inner
                }
                Err(_) => Value::String(text),
            },
            other => other,
        };
        params.insert(name, decoded);
    }

    Ok((
        params,
        ParamSource::State {
            outer_encoded,
            encoded,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn export_step() -> Document {
        json!({
            "id": 1,
            "type": "tool",
            "tool_id": "Cut1",
            "tool_version": "1.0.1",
            "tool_errors": null,
            "tool_state": "{\"columnList\": \"\\\"c1\\\"\", \"exp\": \"\\\"1\\\"\", \"__page__\": 0}",
            "annotation": ""
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn test_split_from_export_step() {
        let parent = Taint::new();
        let mut step = export_step();
        let tool = Tool::split_from_step(&mut step, &parent).unwrap();

        assert_eq!(tool.tool_id(), Some("Cut1"));
        assert_eq!(tool.version(), Some("1.0.1"));
        assert_eq!(tool.get("errors").unwrap(), &Value::Null);
        assert_eq!(tool.param("exp").unwrap(), &json!("1"));
        assert_eq!(tool.param("__page__").unwrap(), &json!(0));
        assert!(!step.contains_key("tool_id"));
        assert!(!step.contains_key("tool_state"));
        assert!(step.contains_key("annotation"));
    }

    #[test]
    fn test_state_renders_in_source_encoding() {
        let parent = Taint::new();
        let mut step = export_step();
        let original = step.get("tool_state").cloned().unwrap();
        let tool = Tool::split_from_step(&mut step, &parent).unwrap();

        let rendered = tool.render_state();
        let reparsed: Value = serde_json::from_str(rendered.as_str().unwrap()).unwrap();
        let expected: Value = serde_json::from_str(original.as_str().unwrap()).unwrap();
        assert_eq!(reparsed, expected);
    }

    #[test]
    fn test_api_tool_inputs() {
        let parent = Taint::new();
        let mut step = json!({
            "id": 3,
            "type": "tool",
            "tool_id": "velvetg",
            "tool_version": "1.2.10",
            "tool_inputs": {"reads": "{\"ins_length\": 200}", "cov_cutoff": "auto"}
        })
        .as_object()
        .unwrap()
        .clone();
        let mut tool = Tool::split_from_step(&mut step, &parent).unwrap();

        assert_eq!(tool.param("cov_cutoff").unwrap(), &json!("auto"));
        tool.set_param("cov_cutoff", "10").unwrap();
        assert_eq!(
            tool.step_value(TOOL_INPUTS).unwrap()["cov_cutoff"],
            json!("10")
        );
        assert_eq!(tool.step_keys(), vec!["tool_id", "tool_version", TOOL_INPUTS]);
    }

    #[test]
    fn test_param_taint_reaches_parent() {
        let parent = Taint::new();
        let mut step = export_step();
        let mut tool = Tool::split_from_step(&mut step, &parent).unwrap();

        assert!(tool.set_param("foo", 0).unwrap_err().is_not_found());
        assert!(!parent.is_modified());

        tool.set_param("exp", "2").unwrap();
        assert_eq!(tool.param("exp").unwrap(), &json!("2"));
        assert!(tool.is_modified());
        assert!(parent.is_modified());
    }

    #[test]
    fn test_replace_state_from_step_write() {
        let parent = Taint::new();
        let mut step = export_step();
        let mut tool = Tool::split_from_step(&mut step, &parent).unwrap();

        tool.set_step_value(TOOL_STATE, json!("{\"exp\": \"\\\"5\\\"\"}"))
            .unwrap();
        assert_eq!(tool.param("exp").unwrap(), &json!("5"));
        assert!(tool.param("columnList").is_err());
        assert!(parent.is_modified());

        let err = tool.set_step_value(TOOL_STATE, json!("[1]")).unwrap_err();
        assert!(matches!(err, GalaxyError::Document { .. }));
    }

    #[test]
    fn test_copy_under_is_independent() {
        let first = Taint::new();
        let second = Taint::new();
        let mut step = export_step();
        let mut tool = Tool::split_from_step(&mut step, &first).unwrap();
        let copy = tool.copy_under(&second);

        tool.set_param("exp", "9").unwrap();
        assert_eq!(copy.param("exp").unwrap(), &json!("1"));
        assert!(!copy.is_modified());
        assert!(!second.is_modified());
        assert_eq!(copy.tool_id(), Some("Cut1"));
    }
}
