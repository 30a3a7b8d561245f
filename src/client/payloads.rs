//! Request and reply bodies exchanged with the Galaxy API.

use crate::wrappers::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a dataset referenced by an invocation lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSource {
    /// History dataset association
    Hda,
    /// Library dataset dataset association
    Ldda,
    /// Library dataset
    Ld,
    /// History dataset collection association
    Hdca,
}

/// A dataset bound to a workflow input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInput {
    pub id: String,
    pub src: DatasetSource,
}

impl DatasetInput {
    pub fn new(id: String, src: DatasetSource) -> Self {
        Self { id, src }
    }
}

/// How the keys of an invocation's `inputs` map are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputsBy {
    #[serde(rename = "step_index")]
    StepIndex,
    #[serde(rename = "step_id")]
    StepId,
    #[serde(rename = "step_uuid")]
    StepUuid,
    /// Input step labels
    #[serde(rename = "name")]
    Name,
    /// Galaxy's default: step index, falling back to step uuid
    #[default]
    #[serde(rename = "step_index|step_uuid")]
    StepIndexOrUuid,
}

/// History receiving an invocation's outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryTarget {
    /// An existing history, by id
    Existing(String),
    /// A new history with this name
    New(String),
}

impl HistoryTarget {
    /// Value of the `history` request field.
    pub fn as_param(&self) -> String {
        match self {
            HistoryTarget::Existing(id) => format!("hist_id={}", id),
            HistoryTarget::New(name) => name.clone(),
        }
    }
}

/// Body of `POST /api/workflows/{id}/invocations`.
#[derive(Debug, Serialize)]
pub struct InvocationRequest {
    pub inputs: BTreeMap<String, DatasetInput>,
    pub inputs_by: InputsBy,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub parameters: Document,
    pub history: String,
}

#[derive(Debug, Serialize)]
pub struct CreateHistoryRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct CreateLibraryRequest<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct DeleteHistoryRequest {
    pub purge: bool,
}

/// Copy a library dataset into a history.
#[derive(Debug, Serialize)]
pub struct LibraryToHistoryRequest<'a> {
    pub source: &'static str,
    pub content: &'a str,
}

impl<'a> LibraryToHistoryRequest<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            source: "library",
            content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImportSharedRequest<'a> {
    pub workflow_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ImportWorkflowRequest {
    pub workflow: Document,
    pub publish: bool,
}

/// Galaxy error body; older servers use `err_msg`, proxies `message`/`error`.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub err_msg: Option<String>,
    #[serde(default)]
    pub err_code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    pub fn text(&self) -> Option<&str> {
        self.err_msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invocation_request_shape() {
        let mut inputs = BTreeMap::new();
        inputs.insert(
            "Left/Forward FASTQ Reads".to_string(),
            DatasetInput::new("abc".to_string(), DatasetSource::Hda),
        );
        let mut parameters = Document::new();
        parameters.insert("3".to_string(), json!({"hash_length": "23"}));

        let request = InvocationRequest {
            inputs,
            inputs_by: InputsBy::Name,
            parameters,
            history: HistoryTarget::Existing("h1".to_string()).as_param(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "inputs": {"Left/Forward FASTQ Reads": {"id": "abc", "src": "hda"}},
                "inputs_by": "name",
                "parameters": {"3": {"hash_length": "23"}},
                "history": "hist_id=h1"
            })
        );
    }

    #[test]
    fn test_empty_parameters_omitted() {
        let request = InvocationRequest {
            inputs: BTreeMap::new(),
            inputs_by: InputsBy::default(),
            parameters: Document::new(),
            history: HistoryTarget::New("run 1".to_string()).as_param(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("parameters").is_none());
        assert_eq!(value["inputs_by"], json!("step_index|step_uuid"));
        assert_eq!(value["history"], json!("run 1"));
    }

    #[test]
    fn test_error_response_text() {
        let body: ErrorResponse =
            serde_json::from_str(r#"{"err_msg": "History not found", "err_code": 404001}"#).unwrap();
        assert_eq!(body.text(), Some("History not found"));
        assert_eq!(body.err_code, Some(404001));

        let body: ErrorResponse = serde_json::from_str(r#"{"error": "bad gateway"}"#).unwrap();
        assert_eq!(body.text(), Some("bad gateway"));
        assert_eq!(ErrorResponse::default().text(), None);
    }

    #[test]
    fn test_library_to_history_request() {
        let value = serde_json::to_value(LibraryToHistoryRequest::new("ld1")).unwrap();
        assert_eq!(value, json!({"source": "library", "content": "ld1"}));
    }
}
