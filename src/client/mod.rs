//! Remote Galaxy instance.
//!
//! [`GalaxyInstance`] owns a [`Transport`] and hands out short-lived
//! per-entity clients (`libraries()`, `histories()`, `workflows()`,
//! `invocations()`, `tools()`, `jobs()`, `datasets()`) that turn replies
//! into wrappers.

pub mod datasets;
pub mod histories;
pub mod invocations;
pub mod jobs;
pub mod libraries;
pub mod payloads;
pub mod tools;
pub mod transport;
pub mod workflows;

use crate::cli_config::CliConfig;
use crate::error::{GalaxyError, Result};
use crate::select::select_one;
use crate::wrappers::Document;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub use datasets::DatasetClient;
pub use histories::HistoryClient;
pub use invocations::InvocationClient;
pub use jobs::JobClient;
pub use libraries::LibraryClient;
pub use payloads::{DatasetInput, DatasetSource, HistoryTarget, InputsBy};
pub use tools::ToolClient;
pub use transport::{HttpTransport, Method, Transport, DEFAULT_TIMEOUT};
pub use workflows::WorkflowClient;

/// Names an object to act on either by id or by its (unique) name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    Id(&'a str),
    Name(&'a str),
}

/// Connection to one Galaxy server.
pub struct GalaxyInstance {
    transport: Box<dyn Transport>,
}

impl GalaxyInstance {
    /// Connect to `url` with `api_key` over HTTP.
    pub fn new(url: &str, api_key: &str) -> Result<Self> {
        Self::with_timeout(url, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let transport = HttpTransport::new(url, api_key, timeout)?;
        Ok(Self::with_transport(transport))
    }

    /// Connect using a loaded configuration.
    ///
    /// # Errors
    ///
    /// Fails when the configuration has no URL or no API key.
    pub fn from_config(config: &CliConfig) -> Result<Self> {
        let url = config.galaxy_url.as_deref().ok_or_else(|| GalaxyError::Config {
            message: "Galaxy URL not specified; set GALAXY_URL".to_string(),
        })?;
        Self::with_timeout(url, config.api_key()?, config.timeout())
    }

    /// Use any transport, e.g. a recording fake in tests.
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    pub fn libraries(&self) -> LibraryClient<'_> {
        LibraryClient::new(self)
    }

    pub fn histories(&self) -> HistoryClient<'_> {
        HistoryClient::new(self)
    }

    pub fn workflows(&self) -> WorkflowClient<'_> {
        WorkflowClient::new(self)
    }

    pub fn invocations(&self) -> InvocationClient<'_> {
        InvocationClient::new(self)
    }

    pub fn tools(&self) -> ToolClient<'_> {
        ToolClient::new(self)
    }

    pub fn jobs(&self) -> JobClient<'_> {
        JobClient::new(self)
    }

    pub fn datasets(&self) -> DatasetClient<'_> {
        DatasetClient::new(self)
    }

    pub(crate) fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        self.transport.request(Method::Get, path, query, None)
    }

    pub(crate) fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.transport.request(Method::Post, path, &[], Some(&body))
    }

    pub(crate) fn delete(&self, path: &str, body: Option<Value>) -> Result<Value> {
        self.transport
            .request(Method::Delete, path, &[], body.as_ref())
    }
}

impl std::fmt::Debug for GalaxyInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalaxyInstance").finish_non_exhaustive()
    }
}

/// Accept an object, or the first element of a list of objects.
pub(crate) fn reply_object(operation: &str, reply: Value) -> Result<Document> {
    match reply {
        Value::Object(map) => Ok(map),
        Value::Array(mut items) if !items.is_empty() => match items.swap_remove(0) {
            Value::Object(map) => Ok(map),
            other => Err(GalaxyError::unexpected_reply(operation, &other)),
        },
        other => Err(GalaxyError::unexpected_reply(operation, &other)),
    }
}

/// Interpret a reply as a list of objects.
pub(crate) fn reply_list(operation: &str, reply: Value) -> Result<Vec<Document>> {
    let items = match reply {
        Value::Array(items) => items,
        other => return Err(GalaxyError::unexpected_reply(operation, &other)),
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map),
            other => Err(GalaxyError::unexpected_reply(operation, &other)),
        })
        .collect()
}

/// The `id` field of a reply object.
pub(crate) fn reply_id(operation: &str, reply: &Document) -> Result<String> {
    reply
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GalaxyError::unexpected_reply(operation, &Value::Object(reply.clone())))
}

/// True when `doc` passes the optional name filter.
pub(crate) fn name_matches(doc: &Document, name: Option<&str>) -> bool {
    name.map_or(true, |n| doc.get("name").and_then(Value::as_str) == Some(n))
}

/// Resolve a selector to an id, looking names up among `previews`.
pub(crate) fn select_id(
    what: &str,
    selector: Selector<'_>,
    previews: impl FnOnce(&str) -> Result<Vec<Document>>,
) -> Result<String> {
    match selector {
        Selector::Id(id) => Ok(id.to_string()),
        Selector::Name(name) => {
            let candidates = previews(name)?;
            let chosen = select_one(
                candidates.into_iter().filter(|d| name_matches(d, Some(name))),
                &format!("{} named '{}'", what, name),
            )?;
            reply_id(what, &chosen)
        }
    }
}
