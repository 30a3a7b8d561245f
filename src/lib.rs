//! # galaxy-objects
//!
//! Object layer over the Galaxy bioinformatics server REST API.
//!
//! Server documents are wrapped in dirty-tracking objects: a [`Workflow`]
//! owns its [`Step`]s, a tool step owns its [`Tool`], and a write anywhere
//! below marks every owner above it modified. A [`GalaxyInstance`] fetches,
//! imports, deletes and invokes these objects on a remote server.

pub mod cli_config;
pub mod client;
pub mod error;
pub mod logging;
pub mod select;
pub mod wrappers;

pub use cli_config::CliConfig;
pub use client::{
    DatasetInput, DatasetSource, GalaxyInstance, HistoryTarget, HttpTransport, InputsBy, Selector,
    Transport,
};
pub use error::{GalaxyError, Result};
pub use select::{get_one, select_one};
pub use wrappers::{
    Document, Entity, History, HistoryDataset, InstalledTool, Invocation, Job, Library,
    LibraryDataset, Step, StepType, Tool, Workflow, WorkflowPreview, Wrapper,
};
