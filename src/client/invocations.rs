//! Workflow invocation lookup.

use super::{reply_list, reply_object, GalaxyInstance};
use crate::error::Result;
use crate::wrappers::{Entity, History, Invocation, Workflow};

pub struct InvocationClient<'a> {
    gi: &'a GalaxyInstance,
}

impl<'a> InvocationClient<'a> {
    pub(crate) fn new(gi: &'a GalaxyInstance) -> Self {
        Self { gi }
    }

    pub fn get(&self, id: &str) -> Result<Invocation> {
        let document = reply_object(
            "show_invocation",
            self.gi.get(&format!("invocations/{}", id), &[])?,
        )?;
        Ok(Invocation::new(document))
    }

    /// Invocations with step details, optionally only those of `workflow`
    /// or writing into `history`.
    pub fn list(
        &self,
        workflow: Option<&Workflow>,
        history: Option<&History>,
    ) -> Result<Vec<Invocation>> {
        let mut query = vec![
            ("view", "element".to_string()),
            ("step_details", "true".to_string()),
        ];
        if let Some(id) = workflow.and_then(Workflow::id) {
            query.push(("workflow_id", id));
        }
        if let Some(id) = history.and_then(|h| h.id()) {
            query.push(("history_id", id));
        }
        let reply = self.gi.get("invocations", &query)?;
        Ok(reply_list("get_invocations", reply)?
            .into_iter()
            .map(Invocation::new)
            .collect())
    }
}
