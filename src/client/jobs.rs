//! Job lookup.

use super::{reply_id, reply_list, reply_object, GalaxyInstance};
use crate::error::Result;
use crate::wrappers::{Document, Job};
use tracing::warn;

pub struct JobClient<'a> {
    gi: &'a GalaxyInstance,
}

impl<'a> JobClient<'a> {
    pub(crate) fn new(gi: &'a GalaxyInstance) -> Self {
        Self { gi }
    }

    /// Summaries of the user's jobs.
    pub fn get_previews(&self) -> Result<Vec<Document>> {
        reply_list("get_jobs", self.gi.get("jobs", &[])?)
    }

    /// Fetch one job; `full_details` adds command line, stdout and stderr.
    pub fn get(&self, id: &str, full_details: bool) -> Result<Job> {
        let reply = self
            .gi
            .get(&format!("jobs/{}", id), &[("full", full_details.to_string())])?;
        Ok(Job::new(reply_object("show_job", reply)?))
    }

    pub fn list(&self) -> Result<Vec<Job>> {
        let mut jobs = Vec::new();
        for preview in self.get_previews()? {
            match reply_id("get_jobs", &preview) {
                Ok(id) => jobs.push(self.get(&id, false)?),
                Err(_) => warn!(?preview, "skipping job preview without id"),
            }
        }
        Ok(jobs)
    }
}
