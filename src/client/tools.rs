//! Installed tool lookup.

use super::{name_matches, reply_list, reply_object, GalaxyInstance};
use crate::error::Result;
use crate::wrappers::{Document, InstalledTool};

pub struct ToolClient<'a> {
    gi: &'a GalaxyInstance,
}

impl<'a> ToolClient<'a> {
    pub(crate) fn new(gi: &'a GalaxyInstance) -> Self {
        Self { gi }
    }

    /// Tool summaries, optionally filtered by exact name. With `trackster`
    /// only tools usable from the Trackster visualization are listed.
    pub fn get_previews(&self, name: Option<&str>, trackster: bool) -> Result<Vec<Document>> {
        let mut query = vec![("in_panel", "false".to_string())];
        if trackster {
            query.push(("trackster", "true".to_string()));
        }
        let reply = self.gi.get("tools", &query)?;
        Ok(reply_list("get_tools", reply)?
            .into_iter()
            .filter(|doc| name_matches(doc, name))
            .collect())
    }

    /// Fetch one tool. `io_details` adds input and output definitions,
    /// `link_details` adds the tool's run link.
    pub fn get(&self, id: &str, io_details: bool, link_details: bool) -> Result<InstalledTool> {
        let reply = self.gi.get(
            &format!("tools/{}", id),
            &[
                ("io_details", io_details.to_string()),
                ("link_details", link_details.to_string()),
            ],
        )?;
        Ok(InstalledTool::new(reply_object("show_tool", reply)?))
    }

    /// Summaries wrapped as tools, without fetching each one.
    pub fn list(&self, name: Option<&str>, trackster: bool) -> Result<Vec<InstalledTool>> {
        Ok(self
            .get_previews(name, trackster)?
            .into_iter()
            .map(InstalledTool::new)
            .collect())
    }
}
