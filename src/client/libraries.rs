//! Data library operations.

use super::payloads::CreateLibraryRequest;
use super::{name_matches, reply_id, reply_list, reply_object, select_id, GalaxyInstance, Selector};
use crate::error::{GalaxyError, Result};
use crate::wrappers::{Document, Entity, Library};
use serde_json::Value;
use tracing::{info, warn};

pub struct LibraryClient<'a> {
    gi: &'a GalaxyInstance,
}

impl<'a> LibraryClient<'a> {
    pub(crate) fn new(gi: &'a GalaxyInstance) -> Self {
        Self { gi }
    }

    /// Library summaries, optionally filtered by exact name.
    pub fn get_previews(&self, name: Option<&str>, deleted: bool) -> Result<Vec<Document>> {
        let reply = self
            .gi
            .get("libraries", &[("deleted", deleted.to_string())])?;
        Ok(reply_list("get_libraries", reply)?
            .into_iter()
            .filter(|doc| name_matches(doc, name))
            .collect())
    }

    /// Fetch one library with its contents.
    pub fn get(&self, id: &str) -> Result<Library> {
        let details = reply_object("get_library", self.gi.get(&format!("libraries/{}", id), &[])?)?;
        let contents = reply_list(
            "get_library_contents",
            self.gi.get(&format!("libraries/{}/contents", id), &[])?,
        )?;
        Ok(Library::new(details, contents))
    }

    /// Fetch every library matching the preview filter.
    ///
    /// Unless `deleted` is set, deleted libraries are left out: the server
    /// lists them anyway.
    pub fn list(&self, name: Option<&str>, deleted: bool) -> Result<Vec<Library>> {
        let mut libraries = Vec::new();
        for preview in self.get_previews(name, deleted)? {
            if !deleted && preview.get("deleted").and_then(Value::as_bool) == Some(true) {
                continue;
            }
            match reply_id("get_libraries", &preview) {
                Ok(id) => libraries.push(self.get(&id)?),
                Err(_) => warn!(?preview, "skipping library preview without id"),
            }
        }
        Ok(libraries)
    }

    pub fn create(
        &self,
        name: &str,
        description: Option<&str>,
        synopsis: Option<&str>,
    ) -> Result<Library> {
        let request = CreateLibraryRequest {
            name,
            description,
            synopsis,
        };
        let reply = reply_object("create_library", self.gi.post("libraries", &request)?)?;
        let id = reply_id("create_library", &reply)?;
        info!(%id, name, "created library");
        self.get(&id)
    }

    /// Delete `library` on the server and clear its local id.
    pub fn delete(&self, library: &mut Library) -> Result<()> {
        let id = library
            .id()
            .ok_or(GalaxyError::MissingId { what: "library" })?;
        self.delete_selected(Selector::Id(&id))?;
        library.clear_id();
        Ok(())
    }

    /// Delete the library picked by `selector`; names must match exactly one.
    pub fn delete_selected(&self, selector: Selector<'_>) -> Result<()> {
        let id = select_id("library", selector, |name| self.get_previews(Some(name), false))?;
        let reply = self.gi.delete(&format!("libraries/{}", id), None)?;
        if !reply.is_object() {
            return Err(GalaxyError::unexpected_reply("delete_library", &reply));
        }
        info!(%id, "deleted library");
        Ok(())
    }
}
