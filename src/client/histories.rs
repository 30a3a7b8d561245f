//! History operations.

use super::payloads::{CreateHistoryRequest, DeleteHistoryRequest, LibraryToHistoryRequest};
use super::{name_matches, reply_id, reply_list, reply_object, select_id, GalaxyInstance, Selector};
use crate::error::{GalaxyError, Result};
use crate::wrappers::{Document, Entity, History, HistoryDataset, LibraryDataset};
use tracing::{info, warn};

pub struct HistoryClient<'a> {
    gi: &'a GalaxyInstance,
}

impl<'a> HistoryClient<'a> {
    pub(crate) fn new(gi: &'a GalaxyInstance) -> Self {
        Self { gi }
    }

    /// History summaries, optionally filtered by exact name.
    pub fn get_previews(&self, name: Option<&str>, deleted: bool) -> Result<Vec<Document>> {
        let reply = self
            .gi
            .get("histories", &[("deleted", deleted.to_string())])?;
        Ok(reply_list("get_histories", reply)?
            .into_iter()
            .filter(|doc| name_matches(doc, name))
            .collect())
    }

    /// Fetch one history with its content summaries.
    pub fn get(&self, id: &str) -> Result<History> {
        let details = reply_object("get_history", self.gi.get(&format!("histories/{}", id), &[])?)?;
        let contents = reply_list(
            "get_history_contents",
            self.gi.get(&format!("histories/{}/contents", id), &[])?,
        )?;
        Ok(History::new(details, contents))
    }

    pub fn list(&self, name: Option<&str>, deleted: bool) -> Result<Vec<History>> {
        let mut histories = Vec::new();
        for preview in self.get_previews(name, deleted)? {
            match reply_id("get_histories", &preview) {
                Ok(id) => histories.push(self.get(&id)?),
                Err(_) => warn!(?preview, "skipping history preview without id"),
            }
        }
        Ok(histories)
    }

    /// Create a history; the server picks a default name when `name` is `None`.
    pub fn create(&self, name: Option<&str>) -> Result<History> {
        let reply = reply_object(
            "create_history",
            self.gi.post("histories", &CreateHistoryRequest { name })?,
        )?;
        let id = reply_id("create_history", &reply)?;
        info!(%id, name = name.unwrap_or_default(), "created history");
        self.get(&id)
    }

    /// Delete `history` on the server and clear its local id.
    pub fn delete(&self, history: &mut History, purge: bool) -> Result<()> {
        let id = history
            .id()
            .ok_or(GalaxyError::MissingId { what: "history" })?;
        self.delete_selected(Selector::Id(&id), purge)?;
        history.clear_id();
        Ok(())
    }

    pub fn delete_selected(&self, selector: Selector<'_>, purge: bool) -> Result<()> {
        let id = select_id("history", selector, |name| self.get_previews(Some(name), false))?;
        let body = serde_json::to_value(DeleteHistoryRequest { purge })?;
        let reply = self.gi.delete(&format!("histories/{}", id), Some(body))?;
        if !reply.is_object() {
            return Err(GalaxyError::unexpected_reply("delete_history", &reply));
        }
        info!(%id, purge, "deleted history");
        Ok(())
    }

    /// Copy a library dataset into `history`.
    pub fn import_dataset(
        &self,
        history: &History,
        dataset: &LibraryDataset,
    ) -> Result<HistoryDataset> {
        let history_id = history
            .id()
            .ok_or(GalaxyError::MissingId { what: "history" })?;
        let dataset_id = dataset
            .id()
            .ok_or(GalaxyError::MissingId { what: "library dataset" })?;
        let reply = self.gi.post(
            &format!("histories/{}/contents", history_id),
            &LibraryToHistoryRequest::new(&dataset_id),
        )?;
        let imported = HistoryDataset::new(reply_object("upload_dataset_from_library", reply)?);
        info!(
            history = %history_id,
            source = %dataset_id,
            id = %imported.id().unwrap_or_default(),
            "imported library dataset"
        );
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use crate::client::testing::instance;
    use crate::client::{Method, Selector};
    use crate::error::GalaxyError;
    use crate::wrappers::{Entity, LibraryDataset};
    use serde_json::json;

    fn empty_history(id: &str) -> Vec<crate::error::Result<serde_json::Value>> {
        vec![Ok(json!({"id": id, "name": "out", "deleted": false})), Ok(json!([]))]
    }

    #[test]
    fn test_create_then_fetch() {
        let mut replies = vec![Ok(json!({"id": "H1", "name": "W3 output"}))];
        replies.extend(empty_history("H1"));
        let (gi, requests) = instance(replies);

        let history = gi.histories().create(Some("W3 output")).unwrap();
        assert_eq!(history.id().as_deref(), Some("H1"));

        let requests = requests.lock().unwrap();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].path, "histories");
        assert_eq!(requests[0].body, Some(json!({"name": "W3 output"})));
        assert_eq!(requests[1].path, "histories/H1");
        assert_eq!(requests[2].path, "histories/H1/contents");
    }

    #[test]
    fn test_delete_sends_purge_flag() {
        let mut replies = empty_history("H1");
        replies.push(Ok(json!({"id": "H1", "deleted": true, "purged": true})));
        let (gi, requests) = instance(replies);

        let mut history = gi.histories().get("H1").unwrap();
        gi.histories().delete(&mut history, true).unwrap();
        assert_eq!(history.id(), None);

        let requests = requests.lock().unwrap();
        assert_eq!(requests[2].method, Method::Delete);
        assert_eq!(requests[2].path, "histories/H1");
        assert_eq!(requests[2].body, Some(json!({"purge": true})));
    }

    #[test]
    fn test_delete_selected_by_name() {
        let (gi, requests) = instance(vec![
            Ok(json!([{"id": "H1", "name": "old"}, {"id": "H2", "name": "keep"}])),
            Ok(json!({"id": "H1", "deleted": true})),
        ]);
        gi.histories()
            .delete_selected(Selector::Name("old"), false)
            .unwrap();
        assert_eq!(requests.lock().unwrap()[1].path, "histories/H1");

        let (gi, _) = instance(vec![Ok(json!([]))]);
        let err = gi
            .histories()
            .delete_selected(Selector::Name("old"), false)
            .unwrap_err();
        assert!(matches!(err, GalaxyError::AmbiguousSelection { count: 0, .. }));
    }

    #[test]
    fn test_import_dataset_from_library() {
        let mut replies = empty_history("H1");
        replies.push(Ok(json!([{"id": "HDA1", "name": "reads_1.fastq"}])));
        let (gi, requests) = instance(replies);

        let history = gi.histories().get("H1").unwrap();
        let dataset = LibraryDataset::new(
            json!({"id": "LD1", "name": "/reads_1.fastq", "type": "file"})
                .as_object()
                .unwrap()
                .clone(),
        );
        let imported = gi.histories().import_dataset(&history, &dataset).unwrap();
        assert_eq!(imported.id().as_deref(), Some("HDA1"));

        let requests = requests.lock().unwrap();
        assert_eq!(requests[2].path, "histories/H1/contents");
        assert_eq!(
            requests[2].body,
            Some(json!({"source": "library", "content": "LD1"}))
        );
    }

    #[test]
    fn test_list_skips_previews_without_id() {
        let mut replies = vec![Ok(json!([{"name": "broken"}, {"id": "H1", "name": "out"}]))];
        replies.extend(empty_history("H1"));
        let (gi, _) = instance(replies);
        let histories = gi.histories().list(None, false).unwrap();
        assert_eq!(histories.len(), 1);
    }
}
