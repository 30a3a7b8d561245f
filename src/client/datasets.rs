//! Dataset lookup by id, for history and library datasets alike.

use super::{reply_object, GalaxyInstance};
use crate::error::Result;
use crate::wrappers::{Document, HistoryDataset, LibraryDataset};

pub struct DatasetClient<'a> {
    gi: &'a GalaxyInstance,
}

impl<'a> DatasetClient<'a> {
    pub(crate) fn new(gi: &'a GalaxyInstance) -> Self {
        Self { gi }
    }

    /// Fetch a dataset that lives in a history.
    pub fn history_dataset(&self, id: &str) -> Result<HistoryDataset> {
        Ok(HistoryDataset::new(self.show(id, "hda")?))
    }

    /// Fetch a dataset that lives in a library.
    pub fn library_dataset(&self, id: &str) -> Result<LibraryDataset> {
        Ok(LibraryDataset::new(self.show(id, "ldda")?))
    }

    fn show(&self, id: &str, hda_ldda: &str) -> Result<Document> {
        let reply = self.gi.get(
            &format!("datasets/{}", id),
            &[("hda_ldda", hda_ldda.to_string())],
        )?;
        reply_object("show_dataset", reply)
    }
}
