//! Substream slicing
//!
//! A substream is read once per parent record: each slice wraps one parent
//! record under the `"parent"` key, and the child stream's hooks pick the
//! ids they need out of it.

use super::{HttpStream, StreamReader};
use crate::types::{StreamSlice, StreamState};

/// Key under which the parent record is stored in each slice
pub const PARENT_KEY: &str = "parent";

/// Builds child-stream slices from a parent stream's records
pub struct SubstreamSlicer<P: HttpStream> {
    parent: StreamReader<P>,
}

impl<P: HttpStream> SubstreamSlicer<P> {
    /// Create a slicer over `parent`
    pub fn new(parent: StreamReader<P>) -> Self {
        Self { parent }
    }

    /// The parent reader
    pub fn parent(&self) -> &StreamReader<P> {
        &self.parent
    }

    /// Read the parent stream in full and wrap each record in a slice.
    ///
    /// Sharing a [`crate::http::RequestCache`] between the parent's client
    /// and the caller's keeps this from re-fetching pages the parent sync
    /// already pulled.
    pub async fn stream_slices(&self) -> crate::Result<Vec<StreamSlice>> {
        let records = self.parent.read_all(None, StreamState::new()).await?;
        Ok(records
            .into_iter()
            .map(|record| {
                let mut slice = StreamSlice::new();
                slice.insert(PARENT_KEY.to_string(), record);
                slice
            })
            .collect())
    }
}

impl<P: HttpStream> std::fmt::Debug for SubstreamSlicer<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubstreamSlicer")
            .field("parent", &self.parent.stream().name())
            .finish()
    }
}
