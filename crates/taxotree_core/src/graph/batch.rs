//! Chunked label scans with a checkpoint after every chunk.

use crate::graph::store::{GraphStore, Label, NodeId};

/// Callback pair driven by [`GraphStore::process`].
pub trait NodeBatchProcessor {
    type Error;

    fn process(&mut self, store: &mut GraphStore, node: NodeId) -> Result<(), Self::Error>;

    /// Called after each chunk with the running number of processed nodes.
    ///
    /// This is the checkpoint: flush buffered writes and observe cancellation.
    fn commit_batch(&mut self, store: &mut GraphStore, counter: usize) -> Result<(), Self::Error>;
}

impl GraphStore {
    /// Feeds every node carrying `label` to `processor`, `batch_size` at a time.
    ///
    /// Nodes removed or relabeled by an earlier callback are skipped. Returns
    /// the number of processed nodes.
    pub fn process<P: NodeBatchProcessor>(
        &mut self,
        label: Label,
        batch_size: usize,
        processor: &mut P,
    ) -> Result<usize, P::Error> {
        let batch_size = batch_size.max(1);
        let mut cursor = 0;
        let mut counter = 0;
        loop {
            let batch = self.next_batch(label, &mut cursor, batch_size);
            if batch.is_empty() {
                break;
            }
            for node in batch {
                if !self.has_label(node, label) {
                    continue;
                }
                processor.process(self, node)?;
                counter += 1;
            }
            processor.commit_batch(self, counter)?;
        }
        Ok(counter)
    }
}
