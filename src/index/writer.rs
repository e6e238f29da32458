//! Batched embedding writer
//!
//! Partitions chunks into contiguous batches and writes each batch to the
//! vector index as one call, pausing between batches to stay under the
//! embedding provider's request ceiling. A batch failure aborts the whole
//! write: partial indexing behind a "completed" status would silently
//! under-serve retrieval.

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::WriterConfig;
use crate::error::IngestError;
use crate::jobs::CancelFlag;
use crate::types::DocumentChunk;

use super::vector::VectorIndex;

/// Rate-limited batch writer over a vector index
pub struct BatchedWriter {
    index: Arc<dyn VectorIndex>,
    config: WriterConfig,
}

impl BatchedWriter {
    pub fn new(index: Arc<dyn VectorIndex>, config: WriterConfig) -> Self {
        Self { index, config }
    }

    /// Write all chunks in batches of at most `batch_size`, sleeping
    /// `batch_delay` between batches but not after the last. Returns the
    /// number of chunks written; the first failed batch propagates.
    pub async fn write_all(
        &self,
        chunks: &[DocumentChunk],
        cancel: &CancelFlag,
    ) -> Result<usize, IngestError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let batch_count = chunks.len().div_ceil(self.config.batch_size);
        debug!(
            "writing {} chunks in {} batches of up to {}",
            chunks.len(),
            batch_count,
            self.config.batch_size
        );

        let mut written = 0usize;
        for (i, batch) in chunks.chunks(self.config.batch_size).enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.batch_delay()).await;
            }
            if cancel.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let metadatas = batch.iter().map(|c| c.metadata_map()).collect();

            self.index.add_texts(texts, metadatas).await?;
            written += batch.len();
            debug!("batch {}/{} written ({} chunks)", i + 1, batch_count, batch.len());
        }

        info!("wrote {} chunks to vector index", written);
        Ok(written)
    }
}
