//! Vector index boundary and batched writing
//!
//! The index itself is an external service: it embeds the submitted texts
//! and upserts the resulting vectors behind one `add_texts` call. This
//! module owns the client for that service and the batching policy that
//! keeps writes under the provider's rate limits.

pub mod vector;
pub mod writer;

pub use vector::{HttpVectorIndex, IndexError, VectorIndex};
pub use writer::BatchedWriter;
