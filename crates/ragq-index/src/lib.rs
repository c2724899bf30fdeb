//! Corpus chunking, exact vector search, and retrieval.
//!
//! Build phase: documents are split by [`chunker::Chunker`] into overlapping word
//! windows, embedded, and stored in a [`index::FlatIndex`] whose position `i`
//! always identifies chunk `i`. Both halves persist together as a
//! [`corpus::Corpus`]. Query phase: [`retriever::Retriever`] embeds the question,
//! searches the index, and maps distances to bounded similarity scores.

pub mod chunker;
pub mod corpus;
pub mod error;
pub mod index;
pub mod loader;
pub mod retriever;

pub use chunker::{Chunk, Chunker, ChunkerConfig};
pub use corpus::{ArtifactPaths, Corpus};
pub use error::{IndexError, Result};
pub use index::{FlatIndex, Neighbor};
pub use loader::{Document, load_documents};
pub use retriever::{Retrieval, Retriever, similarity};
