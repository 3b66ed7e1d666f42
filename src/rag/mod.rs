//! Retrieval-augmented generation over a local document corpus.
//!
//! Build time: `DirectorySource` -> `Chunker` -> `Embedder` -> `VectorIndex`
//! (driven by `CorpusIndexer`). Query time: `Retriever` embeds the query and
//! ranks the index by cosine similarity.

pub mod chunker;
pub mod corpus;
pub mod index;
pub mod indexer;
pub mod retriever;

pub use chunker::{Chunk, ChunkUnit, Chunker};
pub use corpus::{CorpusLoad, DirectorySource, Document, DocumentFailure, DocumentParser, PlainTextParser};
pub use index::{EmbeddedChunk, VectorIndex};
pub use indexer::{CorpusIndexer, IndexReport};
pub use retriever::{RetrievalResult, RetrievedChunk, Retriever};
