pub mod hashing;
pub mod openai;
pub mod provider;
pub mod types;

pub use hashing::HashingEmbedder;
pub use openai::{OpenAiProvider, RemoteEmbedder};
pub use provider::{CompletionProvider, Embedder};
pub use types::{ChatMessage, ChatRequest};
