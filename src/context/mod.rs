//! Prompt assembly for the completion provider.

pub mod prompt;

pub use prompt::PromptAssembler;
