pub mod cli;
pub mod console;
pub mod context;
pub mod core;
pub mod engine;
pub mod history;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod server;
pub mod state;
pub mod vector_math;
