//! Configuration, prompt assembly, and the retrieve-then-generate pipeline.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod request;

pub use config::Config;
pub use error::CoreError;
pub use generator::{Generator, build_prompt};
pub use pipeline::{HistoryStats, QueryResult, RagPipeline};
pub use request::{QueryRequest, answer};
