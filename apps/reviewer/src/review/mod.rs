//! Résumé review: prompts, the response contract, rendering, and the pipeline
//! that ties them to the document preprocessor and the LLM client.

pub mod builder;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod render;
pub mod schema;

pub use builder::JobContext;
pub use pipeline::ReviewPipeline;
pub use render::{render_review, DisplayBlock};
