//! Fetch a research paper page, reduce it to plain text and ask a chat
//! completion service for a structured markdown summary.

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod scraper;

pub use error::{AppError, Result};
pub use pipeline::{Pipeline, Stage, Summary};
