//! docchat - chat with your documents from the command line
//!
//! This crate provides:
//! - Document ingestion (text, Markdown, PDF, DOCX) with boundary-aware chunking
//! - An embedded SQLite similarity index over Ollama embeddings
//! - Streamed, context-grounded answer generation via the Ollama API

pub mod chunk;
pub mod commands;
pub mod config;
pub mod embed;
pub mod error;
pub mod extract;
pub mod generate;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
