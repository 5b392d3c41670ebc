//! Kurs - Course Transcript Indexing and RAG
//!
//! A local-first tool for indexing structured course transcripts and answering
//! questions about them with a tool-using language model.
//!
//! The name "Kurs" comes from the Norwegian/Scandinavian word for "course."
//!
//! # Overview
//!
//! Kurs allows you to:
//! - Ingest a folder of course transcript documents
//! - Build a dual vector index: a course catalog plus searchable content chunks
//! - Ask questions and get AI-powered answers with source attribution
//! - Search course content semantically, filtered by course and lesson
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `chunking` - Sentence-aware overlapping text chunking
//! - `document` - Course document model and transcript parser
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `index` - Dual catalog/content index over the vector store
//! - `agent` - Language model seam, search tools, bounded tool-calling loop
//! - `session` - Bounded per-session conversation history
//! - `rag` - Query engine tying sessions and the tool loop together
//! - `orchestrator` - Component wiring and startup ingestion
//!
//! # Example
//!
//! ```rust,no_run
//! use kurs::config::Settings;
//! use kurs::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     // Index every course document in a folder
//!     let stats = orchestrator.ingest_folder("./docs".as_ref()).await?;
//!     println!("Indexed {} chunks", stats.chunks_added);
//!
//!     // Ask a question
//!     let engine = orchestrator.rag_engine();
//!     let response = engine.query("What is covered in lesson 2?", None).await?;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod session;
pub mod vector_store;

pub use error::{KursError, Result};
