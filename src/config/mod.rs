//! Configuration management for Kurs.

mod prompts;
mod settings;

pub use prompts::Prompts;
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, IngestionSettings, PromptSettings,
    RagSettings, SearchSettings, SessionSettings, Settings, VectorStoreSettings,
};
